//! Integration tests for the errors module

use std::sync::Arc;

use text_size::{TextRange, TextSize};

use super::*;
use crate::base::Location;
use crate::parser::context::ContextKind;

fn loc(line: u32, offset: u32) -> Location {
    Location::new(
        Arc::from("script.m"),
        line,
        0,
        0,
        TextRange::empty(TextSize::new(offset)),
    )
}

#[test]
fn test_error_module_exports() {
    let _code = ErrorCode::E0201;
    let _severity = Severity::Error;
    let _err = SyntaxError::new("test error", loc(1, 0), ErrorCode::E0901);
    let _parse: ParseError = ParseError::internal("bug", None);
}

#[test]
fn test_complete_error_workflow() {
    // A function opened on line 1 and never closed
    let opening = loc(1, 0);
    let eof = loc(9, 120);

    let err = SyntaxError::builder(ErrorCode::E0205, eof.clone())
        .message("expected 'end' for function 'foo'")
        .hint("add 'end' to close the function")
        .related("function opened here", opening.clone())
        .build();

    assert_eq!(err.code, ErrorCode::E0205);
    assert!(err.code.is_termination());
    assert!(err.message.contains("end"));
    assert!(err.has_hint());
    assert_eq!(err.related[0].location, opening);
    assert_eq!(err.location, eof);
}

#[test]
fn test_error_code_exhaustiveness() {
    let codes = [
        ErrorCode::E0101,
        ErrorCode::E0102,
        ErrorCode::E0103,
        ErrorCode::E0104,
        ErrorCode::E0201,
        ErrorCode::E0202,
        ErrorCode::E0203,
        ErrorCode::E0204,
        ErrorCode::E0205,
        ErrorCode::E0301,
        ErrorCode::E0302,
        ErrorCode::E0303,
        ErrorCode::E0304,
        ErrorCode::E0305,
        ErrorCode::E0306,
        ErrorCode::E0307,
        ErrorCode::E0401,
        ErrorCode::E0402,
        ErrorCode::E0403,
        ErrorCode::E0404,
        ErrorCode::E0501,
        ErrorCode::E0502,
        ErrorCode::E0503,
        ErrorCode::E0901,
        ErrorCode::E0902,
        ErrorCode::E0999,
    ];

    for code in codes {
        assert!(!code.default_message().is_empty(), "code {:?} has no message", code);
        assert!(
            !code.category_description().is_empty(),
            "code {:?} has no category",
            code
        );

        // String representation should match pattern E####
        let s = code.as_str();
        assert!(s.starts_with('E'), "code {:?} doesn't start with E", code);
        assert_eq!(s.len(), 5, "code {:?} should be 5 chars", code);
    }
}

#[test]
fn test_context_errors_name_the_construct() {
    for context in [
        ContextKind::Function,
        ContextKind::Class,
        ContextKind::Loop,
        ContextKind::If,
        ContextKind::Switch,
        ContextKind::Block,
    ] {
        let err = format_context_error("'end'", Some(context), loc(1, 0), ErrorCode::E0901);
        assert!(
            err.message.contains(context.description()),
            "context {:?} missing from message",
            context
        );
    }
    let err = format_context_error("')'", None, loc(1, 0), ErrorCode::E0901);
    assert!(err.message.contains("top level"));
}

#[test]
fn test_error_severity_default() {
    let err = SyntaxError::new("test", loc(1, 0), ErrorCode::E0901);

    assert_eq!(err.severity, Severity::Error);
    assert!(err.severity.is_error());
}

#[test]
fn test_parse_error_display() {
    let err: ParseError = SyntaxError::new("expected ')'", loc(3, 12), ErrorCode::E0902).into();
    assert_eq!(err.to_string(), "E0902: expected ')'");
}

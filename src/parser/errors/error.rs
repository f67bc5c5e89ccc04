//! Syntax error types
//!
//! Provides rich error information including:
//! - Error codes for categorization
//! - Severity levels
//! - Hints/suggestions for fixes
//! - Related source locations

use thiserror::Error;

use super::codes::ErrorCode;
use crate::base::Location;
use crate::parser::context::ContextKind;
use crate::parser::lexer::LexError;

/// Severity level for syntax diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    /// A hard error that aborts the parse of the file
    #[default]
    Error,
    /// A warning that doesn't prevent parsing
    Warning,
    /// An informational hint
    Hint,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        }
    }
}

/// Related location information for an error
///
/// Used to point to related source locations, e.g.
/// "function opened here" pointing to the `function` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub message: String,
    pub location: Location,
}

impl RelatedInfo {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// A user-facing syntax error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Human-readable error message
    pub message: String,
    pub location: Location,
    pub code: ErrorCode,
    pub severity: Severity,
    /// Optional suggestion for fixing the error
    pub hint: Option<String>,
    pub related: Vec<RelatedInfo>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, location: Location, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            location,
            code,
            severity: Severity::Error,
            hint: None,
            related: vec![],
        }
    }

    /// Create a builder for more complex error construction
    pub fn builder(code: ErrorCode, location: Location) -> SyntaxErrorBuilder {
        SyntaxErrorBuilder::new(code, location)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn has_hint(&self) -> bool {
        self.hint.is_some()
    }

    pub fn has_related(&self) -> bool {
        !self.related.is_empty()
    }

    /// Format the error for display
    pub fn format(&self) -> String {
        let mut result = format!("{}: {}: {}", self.location, self.code, self.message);
        if let Some(hint) = &self.hint {
            result.push_str(&format!("\n  hint: {}", hint));
        }
        for info in &self.related {
            result.push_str(&format!("\n  {}: {}", info.location, info.message));
        }
        result
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<LexError> for SyntaxError {
    fn from(err: LexError) -> Self {
        let code = match &err {
            LexError::InvalidCharacter(..) => ErrorCode::E0101,
            LexError::UnterminatedCharArray(_) => ErrorCode::E0102,
            LexError::UnterminatedString(_) => ErrorCode::E0103,
            LexError::UnterminatedBlockComment(_) => ErrorCode::E0104,
        };
        SyntaxError::new(err.to_string(), err.location().clone(), code)
    }
}

/// Builder for creating complex syntax errors
pub struct SyntaxErrorBuilder {
    code: ErrorCode,
    location: Location,
    message: Option<String>,
    severity: Severity,
    hint: Option<String>,
    related: Vec<RelatedInfo>,
}

impl SyntaxErrorBuilder {
    pub fn new(code: ErrorCode, location: Location) -> Self {
        Self {
            code,
            location,
            message: None,
            severity: Severity::Error,
            hint: None,
            related: vec![],
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn related(mut self, message: impl Into<String>, location: Location) -> Self {
        self.related.push(RelatedInfo::new(message, location));
        self
    }

    /// Build the syntax error; the message defaults to the code's template
    pub fn build(self) -> SyntaxError {
        SyntaxError {
            message: self
                .message
                .unwrap_or_else(|| self.code.default_message().to_string()),
            location: self.location,
            code: self.code,
            severity: self.severity,
            hint: self.hint,
            related: self.related,
        }
    }
}

/// Error unwinding out of a grammar rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Aborts the current file; caught once by the unit parser
    #[error("{0}")]
    Syntax(Box<SyntaxError>),
    /// A defect in the parser itself; never turned into a partial result
    #[error("internal parser error: {message}")]
    Internal {
        message: String,
        location: Option<Location>,
    },
}

impl ParseError {
    pub fn internal(message: impl Into<String>, location: Option<Location>) -> Self {
        Self::Internal {
            message: message.into(),
            location,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

impl From<SyntaxError> for ParseError {
    fn from(err: SyntaxError) -> Self {
        Self::Syntax(Box::new(err))
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self::Syntax(Box::new(err.into()))
    }
}

/// Create an "unexpected X in Y" error from the innermost construct
pub fn format_context_error(
    found: &str,
    context: Option<ContextKind>,
    location: Location,
    code: ErrorCode,
) -> SyntaxError {
    let message = match context {
        Some(context) => format!(
            "unexpected {} {}, expected {}",
            found,
            context.description(),
            context.expected_description()
        ),
        None => format!("unexpected {} at top level", found),
    };
    SyntaxError::builder(code, location).message(message).build()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use text_size::{TextRange, TextSize};

    use super::*;

    fn loc(offset: u32) -> Location {
        Location::new(
            Arc::from("f.m"),
            2,
            4,
            4,
            TextRange::empty(TextSize::new(offset)),
        )
    }

    #[test]
    fn test_syntax_error_new() {
        let err = SyntaxError::new("expected ';'", loc(10), ErrorCode::E0201);

        assert_eq!(err.message, "expected ';'");
        assert_eq!(err.code, ErrorCode::E0201);
        assert_eq!(err.severity, Severity::Error);
        assert!(err.hint.is_none());
        assert!(err.related.is_empty());
    }

    #[test]
    fn test_syntax_error_with_related() {
        let err = SyntaxError::new("missing 'end'", loc(50), ErrorCode::E0205)
            .with_related(RelatedInfo::new("function opened here", loc(0)));

        assert!(err.has_related());
        assert_eq!(err.related[0].message, "function opened here");
    }

    #[test]
    fn test_syntax_error_builder_defaults() {
        let err = SyntaxError::builder(ErrorCode::E0307, loc(3)).build();

        assert_eq!(err.message, "ignored output must be followed by ','");
        assert_eq!(err.severity, Severity::Error);
    }

    #[test]
    fn test_format_error() {
        let err = SyntaxError::new("expected ';'", loc(10), ErrorCode::E0201)
            .with_hint("add ';' at the end of the statement");

        let formatted = err.format();
        assert!(formatted.starts_with("f.m:2:5: E0201"));
        assert!(formatted.contains("hint: add ';'"));
    }

    #[test]
    fn test_lex_error_conversion() {
        let err: SyntaxError = LexError::UnterminatedString(loc(7)).into();
        assert_eq!(err.code, ErrorCode::E0103);
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn test_format_context_error() {
        let err = format_context_error("'case'", Some(ContextKind::Loop), loc(0), ErrorCode::E0901);

        assert!(err.message.contains("'case'"));
        assert!(err.message.contains("in loop body"));
        assert!(err.message.contains("expected"));
    }

    #[test]
    fn test_parse_error_kinds() {
        let syntax: ParseError = SyntaxError::new("x", loc(0), ErrorCode::E0901).into();
        assert!(!syntax.is_internal());
        assert!(ParseError::internal("context stack underflow", None).is_internal());
    }
}

//! Parser Tests - Statements
//!
//! Simple and compound statements, context legality and the Octave-only
//! statement forms.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{ast, count_kind, error_code, parse, parse_octave, style_codes};
use matlint::diagnostics::codes;
use matlint::syntax::{Expr, ImportItem, Pragma, Stmt};
use rstest::rstest;

// ============================================================================
// Statements that parse
// ============================================================================

#[rstest]
#[case("x = 1;\n", "Simple_Assignment_Statement")]
#[case("s.a(2).b = 1;\n", "Simple_Assignment_Statement")]
#[case("c{3} = 1;\n", "Simple_Assignment_Statement")]
#[case("[a, b] = size(m);\n", "Compound_Assignment_Statement")]
#[case("[~, i] = max(v);\n", "Compound_Assignment_Statement")]
#[case("disp(x);\n", "Naked_Expression_Statement")]
#[case("hold on\n", "Command_Statement")]
#[case("global a b\n", "Global_Statement")]
#[case("import pkg.sub.*\n", "Import_Statement")]
#[case("if a\n  b = 1;\nend\n", "If_Statement")]
#[case("switch x\n  case 1\n    y = 1;\n  otherwise\n    y = 2;\nend\n", "Switch_Statement")]
#[case("for i = 1:10\n  disp(i);\nend\n", "For_Loop_Statement")]
#[case("for (i = 1:10)\n  disp(i);\nend\n", "For_Loop_Statement")]
#[case("parfor (i = 1:10, 4)\n  disp(i);\nend\n", "Parfor_Statement")]
#[case("while true\n  break\nend\n", "While_Statement")]
#[case("try\n  f();\ncatch err\n  disp(err);\nend\n", "Try_Statement")]
#[case("spmd (2)\n  x = 1;\nend\n", "SPMD_Statement")]
#[case("!ls -l\n", "Shell_Escape_Statement")]
#[case("%| pragma No_Tracing\n", "Pragma")]
fn test_statement_kinds(#[case] src: &str, #[case] kind: &str) {
    let result = parse(src);
    let ast = ast(&result);
    assert_eq!(count_kind(ast, kind), 1, "{}", src);
}

#[test]
fn test_if_with_missing_semicolon() {
    let result = parse("if a\n  b=1\nend\n");
    let ast = ast(&result);
    assert_eq!(count_kind(ast, "If_Statement"), 1);
    assert_eq!(count_kind(ast, "Action"), 1);
    assert_eq!(count_kind(ast, "Simple_Assignment_Statement"), 1);
    assert_eq!(style_codes(&result), vec![codes::TERMINATION.to_string()]);
}

#[rstest]
#[case("if a\n  b = 1;\nend\n")]
#[case("if a\n  return\nend\n")]
#[case("if a, b = 1; else, b = 2; end\n")]
fn test_if_keyword_links_to_first_action(#[case] src: &str) {
    let result = parse(src);
    let ast = ast(&result);
    let keyword = |text: &str| {
        result
            .links
            .iter()
            .find(|(id, _)| result.token(*id).raw_text == text)
            .map(|(_, node)| node)
    };
    assert_eq!(keyword("if").map(|n| ast.kind_name(n)), Some("Action"), "{:?}", src);
    assert_eq!(keyword("end").map(|n| ast.kind_name(n)), Some("If_Statement"), "{:?}", src);
}

#[test]
fn test_if_elseif_else_actions() {
    let src = "if a\n  x = 1;\nelseif b\n  x = 2;\nelse\n  x = 3;\nend\n";
    let result = parse(src);
    let ast = ast(&result);
    let actions = ast
        .ids()
        .find_map(|id| match ast.stmt(id) {
            Some(Stmt::If { actions }) => Some(actions.clone()),
            _ => None,
        })
        .unwrap();
    let dump = ast.dump();
    assert_eq!(actions.len(), 3);
    assert!(dump.contains("Action: Action if"));
    assert!(dump.contains("Action: Action elseif"));
    assert!(dump.contains("Action: Action else"));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_catch_identifier_needs_end_of_line() {
    let bound = parse("try\n  f();\ncatch err\n  g();\nend\n");
    let ast = ast(&bound);
    assert!(ast.ids().any(|id| matches!(
        ast.stmt(id),
        Some(Stmt::Try {
            identifier: Some(_),
            ..
        })
    )));

    let unbound = parse("try\n  f();\ncatch disp(1);\nend\n");
    let ast = helpers::ast(&unbound);
    assert!(ast.ids().any(|id| matches!(
        ast.stmt(id),
        Some(Stmt::Try {
            identifier: None,
            ..
        })
    )));
}

#[test]
fn test_ignored_output_targets() {
    let result = parse("[~, y] = f();\n");
    let ast = ast(&result);
    assert!(ast.ids().any(|id| ast.expr(id) == Some(&Expr::Ignored)));
}

#[test]
fn test_command_arguments() {
    let result = parse("format long g\n");
    let ast = ast(&result);
    let arguments = ast
        .ids()
        .find_map(|id| match ast.stmt(id) {
            Some(Stmt::Command { arguments, .. }) => Some(arguments.clone()),
            _ => None,
        })
        .unwrap();
    let text: Vec<_> = arguments.iter().map(|&a| ast.to_source(a)).collect();
    assert_eq!(text, vec!["'long'", "'g'"]);
}

#[test]
fn test_import_items() {
    let result = parse("import pkg.fn pkg.sub.*\n");
    let ast = ast(&result);
    let items = ast
        .ids()
        .find_map(|id| match ast.stmt(id) {
            Some(Stmt::Import { items }) => Some(items.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        items,
        vec![
            ImportItem {
                path: "pkg.fn".into(),
                wildcard: false
            },
            ImportItem {
                path: "pkg.sub".into(),
                wildcard: true
            },
        ]
    );
}

#[test]
fn test_justify_pragma() {
    let result = parse("%| pragma Justify(mh_lint, \"naming\", \"legacy name\");\nx = 1;\n");
    let ast = ast(&result);
    let pragma = ast
        .ids()
        .find_map(|id| match ast.stmt(id) {
            Some(Stmt::Pragma(pragma)) => Some(pragma.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        pragma,
        Pragma::Justify {
            tool: "mh_lint".into(),
            tag: "naming".into(),
            reason: "legacy name".into(),
        }
    );
}

#[test]
fn test_break_inside_loop_body_if() {
    let result = parse("for i = 1:3\n  if i > 1\n    break\n  end\nend\n");
    assert!(result.is_ok());
    assert_eq!(count_kind(ast(&result), "Break_Statement"), 1);
}

// ============================================================================
// Octave statements
// ============================================================================

#[test]
fn test_octave_do_until() {
    let result = parse_octave("x = 0;\ndo\n  x = x + 1;\nuntil x > 3\n");
    let ast = ast(&result);
    assert_eq!(count_kind(ast, "Do_Until_Statement"), 1);
}

#[test]
fn test_octave_unwind_protect() {
    let src = "unwind_protect\n  f();\nunwind_protect_cleanup\n  g();\nend_unwind_protect\n";
    let result = parse_octave(src);
    let ast = ast(&result);
    assert_eq!(count_kind(ast, "Unwind_Protect_Statement"), 1);
}

#[rstest]
#[case("if a\n  x = 1;\nendif\n")]
#[case("while a\n  x = 1;\nendwhile\n")]
#[case("for i = 1:2\n  x = i;\nendfor\n")]
#[case("switch a\n  case 1\n    x = 1;\nendswitch\n")]
#[case("try\n  x = 1;\nend_try_catch\n")]
fn test_octave_specific_closers(#[case] src: &str) {
    let result = parse_octave(src);
    assert!(result.is_ok(), "{}", src);
}

// ============================================================================
// Errors
// ============================================================================

#[rstest]
#[case("[~ y] = f();\n", "E0307")]
#[case("break\n", "E0501")]
#[case("function f()\n  for i = 1:2\n  end\n  continue\nend\n", "E0501")]
#[case("1 = x;\n", "E0402")]
#[case("f() + 1 = x;\n", "E0402")]
#[case("if a\n  x = 1;\n", "E0205")]
#[case("x = 1;\nend\n", "E0901")]
#[case("x = 1;\nelse\n", "E0901")]
#[case("x = 1 y = 2;\n", "E0201")]
#[case("global\n", "E0301")]
#[case("%| pragma Unknown\n", "E0502")]
fn test_statement_errors(#[case] src: &str, #[case] code: &str) {
    let result = parse(src);
    assert!(!result.is_ok(), "{}", src);
    assert_eq!(error_code(&result).as_deref(), Some(code), "{}", src);
}

#[test]
fn test_missing_end_points_at_opener() {
    let result = parse("while a\n  x = 1;\n");
    let error = result.diagnostics.iter().find(|d| d.fatal).unwrap();
    assert!(error.message.contains("'while'"));
}

//! Parser Tests - Expressions
//!
//! Operator precedence and associativity, primaries, index contexts
//! and the printed form of parsed expressions.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{ast, error_code, first_rhs, parse};
use matlint::diagnostics::{CheckSeverity, DiagnosticKind, codes};
use matlint::parser::Operator;
use matlint::syntax::{Ast, Expr, Node, NodeId};
use rstest::rstest;

fn binary(ast: &Ast, id: NodeId) -> (Operator, NodeId, NodeId) {
    match ast.expr(id) {
        Some(Expr::Binary { op, lhs, rhs }) => (*op, *lhs, *rhs),
        other => panic!("expected binary operation, got {:?}", other),
    }
}

fn number(ast: &Ast, id: NodeId) -> &str {
    match ast.expr(id) {
        Some(Expr::Number(text)) => text.as_str(),
        other => panic!("expected number, got {:?}", other),
    }
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let result = parse("x = 1 + 2 * 3;\n");
    let ast = ast(&result);
    let (op, lhs, rhs) = binary(ast, first_rhs(ast));
    assert_eq!(op, Operator::Plus);
    assert_eq!(number(ast, lhs), "1");
    assert_eq!(binary(ast, rhs).0, Operator::Times);
}

#[test]
fn test_power_is_left_associative() {
    let result = parse("x = 2^3^2;\n");
    let ast = ast(&result);
    let (op, lhs, rhs) = binary(ast, first_rhs(ast));
    assert_eq!(op, Operator::Power);
    assert_eq!(number(ast, rhs), "2");
    let (inner, base, exponent) = binary(ast, lhs);
    assert_eq!(inner, Operator::Power);
    assert_eq!(number(ast, base), "2");
    assert_eq!(number(ast, exponent), "3");
}

#[test]
fn test_prefix_operator_in_exponent_takes_power_chain() {
    let result = parse("x = 2^-3^2;\n");
    let ast = ast(&result);
    let (op, lhs, rhs) = binary(ast, first_rhs(ast));
    assert_eq!(op, Operator::Power);
    assert_eq!(number(ast, lhs), "2");
    let operand = match ast.expr(rhs) {
        Some(Expr::Unary { op: Operator::Minus, operand }) => *operand,
        other => panic!("expected negation, got {:?}", other),
    };
    assert_eq!(binary(ast, operand).0, Operator::Power);
}

#[test]
fn test_unary_minus_binds_looser_than_power() {
    let result = parse("x = -2^2;\n");
    let ast = ast(&result);
    match ast.expr(first_rhs(ast)) {
        Some(Expr::Unary { op: Operator::Minus, operand }) => {
            assert_eq!(binary(ast, *operand).0, Operator::Power)
        }
        other => panic!("expected negation, got {:?}", other),
    }
}

#[test]
fn test_range_with_stride() {
    let result = parse("x = 1:2:10;\n");
    let ast = ast(&result);
    match ast.expr(first_rhs(ast)) {
        Some(Expr::Range {
            first,
            stride: Some(stride),
            last,
        }) => {
            assert_eq!(number(ast, *first), "1");
            assert_eq!(number(ast, *stride), "2");
            assert_eq!(number(ast, *last), "10");
        }
        other => panic!("expected range, got {:?}", other),
    }
}

fn range_parts(ast: &Ast, id: NodeId) -> (NodeId, Option<NodeId>, NodeId) {
    match ast.expr(id) {
        Some(Expr::Range { first, stride, last }) => (*first, *stride, *last),
        other => panic!("expected range, got {:?}", other),
    }
}

#[rstest]
#[case("x = 1:2:3:4;\n", false, "4")]
#[case("x = 1:2:3:4:5;\n", true, "5")]
fn test_range_chains_to_the_left(#[case] src: &str, #[case] outer_stride: bool, #[case] last: &str) {
    let result = parse(src);
    let ast = ast(&result);
    let (inner, stride, outer_last) = range_parts(ast, first_rhs(ast));
    assert_eq!(stride.is_some(), outer_stride, "{}", src);
    assert_eq!(number(ast, outer_last), last);

    let (first, inner_stride, inner_last) = range_parts(ast, inner);
    assert_eq!(number(ast, first), "1");
    assert_eq!(inner_stride.map(|s| number(ast, s)), Some("2"));
    assert_eq!(number(ast, inner_last), "3");
}

#[rstest]
#[case("x = a || b && c;\n", Operator::ShortCircuitOr)]
#[case("x = a | b & c;\n", Operator::ElementOr)]
#[case("x = a & b == c;\n", Operator::ElementAnd)]
#[case("x = a == b + c;\n", Operator::Equal)]
#[case("x = a + b .* c;\n", Operator::Plus)]
fn test_loosest_operator_is_root(#[case] src: &str, #[case] expected: Operator) {
    let result = parse(src);
    let ast = ast(&result);
    assert_eq!(binary(ast, first_rhs(ast)).0, expected, "{}", src);
}

#[test]
fn test_chained_relational_is_flagged() {
    let result = parse("x = a < b < c;\n");
    assert!(result.is_ok());
    let checks: Vec<_> = result.diagnostics.of_kind(DiagnosticKind::Check).collect();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].severity, Some(CheckSeverity::Medium));
    assert_eq!(checks[0].code.as_deref(), Some(codes::CHAINED_RELATIONAL));

    let single = parse("x = a < b;\n");
    assert_eq!(single.diagnostics.check_count(), 0);
}

// ============================================================================
// Primaries
// ============================================================================

#[rstest]
#[case("x = a.b.c;\n", "Selection")]
#[case("x = s.(name);\n", "Dynamic_Selection")]
#[case("x = f(1, 2);\n", "Reference")]
#[case("x = c{1};\n", "Cell_Reference")]
#[case("x = [1 2; 3 4];\n", "Matrix_Expression")]
#[case("x = {1, 'a'};\n", "Cell_Expression")]
#[case("x = @sin;\n", "Function_Pointer")]
#[case("x = @(t) t + 1;\n", "Lambda_Function")]
#[case("x = ?pkg.Cls;\n", "Metaclass")]
#[case("x = \"text\";\n", "String_Literal")]
#[case("x = a';\n", "Postfix_Operation")]
fn test_primary_kinds(#[case] src: &str, #[case] kind: &str) {
    let result = parse(src);
    let ast = ast(&result);
    assert_eq!(ast.kind_name(first_rhs(ast)), kind, "{}", src);
}

#[rstest]
#[case("x = {@(x) x, 2};\n", &["Lambda_Function", "Number_Literal"])]
#[case("x = [@(x) x+1];\n", &["Lambda_Function"])]
#[case("x = {@(a, b) a * b @sin};\n", &["Lambda_Function", "Function_Pointer"])]
fn test_lambda_inside_literal(#[case] src: &str, #[case] items: &[&str]) {
    let result = parse(src);
    let ast = ast(&result);
    let row = ast
        .ids()
        .find_map(|id| match ast.node(id) {
            Node::Row(row) => Some(row.items.clone()),
            _ => None,
        })
        .unwrap();
    let kinds: Vec<_> = row.iter().map(|&id| ast.kind_name(id)).collect();
    assert_eq!(kinds, items, "{:?}", src);
}

#[test]
fn test_end_and_colon_inside_index() {
    let result = parse("x = a(end, :);\n");
    let ast = ast(&result);
    match ast.expr(first_rhs(ast)) {
        Some(Expr::Reference { arguments, .. }) => {
            assert_eq!(ast.expr(arguments[0]), Some(&Expr::IndexEnd));
            assert_eq!(ast.expr(arguments[1]), Some(&Expr::Reshape));
        }
        other => panic!("expected reference, got {:?}", other),
    }
}

#[test]
fn test_superclass_reference() {
    let result = parse("method@Base(obj);\n");
    let ast = ast(&result);
    assert!(ast.ids().any(|id| ast.kind_name(id) == "Superclass_Reference"));
}

#[rstest]
#[case("x = end;\n", "E0404")]
#[case("x = (1 + 2;\n", "E0202")]
#[case("x = [1 2;\n", "E0203")]
#[case("x = * 2;\n", "E0403")]
#[case("x = ;\n", "E0401")]
fn test_expression_errors(#[case] src: &str, #[case] code: &str) {
    let result = parse(src);
    assert!(!result.is_ok(), "{}", src);
    assert_eq!(error_code(&result).as_deref(), Some(code), "{}", src);
}

// ============================================================================
// Print form
// ============================================================================

#[rstest]
#[case("x = (a + b) * c;\n", "(a + b) * c")]
#[case("x = a - (b - c);\n", "a - (b - c)")]
#[case("x = -a.^2;\n", "-a.^2")]
#[case("x = s.data{end}(2);\n", "s.data{end}(2)")]
#[case("x = a':b;\n", "a':b")]
fn test_print_reparse(#[case] src: &str, #[case] printed: &str) {
    let result = parse(src);
    let tree = ast(&result);
    let text = tree.to_source(first_rhs(tree));
    assert_eq!(text, printed);

    let again = parse(&format!("x = {};\n", text));
    let again_tree = ast(&again);
    assert_eq!(again_tree.dump(), tree.dump());
}

#[test]
fn test_redundant_brackets_are_reported() {
    let result = parse("x = ((a));\n");
    assert!(result.is_ok());
    let codes: Vec<_> = helpers::style_codes(&result);
    assert_eq!(codes, vec![codes::REDUNDANT_BRACKETS.to_string()]);
    assert_eq!(result.fixes.repair_count(), 2);
}

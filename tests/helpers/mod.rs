//! Shared helpers for parser integration tests.

#![allow(dead_code)]

use matlint::diagnostics::{Diagnostic, DiagnosticKind};
use matlint::parser::{Dialect, ParseOptions, ParseResult, parse_source};
use matlint::syntax::{Ast, NodeId, Stmt};

/// Parse MATLAB source, panicking only on internal parser errors.
pub fn parse(src: &str) -> ParseResult {
    parse_source("t.m", src, &ParseOptions::default()).expect("internal parser error")
}

/// Parse Octave source.
pub fn parse_octave(src: &str) -> ParseResult {
    parse_source("t.m", src, &ParseOptions::default().with_dialect(Dialect::Octave))
        .expect("internal parser error")
}

/// Parse and return the tree, failing with the diagnostics if there is none.
pub fn ast(result: &ParseResult) -> &Ast {
    match &result.ast {
        Some(ast) => ast,
        None => panic!("parse failed:\n{}", render(result.diagnostics.diagnostics())),
    }
}

/// Code of the fatal error, if the parse stopped.
pub fn error_code(result: &ParseResult) -> Option<String> {
    result
        .diagnostics
        .of_kind(DiagnosticKind::Error)
        .find(|d| d.fatal)
        .and_then(|d| d.code.as_deref().map(str::to_string))
}

/// Codes of all style issues, in report order.
pub fn style_codes(result: &ParseResult) -> Vec<String> {
    result
        .diagnostics
        .of_kind(DiagnosticKind::StyleIssue)
        .filter_map(|d| d.code.as_deref().map(str::to_string))
        .collect()
}

pub fn count_kind(ast: &Ast, kind_name: &str) -> usize {
    ast.ids().filter(|&id| ast.kind_name(id) == kind_name).count()
}

/// Right-hand side of the first simple assignment.
pub fn first_rhs(ast: &Ast) -> NodeId {
    ast.ids()
        .find_map(|id| match ast.stmt(id) {
            Some(Stmt::Assignment { rhs, .. }) => Some(*rhs),
            _ => None,
        })
        .expect("no assignment in tree")
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}

//! Statement termination
//!
//! Every statement rule ends with [`match_eos`]. It consumes the run of
//! `;`, `,` and newline tokens after the statement, classifies the first
//! one against what the statement expects and records autofix
//! instructions for anything that deviates. Only a missing terminator
//! with something else on the same line is fatal, and only when the
//! caller does not allow it.

use super::expressions::ExpressionParser;
use crate::diagnostics::{Diagnostic, codes};
use crate::parser::errors::{ErrorCode, ParseError};
use crate::parser::token::{TokenId, TokenKind};
use crate::syntax::NodeId;

/// Terminator a statement expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminator {
    /// `;` then a newline (assignments, expression statements)
    Semicolon,
    /// A bare newline (block headers, `end`, declarations)
    Newline,
    /// `;` or a newline (class-body items, command form)
    Any,
}

fn style<P: ExpressionParser>(p: &mut P, token: TokenId, message: &str, code: &str) {
    let location = p.location_of(token);
    p.diagnostics()
        .add(Diagnostic::style_issue(location, message, true).with_code(code));
}

/// Consume the end of a statement.
///
/// `node` receives a link from every consumed terminator; pass `None`
/// for block headers whose node does not exist yet and link the returned
/// tokens later. With `allow_nothing`, a statement directly followed by
/// another one on the same line is accepted with a style issue.
pub fn match_eos<P: ExpressionParser>(
    p: &mut P,
    node: Option<NodeId>,
    terminator: Terminator,
    allow_nothing: bool,
) -> Result<Vec<TokenId>, ParseError> {
    let last = p.last_token();
    let mut consumed = Vec::new();

    let first = p
        .next_token()
        .filter(|t| !t.annotation && t.kind.is_terminator())
        .map(|t| t.kind);

    let Some(first) = first else {
        if p.at_eof() {
            if let Some(last) = last {
                if terminator == Terminator::Semicolon {
                    p.fix(last).add_semicolon = true;
                    style(p, last, "statement is not terminated by ';'", codes::TERMINATION);
                }
                if !p.ends_with_newline() {
                    p.fix(last).add_newline = true;
                    style(p, last, "file does not end with a newline", codes::FILE_END);
                }
            }
            return Ok(consumed);
        }
        if allow_nothing {
            if let Some(last) = last {
                p.fix(last).add_newline = true;
                style(p, last, "statement should be followed by a newline", codes::MISSING_NEWLINE);
            }
            return Ok(consumed);
        }
        return Err(p.error_here(
            ErrorCode::E0201,
            format!("expected end of statement, found {}", p.found()),
        ));
    };

    let token = p.advance()?;
    p.fix(token).statement_terminator = true;
    consumed.push(token);

    let mut newline_seen = first == TokenKind::Newline;
    let mut replaced = false;
    match (terminator, first) {
        (Terminator::Semicolon, TokenKind::Semicolon)
        | (Terminator::Newline, TokenKind::Newline)
        | (Terminator::Any, TokenKind::Semicolon | TokenKind::Newline) => {}
        (Terminator::Semicolon, TokenKind::Comma) => {
            p.fix(token).change_to_semicolon = true;
            style(p, token, "use ';' to terminate this statement", codes::TERMINATION);
        }
        (Terminator::Semicolon, _) => {
            if let Some(last) = last {
                p.fix(last).add_semicolon = true;
                style(p, last, "statement is not terminated by ';'", codes::TERMINATION);
            }
            newline_seen = true;
        }
        _ => {
            let followed_by_end = p.at_eof()
                || p.next_token()
                    .is_some_and(|t| !t.annotation && t.kind.is_terminator());
            let fix = p.fix(token);
            fix.spurious = true;
            if followed_by_end {
                fix.delete = true;
                style(p, token, "redundant statement terminator", codes::REDUNDANT_TERMINATOR);
            } else {
                fix.replace_with_newline = true;
                replaced = true;
                style(p, token, "statement should end with a newline", codes::MISSING_NEWLINE);
            }
        }
    }

    if !newline_seen {
        while p.peek(TokenKind::Semicolon) || p.peek(TokenKind::Comma) {
            let extra = p.advance()?;
            let fix = p.fix(extra);
            fix.statement_terminator = true;
            fix.spurious = true;
            fix.delete = true;
            style(p, extra, "redundant statement terminator", codes::REDUNDANT_TERMINATOR);
            consumed.push(extra);
        }
        let tail = consumed.last().copied().unwrap_or(token);
        if p.peek(TokenKind::Newline) {
            let newline = p.advance()?;
            p.fix(newline).statement_terminator = true;
            consumed.push(newline);
        } else if p.at_eof() {
            if !p.ends_with_newline() {
                p.fix(tail).add_newline = true;
                style(p, tail, "file does not end with a newline", codes::FILE_END);
            }
        } else if !replaced {
            p.fix(tail).add_newline = true;
            style(p, tail, "more than one statement on this line", codes::MISSING_NEWLINE);
        }
    }

    tracing::trace!(?terminator, count = consumed.len(), "end of statement");
    if let Some(node) = node {
        p.link_all(&consumed, node)?;
    }
    Ok(consumed)
}

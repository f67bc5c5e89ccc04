//! Statement parsing
//!
//! One rule per statement kind. Each rule consumes its keyword, builds
//! the node and finishes with [`match_eos`]. Compound statements parse
//! their bodies with [`parse_delimited_input`], which only differs
//! between constructs in the set of keywords that close it.

use smol_str::SmolStr;

use super::expressions::{ExpressionParser, parse_expression, parse_identifier, parse_name_chain};
use super::termination::{Terminator, match_eos};
use super::units::parse_function_def;
use crate::diagnostics::{Diagnostic, codes};
use crate::parser::context::{ContextKind, ContextStack};
use crate::parser::errors::{ErrorCode, ParseError, SyntaxError, format_context_error};
use crate::parser::options::Dialect;
use crate::parser::token::{Keyword, Operator, TokenId, TokenKind};
use crate::syntax::{
    Action, ActionKind, Expr, FunctionScope, ImportItem, Node, NodeId, Pragma, Sequence, Stmt,
};

const IF_CLOSERS: &[Keyword] = &[Keyword::Elseif, Keyword::Else, Keyword::End, Keyword::EndIf];
const ELSE_CLOSERS: &[Keyword] = &[Keyword::End, Keyword::EndIf];
const SWITCH_CLOSERS: &[Keyword] = &[
    Keyword::Case,
    Keyword::Otherwise,
    Keyword::End,
    Keyword::EndSwitch,
];
const OTHERWISE_CLOSERS: &[Keyword] = &[Keyword::End, Keyword::EndSwitch];
const FOR_CLOSERS: &[Keyword] = &[Keyword::End, Keyword::EndFor];
const PARFOR_CLOSERS: &[Keyword] = &[Keyword::End, Keyword::EndParfor];
const WHILE_CLOSERS: &[Keyword] = &[Keyword::End, Keyword::EndWhile];
const TRY_CLOSERS: &[Keyword] = &[Keyword::Catch, Keyword::End, Keyword::EndTryCatch];
const CATCH_CLOSERS: &[Keyword] = &[Keyword::End, Keyword::EndTryCatch];
const SPMD_CLOSERS: &[Keyword] = &[Keyword::End, Keyword::EndSpmd];
const DO_CLOSERS: &[Keyword] = &[Keyword::Until];
const UNWIND_CLOSERS: &[Keyword] = &[Keyword::UnwindProtectCleanup];
const CLEANUP_CLOSERS: &[Keyword] = &[Keyword::EndUnwindProtect, Keyword::End];

/// Parser state needed by statement, function and class rules
pub trait StatementParser: ExpressionParser {
    fn dialect(&self) -> Dialect;
    fn context(&self) -> &ContextStack;
    fn context_mut(&mut self) -> &mut ContextStack;

    /// Set once the first function closed by `end` has been seen
    fn functions_require_end(&self) -> bool;
    fn require_function_end(&mut self);

    fn peek_value(&self, kind: TokenKind, value: &str) -> bool;
    fn apeek(&self, kind: TokenKind) -> bool;
    fn apeek_value(&self, kind: TokenKind, value: &str) -> bool;
    fn amatch(&mut self, kind: TokenKind) -> Result<TokenId, ParseError>;
    fn amatch_value(&mut self, kind: TokenKind, value: &str) -> Result<TokenId, ParseError>;
    fn match_value(&mut self, kind: TokenKind, value: &str) -> Result<TokenId, ParseError>;
    fn match_eof(&mut self) -> Result<(), ParseError>;

    /// Flag the next token as the first of a statement
    fn mark_statement_start(&mut self);
    /// Comment tokens skipped between the last consumed token and the next one
    fn comments_before_next(&self) -> Vec<TokenId>;

    fn detach_nested(&mut self, function: NodeId) -> Result<Vec<NodeId>, ParseError>;
    fn set_scope(&mut self, function: NodeId, scope: FunctionScope);
    /// Record `comments` as the documentation of a definition; attached
    /// once the whole file has parsed
    fn defer_docstring(&mut self, definition: NodeId, comments: Vec<TokenId>);

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        self.peek(TokenKind::Keyword(keyword))
    }

    fn next_keyword(&self) -> Option<Keyword> {
        self.next_token()
            .filter(|t| !t.annotation)
            .and_then(|t| t.keyword())
    }
}

/// Statements of a delimited body plus the functions nested in it
pub struct Delimited {
    pub sequence: NodeId,
    pub nested: Vec<NodeId>,
}

/// Keywords that close some construct
fn is_closer(keyword: Keyword) -> bool {
    keyword.is_end()
        || matches!(
            keyword,
            Keyword::Else
                | Keyword::Elseif
                | Keyword::Case
                | Keyword::Otherwise
                | Keyword::Catch
                | Keyword::Until
                | Keyword::UnwindProtectCleanup
        )
}

/// Skip empty lines and stray separators before a statement
pub fn skip_blank<P: StatementParser>(p: &mut P) -> Result<(), ParseError> {
    loop {
        if p.peek(TokenKind::Newline) {
            p.advance()?;
        } else if p.peek(TokenKind::Semicolon) || p.peek(TokenKind::Comma) {
            let token = p.advance()?;
            let fix = p.fix(token);
            fix.spurious = true;
            fix.delete = true;
            let location = p.location_of(token);
            p.diagnostics().add(
                Diagnostic::style_issue(location, "redundant statement terminator", true)
                    .with_code(codes::REDUNDANT_TERMINATOR),
            );
        } else {
            return Ok(());
        }
    }
}

/// Fail on a closing keyword that does not belong to the enclosing construct
pub fn reject_closer<P: StatementParser>(p: &P) -> Result<(), ParseError> {
    match p.next_keyword() {
        Some(keyword) if is_closer(keyword) => Err(format_context_error(
            &format!("'{}'", keyword),
            p.context().top(),
            p.next_location(),
            ErrorCode::E0901,
        )
        .into()),
        _ => Ok(()),
    }
}

/// Statements up to (not including) one of `closers` or the end of file.
///
/// A `function` keyword starts a nested function definition, which is
/// only legal directly inside a function body.
pub fn parse_delimited_input<P: StatementParser>(
    p: &mut P,
    closers: &[Keyword],
) -> Result<Delimited, ParseError> {
    let mut statements = Vec::new();
    let mut nested = Vec::new();
    let mut location = None;
    loop {
        skip_blank(p)?;
        if p.at_eof() {
            break;
        }
        if let Some(keyword) = p.next_keyword() {
            if closers.contains(&keyword) {
                break;
            }
            if keyword == Keyword::Function {
                nested.push(parse_function_def(p, FunctionScope::Nested)?);
                continue;
            }
        }
        reject_closer(p)?;
        location.get_or_insert_with(|| p.next_location());
        statements.push(parse_statement(p)?);
    }
    let location = location.unwrap_or_else(|| p.next_location());
    let sequence = p.alloc(Node::Sequence(Sequence { statements }), None, location)?;
    Ok(Delimited { sequence, nested })
}

/// Consume the closing `end` (or its Octave spelling `specific`) of the
/// construct opened by `opener`
pub fn match_end<P: StatementParser>(
    p: &mut P,
    opener: TokenId,
    specific: Keyword,
) -> Result<TokenId, ParseError> {
    if p.peek_keyword(Keyword::End) || p.peek_keyword(specific) {
        return p.advance();
    }
    let keyword = p.token(opener).value.clone();
    Err(SyntaxError::builder(ErrorCode::E0205, p.next_location())
        .message(format!("expected 'end' to close '{}', found {}", keyword, p.found()))
        .related(format!("'{}' opened here", keyword), p.location_of(opener))
        .build()
        .into())
}

// ============================================================================
// Dispatch
// ============================================================================

pub fn parse_statement<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    if p.apeek_value(TokenKind::Identifier, "pragma") {
        return parse_pragma(p);
    }
    if p.next_token().is_some_and(|t| t.annotation) {
        return Err(p.error_here(ErrorCode::E0901, "unexpected annotation".to_string()));
    }
    p.mark_statement_start();

    let Some(kind) = p.next_token().map(|t| t.kind) else {
        return Err(p.error_here(ErrorCode::E0401, "expected statement, found end of file".to_string()));
    };
    match kind {
        TokenKind::Keyword(keyword) => match keyword {
            Keyword::If => parse_if(p),
            Keyword::Switch => parse_switch(p),
            Keyword::For => parse_for(p),
            Keyword::Parfor => parse_parfor(p),
            Keyword::While => parse_while(p),
            Keyword::Try => parse_try(p),
            Keyword::Spmd => parse_spmd(p),
            Keyword::Do => parse_do_until(p),
            Keyword::UnwindProtect => parse_unwind_protect(p),
            Keyword::Global | Keyword::Persistent => parse_declaration(p, keyword),
            Keyword::Import => parse_import(p),
            Keyword::Break | Keyword::Continue => parse_loop_control(p, keyword),
            Keyword::Return => parse_return(p),
            Keyword::Function | Keyword::Classdef => Err(format_context_error(
                &format!("'{}'", keyword),
                p.context().top(),
                p.next_location(),
                ErrorCode::E0502,
            )
            .into()),
            _ => Err(format_context_error(
                &format!("'{}'", keyword),
                p.context().top(),
                p.next_location(),
                ErrorCode::E0901,
            )
            .into()),
        },
        TokenKind::Bang => parse_shell_escape(p),
        TokenKind::ABracket => parse_compound_assignment(p),
        TokenKind::Identifier if p.next2_token().is_some_and(|t| t.command) => parse_command(p),
        _ => parse_simple_statement(p),
    }
}

// ============================================================================
// Simple statements
// ============================================================================

fn is_assignable(expr: Option<&Expr>) -> bool {
    matches!(
        expr,
        Some(
            Expr::Identifier(_)
                | Expr::Selection { .. }
                | Expr::DynamicSelection { .. }
                | Expr::Reference { .. }
                | Expr::CellReference { .. }
        )
    )
}

/// `lhs = rhs` or a naked expression
fn parse_simple_statement<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let expr = parse_expression(p)?;
    if !p.peek(TokenKind::Assignment) {
        let location = p.ast().location(expr).clone();
        let id = p.alloc(Node::Stmt(Stmt::Expression { expr }), None, location)?;
        match_eos(p, Some(id), Terminator::Semicolon, false)?;
        return Ok(id);
    }

    if !is_assignable(p.ast().expr(expr)) {
        let location = p.ast().location(expr).clone();
        let kind = p.ast().kind_name(expr);
        return Err(SyntaxError::new(
            format!("cannot assign to {}", kind),
            location,
            ErrorCode::E0402,
        )
        .into());
    }
    let eq = p.advance()?;
    let rhs = parse_expression(p)?;
    let location = p.location_of(eq);
    let id = p.alloc(Node::Stmt(Stmt::Assignment { lhs: expr, rhs }), Some(eq), location)?;
    match_eos(p, Some(id), Terminator::Semicolon, false)?;
    Ok(id)
}

/// `[a, ~, c] = rhs`. A `~` target must be followed by `,` or `]`:
/// `[~ y]` would read as `[~y]`.
fn parse_compound_assignment<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let open = p.match_kind(TokenKind::ABracket)?;
    let mut targets = Vec::new();
    let mut tokens = vec![open];
    while !p.peek(TokenKind::AKet) {
        if p.peek(TokenKind::Comma) {
            tokens.push(p.advance()?);
            continue;
        }
        if p.peek(TokenKind::Operator(Operator::Not)) {
            let tilde = p.advance()?;
            targets.push(p.alloc_expr(Expr::Ignored, tilde)?);
            if !p.peek(TokenKind::Comma) && !p.peek(TokenKind::AKet) {
                return Err(SyntaxError::builder(ErrorCode::E0307, p.location_of(tilde))
                    .hint("separate '~' from the next output with ','")
                    .build()
                    .into());
            }
            continue;
        }
        if !p.peek(TokenKind::Identifier) {
            return Err(p.error_here(
                ErrorCode::E0402,
                format!("expected assignment target, found {}", p.found()),
            ));
        }
        let target = parse_name_chain(p)?;
        if !is_assignable(p.ast().expr(target)) {
            let location = p.ast().location(target).clone();
            return Err(SyntaxError::new("invalid assignment target", location, ErrorCode::E0402).into());
        }
        targets.push(target);
    }
    tokens.push(p.advance()?);
    let eq = p.match_kind(TokenKind::Assignment)?;
    let rhs = parse_expression(p)?;
    let location = p.location_of(eq);
    let id = p.alloc(
        Node::Stmt(Stmt::CompoundAssignment { targets, rhs }),
        Some(eq),
        location,
    )?;
    p.link_all(&tokens, id)?;
    match_eos(p, Some(id), Terminator::Semicolon, false)?;
    Ok(id)
}

/// `hold on`
fn parse_command<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let name = parse_identifier(p)?;
    let mut arguments = Vec::new();
    while p.next_token().is_some_and(|t| t.command && t.kind == TokenKind::CharArray) {
        let token = p.advance()?;
        let value = p.token(token).value.clone();
        arguments.push(p.alloc_expr(Expr::CharArray(value), token)?);
    }
    let location = p.ast().location(name).clone();
    let id = p.alloc(Node::Stmt(Stmt::Command { name, arguments }), None, location)?;
    match_eos(p, Some(id), Terminator::Any, false)?;
    Ok(id)
}

fn alloc_keyword_statement<P: StatementParser>(
    p: &mut P,
    stmt: Stmt,
    keyword: TokenId,
) -> Result<NodeId, ParseError> {
    let location = p.location_of(keyword);
    p.alloc(Node::Stmt(stmt), Some(keyword), location)
}

fn parse_loop_control<P: StatementParser>(p: &mut P, keyword: Keyword) -> Result<NodeId, ParseError> {
    if !p.context().in_context(ContextKind::Loop) {
        return Err(p.error_here(
            ErrorCode::E0501,
            format!("'{}' is only valid inside a loop", keyword),
        ));
    }
    let token = p.advance()?;
    let stmt = if keyword == Keyword::Break {
        Stmt::Break
    } else {
        Stmt::Continue
    };
    let id = alloc_keyword_statement(p, stmt, token)?;
    match_eos(p, Some(id), Terminator::Newline, false)?;
    Ok(id)
}

fn parse_return<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let token = p.advance()?;
    let id = alloc_keyword_statement(p, Stmt::Return, token)?;
    match_eos(p, Some(id), Terminator::Newline, false)?;
    Ok(id)
}

/// `global a b` / `persistent a b`
fn parse_declaration<P: StatementParser>(p: &mut P, keyword: Keyword) -> Result<NodeId, ParseError> {
    let token = p.advance()?;
    let mut names = Vec::new();
    while p.peek(TokenKind::Identifier) {
        names.push(parse_identifier(p)?);
    }
    if names.is_empty() {
        return Err(p.error_here(
            ErrorCode::E0301,
            format!("expected identifier after '{}', found {}", keyword, p.found()),
        ));
    }
    let stmt = if keyword == Keyword::Global {
        Stmt::Global { names }
    } else {
        Stmt::Persistent { names }
    };
    let id = alloc_keyword_statement(p, stmt, token)?;
    match_eos(p, Some(id), Terminator::Newline, false)?;
    Ok(id)
}

/// `import pkg.fn pkg.sub.*`
fn parse_import<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let token = p.advance()?;
    let mut items = Vec::new();
    let mut tokens = Vec::new();
    while p.peek(TokenKind::Identifier) {
        let first = p.advance()?;
        tokens.push(first);
        let mut path = p.token(first).value.to_string();
        let mut wildcard = false;
        loop {
            if p.peek(TokenKind::Selection) && p.peek2(TokenKind::Identifier) {
                tokens.push(p.advance()?);
                let part = p.advance()?;
                tokens.push(part);
                path.push('.');
                path.push_str(&p.token(part).value);
            } else if p.peek(TokenKind::Operator(Operator::ElementTimes)) {
                tokens.push(p.advance()?);
                wildcard = true;
                break;
            } else {
                break;
            }
        }
        items.push(ImportItem {
            path: SmolStr::new(path),
            wildcard,
        });
    }
    let id = alloc_keyword_statement(p, Stmt::Import { items }, token)?;
    p.link_all(&tokens, id)?;
    match_eos(p, Some(id), Terminator::Newline, false)?;
    Ok(id)
}

/// `!ls -l`
fn parse_shell_escape<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let token = p.advance()?;
    let command = p.token(token).value.clone();
    let id = alloc_keyword_statement(p, Stmt::ShellEscape { command }, token)?;
    match_eos(p, Some(id), Terminator::Newline, false)?;
    Ok(id)
}

/// `%| pragma Justify(tool, "tag", "reason");` or `%| pragma No_Tracing;`
fn parse_pragma<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let keyword = p.amatch_value(TokenKind::Identifier, "pragma")?;
    let name = p.amatch(TokenKind::Identifier)?;
    let mut tokens = vec![name];
    let pragma_name = p.token(name).value.clone();
    let pragma = match pragma_name.as_str() {
        "Justify" => {
            tokens.push(p.amatch(TokenKind::LParen)?);
            let tool = p.amatch(TokenKind::Identifier)?;
            tokens.push(tool);
            tokens.push(p.amatch(TokenKind::Comma)?);
            let tag = match_annotation_text(p)?;
            tokens.push(tag);
            tokens.push(p.amatch(TokenKind::Comma)?);
            let reason = match_annotation_text(p)?;
            tokens.push(reason);
            tokens.push(p.amatch(TokenKind::RParen)?);
            Pragma::Justify {
                tool: p.token(tool).value.clone(),
                tag: p.token(tag).value.clone(),
                reason: p.token(reason).value.clone(),
            }
        }
        "No_Tracing" => Pragma::NoTracing,
        other => {
            return Err(SyntaxError::new(
                format!("unknown pragma '{}'", other),
                p.location_of(name),
                ErrorCode::E0502,
            )
            .into());
        }
    };
    if p.apeek(TokenKind::Semicolon) {
        let semicolon = p.amatch(TokenKind::Semicolon)?;
        p.fix(semicolon).statement_terminator = true;
        tokens.push(semicolon);
    }
    let id = alloc_keyword_statement(p, Stmt::Pragma(pragma), keyword)?;
    p.link_all(&tokens, id)?;
    Ok(id)
}

fn match_annotation_text<P: StatementParser>(p: &mut P) -> Result<TokenId, ParseError> {
    if p.apeek(TokenKind::CharArray) {
        p.amatch(TokenKind::CharArray)
    } else {
        p.amatch(TokenKind::String)
    }
}

// ============================================================================
// Compound statements
// ============================================================================

/// `&` and `|` in an `if` or `while` guard short-circuit when both
/// operands are scalar. Telling that apart needs type information, so
/// no diagnostic is raised yet.
fn check_implicit_short_circuit<P: StatementParser>(_p: &mut P, _guard: NodeId) {}

fn parse_guard<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let guard = parse_expression(p)?;
    check_implicit_short_circuit(p, guard);
    Ok(guard)
}

fn alloc_action<P: StatementParser>(
    p: &mut P,
    kind: ActionKind,
    keyword: TokenId,
    guard: Option<NodeId>,
    body: NodeId,
    header: &[TokenId],
) -> Result<NodeId, ParseError> {
    let location = p.location_of(keyword);
    let id = p.alloc(Node::Action(Action { kind, guard, body }), Some(keyword), location)?;
    p.link_all(header, id)?;
    Ok(id)
}

/// Allocate a compound statement, link its header and closing tokens and
/// consume its terminator
fn finish_compound<P: StatementParser>(
    p: &mut P,
    stmt: Stmt,
    keyword: TokenId,
    tokens: &[TokenId],
) -> Result<NodeId, ParseError> {
    let id = alloc_keyword_statement(p, stmt, keyword)?;
    p.link_all(tokens, id)?;
    match_eos(p, Some(id), Terminator::Newline, true)?;
    Ok(id)
}

fn parse_if<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let if_token = p.advance()?;
    p.context_mut().push(ContextKind::If);
    let mut actions = Vec::new();

    let guard = parse_guard(p)?;
    let header = match_eos(p, None, Terminator::Newline, false)?;
    let body = parse_delimited_input(p, IF_CLOSERS)?.sequence;
    actions.push(alloc_action(p, ActionKind::If, if_token, Some(guard), body, &header)?);

    loop {
        if p.peek_keyword(Keyword::Elseif) {
            let keyword = p.advance()?;
            let guard = parse_guard(p)?;
            let header = match_eos(p, None, Terminator::Newline, false)?;
            let body = parse_delimited_input(p, IF_CLOSERS)?.sequence;
            actions.push(alloc_action(p, ActionKind::Elseif, keyword, Some(guard), body, &header)?);
        } else if p.peek_keyword(Keyword::Else) {
            // `else if` is an else branch holding a nested if
            let keyword = p.advance()?;
            let header = match_eos(p, None, Terminator::Newline, true)?;
            let body = parse_delimited_input(p, ELSE_CLOSERS)?.sequence;
            actions.push(alloc_action(p, ActionKind::Else, keyword, None, body, &header)?);
            break;
        } else {
            break;
        }
    }

    let end = match_end(p, if_token, Keyword::EndIf)?;
    p.context_mut().pop(ContextKind::If)?;

    // `if` already anchors the first action
    let location = p.location_of(if_token);
    let id = p.alloc(Node::Stmt(Stmt::If { actions }), None, location)?;
    p.link(end, id)?;
    match_eos(p, Some(id), Terminator::Newline, true)?;
    Ok(id)
}

fn parse_switch<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let switch_token = p.advance()?;
    p.context_mut().push(ContextKind::Switch);
    let subject = parse_expression(p)?;
    let mut tokens = match_eos(p, None, Terminator::Newline, false)?;
    let mut actions = Vec::new();

    loop {
        skip_blank(p)?;
        if p.peek_keyword(Keyword::Case) {
            let keyword = p.advance()?;
            let guard = parse_expression(p)?;
            let header = match_eos(p, None, Terminator::Newline, false)?;
            let body = parse_delimited_input(p, SWITCH_CLOSERS)?.sequence;
            actions.push(alloc_action(p, ActionKind::Case, keyword, Some(guard), body, &header)?);
        } else if p.peek_keyword(Keyword::Otherwise) {
            let keyword = p.advance()?;
            let header = match_eos(p, None, Terminator::Newline, true)?;
            let body = parse_delimited_input(p, OTHERWISE_CLOSERS)?.sequence;
            actions.push(alloc_action(p, ActionKind::Otherwise, keyword, None, body, &header)?);
            break;
        } else {
            break;
        }
    }

    tokens.push(match_end(p, switch_token, Keyword::EndSwitch)?);
    p.context_mut().pop(ContextKind::Switch)?;
    finish_compound(p, Stmt::Switch { subject, actions }, switch_token, &tokens)
}

/// `var = range` of a for or parfor header, optionally in parentheses.
/// Returns the variable, the range, the optional worker count and the
/// punctuation tokens.
fn parse_loop_header<P: StatementParser>(
    p: &mut P,
    allow_workers: bool,
) -> Result<(NodeId, NodeId, Option<NodeId>, Vec<TokenId>), ParseError> {
    let mut tokens = Vec::new();
    let parenthesised = p.peek(TokenKind::LParen);
    if parenthesised {
        tokens.push(p.advance()?);
    }
    let variable = parse_identifier(p)?;
    tokens.push(p.match_kind(TokenKind::Assignment)?);
    let range = parse_expression(p)?;
    let mut workers = None;
    if parenthesised {
        if allow_workers && p.peek(TokenKind::Comma) {
            tokens.push(p.advance()?);
            workers = Some(parse_expression(p)?);
        }
        tokens.push(p.match_kind(TokenKind::RParen)?);
    }
    Ok((variable, range, workers, tokens))
}

fn parse_for<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let for_token = p.advance()?;
    let (variable, range, _, mut tokens) = parse_loop_header(p, false)?;
    tokens.extend(match_eos(p, None, Terminator::Newline, false)?);

    p.context_mut().push(ContextKind::Loop);
    let body = parse_delimited_input(p, FOR_CLOSERS)?.sequence;
    tokens.push(match_end(p, for_token, Keyword::EndFor)?);
    p.context_mut().pop(ContextKind::Loop)?;

    finish_compound(p, Stmt::For { variable, range, body }, for_token, &tokens)
}

fn parse_parfor<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let parfor_token = p.advance()?;
    let (variable, range, workers, mut tokens) = parse_loop_header(p, true)?;
    tokens.extend(match_eos(p, None, Terminator::Newline, false)?);

    p.context_mut().push(ContextKind::Loop);
    let body = parse_delimited_input(p, PARFOR_CLOSERS)?.sequence;
    tokens.push(match_end(p, parfor_token, Keyword::EndParfor)?);
    p.context_mut().pop(ContextKind::Loop)?;

    let stmt = Stmt::Parfor {
        variable,
        range,
        workers,
        body,
    };
    finish_compound(p, stmt, parfor_token, &tokens)
}

fn parse_while<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let while_token = p.advance()?;
    let guard = parse_guard(p)?;
    let mut tokens = match_eos(p, None, Terminator::Newline, false)?;

    p.context_mut().push(ContextKind::Loop);
    let body = parse_delimited_input(p, WHILE_CLOSERS)?.sequence;
    tokens.push(match_end(p, while_token, Keyword::EndWhile)?);
    p.context_mut().pop(ContextKind::Loop)?;

    finish_compound(p, Stmt::While { guard, body }, while_token, &tokens)
}

fn parse_try<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let try_token = p.advance()?;
    let mut tokens = match_eos(p, None, Terminator::Newline, true)?;
    p.context_mut().push(ContextKind::Block);
    let body = parse_delimited_input(p, TRY_CLOSERS)?.sequence;

    let mut identifier = None;
    let mut handler = None;
    if p.peek_keyword(Keyword::Catch) {
        tokens.push(p.advance()?);
        // `catch err` names the exception only when the line ends there
        let binds = p.peek(TokenKind::Identifier)
            && p.next2_token()
                .is_none_or(|t| !t.annotation && t.kind.is_terminator());
        if binds {
            identifier = Some(parse_identifier(p)?);
        }
        tokens.extend(match_eos(p, None, Terminator::Newline, true)?);
        handler = Some(parse_delimited_input(p, CATCH_CLOSERS)?.sequence);
    }

    tokens.push(match_end(p, try_token, Keyword::EndTryCatch)?);
    p.context_mut().pop(ContextKind::Block)?;
    let stmt = Stmt::Try {
        body,
        identifier,
        handler,
    };
    finish_compound(p, stmt, try_token, &tokens)
}

/// `spmd` or `spmd (n)`
fn parse_spmd<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let spmd_token = p.advance()?;
    let mut tokens = Vec::new();
    let mut workers = None;
    if p.peek(TokenKind::LParen) {
        tokens.push(p.advance()?);
        workers = Some(parse_expression(p)?);
        tokens.push(p.match_kind(TokenKind::RParen)?);
    }
    tokens.extend(match_eos(p, None, Terminator::Newline, false)?);

    p.context_mut().push(ContextKind::Block);
    let body = parse_delimited_input(p, SPMD_CLOSERS)?.sequence;
    tokens.push(match_end(p, spmd_token, Keyword::EndSpmd)?);
    p.context_mut().pop(ContextKind::Block)?;

    finish_compound(p, Stmt::Spmd { workers, body }, spmd_token, &tokens)
}

/// Octave `do ... until guard`
fn parse_do_until<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let do_token = p.advance()?;
    let mut tokens = match_eos(p, None, Terminator::Newline, true)?;

    p.context_mut().push(ContextKind::Loop);
    let body = parse_delimited_input(p, DO_CLOSERS)?.sequence;
    tokens.push(match_end(p, do_token, Keyword::Until)?);
    p.context_mut().pop(ContextKind::Loop)?;

    let guard = parse_guard(p)?;
    finish_compound(p, Stmt::DoUntil { body, guard }, do_token, &tokens)
}

/// Octave `unwind_protect ... unwind_protect_cleanup ... end_unwind_protect`
fn parse_unwind_protect<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let unwind_token = p.advance()?;
    let mut tokens = match_eos(p, None, Terminator::Newline, true)?;

    p.context_mut().push(ContextKind::Block);
    let body = parse_delimited_input(p, UNWIND_CLOSERS)?.sequence;
    tokens.push(p.match_kind(TokenKind::Keyword(Keyword::UnwindProtectCleanup))?);
    tokens.extend(match_eos(p, None, Terminator::Newline, true)?);
    let cleanup = parse_delimited_input(p, CLEANUP_CLOSERS)?.sequence;
    tokens.push(match_end(p, unwind_token, Keyword::EndUnwindProtect)?);
    p.context_mut().pop(ContextKind::Block)?;

    finish_compound(p, Stmt::UnwindProtect { body, cleanup }, unwind_token, &tokens)
}

//! Compilation units: script, function and class files
//!
//! A file is classified by its first significant token. Function files
//! hold one or more functions; when those functions are not closed by
//! `end`, each following `function` was parsed as nested in the previous
//! one and [`flatten_unterminated`] turns them back into siblings.

use super::expressions::{parse_arguments, parse_expression, parse_identifier, parse_simple_name};
use super::statements::{
    StatementParser, match_end, parse_delimited_input, parse_statement, reject_closer, skip_blank,
};
use super::termination::{Terminator, match_eos};
use crate::parser::context::ContextKind;
use crate::parser::errors::{ErrorCode, ParseError, SyntaxError, format_context_error};
use crate::parser::token::{Keyword, Operator, TokenKind};
use crate::syntax::{
    BlockKind, ClassDef, EntityConstraint, EnumerationItem, Expr, FunctionDef, FunctionScope,
    NameValue, Node, NodeId, Sequence, Signature, SpecialBlock, Unit,
};

const FUNCTION_CLOSERS: &[Keyword] = &[Keyword::End, Keyword::EndFunction];

/// Parse a whole file and return its unit node
pub fn parse_unit<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    skip_blank(p)?;
    let location = p.next_location();
    let unit = match p.next_keyword() {
        Some(Keyword::Function) => {
            tracing::debug!("function file");
            let functions = parse_function_list(p, FunctionScope::Primary)?;
            Unit::Function { functions }
        }
        Some(Keyword::Classdef) => {
            tracing::debug!("class file");
            let class = parse_class_def(p)?;
            let functions = parse_function_list(p, FunctionScope::Local)?;
            Unit::Class { class, functions }
        }
        _ => {
            tracing::debug!(dialect = ?p.dialect(), "script file");
            parse_script(p)?
        }
    };
    p.match_eof()?;
    p.alloc(Node::Unit(unit), None, location)
}

// ============================================================================
// Functions
// ============================================================================

/// Functions up to the end of file; the first gets `first_scope`, the
/// rest are local functions
fn parse_function_list<P: StatementParser>(
    p: &mut P,
    first_scope: FunctionScope,
) -> Result<Vec<NodeId>, ParseError> {
    let mut functions = Vec::new();
    loop {
        skip_blank(p)?;
        if p.at_eof() {
            break;
        }
        if !p.peek_keyword(Keyword::Function) {
            reject_closer(p)?;
            return Err(p.error_here(
                ErrorCode::E0502,
                format!("expected function definition, found {}", p.found()),
            ));
        }
        let scope = if functions.is_empty() {
            first_scope
        } else {
            FunctionScope::Local
        };
        let function = parse_function_def(p, scope)?;
        functions.extend(flatten_unterminated(p, function)?);
    }
    Ok(functions)
}

/// Unterminated functions swallow every later `function` as a nested
/// definition. Undo that: `function` and everything nested under it
/// become siblings in source order, with local scope.
fn flatten_unterminated<P: StatementParser>(
    p: &mut P,
    function: NodeId,
) -> Result<Vec<NodeId>, ParseError> {
    let terminated = p.ast().function(function).is_some_and(|def| def.terminated);
    if terminated {
        return Ok(vec![function]);
    }

    let mut flat = Vec::new();
    let mut stack = vec![function];
    while let Some(current) = stack.pop() {
        let nested = p.detach_nested(current)?;
        if current != function {
            p.set_scope(current, FunctionScope::Local);
        }
        flat.push(current);
        stack.extend(nested.into_iter().rev());
    }
    tracing::trace!(count = flat.len(), "flattened unterminated functions");
    Ok(flat)
}

/// `function [outputs] = name(inputs) ... end`
pub fn parse_function_def<P: StatementParser>(
    p: &mut P,
    scope: FunctionScope,
) -> Result<NodeId, ParseError> {
    if scope == FunctionScope::Nested && !p.context().directly_in(ContextKind::Function) {
        return Err(format_context_error(
            "'function'",
            p.context().top(),
            p.next_location(),
            ErrorCode::E0502,
        )
        .into());
    }
    let function_token = p.match_kind(TokenKind::Keyword(Keyword::Function))?;
    let signature = parse_signature(p)?;
    match_eos(p, Some(signature), Terminator::Newline, false)?;
    let docstring = p.comments_before_next();

    p.context_mut().push(ContextKind::Function);
    let mut validation = Vec::new();
    loop {
        skip_blank(p)?;
        if !at_arguments_block(p) {
            break;
        }
        validation.push(parse_special_block(p, BlockKind::Arguments)?);
    }
    let body = parse_delimited_input(p, FUNCTION_CLOSERS)?;

    let mut end = None;
    if p.peek_keyword(Keyword::End) || p.peek_keyword(Keyword::EndFunction) {
        end = Some(p.advance()?);
        p.require_function_end();
    } else if p.functions_require_end() {
        return Err(SyntaxError::builder(ErrorCode::E0303, p.next_location())
            .message(format!("expected 'end' to close function, found {}", p.found()))
            .related("function opened here", p.location_of(function_token))
            .hint("either every function in a file is closed by 'end' or none is")
            .build()
            .into());
    }
    p.context_mut().pop(ContextKind::Function)?;

    let def = FunctionDef {
        signature,
        validation,
        body: body.sequence,
        nested: body.nested,
        scope,
        terminated: end.is_some(),
        docstring: None,
    };
    let location = p.location_of(function_token);
    let id = p.alloc(Node::Function(def), Some(function_token), location)?;
    if !docstring.is_empty() {
        p.defer_docstring(id, docstring);
    }
    if let Some(end) = end {
        p.link(end, id)?;
        match_eos(p, Some(id), Terminator::Newline, true)?;
    }
    Ok(id)
}

/// `arguments` opening a validation block rather than naming a variable
fn at_arguments_block<P: StatementParser>(p: &P) -> bool {
    p.peek_value(TokenKind::Identifier, "arguments")
        && (p.next2_token().is_none_or(|t| {
            !t.annotation
                && matches!(
                    t.kind,
                    TokenKind::Newline | TokenKind::LParen | TokenKind::Semicolon | TokenKind::Comma
                )
        }))
}

/// `[a, b] = name(x, ~)`, `a = name(x)` or `name`
fn parse_signature<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let mut tokens = Vec::new();
    let mut outputs = Vec::new();

    if p.peek(TokenKind::LBracket) || p.peek(TokenKind::ABracket) {
        let close_kind = if p.peek(TokenKind::ABracket) {
            TokenKind::AKet
        } else {
            TokenKind::RBracket
        };
        tokens.push(p.advance()?);
        while !p.peek(close_kind) {
            if p.peek(TokenKind::Comma) {
                tokens.push(p.advance()?);
                continue;
            }
            if !p.peek(TokenKind::Identifier) {
                return Err(p.error_here(
                    ErrorCode::E0302,
                    format!("expected output name, found {}", p.found()),
                ));
            }
            outputs.push(parse_identifier(p)?);
        }
        tokens.push(p.advance()?);
        tokens.push(p.match_kind(TokenKind::Assignment)?);
    } else if p.peek(TokenKind::Identifier) && p.peek2(TokenKind::Assignment) {
        outputs.push(parse_identifier(p)?);
        tokens.push(p.advance()?);
    }

    if !p.peek(TokenKind::Identifier) {
        return Err(p.error_here(
            ErrorCode::E0302,
            format!("expected function name, found {}", p.found()),
        ));
    }
    let name = parse_simple_name(p)?;

    let mut inputs = Vec::new();
    if p.peek(TokenKind::LParen) {
        tokens.push(p.advance()?);
        while !p.peek(TokenKind::RParen) {
            if p.peek(TokenKind::Comma) {
                tokens.push(p.advance()?);
            } else if p.peek(TokenKind::Operator(Operator::Not)) {
                let tilde = p.advance()?;
                inputs.push(p.alloc_expr(Expr::Ignored, tilde)?);
            } else if p.peek(TokenKind::Identifier) {
                inputs.push(parse_identifier(p)?);
            } else {
                return Err(p.error_here(
                    ErrorCode::E0302,
                    format!("expected parameter name, found {}", p.found()),
                ));
            }
        }
        tokens.push(p.advance()?);
    }

    let location = p.ast().location(name).clone();
    let id = p.alloc(
        Node::Signature(Signature {
            name,
            inputs,
            outputs,
        }),
        None,
        location,
    )?;
    p.link_all(&tokens, id)?;
    Ok(id)
}

// ============================================================================
// Class bodies
// ============================================================================

/// `(Name = value, ~Flag, Flag)` after `classdef` or a block keyword
fn parse_attributes<P: StatementParser>(p: &mut P) -> Result<Vec<NodeId>, ParseError> {
    let mut attributes = Vec::new();
    if !p.peek(TokenKind::LParen) {
        return Ok(attributes);
    }
    let open = p.advance()?;
    loop {
        let negation = if p.peek(TokenKind::Operator(Operator::Not)) {
            Some(p.advance()?)
        } else {
            None
        };
        if !p.peek(TokenKind::Identifier) {
            return Err(SyntaxError::builder(ErrorCode::E0305, p.next_location())
                .message(format!("expected attribute name, found {}", p.found()))
                .related("attribute list opened here", p.location_of(open))
                .build()
                .into());
        }
        let name = parse_identifier(p)?;
        let mut tokens = Vec::new();
        let mut value = None;
        if negation.is_none() && p.peek(TokenKind::Assignment) {
            tokens.push(p.advance()?);
            value = Some(parse_expression(p)?);
        }
        let location = p.ast().location(name).clone();
        let id = p.alloc(
            Node::NameValue(NameValue {
                name,
                value,
                negated: negation.is_some(),
            }),
            negation,
            location,
        )?;
        p.link_all(&tokens, id)?;
        attributes.push(id);

        if p.peek(TokenKind::Comma) {
            p.advance()?;
        } else if p.peek(TokenKind::RParen) {
            p.advance()?;
            return Ok(attributes);
        } else {
            return Err(SyntaxError::builder(ErrorCode::E0305, p.next_location())
                .message(format!("expected ',' or ')', found {}", p.found()))
                .related("attribute list opened here", p.location_of(open))
                .build()
                .into());
        }
    }
}

/// Block word at the start of a class-body line
fn peek_block_kind<P: StatementParser>(p: &P) -> Option<BlockKind> {
    p.next_token()
        .filter(|t| !t.annotation && t.kind == TokenKind::Identifier)
        .and_then(|t| BlockKind::from_word(&t.value))
        .filter(|kind| *kind != BlockKind::Arguments)
}

/// `properties`, `methods`, `events`, `enumeration` or `arguments` block
fn parse_special_block<P: StatementParser>(
    p: &mut P,
    kind: BlockKind,
) -> Result<NodeId, ParseError> {
    let keyword = p.match_value(TokenKind::Identifier, kind.as_str())?;
    let attributes = parse_attributes(p)?;
    let mut tokens = match_eos(p, None, Terminator::Newline, false)?;

    p.context_mut().push(ContextKind::Block);
    let mut items = Vec::new();
    loop {
        skip_blank(p)?;
        if p.peek_keyword(Keyword::End) || p.at_eof() {
            break;
        }
        let item = match kind {
            BlockKind::Properties | BlockKind::Arguments => parse_entity_constraint(p)?,
            BlockKind::Methods => parse_method(p)?,
            BlockKind::Events => parse_identifier(p)?,
            BlockKind::Enumeration => parse_enumeration_item(p)?,
        };
        items.push(item);
        if kind != BlockKind::Methods || p.ast().function(item).is_none() {
            match_eos(p, Some(item), Terminator::Any, false)?;
        }
    }
    tokens.push(match_end(p, keyword, Keyword::End)?);
    p.context_mut().pop(ContextKind::Block)?;

    let location = p.location_of(keyword);
    let id = p.alloc(
        Node::Block(SpecialBlock {
            kind,
            attributes,
            items,
        }),
        Some(keyword),
        location,
    )?;
    p.link_all(&tokens, id)?;
    match_eos(p, Some(id), Terminator::Newline, true)?;
    Ok(id)
}

/// A method definition, or a bare signature declaring a method
/// implemented in its own file
fn parse_method<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    if !p.peek_keyword(Keyword::Function) {
        return parse_signature(p);
    }
    let function_token = p.next_location();
    let id = parse_function_def(p, FunctionScope::Method)?;
    if p.ast().function(id).is_some_and(|def| !def.terminated) {
        return Err(SyntaxError::builder(ErrorCode::E0205, p.next_location())
            .message(format!("expected 'end' to close method, found {}", p.found()))
            .related("method defined here", function_token)
            .build()
            .into());
    }
    Ok(id)
}

/// `name (dims) class {validators} = default`
fn parse_entity_constraint<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let mut tokens = Vec::new();
    let name = parse_simple_name(p)?;

    let mut delegate = None;
    if p.peek(TokenKind::NvpDelegate) {
        tokens.push(p.advance()?);
        delegate = Some(parse_simple_name(p)?);
    }

    let mut dimensions = Vec::new();
    if p.peek(TokenKind::LParen) {
        tokens.push(p.advance()?);
        loop {
            let dimension = if p.peek(TokenKind::Colon) {
                let colon = p.advance()?;
                p.alloc_expr(Expr::Reshape, colon)?
            } else if p.peek(TokenKind::Number) {
                let number = p.advance()?;
                let value = p.token(number).value.clone();
                p.alloc_expr(Expr::Number(value), number)?
            } else {
                return Err(p.error_here(
                    ErrorCode::E0401,
                    format!("expected dimension, found {}", p.found()),
                ));
            };
            dimensions.push(dimension);
            if p.peek(TokenKind::Comma) {
                tokens.push(p.advance()?);
            } else {
                break;
            }
        }
        tokens.push(p.match_kind(TokenKind::RParen)?);
    }

    let class_name = if p.peek(TokenKind::Identifier) {
        Some(parse_simple_name(p)?)
    } else {
        None
    };

    let mut validators = Vec::new();
    if p.peek(TokenKind::LBrace) {
        let args = parse_arguments(p, TokenKind::LBrace, TokenKind::RBrace, ErrorCode::E0204)?;
        validators = args.items;
        tokens.push(args.open);
        tokens.push(args.close);
        tokens.extend(args.separators);
    }

    let mut default = None;
    if p.peek(TokenKind::Assignment) {
        tokens.push(p.advance()?);
        default = Some(parse_expression(p)?);
    }

    let location = p.ast().location(name).clone();
    let id = p.alloc(
        Node::Constraint(EntityConstraint {
            name,
            delegate,
            dimensions,
            class_name,
            validators,
            default,
        }),
        None,
        location,
    )?;
    p.link_all(&tokens, id)?;
    Ok(id)
}

/// `Name` or `Name(arguments)`
fn parse_enumeration_item<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let name = parse_identifier(p)?;
    let mut arguments = Vec::new();
    let mut tokens = Vec::new();
    if p.peek(TokenKind::LParen) {
        let args = parse_arguments(p, TokenKind::LParen, TokenKind::RParen, ErrorCode::E0202)?;
        arguments = args.items;
        tokens.push(args.open);
        tokens.push(args.close);
        tokens.extend(args.separators);
    }
    let location = p.ast().location(name).clone();
    let id = p.alloc(
        Node::Enumeration(EnumerationItem { name, arguments }),
        None,
        location,
    )?;
    p.link_all(&tokens, id)?;
    Ok(id)
}

/// `classdef (attributes) Name < Super1 & Super2 ... end`
fn parse_class_def<P: StatementParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let classdef = p.match_kind(TokenKind::Keyword(Keyword::Classdef))?;
    p.context_mut().push(ContextKind::Class);
    let attributes = parse_attributes(p)?;
    let name = parse_simple_name(p)?;

    let mut tokens = Vec::new();
    let mut superclasses = Vec::new();
    if p.peek(TokenKind::Operator(Operator::Less)) {
        tokens.push(p.advance()?);
        loop {
            superclasses.push(parse_simple_name(p)?);
            if p.peek(TokenKind::Operator(Operator::ElementAnd)) {
                tokens.push(p.advance()?);
            } else {
                break;
            }
        }
    }
    tokens.extend(match_eos(p, None, Terminator::Newline, false)?);
    let docstring = p.comments_before_next();

    let mut blocks = Vec::new();
    loop {
        skip_blank(p)?;
        if p.peek_keyword(Keyword::End) || p.at_eof() {
            break;
        }
        let Some(kind) = peek_block_kind(p) else {
            return Err(p.error_here(
                ErrorCode::E0304,
                format!(
                    "expected properties, methods, events or enumeration, found {}",
                    p.found()
                ),
            ));
        };
        blocks.push(parse_special_block(p, kind)?);
    }
    tokens.push(match_end(p, classdef, Keyword::End)?);
    p.context_mut().pop(ContextKind::Class)?;

    let location = p.location_of(classdef);
    let id = p.alloc(
        Node::Class(ClassDef {
            name,
            attributes,
            superclasses,
            blocks,
            docstring: None,
        }),
        Some(classdef),
        location,
    )?;
    if !docstring.is_empty() {
        p.defer_docstring(id, docstring);
    }
    p.link_all(&tokens, id)?;
    match_eos(p, Some(id), Terminator::Newline, true)?;
    Ok(id)
}

// ============================================================================
// Files
// ============================================================================

/// Statements with local functions. MATLAB only allows functions at the
/// end of a script; Octave defines them as it meets them, anywhere among
/// the statements.
fn parse_script<P: StatementParser>(p: &mut P) -> Result<Unit, ParseError> {
    let octave = p.dialect().is_octave();
    let scope = if octave {
        FunctionScope::Global
    } else {
        FunctionScope::Local
    };
    let mut statements = Vec::new();
    let mut functions = Vec::new();
    let mut location = None;

    loop {
        skip_blank(p)?;
        if p.at_eof() {
            break;
        }
        if p.peek_keyword(Keyword::Function) {
            let function_token = p.next_location();
            let function = parse_function_def(p, scope)?;
            if p.ast().function(function).is_some_and(|def| !def.terminated) {
                return Err(SyntaxError::builder(ErrorCode::E0306, function_token).build().into());
            }
            functions.push(function);
            continue;
        }
        if !octave && !functions.is_empty() {
            return Err(SyntaxError::builder(ErrorCode::E0503, p.next_location())
                .message("statements after a local function are only allowed in Octave")
                .build()
                .into());
        }
        reject_closer(p)?;
        location.get_or_insert_with(|| p.next_location());
        statements.push(parse_statement(p)?);
    }

    let location = location.unwrap_or_else(|| p.next_location());
    let sequence = p.alloc(Node::Sequence(Sequence { statements }), None, location)?;
    Ok(Unit::Script {
        statements: sequence,
        functions,
    })
}

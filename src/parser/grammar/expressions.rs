//! Expression parsing by precedence climbing
//!
//! Levels from loosest to tightest:
//!
//! ```text
//! 12  ||                         left
//! 11  &&                         left
//! 10  |                          left
//!  9  &                          left
//!  8  == ~= < <= > >=            left, chains are flagged
//!  7  a:b  a:s:b
//!  6  + -                        left
//!  5  * / \ .* ./ .\             left
//!  4  + - ~ (prefix)             right
//!  3  prefix operators in an exponent
//!  2  ' .' ^ .^                  left
//!  1  literals, names, brackets, handles
//! ```

use crate::base::Location;
use crate::diagnostics::{CheckSeverity, Diagnostic, DiagnosticCollector, codes};
use crate::parser::errors::{ErrorCode, ParseError, SyntaxError};
use crate::parser::fixes::Fix;
use crate::parser::token::{Keyword, Operator, Token, TokenId, TokenKind};
use crate::syntax::{Ast, Expr, Node, NodeId, Row, RowList};

const SHORT_CIRCUIT_OR: &[Operator] = &[Operator::ShortCircuitOr];
const SHORT_CIRCUIT_AND: &[Operator] = &[Operator::ShortCircuitAnd];
const ELEMENT_OR: &[Operator] = &[Operator::ElementOr];
const ELEMENT_AND: &[Operator] = &[Operator::ElementAnd];
const RELATIONAL: &[Operator] = &[
    Operator::Equal,
    Operator::NotEqual,
    Operator::Less,
    Operator::LessEqual,
    Operator::Greater,
    Operator::GreaterEqual,
];
const ADDITIVE: &[Operator] = &[Operator::Plus, Operator::Minus];
const MULTIPLICATIVE: &[Operator] = &[
    Operator::Times,
    Operator::Divide,
    Operator::LeftDivide,
    Operator::ElementTimes,
    Operator::ElementDivide,
    Operator::ElementLeftDivide,
];
const UNARY: &[Operator] = &[Operator::Plus, Operator::Minus, Operator::Not];
const POSTFIX: &[Operator] = &[Operator::Transpose, Operator::NonConjugateTranspose];
const POWER: &[Operator] = &[Operator::Power, Operator::ElementPower];

/// Interface between the grammar rules and the parser state
///
/// The grammar functions are generic over this trait; [`Parser`] is the
/// implementation.
///
/// [`Parser`]: crate::parser::Parser
pub trait ExpressionParser {
    // Token inspection
    fn token(&self, id: TokenId) -> &Token;
    fn next_token(&self) -> Option<&Token>;
    fn next2_token(&self) -> Option<&Token>;
    fn peek(&self, kind: TokenKind) -> bool;
    fn peek2(&self, kind: TokenKind) -> bool;
    fn at_eof(&self) -> bool;
    /// At end of file: does the file end with a line break?
    fn ends_with_newline(&self) -> bool;
    fn eof_location(&self) -> Location;
    /// The token consumed last
    fn last_token(&self) -> Option<TokenId>;

    // Token consumption
    /// Consume the next token whatever it is
    fn advance(&mut self) -> Result<TokenId, ParseError>;
    fn match_kind(&mut self, kind: TokenKind) -> Result<TokenId, ParseError>;

    // Node building
    fn ast(&self) -> &Ast;
    /// Allocate a node; `token` is its anchor and gets linked to it
    fn alloc(&mut self, node: Node, token: Option<TokenId>, location: Location) -> Result<NodeId, ParseError>;
    fn link(&mut self, token: TokenId, node: NodeId) -> Result<(), ParseError>;
    fn set_brackets(&mut self, id: NodeId, open: TokenId, close: TokenId);

    // Side tables
    fn fix(&mut self, token: TokenId) -> &mut Fix;
    fn diagnostics(&mut self) -> &mut DiagnosticCollector;

    /// Nesting depth of index argument lists; `end` is an expression
    /// while it is non-zero
    fn index_depth(&self) -> u32;
    fn set_index_depth(&mut self, depth: u32);

    fn location_of(&self, token: TokenId) -> Location {
        self.token(token).location.clone()
    }

    fn next_location(&self) -> Location {
        match self.next_token() {
            Some(token) => token.location.clone(),
            None => self.eof_location(),
        }
    }

    /// Description of the next token for error messages
    fn found(&self) -> String {
        match self.next_token() {
            Some(token) if token.annotation => "annotation".to_string(),
            Some(token) => token.kind.description(),
            None => "end of file".to_string(),
        }
    }

    /// Syntax error located at the next token
    fn error_here(&self, code: ErrorCode, message: String) -> ParseError {
        SyntaxError::new(message, self.next_location(), code).into()
    }

    fn alloc_expr(&mut self, expr: Expr, token: TokenId) -> Result<NodeId, ParseError> {
        let location = self.location_of(token);
        self.alloc(Node::Expr(expr), Some(token), location)
    }

    fn link_all(&mut self, tokens: &[TokenId], node: NodeId) -> Result<(), ParseError> {
        for &token in tokens {
            self.link(token, node)?;
        }
        Ok(())
    }
}

/// The next token as an operator from `ops`
fn peek_operator<P: ExpressionParser>(p: &P, ops: &[Operator]) -> Option<Operator> {
    match p.next_token() {
        Some(token) if !token.annotation => token.operator().filter(|op| ops.contains(op)),
        _ => None,
    }
}

/// Is the next token a prefix operator?
pub fn at_unary_operator<P: ExpressionParser>(p: &P) -> bool {
    peek_operator(p, UNARY).is_some()
}

/// Parse an expression (level 12)
pub fn parse_expression<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    parse_short_circuit_or(p)
}

fn parse_binary_level<P: ExpressionParser>(
    p: &mut P,
    ops: &[Operator],
    operand: fn(&mut P) -> Result<NodeId, ParseError>,
) -> Result<NodeId, ParseError> {
    let mut lhs = operand(p)?;
    while let Some(op) = peek_operator(p, ops) {
        let token = p.advance()?;
        p.fix(token).binary_operator = true;
        let rhs = operand(p)?;
        lhs = p.alloc_expr(Expr::Binary { op, lhs, rhs }, token)?;
    }
    Ok(lhs)
}

fn parse_short_circuit_or<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    parse_binary_level(p, SHORT_CIRCUIT_OR, parse_short_circuit_and)
}

fn parse_short_circuit_and<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    parse_binary_level(p, SHORT_CIRCUIT_AND, parse_element_or)
}

fn parse_element_or<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    parse_binary_level(p, ELEMENT_OR, parse_element_and)
}

fn parse_element_and<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    parse_binary_level(p, ELEMENT_AND, parse_relation)
}

/// Level 8. `a < b < c` compares a logical with `c`; the chain is still
/// parsed left to right, but flagged.
fn parse_relation<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let mut lhs = parse_range(p)?;
    let mut operators = 0;
    while let Some(op) = peek_operator(p, RELATIONAL) {
        let token = p.advance()?;
        p.fix(token).binary_operator = true;
        let rhs = parse_range(p)?;
        lhs = p.alloc_expr(Expr::Binary { op, lhs, rhs }, token)?;
        operators += 1;
    }
    if operators >= 2 {
        let location = p.ast().location(lhs).clone();
        p.diagnostics().add(
            Diagnostic::check(
                location,
                "chained relational operators compare a logical result, not the operands",
                CheckSeverity::Medium,
            )
            .with_code(codes::CHAINED_RELATIONAL),
        );
    }
    Ok(lhs)
}

/// Level 7. Textually `first:stride:last`; the node stores the parts in
/// that order with the stride optional. Further colons take the range
/// built so far as their first operand: `a:b:c:d` is `(a:b:c):d`.
fn parse_range<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let mut first = parse_additive(p)?;
    while p.peek(TokenKind::Colon) {
        let colon = p.advance()?;
        let second = parse_additive(p)?;
        first = if p.peek(TokenKind::Colon) {
            let second_colon = p.advance()?;
            let last = parse_additive(p)?;
            let id = p.alloc_expr(
                Expr::Range {
                    first,
                    stride: Some(second),
                    last,
                },
                colon,
            )?;
            p.link(second_colon, id)?;
            id
        } else {
            p.alloc_expr(
                Expr::Range {
                    first,
                    stride: None,
                    last: second,
                },
                colon,
            )?
        };
    }
    Ok(first)
}

fn parse_additive<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    parse_binary_level(p, ADDITIVE, parse_multiplicative)
}

fn parse_multiplicative<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    parse_binary_level(p, MULTIPLICATIVE, parse_unary)
}

/// Level 4, right-recursive: `--a` is `-(-a)`
fn parse_unary<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let Some(op) = peek_operator(p, UNARY) else {
        return parse_postfix(p);
    };
    let token = p.advance()?;
    p.fix(token).unary_operator = true;
    let operand = parse_unary(p)?;
    p.alloc_expr(Expr::Unary { op, operand }, token)
}

/// Level 3. A prefix operator directly after `^` takes the whole power
/// chain that follows: `2^-3^2` is `2^(-(3^2))`.
fn parse_power_operand<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let Some(op) = peek_operator(p, UNARY) else {
        return parse_postfix(p);
    };
    let token = p.advance()?;
    p.fix(token).unary_operator = true;
    let operand = parse_power_operand(p)?;
    p.alloc_expr(Expr::Unary { op, operand }, token)
}

/// Level 2: transposes and powers, left to right
fn parse_postfix<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let mut base = parse_primary(p)?;
    loop {
        if let Some(op) = peek_operator(p, POSTFIX) {
            let token = p.advance()?;
            base = p.alloc_expr(Expr::Postfix { op, operand: base }, token)?;
        } else if let Some(op) = peek_operator(p, POWER) {
            let token = p.advance()?;
            p.fix(token).binary_operator = true;
            let rhs = if at_unary_operator(p) {
                parse_power_operand(p)?
            } else {
                parse_primary(p)?
            };
            base = p.alloc_expr(Expr::Binary { op, lhs: base, rhs }, token)?;
        } else {
            return Ok(base);
        }
    }
}

// ============================================================================
// Primaries
// ============================================================================

/// Level 1
fn parse_primary<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let Some(kind) = p.next_token().filter(|t| !t.annotation).map(|t| t.kind) else {
        return Err(p.error_here(ErrorCode::E0401, format!("expected expression, found {}", p.found())));
    };
    match kind {
        TokenKind::Number => parse_literal(p, Expr::Number),
        TokenKind::CharArray => parse_literal(p, Expr::CharArray),
        TokenKind::String => parse_literal(p, Expr::StringLiteral),
        TokenKind::Identifier => parse_name_chain(p),
        TokenKind::LParen => parse_parenthesised(p),
        TokenKind::LBracket => {
            let (rows, open, close, separators) =
                parse_rows(p, TokenKind::LBracket, TokenKind::RBracket, ErrorCode::E0203)?;
            let id = p.alloc_expr(Expr::Matrix { rows }, open)?;
            p.link(close, id)?;
            p.link_all(&separators, id)?;
            Ok(id)
        }
        TokenKind::LBrace => {
            let (rows, open, close, separators) =
                parse_rows(p, TokenKind::LBrace, TokenKind::RBrace, ErrorCode::E0204)?;
            let id = p.alloc_expr(Expr::Cell { rows }, open)?;
            p.link(close, id)?;
            p.link_all(&separators, id)?;
            Ok(id)
        }
        TokenKind::Colon if p.index_depth() > 0 => {
            let colon = p.advance()?;
            p.alloc_expr(Expr::Reshape, colon)
        }
        TokenKind::At => parse_function_handle(p),
        TokenKind::Metaclass => {
            let question = p.advance()?;
            let name = parse_simple_name(p)?;
            p.alloc_expr(Expr::Metaclass { name }, question)
        }
        TokenKind::Keyword(Keyword::End) if p.index_depth() > 0 => {
            let end = p.advance()?;
            p.alloc_expr(Expr::IndexEnd, end)
        }
        TokenKind::Keyword(Keyword::End) => Err(p.error_here(
            ErrorCode::E0404,
            "'end' is only an expression inside an index".to_string(),
        )),
        TokenKind::Operator(op) => Err(p.error_here(
            ErrorCode::E0403,
            format!("expected expression, found operator '{}'", op),
        )),
        _ => Err(p.error_here(ErrorCode::E0401, format!("expected expression, found {}", p.found()))),
    }
}

fn parse_literal<P: ExpressionParser>(p: &mut P, make: fn(smol_str::SmolStr) -> Expr) -> Result<NodeId, ParseError> {
    let token = p.advance()?;
    let value = p.token(token).value.clone();
    p.alloc_expr(make(value), token)
}

/// `( expr )`. Brackets are recorded on the inner node; a second pair
/// around an already bracketed expression marks the inner pair spurious.
fn parse_parenthesised<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let open = p.match_kind(TokenKind::LParen)?;
    let inner = parse_expression(p)?;
    if !p.peek(TokenKind::RParen) {
        return Err(SyntaxError::builder(ErrorCode::E0202, p.next_location())
            .message(format!("expected ')', found {}", p.found()))
            .related("opening '(' here", p.location_of(open))
            .build()
            .into());
    }
    let close = p.advance()?;
    if let Some((inner_open, inner_close)) = p.ast().get(inner).brackets {
        for token in [inner_open, inner_close] {
            let fix = p.fix(token);
            fix.spurious = true;
            fix.delete = true;
        }
        let location = p.location_of(inner_open);
        p.diagnostics().add(
            Diagnostic::style_issue(location, "redundant parenthesis", true)
                .with_code(codes::REDUNDANT_BRACKETS),
        );
    }
    p.set_brackets(inner, open, close);
    p.link(open, inner)?;
    p.link(close, inner)?;
    Ok(inner)
}

/// Rows of a matrix or cell literal. Returns the row list, the bracket
/// tokens and the separators.
fn parse_rows<P: ExpressionParser>(
    p: &mut P,
    open_kind: TokenKind,
    close_kind: TokenKind,
    unclosed: ErrorCode,
) -> Result<(NodeId, TokenId, TokenId, Vec<TokenId>), ParseError> {
    let open = p.match_kind(open_kind)?;
    let mut rows = Vec::new();
    let mut items = Vec::new();
    let mut separators = Vec::new();
    loop {
        if p.peek(close_kind) {
            break;
        }
        if p.at_eof() {
            return Err(SyntaxError::builder(unclosed, p.eof_location())
                .message(format!("expected {}, found end of file", close_kind.description()))
                .related("opened here", p.location_of(open))
                .build()
                .into());
        }
        if p.peek(TokenKind::Semicolon) || p.peek(TokenKind::Newline) {
            separators.push(p.advance()?);
            if !items.is_empty() {
                rows.push(alloc_row(p, std::mem::take(&mut items))?);
            }
        } else if p.peek(TokenKind::Comma) {
            separators.push(p.advance()?);
        } else {
            items.push(parse_expression(p)?);
        }
    }
    if !items.is_empty() {
        rows.push(alloc_row(p, items)?);
    }
    let close = p.advance()?;
    let location = p.location_of(open);
    let list = p.alloc(Node::RowList(RowList { rows }), None, location)?;
    Ok((list, open, close, separators))
}

fn alloc_row<P: ExpressionParser>(p: &mut P, items: Vec<NodeId>) -> Result<NodeId, ParseError> {
    let location = match items.first() {
        Some(&first) => p.ast().location(first).clone(),
        None => p.next_location(),
    };
    p.alloc(Node::Row(Row { items }), None, location)
}

// ============================================================================
// Names
// ============================================================================

pub fn parse_identifier<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    if !p.peek(TokenKind::Identifier) {
        return Err(p.error_here(ErrorCode::E0301, format!("expected identifier, found {}", p.found())));
    }
    let token = p.advance()?;
    let value = p.token(token).value.clone();
    p.alloc_expr(Expr::Identifier(value), token)
}

/// Dotted name such as `pkg.sub.fn`
pub fn parse_simple_name<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let mut node = parse_identifier(p)?;
    while p.peek(TokenKind::Selection) && p.peek2(TokenKind::Identifier) {
        let dot = p.advance()?;
        let field = parse_identifier(p)?;
        node = p.alloc_expr(Expr::Selection { prefix: node, field }, dot)?;
    }
    Ok(node)
}

/// A name followed by any chain of selections and references, e.g.
/// `a.b(1).c{2}` or `s.(field)`. A `method@Superclass` suffix is only
/// recognised while the chain is still a simple dotted name.
pub fn parse_name_chain<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let mut node = parse_identifier(p)?;
    let mut simple = true;
    loop {
        if p.peek(TokenKind::LParen) {
            let args = parse_arguments(p, TokenKind::LParen, TokenKind::RParen, ErrorCode::E0202)?;
            node = p.alloc_expr(
                Expr::Reference {
                    prefix: node,
                    arguments: args.items,
                },
                args.open,
            )?;
            p.link(args.close, node)?;
            p.link_all(&args.separators, node)?;
            simple = false;
        } else if p.peek(TokenKind::LBrace) {
            let args = parse_arguments(p, TokenKind::LBrace, TokenKind::RBrace, ErrorCode::E0204)?;
            node = p.alloc_expr(
                Expr::CellReference {
                    prefix: node,
                    arguments: args.items,
                },
                args.open,
            )?;
            p.link(args.close, node)?;
            p.link_all(&args.separators, node)?;
            simple = false;
        } else if p.peek(TokenKind::Selection) && p.peek2(TokenKind::LParen) {
            let dot = p.advance()?;
            let open = p.advance()?;
            let field = parse_expression(p)?;
            let close = p.match_kind(TokenKind::RParen)?;
            node = p.alloc_expr(Expr::DynamicSelection { prefix: node, field }, dot)?;
            p.link(open, node)?;
            p.link(close, node)?;
            simple = false;
        } else if p.peek(TokenKind::Selection) {
            let dot = p.advance()?;
            let field = parse_identifier(p)?;
            node = p.alloc_expr(Expr::Selection { prefix: node, field }, dot)?;
        } else if simple
            && p.peek(TokenKind::At)
            && p.peek2(TokenKind::Identifier)
            && p.next_token().is_some_and(|t| !t.whitespace_before)
        {
            let at = p.advance()?;
            let superclass = parse_simple_name(p)?;
            node = p.alloc_expr(
                Expr::SuperclassReference {
                    method: node,
                    superclass,
                },
                at,
            )?;
            simple = false;
        } else {
            return Ok(node);
        }
    }
}

pub struct Arguments {
    pub items: Vec<NodeId>,
    pub open: TokenId,
    pub close: TokenId,
    pub separators: Vec<TokenId>,
}

/// Comma separated index or call arguments between `open` and `close`
pub fn parse_arguments<P: ExpressionParser>(
    p: &mut P,
    open_kind: TokenKind,
    close_kind: TokenKind,
    unclosed: ErrorCode,
) -> Result<Arguments, ParseError> {
    let open = p.match_kind(open_kind)?;
    let depth = p.index_depth();
    p.set_index_depth(depth + 1);
    let mut items = Vec::new();
    let mut separators = Vec::new();
    if !p.peek(close_kind) {
        loop {
            items.push(parse_expression(p)?);
            if p.peek(TokenKind::Comma) {
                separators.push(p.advance()?);
            } else {
                break;
            }
        }
    }
    p.set_index_depth(depth);
    if !p.peek(close_kind) {
        return Err(SyntaxError::builder(unclosed, p.next_location())
            .message(format!("expected {}, found {}", close_kind.description(), p.found()))
            .related("opened here", p.location_of(open))
            .build()
            .into());
    }
    let close = p.advance()?;
    Ok(Arguments {
        items,
        open,
        close,
        separators,
    })
}

/// `@name` or `@(params) body`
fn parse_function_handle<P: ExpressionParser>(p: &mut P) -> Result<NodeId, ParseError> {
    let at = p.match_kind(TokenKind::At)?;
    if !p.peek(TokenKind::LParen) {
        let name = parse_simple_name(p)?;
        return p.alloc_expr(Expr::FunctionPointer { name }, at);
    }

    let open = p.advance()?;
    let mut parameters = Vec::new();
    let mut separators = Vec::new();
    if !p.peek(TokenKind::RParen) {
        loop {
            let parameter = if peek_operator(p, &[Operator::Not]).is_some() {
                let tilde = p.advance()?;
                p.alloc_expr(Expr::Ignored, tilde)?
            } else {
                parse_identifier(p)?
            };
            parameters.push(parameter);
            if p.peek(TokenKind::Comma) {
                separators.push(p.advance()?);
            } else {
                break;
            }
        }
    }
    let close = p.match_kind(TokenKind::RParen)?;

    // The body of a lambda is not inside the enclosing index
    let depth = p.index_depth();
    p.set_index_depth(0);
    let body = parse_expression(p)?;
    p.set_index_depth(depth);

    let id = p.alloc_expr(Expr::Lambda { parameters, body }, at)?;
    p.link(open, id)?;
    p.link(close, id)?;
    p.link_all(&separators, id)?;
    Ok(id)
}

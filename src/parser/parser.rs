//! Recursive descent parser for MATLAB and Octave
//!
//! Owns the lookahead buffer, the tree under construction and the side
//! tables (autofix instructions, token links, diagnostics). The grammar
//! rules in [`super::grammar`] drive it through the `ExpressionParser`
//! and `StatementParser` traits.
//!
//! Parsing stops at the first syntax error. The error becomes a fatal
//! diagnostic and the result has no tree; the tokens are still returned.

use super::buffer::TokenBuffer;
use super::context::ContextStack;
use super::errors::{ErrorCode, ParseError};
use super::fixes::{Fix, FixTable, TokenLinks};
use super::grammar::{ExpressionParser, StatementParser, units};
use super::lexer::{Lexer, TokenSource};
use super::options::{Dialect, ParseOptions};
use super::token::{Token, TokenId, TokenKind};
use crate::base::Location;
use crate::diagnostics::DiagnosticCollector;
use crate::syntax::{Ast, FunctionScope, Node, NodeId};

/// Everything one parse produces
#[derive(Debug)]
pub struct ParseResult {
    /// All tokens of the file, including comments and continuations
    pub tokens: Vec<Token>,
    pub fixes: FixTable,
    pub links: TokenLinks,
    pub diagnostics: DiagnosticCollector,
    /// Absent when a syntax error stopped the parse
    pub ast: Option<Ast>,
}

impl ParseResult {
    /// Check if parsing produced a tree
    pub fn is_ok(&self) -> bool {
        self.ast.is_some()
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }

    /// Node a token belongs to
    pub fn node_of(&self, token: TokenId) -> Option<NodeId> {
        self.links.get(token)
    }
}

/// The parser state
pub struct Parser<S> {
    buf: TokenBuffer<S>,
    ast: Ast,
    fixes: FixTable,
    links: TokenLinks,
    diagnostics: DiagnosticCollector,
    context: ContextStack,
    dialect: Dialect,
    functions_require_end: bool,
    index_depth: u32,
    docstrings: Vec<(NodeId, Vec<TokenId>)>,
}

impl<S: TokenSource> Parser<S> {
    pub fn new(mut source: S, options: &ParseOptions) -> Self {
        source.set_dialect(options.dialect);
        let ast = Ast::new(source.file_name(), source.line_count());
        Self {
            buf: TokenBuffer::new(source),
            ast,
            fixes: FixTable::new(),
            links: TokenLinks::new(),
            diagnostics: DiagnosticCollector::new(),
            context: ContextStack::new(),
            dialect: options.dialect,
            functions_require_end: false,
            index_depth: 0,
            docstrings: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<NodeId, ParseError> {
        self.buf.fill()?;
        let root = units::parse_unit(self)?;
        self.attach_docstrings()?;
        Ok(root)
    }

    /// Post-parse pass: hang the recorded comment blocks on their
    /// definitions
    fn attach_docstrings(&mut self) -> Result<(), ParseError> {
        for (definition, comments) in std::mem::take(&mut self.docstrings) {
            self.ast
                .attach_docstring(definition, &comments, self.buf.tokens())?;
        }
        Ok(())
    }

    /// Parse the whole file.
    ///
    /// Syntax errors are reported through the diagnostics of the result;
    /// only internal errors (parser defects) are returned as `Err`.
    pub fn parse(mut self) -> Result<ParseResult, ParseError> {
        let ast = match self.run() {
            Ok(root) => {
                self.ast.set_root(root);
                Some(self.ast)
            }
            Err(ParseError::Syntax(err)) => {
                tracing::debug!(code = %err.code, line = err.location.line, "{}", err.message);
                self.diagnostics.syntax_error(&err);
                self.buf.drain();
                None
            }
            Err(err) => return Err(err),
        };
        tracing::debug!(
            file = %self.buf.file_name(),
            tokens = self.buf.tokens().len(),
            nodes = ast.as_ref().map_or(0, Ast::len),
            diagnostics = self.diagnostics.len(),
            "parsed"
        );
        Ok(ParseResult {
            tokens: self.buf.into_tokens(),
            fixes: self.fixes,
            links: self.links,
            diagnostics: self.diagnostics,
            ast,
        })
    }
}

// ============================================================================
// Grammar interface
// ============================================================================

impl<S: TokenSource> ExpressionParser for Parser<S> {
    fn token(&self, id: TokenId) -> &Token {
        self.buf.token(id)
    }

    fn next_token(&self) -> Option<&Token> {
        self.buf.next_token()
    }

    fn next2_token(&self) -> Option<&Token> {
        self.buf.next2_token()
    }

    fn peek(&self, kind: TokenKind) -> bool {
        self.buf.peek(kind)
    }

    fn peek2(&self, kind: TokenKind) -> bool {
        self.buf.peek2(kind)
    }

    fn at_eof(&self) -> bool {
        self.buf.at_eof()
    }

    fn ends_with_newline(&self) -> bool {
        self.buf.ends_with_newline()
    }

    fn eof_location(&self) -> Location {
        self.buf.eof_location()
    }

    fn last_token(&self) -> Option<TokenId> {
        self.buf.ct()
    }

    fn advance(&mut self) -> Result<TokenId, ParseError> {
        let Some(next) = self.buf.nt() else {
            return Err(self.error_here(
                ErrorCode::E0902,
                "unexpected end of file".to_string(),
            ));
        };
        self.buf.advance()?;
        Ok(next)
    }

    fn match_kind(&mut self, kind: TokenKind) -> Result<TokenId, ParseError> {
        self.buf.match_kind(kind)
    }

    fn ast(&self) -> &Ast {
        &self.ast
    }

    fn alloc(&mut self, node: Node, token: Option<TokenId>, location: Location) -> Result<NodeId, ParseError> {
        let id = self.ast.alloc(node, token, location)?;
        if let Some(token) = token {
            self.links.set(token, id)?;
        }
        Ok(id)
    }

    fn link(&mut self, token: TokenId, node: NodeId) -> Result<(), ParseError> {
        self.links.set(token, node)
    }

    fn set_brackets(&mut self, id: NodeId, open: TokenId, close: TokenId) {
        self.ast.set_brackets(id, open, close);
    }

    fn fix(&mut self, token: TokenId) -> &mut Fix {
        self.fixes.entry(token)
    }

    fn diagnostics(&mut self) -> &mut DiagnosticCollector {
        &mut self.diagnostics
    }

    fn index_depth(&self) -> u32 {
        self.index_depth
    }

    fn set_index_depth(&mut self, depth: u32) {
        self.index_depth = depth;
    }
}

impl<S: TokenSource> StatementParser for Parser<S> {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn context(&self) -> &ContextStack {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ContextStack {
        &mut self.context
    }

    fn functions_require_end(&self) -> bool {
        self.functions_require_end
    }

    fn require_function_end(&mut self) {
        self.functions_require_end = true;
    }

    fn peek_value(&self, kind: TokenKind, value: &str) -> bool {
        self.buf.peek_value(kind, value)
    }

    fn apeek(&self, kind: TokenKind) -> bool {
        self.buf.apeek(kind)
    }

    fn apeek_value(&self, kind: TokenKind, value: &str) -> bool {
        self.buf.apeek_value(kind, value)
    }

    fn amatch(&mut self, kind: TokenKind) -> Result<TokenId, ParseError> {
        self.buf.amatch(kind)
    }

    fn amatch_value(&mut self, kind: TokenKind, value: &str) -> Result<TokenId, ParseError> {
        self.buf.amatch_value(kind, value)
    }

    fn match_value(&mut self, kind: TokenKind, value: &str) -> Result<TokenId, ParseError> {
        self.buf.match_value(kind, value)
    }

    fn match_eof(&mut self) -> Result<(), ParseError> {
        self.buf.match_eof()
    }

    fn mark_statement_start(&mut self) {
        if let Some(next) = self.buf.nt() {
            self.buf.token_mut(next).first_in_statement = true;
        }
    }

    fn comments_before_next(&self) -> Vec<TokenId> {
        let start = self.buf.ct().map_or(0, |ct| ct.index() + 1);
        let end = self.buf.nt().map_or(self.buf.tokens().len(), TokenId::index);
        (start..end)
            .filter(|&i| {
                let token = &self.buf.tokens()[i];
                token.kind == TokenKind::Comment && !token.annotation
            })
            .map(|i| TokenId(i as u32))
            .collect()
    }

    fn detach_nested(&mut self, function: NodeId) -> Result<Vec<NodeId>, ParseError> {
        self.ast.detach_nested(function)
    }

    fn set_scope(&mut self, function: NodeId, scope: FunctionScope) {
        self.ast.set_scope(function, scope);
    }

    fn defer_docstring(&mut self, definition: NodeId, comments: Vec<TokenId>) {
        self.docstrings.push((definition, comments));
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Parse a file from any token source
pub fn parse_tokens<S: TokenSource>(source: S, options: &ParseOptions) -> Result<ParseResult, ParseError> {
    Parser::new(source, options).parse()
}

/// Tokenize and parse `src` as the contents of `file`
pub fn parse_source(file: &str, src: &str, options: &ParseOptions) -> Result<ParseResult, ParseError> {
    let lexer = Lexer::new(file, src).with_tab_width(options.tab_width);
    parse_tokens(lexer, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Stmt, Unit};

    fn parse(src: &str) -> ParseResult {
        parse_source("t.m", src, &ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_parse_empty() {
        let result = parse("");
        let ast = result.ast.unwrap();
        assert!(matches!(ast.unit(), Some(Unit::Script { .. })));
    }

    #[test]
    fn test_parse_assignment() {
        let result = parse("x = 1;\n");
        assert!(result.is_ok());
        assert!(result.diagnostics.is_empty());
        let ast = result.ast.unwrap();
        assert!(ast.ids().any(|id| matches!(ast.stmt(id), Some(Stmt::Assignment { .. }))));
    }

    #[test]
    fn test_syntax_error_drops_tree_keeps_tokens() {
        let result = parse("x = (1 + ;\ny = 2;\n");
        assert!(!result.is_ok());
        assert!(result.diagnostics.has_fatal());
        assert_eq!(result.diagnostics.error_count(), 1);
        assert!(result.tokens.iter().any(|t| t.value == "y"));
    }

    #[test]
    fn test_tokens_are_linked_to_nodes() {
        let result = parse("x = a + 1;\n");
        let plus = result
            .tokens
            .iter()
            .position(|t| t.raw_text == "+")
            .map(|i| TokenId(i as u32))
            .unwrap();
        let node = result.node_of(plus).unwrap();
        assert_eq!(result.ast.as_ref().unwrap().kind_name(node), "Binary_Operation");
    }

    #[test]
    fn test_first_in_statement_is_marked() {
        let result = parse("x = 1;\ny = 2;\n");
        let starts: Vec<_> = result
            .tokens
            .iter()
            .filter(|t| t.first_in_statement)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(starts, vec!["x", "y"]);
    }

    #[test]
    fn test_docstring_is_attached() {
        let src = "function f()\n% F does things\n% in two lines\nx = 1;\nend\n";
        let result = parse(src);
        let ast = result.ast.unwrap();
        let function = ast.unit().unwrap().functions()[0];
        let docstring = ast.function(function).unwrap().docstring.as_ref().unwrap();
        assert_eq!(docstring.text, "F does things\nin two lines");
    }

    #[test]
    fn test_docstrings_attached_after_flattening() {
        let src = "function a()\n% A doc\nx = 1;\nfunction b()\n% B doc\ny = 2;\n";
        let result = parse(src);
        let ast = result.ast.unwrap();
        let docs: Vec<_> = ast
            .unit()
            .unwrap()
            .functions()
            .iter()
            .map(|&f| ast.function(f).unwrap().docstring.as_ref().unwrap().text.clone())
            .collect();
        assert_eq!(docs, vec!["A doc", "B doc"]);
    }
}

//! Three-token lookahead window over a [`TokenSource`]
//!
//! `ct` is the token consumed last, `nt` and `nnt` are the two tokens
//! ahead. Every token pulled from the source is kept in one vector (the
//! autofix engine needs comments and continuations too), but the window
//! only ever holds significant tokens:
//! - comments, continuations and `%|` markers are skipped
//! - newlines inside an annotation line are skipped
//! - a newline directly after another newline is skipped

use super::errors::{ErrorCode, ParseError, SyntaxError};
use super::lexer::TokenSource;
use super::token::{Token, TokenId, TokenKind};
use crate::base::{Location, TextSize};

pub struct TokenBuffer<S> {
    source: S,
    tokens: Vec<Token>,
    ct: Option<TokenId>,
    nt: Option<TokenId>,
    nnt: Option<TokenId>,
    /// Last significant token pulled into the window
    last_pulled: Option<TokenId>,
    exhausted: bool,
}

impl<S: TokenSource> TokenBuffer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            ct: None,
            nt: None,
            nnt: None,
            last_pulled: None,
            exhausted: false,
        }
    }

    /// Fill the window; called once before parsing starts
    pub fn fill(&mut self) -> Result<(), ParseError> {
        self.nt = self.pull()?;
        self.nnt = self.pull()?;
        Ok(())
    }

    fn pull(&mut self) -> Result<Option<TokenId>, ParseError> {
        while !self.exhausted {
            let Some(token) = self.source.next_token()? else {
                self.exhausted = true;
                break;
            };
            let id = TokenId(self.tokens.len() as u32);
            let skip = match token.kind {
                kind if kind.is_trivia() => true,
                TokenKind::Newline if token.annotation => true,
                TokenKind::Newline => self
                    .last_pulled
                    .map(|last| &self.tokens[last.index()])
                    .is_some_and(|last| last.kind == TokenKind::Newline && !last.annotation),
                _ => false,
            };
            if skip {
                tracing::trace!(token = %id, kind = ?token.kind, line = token.location.line, "skip");
            }
            self.tokens.push(token);
            if !skip {
                self.last_pulled = Some(id);
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Shift the window by one token
    pub fn advance(&mut self) -> Result<(), ParseError> {
        self.ct = self.nt;
        self.nt = self.nnt;
        self.nnt = self.pull()?;
        Ok(())
    }

    // =========================================================================
    // Window
    // =========================================================================

    pub fn ct(&self) -> Option<TokenId> {
        self.ct
    }

    pub fn nt(&self) -> Option<TokenId> {
        self.nt
    }

    pub fn nnt(&self) -> Option<TokenId> {
        self.nnt
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }

    pub fn token_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.tokens[id.index()]
    }

    pub fn next_token(&self) -> Option<&Token> {
        self.nt.map(|id| self.token(id))
    }

    pub fn next2_token(&self) -> Option<&Token> {
        self.nnt.map(|id| self.token(id))
    }

    pub fn at_eof(&self) -> bool {
        self.nt.is_none()
    }

    /// Whether the text pulled so far ends with a line break, including
    /// one swallowed by a trailing continuation
    pub fn ends_with_newline(&self) -> bool {
        self.tokens.last().is_some_and(|t| match t.kind {
            TokenKind::Newline => true,
            TokenKind::Continuation => t.raw_text.ends_with('\n'),
            _ => false,
        })
    }

    // =========================================================================
    // Tests
    // =========================================================================

    fn test(token: Option<&Token>, kind: TokenKind, annotation: bool) -> bool {
        token.is_some_and(|t| t.kind == kind && t.annotation == annotation)
    }

    /// Is the next token a non-annotation token of `kind`?
    pub fn peek(&self, kind: TokenKind) -> bool {
        Self::test(self.next_token(), kind, false)
    }

    pub fn peek_value(&self, kind: TokenKind, value: &str) -> bool {
        self.peek(kind) && self.next_token().is_some_and(|t| t.value == value)
    }

    pub fn peek2(&self, kind: TokenKind) -> bool {
        Self::test(self.next2_token(), kind, false)
    }

    /// Is the next token an annotation token of `kind`?
    pub fn apeek(&self, kind: TokenKind) -> bool {
        Self::test(self.next_token(), kind, true)
    }

    pub fn apeek_value(&self, kind: TokenKind, value: &str) -> bool {
        self.apeek(kind) && self.next_token().is_some_and(|t| t.value == value)
    }

    // =========================================================================
    // Matching
    // =========================================================================

    fn consume(&mut self, kind: TokenKind, value: Option<&str>, annotation: bool) -> Result<TokenId, ParseError> {
        let expected = match value {
            Some(value) => format!("'{}'", value),
            None => kind.description(),
        };
        let Some(next) = self.nt else {
            return Err(SyntaxError::new(
                format!("expected {}, found end of file", expected),
                self.eof_location(),
                ErrorCode::E0902,
            )
            .into());
        };
        let token = self.token(next);
        let matches = token.kind == kind
            && token.annotation == annotation
            && value.is_none_or(|v| token.value == v);
        if !matches {
            let found = if token.annotation && !annotation {
                "annotation".to_string()
            } else {
                token.kind.description()
            };
            return Err(SyntaxError::new(
                format!("expected {}, found {}", expected, found),
                token.location.clone(),
                ErrorCode::E0902,
            )
            .into());
        }
        self.advance()?;
        Ok(next)
    }

    pub fn match_kind(&mut self, kind: TokenKind) -> Result<TokenId, ParseError> {
        self.consume(kind, None, false)
    }

    pub fn match_value(&mut self, kind: TokenKind, value: &str) -> Result<TokenId, ParseError> {
        self.consume(kind, Some(value), false)
    }

    pub fn amatch(&mut self, kind: TokenKind) -> Result<TokenId, ParseError> {
        self.consume(kind, None, true)
    }

    pub fn amatch_value(&mut self, kind: TokenKind, value: &str) -> Result<TokenId, ParseError> {
        self.consume(kind, Some(value), true)
    }

    /// Succeeds only if every token has been consumed
    pub fn match_eof(&mut self) -> Result<(), ParseError> {
        match self.next_token() {
            None => Ok(()),
            Some(token) => Err(SyntaxError::new(
                format!("expected end of file, found {}", token.kind.description()),
                token.location.clone(),
                ErrorCode::E0902,
            )
            .into()),
        }
    }

    /// Zero-width location just past the last token
    pub fn eof_location(&self) -> Location {
        match self.tokens.last() {
            Some(last) => {
                let mut loc = last.location.clone();
                loc.line = loc.end_line;
                loc.col_start = loc.col_end + 1;
                loc.col_end = loc.col_start;
                loc.range = crate::base::TextRange::empty(last.location.range.end());
                loc
            }
            None => Location::end_of_file(self.source.file_name(), 1, TextSize::new(0)),
        }
    }

    pub fn file_name(&self) -> std::sync::Arc<str> {
        self.source.file_name()
    }

    pub fn line_count(&self) -> u32 {
        self.source.line_count()
    }

    /// Pull the rest of the stream into the token vector, stopping at the
    /// first lexical error
    pub fn drain(&mut self) {
        while !self.exhausted {
            match self.source.next_token() {
                Ok(Some(token)) => self.tokens.push(token),
                Ok(None) | Err(_) => self.exhausted = true,
            }
        }
    }

    /// Every token pulled so far, including skipped ones
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;
    use crate::parser::token::Keyword;

    fn buffer(src: &str) -> TokenBuffer<Lexer<'_>> {
        let mut buf = TokenBuffer::new(Lexer::new("t.m", src));
        buf.fill().unwrap();
        buf
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let mut buf = buffer("x % comment\n\n\n% more\ny\n");
        assert!(buf.peek(TokenKind::Identifier));
        assert!(buf.peek2(TokenKind::Newline));
        buf.advance().unwrap();
        buf.advance().unwrap();
        assert!(buf.peek_value(TokenKind::Identifier, "y"));
    }

    #[test]
    fn test_continuation_is_skipped() {
        let mut buf = buffer("a ...\n + b\n");
        buf.match_kind(TokenKind::Identifier).unwrap();
        assert!(buf.peek(TokenKind::Operator(crate::parser::Operator::Plus)));
    }

    #[test]
    fn test_annotation_tokens_need_apeek() {
        let buf = buffer("%| pragma No_Tracing\nx\n");
        assert!(!buf.peek(TokenKind::Identifier));
        assert!(buf.apeek_value(TokenKind::Identifier, "pragma"));
    }

    #[test]
    fn test_match_reports_mismatch() {
        let mut buf = buffer("if x\n");
        assert!(buf.match_kind(TokenKind::Keyword(Keyword::If)).is_ok());
        let err = buf.match_kind(TokenKind::Newline).unwrap_err();
        match err {
            ParseError::Syntax(err) => assert_eq!(err.message, "expected newline, found identifier"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_match_eof() {
        let mut buf = buffer("x");
        assert!(buf.match_eof().is_err());
        buf.advance().unwrap();
        assert!(buf.match_eof().is_ok());
        assert_eq!(buf.into_tokens().len(), 1);
    }
}

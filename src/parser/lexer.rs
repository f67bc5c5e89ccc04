//! Logos-based tokenizer for MATLAB and Octave
//!
//! Logos recognises the context-free token shapes. The [`Lexer`] wrapper
//! layers the context the language needs on top of that:
//! - `'` is a transpose or the start of a char array depending on the
//!   previous token and on whether we are inside a matrix
//! - whitespace separating matrix elements becomes an anonymous comma
//! - a `[` whose matching `]` is followed by `=` opens an assignment list
//! - command-form calls (`hold on`) turn the rest of the line into
//!   char array arguments
//! - `%{ ... %}` block comments and `%|` annotation lines

use std::collections::VecDeque;
use std::sync::Arc;

use logos::Logos;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use super::options::Dialect;
use super::token::{Keyword, Operator, Token, TokenKind};
use crate::base::Location;

/// Pull-based token stream consumed by the parser.
///
/// This is the boundary to the tokenizer: the parser only ever calls
/// `next_token` and never pushes tokens back.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Option<Token>, LexError>;
    fn file_name(&self) -> Arc<str>;
    fn line_count(&self) -> u32;
    /// Consulted once, before the first token is pulled
    fn set_dialect(&mut self, dialect: Dialect);
}

/// Errors raised while tokenizing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated character array")]
    UnterminatedCharArray(Location),
    #[error("unterminated string")]
    UnterminatedString(Location),
    #[error("unterminated block comment")]
    UnterminatedBlockComment(Location),
    #[error("unexpected character '{1}'")]
    InvalidCharacter(Location, char),
}

impl LexError {
    pub fn location(&self) -> &Location {
        match self {
            Self::UnterminatedCharArray(loc)
            | Self::UnterminatedString(loc)
            | Self::UnterminatedBlockComment(loc)
            | Self::InvalidCharacter(loc, _) => loc,
        }
    }
}

/// Context-free token shapes
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"\r?\n")]
    Newline,
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Word,
    #[regex(r"[0-9]+(\.[0-9]+)?([eEdD][+-]?[0-9]+)?[ijIJ]?")]
    #[regex(r"\.[0-9]+([eEdD][+-]?[0-9]+)?[ijIJ]?")]
    #[regex(r"0[xX][0-9a-fA-F]+([su](8|16|32|64))?")]
    #[regex(r"0[bB][01]+([su](8|16|32|64))?")]
    Number,
    #[regex(r"\.\.\.[^\r\n]*")]
    Ellipsis,
    #[regex(r"%[^\r\n]*")]
    Percent,
    #[regex(r"#[^\r\n]*")]
    Hash,
    #[token("'")]
    Quote,
    #[token("\"")]
    DoubleQuote,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("\\")]
    Backslash,
    #[token("^")]
    Caret,
    #[token(".*")]
    DotStar,
    #[token("./")]
    DotSlash,
    #[token(".\\")]
    DotBackslash,
    #[token(".^")]
    DotCaret,
    #[token(".'")]
    DotQuote,
    #[token("==")]
    EqEq,
    #[token("~=")]
    TildeEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,

    #[token("=")]
    Eq,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[token("?")]
    Question,
    #[token(".?")]
    DotQuestion,
}

impl RawToken {
    fn operator(self) -> Option<Operator> {
        let op = match self {
            Self::Plus => Operator::Plus,
            Self::Minus => Operator::Minus,
            Self::Star => Operator::Times,
            Self::Slash => Operator::Divide,
            Self::Backslash => Operator::LeftDivide,
            Self::Caret => Operator::Power,
            Self::DotStar => Operator::ElementTimes,
            Self::DotSlash => Operator::ElementDivide,
            Self::DotBackslash => Operator::ElementLeftDivide,
            Self::DotCaret => Operator::ElementPower,
            Self::DotQuote => Operator::NonConjugateTranspose,
            Self::EqEq => Operator::Equal,
            Self::TildeEq | Self::BangEq => Operator::NotEqual,
            Self::Lt => Operator::Less,
            Self::LtEq => Operator::LessEqual,
            Self::Gt => Operator::Greater,
            Self::GtEq => Operator::GreaterEqual,
            Self::Amp => Operator::ElementAnd,
            Self::Pipe => Operator::ElementOr,
            Self::AmpAmp => Operator::ShortCircuitAnd,
            Self::PipePipe => Operator::ShortCircuitOr,
            Self::Tilde => Operator::Not,
            _ => return None,
        };
        Some(op)
    }

    fn punctuation(self) -> Option<TokenKind> {
        let kind = match self {
            Self::Eq => TokenKind::Assignment,
            Self::Comma => TokenKind::Comma,
            Self::Semicolon => TokenKind::Semicolon,
            Self::Colon => TokenKind::Colon,
            Self::LParen => TokenKind::LParen,
            Self::RParen => TokenKind::RParen,
            Self::LBrace => TokenKind::LBrace,
            Self::RBrace => TokenKind::RBrace,
            Self::Dot => TokenKind::Selection,
            Self::At => TokenKind::At,
            Self::Question => TokenKind::Metaclass,
            Self::DotQuestion => TokenKind::NvpDelegate,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Paren,
    /// `(` right after `@`: a lambda parameter list
    LambdaParams,
    Matrix,
    Cell,
    Assign,
}

/// Enclosing block, tracked only to know where command form is allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Classdef,
    Function,
    Declarations,
    Methods,
    Other,
}

/// Context-sensitive tokenizer over one source text
pub struct Lexer<'a> {
    src: &'a str,
    file: Arc<str>,
    dialect: Dialect,
    tab_width: u32,
    line_count: u32,

    pos: usize,
    line: u32,
    line_start: usize,

    brackets: Vec<Bracket>,
    blocks: Vec<Block>,
    /// Kind of the last token that was not trivia
    last: Option<TokenKind>,
    statement_start: bool,
    in_annotation: bool,
    saved_statement_start: bool,
    line_has_token: bool,
    after_continuation: bool,
    /// The last operand was the `)` closing lambda parameters
    after_lambda_params: bool,
    pending: VecDeque<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(file: impl Into<Arc<str>>, src: &'a str) -> Self {
        let line_count = src.lines().count().max(1) as u32;
        Self {
            src,
            file: file.into(),
            dialect: Dialect::Matlab,
            tab_width: 8,
            line_count,
            pos: 0,
            line: 1,
            line_start: 0,
            brackets: Vec::new(),
            blocks: Vec::new(),
            last: None,
            statement_start: true,
            in_annotation: false,
            saved_statement_start: false,
            line_has_token: false,
            after_continuation: false,
            after_lambda_params: false,
            pending: VecDeque::new(),
        }
    }

    pub fn with_tab_width(mut self, tab_width: u32) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }

    fn octave(&self) -> bool {
        self.dialect.is_octave()
    }

    fn in_matrix(&self) -> bool {
        matches!(
            self.brackets.last(),
            Some(Bracket::Matrix | Bracket::Cell | Bracket::Assign)
        )
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.src.get(offset..).and_then(|s| s.chars().next())
    }

    // =========================================================================
    // Positions
    // =========================================================================

    fn column_from(&self, line_start: usize, offset: usize) -> u32 {
        let mut col = 0;
        for c in self.src[line_start..offset].chars() {
            if c == '\t' {
                col += self.tab_width - col % self.tab_width;
            } else {
                col += 1;
            }
        }
        col
    }

    /// Location of `[start, end)`; the token must start on the current line
    fn location(&self, start: usize, end: usize) -> Location {
        let range = TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32));
        let col_start = self.column_from(self.line_start, start);
        if end <= start {
            return Location::new(self.file.clone(), self.line, col_start, col_start, range);
        }
        let last_char = self.src[start..end]
            .char_indices()
            .last()
            .map(|(i, _)| start + i)
            .unwrap_or(start);
        let inner = &self.src[start..last_char];
        let breaks = inner.matches('\n').count() as u32;
        let (end_line, end_line_start) = match inner.rfind('\n') {
            Some(i) => (self.line + breaks, start + i + 1),
            None => (self.line, self.line_start),
        };
        let mut loc = Location::new(
            self.file.clone(),
            self.line,
            col_start,
            self.column_from(end_line_start, last_char),
            range,
        );
        loc.end_line = end_line;
        loc
    }

    /// Move to `end`, keeping line bookkeeping in sync
    fn advance_to(&mut self, end: usize) {
        let consumed = &self.src[self.pos..end];
        if let Some(i) = consumed.rfind('\n') {
            self.line += consumed.matches('\n').count() as u32;
            self.line_start = self.pos + i + 1;
        }
        self.pos = end;
    }

    fn make_token(&mut self, kind: TokenKind, start: usize, end: usize, ws: bool) -> Token {
        let location = self.location(start, end);
        let mut token = Token::new(kind, &self.src[start..end], location);
        token.whitespace_before = ws;
        self.advance_to(end);
        token
    }

    fn skip_whitespace(&mut self) -> bool {
        let rest = &self.src[self.pos..];
        let trimmed = rest.trim_start_matches([' ', '\t', '\x0c']);
        let skipped = rest.len() - trimmed.len();
        self.pos += skipped;
        skipped > 0
    }

    // =========================================================================
    // Emission
    // =========================================================================

    fn ends_operand(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::CharArray
                | TokenKind::String
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::AKet
                | TokenKind::Keyword(Keyword::End)
                | TokenKind::Operator(Operator::Transpose | Operator::NonConjugateTranspose)
        )
    }

    fn starts_operand(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::CharArray
            | TokenKind::String
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::At
            | TokenKind::Metaclass
            | TokenKind::Operator(Operator::Not) => true,
            TokenKind::Operator(Operator::Plus | Operator::Minus) => {
                let after = token.location.range.end().into();
                !matches!(self.peek_char(after), None | Some(' ' | '\t' | '\r' | '\n'))
            }
            _ => false,
        }
    }

    fn push(&mut self, mut token: Token) {
        let lambda_body = self.after_lambda_params && !token.kind.is_trivia();
        if token.whitespace_before
            && !lambda_body
            && self.in_matrix()
            && self.last.is_some_and(Self::ends_operand)
            && self.starts_operand(&token)
        {
            let offset = token.location.range.start();
            let mut comma = Token::new(
                TokenKind::Comma,
                "",
                Location::new(
                    self.file.clone(),
                    token.location.line,
                    token.location.col_start,
                    token.location.col_start,
                    TextRange::empty(offset),
                ),
            )
            .with_value(",");
            comma.anonymous = true;
            comma.annotation = self.in_annotation;
            tracing::trace!(line = token.location.line, "inserting implicit matrix comma");
            self.pending.push_back(comma);
        }

        if !self.line_has_token {
            token.first_in_line = true;
            self.line_has_token = true;
        }
        token.annotation = self.in_annotation;

        let kind = token.kind;
        if !kind.is_trivia() {
            self.last = Some(kind);
            self.after_lambda_params = false;
        }
        match kind {
            TokenKind::Newline => {
                self.line_has_token = false;
                if self.in_annotation {
                    self.in_annotation = false;
                    self.statement_start = self.saved_statement_start;
                } else {
                    self.statement_start = self.brackets.is_empty();
                }
            }
            TokenKind::Comma | TokenKind::Semicolon if !token.anonymous => {
                self.statement_start = self.brackets.is_empty();
            }
            TokenKind::Keyword(
                Keyword::Else
                | Keyword::Try
                | Keyword::Otherwise
                | Keyword::Do
                | Keyword::UnwindProtect
                | Keyword::UnwindProtectCleanup,
            ) => self.statement_start = true,
            TokenKind::Comment | TokenKind::Continuation | TokenKind::Annotation => {}
            _ => self.statement_start = false,
        }
        self.pending.push_back(token);
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    fn lex_step(&mut self) -> Result<(), LexError> {
        let ws = self.skip_whitespace() || std::mem::take(&mut self.after_continuation);
        if self.pos >= self.src.len() {
            return Ok(());
        }
        let at_start = self.statement_start && !self.in_annotation;
        let src = self.src;
        let start = self.pos;
        let rest = &src[start..];
        let mut lex = RawToken::lexer(rest);
        let raw = match lex.next() {
            Some(Ok(raw)) => raw,
            _ => {
                let c = rest.chars().next().unwrap_or('\0');
                return Err(LexError::InvalidCharacter(self.location(start, start + c.len_utf8()), c));
            }
        };
        let end = start + lex.span().end;

        match raw {
            RawToken::Newline => {
                let token = self.make_token(TokenKind::Newline, start, end, ws).with_value("\n");
                self.push(token);
            }
            RawToken::Word => self.lex_word(start, end, ws, at_start)?,
            RawToken::Number => {
                let mut end = end;
                let text = &self.src[start..end];
                if text.bytes().all(|b| b.is_ascii_digit())
                    && self.peek_char(end) == Some('.')
                    && !matches!(
                        self.peek_char(end + 1),
                        Some('*' | '/' | '\\' | '^' | '\'' | '.' | '?')
                    )
                    && !self.peek_char(end + 1).is_some_and(|c| c.is_alphabetic())
                {
                    end += 1;
                }
                let token = self.make_token(TokenKind::Number, start, end, ws);
                self.push(token);
            }
            RawToken::Ellipsis => {
                let mut end = end;
                if self.src[end..].starts_with("\r\n") {
                    end += 2;
                } else if self.src[end..].starts_with('\n') {
                    end += 1;
                }
                let token = self.make_token(TokenKind::Continuation, start, end, ws);
                self.push(token);
                self.line_has_token = false;
                self.after_continuation = true;
            }
            RawToken::Percent => self.lex_comment(start, end, ws)?,
            RawToken::Hash if self.octave() => self.lex_comment(start, end, ws)?,
            RawToken::Hash => {
                return Err(LexError::InvalidCharacter(self.location(start, start + 1), '#'));
            }
            RawToken::Quote => {
                let transpose = self.last.is_some_and(Self::ends_operand)
                    && (!ws || !self.in_matrix())
                    && !at_start;
                if transpose {
                    let token = self.make_token(
                        TokenKind::Operator(Operator::Transpose),
                        start,
                        end,
                        ws,
                    );
                    self.push(token);
                } else {
                    self.lex_char_array(start, ws)?;
                }
            }
            RawToken::DoubleQuote => self.lex_string(start, ws)?,
            RawToken::Bang if self.octave() => {
                let token = self.make_token(TokenKind::Operator(Operator::Not), start, end, ws);
                self.push(token);
            }
            RawToken::Bang if at_start && !self.line_has_token => {
                let line_end = self.line_end(start);
                let value = SmolStr::new(&self.src[start + 1..line_end]);
                let token = self
                    .make_token(TokenKind::Bang, start, line_end, ws)
                    .with_value(value);
                self.push(token);
            }
            RawToken::Bang => {
                return Err(LexError::InvalidCharacter(self.location(start, end), '!'));
            }
            RawToken::LParen => {
                let bracket = if self.last == Some(TokenKind::At) {
                    Bracket::LambdaParams
                } else {
                    Bracket::Paren
                };
                // The comma check must see the enclosing bracket, not this one
                let token = self.make_token(TokenKind::LParen, start, end, ws);
                self.push(token);
                self.brackets.push(bracket);
            }
            RawToken::LBrace => {
                // The comma check must see the enclosing bracket, not this one
                let token = self.make_token(TokenKind::LBrace, start, end, ws);
                self.push(token);
                self.brackets.push(Bracket::Cell);
            }
            RawToken::LBracket => {
                let assign = at_start && self.brackets.is_empty() && self.is_assignment_bracket(start);
                let kind = if assign {
                    TokenKind::ABracket
                } else {
                    TokenKind::LBracket
                };
                let token = self.make_token(kind, start, end, ws);
                self.push(token);
                self.brackets.push(if assign { Bracket::Assign } else { Bracket::Matrix });
            }
            RawToken::RBracket => {
                let kind = match self.brackets.pop() {
                    Some(Bracket::Assign) => TokenKind::AKet,
                    _ => TokenKind::RBracket,
                };
                let token = self.make_token(kind, start, end, ws);
                self.push(token);
            }
            RawToken::RParen | RawToken::RBrace => {
                let closed = self.brackets.pop();
                let kind = if raw == RawToken::RParen {
                    TokenKind::RParen
                } else {
                    TokenKind::RBrace
                };
                let token = self.make_token(kind, start, end, ws);
                self.push(token);
                // `@(x) x` in a matrix is one element
                self.after_lambda_params = closed == Some(Bracket::LambdaParams);
            }
            other => {
                let kind = match (other.operator(), other.punctuation()) {
                    (Some(op), _) => TokenKind::Operator(op),
                    (None, Some(kind)) => kind,
                    (None, None) => {
                        let c = rest.chars().next().unwrap_or('\0');
                        return Err(LexError::InvalidCharacter(self.location(start, end), c));
                    }
                };
                let token = self.make_token(kind, start, end, ws);
                self.push(token);
            }
        }
        Ok(())
    }

    fn line_end(&self, from: usize) -> usize {
        let rest = &self.src[from..];
        let len = rest.find('\n').unwrap_or(rest.len());
        let len = if rest[..len].ends_with('\r') { len - 1 } else { len };
        from + len
    }

    fn lex_word(&mut self, start: usize, end: usize, ws: bool, at_start: bool) -> Result<(), LexError> {
        let src = self.src;
        let text = &src[start..end];
        let after_selection = self.last == Some(TokenKind::Selection);
        let keyword = if after_selection {
            None
        } else {
            Keyword::lookup(text, self.octave())
        };

        if let Some(kw) = keyword {
            if self.brackets.is_empty() {
                self.track_keyword_block(kw);
            }
            let token = self.make_token(TokenKind::Keyword(kw), start, end, ws);
            self.push(token);
            return Ok(());
        }

        let block_word = at_start && self.brackets.is_empty() && self.opens_declaration_block(text, end);
        let command = at_start
            && !block_word
            && !after_selection
            && self.brackets.is_empty()
            && !matches!(self.blocks.last(), Some(Block::Declarations))
            && self.starts_command_form(end);

        let token = self.make_token(TokenKind::Identifier, start, end, ws);
        self.push(token);
        if command {
            tracing::trace!(line = self.line, word = text, "command form");
            self.lex_command_words()?;
        }
        Ok(())
    }

    fn track_keyword_block(&mut self, kw: Keyword) {
        match kw {
            Keyword::Classdef => self.blocks.push(Block::Classdef),
            Keyword::Function => self.blocks.push(Block::Function),
            Keyword::If
            | Keyword::For
            | Keyword::Parfor
            | Keyword::While
            | Keyword::Switch
            | Keyword::Try
            | Keyword::Spmd
            | Keyword::Do
            | Keyword::UnwindProtect => self.blocks.push(Block::Other),
            Keyword::Until => {
                self.blocks.pop();
            }
            kw if kw.is_end() => {
                self.blocks.pop();
            }
            _ => {}
        }
    }

    /// `properties`, `methods`, `events`, `enumeration` directly inside a
    /// classdef and `arguments` directly inside a function open blocks
    fn opens_declaration_block(&mut self, word: &str, end: usize) -> bool {
        let block = match (word, self.blocks.last()) {
            ("properties" | "events" | "enumeration", Some(Block::Classdef)) => Block::Declarations,
            ("methods", Some(Block::Classdef)) => Block::Methods,
            ("arguments", Some(Block::Function)) => Block::Declarations,
            _ => return false,
        };
        let rest = self.src[end..].trim_start_matches([' ', '\t']);
        let opens = matches!(
            rest.chars().next(),
            None | Some('\n' | '\r' | '(' | '%' | ';' | ',')
        ) || (self.octave() && rest.starts_with('#'));
        if opens {
            self.blocks.push(block);
        }
        opens
    }

    /// Decide whether an identifier at `end` (statement start) begins a
    /// command-form call
    fn starts_command_form(&self, end: usize) -> bool {
        const BINARY: &[&str] = &[
            "==", "~=", "!=", "<=", ">=", "&&", "||", ".*", "./", ".\\", ".^", "+", "-", "*", "/",
            "\\", "^", "<", ">", "&", "|", ":",
        ];
        let rest = &self.src[end..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        if trimmed.len() == rest.len() {
            return false;
        }
        match trimmed.chars().next() {
            None | Some('\n' | '\r' | ';' | ',' | '%' | '(') => return false,
            Some('#') if self.octave() => return false,
            Some('=') if !trimmed.starts_with("==") => return false,
            _ => {}
        }
        if trimmed.starts_with("...") {
            return false;
        }
        for op in BINARY {
            if let Some(after) = trimmed.strip_prefix(op) {
                return !matches!(after.chars().next(), None | Some(' ' | '\t' | '\r' | '\n'));
            }
        }
        true
    }

    fn lex_command_words(&mut self) -> Result<(), LexError> {
        loop {
            let ws = self.skip_whitespace();
            let start = self.pos;
            let rest = &self.src[start..];
            match rest.chars().next() {
                None | Some('\n' | '\r' | ';' | ',' | '%') => break,
                Some('#') if self.octave() => break,
                _ if rest.starts_with("...") => break,
                _ => {}
            }

            let mut value = String::new();
            let mut i = start;
            while let Some(c) = self.peek_char(i) {
                if matches!(c, ' ' | '\t' | '\n' | '\r' | ';' | ',' | '%')
                    || (c == '#' && self.octave())
                {
                    break;
                }
                if c == '\'' {
                    let (content, close) = self.scan_quoted(i, '\'').ok_or_else(|| {
                        LexError::UnterminatedCharArray(self.location(i, i + 1))
                    })?;
                    value.push_str(&content);
                    i = close + 1;
                } else {
                    value.push(c);
                    i += c.len_utf8();
                }
            }

            let mut token = self.make_token(TokenKind::CharArray, start, i, ws).with_value(value);
            token.command = true;
            self.push(token);
        }
        Ok(())
    }

    /// Scan a quoted literal opened at `open`, doubling the quote escapes
    /// it. Returns the content and the offset of the closing quote.
    fn scan_quoted(&self, open: usize, quote: char) -> Option<(String, usize)> {
        let backslash = quote == '"' && self.octave();
        let mut content = String::new();
        let mut chars = self.src[open + 1..].char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\n' | '\r' => return None,
                c if c == quote => {
                    if chars.peek().is_some_and(|&(_, next)| next == quote) {
                        chars.next();
                        content.push(quote);
                    } else {
                        return Some((content, open + 1 + i));
                    }
                }
                '\\' if backslash => match chars.next() {
                    Some((_, 'n')) => content.push('\n'),
                    Some((_, 't')) => content.push('\t'),
                    Some((_, e @ ('\\' | '"' | '\''))) => content.push(e),
                    Some((_, other)) => {
                        content.push('\\');
                        content.push(other);
                    }
                    None => return None,
                },
                c => content.push(c),
            }
        }
        None
    }

    fn lex_char_array(&mut self, start: usize, ws: bool) -> Result<(), LexError> {
        let (content, close) = self
            .scan_quoted(start, '\'')
            .ok_or_else(|| LexError::UnterminatedCharArray(self.location(start, start + 1)))?;
        let token = self
            .make_token(TokenKind::CharArray, start, close + 1, ws)
            .with_value(content);
        self.push(token);
        Ok(())
    }

    fn lex_string(&mut self, start: usize, ws: bool) -> Result<(), LexError> {
        let (content, close) = self
            .scan_quoted(start, '"')
            .ok_or_else(|| LexError::UnterminatedString(self.location(start, start + 1)))?;
        let token = self
            .make_token(TokenKind::String, start, close + 1, ws)
            .with_value(content);
        self.push(token);
        Ok(())
    }

    fn is_block_marker(&self, line: &str, close: bool) -> bool {
        let line = line.trim();
        let marker = if close { ['%', '}'] } else { ['%', '{'] };
        let octave_marker = if close { ['#', '}'] } else { ['#', '{'] };
        let mut chars = line.chars();
        let pair = [chars.next(), chars.next()];
        if chars.next().is_some() {
            return false;
        }
        pair == marker.map(Some) || (self.octave() && pair == octave_marker.map(Some))
    }

    fn lex_comment(&mut self, start: usize, end: usize, ws: bool) -> Result<(), LexError> {
        let src = self.src;
        let text = &src[start..end];

        if !self.line_has_token && text.starts_with("%|") {
            let token = self.make_token(TokenKind::Annotation, start, start + 2, ws);
            self.saved_statement_start = self.statement_start;
            self.push(token);
            self.in_annotation = true;
            return Ok(());
        }

        if !self.line_has_token && self.is_block_marker(text, false) {
            let mut depth = 1usize;
            let mut line_end = end;
            loop {
                let Some(nl) = self.src[line_end..].find('\n') else {
                    return Err(LexError::UnterminatedBlockComment(self.location(start, end)));
                };
                let begin = line_end + nl + 1;
                line_end = self.line_end(begin);
                let line = &self.src[begin..line_end];
                if self.is_block_marker(line, false) {
                    depth += 1;
                } else if self.is_block_marker(line, true) {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
            }
            let token = self.make_token(TokenKind::Comment, start, line_end, ws);
            self.push(token);
            return Ok(());
        }

        let token = self.make_token(TokenKind::Comment, start, end, ws);
        self.push(token);
        Ok(())
    }

    /// Does the `[` at `open` start an assignment target list, i.e. is its
    /// matching `]` followed by `=`?
    fn is_assignment_bracket(&self, open: usize) -> bool {
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut prev = b'[';
        let mut i = open;
        while i < bytes.len() {
            let c = bytes[i];
            match c {
                b'[' | b'(' | b'{' => depth += 1,
                b']' | b')' | b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                b'\'' if matches!(prev, b' ' | b'\t' | b'[' | b'(' | b'{' | b',' | b';' | b'=') => {
                    match self.scan_quoted(i, '\'') {
                        Some((_, close)) => i = close,
                        None => return false,
                    }
                }
                b'"' => match self.scan_quoted(i, '"') {
                    Some((_, close)) => i = close,
                    None => return false,
                },
                b'%' => {
                    i = self.line_end(i);
                    continue;
                }
                b'.' if self.src[i..].starts_with("...") => {
                    i = self.line_end(i);
                    continue;
                }
                _ => {}
            }
            prev = c;
            i += 1;
        }
        if i >= bytes.len() {
            return false;
        }
        let after = self.src[i + 1..].trim_start_matches([' ', '\t']);
        after.starts_with('=') && !after.starts_with("==")
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        while self.pending.is_empty() {
            if self.pos >= self.src.len() {
                return Ok(None);
            }
            self.lex_step()?;
        }
        Ok(self.pending.pop_front())
    }

    fn file_name(&self) -> Arc<str> {
        self.file.clone()
    }

    fn line_count(&self) -> u32 {
        self.line_count
    }

    fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }
}

/// Tokenize an entire source text into a Vec
pub fn tokenize(file: &str, src: &str, dialect: Dialect) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(file, src);
    lexer.set_dialect(dialect);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize("t.m", src, Dialect::Matlab)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn values(src: &str, dialect: Dialect) -> Vec<String> {
        tokenize("t.m", src, dialect)
            .unwrap()
            .into_iter()
            .map(|t| t.value.to_string())
            .collect()
    }

    #[test]
    fn test_transpose_versus_char_array() {
        assert_eq!(
            kinds("x = a';"),
            vec![
                TokenKind::Identifier,
                TokenKind::Assignment,
                TokenKind::Identifier,
                TokenKind::Operator(Operator::Transpose),
                TokenKind::Semicolon,
            ]
        );
        assert_eq!(
            kinds("x = 'a';"),
            vec![
                TokenKind::Identifier,
                TokenKind::Assignment,
                TokenKind::CharArray,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_doubled_quotes_are_unescaped() {
        assert_eq!(values("'it''s'", Dialect::Matlab), vec!["it's"]);
        assert_eq!(values("\"say \"\"hi\"\"\"", Dialect::Matlab), vec!["say \"hi\""]);
    }

    #[test]
    fn test_matrix_whitespace_inserts_commas() {
        let tokens = tokenize("t.m", "[1 -2 a' 'b']", Dialect::Matlab).unwrap();
        let anonymous = tokens.iter().filter(|t| t.anonymous).count();
        assert_eq!(anonymous, 3);
        assert_eq!(
            kinds("[1 - 2]"),
            vec![
                TokenKind::LBracket,
                TokenKind::Number,
                TokenKind::Operator(Operator::Minus),
                TokenKind::Number,
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_lambda_parameters_do_not_split_matrix_element() {
        let anonymous = |src: &str| {
            tokenize("t.m", src, Dialect::Matlab)
                .unwrap()
                .iter()
                .filter(|t| t.anonymous)
                .count()
        };
        assert_eq!(anonymous("{@(x) x, 2}"), 0);
        assert_eq!(anonymous("[@(x) x+1]"), 0);
        assert_eq!(anonymous("{@(x) x @(y) y}"), 1);
        assert_eq!(anonymous("[a (1)]"), 1);
    }

    #[test]
    fn test_assignment_brackets() {
        let k = kinds("[a, b] = f();");
        assert_eq!(k[0], TokenKind::ABracket);
        assert_eq!(k[4], TokenKind::AKet);
        assert_eq!(kinds("[a, b] == c;")[0], TokenKind::LBracket);
    }

    #[test]
    fn test_command_form() {
        let tokens = tokenize("t.m", "hold on;\nformat long g\n", Dialect::Matlab).unwrap();
        let commands: Vec<_> = tokens.iter().filter(|t| t.command).map(|t| t.value.as_str()).collect();
        assert_eq!(commands, vec!["on", "long", "g"]);
        let tokens = tokenize("t.m", "x - y\n", Dialect::Matlab).unwrap();
        assert!(tokens.iter().all(|t| !t.command));
    }

    #[test]
    fn test_command_form_quoted_argument() {
        let tokens = tokenize("t.m", "disp 'hello world'\n", Dialect::Matlab).unwrap();
        assert_eq!(tokens[1].value, "hello world");
        assert!(tokens[1].command);
    }

    #[test]
    fn test_no_command_form_in_properties() {
        let src = "classdef A\n  properties\n    x double\n  end\nend\n";
        let tokens = tokenize("A.m", src, Dialect::Matlab).unwrap();
        assert!(tokens.iter().all(|t| !t.command));
    }

    #[test]
    fn test_block_comment_is_one_token() {
        let tokens = tokenize("t.m", "%{\nhello\n%}\nx = 1;\n", Dialect::Matlab).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].location.end_line, 3);
        assert_eq!(tokens[2].location.line, 4);
    }

    #[test]
    fn test_annotation_tokens_are_flagged() {
        let tokens = tokenize("t.m", "%| pragma No_Tracing;\nx = 1;\n", Dialect::Matlab).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Annotation);
        assert!(tokens[1].annotation && tokens[1].is_identifier("pragma"));
        let x = tokens.iter().find(|t| t.is_identifier("x")).unwrap();
        assert!(!x.annotation);
    }

    #[test]
    fn test_continuation_swallows_line_break() {
        let k = kinds("x = 1 + ...\n 2;\n");
        assert!(k.contains(&TokenKind::Continuation));
        assert_eq!(k.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn test_octave_dialect() {
        let tokens = tokenize("t.m", "# comment\nx = !y;\nendif\n", Dialect::Octave).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Operator(Operator::Not)));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Keyword(Keyword::EndIf)));
        assert!(tokenize("t.m", "# comment\n", Dialect::Matlab).is_err());
    }

    #[test]
    fn test_number_with_trailing_dot() {
        assert_eq!(values("x = 1.;", Dialect::Matlab)[2], "1.");
        assert_eq!(
            kinds("1./x")[1],
            TokenKind::Operator(Operator::ElementDivide)
        );
    }

    #[test]
    fn test_shell_escape() {
        let tokens = tokenize("t.m", "!ls -l\n", Dialect::Matlab).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Bang);
        assert_eq!(tokens[0].value, "ls -l");
    }

    #[test]
    fn test_unterminated_char_array() {
        let err = tokenize("t.m", "x = 'abc\n", Dialect::Matlab).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedCharArray(_)));
    }

    #[test]
    fn test_columns_expand_tabs() {
        let tokens = tokenize("t.m", "\tx = 1;\n", Dialect::Matlab).unwrap();
        assert_eq!(tokens[0].location.col_start, 8);
        assert!(tokens[0].first_in_line);
        assert!(!tokens[1].first_in_line);
    }
}

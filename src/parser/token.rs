//! Token model shared by the tokenizer, the parser and the autofix layer.
//!
//! Tokens are plain values. Everything the parser learns about a token
//! after it has been produced (autofix instructions, the AST node that
//! consumed it) is kept in side tables keyed by [`TokenId`], see
//! [`crate::parser::fixes`].

use std::fmt;

use smol_str::SmolStr;

use crate::base::Location;

/// Index of a token in the per-file token vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub(crate) u32);

impl TokenId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Reserved words of the language.
///
/// The class-body words (`properties`, `methods`, ...) and `arguments` are
/// not listed here: they are only keywords in specific positions and the
/// parser recognises them as identifiers in those positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Classdef,
    Continue,
    Else,
    Elseif,
    End,
    For,
    Function,
    Global,
    If,
    Import,
    Otherwise,
    Parfor,
    Persistent,
    Return,
    Spmd,
    Switch,
    Try,
    While,

    // Octave only
    Do,
    Until,
    UnwindProtect,
    UnwindProtectCleanup,
    EndUnwindProtect,
    EndFunction,
    EndIf,
    EndFor,
    EndParfor,
    EndWhile,
    EndSwitch,
    EndTryCatch,
    EndSpmd,
}

impl Keyword {
    /// Look up a keyword; Octave-only words are only recognised when
    /// `octave` is set.
    pub fn lookup(text: &str, octave: bool) -> Option<Keyword> {
        let kw = match text {
            "break" => Self::Break,
            "case" => Self::Case,
            "catch" => Self::Catch,
            "classdef" => Self::Classdef,
            "continue" => Self::Continue,
            "else" => Self::Else,
            "elseif" => Self::Elseif,
            "end" => Self::End,
            "for" => Self::For,
            "function" => Self::Function,
            "global" => Self::Global,
            "if" => Self::If,
            "import" => Self::Import,
            "otherwise" => Self::Otherwise,
            "parfor" => Self::Parfor,
            "persistent" => Self::Persistent,
            "return" => Self::Return,
            "spmd" => Self::Spmd,
            "switch" => Self::Switch,
            "try" => Self::Try,
            "while" => Self::While,
            _ if !octave => return None,
            "do" => Self::Do,
            "until" => Self::Until,
            "unwind_protect" => Self::UnwindProtect,
            "unwind_protect_cleanup" => Self::UnwindProtectCleanup,
            "end_unwind_protect" => Self::EndUnwindProtect,
            "endfunction" => Self::EndFunction,
            "endif" => Self::EndIf,
            "endfor" => Self::EndFor,
            "endparfor" => Self::EndParfor,
            "endwhile" => Self::EndWhile,
            "endswitch" => Self::EndSwitch,
            "end_try_catch" => Self::EndTryCatch,
            "endspmd" => Self::EndSpmd,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Break => "break",
            Self::Case => "case",
            Self::Catch => "catch",
            Self::Classdef => "classdef",
            Self::Continue => "continue",
            Self::Else => "else",
            Self::Elseif => "elseif",
            Self::End => "end",
            Self::For => "for",
            Self::Function => "function",
            Self::Global => "global",
            Self::If => "if",
            Self::Import => "import",
            Self::Otherwise => "otherwise",
            Self::Parfor => "parfor",
            Self::Persistent => "persistent",
            Self::Return => "return",
            Self::Spmd => "spmd",
            Self::Switch => "switch",
            Self::Try => "try",
            Self::While => "while",
            Self::Do => "do",
            Self::Until => "until",
            Self::UnwindProtect => "unwind_protect",
            Self::UnwindProtectCleanup => "unwind_protect_cleanup",
            Self::EndUnwindProtect => "end_unwind_protect",
            Self::EndFunction => "endfunction",
            Self::EndIf => "endif",
            Self::EndFor => "endfor",
            Self::EndParfor => "endparfor",
            Self::EndWhile => "endwhile",
            Self::EndSwitch => "endswitch",
            Self::EndTryCatch => "end_try_catch",
            Self::EndSpmd => "endspmd",
        }
    }

    /// True for `end` and every construct-specific Octave closer
    pub fn is_end(&self) -> bool {
        matches!(
            self,
            Self::End
                | Self::EndUnwindProtect
                | Self::EndFunction
                | Self::EndIf
                | Self::EndFor
                | Self::EndParfor
                | Self::EndWhile
                | Self::EndSwitch
                | Self::EndTryCatch
                | Self::EndSpmd
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    LeftDivide,
    Power,
    ElementTimes,
    ElementDivide,
    ElementLeftDivide,
    ElementPower,
    /// `'`
    Transpose,
    /// `.'`
    NonConjugateTranspose,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    ElementAnd,
    ElementOr,
    ShortCircuitAnd,
    ShortCircuitOr,
    /// `~`, or `!` in Octave
    Not,
}

impl Operator {
    pub fn from_text(text: &str) -> Option<Operator> {
        let op = match text {
            "+" => Self::Plus,
            "-" => Self::Minus,
            "*" => Self::Times,
            "/" => Self::Divide,
            "\\" => Self::LeftDivide,
            "^" => Self::Power,
            ".*" => Self::ElementTimes,
            "./" => Self::ElementDivide,
            ".\\" => Self::ElementLeftDivide,
            ".^" => Self::ElementPower,
            "'" => Self::Transpose,
            ".'" => Self::NonConjugateTranspose,
            "==" => Self::Equal,
            "~=" | "!=" => Self::NotEqual,
            "<" => Self::Less,
            "<=" => Self::LessEqual,
            ">" => Self::Greater,
            ">=" => Self::GreaterEqual,
            "&" => Self::ElementAnd,
            "|" => Self::ElementOr,
            "&&" => Self::ShortCircuitAnd,
            "||" => Self::ShortCircuitOr,
            "~" | "!" => Self::Not,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical spelling (MATLAB form)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::LeftDivide => "\\",
            Self::Power => "^",
            Self::ElementTimes => ".*",
            Self::ElementDivide => "./",
            Self::ElementLeftDivide => ".\\",
            Self::ElementPower => ".^",
            Self::Transpose => "'",
            Self::NonConjugateTranspose => ".'",
            Self::Equal => "==",
            Self::NotEqual => "~=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::ElementAnd => "&",
            Self::ElementOr => "|",
            Self::ShortCircuitAnd => "&&",
            Self::ShortCircuitOr => "||",
            Self::Not => "~",
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
        )
    }

    pub fn is_unary_prefix(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus | Self::Not)
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, Self::Transpose | Self::NonConjugateTranspose)
    }

    pub fn is_power(&self) -> bool {
        matches!(self, Self::Power | Self::ElementPower)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All token kinds produced by a [`crate::parser::TokenSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number,
    /// `'...'`
    CharArray,
    /// `"..."`
    String,
    Keyword(Keyword),
    Operator(Operator),
    Newline,
    Comment,
    Continuation,
    /// The `%|` marker opening an annotation line
    Annotation,
    /// `=`
    Assignment,
    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    /// `[` of a matrix literal
    LBracket,
    /// `]` of a matrix literal
    RBracket,
    /// `[` of an assignment target list
    ABracket,
    /// `]` of an assignment target list
    AKet,
    LBrace,
    RBrace,
    /// `.`
    Selection,
    /// `@`
    At,
    /// `?`
    Metaclass,
    /// `.?`
    NvpDelegate,
    /// `!command` shell escape
    Bang,
}

impl TokenKind {
    /// Tokens the lookahead buffer never shows to grammar rules
    pub fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment | Self::Continuation | Self::Annotation)
    }

    /// Tokens that may end a statement
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Newline | Self::Comma | Self::Semicolon)
    }

    pub fn description(&self) -> String {
        match self {
            Self::Identifier => "identifier".to_string(),
            Self::Number => "number".to_string(),
            Self::CharArray => "character array".to_string(),
            Self::String => "string".to_string(),
            Self::Keyword(kw) => format!("keyword '{}'", kw),
            Self::Operator(op) => format!("operator '{}'", op),
            Self::Newline => "newline".to_string(),
            Self::Comment => "comment".to_string(),
            Self::Continuation => "continuation".to_string(),
            Self::Annotation => "annotation".to_string(),
            Self::Assignment => "'='".to_string(),
            Self::Comma => "','".to_string(),
            Self::Semicolon => "';'".to_string(),
            Self::Colon => "':'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::LBracket | Self::ABracket => "'['".to_string(),
            Self::RBracket | Self::AKet => "']'".to_string(),
            Self::LBrace => "'{'".to_string(),
            Self::RBrace => "'}'".to_string(),
            Self::Selection => "'.'".to_string(),
            Self::At => "'@'".to_string(),
            Self::Metaclass => "'?'".to_string(),
            Self::NvpDelegate => "'.?'".to_string(),
            Self::Bang => "shell escape".to_string(),
        }
    }
}

/// A lexical unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Text exactly as it appears in the source
    pub raw_text: SmolStr,
    /// Resolved value: unquoted content for literals, the text otherwise
    pub value: SmolStr,
    pub location: Location,
    pub first_in_line: bool,
    pub first_in_statement: bool,
    /// Inside a `%|` annotation line
    pub annotation: bool,
    pub whitespace_before: bool,
    /// Inserted by the tokenizer, absent from the source text
    pub anonymous: bool,
    /// Argument of a command-form call
    pub command: bool,
}

impl Token {
    pub fn new(kind: TokenKind, raw_text: impl Into<SmolStr>, location: Location) -> Self {
        let raw_text = raw_text.into();
        Self {
            kind,
            value: raw_text.clone(),
            raw_text,
            location,
            first_in_line: false,
            first_in_statement: false,
            annotation: false,
            whitespace_before: false,
            anonymous: false,
            command: false,
        }
    }

    pub fn with_value(mut self, value: impl Into<SmolStr>) -> Self {
        self.value = value.into();
        self
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.value == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octave_keywords_need_octave_mode() {
        assert_eq!(Keyword::lookup("endif", false), None);
        assert_eq!(Keyword::lookup("endif", true), Some(Keyword::EndIf));
        assert_eq!(Keyword::lookup("end", false), Some(Keyword::End));
        assert_eq!(Keyword::lookup("properties", true), None);
    }

    #[test]
    fn test_keyword_spelling_roundtrips() {
        for text in ["break", "unwind_protect_cleanup", "end_try_catch", "parfor"] {
            let kw = Keyword::lookup(text, true).unwrap();
            assert_eq!(kw.as_str(), text);
        }
    }

    #[test]
    fn test_operator_aliases() {
        assert_eq!(Operator::from_text("!="), Some(Operator::NotEqual));
        assert_eq!(Operator::from_text("!"), Some(Operator::Not));
        assert_eq!(Operator::NotEqual.as_str(), "~=");
        assert!(Operator::LessEqual.is_relational());
        assert!(!Operator::ElementAnd.is_relational());
    }
}

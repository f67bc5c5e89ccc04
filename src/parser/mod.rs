//! Syntax front-end for MATLAB and Octave
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with layout flags
//!     ↓
//! TokenBuffer → three-token window, trivia skipped
//!     ↓
//! Grammar rules → arena AST + autofix table + token links
//!     ↓
//! ParseResult → tree, tokens and diagnostics for later passes
//! ```

#[allow(clippy::module_inception)]
mod parser;

mod buffer;
mod context;
pub mod errors;
mod fixes;
pub mod grammar;
mod lexer;
mod options;
mod token;

pub use buffer::TokenBuffer;
pub use context::{ContextKind, ContextStack};
pub use errors::{ErrorCode, ParseError, SyntaxError};
pub use fixes::{Fix, FixTable, TokenLinks};
pub use grammar::Terminator;
pub use lexer::{LexError, Lexer, TokenSource, tokenize};
pub use options::{Dialect, ParseOptions};
pub use parser::{ParseResult, Parser, parse_source, parse_tokens};
pub use token::{Keyword, Operator, Token, TokenId, TokenKind};

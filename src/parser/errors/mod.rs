//! Parser error handling module
//!
//! This module provides error handling for the MATLAB/Octave parser:
//! - Categorized error codes for filtering and documentation
//! - Context-aware error messages
//! - Suggestions/hints for common mistakes
//! - Related location tracking (e.g. "function opened here" for a missing `end`)
//! - [`ParseError`], the error unwinding out of grammar rules

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{
    ParseError, RelatedInfo, Severity, SyntaxError, SyntaxErrorBuilder, format_context_error,
};

#[cfg(test)]
mod tests;

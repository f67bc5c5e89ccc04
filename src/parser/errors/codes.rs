//! Error code definitions for parser diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (invalid characters, unterminated literals)
//! - E02xx: Termination errors (statement terminators, unclosed brackets, missing `end`)
//! - E03xx: Definition errors (functions, classes, blocks)
//! - E04xx: Expression errors
//! - E05xx: Context errors (constructs in the wrong place)
//! - E09xx: Generic/fallback errors

use std::fmt;

/// Error codes for parser diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors
    // =========================================================================
    /// Invalid or unexpected character in source
    E0101,
    /// Unterminated character array
    E0102,
    /// Unterminated string
    E0103,
    /// Unterminated block comment
    E0104,

    // =========================================================================
    // E02xx: Termination errors
    // =========================================================================
    /// Statement not followed by a terminator
    E0201,
    /// Unclosed parenthesis `(`
    E0202,
    /// Unclosed bracket `[`
    E0203,
    /// Unclosed brace `{`
    E0204,
    /// Missing `end`
    E0205,

    // =========================================================================
    // E03xx: Definition errors
    // =========================================================================
    /// Missing identifier/name
    E0301,
    /// Malformed function signature
    E0302,
    /// Functions closed by `end` mixed with unterminated functions
    E0303,
    /// Unexpected token in a class body
    E0304,
    /// Malformed attribute list
    E0305,
    /// Script-local function without `end`
    E0306,
    /// Ignored output `~` not followed by a comma
    E0307,

    // =========================================================================
    // E04xx: Expression errors
    // =========================================================================
    /// Expected an expression
    E0401,
    /// Assignment to something that is not a name
    E0402,
    /// Operator where an operand was expected
    E0403,
    /// `end` outside of an index expression
    E0404,

    // =========================================================================
    // E05xx: Context errors
    // =========================================================================
    /// `break`/`continue` outside of a loop
    E0501,
    /// Construct not allowed in this position
    E0502,
    /// Construct not available in the selected dialect
    E0503,

    // =========================================================================
    // E09xx: Generic/fallback errors
    // =========================================================================
    /// Unexpected token in current context
    E0901,
    /// Expected a specific token
    E0902,
    /// Internal parser error
    E0999,
}

impl ErrorCode {
    /// Get the string representation of the error code (e.g., "E0201")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0104 => "E0104",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
            Self::E0204 => "E0204",
            Self::E0205 => "E0205",
            Self::E0301 => "E0301",
            Self::E0302 => "E0302",
            Self::E0303 => "E0303",
            Self::E0304 => "E0304",
            Self::E0305 => "E0305",
            Self::E0306 => "E0306",
            Self::E0307 => "E0307",
            Self::E0401 => "E0401",
            Self::E0402 => "E0402",
            Self::E0403 => "E0403",
            Self::E0404 => "E0404",
            Self::E0501 => "E0501",
            Self::E0502 => "E0502",
            Self::E0503 => "E0503",
            Self::E0901 => "E0901",
            Self::E0902 => "E0902",
            Self::E0999 => "E0999",
        }
    }

    /// Get a short description of the error category
    pub fn category_description(&self) -> &'static str {
        match self {
            Self::E0101 | Self::E0102 | Self::E0103 | Self::E0104 => "lexical error",
            Self::E0201 | Self::E0202 | Self::E0203 | Self::E0204 | Self::E0205 => {
                "termination error"
            }
            Self::E0301
            | Self::E0302
            | Self::E0303
            | Self::E0304
            | Self::E0305
            | Self::E0306
            | Self::E0307 => "definition error",
            Self::E0401 | Self::E0402 | Self::E0403 | Self::E0404 => "expression error",
            Self::E0501 | Self::E0502 | Self::E0503 => "context error",
            Self::E0901 | Self::E0902 => "syntax error",
            Self::E0999 => "internal error",
        }
    }

    /// Get the default message template for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "invalid character",
            Self::E0102 => "unterminated character array",
            Self::E0103 => "unterminated string",
            Self::E0104 => "unterminated block comment",
            Self::E0201 => "expected statement terminator",
            Self::E0202 => "unclosed parenthesis",
            Self::E0203 => "unclosed bracket",
            Self::E0204 => "unclosed brace",
            Self::E0205 => "missing 'end'",
            Self::E0301 => "missing identifier",
            Self::E0302 => "malformed function signature",
            Self::E0303 => "inconsistent function termination",
            Self::E0304 => "unexpected token in class body",
            Self::E0305 => "malformed attribute list",
            Self::E0306 => "script-local function must be terminated with 'end'",
            Self::E0307 => "ignored output must be followed by ','",
            Self::E0401 => "expected expression",
            Self::E0402 => "invalid assignment target",
            Self::E0403 => "unexpected operator",
            Self::E0404 => "'end' is only valid inside an index expression",
            Self::E0501 => "not inside a loop",
            Self::E0502 => "construct not allowed here",
            Self::E0503 => "construct not available in this dialect",
            Self::E0901 => "unexpected token",
            Self::E0902 => "expected token",
            Self::E0999 => "internal parser error",
        }
    }

    /// Check if this is a termination error
    pub fn is_termination(&self) -> bool {
        matches!(
            self,
            Self::E0201 | Self::E0202 | Self::E0203 | Self::E0204 | Self::E0205
        )
    }

    /// Internal errors are defects in the parser, never in the input
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::E0999)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::E0201.as_str(), "E0201");
        assert_eq!(ErrorCode::E0901.as_str(), "E0901");
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::E0307), "E0307");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::E0102.category_description(), "lexical error");
        assert_eq!(ErrorCode::E0205.category_description(), "termination error");
        assert_eq!(ErrorCode::E0303.category_description(), "definition error");
        assert_eq!(ErrorCode::E0501.category_description(), "context error");
        assert_eq!(ErrorCode::E0999.category_description(), "internal error");
    }

    #[test]
    fn test_is_termination() {
        assert!(ErrorCode::E0201.is_termination());
        assert!(ErrorCode::E0205.is_termination());
        assert!(!ErrorCode::E0301.is_termination());
    }

    #[test]
    fn test_is_internal() {
        assert!(ErrorCode::E0999.is_internal());
        assert!(!ErrorCode::E0901.is_internal());
    }
}

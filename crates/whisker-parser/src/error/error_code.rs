//! Error codes for template diagnostics.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A quoted literal inside a tag reached a line break or the end of input
    /// before its closing quote.
    E001,

    /// Unexpected character.
    ///
    /// A character that cannot start any token was found inside a tag.
    E002,

    /// Malformed closing delimiter.
    ///
    /// A tag was not closed with `}}`, or a raw tag was not closed with `}}}`.
    E003,

    /// Control character in a raw tag.
    ///
    /// `!`, `>`, `^` and `#` cannot follow a raw opening delimiter `{{{`.
    E004,

    /// Unterminated comment.
    ///
    /// A comment tag reached the end of input before its closing delimiter.
    E005,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unbalanced closing tag.
    ///
    /// A block closing tag names a different block than the one that is open,
    /// or no block is open at all.
    E100,

    /// Unclosed block.
    ///
    /// The input ended while a block tag was still open.
    E101,

    /// Missing token.
    ///
    /// A token required by the tag grammar, such as a closing delimiter or
    /// parenthesis, was not found.
    E102,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "malformed closing delimiter",
            ErrorCode::E004 => "control character in raw tag",
            ErrorCode::E005 => "unterminated comment",
            // Parser errors
            ErrorCode::E100 => "unbalanced closing tag",
            ErrorCode::E101 => "unclosed block",
            ErrorCode::E102 => "missing token",
        }
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
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated string literal");
        assert_eq!(ErrorCode::E100.description(), "unbalanced closing tag");
        assert_eq!(ErrorCode::E101.description(), "unclosed block");
    }
}

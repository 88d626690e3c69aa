//! Error types for Whisker operations.
//!
//! This module provides the main error type [`WhiskerError`] which wraps
//! the failures of compiling and running templates, and [`RenderError`] for
//! the usage errors a render call can raise.

use std::io;

use thiserror::Error;

use whisker_core::operator::OperatorError;
use whisker_parser::ParseError;

/// The main error type for Whisker operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains every diagnostic reported for the template
/// together with its source, which is enough for rich error reporting. Its
/// message has one `line:column: message` line per error.
#[derive(Debug, Error)]
pub enum WhiskerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{}", err.summary())]
    Parse { err: ParseError, src: String },

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl WhiskerError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}

/// Usage errors raised while rendering a compiled template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("The tag {name} requires at least {min} argument(s)")]
    TooFewArguments { name: String, min: usize },

    #[error("The tag {name} requires at most {max} argument(s)")]
    TooManyArguments { name: String, max: usize },

    #[error("Unexpected parameters to tag {0}")]
    UnexpectedParameters(String),

    #[error("Expected parameters to tag {0}")]
    ExpectedParameters(String),

    #[error(transparent)]
    Operator(#[from] OperatorError),

    #[error("No partial template called '{0}' has been compiled.")]
    UnknownPartial(String),

    #[error("No helper called '{0}' has been registered.")]
    UnknownHelper(String),

    #[error("No template called '{0}' has been compiled.")]
    UnknownTemplate(String),

    /// A failure reported by a user helper or partial function.
    #[error("{0}")]
    Helper(String),
}

impl RenderError {
    /// Create an error for a helper to return.
    pub fn helper(message: impl Into<String>) -> Self {
        Self::Helper(message.into())
    }
}

//! Diagnostics reported while lexing and parsing templates.
//!
//! Every problem found in a template is described by a [`Diagnostic`]: a
//! severity, an optional [`ErrorCode`], a message, labelled source spans and
//! the line/column where it was detected. The parser never stops at the first
//! problem; diagnostics are accumulated and handed back together, either in a
//! [`ParseResult`](crate::ParseResult) or wrapped in a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use whisker_parser::error::{Diagnostic, ErrorCode};
//! # use whisker_parser::Span;
//!
//! let close = Span::new(17..25);
//! let open = Span::new(0..9);
//!
//! let diag = Diagnostic::error(
//!     "Unbalanced tags - expected a closing tag for 'if' but instead found 'each'",
//! )
//! .with_code(ErrorCode::E100)
//! .with_label(close, "closing tag")
//! .with_secondary_label(open, "block opened here")
//! .with_help("close the innermost block first");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;

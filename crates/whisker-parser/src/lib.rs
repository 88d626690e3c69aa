//! # Whisker Parser
//!
//! Compiler front end for Whisker templates. This crate turns template
//! source into an immutable [`Document`] tree that the renderer walks.
//!
//! ## Usage
//!
//! ```
//! # use whisker_parser::{compile, ParseError, TagRegistry};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "Hello {{#each people}}{{name}} {{/each}}";
//!
//!     let document = compile(source, &TagRegistry::standard())?;
//!     assert_eq!(document.reconstruct(), source);
//!     Ok(())
//! }
//! ```

mod collapse;
pub mod error;
pub mod lexer;
mod location;
mod parser;
mod span;
mod symbol;
pub mod tags;
mod tree;

pub use collapse::collapse_whitespace;
pub use error::{Diagnostic, ErrorCode, Label, ParseError, Severity};
pub use location::{LineIndex, SourceLocation};
pub use parser::{ParseResult, parse};
pub use span::Span;
pub use symbol::{KEYWORDS, Symbol, SymbolKind};
pub use tags::{TagDescriptor, TagRegistry};
pub use tree::{Block, BlockKind, Document, Node, NodeId, SpanKind, SpanNode};

/// Compile template source into a document ready for rendering.
///
/// The pipeline:
///
/// 1. **Lex** - Split the source into symbols
/// 2. **Parse** - Build the block tree, binding block tags to descriptors
/// 3. **Collapse** - Apply `~` whitespace control
///
/// Warnings do not fail compilation. Any error does, and the returned
/// [`ParseError`] carries every diagnostic in source order.
///
/// # Example
///
/// ```
/// # use whisker_parser::{compile, TagRegistry};
///
/// let error = compile("{{#if ok}}yes{{/each}}", &TagRegistry::standard()).unwrap_err();
/// assert_eq!(
///     error.diagnostics()[0].message(),
///     "Unbalanced tags - expected a closing tag for 'if' but instead found 'each'"
/// );
/// ```
pub fn compile(source: &str, registry: &TagRegistry) -> Result<Document, ParseError> {
    let mut document = parse(source, registry).into_result()?;
    collapse_whitespace(&mut document);
    Ok(document)
}

//! Block Renderers
//!
//! Every block tag is rendered by the [`BlockRenderer`] its descriptor
//! names. The built-in renderers cover the standard tags:
//!
//! - [`Conditional`] - `if` / `elseif` / `else` chains
//! - [`Unless`] - the inverse of `if`
//! - [`Each`] - iteration with `@index`, `@first`, `@last` and `@key`
//! - [`With`] - a new scope over a value
//! - [`Is`] - operator comparisons with `elseis` chains
//! - [`Implicit`] - `{{#name}}` sections for names without a descriptor
//!
//! Custom tags register a descriptor together with their own renderer
//! through [`Engine::register_tag`](crate::Engine::register_tag).
mod conditional;
mod each;
mod implicit;
mod is;
mod scope;

pub use conditional::{Conditional, Unless};
pub use each::Each;
pub use implicit::Implicit;
pub use is::Is;
pub use scope::With;

use crate::{context::RenderContext, error::RenderError, render::TagBlock};

/// Renders the content of a block tag.
///
/// Arguments have already been checked against the tag descriptor when
/// `render` is called.
pub trait BlockRenderer: Send + Sync {
    fn render(
        &self,
        tag: &TagBlock<'_>,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError>;
}

impl<F> BlockRenderer for F
where
    F: Fn(&TagBlock<'_>, &RenderContext<'_>, &mut String) -> Result<(), RenderError>
        + Send
        + Sync,
{
    fn render(
        &self,
        tag: &TagBlock<'_>,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        self(tag, context, out)
    }
}

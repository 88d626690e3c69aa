use super::{BlockRenderer, each::render_entries};
use crate::{context::RenderContext, error::RenderError, render::TagBlock};

/// `{{#name}}` and `{{^name}}` sections for names without a descriptor.
///
/// The name resolves to a value. Collections iterate like `each`, other
/// truthy values render the content in their own scope, and falsy values
/// render nothing. A negated section renders its content in the current
/// scope exactly when the value is falsy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Implicit;

impl BlockRenderer for Implicit {
    fn render(
        &self,
        tag: &TagBlock<'_>,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let value = tag.value(context);
        let alternative = tag.alternative().map(|branch| branch.children());

        if tag.is_negated() {
            if !value.is_truthy() {
                return tag.render(tag.primary(), context, out);
            }
        } else if value.entries().is_some() {
            return render_entries(tag, &value, tag.primary(), alternative, context, out);
        } else if value.is_truthy() {
            let scope = context.scope(value);
            return tag.render(tag.primary(), &scope, out);
        }

        match alternative {
            Some(nodes) => tag.render(nodes, context, out),
            None => Ok(()),
        }
    }
}

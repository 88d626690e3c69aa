use log::trace;

use super::BlockRenderer;
use crate::{context::RenderContext, error::RenderError, render::TagBlock};

/// `{{#if}}`, with any number of `{{#elseif}}` branches and an `{{else}}`.
///
/// The first branch whose guard is truthy renders; an `else` branch always
/// matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conditional;

impl BlockRenderer for Conditional {
    fn render(
        &self,
        tag: &TagBlock<'_>,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for (index, branch) in tag.branches().iter().enumerate() {
            let selected = if branch.is_else() {
                true
            } else if index == 0 {
                tag.arguments().first().is_truthy()
            } else {
                tag.branch_arguments(branch, context)?.first().is_truthy()
            };
            if selected {
                trace!(branch = branch.name(); "Selected branch");
                return tag.render(branch.children(), context, out);
            }
        }
        Ok(())
    }
}

/// `{{#unless}}`: renders its content when the argument is falsy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unless;

impl BlockRenderer for Unless {
    fn render(
        &self,
        tag: &TagBlock<'_>,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        if !tag.arguments().first().is_truthy() {
            return tag.render(tag.primary(), context, out);
        }
        match tag.alternative() {
            Some(branch) => tag.render(branch.children(), context, out),
            None => Ok(()),
        }
    }
}

use whisker_core::{Value, operator::OperatorRegistry};

use super::BlockRenderer;
use crate::{context::RenderContext, error::RenderError, render::TagBlock};

/// `{{#is}}`: renders the first branch whose comparison holds.
///
/// A guard of one argument tests truthiness, two arguments compare with
/// `==`, and three name the operator in the middle, as in
/// `{{#is age ">" 18}}`. Further branches open with `{{elseis ...}}`, and
/// `{{else}}` or `{{^}}` always match.
#[derive(Debug, Clone, Copy, Default)]
pub struct Is;

impl BlockRenderer for Is {
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
                holds(tag.arguments().positional(), tag.operators())?
            } else {
                let arguments = tag.branch_arguments(branch, context)?;
                holds(arguments.positional(), tag.operators())?
            };
            if selected {
                return tag.render(branch.children(), context, out);
            }
        }
        Ok(())
    }
}

fn holds(arguments: &[Value], operators: &OperatorRegistry) -> Result<bool, RenderError> {
    Ok(match arguments {
        [value] => value.is_truthy(),
        [x, y] => operators.apply("==", x, y)?,
        [x, operator, y] => operators.apply(&operator.to_string(), x, y)?,
        _ => false,
    })
}

use log::trace;

use whisker_core::{Value, value::Entry};
use whisker_parser::NodeId;

use super::BlockRenderer;
use crate::{context::RenderContext, error::RenderError, render::TagBlock};

/// `{{#each items}}`: renders its content once per entry.
///
/// Each entry renders in a new scope of the entry value with `@index`,
/// `@first` and `@last` defined, plus `@key` for keyed collections. A value
/// that is not a collection iterates once; null and empty collections
/// render the `{{else}}` branch instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Each;

impl BlockRenderer for Each {
    fn render(
        &self,
        tag: &TagBlock<'_>,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let alternative = tag.alternative().map(|branch| branch.children());
        render_entries(
            tag,
            tag.arguments().first(),
            tag.primary(),
            alternative,
            context,
            out,
        )
    }
}

/// Render `content` once per entry of `value`, or `alternative` if there are none.
pub(crate) fn render_entries(
    tag: &TagBlock<'_>,
    value: &Value,
    content: &[NodeId],
    alternative: Option<&[NodeId]>,
    context: &RenderContext<'_>,
    out: &mut String,
) -> Result<(), RenderError> {
    let entries = match value {
        Value::Null => Vec::new(),
        _ => value.entries().unwrap_or_else(|| {
            vec![Entry {
                key: None,
                value: value.clone(),
            }]
        }),
    };
    trace!(tag = tag.name(), entries = entries.len(); "Iterating");

    if entries.is_empty() {
        return match alternative {
            Some(nodes) => tag.render(nodes, context, out),
            None => Ok(()),
        };
    }

    let last = entries.len() - 1;
    for (index, entry) in entries.into_iter().enumerate() {
        let mut scope = context.scope(entry.value);
        scope.set_variable("index", index);
        scope.set_variable("first", index == 0);
        scope.set_variable("last", index == last);
        if let Some(key) = entry.key {
            scope.set_variable("key", key);
        }
        tag.render(content, &scope, out)?;
    }
    Ok(())
}

use super::BlockRenderer;
use crate::{context::RenderContext, error::RenderError, render::TagBlock};

/// `{{#with value}}`: renders its content in a new scope of a truthy value,
/// and the `{{else}}` branch otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct With;

impl BlockRenderer for With {
    fn render(
        &self,
        tag: &TagBlock<'_>,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let value = tag.arguments().first();
        if value.is_truthy() {
            let scope = context.scope(value.clone());
            return tag.render(tag.primary(), &scope, out);
        }
        match tag.alternative() {
            Some(branch) => tag.render(branch.children(), context, out),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::Engine;

    fn render(source: &str, model: serde_json::Value) -> String {
        Engine::default()
            .compile(source)
            .unwrap()
            .render(&model.into())
            .unwrap()
    }

    #[test]
    fn test_with_scope() {
        let model = json!({"title": "Top", "person": {"name": "Matt"}});
        assert_eq!(
            render("{{#with person}}{{name}} in {{../title}}{{/with}}", model),
            "Matt in Top"
        );
    }

    #[test]
    fn test_with_else() {
        assert_eq!(
            render("{{#with person}}{{name}}{{else}}nobody{{/with}}", json!({})),
            "nobody"
        );
    }
}

//! User helpers and the options they are called with.

use indexmap::IndexMap;

use whisker_core::Value;
use whisker_parser::NodeId;

use crate::{
    context::RenderContext,
    error::RenderError,
    render::{Arguments, Renderer},
};

/// A helper: computes a value from its call options.
///
/// The value is written without escaping when the helper is used as an
/// expression or a block, and is passed on as an argument when used in a
/// sub-expression.
pub type HelperFn = dyn Fn(&HelperOptions<'_>) -> Result<Value, RenderError> + Send + Sync;

/// A partial implemented in code: renders the model it is given.
pub type PartialFn = dyn Fn(&Value) -> Result<String, RenderError> + Send + Sync;

/// Everything a helper can see about the call site.
pub struct HelperOptions<'a> {
    name: &'a str,
    arguments: Arguments,
    renderer: Renderer<'a>,
    context: &'a RenderContext<'a>,
    children: &'a [NodeId],
}

impl<'a> HelperOptions<'a> {
    pub(crate) fn new(
        name: &'a str,
        arguments: Arguments,
        renderer: Renderer<'a>,
        context: &'a RenderContext<'a>,
        children: &'a [NodeId],
    ) -> Self {
        Self {
            name,
            arguments,
            renderer,
            context,
            children,
        }
    }

    /// The name the helper was called by.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Positional arguments, in call order.
    pub fn arguments(&self) -> &[Value] {
        self.arguments.positional()
    }

    /// `key=value` arguments, in call order.
    pub fn parameters(&self) -> &IndexMap<String, Value> {
        self.arguments.parameters()
    }

    /// The first positional argument, or null.
    pub fn data(&self) -> &Value {
        self.arguments.first()
    }

    /// The model of the calling scope.
    pub fn model(&self) -> &Value {
        self.context.model()
    }

    pub fn context(&self) -> &RenderContext<'a> {
        self.context
    }

    /// Whether the helper was called as a block with content.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Render the block content of the call.
    ///
    /// With `Some(model)` the content renders in a new scope of that model,
    /// otherwise in the calling scope. Expression helpers have no content
    /// and render the empty string.
    pub fn render_children(&self, model: Option<&Value>) -> Result<String, RenderError> {
        let mut out = String::new();
        match model {
            Some(model) => {
                let scope = self.context.scope(model.clone());
                self.renderer.render_nodes(self.children, &scope, &mut out)?;
            }
            None => self
                .renderer
                .render_nodes(self.children, self.context, &mut out)?,
        }
        Ok(out)
    }
}

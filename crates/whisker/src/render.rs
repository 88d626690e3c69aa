//! Walks a compiled document and writes its output.
//!
//! The [`Renderer`] dispatches on block kind: text and whitespace spans are
//! copied, expressions are resolved and escaped, partials render their own
//! document, and block tags are handed to the [`BlockRenderer`] their
//! descriptor names. Helpers registered under a name take precedence over
//! path resolution for expressions, sub-expressions and implicit blocks.
//!
//! [`BlockRenderer`]: crate::renderers::BlockRenderer

use std::sync::Arc;

use indexmap::IndexMap;
use log::{trace, warn};

use whisker_core::{Value, html::escape_html, operator::OperatorRegistry};
use whisker_parser::{
    Block, BlockKind, Document, Node, NodeId, SpanKind, SpanNode, TagDescriptor,
    tags::renderer,
};

use crate::{
    context::RenderContext,
    error::RenderError,
    helper::HelperOptions,
    registry::{Partial, Registry},
    resolve::{Resolver, resolve},
};

static NULL: Value = Value::Null;

/// Everything a render pass reads besides the document.
pub(crate) struct Environment<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) escape_html: bool,
    pub(crate) resolver: Option<&'a Resolver<'a>>,
}

/// Positional and `key=value` arguments of a tag.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    positional: Vec<Value>,
    parameters: IndexMap<String, Value>,
}

impl Arguments {
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    /// The first positional argument, or null.
    pub fn first(&self) -> &Value {
        self.positional.first().unwrap_or(&NULL)
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Renderer<'a> {
    document: &'a Document,
    env: &'a Environment<'a>,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(document: &'a Document, env: &'a Environment<'a>) -> Self {
        Self { document, env }
    }

    pub(crate) fn render_document(
        &self,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        self.render_nodes(self.document.children(self.document.root()), context, out)
    }

    pub(crate) fn render_nodes(
        &self,
        nodes: &[NodeId],
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for &id in nodes {
            self.render_node(id, context, out)?;
        }
        Ok(())
    }

    fn render_node(
        &self,
        id: NodeId,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let document: &'a Document = self.document;
        let Some(node) = document.node(id) else {
            return Ok(());
        };
        match node {
            Node::Span(span) => {
                render_span(span, out);
                Ok(())
            }
            Node::Block(block) => match block.kind() {
                BlockKind::Tag => self.render_tag(id, block, context, out),
                BlockKind::Expression => self.render_expression(id, block, context, out),
                BlockKind::Partial => self.render_partial(id, block, context, out),
                BlockKind::Document => self.render_nodes(block.children(), context, out),
                // Separators outside a block and comments render nothing.
                BlockKind::TagElement
                | BlockKind::ExpressionBody
                | BlockKind::SubExpression
                | BlockKind::Comment => Ok(()),
            },
        }
    }

    fn render_expression(
        &self,
        id: NodeId,
        block: &Block,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let name = block.name().unwrap_or_default();
        if self.env.registry.helper(name).is_some() {
            let arguments = self.arguments(id, context)?;
            let value = self.call_helper(name, arguments, context, &[])?;
            out.push_str(&value.to_string());
            return Ok(());
        }

        let Some(expression) = self.expression_span(id) else {
            return Ok(());
        };
        let value = resolve(expression.symbols(), context, self.env.resolver);
        self.write_value(&value, self.is_raw(id), out);
        Ok(())
    }

    fn write_value(&self, value: &Value, raw: bool, out: &mut String) {
        match value {
            Value::Null => {}
            Value::Safe(text) => out.push_str(text),
            _ => {
                let text = value.to_string();
                if raw || !self.env.escape_html {
                    out.push_str(&text);
                } else {
                    out.push_str(&escape_html(&text));
                }
            }
        }
    }

    /// Whether an expression opened with `{{{` or `{{&`.
    fn is_raw(&self, id: NodeId) -> bool {
        self.document.children(id).iter().any(|&child| {
            self.document.span(child).is_some_and(|span| {
                span.kind() == SpanKind::MetaCode && matches!(span.content(), "{{{" | "&")
            })
        })
    }

    fn render_partial(
        &self,
        id: NodeId,
        block: &Block,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let name = block.name().unwrap_or_default();
        let registry: &'a Registry = self.env.registry;
        let partial = registry
            .partial(name)
            .ok_or_else(|| RenderError::UnknownPartial(name.to_string()))?;
        let arguments = self.arguments(id, context)?;

        let scope;
        let context = match arguments.positional() {
            [model] => {
                scope = context.scope(model.clone());
                &scope
            }
            _ => context,
        };

        trace!(partial = name; "Rendering partial");
        match partial {
            Partial::Template(document) => {
                Renderer::new(document, self.env).render_document(context, out)
            }
            Partial::Function(function) => {
                out.push_str(&function(context.model())?);
                Ok(())
            }
        }
    }

    fn render_tag(
        &self,
        id: NodeId,
        block: &'a Block,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let Some(descriptor) = block.descriptor() else {
            return Ok(());
        };
        let name = block.name().unwrap_or_default();
        let tag = TagBlock::new(*self, id, name, descriptor, context)?;

        if descriptor.is_implicit() && self.env.registry.helper(name).is_some() {
            let value = self.call_helper(name, tag.arguments.clone(), context, tag.content())?;
            out.push_str(&value.to_string());
            return Ok(());
        }

        let registry: &'a Registry = self.env.registry;
        let Some(block_renderer) = registry
            .renderer(descriptor.renderer())
            .or_else(|| registry.renderer(renderer::IMPLICIT))
        else {
            warn!(tag = name, renderer = descriptor.renderer(); "No renderer registered");
            return Ok(());
        };

        validate(name, descriptor, &tag.arguments)?;
        trace!(tag = name, renderer = descriptor.renderer(); "Rendering tag");
        block_renderer.render(&tag, context, out)
    }

    /// Evaluate a parenthesized call to a value.
    fn evaluate_sub_expression(
        &self,
        id: NodeId,
        block: &Block,
        context: &RenderContext<'_>,
    ) -> Result<Value, RenderError> {
        let name = block.name().unwrap_or_default();
        if self.env.registry.helper(name).is_some() {
            let arguments = self.arguments(id, context)?;
            return self.call_helper(name, arguments, context, &[]);
        }
        Ok(self
            .expression_span(id)
            .map(|span| resolve(span.symbols(), context, self.env.resolver))
            .unwrap_or_default())
    }

    pub(crate) fn call_helper(
        &self,
        name: &str,
        arguments: Arguments,
        context: &RenderContext<'_>,
        children: &'a [NodeId],
    ) -> Result<Value, RenderError> {
        let helper = self
            .env
            .registry
            .helper(name)
            .ok_or_else(|| RenderError::UnknownHelper(name.to_string()))?;
        trace!(helper = name, arguments = arguments.positional().len(); "Calling helper");

        let options = HelperOptions::new(name, arguments, *self, context, children);
        helper(&options)
    }

    /// Gather the arguments inside the body of `element`.
    ///
    /// A `key=` whose value is a sub-expression takes the value of the
    /// sub-expression that follows it. Repeated keys keep the last value.
    pub(crate) fn arguments(
        &self,
        element: NodeId,
        context: &RenderContext<'_>,
    ) -> Result<Arguments, RenderError> {
        let mut arguments = Arguments::default();
        let Some(body) = self.body(element) else {
            return Ok(arguments);
        };

        let mut pending: Option<String> = None;
        for &child in self.document.children(body) {
            match self.document.node(child) {
                Some(Node::Span(span)) => match span.kind() {
                    SpanKind::Parameter => {
                        if let Some(key) = pending.take() {
                            arguments.parameters.insert(key, Value::Null);
                        }
                        let value = resolve(span.symbols(), context, self.env.resolver);
                        arguments.positional.push(value);
                    }
                    SpanKind::Map => {
                        let symbols = span.symbols();
                        let key = symbols
                            .first()
                            .map(|symbol| symbol.content().to_string())
                            .unwrap_or_default();
                        match symbols.get(2..) {
                            Some(value) if !value.is_empty() => {
                                let value = resolve(value, context, self.env.resolver);
                                arguments.parameters.insert(key, value);
                            }
                            _ => pending = Some(key),
                        }
                    }
                    _ => {}
                },
                Some(Node::Block(block)) if block.kind() == BlockKind::SubExpression => {
                    let value = self.evaluate_sub_expression(child, block, context)?;
                    match pending.take() {
                        Some(key) => {
                            arguments.parameters.insert(key, value);
                        }
                        None => arguments.positional.push(value),
                    }
                }
                _ => {}
            }
        }
        if let Some(key) = pending {
            arguments.parameters.insert(key, Value::Null);
        }
        Ok(arguments)
    }

    /// The expression body directly inside `id`.
    fn body(&self, id: NodeId) -> Option<NodeId> {
        self.document.children(id).iter().copied().find(|&child| {
            self.document
                .block(child)
                .is_some_and(|block| block.kind() == BlockKind::ExpressionBody)
        })
    }

    /// The name span of the expression body directly inside `id`.
    fn expression_span(&self, id: NodeId) -> Option<&'a SpanNode> {
        let document: &'a Document = self.document;
        let body = self.body(id)?;
        document
            .children(body)
            .iter()
            .filter_map(|&child| document.span(child))
            .find(|span| span.kind() == SpanKind::Expression)
    }

    fn is_negated(&self, element: NodeId) -> bool {
        self.document.children(element).iter().any(|&child| {
            self.document
                .span(child)
                .is_some_and(|span| span.kind() == SpanKind::MetaCode && span.content() == "^")
        })
    }
}

/// Copy text and uncollapsed whitespace. A backslash before `{` is dropped.
fn render_span(span: &SpanNode, out: &mut String) {
    match span.kind() {
        SpanKind::Text => {
            let mut rest = span.content();
            while let Some(index) = rest.find("\\{") {
                out.push_str(&rest[..index]);
                out.push('{');
                rest = &rest[index + 2..];
            }
            out.push_str(rest);
        }
        SpanKind::WhiteSpace if !span.is_collapsed() => out.push_str(span.content()),
        _ => {}
    }
}

/// Check argument counts and parameters against the descriptor.
fn validate(
    name: &str,
    descriptor: &TagDescriptor,
    arguments: &Arguments,
) -> Result<(), RenderError> {
    if descriptor.is_implicit() {
        return Ok(());
    }

    let count = arguments.positional().len();
    if descriptor.min_args() > 0 && count < descriptor.min_args() {
        return Err(RenderError::TooFewArguments {
            name: name.to_string(),
            min: descriptor.min_args(),
        });
    }
    if count > descriptor.max_args() {
        return Err(RenderError::TooManyArguments {
            name: name.to_string(),
            max: descriptor.max_args(),
        });
    }

    let has_parameters = !arguments.parameters().is_empty();
    match (descriptor.allows_map_parameters(), has_parameters) {
        (false, true) => Err(RenderError::UnexpectedParameters(name.to_string())),
        (true, false) => Err(RenderError::ExpectedParameters(name.to_string())),
        _ => Ok(()),
    }
}

/// A run of child nodes introduced by the opening tag or a separator.
#[derive(Debug, Clone, Copy)]
pub struct Branch<'a> {
    element: NodeId,
    name: &'a str,
    children: &'a [NodeId],
}

impl<'a> Branch<'a> {
    /// The name of the tag element that opened the branch.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn children(&self) -> &'a [NodeId] {
        self.children
    }

    /// Whether the branch was opened by `{{else}}` or `{{^}}`.
    pub fn is_else(&self) -> bool {
        matches!(self.name, "else" | "^")
    }
}

/// A block tag being rendered, as seen by a [`BlockRenderer`].
///
/// [`BlockRenderer`]: crate::renderers::BlockRenderer
pub struct TagBlock<'a> {
    renderer: Renderer<'a>,
    name: &'a str,
    descriptor: &'a Arc<TagDescriptor>,
    arguments: Arguments,
    content: &'a [NodeId],
    branches: Vec<Branch<'a>>,
    negated: bool,
}

impl<'a> TagBlock<'a> {
    fn new(
        renderer: Renderer<'a>,
        id: NodeId,
        name: &'a str,
        descriptor: &'a Arc<TagDescriptor>,
        context: &RenderContext<'_>,
    ) -> Result<Self, RenderError> {
        let document: &'a Document = renderer.document;
        let children = document.children(id);
        // The first child opens the block and the last one closes it.
        let content: &'a [NodeId] = match children {
            [_, content @ .., _] => content,
            _ => &[],
        };
        let opening = children.first().copied();

        let mut branches = Vec::new();
        let mut current = opening.map(|element| (element, name, 0));
        for (index, &child) in content.iter().enumerate() {
            let Some(separator) = document
                .block(child)
                .filter(|block| block.kind() == BlockKind::TagElement)
            else {
                continue;
            };
            if let Some((element, name, start)) = current {
                branches.push(Branch {
                    element,
                    name,
                    children: &content[start..index],
                });
            }
            current = Some((child, separator.name().unwrap_or_default(), index + 1));
        }
        if let Some((element, name, start)) = current {
            branches.push(Branch {
                element,
                name,
                children: content.get(start..).unwrap_or_default(),
            });
        }

        let arguments = match opening {
            Some(element) => renderer.arguments(element, context)?,
            None => Arguments::default(),
        };
        let negated = opening.is_some_and(|element| renderer.is_negated(element));

        Ok(Self {
            renderer,
            name,
            descriptor,
            arguments,
            content,
            branches,
            negated,
        })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn descriptor(&self) -> &TagDescriptor {
        self.descriptor
    }

    /// Arguments of the opening tag.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Whether the block was opened with `{{^name}}`.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Every node between the opening and closing tags, separators included.
    pub fn content(&self) -> &'a [NodeId] {
        self.content
    }

    /// The branches in source order. The first is opened by the tag itself.
    pub fn branches(&self) -> &[Branch<'a>] {
        &self.branches
    }

    /// Content of the opening branch.
    pub fn primary(&self) -> &'a [NodeId] {
        self.branches.first().map(Branch::children).unwrap_or_default()
    }

    /// The first `else` branch, if any.
    pub fn alternative(&self) -> Option<&Branch<'a>> {
        self.branches.iter().skip(1).find(|branch| branch.is_else())
    }

    /// Arguments of the separator that opened `branch`.
    pub fn branch_arguments(
        &self,
        branch: &Branch<'_>,
        context: &RenderContext<'_>,
    ) -> Result<Arguments, RenderError> {
        self.renderer.arguments(branch.element, context)
    }

    /// The value named by the opening tag, for sections such as `{{#items}}`.
    pub fn value(&self, context: &RenderContext<'_>) -> Value {
        self.branches
            .first()
            .and_then(|branch| self.renderer.expression_span(branch.element))
            .map(|span| resolve(span.symbols(), context, self.renderer.env.resolver))
            .unwrap_or_default()
    }

    pub fn operators(&self) -> &OperatorRegistry {
        self.renderer.env.registry.operators()
    }

    /// Render `nodes` against `context`.
    pub fn render(
        &self,
        nodes: &[NodeId],
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        self.renderer.render_nodes(nodes, context, out)
    }
}

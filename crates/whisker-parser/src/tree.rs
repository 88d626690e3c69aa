//! The compiled template tree.
//!
//! A [`Document`] is an arena of [`Node`]s addressed by [`NodeId`]. Blocks
//! own an ordered list of children; spans are leaves holding the symbols
//! they were built from. Every span also links to the spans before and after
//! it in document order, which is what whitespace control walks.
//!
//! Nodes are created by the parser and never change afterwards, with one
//! exception: the whitespace collapser marks spans as collapsed before the
//! document is shared.

use std::{fmt, sync::Arc};

use crate::{symbol::Symbol, tags::TagDescriptor};

/// Index of a node within its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Classification of a block node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// The root of every tree.
    Document,
    /// A block tag from its opening to its closing tag.
    Tag,
    /// The opening or closing tag of a block, or an `{{else}}` separator.
    TagElement,
    /// A `{{value}}` or `{{helper args}}` tag.
    Expression,
    /// The name and arguments inside a tag.
    ExpressionBody,
    /// A parenthesized helper call in argument position.
    SubExpression,
    /// A `{{> partial}}` tag.
    Partial,
    /// A `{{! comment}}` tag.
    Comment,
}

/// Classification of a span node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Text,
    WhiteSpace,
    /// Delimiters, prefixes and whitespace control markers.
    MetaCode,
    Comment,
    /// A value path, or the name of a tag.
    Expression,
    /// A positional argument.
    Parameter,
    /// A `key=value` argument.
    Map,
}

/// An interior node.
#[derive(Debug, Clone)]
pub struct Block {
    kind: BlockKind,
    name: Option<String>,
    descriptor: Option<Arc<TagDescriptor>>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The tag descriptor bound to a [`BlockKind::Tag`] block.
    pub fn descriptor(&self) -> Option<&Arc<TagDescriptor>> {
        self.descriptor.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A leaf node built from one or more consecutive symbols.
#[derive(Debug, Clone)]
pub struct SpanNode {
    kind: SpanKind,
    symbols: Vec<Symbol>,
    content: String,
    collapsed: bool,
    previous: Option<NodeId>,
    next: Option<NodeId>,
    parent: Option<NodeId>,
}

impl SpanNode {
    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Concatenated content of the span's symbols.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns `true` if whitespace control removed this span from output.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// The span before this one in document order.
    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    /// The span after this one in document order.
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Block(Block),
    Span(SpanNode),
}

impl Node {
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(block) => Some(block),
            Node::Span(_) => None,
        }
    }

    pub fn as_span(&self) -> Option<&SpanNode> {
        match self {
            Node::Span(span) => Some(span),
            Node::Block(_) => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Block(block) => block.parent,
            Node::Span(span) => span.parent,
        }
    }
}

/// A compiled template tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    first_span: Option<NodeId>,
}

impl Document {
    /// The [`BlockKind::Document`] root block.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn block(&self, id: NodeId) -> Option<&Block> {
        self.node(id).and_then(Node::as_block)
    }

    pub fn span(&self, id: NodeId) -> Option<&SpanNode> {
        self.node(id).and_then(Node::as_span)
    }

    /// Children of a block; empty for spans and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.block(id).map_or(&[], Block::children)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All spans in document order.
    pub fn spans(&self) -> impl Iterator<Item = (NodeId, &SpanNode)> + '_ {
        std::iter::successors(
            self.first_span
                .and_then(|id| self.span(id).map(|span| (id, span))),
            |(_, span)| {
                span.next
                    .and_then(|id| self.span(id).map(|next| (id, next)))
            },
        )
    }

    /// Spans removed from output by whitespace control.
    pub fn collapsed_spans(&self) -> impl Iterator<Item = (NodeId, &SpanNode)> + '_ {
        self.spans().filter(|(_, span)| span.collapsed)
    }

    /// Concatenate the content of every span, reproducing the source text.
    pub fn reconstruct(&self) -> String {
        self.spans().map(|(_, span)| span.content.as_str()).collect()
    }

    /// Content of the `n`th child of `id` when that child is a span.
    pub fn child_span_content(&self, id: NodeId, n: usize) -> Option<&str> {
        self.children(id)
            .get(n)
            .and_then(|&child| self.span(child))
            .map(SpanNode::content)
    }

    pub(crate) fn set_collapsed(&mut self, id: NodeId) {
        if let Some(Node::Span(span)) = self.nodes.get_mut(id.0) {
            span.collapsed = true;
        }
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Some(Node::Block(block)) => {
                write!(f, "{indent}{:?}", block.kind)?;
                if let Some(name) = &block.name {
                    write!(f, " {name}")?;
                }
                writeln!(f)?;
                for &child in &block.children {
                    self.write_outline(f, child, depth + 1)?;
                }
                Ok(())
            }
            Some(Node::Span(span)) => {
                write!(f, "{indent}{:?} {:?}", span.kind, span.content)?;
                if span.collapsed {
                    write!(f, " (collapsed)")?;
                }
                writeln!(f)
            }
            None => Ok(()),
        }
    }
}

/// Indented outline of the tree, one node per line.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f, self.root, 0)
    }
}

/// Arena writer used while parsing.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<Node>,
    first_span: Option<NodeId>,
    last_span: Option<NodeId>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a span and link it after the previously added span.
    pub(crate) fn push_span(&mut self, kind: SpanKind, symbols: Vec<Symbol>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let content = symbols.iter().map(Symbol::content).collect();
        self.nodes.push(Node::Span(SpanNode {
            kind,
            symbols,
            content,
            collapsed: false,
            previous: self.last_span,
            next: None,
            parent: None,
        }));

        if let Some(Node::Span(previous)) = self.last_span.and_then(|p| self.nodes.get_mut(p.0)) {
            previous.next = Some(id);
        }
        self.first_span.get_or_insert(id);
        self.last_span = Some(id);
        id
    }

    /// Add a block, adopting its already-added children.
    pub(crate) fn push_block(
        &mut self,
        kind: BlockKind,
        name: Option<String>,
        descriptor: Option<Arc<TagDescriptor>>,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        for child in &children {
            match self.nodes.get_mut(child.0) {
                Some(Node::Block(block)) => block.parent = Some(id),
                Some(Node::Span(span)) => span.parent = Some(id),
                None => {}
            }
        }
        self.nodes.push(Node::Block(Block {
            kind,
            name,
            descriptor,
            children,
            parent: None,
        }));
        id
    }

    /// Read access to a span added earlier.
    pub(crate) fn span(&self, id: NodeId) -> Option<&SpanNode> {
        self.nodes.get(id.0).and_then(Node::as_span)
    }

    pub(crate) fn finish(self, root: NodeId) -> Document {
        Document {
            nodes: self.nodes,
            root,
            first_span: self.first_span,
        }
    }
}

//! Whitespace control.
//!
//! A `~` directly inside a tag delimiter removes the whitespace span next to
//! the tag on that side: `{{~` collapses the whitespace before the tag and
//! `~}}` collapses the whitespace after it. When the tag is the first (or
//! last) child of its enclosing block, as the opening and closing tags of a
//! block tag are, the whitespace outside that block is collapsed instead.

use log::{debug, trace};

use crate::tree::{BlockKind, Document, NodeId, SpanKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

/// Mark every whitespace span removed by whitespace control as collapsed.
///
/// Running the collapser again on the same document changes nothing.
pub fn collapse_whitespace(document: &mut Document) {
    let targets: Vec<NodeId> = document
        .spans()
        .filter(|(_, span)| span.kind() == SpanKind::MetaCode && span.content() == "~")
        .filter_map(|(id, span)| {
            let side = if meta_content(document, span.previous()).is_some_and(|c| c.ends_with("{{"))
            {
                Side::Before
            } else if meta_content(document, span.next()).is_some_and(|c| c.starts_with("}}")) {
                Side::After
            } else {
                return None;
            };
            collapse_target(document, id, side)
        })
        .collect();

    for id in &targets {
        trace!("Collapsing whitespace span {id}");
        document.set_collapsed(*id);
    }
    debug!(count = targets.len(); "Collapsed whitespace");
}

fn meta_content(document: &Document, id: Option<NodeId>) -> Option<&str> {
    let span = document.span(id?)?;
    (span.kind() == SpanKind::MetaCode).then(|| span.content())
}

/// Find the whitespace span a tilde at `marker` collapses.
fn collapse_target(document: &Document, marker: NodeId, side: Side) -> Option<NodeId> {
    let element = document.parent(marker)?;
    let element_kind = document.block(element)?.kind();
    if !matches!(
        element_kind,
        BlockKind::TagElement | BlockKind::Expression | BlockKind::Comment | BlockKind::Partial
    ) {
        return None;
    }

    let scope = document.parent(element)?;
    let siblings = document.children(scope);
    let at_edge = match side {
        Side::Before => siblings.first() == Some(&element),
        Side::After => siblings.last() == Some(&element),
    };

    let (container, anchor) = if at_edge {
        (document.parent(scope)?, scope)
    } else {
        (scope, element)
    };
    let children = document.children(container);
    let position = children.iter().position(|&child| child == anchor)?;
    let neighbour = match side {
        Side::Before => position.checked_sub(1).and_then(|i| children.get(i)),
        Side::After => children.get(position + 1),
    }?;

    document
        .span(*neighbour)
        .filter(|span| span.kind() == SpanKind::WhiteSpace)
        .map(|_| *neighbour)
}

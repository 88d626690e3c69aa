//! Labelled source spans attached to diagnostics.

use crate::span::Span;

/// A message pinned to a span of template source.
///
/// A diagnostic normally carries one primary label marking where the problem
/// was detected, and optionally secondary labels pointing at related text,
/// such as the opening tag of a block whose closing tag does not match:
///
/// ```text
/// error[E100]: Unbalanced tags - expected a closing tag for 'if' but instead found 'each'
///   |
/// 1 | {{#if ok}}yes{{/each}}
///   | ----------   ^^^^^^^^^ closing tag
///   | |
///   | block opened here
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the span this label applies to.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_label() {
        let label = Label::primary(Span::new(13..22), "closing tag");

        assert_eq!(label.span(), Span::new(13..22));
        assert_eq!(label.message(), "closing tag");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let label = Label::secondary(Span::new(0..10), "block opened here");

        assert_eq!(label.span().start(), 0);
        assert_eq!(label.span().end(), 10);
        assert!(label.is_secondary());
    }
}

//! Tag descriptors and the registry that resolves block tag names.
//!
//! Every block tag (`{{#name ...}}`) is bound to a [`TagDescriptor`] at parse
//! time. The descriptor names the renderer that will run the block and the
//! argument rules the renderer enforces. Names without a registered
//! descriptor get an implicit one, which renders the block as a section over
//! the named value.

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};

/// Renderer references used by the built-in descriptors.
pub mod renderer {
    /// `if` / `elseif` / `else` chains.
    pub const CONDITIONAL: &str = "conditional";
    pub const UNLESS: &str = "unless";
    pub const EACH: &str = "each";
    pub const WITH: &str = "with";
    /// Operator comparisons.
    pub const IS: &str = "is";
    /// Sections over a value for names without a descriptor.
    pub const IMPLICIT: &str = "implicit";
}

/// Describes how a block tag is rendered and what arguments it accepts.
///
/// # Example
///
/// ```
/// # use whisker_parser::TagDescriptor;
///
/// let descriptor = TagDescriptor::new("repeat", "repeat", 1, 1).with_map_parameters(true);
///
/// assert_eq!(descriptor.name(), "repeat");
/// assert!(descriptor.allows_map_parameters());
/// assert!(!descriptor.is_implicit());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDescriptor {
    name: String,
    renderer: String,
    min_args: usize,
    max_args: usize,
    allows_map_parameters: bool,
    has_child_content: bool,
    is_implicit: bool,
}

impl TagDescriptor {
    /// Create a descriptor with child content and no map parameters.
    pub fn new(
        name: impl Into<String>,
        renderer: impl Into<String>,
        min_args: usize,
        max_args: usize,
    ) -> Self {
        Self {
            name: name.into(),
            renderer: renderer.into(),
            min_args,
            max_args: max_args.max(min_args),
            allows_map_parameters: false,
            has_child_content: true,
            is_implicit: false,
        }
    }

    /// The fallback descriptor for a name nothing was registered under.
    pub fn implicit(name: impl Into<String>) -> Self {
        Self {
            is_implicit: true,
            ..Self::new(name, renderer::IMPLICIT, 0, 0)
        }
    }

    /// Allow or forbid `key=value` parameters.
    pub fn with_map_parameters(mut self, allowed: bool) -> Self {
        self.allows_map_parameters = allowed;
        self
    }

    /// Declare whether the tag wraps child content.
    ///
    /// A tag without child content is complete after its opening tag and
    /// takes no closing tag.
    pub fn with_child_content(mut self, has_child_content: bool) -> Self {
        self.has_child_content = has_child_content;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the renderer that runs blocks bound to this descriptor.
    pub fn renderer(&self) -> &str {
        &self.renderer
    }

    pub fn min_args(&self) -> usize {
        self.min_args
    }

    pub fn max_args(&self) -> usize {
        self.max_args
    }

    pub fn allows_map_parameters(&self) -> bool {
        self.allows_map_parameters
    }

    pub fn has_child_content(&self) -> bool {
        self.has_child_content
    }

    /// Returns `true` for fallback descriptors; their argument rules are not enforced.
    pub fn is_implicit(&self) -> bool {
        self.is_implicit
    }
}

/// Ordered set of tag descriptors, looked up case-insensitively.
///
/// Registration never replaces an existing entry, so the first descriptor
/// registered under a name is the one that resolves.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    descriptors: IndexMap<String, Arc<TagDescriptor>>,
}

impl TagRegistry {
    /// Create a registry with no descriptors.
    pub fn empty() -> Self {
        Self {
            descriptors: IndexMap::new(),
        }
    }

    /// Create a registry seeded with the built-in tags.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for descriptor in [
            TagDescriptor::new("if", renderer::CONDITIONAL, 1, 1),
            TagDescriptor::new("elseif", renderer::CONDITIONAL, 1, 1),
            TagDescriptor::new("else", renderer::CONDITIONAL, 0, 0),
            TagDescriptor::new("unless", renderer::UNLESS, 1, 1),
            TagDescriptor::new("each", renderer::EACH, 1, 1),
            TagDescriptor::new("with", renderer::WITH, 1, 1),
            TagDescriptor::new("is", renderer::IS, 1, 3),
        ] {
            registry.register(descriptor);
        }
        registry
    }

    /// Register a descriptor unless its name is already taken.
    ///
    /// Returns `true` if the descriptor was added.
    pub fn register(&mut self, descriptor: TagDescriptor) -> bool {
        let key = descriptor.name().to_lowercase();
        if self.descriptors.contains_key(&key) {
            warn!(tag = descriptor.name(); "Tag already registered, ignoring");
            return false;
        }
        debug!(tag = descriptor.name(), renderer = descriptor.renderer(); "Registered tag");
        self.descriptors.insert(key, Arc::new(descriptor));
        true
    }

    /// Look up a registered descriptor.
    pub fn get(&self, name: &str) -> Option<&Arc<TagDescriptor>> {
        self.descriptors.get(&name.to_lowercase())
    }

    /// Resolve a tag name, falling back to an implicit descriptor.
    pub fn resolve(&self, name: &str) -> Arc<TagDescriptor> {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(TagDescriptor::implicit(name)))
    }

    /// Iterate descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TagDescriptor>> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

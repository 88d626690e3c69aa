//! Named extension points shared by every render of an engine.

use std::sync::Arc;

use indexmap::IndexMap;

use whisker_core::operator::OperatorRegistry;
use whisker_parser::{Document, TagRegistry, tags::renderer};

use crate::{
    helper::{HelperFn, PartialFn},
    renderers::{BlockRenderer, Conditional, Each, Implicit, Is, Unless, With},
};

/// A partial template, compiled from source or implemented in code.
#[derive(Clone)]
pub(crate) enum Partial {
    Template(Arc<Document>),
    Function(Arc<PartialFn>),
}

/// Tags, renderers, operators, helpers and partials.
///
/// The engine publishes a registry as an immutable snapshot; every update
/// produces a new one, so a render in progress keeps the snapshot it
/// started with.
#[derive(Clone)]
pub(crate) struct Registry {
    tags: TagRegistry,
    renderers: IndexMap<String, Arc<dyn BlockRenderer>>,
    operators: OperatorRegistry,
    helpers: IndexMap<String, Arc<HelperFn>>,
    partials: IndexMap<String, Partial>,
}

impl Registry {
    /// Create a registry with the built-in tags, renderers and operators.
    pub(crate) fn standard() -> Self {
        let mut renderers: IndexMap<String, Arc<dyn BlockRenderer>> = IndexMap::new();
        renderers.insert(renderer::CONDITIONAL.to_string(), Arc::new(Conditional));
        renderers.insert(renderer::UNLESS.to_string(), Arc::new(Unless));
        renderers.insert(renderer::EACH.to_string(), Arc::new(Each));
        renderers.insert(renderer::WITH.to_string(), Arc::new(With));
        renderers.insert(renderer::IS.to_string(), Arc::new(Is));
        renderers.insert(renderer::IMPLICIT.to_string(), Arc::new(Implicit));

        Self {
            tags: TagRegistry::standard(),
            renderers,
            operators: OperatorRegistry::standard(),
            helpers: IndexMap::new(),
            partials: IndexMap::new(),
        }
    }

    pub(crate) fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub(crate) fn tags_mut(&mut self) -> &mut TagRegistry {
        &mut self.tags
    }

    pub(crate) fn renderer(&self, key: &str) -> Option<&Arc<dyn BlockRenderer>> {
        self.renderers.get(key)
    }

    pub(crate) fn renderers_mut(&mut self) -> &mut IndexMap<String, Arc<dyn BlockRenderer>> {
        &mut self.renderers
    }

    pub(crate) fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub(crate) fn operators_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.operators
    }

    pub(crate) fn helper(&self, name: &str) -> Option<&Arc<HelperFn>> {
        self.helpers.get(name)
    }

    pub(crate) fn helpers_mut(&mut self) -> &mut IndexMap<String, Arc<HelperFn>> {
        &mut self.helpers
    }

    pub(crate) fn partial(&self, name: &str) -> Option<&Partial> {
        self.partials.get(name)
    }

    pub(crate) fn partials_mut(&mut self) -> &mut IndexMap<String, Partial> {
        &mut self.partials
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

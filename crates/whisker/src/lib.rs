//! Whisker - A mustache/handlebars style template engine.
//!
//! Templates compile once into an immutable document tree that renders any
//! number of times, concurrently, against different models. Helpers,
//! partials, operators and block tags are registered on an [`Engine`] and
//! shared by every template it compiles.
//!
//! # Example
//!
//! ```
//! use whisker::{Engine, Value};
//!
//! let engine = Engine::default();
//! let template = engine.compile("Hello {{#each people}}{{name}} {{/each}}")?;
//!
//! let model: Value = serde_json::json!({
//!     "people": [{"name": "Matt"}, {"name": "Chris"}]
//! })
//! .into();
//! assert_eq!(template.render(&model)?, "Hello Matt Chris ");
//! # Ok::<(), whisker::WhiskerError>(())
//! ```

pub mod config;
pub mod renderers;

mod context;
mod error;
mod helper;
mod registry;
mod render;
mod resolve;

pub use whisker_core::{Object, Value, ValueKind, html, operator};
pub use whisker_parser::{Document, TagDescriptor};

pub use context::RenderContext;
pub use error::{RenderError, WhiskerError};
pub use helper::{HelperFn, HelperOptions, PartialFn};
pub use render::{Arguments, Branch, TagBlock};
pub use resolve::Resolver;

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use parking_lot::RwLock;

use whisker_core::operator::Operator;

use config::EngineConfig;
use registry::{Partial, Registry};
use render::{Environment, Renderer};
use renderers::BlockRenderer;

/// Compiles templates and owns the registries they render with.
///
/// Cloning an engine is cheap and the clones share all state. Registries
/// are published as snapshots: a registration made while a render is in
/// progress takes effect for the next render.
///
/// # Examples
///
/// ```
/// use whisker::{Engine, HelperOptions, RenderError, Value};
///
/// let engine = Engine::default();
/// engine.register_helper("upper", |options: &HelperOptions<'_>| {
///     Ok::<_, RenderError>(Value::from(options.data().to_string().to_uppercase()))
/// });
///
/// let model: Value = serde_json::json!({"name": "matt"}).into();
/// let output = engine.compile_and_run("greeting", "Hi {{upper name}}", &model)?;
/// assert_eq!(output, "Hi MATT");
/// # Ok::<(), whisker::WhiskerError>(())
/// ```
#[derive(Clone, Default)]
pub struct Engine {
    shared: Arc<Shared>,
    templates: Arc<RwLock<IndexMap<String, Template>>>,
}

/// State templates keep a handle to.
#[derive(Default)]
struct Shared {
    config: EngineConfig,
    registry: RwLock<Arc<Registry>>,
}

impl Shared {
    /// The current registry snapshot.
    fn snapshot(&self) -> Arc<Registry> {
        Arc::clone(&self.registry.read())
    }
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                registry: RwLock::default(),
            }),
            templates: Arc::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Compile a template without caching it.
    ///
    /// # Errors
    ///
    /// Returns [`WhiskerError::Parse`] with every diagnostic if the template
    /// does not compile.
    pub fn compile(&self, source: &str) -> Result<Template, WhiskerError> {
        info!(source_len = source.len(); "Compiling template");
        let document = self.parse(source)?;
        Ok(Template {
            document: Arc::new(document),
            shared: Arc::clone(&self.shared),
        })
    }

    /// Compile a template and cache it under `name`.
    ///
    /// A template already cached under `name` is returned as is, without
    /// parsing `source`.
    pub fn compile_named(&self, name: &str, source: &str) -> Result<Template, WhiskerError> {
        if let Some(template) = self.templates.read().get(name) {
            debug!(template_name = name; "Template cache hit");
            return Ok(template.clone());
        }
        debug!(template_name = name; "Template cache miss");

        let template = self.compile(source)?;
        let mut templates = self.templates.write();
        Ok(templates
            .entry(name.to_string())
            .or_insert(template)
            .clone())
    }

    /// Compile (or reuse) the template cached under `name` and render it.
    ///
    /// An empty name compiles without caching.
    pub fn compile_and_run(
        &self,
        name: &str,
        source: &str,
        model: &Value,
    ) -> Result<String, WhiskerError> {
        let template = if name.is_empty() {
            self.compile(source)?
        } else {
            self.compile_named(name, source)?
        };
        Ok(template.render(model)?)
    }

    /// Render the template cached under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownTemplate`] if nothing was compiled under
    /// `name`.
    pub fn run(&self, name: &str, model: &Value) -> Result<String, WhiskerError> {
        info!(template_name = name; "Running template");
        let template = self
            .templates
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownTemplate(name.to_string()))?;
        Ok(template.render(model)?)
    }

    /// Drop the template cached under `name`. Returns `true` if one existed.
    pub fn remove_template(&self, name: &str) -> bool {
        self.templates.write().shift_remove(name).is_some()
    }

    /// Compile `source` and register it as the partial `name`.
    ///
    /// Returns `Ok(false)` without compiling if the name is taken.
    pub fn register_partial(&self, name: &str, source: &str) -> Result<bool, WhiskerError> {
        if self.has_partial(name) {
            warn!(partial = name; "Partial already registered, ignoring");
            return Ok(false);
        }
        let document = self.parse(source)?;
        Ok(self.insert_partial(name, Partial::Template(Arc::new(document))))
    }

    /// Register a partial implemented in code.
    pub fn register_partial_fn<F>(&self, name: &str, partial: F) -> bool
    where
        F: Fn(&Value) -> Result<String, RenderError> + Send + Sync + 'static,
    {
        self.insert_partial(name, Partial::Function(Arc::new(partial)))
    }

    pub fn has_partial(&self, name: &str) -> bool {
        self.snapshot().partial(name).is_some()
    }

    /// Unregister the partial `name`. Returns `true` if one existed.
    pub fn remove_partial(&self, name: &str) -> bool {
        self.update(|registry| registry.partials_mut().shift_remove(name).is_some())
    }

    /// Register a helper unless the name is taken.
    ///
    /// Returns `true` if the helper was added.
    pub fn register_helper<F>(&self, name: &str, helper: F) -> bool
    where
        F: Fn(&HelperOptions<'_>) -> Result<Value, RenderError> + Send + Sync + 'static,
    {
        self.update(|registry| {
            let helpers = registry.helpers_mut();
            if helpers.contains_key(name) {
                warn!(helper = name; "Helper already registered, ignoring");
                return false;
            }
            info!(helper = name; "Registered helper");
            helpers.insert(name.to_string(), Arc::new(helper));
            true
        })
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.snapshot().helper(name).is_some()
    }

    /// Add an operator for `{{#is}}` comparisons unless the name is taken.
    pub fn register_operator(&self, operator: impl Operator + 'static) -> bool {
        self.update(|registry| registry.operators_mut().register(operator))
    }

    /// Register a block tag rendered by `renderer`.
    ///
    /// Templates compiled afterwards bind `{{#name}}` blocks to the
    /// descriptor. Returns `false` if a tag of the same name exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use whisker::{Engine, RenderContext, RenderError, TagBlock, TagDescriptor, Value};
    ///
    /// let engine = Engine::default();
    /// engine.register_tag(
    ///     TagDescriptor::new("twice", "twice", 0, 0),
    ///     |tag: &TagBlock<'_>, context: &RenderContext<'_>, out: &mut String| {
    ///         tag.render(tag.primary(), context, out)?;
    ///         tag.render(tag.primary(), context, out)
    ///     },
    /// );
    ///
    /// let template = engine.compile("{{#twice}}ab{{/twice}}")?;
    /// assert_eq!(template.render(&Value::Null)?, "abab");
    /// # Ok::<(), whisker::WhiskerError>(())
    /// ```
    pub fn register_tag(
        &self,
        descriptor: TagDescriptor,
        renderer: impl BlockRenderer + 'static,
    ) -> bool {
        self.update(|registry| {
            let key = descriptor.renderer().to_string();
            let name = descriptor.name().to_string();
            if !registry.tags_mut().register(descriptor) {
                return false;
            }
            let renderers = registry.renderers_mut();
            if renderers.contains_key(&key) {
                warn!(tag = name.as_str(), renderer = key.as_str(); "Renderer already registered, keeping it");
            } else {
                renderers.insert(key, Arc::new(renderer));
            }
            info!(tag = name.as_str(); "Registered tag");
            true
        })
    }

    fn insert_partial(&self, name: &str, partial: Partial) -> bool {
        self.update(|registry| {
            let partials = registry.partials_mut();
            if partials.contains_key(name) {
                warn!(partial = name; "Partial already registered, ignoring");
                return false;
            }
            info!(partial = name; "Registered partial");
            partials.insert(name.to_string(), partial);
            true
        })
    }

    fn parse(&self, source: &str) -> Result<Document, WhiskerError> {
        let registry = self.snapshot();
        let document = whisker_parser::compile(source, registry.tags())
            .map_err(|err| WhiskerError::new_parse_error(err, source))?;

        debug!(nodes = document.len(); "Template compiled successfully");
        trace!(document:%; "Compiled template");
        Ok(document)
    }

    fn snapshot(&self) -> Arc<Registry> {
        self.shared.snapshot()
    }

    /// Apply `change` to a copy of the registry and publish the copy.
    fn update<R>(&self, change: impl FnOnce(&mut Registry) -> R) -> R {
        let mut registry = self.shared.registry.write();
        change(Arc::make_mut(&mut registry))
    }
}

/// A compiled template.
///
/// The document is immutable and shared; rendering only reads it, so one
/// template can render on many threads at once.
#[derive(Clone)]
pub struct Template {
    document: Arc<Document>,
    shared: Arc<Shared>,
}

impl Template {
    /// Render the template against `model`.
    pub fn render(&self, model: &Value) -> Result<String, RenderError> {
        self.render_inner(model, None)
    }

    /// Render with a resolver that supplies values for unresolved paths.
    ///
    /// # Examples
    ///
    /// ```
    /// use whisker::{Engine, Value};
    ///
    /// let template = Engine::default().compile("[{{missing.path}}]")?;
    /// let output = template.render_with(&Value::Null, |path: &str| Value::from(path.to_uppercase()))?;
    /// assert_eq!(output, "[MISSING.PATH]");
    /// # Ok::<(), whisker::WhiskerError>(())
    /// ```
    pub fn render_with<F>(&self, model: &Value, resolver: F) -> Result<String, RenderError>
    where
        F: Fn(&str) -> Value,
    {
        self.render_inner(model, Some(&resolver))
    }

    /// The compiled document, for inspection.
    pub fn document(&self) -> &Document {
        &self.document
    }

    fn render_inner(
        &self,
        model: &Value,
        resolver: Option<&Resolver<'_>>,
    ) -> Result<String, RenderError> {
        let registry = self.shared.snapshot();
        let config = self.shared.config.render();

        let placeholder = config
            .unknown_value()
            .map(|text| move |_: &str| Value::from(text));
        let resolver = resolver.or_else(|| placeholder.as_ref().map(|p| p as &Resolver<'_>));

        let env = Environment {
            registry: &registry,
            escape_html: config.escape_html(),
            resolver,
        };
        let context = RenderContext::new(model.clone());
        let mut out = String::new();
        Renderer::new(&self.document, &env).render_document(&context, &mut out)?;

        debug!(output_len = out.len(); "Template rendered");
        Ok(out)
    }
}

//! Configuration types for the Whisker engine.
//!
//! This module provides configuration structures that control how templates
//! are rendered and where partials are found. All types implement
//! [`serde::Deserialize`] for flexible loading from external sources.
//!
//! # Overview
//!
//! - [`EngineConfig`] - Top-level configuration combining render and partial settings.
//! - [`RenderConfig`] - Controls output escaping and the text emitted for unknown values.
//! - [`PartialsConfig`] - Controls where partial templates are loaded from.
//!
//! # Example
//!
//! ```
//! # use whisker::config::EngineConfig;
//! // Use default configuration
//! let config = EngineConfig::default();
//! assert!(config.render().escape_html());
//! assert_eq!(config.partials().extension(), "hbs");
//! ```

use serde::Deserialize;

/// Top-level engine configuration combining render and partial settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Render configuration section.
    #[serde(default)]
    render: RenderConfig,

    /// Partials configuration section.
    #[serde(default)]
    partials: PartialsConfig,
}

impl EngineConfig {
    /// Creates a new [`EngineConfig`] with the specified sections.
    ///
    /// # Arguments
    ///
    /// * `render` - Output settings.
    /// * `partials` - Partial template lookup settings.
    pub fn new(render: RenderConfig, partials: PartialsConfig) -> Self {
        Self { render, partials }
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Returns the partials configuration.
    pub fn partials(&self) -> &PartialsConfig {
        &self.partials
    }
}

/// Output configuration for rendered templates.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Whether double-brace expressions are HTML escaped.
    #[serde(default = "default_escape_html")]
    escape_html: bool,

    /// Text rendered for expressions that resolve to nothing.
    #[serde(default)]
    unknown_value: Option<String>,
}

impl RenderConfig {
    /// Creates a new [`RenderConfig`].
    ///
    /// # Arguments
    ///
    /// * `escape_html` - Escape the output of double-brace expressions.
    /// * `unknown_value` - Placeholder for unresolved paths, if any.
    pub fn new(escape_html: bool, unknown_value: Option<String>) -> Self {
        Self {
            escape_html,
            unknown_value,
        }
    }

    /// Returns whether double-brace expressions are escaped.
    pub fn escape_html(&self) -> bool {
        self.escape_html
    }

    /// Returns the placeholder for unresolved paths.
    pub fn unknown_value(&self) -> Option<&str> {
        self.unknown_value.as_deref()
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            escape_html: default_escape_html(),
            unknown_value: None,
        }
    }
}

/// Where partial templates are loaded from.
#[derive(Debug, Clone, Deserialize)]
pub struct PartialsConfig {
    /// Directory scanned for partial templates.
    #[serde(default)]
    directory: Option<String>,

    /// File extension of partial templates, without the dot.
    #[serde(default = "default_extension")]
    extension: String,
}

impl PartialsConfig {
    /// Creates a new [`PartialsConfig`].
    pub fn new(directory: Option<String>, extension: impl Into<String>) -> Self {
        Self {
            directory,
            extension: extension.into(),
        }
    }

    /// Returns the configured partials directory.
    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    /// Returns the partial file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Default for PartialsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            extension: default_extension(),
        }
    }
}

fn default_escape_html() -> bool {
    true
}

fn default_extension() -> String {
    "hbs".to_string()
}

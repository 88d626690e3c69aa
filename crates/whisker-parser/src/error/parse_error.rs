//! The ParseError type for wrapping template diagnostics.

use std::fmt;

use crate::error::Diagnostic;

/// Error returned when a template fails to compile.
///
/// Wraps every diagnostic reported for the template, in source order.
#[derive(Debug, Clone)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Render one `location: message` line per error diagnostic.
    pub fn summary(&self) -> String {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
            .map(|diagnostic| match diagnostic.location() {
                Some(location) => format!("{location}: {}", diagnostic.message()),
                None => diagnostic.message().to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

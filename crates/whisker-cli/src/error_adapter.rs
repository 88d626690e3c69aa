//! Presents [`WhiskerError`]s as miette diagnostics.
//!
//! A parse error is reported once per template diagnostic, with its code
//! namespaced as `whisker::E1xx`, its severity kept, and its labels drawn on
//! the template source. Other errors are reported on their own.

use std::{fmt, iter};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity as MietteSeverity, SourceSpan};

use whisker::{RenderError, WhiskerError};
use whisker_parser::{Diagnostic, Severity};

/// One report for the CLI to render.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A template diagnostic and the source it points into.
    Template {
        diagnostic: &'a Diagnostic,
        src: &'a str,
    },
    /// An error without a template location.
    Error(&'a WhiskerError),
}

impl<'a> Reportable<'a> {
    pub fn template(diagnostic: &'a Diagnostic, src: &'a str) -> Self {
        Self::Template { diagnostic, src }
    }

    /// Labels of a diagnostic that carries none, placed at its location.
    fn location_label(diagnostic: &Diagnostic) -> Option<LabeledSpan> {
        let location = diagnostic.location()?;
        let text = diagnostic
            .code()
            .map_or_else(|| "here".to_string(), |code| code.description().to_string());
        Some(LabeledSpan::new_primary_with_span(
            Some(text),
            SourceSpan::new(location.offset().into(), 0),
        ))
    }
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Template { diagnostic, .. } => f.write_str(diagnostic.message()),
            Reportable::Error(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Template { .. } => None,
            Reportable::Error(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            Reportable::Template { diagnostic, .. } => {
                format!("whisker::{}", diagnostic.code()?.as_str())
            }
            Reportable::Error(WhiskerError::Io(_)) => "whisker::io".to_string(),
            Reportable::Error(WhiskerError::Render(_)) => "whisker::render".to_string(),
            Reportable::Error(WhiskerError::Parse { .. }) => return None,
        };
        Some(Box::new(code))
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self {
            Reportable::Template { diagnostic, .. } => Some(match diagnostic.severity() {
                Severity::Error => MietteSeverity::Error,
                Severity::Warning => MietteSeverity::Warning,
            }),
            Reportable::Error(_) => None,
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self {
            Reportable::Template { diagnostic, .. } => diagnostic.help()?,
            Reportable::Error(WhiskerError::Render(RenderError::UnknownPartial(_))) => {
                "register the partial, or pass a directory containing it with --partials"
            }
            Reportable::Error(WhiskerError::Render(
                RenderError::TooFewArguments { .. } | RenderError::TooManyArguments { .. },
            )) => "check the number of arguments given to the block tag",
            Reportable::Error(_) => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Template { src, .. } => Some(src as &dyn miette::SourceCode),
            Reportable::Error(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Reportable::Template { diagnostic, .. } = self else {
            return None;
        };
        let labels = diagnostic.labels();
        if labels.is_empty() {
            let label = Self::location_label(diagnostic)?;
            return Some(Box::new(iter::once(label)));
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = SourceSpan::new(label.span().start().into(), label.span().len());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Split `err` into the reports to render, one per template diagnostic.
pub fn to_reportables(err: &WhiskerError) -> Vec<Reportable<'_>> {
    match err {
        WhiskerError::Parse { err, src } => err
            .diagnostics()
            .iter()
            .map(|diagnostic| Reportable::template(diagnostic, src))
            .collect(),
        _ => vec![Reportable::Error(err)],
    }
}

#[cfg(test)]
mod tests {
    use whisker_parser::{ErrorCode, ParseError, SourceLocation, Span};

    use super::*;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("Unbalanced tags")
            .with_code(ErrorCode::E100)
            .with_label(Span::new(0..5), "here")
            .with_help("close the block");
        let parse_err = ParseError::from(diag);
        let err = WhiskerError::new_parse_error(parse_err, "{{/if}}");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        let report = &reportables[0];
        assert!(matches!(report, Reportable::Template { .. }));
        assert_eq!(report.to_string(), "Unbalanced tags");
        assert_eq!(report.code().unwrap().to_string(), "whisker::E100");
        assert_eq!(report.help().unwrap().to_string(), "close the block");
        assert_eq!(report.severity(), Some(MietteSeverity::Error));
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("first error")
                .with_code(ErrorCode::E001)
                .with_label(Span::new(0..5), "first"),
            Diagnostic::error("second error")
                .with_code(ErrorCode::E100)
                .with_label(Span::new(10..15), "second")
                .with_help("help for second"),
            Diagnostic::error("third error").with_label(Span::new(20..25), "third"),
        ];
        let parse_err = ParseError::from(diags);
        let err = WhiskerError::new_parse_error(parse_err, "source code here...");

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 3);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second error");
        assert_eq!(reportables[2].to_string(), "third error");
        assert!(reportables[2].code().is_none());
    }

    #[test]
    fn test_warning_keeps_severity() {
        let diag = Diagnostic::warning("Empty tag").with_label(Span::new(0..4), "empty");
        let report = Reportable::template(&diag, "{{}}");

        assert_eq!(report.severity(), Some(MietteSeverity::Warning));
    }

    #[test]
    fn test_render_error() {
        let err = WhiskerError::Render(RenderError::UnknownPartial("header".to_string()));

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        let report = &reportables[0];
        assert!(matches!(report, Reportable::Error(_)));
        assert_eq!(
            report.to_string(),
            "No partial template called 'header' has been compiled."
        );
        assert_eq!(report.code().unwrap().to_string(), "whisker::render");
        assert!(report.help().is_some());
        assert!(report.source_code().is_none());
        assert!(report.labels().is_none());
    }

    #[test]
    fn test_io_error_has_no_help() {
        let err = WhiskerError::Io(std::io::Error::other("disk on fire"));

        let reportables = to_reportables(&err);
        assert_eq!(reportables[0].code().unwrap().to_string(), "whisker::io");
        assert!(reportables[0].help().is_none());
    }

    #[test]
    fn test_all_labels_returned() {
        let diag = Diagnostic::error("error with labels")
            .with_label(Span::new(0..5), "primary label")
            .with_secondary_label(Span::new(10..15), "secondary label");

        let report = Reportable::template(&diag, "some source code");

        let labels: Vec<_> = report.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].label(), Some("primary label"));
        assert!(labels[0].primary());
        assert_eq!(labels[1].label(), Some("secondary label"));
        assert!(!labels[1].primary());
    }

    #[test]
    fn test_unlabelled_diagnostic_points_at_location() {
        let diag = Diagnostic::error("Unclosed block 'if'")
            .with_code(ErrorCode::E101)
            .with_location(SourceLocation::new(6, 2, 1));
        let report = Reportable::template(&diag, "text\n\n{{#if x}}");

        let labels: Vec<_> = report.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].label(), Some("unclosed block"));
        assert_eq!(labels[0].offset(), 6);
        assert!(labels[0].primary());
    }

    #[test]
    fn test_unlocated_diagnostic_has_no_labels() {
        let diag = Diagnostic::error("no labels");
        let report = Reportable::template(&diag, "");
        assert!(report.labels().is_none());
    }
}

//! Error adapter for converting CLI errors to miette diagnostics.
//!
//! This module provides the bridge between the standard error types of the
//! library and the CLI, and miette's rich diagnostic formatting.
//!
//! Plan parse errors carry the plan source and the offending byte range, so
//! they render with a labeled snippet. Every other error renders as a plain
//! message with an error code and, where one exists, a help line.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use almanac::AlmanacError;

use crate::{CliError, ConfigError, plan::PlanError};

/// Adapter for a plan file that failed to parse.
pub struct PlanDiagnostic<'a> {
    message: &'a str,
    span: Option<SourceSpan>,
    src: &'a str,
}

impl<'a> PlanDiagnostic<'a> {
    /// Create a new plan diagnostic.
    pub fn new(message: &'a str, span: Option<SourceSpan>, src: &'a str) -> Self {
        Self { message, span, src }
    }
}

impl fmt::Debug for PlanDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanDiagnostic")
            .field("message", &self.message)
            .field("span", &self.span)
            .finish()
    }
}

impl fmt::Display for PlanDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message.trim_end())
    }
}

impl std::error::Error for PlanDiagnostic<'_> {}

impl MietteDiagnostic for PlanDiagnostic<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("almanac::plan"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "a plan needs a [calendar] table with `start` and `end`, and [[tasks]] entries with quoted ISO dates",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            span,
        ))))
    }
}

/// Adapter for errors without source information.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CliError::Almanac(AlmanacError::Config(_)) | CliError::Config(_) => "almanac::config",
            CliError::Plan(PlanError::Calendar(_)) => "almanac::calendar",
            CliError::Almanac(AlmanacError::Io(_)) => "almanac::io",
            CliError::Almanac(AlmanacError::Serialization(_)) => "almanac::serialization",
            CliError::Plan(PlanError::Parse { .. }) => "almanac::plan",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CliError::Config(ConfigError::MissingFile(_)) => {
                "check the path passed to --config"
            }
            CliError::Config(_) | CliError::Almanac(AlmanacError::Config(_)) => {
                "fix the [layout] or [style] section of the configuration file"
            }
            CliError::Plan(PlanError::Calendar(_)) => {
                "the calendar window `end` must not precede `start`"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a plan diagnostic or a plain error, providing a
/// uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A diagnostic with source location information.
    Diagnostic(PlanDiagnostic<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`CliError`] into a list of reportable errors.
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    match err {
        CliError::Plan(PlanError::Parse { message, span, src }) => {
            let span = span
                .as_ref()
                .map(|range| SourceSpan::new(range.start.into(), range.len()));
            vec![Reportable::Diagnostic(PlanDiagnostic::new(message, span, src))]
        }
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

//! Diagnostics, reports and error types shared across the generator.
//!
//! Non-fatal conditions travel as [`Diagnostic`]s inside a [`GenerateReport`];
//! fatal ones are returned as [`GenerateError`]. Nothing in between.

use crate::endpoint::Catalog;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A whole specification file was dropped from the catalog.
    Error,
    /// Something was skipped or overridden and the output may be surprising.
    Warning,
    /// Recorded for inspection only.
    Info,
}

impl Severity {
    /// Lowercase name used in rendered diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// A single non-fatal issue found while generating the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code, e.g. "E001" or "I001".
    pub code: String,
    pub message: String,
    /// Specification file the issue belongs to, when known.
    #[serde(serialize_with = "serialize_path", skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Location inside the specification (e.g. "/users/:id GET 200 application/json").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

fn serialize_path<S>(path: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match path {
        Some(p) => serializer.serialize_str(&p.to_string_lossy()),
        None => serializer.serialize_none(),
    }
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Create a new info diagnostic.
    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            file: None,
            location: None,
        }
    }

    /// Attach the specification file this diagnostic came from.
    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Set the location for this diagnostic.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.severity.label(), self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " [{location}]")?;
        }
        if let Some(file) = &self.file {
            write!(f, " ({})", file.display())?;
        }
        Ok(())
    }
}

/// Outcome of a successful (possibly partial) generation run.
#[derive(Debug, Default, Serialize)]
pub struct GenerateReport {
    pub catalog: Catalog,
    pub diagnostics: Vec<Diagnostic>,
    /// Number of specification files attempted.
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl GenerateReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic and update the error/warning counters.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => {}
        }
        self.diagnostics.push(diagnostic);
    }

    /// Add every diagnostic in order.
    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add_diagnostic(diagnostic);
        }
    }

    /// True when at least one specification file failed to load.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// True when anything was skipped or overridden.
    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    /// Diagnostics at or above warning level.
    pub fn reportable(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity != Severity::Info)
    }
}

/// Fatal failures. Any of these aborts generation and the callback is never invoked.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Failed to read specification directory {}: {source}", path.display())]
    DirectoryList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unexpected failure during generation: {0}")]
    Unexpected(String),
}

/// Failure to turn one specification file into a tree.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a RAML document (missing '#%RAML' header)", path.display())]
    MissingHeader { path: PathBuf },
    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to include {}: {source}", path.display())]
    Include {
        path: PathBuf,
        #[source]
        source: Box<LoadError>,
    },
    #[error("Invalid RAML document {}: {reason}", path.display())]
    InvalidDocument { path: PathBuf, reason: String },
}

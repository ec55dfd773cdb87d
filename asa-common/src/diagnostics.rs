//! Diagnostics collected by each processing stage
//!
//! Stages return their findings instead of pushing onto a shared warning
//! list; the caller merges them and decides how to present the summary.

use std::fmt;
use tracing::{info, warn};

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational (e.g. a write-once cell left untouched)
    Note,
    /// Needs a human to look at it (e.g. unresolved student)
    Warning,
}

/// One finding from a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, stage: &'static str, message: impl Into<String>) {
        self.push(Severity::Note, stage, message.into());
    }

    pub fn warn(&mut self, stage: &'static str, message: impl Into<String>) {
        self.push(Severity::Warning, stage, message.into());
    }

    fn push(&mut self, severity: Severity, stage: &'static str, message: String) {
        self.entries.push(Diagnostic {
            severity,
            stage,
            message,
        });
    }

    /// Append another stage's diagnostics, keeping order
    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Log a summary at the end of a run
    pub fn log_summary(&self, run: &str) {
        let warnings = self.warning_count();
        if warnings == 0 {
            info!(run, notes = self.len(), "Completed with no warnings");
            return;
        }
        warn!(run, warnings, "Completed with warnings");
        for diagnostic in self.warnings() {
            warn!("{}", diagnostic);
        }
    }
}

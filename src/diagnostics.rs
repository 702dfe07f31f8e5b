//! Structured diagnostics collected during tree building and synthesis
//!
//! Nothing in the replication engine aborts on a partial failure. Problems are
//! recorded here with a severity and whatever context is known (scope, room,
//! footprint) and handed back to the caller.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, error, info, warn};

/// Severity of a diagnostic, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Skipped but expected, e.g. a footprint that is not on any sheet
    Info,
    /// A partial correspondence failure: missing field, missing footprint
    Warning,
    /// A structural failure that stops processing of the current scope
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One reported problem
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub title: String,
    pub message: Option<String>,
    pub severity: Severity,
    /// Full identifier of the scope the problem was found in
    pub scope: Option<String>,
    /// Template file of the room involved
    pub room: Option<PathBuf>,
    /// Reference of the footprint involved
    pub footprint: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: None,
            severity,
            scope: None,
            room: None,
            footprint: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(Severity::Info, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(Severity::Error, title)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_room(mut self, room: impl Into<PathBuf>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn with_footprint(mut self, reference: impl Into<String>) -> Self {
        self.footprint = Some(reference.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.severity, self.title)?;
        if let Some(message) = &self.message {
            write!(f, "\n Message: {}", message)?;
        }
        if let Some(footprint) = &self.footprint {
            write!(f, "\n Footprint: {}", footprint)?;
        }
        if let Some(scope) = &self.scope {
            write!(f, "\n Sheet: {}", scope)?;
        }
        if let Some(room) = &self.room {
            write!(f, "\n SubPCB: {}", room.display())?;
        }
        Ok(())
    }
}

/// Append-only list of diagnostics for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let scope = diagnostic.scope.as_deref().unwrap_or("");
        let detail = diagnostic.message.as_deref().unwrap_or("");
        match diagnostic.severity {
            Severity::Info => info!(scope, detail, "{}", diagnostic.title),
            Severity::Warning => warn!(scope, detail, "{}", diagnostic.title),
            Severity::Error => error!(scope, detail, "{}", diagnostic.title),
        }
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        debug!(count = other.items.len(), "merging diagnostics");
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.severity == severity)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// The most severe level reported, if anything was reported
    pub fn worst(&self) -> Option<Severity> {
        self.items.iter().map(|d| d.severity).max()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

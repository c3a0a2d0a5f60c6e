//! Per-file and per-graph diagnostics.
//!
//! Recoverable conditions are recorded here rather than returned as errors,
//! so tests and callers can assert on exactly what was skipped and why.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The file could not be opened or decoded.
    Unreadable,
    /// The file was read but is not well-formed Java.
    Unparsable,
    /// An endpoint references a class with no matching controller declaration.
    IncompleteGraph,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable => write!(f, "unreadable"),
            Self::Unparsable => write!(f, "unparsable"),
            Self::IncompleteGraph => write!(f, "incomplete-graph"),
        }
    }
}

/// A single diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Repository-relative file the diagnostic is about, if any
    pub file: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn unreadable(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Unreadable,
            file: Some(file.into()),
            message: message.into(),
        }
    }

    pub fn unparsable(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Unparsable,
            file: Some(file.into()),
            message: message.into(),
        }
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::IncompleteGraph,
            file: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "[{}] {}: {}", self.kind, file, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

//! Engine error type.
//!
//! Only structurally impossible states surface as errors. Per-file problems
//! (unreadable or unparsable sources) are carried as [`crate::diagnostics::Diagnostic`]
//! values instead, so a single bad file never aborts a scan.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A change set arrived before any context graph was built or loaded.
    #[error("change set supplied before any context graph was built or loaded")]
    GraphNotBuilt,

    #[error("failed to load the Java grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("context map I/O error: {source} (path: {path})")]
    ContextMapIo {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("malformed context map: {source} (path: {path})")]
    ContextMapFormat {
        source: serde_json::Error,
        path: PathBuf,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;

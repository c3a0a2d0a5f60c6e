//! Change sets and the change detector.
//!
//! A [`ChangeSet`] is the "which files changed" signal from version control.
//! The [`ChangeDetector`] brings the graph up to date with those files
//! (re-parsing, adding or removing their units) and reports the classes
//! they declared before and after the change.

use crate::error::{EngineError, Result};
use crate::graph::GraphBuilder;
use crate::graph::Ingested;
use crate::parser::{is_java_path, JavaParser, SourceScanner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Ordered set of distinct repository-relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    paths: Vec<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path; returns false if it was already present or blank
    pub fn push(&mut self, path: &str) -> bool {
        let path = normalize(path);
        if path.is_empty() || self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Parse `git diff --name-status` output.
    ///
    /// Each line is a status letter, a tab, and a path. Renames and copies
    /// (`R100\told\tnew`) contribute both paths.
    pub fn from_name_status(text: &str) -> Self {
        let mut changes = Self::new();
        for line in text.lines() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            let mut fields: Vec<&str> = line.split('\t').collect();
            if fields.len() == 1 {
                fields = line.split_whitespace().collect();
            }
            let Some((status, paths)) = fields.split_first() else {
                continue;
            };
            if !status.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                tracing::warn!("Ignoring malformed name-status line: {}", line);
                continue;
            }
            for path in paths {
                changes.push(path);
            }
        }
        changes
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut changes = Self::new();
        for path in iter {
            changes.push(path.as_ref());
        }
        changes
    }
}

fn normalize(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.trim_start_matches("./").to_string()
}

/// Directly touched classes plus what happened to each path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectChanges {
    /// Classes declared by the changed files, before or after the change
    pub classes: BTreeSet<String>,
    /// Files re-parsed and merged
    pub refreshed: Vec<String>,
    /// Files that no longer parse; their entities were dropped
    pub failed: Vec<String>,
    /// Files that no longer exist; their entities were removed
    pub removed: Vec<String>,
    /// Paths that declare nothing the graph tracks
    pub ignored: Vec<String>,
}

pub struct ChangeDetector<'a> {
    scanner: &'a SourceScanner,
    parser: JavaParser,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(scanner: &'a SourceScanner) -> Result<Self> {
        Ok(Self {
            scanner,
            parser: JavaParser::new()?,
        })
    }

    /// Bring `builder`'s graph up to date with `changes` and resolve the
    /// directly changed classes. Paths are keyed relative to the scan root.
    ///
    /// Fails only if no graph was ever built or loaded.
    pub fn detect(&mut self, builder: &mut GraphBuilder, changes: &ChangeSet) -> Result<DirectChanges> {
        if !builder.is_built() {
            return Err(EngineError::GraphNotBuilt);
        }

        let mut direct = DirectChanges::default();

        for path in changes.iter() {
            // Absolute paths under the root resolve to the same key the scanner uses
            let key = self.scanner.file_key(Path::new(path));
            let file = key.as_str();
            if !is_java_path(Path::new(file)) || self.scanner.is_excluded(file) {
                tracing::debug!("Ignoring changed path {}", file);
                direct.ignored.push(file.to_string());
                continue;
            }

            let before = builder.graph().classes_in_file(file);
            let path = self.scanner.resolve(file);

            if path.is_file() {
                let outcome = self.scanner.parse_file(&mut self.parser, &path);
                match builder.ingest(outcome) {
                    Ingested::Merged | Ingested::Unchanged => direct.refreshed.push(file.to_string()),
                    Ingested::Failed => direct.failed.push(file.to_string()),
                    Ingested::Skipped => direct.ignored.push(file.to_string()),
                }
            } else if builder.remove_unit(file).is_some() {
                tracing::info!("Removed entities of deleted file {}", file);
                direct.removed.push(file.to_string());
            } else {
                tracing::debug!("Changed path {} is unknown to the graph", file);
                direct.ignored.push(file.to_string());
            }

            let after = builder.graph().classes_in_file(file);
            direct.classes.extend(before);
            direct.classes.extend(after);
        }

        tracing::info!(
            "Change set resolved: {} classes ({} refreshed, {} failed, {} removed, {} ignored)",
            direct.classes.len(),
            direct.refreshed.len(),
            direct.failed.len(),
            direct.removed.len(),
            direct.ignored.len()
        );
        Ok(direct)
    }
}

//! Source tree scanner
//!
//! Walks a repository root and yields one [`UnitOutcome`] per `.java` file,
//! in file-name order so that repeated scans see files in the same sequence.
//! Build output, VCS metadata and (by default) test trees are pruned.

use super::{file_key, is_java_path, JavaParser, UnitOutcome};
use crate::error::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into
const PRUNED_DIRS: &[&str] = &[
    ".git",
    ".gradle",
    ".idea",
    "target",
    "build",
    "out",
    "node_modules",
];

/// Directories holding test sources
const TEST_DIRS: &[&str] = &["test", "tests"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Descend into `test`/`tests` directories
    pub include_tests: bool,
    /// Follow symbolic links while walking
    pub follow_links: bool,
}

pub struct SourceScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl SourceScanner {
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Repository key of a path under this root
    pub fn file_key(&self, path: &Path) -> String {
        file_key(&self.root, path)
    }

    /// Absolute location of a repository key
    pub fn resolve(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    /// Lazily parse every Java file under the root.
    ///
    /// Each item is produced only when requested; nothing is buffered.
    pub fn scan(&self) -> Result<ScanIter<'_>> {
        Ok(ScanIter {
            scanner: self,
            walker: Box::new(self.walker()),
            parser: JavaParser::new()?,
        })
    }

    /// Parse every Java file under the root on the rayon pool.
    ///
    /// Walk errors come first, then parsed files in walk order.
    pub fn scan_parallel(&self) -> Vec<UnitOutcome> {
        let mut outcomes = Vec::new();
        let mut paths = Vec::new();

        for entry in self.walker() {
            match entry {
                Ok(entry) if is_source_file(&entry) => paths.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => outcomes.push(self.walk_error(&e)),
            }
        }

        tracing::debug!("Parsing {} Java files in parallel", paths.len());

        let parsed: Vec<UnitOutcome> = paths
            .par_iter()
            .map_init(JavaParser::new, |parser, path| match parser {
                Ok(parser) => self.parse_file(parser, path),
                Err(e) => UnitOutcome::Skipped {
                    file: self.file_key(path),
                    reason: e.to_string(),
                },
            })
            .collect();

        outcomes.extend(parsed);
        outcomes
    }

    /// Parse a single file under this root
    pub fn parse_file(&self, parser: &mut JavaParser, path: &Path) -> UnitOutcome {
        parser.parse_path(path, &self.file_key(path))
    }

    fn walker(&self) -> impl Iterator<Item = walkdir::Result<DirEntry>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.options.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry))
    }

    /// Whether a repository key lies under a directory the scan never enters
    pub fn is_excluded(&self, file: &str) -> bool {
        let mut dirs: Vec<&str> = file.split('/').collect();
        dirs.pop();
        dirs.into_iter().any(|dir| self.is_pruned_name(dir))
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        self.is_pruned_name(&entry.file_name().to_string_lossy())
    }

    fn is_pruned_name(&self, name: &str) -> bool {
        PRUNED_DIRS.contains(&name) || (!self.options.include_tests && TEST_DIRS.contains(&name))
    }

    fn walk_error(&self, error: &walkdir::Error) -> UnitOutcome {
        let file = error
            .path()
            .map(|p| self.file_key(p))
            .unwrap_or_default();
        tracing::warn!("Skipping unreadable entry {}: {}", file, error);
        UnitOutcome::Skipped {
            file,
            reason: error.to_string(),
        }
    }
}

fn is_source_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() && is_java_path(entry.path())
}

/// Lazy iterator returned by [`SourceScanner::scan`]
pub struct ScanIter<'a> {
    scanner: &'a SourceScanner,
    walker: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
    parser: JavaParser,
}

impl Iterator for ScanIter<'_> {
    type Item = UnitOutcome;

    fn next(&mut self) -> Option<UnitOutcome> {
        loop {
            match self.walker.next()? {
                Ok(entry) if is_source_file(&entry) => {
                    return Some(self.scanner.parse_file(&mut self.parser, entry.path()));
                }
                Ok(_) => continue,
                Err(e) => return Some(self.scanner.walk_error(&e)),
            }
        }
    }
}

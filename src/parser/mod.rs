//! Tree-sitter based Java source parser
//!
//! Turns one `.java` file into a [`SourceUnit`]: its package, the types it
//! declares, and their annotations, methods and fields. No classification
//! happens here; roles and endpoints are derived by [`crate::extract`].

pub mod helpers;
pub mod java;
pub mod scanner;

pub use scanner::{ScanIter, ScanOptions, SourceScanner};

use crate::diagnostics::Diagnostic;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tree_sitter::Parser;

/// Extension of the only source files the scanner picks up
pub const JAVA_EXTENSION: &str = "java";

/// Whether `path` names a Java source file
pub fn is_java_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(JAVA_EXTENSION))
}

/// Repository-relative, forward-slash key for `path`.
///
/// Paths outside `root` keep their own spelling.
pub fn file_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let key = relative.to_string_lossy().replace('\\', "/");
    key.trim_start_matches("./").to_string()
}

/// Compute SHA-256 hash of file content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

// ============================================================================
// Parsed structure
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

/// An annotation as written on a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotation {
    /// Simple name without `@` or package (`GetMapping`)
    pub name: String,
    /// Element values keyed by element name; string literals are unquoted
    pub arguments: BTreeMap<String, Vec<String>>,
}

impl Annotation {
    /// Key a bare argument is stored under (`@GetMapping("/x")`).
    pub const DEFAULT_ELEMENT: &'static str = "value";

    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Values of one element, empty if absent
    pub fn values(&self, element: &str) -> &[String] {
        self.arguments
            .get(element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredMethod {
    pub name: String,
    /// 1-based line of the method name
    pub line: u32,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredField {
    pub name: String,
    /// Simple type name (`AccountService`)
    pub type_name: String,
    /// Type as written (`java.util.List<Account>`)
    pub raw_type: String,
    pub line: u32,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredType {
    pub name: String,
    pub kind: TypeKind,
    pub line: u32,
    pub annotations: Vec<Annotation>,
    pub methods: Vec<DeclaredMethod>,
    pub fields: Vec<DeclaredField>,
}

impl DeclaredType {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }
}

/// One successfully parsed compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Path the unit was read from
    pub path: PathBuf,
    /// Repository-relative key (`src/main/java/com/bank/Foo.java`)
    pub file: String,
    pub package: Option<String>,
    /// SHA-256 of the file content
    pub hash: String,
    /// Declared types in source order, nested types after their parent
    pub types: Vec<DeclaredType>,
}

/// Result of reading and parsing one file.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Parsed(SourceUnit),
    /// Read but not well-formed Java
    Failed { file: String, reason: String },
    /// Could not be read at all
    Skipped { file: String, reason: String },
}

impl UnitOutcome {
    pub fn file(&self) -> &str {
        match self {
            Self::Parsed(unit) => &unit.file,
            Self::Failed { file, .. } | Self::Skipped { file, .. } => file,
        }
    }

    /// The diagnostic this outcome produces, if it is not a success
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Self::Parsed(_) => None,
            Self::Failed { file, reason } => Some(Diagnostic::unparsable(file, reason)),
            Self::Skipped { file, reason } => Some(Diagnostic::unreadable(file, reason)),
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Java parser using tree-sitter
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    /// Create a new parser with the Java grammar loaded
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_java::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    /// Read `path` from disk and parse it; `file` is its repository key
    pub fn parse_path(&mut self, path: &Path, file: &str) -> UnitOutcome {
        match std::fs::read_to_string(path) {
            Ok(content) => self.parse_source(path, file, &content),
            Err(e) => {
                tracing::warn!("Skipping unreadable file {}: {}", path.display(), e);
                UnitOutcome::Skipped {
                    file: file.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Parse in-memory Java source.
    ///
    /// A tree containing any `ERROR` or `MISSING` node is reported as
    /// [`UnitOutcome::Failed`] so that half-parsed files never contribute
    /// partial entities.
    pub fn parse_source(&mut self, path: &Path, file: &str, content: &str) -> UnitOutcome {
        let Some(tree) = self.parser.parse(content, None) else {
            return UnitOutcome::Failed {
                file: file.to_string(),
                reason: "parser produced no syntax tree".to_string(),
            };
        };

        let root = tree.root_node();
        if root.has_error() {
            let reason = match helpers::first_error(&root) {
                Some(node) if node.is_missing() => {
                    let pos = node.start_position();
                    format!(
                        "missing `{}` at line {}, column {}",
                        node.kind(),
                        pos.row + 1,
                        pos.column + 1
                    )
                }
                Some(node) => {
                    let pos = node.start_position();
                    format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1)
                }
                None => "syntax error".to_string(),
            };
            tracing::warn!("Unparsable Java source {}: {}", file, reason);
            return UnitOutcome::Failed {
                file: file.to_string(),
                reason,
            };
        }

        let mut unit = SourceUnit {
            path: path.to_path_buf(),
            file: file.to_string(),
            package: None,
            hash: content_hash(content),
            types: Vec::new(),
        };
        java::extract(&root, content, &mut unit);

        tracing::debug!("Parsed {} ({} types)", file, unit.types.len());
        UnitOutcome::Parsed(unit)
    }
}

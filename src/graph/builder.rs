//! Context graph builder.
//!
//! The builder is the single writer of the graph: every merge goes through
//! `&mut self`, and readers only ever get an immutable [`GraphSnapshot`].
//! The graph sits behind an `Arc`; a merge while a snapshot is alive
//! clones it first (`Arc::make_mut`), so a snapshot never changes under
//! its holder.

use super::context::{ContextGraph, UnitRecord};
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::extract::{extract_unit, ExtractedUnit};
use crate::parser::{SourceScanner, UnitOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

/// Counts for one build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub parsed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BuildSummary {
    pub fn total(&self) -> usize {
        self.parsed + self.failed + self.skipped
    }
}

/// What [`GraphBuilder::ingest`] did with one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Merged,
    /// Same content hash as the recorded unit; nothing to do
    Unchanged,
    Failed,
    Skipped,
}

/// Immutable view of the graph plus the diagnostics current when it was taken.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    graph: Arc<ContextGraph>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GraphSnapshot {
    pub fn graph(&self) -> &ContextGraph {
        &self.graph
    }

    /// Whether every endpoint's owner is a declared controller
    pub fn is_complete(&self) -> bool {
        self.graph.incomplete_endpoints().is_empty()
    }
}

impl Deref for GraphSnapshot {
    type Target = ContextGraph;

    fn deref(&self) -> &ContextGraph {
        &self.graph
    }
}

#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Arc<ContextGraph>,
    /// Current diagnostic per file; replaced or cleared as the file changes
    diagnostics: BTreeMap<String, Diagnostic>,
    built: bool,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing graph, e.g. one loaded from a context map
    pub fn with_graph(graph: ContextGraph) -> Self {
        Self {
            graph: Arc::new(graph),
            diagnostics: BTreeMap::new(),
            built: true,
        }
    }

    /// Whether a graph was ever built or loaded
    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn graph(&self) -> &ContextGraph {
        &self.graph
    }

    /// Current per-file diagnostics, in file order
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.values()
    }

    /// Fold one extracted unit into the graph (replace-by-declaring-unit)
    pub fn merge(&mut self, unit: ExtractedUnit) {
        Arc::make_mut(&mut self.graph).replace_unit(unit);
    }

    /// Drop everything `file` contributed, along with its diagnostic
    pub fn remove_unit(&mut self, file: &str) -> Option<UnitRecord> {
        self.diagnostics.remove(file);
        if self.graph.unit(file).is_none() {
            return None;
        }
        Arc::make_mut(&mut self.graph).remove_unit(file)
    }

    /// Apply one scanner outcome to the graph.
    ///
    /// Failed units are recorded as unparsed and lose their previous
    /// entities; skipped (unreadable) units leave the graph untouched.
    pub fn ingest(&mut self, outcome: UnitOutcome) -> Ingested {
        match outcome.diagnostic() {
            Some(diagnostic) => {
                self.diagnostics.insert(outcome.file().to_string(), diagnostic);
            }
            None => {
                self.diagnostics.remove(outcome.file());
            }
        }

        match outcome {
            UnitOutcome::Parsed(unit) => {
                let unchanged = self
                    .graph
                    .unit(&unit.file)
                    .is_some_and(|r| r.is_parsed() && r.hash.as_deref() == Some(unit.hash.as_str()));
                if unchanged {
                    tracing::debug!("Unit unchanged, skipping: {}", unit.file);
                    return Ingested::Unchanged;
                }
                self.merge(extract_unit(&unit));
                Ingested::Merged
            }
            UnitOutcome::Failed { file, reason } => {
                Arc::make_mut(&mut self.graph).mark_unparsed(&file, &reason);
                Ingested::Failed
            }
            UnitOutcome::Skipped { .. } => Ingested::Skipped,
        }
    }

    /// Full pass: start from an empty graph and ingest every outcome.
    pub fn build<I>(&mut self, outcomes: I) -> BuildSummary
    where
        I: IntoIterator<Item = UnitOutcome>,
    {
        self.graph = Arc::new(ContextGraph::new());
        self.diagnostics.clear();

        let mut summary = BuildSummary::default();
        for outcome in outcomes {
            match self.ingest(outcome) {
                Ingested::Merged | Ingested::Unchanged => summary.parsed += 1,
                Ingested::Failed => summary.failed += 1,
                Ingested::Skipped => summary.skipped += 1,
            }
        }
        self.built = true;

        tracing::info!(
            "Built context graph: {} parsed, {} failed, {} skipped ({} classes, {} endpoints, {} edges)",
            summary.parsed,
            summary.failed,
            summary.skipped,
            self.graph.class_count(),
            self.graph.endpoints().count(),
            self.graph.edge_count()
        );
        summary
    }

    /// Scan `scanner`'s root and build from it.
    ///
    /// With `parallel`, files are parsed on the rayon pool and the outcomes
    /// are then merged here one at a time.
    pub fn build_from(&mut self, scanner: &SourceScanner, parallel: bool) -> Result<BuildSummary> {
        tracing::info!("Scanning {}", scanner.root().display());
        if parallel {
            Ok(self.build(scanner.scan_parallel()))
        } else {
            Ok(self.build(scanner.scan()?))
        }
    }

    /// Immutable view for readers, with incomplete-graph warnings attached.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut diagnostics: Vec<Diagnostic> = self.diagnostics.values().cloned().collect();

        for endpoint in self.graph.incomplete_endpoints() {
            let message = format!(
                "endpoint {} is owned by {}, which is not a declared controller",
                endpoint.key(),
                endpoint.class_name
            );
            tracing::warn!("Incomplete context graph: {}", message);
            diagnostics.push(Diagnostic::incomplete(message));
        }

        GraphSnapshot {
            graph: Arc::clone(&self.graph),
            diagnostics,
        }
    }
}

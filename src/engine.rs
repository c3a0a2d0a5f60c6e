//! Impact engine: scan, detect, propagate, select as one call.

use crate::diagnostics::Diagnostic;
use crate::error::{EngineError, Result};
use crate::graph::{BuildSummary, ContextMap, EndpointKey, GraphBuilder, GraphSnapshot};
use crate::impact::{
    propagate, ArtifactKey, ArtifactSelector, ChangeDetector, ChangeSet, DirectChanges,
    ImpactResult,
};
use crate::parser::{ScanOptions, SourceScanner};
use crate::Config;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Result of one change-impact run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    pub direct: DirectChanges,
    pub impact: ImpactResult,
    /// Feature-file keys to regenerate
    pub artifacts: BTreeSet<ArtifactKey>,
    /// Endpoints that existed before the change and are gone now
    pub removed_endpoints: BTreeSet<EndpointKey>,
    /// Feature-file keys of removed endpoints not covered by `artifacts`
    pub retired: BTreeSet<ArtifactKey>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ImpactEngine {
    scanner: SourceScanner,
    selector: ArtifactSelector,
    builder: GraphBuilder,
    parallel: bool,
}

impl ImpactEngine {
    pub fn new(scanner: SourceScanner, selector: ArtifactSelector) -> Self {
        Self {
            scanner,
            selector,
            builder: GraphBuilder::new(),
            parallel: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let scanner = SourceScanner::new(
            &config.source_root,
            ScanOptions {
                include_tests: config.include_tests,
                follow_links: config.follow_links,
            },
        );
        let selector = ArtifactSelector::new(config.artifact_verbs.clone(), &config.strip_prefixes);
        Self::new(scanner, selector).with_parallel(config.parallel)
    }

    /// Parse files on the rayon pool during full builds
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn scanner(&self) -> &SourceScanner {
        &self.scanner
    }

    pub fn selector(&self) -> &ArtifactSelector {
        &self.selector
    }

    pub fn builder(&self) -> &GraphBuilder {
        &self.builder
    }

    /// Full scan of the source root
    pub fn build(&mut self) -> Result<BuildSummary> {
        self.builder.build_from(&self.scanner, self.parallel)
    }

    /// Replace the graph with one read back from a context map
    pub fn load_context_map(&mut self, path: &Path) -> Result<()> {
        let map = ContextMap::load(path)?;
        self.builder = GraphBuilder::with_graph(map.to_graph());
        Ok(())
    }

    pub fn context_map(&self) -> ContextMap {
        ContextMap::from_graph(self.builder.graph())
    }

    pub fn save_context_map(&self, path: &Path) -> Result<()> {
        self.context_map().save(path)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.builder.snapshot()
    }

    /// Bring the graph up to date with `changes` and compute what to regenerate.
    pub fn analyze(&mut self, changes: &ChangeSet) -> Result<ImpactReport> {
        if !self.builder.is_built() {
            return Err(EngineError::GraphNotBuilt);
        }

        let before = self.builder.snapshot();
        let direct = ChangeDetector::new(&self.scanner)?.detect(&mut self.builder, changes)?;
        let after = self.builder.snapshot();

        let impact = propagate(&after, &direct.classes);
        let artifacts = self.selector.select(&impact);

        let removed_endpoints: BTreeSet<EndpointKey> = before
            .endpoints()
            .map(|e| e.key())
            .filter(|key| after.endpoint(key).is_none())
            .collect();
        let retired = removed_endpoints
            .iter()
            .flat_map(|key| self.selector.keys_for(key.method, &key.path))
            .filter(|key| !artifacts.contains(key))
            .collect();

        Ok(ImpactReport {
            direct,
            impact,
            artifacts,
            removed_endpoints,
            retired,
            diagnostics: after.diagnostics.clone(),
        })
    }
}

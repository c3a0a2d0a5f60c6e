//! Change impact analysis.
//!
//! - [`change`]: `ChangeSet` and the `ChangeDetector` that refreshes the graph
//! - [`propagate`]: reverse-edge reachability to affected endpoints
//! - [`artifacts`]: endpoint → feature-file key mapping

pub mod artifacts;
pub mod change;
pub mod propagate;

pub use artifacts::{ArtifactKey, ArtifactPlan, ArtifactSelector};
pub use change::{ChangeDetector, ChangeSet, DirectChanges};
pub use propagate::{propagate, ImpactResult};

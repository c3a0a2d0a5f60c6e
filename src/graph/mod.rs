//! Context graph.
//!
//! Aggregates extracted entities into one directed class graph and keeps
//! its durable JSON form.
//!
//! ## Architecture
//!
//! ```text
//! SourceScanner ──► UnitOutcome ──► extract_unit ──► ExtractedUnit
//!                                                        │
//!                                            GraphBuilder::merge (single writer)
//!                                                        │
//!                                           ContextGraph (petgraph arena)
//!                                             │                  │
//!                                      snapshot()       ContextMap (api_flow.json)
//! ```
//!
//! ## Modules
//!
//! - [`models`]: Roles, declarations, endpoints, dependency edges
//! - [`context`]: `ContextGraph` arena with per-file unit records
//! - [`builder`]: `GraphBuilder` (merge, build pass, snapshots)
//! - [`context_map`]: JSON codec for the graph
//! - [`diff`]: Comparison of two context maps

pub mod builder;
pub mod context;
pub mod context_map;
pub mod diff;
pub mod models;

// Re-export primary types for convenience
pub use builder::{BuildSummary, GraphBuilder, GraphSnapshot, Ingested};
pub use context::{ContextGraph, UnitRecord, UnitStatus};
pub use context_map::{ContextMap, EndpointEntry, EndpointGroup, ServiceCallEntry, DETACHED_GROUP};
pub use diff::{ContextMapDiff, GroupEndpoint};
pub use models::{Endpoint, EndpointKey, HttpMethod, Role, ServiceCallEdge, TypeDeclaration};

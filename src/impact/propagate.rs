//! Impact propagation.
//!
//! Breadth-first reachability over reverse dependency edges: starting from
//! the changed classes, every class that holds a reference to an affected
//! class is affected too. A visited set bounds the walk, so cyclic
//! dependencies terminate.

use crate::graph::{ContextGraph, EndpointKey, Role};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub changed_classes: BTreeSet<String>,
    /// Changed classes plus everything that transitively depends on them
    pub affected_classes: BTreeSet<String>,
    /// Endpoints owned by affected controllers
    pub affected_endpoints: BTreeSet<EndpointKey>,
}

impl ImpactResult {
    pub fn is_empty(&self) -> bool {
        self.affected_endpoints.is_empty() && self.affected_classes.is_empty()
    }
}

/// Compute the impact of `changed` on `graph`.
pub fn propagate<'a, I>(graph: &ContextGraph, changed: I) -> ImpactResult
where
    I: IntoIterator<Item = &'a String>,
{
    let changed_classes: BTreeSet<String> = changed.into_iter().cloned().collect();

    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    for class in &changed_classes {
        visited.insert(class.clone());
        queue.push_back(class.clone());
    }

    while let Some(current) = queue.pop_front() {
        // dependents_of is sorted, so visitation order is deterministic
        for dependent in graph.dependents_of(&current) {
            if visited.insert(dependent.clone()) {
                tracing::debug!("Impact: {} depends on {}", dependent, current);
                queue.push_back(dependent);
            }
        }
    }

    let affected_endpoints: BTreeSet<EndpointKey> = visited
        .iter()
        .filter(|class| graph.role_of(class) == Some(Role::Controller))
        .flat_map(|class| graph.endpoints_of(class).map(|e| e.key()))
        .collect();

    tracing::info!(
        "Impact: {} changed, {} affected classes, {} affected endpoints",
        changed_classes.len(),
        visited.len(),
        affected_endpoints.len()
    );

    ImpactResult {
        changed_classes,
        affected_classes: visited,
        affected_endpoints,
    }
}

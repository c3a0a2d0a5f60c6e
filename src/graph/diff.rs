//! Comparison of two context maps.
//!
//! Endpoints are matched per group by `(http_method, handler method)`. An
//! endpoint is *changed* when it is new, or when its owning class differs
//! from the previous map; it is *deleted* when it disappears.

use super::context_map::ContextMap;
use super::models::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An endpoint as the diff reports it: verb plus context-map group key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupEndpoint {
    pub http_method: HttpMethod,
    pub group: String,
}

impl fmt::Display for GroupEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.http_method, self.group)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMapDiff {
    /// Added or modified endpoints
    pub changed: BTreeSet<GroupEndpoint>,
    pub deleted: BTreeSet<GroupEndpoint>,
}

impl ContextMapDiff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }

    pub fn between(old: &ContextMap, new: &ContextMap) -> Self {
        let mut diff = Self::default();

        for (group, new_group) in &new.groups {
            let old_endpoints = index(old, group);
            for endpoint in &new_group.endpoints {
                let modified = match old_endpoints.get(&(endpoint.http_method, endpoint.method.as_str())) {
                    None => {
                        tracing::info!("Added endpoint: {} {}", endpoint.http_method, group);
                        true
                    }
                    Some(class) if *class != endpoint.class => {
                        tracing::info!("Modified endpoint: {} {}", endpoint.http_method, group);
                        true
                    }
                    Some(_) => false,
                };
                if modified {
                    diff.changed.insert(GroupEndpoint {
                        http_method: endpoint.http_method,
                        group: group.clone(),
                    });
                }
            }
        }

        for (group, old_group) in &old.groups {
            let new_endpoints = index(new, group);
            for endpoint in &old_group.endpoints {
                if !new_endpoints.contains_key(&(endpoint.http_method, endpoint.method.as_str())) {
                    tracing::info!("Removed endpoint: {} {}", endpoint.http_method, group);
                    diff.deleted.insert(GroupEndpoint {
                        http_method: endpoint.http_method,
                        group: group.clone(),
                    });
                }
            }
        }

        tracing::info!(
            "Context map diff: {} changed, {} deleted",
            diff.changed.len(),
            diff.deleted.len()
        );
        diff
    }
}

/// `(verb, handler) → owning class` for one group, empty if absent
fn index<'a>(map: &'a ContextMap, group: &str) -> BTreeMap<(HttpMethod, &'a str), &'a str> {
    map.group(group)
        .map(|g| {
            g.endpoints
                .iter()
                .map(|e| ((e.http_method, e.method.as_str()), e.class.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

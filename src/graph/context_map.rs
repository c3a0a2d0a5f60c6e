//! Context map: the durable JSON form of the context graph.
//!
//! ```json
//! {
//!   "api/v1/accounts": {
//!     "endpoints": [
//!       { "method": "checkAccountBalance", "path": "/accounts",
//!         "class": "AccountRestController", "line_number": 25, "http_method": "POST" }
//!     ],
//!     "service_calls": [
//!       { "class": "AccountRestController", "service": "AccountService", "field": "accountService" }
//!     ]
//!   }
//! }
//! ```
//!
//! Groups are keyed by the endpoint's full path without its leading `/`; a
//! group's `service_calls` are the direct dependencies of the controllers
//! owning its endpoints. Dependencies declared by classes that own no
//! endpoint go under [`DETACHED_GROUP`]. The optional `file` and
//! `service_file` fields carry declaring files so a reloaded graph keeps its
//! file → class index.

use super::context::ContextGraph;
use super::models::{
    Endpoint, EndpointKey, FieldDeclaration, HttpMethod, Role, ServiceCallEdge, TypeDeclaration,
};
use crate::error::{EngineError, Result};
use crate::extract::{classify, normalize_path, ExtractedUnit};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Group holding dependencies of classes that own no endpoint
pub const DETACHED_GROUP: &str = "__dependencies__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointEntry {
    /// Handler method name
    pub method: String,
    /// Method-level declared path
    pub path: String,
    pub class: String,
    pub line_number: u32,
    pub http_method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCallEntry {
    pub class: String,
    pub service: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Declaring file of `service`, when it is a declared type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointGroup {
    #[serde(default)]
    pub endpoints: Vec<EndpointEntry>,
    #[serde(default)]
    pub service_calls: Vec<ServiceCallEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextMap {
    pub groups: BTreeMap<String, EndpointGroup>,
}

impl ContextMap {
    pub fn group(&self, key: &str) -> Option<&EndpointGroup> {
        self.groups.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Serialize a graph.
    pub fn from_graph(graph: &ContextGraph) -> Self {
        let mut map = ContextMap::default();
        let mut owners: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for endpoint in graph.endpoints() {
            let key = endpoint.group_key();
            map.groups
                .entry(key.clone())
                .or_default()
                .endpoints
                .push(EndpointEntry {
                    method: endpoint.handler.clone(),
                    path: endpoint.declared_path.clone(),
                    class: endpoint.class_name.clone(),
                    line_number: endpoint.line,
                    http_method: endpoint.http_method,
                    file: Some(endpoint.file.clone()),
                });
            owners
                .entry(key)
                .or_default()
                .insert(endpoint.class_name.clone());
        }

        let edges = graph.edges();
        let entry = |edge: &ServiceCallEdge, file: &str| ServiceCallEntry {
            class: edge.source.clone(),
            service: edge.target.clone(),
            field: edge.field.clone(),
            file: Some(file.to_string()),
            service_file: graph.type_decl(&edge.target).map(|t| t.file.clone()),
        };

        for (key, classes) in &owners {
            let group = map.groups.entry(key.clone()).or_default();
            for (edge, file) in &edges {
                if classes.contains(&edge.source) {
                    group.service_calls.push(entry(edge, file.as_str()));
                }
            }
        }

        let endpoint_owners: BTreeSet<&String> = owners.values().flatten().collect();
        let detached: Vec<ServiceCallEntry> = edges
            .iter()
            .filter(|(edge, _)| !endpoint_owners.contains(&edge.source))
            .map(|(edge, file)| entry(edge, file.as_str()))
            .collect();
        if !detached.is_empty() {
            map.groups
                .entry(DETACHED_GROUP.to_string())
                .or_default()
                .service_calls = detached;
        }

        map
    }

    /// Rebuild a graph.
    ///
    /// Entries are grouped back into units by declaring file; an entry with
    /// no `file` is attributed to `<Class>.java`. Endpoint owners come back
    /// as controllers, other classes are classified by name.
    pub fn to_graph(&self) -> ContextGraph {
        let mut units: BTreeMap<String, UnitParts> = BTreeMap::new();
        let owners: BTreeSet<&str> = self
            .groups
            .values()
            .flat_map(|g| g.endpoints.iter().map(|e| e.class.as_str()))
            .collect();

        for (key, group) in &self.groups {
            for entry in &group.endpoints {
                let file = file_or_default(&entry.file, &entry.class);
                let parts = units.entry(file.clone()).or_default();
                let endpoint = Endpoint {
                    http_method: entry.http_method,
                    path: normalize_path(&format!("/{}", key)),
                    declared_path: normalize_path(&entry.path),
                    handler: entry.method.clone(),
                    class_name: entry.class.clone(),
                    line: entry.line_number,
                    file: file.clone(),
                };
                let ty = parts.declare(&entry.class, Role::Controller, &file);
                if !ty.methods.contains(&entry.method) {
                    ty.methods.push(entry.method.clone());
                }
                parts.endpoints.insert(endpoint.key(), endpoint);
            }

            for call in &group.service_calls {
                let file = file_or_default(&call.file, &call.class);
                let role = if owners.contains(call.class.as_str()) {
                    Role::Controller
                } else {
                    classify::<&str>(&[], &call.class)
                };
                let parts = units.entry(file.clone()).or_default();
                let ty = parts.declare(&call.class, role, &file);
                if !ty.fields.iter().any(|f| f.name == call.field) {
                    ty.fields.push(FieldDeclaration {
                        name: call.field.clone(),
                        type_name: call.service.clone(),
                    });
                }
                parts.edges.insert(ServiceCallEdge {
                    source: call.class.clone(),
                    target: call.service.clone(),
                    field: call.field.clone(),
                });

                if let Some(service_file) = &call.service_file {
                    let role = classify::<&str>(&[], &call.service);
                    units
                        .entry(service_file.clone())
                        .or_default()
                        .declare(&call.service, role, service_file);
                }
            }
        }

        let mut graph = ContextGraph::new();
        for (file, parts) in units {
            graph.replace_unit(ExtractedUnit {
                file,
                package: None,
                hash: None,
                types: parts.types.into_values().collect(),
                endpoints: parts.endpoints.into_values().collect(),
                edges: parts.edges.into_iter().collect(),
            });
        }
        graph
    }

    /// Read a context map from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::ContextMapIo {
            source,
            path: path.to_path_buf(),
        })?;
        let map: ContextMap =
            serde_json::from_str(&content).map_err(|source| EngineError::ContextMapFormat {
                source,
                path: path.to_path_buf(),
            })?;
        tracing::info!("Loaded context map {} ({} groups)", path.display(), map.groups.len());
        Ok(map)
    }

    /// Write the context map as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_error = |source| EngineError::ContextMapIo {
            source,
            path: path.to_path_buf(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            EngineError::ContextMapFormat {
                source,
                path: path.to_path_buf(),
            }
        })?;
        std::fs::write(path, json).map_err(io_error)?;
        tracing::info!("Wrote context map {} ({} groups)", path.display(), self.groups.len());
        Ok(())
    }
}

fn file_or_default(file: &Option<String>, class: &str) -> String {
    file.clone().unwrap_or_else(|| format!("{}.java", class))
}

/// Entities of one file while a context map is being read back.
#[derive(Default)]
struct UnitParts {
    types: BTreeMap<String, TypeDeclaration>,
    endpoints: BTreeMap<EndpointKey, Endpoint>,
    edges: BTreeSet<ServiceCallEdge>,
}

impl UnitParts {
    /// Declare `name` in this unit; a controller role is never downgraded.
    fn declare(&mut self, name: &str, role: Role, file: &str) -> &mut TypeDeclaration {
        let ty = self
            .types
            .entry(name.to_string())
            .or_insert_with(|| TypeDeclaration {
                name: name.to_string(),
                package: None,
                role,
                methods: Vec::new(),
                fields: Vec::new(),
                annotations: Vec::new(),
                file: file.to_string(),
            });
        if role == Role::Controller {
            ty.role = Role::Controller;
        }
        ty
    }
}

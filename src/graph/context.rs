//! The context graph aggregate.
//!
//! Classes live in a petgraph `StableDiGraph` arena with a name → index map,
//! so removing a unit never invalidates the indices of the rest of the graph.
//! An edge `A → B` means "A holds a reference to B"; the reverse direction
//! ("B is depended on by A") is read with `Direction::Incoming`.
//!
//! Every contribution is recorded against the file that declared it. Merging a
//! unit first drops whatever that file contributed before, which keeps
//! re-ingestion idempotent and leaves no orphans behind deleted code.

use super::models::{ClassNode, DependencyEdge, Endpoint, EndpointKey, Role, ServiceCallEdge, TypeDeclaration};
use crate::extract::ExtractedUnit;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Parse status of a recorded unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitStatus {
    Parsed,
    Unparsed { reason: String },
}

/// What one file contributed to the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub package: Option<String>,
    pub hash: Option<String>,
    /// Classes declared by the file, in declaration order
    pub classes: Vec<String>,
    /// The file's own declarations, kept so a class declared by several
    /// files can fall back to another declarer
    pub types: Vec<TypeDeclaration>,
    pub endpoints: Vec<Endpoint>,
    pub edges: Vec<ServiceCallEdge>,
    pub status: UnitStatus,
}

impl UnitRecord {
    fn unparsed(reason: impl Into<String>) -> Self {
        Self {
            package: None,
            hash: None,
            classes: Vec::new(),
            types: Vec::new(),
            endpoints: Vec::new(),
            edges: Vec::new(),
            status: UnitStatus::Unparsed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.status == UnitStatus::Parsed
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextGraph {
    graph: StableDiGraph<ClassNode, DependencyEdge>,
    class_index: HashMap<String, NodeIndex>,
    types: BTreeMap<String, TypeDeclaration>,
    endpoints: BTreeMap<EndpointKey, Endpoint>,
    units: BTreeMap<String, UnitRecord>,
}

impl ContextGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Fold one unit into the graph, replacing anything its file contributed before.
    pub fn replace_unit(&mut self, unit: ExtractedUnit) {
        self.remove_unit(&unit.file);

        let mut record = UnitRecord {
            package: unit.package,
            hash: unit.hash,
            classes: Vec::with_capacity(unit.types.len()),
            types: Vec::with_capacity(unit.types.len()),
            endpoints: Vec::with_capacity(unit.endpoints.len()),
            edges: Vec::with_capacity(unit.edges.len()),
            status: UnitStatus::Parsed,
        };

        for ty in unit.types {
            self.ensure_node(&ty.name);
            if !record.classes.contains(&ty.name) {
                record.classes.push(ty.name.clone());
            }
            record.types.push(ty.clone());
            self.types.insert(ty.name.clone(), ty);
        }

        for endpoint in unit.endpoints {
            let key = endpoint.key();
            if !record.endpoints.iter().any(|e| e.key() == key) {
                record.endpoints.push(endpoint.clone());
            }
            self.endpoints.insert(key, endpoint);
        }

        for edge in unit.edges {
            self.add_edge(&edge, &unit.file);
            if !record.edges.contains(&edge) {
                record.edges.push(edge);
            }
        }

        self.units.insert(unit.file, record);
    }

    /// Drop everything `file` contributed. Returns its previous record.
    ///
    /// A class or endpoint that another file also declares stays in the
    /// graph with that file's declaration.
    pub fn remove_unit(&mut self, file: &str) -> Option<UnitRecord> {
        let record = self.units.remove(file)?;

        for endpoint in &record.endpoints {
            let key = endpoint.key();
            if !self.endpoints.get(&key).is_some_and(|e| e.file == file) {
                continue;
            }
            let other = self
                .units
                .values()
                .flat_map(|r| &r.endpoints)
                .find(|e| e.key() == key)
                .cloned();
            match other {
                Some(other) => {
                    tracing::debug!("Endpoint {} now declared by {}", key, other.file);
                    self.endpoints.insert(key, other);
                }
                None => {
                    self.endpoints.remove(&key);
                }
            }
        }

        for edge in &record.edges {
            self.remove_edge(edge, file);
        }

        for class in &record.classes {
            if !self.types.get(class).is_some_and(|t| t.file == file) {
                continue;
            }
            let other = self
                .units
                .values()
                .flat_map(|r| &r.types)
                .find(|t| &t.name == class)
                .cloned();
            match other {
                Some(other) => {
                    tracing::debug!("Class {} now declared by {}", class, other.file);
                    self.types.insert(class.clone(), other);
                }
                None => {
                    self.types.remove(class);
                }
            }
        }

        let touched: BTreeSet<&str> = record
            .classes
            .iter()
            .map(String::as_str)
            .chain(record.edges.iter().flat_map(|e| [e.source.as_str(), e.target.as_str()]))
            .collect();
        for name in touched {
            self.prune_node(name);
        }

        Some(record)
    }

    /// Record `file` as unparsable; whatever it contributed before is dropped.
    pub fn mark_unparsed(&mut self, file: &str, reason: &str) {
        self.remove_unit(file);
        self.units
            .insert(file.to_string(), UnitRecord::unparsed(reason));
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.class_index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(ClassNode {
            name: name.to_string(),
        });
        self.class_index.insert(name.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, edge: &ServiceCallEdge, file: &str) {
        let from = self.ensure_node(&edge.source);
        let to = self.ensure_node(&edge.target);

        let existing = self
            .graph
            .edges(from)
            .find(|e| e.target() == to && e.weight().field == edge.field)
            .map(|e| e.id());

        match existing {
            Some(id) => {
                if let Some(weight) = self.graph.edge_weight_mut(id) {
                    weight.files.insert(file.to_string());
                }
            }
            None => {
                self.graph.add_edge(
                    from,
                    to,
                    DependencyEdge {
                        field: edge.field.clone(),
                        files: BTreeSet::from([file.to_string()]),
                    },
                );
            }
        }
    }

    fn remove_edge(&mut self, edge: &ServiceCallEdge, file: &str) {
        let (Some(&from), Some(&to)) = (
            self.class_index.get(&edge.source),
            self.class_index.get(&edge.target),
        ) else {
            return;
        };

        let found = self
            .graph
            .edges(from)
            .find(|e| e.target() == to && e.weight().field == edge.field)
            .map(|e| e.id());
        let Some(id) = found else {
            return;
        };
        let orphaned = match self.graph.edge_weight_mut(id) {
            Some(weight) => {
                weight.files.remove(file);
                weight.files.is_empty()
            }
            None => false,
        };
        if orphaned {
            self.graph.remove_edge(id);
        }
    }

    /// Remove a node that is neither declared nor connected.
    fn prune_node(&mut self, name: &str) {
        if self.types.contains_key(name) {
            return;
        }
        let Some(&idx) = self.class_index.get(name) else {
            return;
        };
        if self.graph.neighbors_undirected(idx).next().is_none() {
            self.graph.remove_node(idx);
            self.class_index.remove(name);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.class_index.is_empty()
    }

    /// Number of class nodes, declared and opaque
    pub fn class_count(&self) -> usize {
        self.class_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.class_index.contains_key(name)
    }

    /// All class names, declared and opaque, sorted
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.class_index.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn type_decl(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.get(name)
    }

    /// Declared types in name order
    pub fn types(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.types.values()
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.types.get(name).map(|t| t.role)
    }

    pub fn endpoint(&self, key: &EndpointKey) -> Option<&Endpoint> {
        self.endpoints.get(key)
    }

    /// Endpoints in key order
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    pub fn endpoints_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Endpoint> + 'a {
        self.endpoints.values().filter(move |e| e.class_name == class)
    }

    pub fn unit(&self, file: &str) -> Option<&UnitRecord> {
        self.units.get(file)
    }

    /// Recorded units in file order
    pub fn units(&self) -> impl Iterator<Item = (&String, &UnitRecord)> {
        self.units.iter()
    }

    /// Classes declared by `file`, empty if the file is unknown
    pub fn classes_in_file(&self, file: &str) -> Vec<String> {
        self.units
            .get(file)
            .map(|r| r.classes.clone())
            .unwrap_or_default()
    }

    /// Classes holding a reference to `name` (reverse edges), sorted
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Classes `name` holds a reference to (forward edges), sorted
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.class_index.get(name) else {
            return Vec::new();
        };
        let names: BTreeSet<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n))
            .map(|n| n.name.clone())
            .collect();
        names.into_iter().collect()
    }

    /// Every dependency edge paired with each file declaring it, sorted
    pub fn edges(&self) -> Vec<(ServiceCallEdge, String)> {
        let mut edges: Vec<(ServiceCallEdge, String)> = self
            .graph
            .edge_indices()
            .filter_map(|id| {
                let (from, to) = self.graph.edge_endpoints(id)?;
                let weight = self.graph.edge_weight(id)?;
                let edge = ServiceCallEdge {
                    source: self.graph.node_weight(from)?.name.clone(),
                    target: self.graph.node_weight(to)?.name.clone(),
                    field: weight.field.clone(),
                };
                Some(
                    weight
                        .files
                        .iter()
                        .map(|file| (edge.clone(), file.clone()))
                        .collect::<Vec<_>>(),
                )
            })
            .flatten()
            .collect();
        edges.sort();
        edges
    }

    /// Endpoints whose owning class is not a declared controller
    pub fn incomplete_endpoints(&self) -> Vec<&Endpoint> {
        self.endpoints
            .values()
            .filter(|e| self.role_of(&e.class_name) != Some(Role::Controller))
            .collect()
    }
}

/// Graphs are equal when they hold the same entities, whatever their arena layout.
impl PartialEq for ContextGraph {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
            && self.endpoints == other.endpoints
            && self.units == other.units
            && self.class_names() == other.class_names()
            && self.edges() == other.edges()
    }
}

//! Resource graph management using `petgraph`.
//!
//! A [`TopologyBuilder`] accumulates resources and their relationships;
//! [`TopologyBuilder::finish`] freezes them into a [`TopologyGraph`], which
//! exposes read-only queries, a creation order, and a serializable document.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::ResourceId;

use crate::resource::{ImportedKind, ImportedSpec, Relation, Resource, ResourceKind};

/// Mutable accumulator for one sub-graph.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    graph: DiGraph<Resource, Relation>,
    index: HashMap<ResourceId, NodeIndex>,
}

impl TopologyBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a concrete resource and returns its ID.
    ///
    /// An imported node with the same ID is replaced by the concrete one.
    ///
    /// # Errors
    ///
    /// Returns an error if a different concrete resource already uses the ID.
    pub fn add(&mut self, id: impl Into<ResourceId>, kind: ResourceKind) -> Result<ResourceId> {
        let resource = Resource::new(id, kind);
        let id = resource.id.clone();
        self.absorb(resource)?;
        Ok(id)
    }

    /// Adds a reference to a resource owned elsewhere and returns its ID.
    ///
    /// Importing an ID that is already present reuses the existing node.
    pub fn import(
        &mut self,
        id: impl Into<ResourceId>,
        kind: ImportedKind,
        reference: impl Into<String>,
    ) -> ResourceId {
        let id = id.into();
        if !self.index.contains_key(&id) {
            let node = self.graph.add_node(Resource::new(
                id.clone(),
                ResourceKind::Imported(ImportedSpec {
                    kind,
                    reference: reference.into(),
                }),
            ));
            let _ = self.index.insert(id.clone(), node);
        }
        id
    }

    /// Records that `from` has `relation` to `to`.
    ///
    /// Linking the same pair with the same relation twice keeps one edge.
    ///
    /// # Errors
    ///
    /// Returns an error if either resource is unknown.
    pub fn link(&mut self, from: &ResourceId, to: &ResourceId, relation: Relation) -> Result<()> {
        let from_idx = self.node(from)?;
        let to_idx = self.node(to)?;
        let exists = self
            .graph
            .edges_connecting(from_idx, to_idx)
            .any(|edge| *edge.weight() == relation);
        if !exists {
            let _ = self.graph.add_edge(from_idx, to_idx, relation);
        }
        Ok(())
    }

    /// Whether a resource with `id` has been added or imported.
    #[must_use]
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.index.contains_key(id)
    }

    /// Freezes the builder into an immutable graph.
    #[must_use]
    pub fn finish(self) -> TopologyGraph {
        TopologyGraph {
            graph: self.graph,
            index: self.index,
        }
    }

    fn absorb(&mut self, resource: Resource) -> Result<()> {
        let Some(&existing) = self.index.get(&resource.id) else {
            let id = resource.id.clone();
            let node = self.graph.add_node(resource);
            let _ = self.index.insert(id, node);
            return Ok(());
        };

        let current = &mut self.graph[existing];
        if resource.kind.is_imported() || *current == resource {
            return Ok(());
        }
        if current.kind.is_imported() {
            tracing::trace!(id = %resource.id, "resolving imported resource");
            *current = resource;
            return Ok(());
        }
        Err(StackwrightError::Graph {
            message: format!(
                "duplicate resource id \"{}\" ({} and {})",
                resource.id,
                current.kind.type_name(),
                resource.kind.type_name()
            ),
        })
    }

    fn node(&self, id: &ResourceId) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| StackwrightError::Graph {
                message: format!("unknown resource \"{id}\""),
            })
    }
}

/// An immutable graph of resources and their relationships.
#[derive(Debug, Clone)]
pub struct TopologyGraph {
    graph: DiGraph<Resource, Relation>,
    index: HashMap<ResourceId, NodeIndex>,
}

impl TopologyGraph {
    /// Merges independently built sub-graphs into one graph.
    ///
    /// Imported nodes are unified with the concrete node carrying the same
    /// ID, so a service graph that imports `Vpc` composes with the network
    /// graph that defines it.
    ///
    /// # Errors
    ///
    /// Returns an error if two parts define different resources with one ID.
    pub fn compose(parts: impl IntoIterator<Item = Self>) -> Result<Self> {
        let mut builder = TopologyBuilder::new();
        let parts: Vec<Self> = parts.into_iter().collect();
        for part in &parts {
            for resource in part.graph.node_weights() {
                builder.absorb(resource.clone())?;
            }
        }
        for part in &parts {
            for edge in part.graph.edge_references() {
                let from = &part.graph[edge.source()].id;
                let to = &part.graph[edge.target()].id;
                builder.link(from, to, *edge.weight())?;
            }
        }
        Ok(builder.finish())
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Looks up a resource by ID.
    #[must_use]
    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Iterates over resources in insertion order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.graph.node_weights()
    }

    /// Collects every resource whose kind `pick` accepts, in insertion order.
    ///
    /// ```rust,ignore
    /// let listeners = graph.specs(ResourceKind::as_listener);
    /// ```
    pub fn specs<'a, T: 'a>(
        &'a self,
        pick: impl Fn(&'a ResourceKind) -> Option<&'a T>,
    ) -> Vec<(&'a ResourceId, &'a T)> {
        self.graph
            .node_weights()
            .filter_map(|r| pick(&r.kind).map(|spec| (&r.id, spec)))
            .collect()
    }

    /// Counts resources with the given type name.
    #[must_use]
    pub fn count(&self, type_name: &str) -> usize {
        self.graph
            .node_weights()
            .filter(|r| r.kind.type_name() == type_name)
            .count()
    }

    /// Whether an edge `from -relation-> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: &ResourceId, to: &ResourceId, relation: Relation) -> bool {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        self.graph
            .edges_connecting(a, b)
            .any(|edge| *edge.weight() == relation)
    }

    /// IDs that `from` points to with `relation`.
    #[must_use]
    pub fn targets(&self, from: &ResourceId, relation: Relation) -> Vec<&ResourceId> {
        let Some(&idx) = self.index.get(from) else {
            return Vec::new();
        };
        let mut targets: Vec<&ResourceId> = self
            .graph
            .edges(idx)
            .filter(|edge| *edge.weight() == relation)
            .map(|edge| &self.graph[edge.target()].id)
            .collect();
        targets.sort();
        targets
    }

    /// Iterates over all edges as `(from, to, relation)`.
    pub fn edges(&self) -> impl Iterator<Item = (&ResourceId, &ResourceId, Relation)> {
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()].id,
                &self.graph[edge.target()].id,
                *edge.weight(),
            )
        })
    }

    /// Returns resource IDs in an order where every resource comes after
    /// everything it points to.
    ///
    /// Edges point from a resource to its prerequisite, so this is the
    /// reverse of `petgraph::algo::toposort`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn creation_order(&self) -> Result<Vec<ResourceId>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .rev()
                .map(|&idx| self.graph[idx].id.clone())
                .collect()),
            Err(cycle) => Err(StackwrightError::Graph {
                message: format!(
                    "cyclic dependency detected at \"{}\"",
                    self.graph[cycle.node_id()].id
                ),
            }),
        }
    }

    /// Renders the graph as a document for provisioning backends.
    ///
    /// Resources appear in creation order, so backends that do not infer
    /// ordering can create them top to bottom.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn to_document(&self) -> Result<TopologyDocument<'_>> {
        let order = self.creation_order()?;
        let resources = order
            .iter()
            .filter_map(|id| self.get(id))
            .map(|r| ResourceEntry {
                id: &r.id,
                resource: &r.kind,
            })
            .collect();
        let edges = self
            .edges()
            .map(|(from, to, relation)| EdgeEntry { from, to, relation })
            .collect();
        Ok(TopologyDocument { resources, edges })
    }
}

/// Serializable form of a [`TopologyGraph`].
#[derive(Debug, Serialize)]
pub struct TopologyDocument<'a> {
    /// Resources in creation order.
    pub resources: Vec<ResourceEntry<'a>>,
    /// Relationships.
    pub edges: Vec<EdgeEntry<'a>>,
}

/// One resource of a [`TopologyDocument`].
#[derive(Debug, Serialize)]
pub struct ResourceEntry<'a> {
    /// Logical ID.
    pub id: &'a ResourceId,
    /// Type and properties.
    pub resource: &'a ResourceKind,
}

/// One edge of a [`TopologyDocument`].
#[derive(Debug, Serialize)]
pub struct EdgeEntry<'a> {
    /// Dependent resource.
    pub from: &'a ResourceId,
    /// Prerequisite resource.
    pub to: &'a ResourceId,
    /// Relationship.
    pub relation: Relation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{LogGroupSpec, RemovalPolicy, RepositorySpec};

    fn repository() -> ResourceKind {
        ResourceKind::Repository(RepositorySpec {
            removal_policy: RemovalPolicy::Destroy,
        })
    }

    fn log_group(prefix: &str) -> ResourceKind {
        ResourceKind::LogGroup(LogGroupSpec {
            stream_prefix: prefix.into(),
        })
    }

    #[test]
    fn empty_graph_has_empty_order() {
        let graph = TopologyBuilder::new().finish();
        assert!(graph.is_empty());
        assert!(graph.creation_order().expect("should order").is_empty());
    }

    #[test]
    fn prerequisites_come_first() {
        let mut builder = TopologyBuilder::new();
        let cluster = builder.add("Cluster", ResourceKind::Cluster).unwrap();
        let logs = builder.add("Logs", log_group("ecs")).unwrap();
        let repo = builder.add("Repository", repository()).unwrap();
        builder.link(&cluster, &logs, Relation::LogsTo).unwrap();
        builder.link(&logs, &repo, Relation::DependsOn).unwrap();

        let order = builder.finish().creation_order().expect("should order");
        let pos = |name: &str| order.iter().position(|id| id.as_str() == name).expect(name);
        assert!(pos("Repository") < pos("Logs"));
        assert!(pos("Logs") < pos("Cluster"));
    }

    #[test]
    fn cycle_detection() {
        let mut builder = TopologyBuilder::new();
        let a = builder.add("A", ResourceKind::Cluster).unwrap();
        let b = builder.add("B", repository()).unwrap();
        builder.link(&a, &b, Relation::DependsOn).unwrap();
        builder.link(&b, &a, Relation::DependsOn).unwrap();

        let msg = builder.finish().creation_order().unwrap_err().to_string();
        assert!(msg.contains("cyclic"), "got: {msg}");
    }

    #[test]
    fn duplicate_concrete_id_is_rejected() {
        let mut builder = TopologyBuilder::new();
        let _ = builder.add("X", ResourceKind::Cluster).unwrap();
        let err = builder.add("X", repository()).unwrap_err();
        assert!(err.to_string().contains("duplicate resource id"));
    }

    #[test]
    fn identical_resource_added_twice_is_kept_once() {
        let mut builder = TopologyBuilder::new();
        let _ = builder.add("X", ResourceKind::Cluster).unwrap();
        let _ = builder.add("X", ResourceKind::Cluster).unwrap();
        assert_eq!(builder.finish().len(), 1);
    }

    #[test]
    fn link_to_unknown_resource_fails() {
        let mut builder = TopologyBuilder::new();
        let a = builder.add("A", ResourceKind::Cluster).unwrap();
        let err = builder
            .link(&a, &ResourceId::new("Missing"), Relation::AttachesTo)
            .unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn repeated_link_keeps_one_edge() {
        let mut builder = TopologyBuilder::new();
        let a = builder.add("A", ResourceKind::Cluster).unwrap();
        let b = builder.add("B", repository()).unwrap();
        builder.link(&a, &b, Relation::PullsFrom).unwrap();
        builder.link(&a, &b, Relation::PullsFrom).unwrap();
        builder.link(&a, &b, Relation::DependsOn).unwrap();
        let graph = builder.finish();
        assert_eq!(graph.edges().count(), 2);
        assert!(graph.has_edge(&a, &b, Relation::PullsFrom));
        assert!(!graph.has_edge(&b, &a, Relation::PullsFrom));
    }

    #[test]
    fn compose_unifies_imported_nodes() {
        let mut network = TopologyBuilder::new();
        let _ = network.add("Repository", repository()).unwrap();

        let mut service = TopologyBuilder::new();
        let repo = service.import("Repository", ImportedKind::Service, "Repository");
        let cluster = service.add("Cluster", ResourceKind::Cluster).unwrap();
        service.link(&cluster, &repo, Relation::PullsFrom).unwrap();

        let graph = TopologyGraph::compose([service.finish(), network.finish()]).unwrap();
        assert_eq!(graph.len(), 2);
        let repo_node = graph.get(&repo).expect("repository");
        assert!(!repo_node.kind.is_imported());
        assert!(graph.has_edge(&cluster, &repo, Relation::PullsFrom));
    }

    #[test]
    fn compose_rejects_conflicting_definitions() {
        let mut a = TopologyBuilder::new();
        let _ = a.add("Shared", ResourceKind::Cluster).unwrap();
        let mut b = TopologyBuilder::new();
        let _ = b.add("Shared", repository()).unwrap();
        assert!(TopologyGraph::compose([a.finish(), b.finish()]).is_err());
    }

    #[test]
    fn document_lists_resources_in_creation_order() {
        let mut builder = TopologyBuilder::new();
        let cluster = builder.add("Cluster", ResourceKind::Cluster).unwrap();
        let repo = builder.add("Repository", repository()).unwrap();
        builder.link(&cluster, &repo, Relation::DependsOn).unwrap();
        let graph = builder.finish();

        let doc = graph.to_document().unwrap();
        assert_eq!(doc.resources[0].id.as_str(), "Repository");
        assert_eq!(doc.edges.len(), 1);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["resources"][0]["resource"]["type"], "Repository");
        assert_eq!(
            json["resources"][0]["resource"]["properties"]["removalPolicy"],
            "Destroy"
        );
        assert_eq!(json["edges"][0]["relation"], "DependsOn");
    }

    #[test]
    fn targets_are_sorted() {
        let mut builder = TopologyBuilder::new();
        let svc = builder.add("Service", ResourceKind::Cluster).unwrap();
        let b = builder.import("SubnetB", ImportedKind::Subnet, "b");
        let a = builder.import("SubnetA", ImportedKind::Subnet, "a");
        builder.link(&svc, &b, Relation::AttachesTo).unwrap();
        builder.link(&svc, &a, Relation::AttachesTo).unwrap();
        let graph = builder.finish();
        let targets = graph.targets(&svc, Relation::AttachesTo);
        assert_eq!(targets, vec![&a, &b]);
    }
}

//! In-memory dependency graph backed by petgraph.
//!
//! Nodes live in a `DiGraph` with the declared version range as edge weight.
//! Lookups never scan the node list: node IDs, package names and repository
//! IDs each have a hash index of `NodeIndex` values, kept in insertion order.

use super::DependencyGraph;
use crate::domain::{DependencyEdge, DependencyNode, NodeId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Immutable-after-load dependency graph.
///
/// Built once with [`add_node`](Self::add_node) and
/// [`add_edge`](Self::add_edge), then shared behind an `Arc` for concurrent
/// reads.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    /// Edge direction: source (dependent) -> target (dependency)
    graph: DiGraph<DependencyNode, String>,

    node_map: HashMap<NodeId, NodeIndex>,

    package_index: HashMap<String, Vec<NodeIndex>>,

    repository_index: HashMap<String, Vec<NodeIndex>>,
}

impl InMemoryGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from complete node and edge lists.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate node ID or dangling edge.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = DependencyNode>,
        edges: impl IntoIterator<Item = DependencyEdge>,
    ) -> Result<Self> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Insert a node.
    ///
    /// # Errors
    ///
    /// Returns `Error::Graph` if a node with the same ID already exists.
    pub fn add_node(&mut self, node: DependencyNode) -> Result<()> {
        if self.node_map.contains_key(&node.id) {
            return Err(Error::Graph(format!("duplicate node ID: {}", node.id)));
        }

        let id = node.id.clone();
        let package_name = node.package_name.clone();
        let repository_id = node.repository_id.clone();

        let index = self.graph.add_node(node);
        self.node_map.insert(id, index);
        self.package_index
            .entry(package_name)
            .or_default()
            .push(index);
        self.repository_index
            .entry(repository_id)
            .or_default()
            .push(index);
        Ok(())
    }

    /// Insert an edge between two existing nodes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Graph` if either endpoint is unknown or the edge is a
    /// self-dependency.
    pub fn add_edge(&mut self, edge: DependencyEdge) -> Result<()> {
        if edge.from_node_id == edge.to_node_id {
            return Err(Error::Graph(format!(
                "node {} cannot depend on itself",
                edge.from_node_id
            )));
        }
        let from = self.index_of(&edge.from_node_id)?;
        let to = self.index_of(&edge.to_node_id)?;
        self.graph.add_edge(from, to, edge.version_range);
        Ok(())
    }

    /// Whether a node with this ID exists
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn index_of(&self, id: &NodeId) -> Result<NodeIndex> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| Error::Graph(format!("unknown node ID: {id}")))
    }

    fn to_edge(&self, edge: EdgeReference<'_, String>) -> DependencyEdge {
        DependencyEdge {
            from_node_id: self.graph[edge.source()].id.clone(),
            to_node_id: self.graph[edge.target()].id.clone(),
            version_range: edge.weight().clone(),
        }
    }

    fn edges_in_direction(&self, id: &NodeId, direction: Direction) -> Vec<DependencyEdge> {
        let Some(&index) = self.node_map.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, direction)
            .map(|e| self.to_edge(e))
            .collect();
        // petgraph yields the most recently added edge first
        edges.reverse();
        edges
    }
}

#[async_trait]
impl DependencyGraph for InMemoryGraph {
    async fn find_nodes_by_package_name(&self, package_name: &str) -> Result<Vec<DependencyNode>> {
        Ok(self
            .package_index
            .get(package_name)
            .map(|indices| indices.iter().map(|&i| self.graph[i].clone()).collect())
            .unwrap_or_default())
    }

    async fn find_dependents(&self, node_id: &NodeId) -> Result<Vec<DependencyEdge>> {
        Ok(self.edges_in_direction(node_id, Direction::Incoming))
    }

    async fn find_dependencies(&self, node_id: &NodeId) -> Result<Vec<DependencyEdge>> {
        Ok(self.edges_in_direction(node_id, Direction::Outgoing))
    }

    async fn get_node(&self, node_id: &NodeId) -> Result<Option<DependencyNode>> {
        Ok(self.node_map.get(node_id).map(|&i| self.graph[i].clone()))
    }

    async fn list_nodes(&self, repository_id: Option<&str>) -> Result<Vec<DependencyNode>> {
        let nodes = match repository_id {
            Some(repo) => self
                .repository_index
                .get(repo)
                .map(|indices| indices.iter().map(|&i| self.graph[i].clone()).collect())
                .unwrap_or_default(),
            None => self
                .graph
                .node_indices()
                .map(|i| self.graph[i].clone())
                .collect(),
        };
        Ok(nodes)
    }
}

//! Read-only access to the tracked dependency graph.
//!
//! The graph is populated by an external manifest-scanning pipeline; ripple
//! only queries it. The [`DependencyGraph`] trait is the query seam used by
//! the blast radius analyzer, and [`InMemoryGraph`] is the bundled
//! implementation, loaded from a JSONL snapshot via [`load_graph_from_jsonl`].
//!
//! # Edge Direction Convention
//!
//! Edges point from **dependent to dependency**: an edge `A -> B` means node A
//! depends on node B. The dependents of B are therefore the sources of B's
//! incoming edges.

use crate::domain::{DependencyEdge, DependencyNode, NodeId, NodeType};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod in_memory;
mod jsonl;

pub use in_memory::InMemoryGraph;
pub use jsonl::{load_graph_from_jsonl, GraphLoadWarning, GraphRecord};

/// Query interface over the dependency graph.
///
/// All methods are reads. Implementations must be `Send + Sync` so the
/// analyzer can issue queries for several packages concurrently.
#[async_trait]
pub trait DependencyGraph: Send + Sync {
    /// All nodes for `package_name`, one per repository it appears in.
    ///
    /// Order is stable; the analyzer reports the version of the first node.
    async fn find_nodes_by_package_name(&self, package_name: &str) -> Result<Vec<DependencyNode>>;

    /// Edges whose target is `node_id` (who depends on this node).
    ///
    /// Unknown node IDs yield an empty list.
    async fn find_dependents(&self, node_id: &NodeId) -> Result<Vec<DependencyEdge>>;

    /// Edges whose source is `node_id` (what this node depends on).
    async fn find_dependencies(&self, node_id: &NodeId) -> Result<Vec<DependencyEdge>>;

    /// Look up a single node.
    async fn get_node(&self, node_id: &NodeId) -> Result<Option<DependencyNode>>;

    /// All nodes, optionally restricted to one repository.
    async fn list_nodes(&self, repository_id: Option<&str>) -> Result<Vec<DependencyNode>>;
}

/// Node in a rendered graph view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphViewNode {
    /// Node ID
    pub id: NodeId,
    /// `package@version`
    pub label: String,
    /// Package name
    pub package_name: String,
    /// Version
    pub version: String,
    /// Direct or transitive
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Outdated flag
    pub is_outdated: bool,
    /// Vulnerability flag
    pub has_vulnerability: bool,
}

/// Edge in a rendered graph view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphViewEdge {
    /// Dependent node
    pub source: NodeId,
    /// Dependency node
    pub target: NodeId,
    /// Declared version range
    pub version_range: String,
}

/// Nodes and outgoing edges suitable for visualization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    /// Nodes
    pub nodes: Vec<GraphViewNode>,
    /// Edges leaving the listed nodes
    pub edges: Vec<GraphViewEdge>,
}

/// Build a view of the graph, optionally restricted to one repository.
///
/// Edges are the outgoing edges of the listed nodes; their targets may live
/// in other repositories.
pub async fn dependency_graph_view(
    graph: &dyn DependencyGraph,
    repository_id: Option<&str>,
) -> Result<GraphView> {
    let nodes = graph.list_nodes(repository_id).await?;

    let mut view = GraphView::default();
    for node in nodes {
        for edge in graph.find_dependencies(&node.id).await? {
            view.edges.push(GraphViewEdge {
                source: edge.from_node_id,
                target: edge.to_node_id,
                version_range: edge.version_range,
            });
        }
        view.nodes.push(GraphViewNode {
            label: node.label(),
            id: node.id,
            package_name: node.package_name,
            version: node.version,
            node_type: node.node_type,
            is_outdated: node.is_outdated,
            has_vulnerability: node.has_vulnerability,
        });
    }

    Ok(view)
}

// ========== Test Utilities ==========

/// A [`DependencyGraph`] whose store is unreachable.
///
/// Every query fails with `Error::Graph`, which lets callers exercise the
/// infrastructure-failure path of plan creation.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct FailingGraph;

#[cfg(any(test, feature = "test-util"))]
impl FailingGraph {
    fn unreachable<T>() -> Result<T> {
        Err(crate::error::Error::Graph(
            "graph store unreachable".to_string(),
        ))
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl DependencyGraph for FailingGraph {
    async fn find_nodes_by_package_name(&self, _package_name: &str) -> Result<Vec<DependencyNode>> {
        Self::unreachable()
    }

    async fn find_dependents(&self, _node_id: &NodeId) -> Result<Vec<DependencyEdge>> {
        Self::unreachable()
    }

    async fn find_dependencies(&self, _node_id: &NodeId) -> Result<Vec<DependencyEdge>> {
        Self::unreachable()
    }

    async fn get_node(&self, _node_id: &NodeId) -> Result<Option<DependencyNode>> {
        Self::unreachable()
    }

    async fn list_nodes(&self, _repository_id: Option<&str>) -> Result<Vec<DependencyNode>> {
        Self::unreachable()
    }
}

//! Loading the dependency graph from a JSONL snapshot.
//!
//! The ingestion pipeline writes one tagged record per line:
//!
//! ```text
//! {"kind":"node","id":"n1","repository_id":"repoA","package_name":"lodash","version":"4.17.15","type":"direct"}
//! {"kind":"edge","from_node_id":"n2","to_node_id":"n1","version_range":"^4.17.0"}
//! ```
//!
//! Records may appear in any order. Nodes are inserted first, then edges, so
//! an edge may precede the nodes it connects.

use super::InMemoryGraph;
use crate::domain::{DependencyEdge, DependencyNode, NodeId};
use crate::error::Result;
use crate::jsonl::read_jsonl_resilient;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One line of a graph snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GraphRecord {
    /// A dependency node
    Node(DependencyNode),
    /// A dependency edge
    Edge(DependencyEdge),
}

/// Non-fatal problems found while loading a graph snapshot.
///
/// The offending record is skipped; everything else is still loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphLoadWarning {
    /// Line could not be parsed as a graph record
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// A node ID appeared more than once; the first occurrence wins
    DuplicateNode {
        /// The repeated ID
        node_id: NodeId,
        /// Line of the skipped duplicate
        line_number: usize,
    },

    /// Edge refers to a node that is not in the snapshot, or to itself
    InvalidEdge {
        /// Dependent node
        from: NodeId,
        /// Dependency node
        to: NodeId,
        /// Line of the skipped edge
        line_number: usize,
    },
}

impl std::fmt::Display for GraphLoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed record: {error}")
            }
            Self::DuplicateNode {
                node_id,
                line_number,
            } => write!(f, "line {line_number}: duplicate node {node_id}"),
            Self::InvalidEdge {
                from,
                to,
                line_number,
            } => write!(f, "line {line_number}: invalid edge {from} -> {to}"),
        }
    }
}

/// Load a graph snapshot.
///
/// A missing file is an error; an empty file yields an empty graph.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read.
pub async fn load_graph_from_jsonl(path: &Path) -> Result<(InMemoryGraph, Vec<GraphLoadWarning>)> {
    let (records, malformed) = read_jsonl_resilient::<GraphRecord>(path).await?;

    let mut warnings: Vec<_> = malformed
        .into_iter()
        .map(|m| GraphLoadWarning::MalformedJson {
            line_number: m.line_number,
            error: m.error,
        })
        .collect();

    let mut graph = InMemoryGraph::new();
    let mut edges = Vec::new();

    for (line_number, record) in records {
        match record {
            GraphRecord::Node(node) => {
                if graph.contains_node(&node.id) {
                    warnings.push(GraphLoadWarning::DuplicateNode {
                        node_id: node.id,
                        line_number,
                    });
                    continue;
                }
                graph.add_node(node)?;
            }
            GraphRecord::Edge(edge) => edges.push((line_number, edge)),
        }
    }

    for (line_number, edge) in edges {
        let (from, to) = (edge.from_node_id.clone(), edge.to_node_id.clone());
        if graph.add_edge(edge).is_err() {
            warnings.push(GraphLoadWarning::InvalidEdge {
                from,
                to,
                line_number,
            });
        }
    }

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        warnings = warnings.len(),
        "Loaded dependency graph"
    );

    Ok((graph, warnings))
}

//! Dependency graph records and the blast radius result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Version reported by a blast radius when no node matched the package.
pub const UNKNOWN_VERSION: &str = "unknown";

string_id!(
    /// Unique identifier for a dependency node
    NodeId
);

/// Whether a repository declares the package itself or inherits it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Declared in the repository's own manifest
    Direct,

    /// Pulled in through another dependency
    Transitive,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Direct => write!(f, "direct"),
            NodeType::Transitive => write!(f, "transitive"),
        }
    }
}

/// One (repository, package) pairing seen in the tracked dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Unique node identifier
    pub id: NodeId,

    /// Repository the package version lives in
    pub repository_id: String,

    /// Package name
    pub package_name: String,

    /// Version recorded for this repository
    pub version: String,

    /// Direct or transitive dependency
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Whether a newer version is known to exist
    #[serde(default)]
    pub is_outdated: bool,

    /// Whether a known vulnerability affects this version
    #[serde(default)]
    pub has_vulnerability: bool,
}

impl DependencyNode {
    /// Display label used by graph views, e.g. `lodash@4.17.21`
    pub fn label(&self) -> String {
        format!("{}@{}", self.package_name, self.version)
    }
}

/// A directed edge: `from_node_id` depends on `to_node_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The dependent node
    pub from_node_id: NodeId,

    /// The node being depended upon
    pub to_node_id: NodeId,

    /// Version constraint as declared, kept opaque
    #[serde(default)]
    pub version_range: String,
}

/// Risk classification of a package change, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Few repositories and dependents
    Low,
    /// More than 5 repositories or 10 dependents
    Medium,
    /// More than 10 repositories or 20 dependents
    High,
    /// More than 20 repositories or 50 dependents
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Size estimate attached to a blast radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedImpact {
    /// Number of distinct affected repositories
    pub repository_count: usize,

    /// Number of distinct direct dependent packages
    pub downstream_dependency_count: usize,

    /// Effort score in `1..=10`
    pub update_complexity: u8,
}

/// Repositories and packages impacted by changing one package.
///
/// Computed on demand and never persisted. Sets are ordered so that output
/// is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastRadiusResult {
    /// The analyzed package
    pub package_name: String,

    /// Version of the first matching node, or [`UNKNOWN_VERSION`]
    pub version: String,

    /// Repositories containing the package or one of its direct dependents
    pub affected_repositories: BTreeSet<String>,

    /// Packages that directly depend on the analyzed package
    pub dependent_packages: BTreeSet<String>,

    /// Risk classification
    pub risk_level: RiskLevel,

    /// Size estimate
    pub estimated_impact: EstimatedImpact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_node_deserializes_type_field() {
        let json = r#"{"id":"n1","repository_id":"repoA","package_name":"lodash","version":"4.17.15","type":"direct"}"#;
        let node: DependencyNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type, NodeType::Direct);
        assert!(!node.is_outdated);
        assert_eq!(node.label(), "lodash@4.17.15");
    }

    #[test]
    fn test_risk_level_serializes_uppercase() {
        let json = serde_json::to_string(&RiskLevel::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }
}

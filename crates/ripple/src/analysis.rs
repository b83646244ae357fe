//! Blast radius analysis.
//!
//! Given a package name, find every repository that contains the package and
//! every package that directly depends on it, then classify how risky a
//! change to the package is. Traversal is one hop: dependents of dependents
//! are not followed.
//!
//! Analysis is read-only and has no side effects, so any number of analyses
//! may run concurrently against the same graph.

use crate::domain::{BlastRadiusResult, EstimatedImpact, RiskLevel, UNKNOWN_VERSION};
use crate::error::Result;
use crate::graph::DependencyGraph;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Computes blast radius results from a [`DependencyGraph`].
#[derive(Clone)]
pub struct BlastRadiusAnalyzer {
    graph: Arc<dyn DependencyGraph>,
}

impl BlastRadiusAnalyzer {
    /// Create an analyzer over `graph`
    pub fn new(graph: Arc<dyn DependencyGraph>) -> Self {
        Self { graph }
    }

    /// The graph this analyzer reads
    pub fn graph(&self) -> &Arc<dyn DependencyGraph> {
        &self.graph
    }

    /// Analyze the impact of changing `package_name`.
    ///
    /// `new_version` is informational only and never affects the result. A
    /// package with no matching nodes is not an error: the result has empty
    /// sets, [`RiskLevel::Low`], complexity 1 and version `"unknown"`.
    ///
    /// # Errors
    ///
    /// Propagates any error from the graph store.
    pub async fn analyze(
        &self,
        package_name: &str,
        new_version: Option<&str>,
    ) -> Result<BlastRadiusResult> {
        let nodes = self.graph.find_nodes_by_package_name(package_name).await?;

        let mut affected_repositories = BTreeSet::new();
        let mut dependent_packages = BTreeSet::new();

        for node in &nodes {
            affected_repositories.insert(node.repository_id.clone());

            for edge in self.graph.find_dependents(&node.id).await? {
                // Edges are validated on load; a vanished source is skipped
                let Some(dependent) = self.graph.get_node(&edge.from_node_id).await? else {
                    continue;
                };
                dependent_packages.insert(dependent.package_name);
                affected_repositories.insert(dependent.repository_id);
            }
        }

        let repository_count = affected_repositories.len();
        let downstream_dependency_count = dependent_packages.len();
        let risk_level = classify_risk(repository_count, downstream_dependency_count);
        let version = nodes
            .first()
            .map_or_else(|| UNKNOWN_VERSION.to_string(), |n| n.version.clone());

        debug!(
            package = package_name,
            new_version = new_version.unwrap_or("-"),
            repository_count,
            downstream_dependency_count,
            %risk_level,
            "Computed blast radius"
        );

        Ok(BlastRadiusResult {
            package_name: package_name.to_string(),
            version,
            affected_repositories,
            dependent_packages,
            risk_level,
            estimated_impact: EstimatedImpact {
                repository_count,
                downstream_dependency_count,
                update_complexity: update_complexity(repository_count, downstream_dependency_count),
            },
        })
    }
}

/// Classify risk from the two impact counts. The first matching rule wins:
///
/// | Level    | Repositories | or | Dependents |
/// |----------|--------------|----|------------|
/// | CRITICAL | > 20         |    | > 50       |
/// | HIGH     | > 10         |    | > 20       |
/// | MEDIUM   | > 5          |    | > 10       |
/// | LOW      | otherwise    |    |            |
pub fn classify_risk(repository_count: usize, downstream_dependency_count: usize) -> RiskLevel {
    match (repository_count, downstream_dependency_count) {
        (r, d) if r > 20 || d > 50 => RiskLevel::Critical,
        (r, d) if r > 10 || d > 20 => RiskLevel::High,
        (r, d) if r > 5 || d > 10 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Effort score: `ceil((repositories + dependents / 5) / 3)` clamped to
/// `1..=10`, with real-valued division.
pub fn update_complexity(repository_count: usize, downstream_dependency_count: usize) -> u8 {
    // Integer form of the same formula: ceil((5r + d) / 15)
    let weighted = repository_count
        .saturating_mul(5)
        .saturating_add(downstream_dependency_count);
    let score = weighted.div_ceil(15).clamp(1, 10);
    u8::try_from(score).unwrap_or(10)
}

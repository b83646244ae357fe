//! Update plan construction.
//!
//! A plan's scope is the union of the repositories the operator asked for and
//! every repository the blast radius analysis discovers for each package
//! update. Analysis only ever widens the scope. One execution unit is then
//! created for every (repository, package update) pair.

use crate::analysis::BlastRadiusAnalyzer;
use crate::domain::{
    BlastRadiusResult, NewExecution, NewPlan, PackageUpdate, PlanRequest, UpdatePlan,
    DEFAULT_ROLLBACK_PLAN, DEFAULT_TEST_STRATEGY,
};
use crate::error::Result;
use crate::storage::PlanStorage;
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::info;

/// Builds and stores update plans.
#[derive(Clone)]
pub struct UpdatePlanner {
    analyzer: BlastRadiusAnalyzer,
    storage: Arc<dyn PlanStorage>,
}

impl UpdatePlanner {
    /// Create a planner
    pub fn new(analyzer: BlastRadiusAnalyzer, storage: Arc<dyn PlanStorage>) -> Self {
        Self { analyzer, storage }
    }

    /// Validate `request`, resolve its scope and store the plan with all of
    /// its units.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for malformed input; nothing is written
    /// - Graph and storage errors are propagated unmodified, and no plan is
    ///   left behind
    pub async fn create_plan(&self, request: PlanRequest) -> Result<UpdatePlan> {
        request.validate()?;

        let blast_radii = try_join_all(
            request
                .package_updates
                .iter()
                .map(|update| self.analyzer.analyze(&update.package_name, Some(&update.to_version))),
        )
        .await?;

        let affected_repos = resolve_scope(&request.repository_ids, &blast_radii);
        let units = materialize_units(&affected_repos, &request.package_updates);

        let new_plan = NewPlan {
            title: request.title,
            description: request.description,
            priority: request.priority.unwrap_or_default(),
            affected_repos,
            package_updates: request.package_updates,
            test_strategy: request
                .test_strategy
                .unwrap_or_else(|| DEFAULT_TEST_STRATEGY.to_string()),
            rollback_plan: request
                .rollback_plan
                .unwrap_or_else(|| DEFAULT_ROLLBACK_PLAN.to_string()),
            units,
        };
        let unit_count = new_plan.units.len();

        let plan = self.storage.create_plan(new_plan).await?;

        info!(
            plan_id = %plan.id,
            repositories = plan.affected_repos.len(),
            packages = plan.package_updates.len(),
            units = unit_count,
            priority = %plan.priority,
            "Created update plan"
        );

        Ok(plan)
    }
}

/// Requested repositories first, in request order, then the repositories
/// discovered by analysis in sorted order. Duplicates are dropped.
pub fn resolve_scope(requested: &[String], blast_radii: &[BlastRadiusResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut scope: Vec<String> = requested
        .iter()
        .filter(|repo| seen.insert(repo.as_str()))
        .cloned()
        .collect();

    let discovered: BTreeSet<&str> = blast_radii
        .iter()
        .flat_map(|radius| radius.affected_repositories.iter().map(String::as_str))
        .filter(|repo| !seen.contains(repo))
        .collect();

    scope.extend(discovered.into_iter().map(str::to_string));
    scope
}

/// One unit per repository and update, repository-major.
pub fn materialize_units(repositories: &[String], updates: &[PackageUpdate]) -> Vec<NewExecution> {
    repositories
        .iter()
        .flat_map(|repository_id| {
            updates.iter().map(move |update| NewExecution {
                repository_id: repository_id.clone(),
                update: update.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DependencyEdge, DependencyNode, NodeId, NodeType, PlanFilter, PlanStatus, Priority,
    };
    use crate::error::Error;
    use crate::graph::{FailingGraph, InMemoryGraph};
    use crate::storage::in_memory::new_in_memory_storage;

    fn node(id: &str, repo: &str, package: &str) -> DependencyNode {
        DependencyNode {
            id: NodeId::new(id),
            repository_id: repo.to_string(),
            package_name: package.to_string(),
            version: "4.17.15".to_string(),
            node_type: NodeType::Direct,
            is_outdated: true,
            has_vulnerability: true,
        }
    }

    fn lodash_graph() -> InMemoryGraph {
        // lodash lives in repoA; repoB's web package depends on it
        InMemoryGraph::from_parts(
            vec![node("lodash-a", "repoA", "lodash"), node("web-b", "repoB", "web")],
            vec![DependencyEdge {
                from_node_id: NodeId::new("web-b"),
                to_node_id: NodeId::new("lodash-a"),
                version_range: "^4.17.0".to_string(),
            }],
        )
        .unwrap()
    }

    fn planner(graph: Arc<dyn crate::graph::DependencyGraph>) -> (UpdatePlanner, Arc<dyn PlanStorage>) {
        let storage = new_in_memory_storage("plan".to_string());
        let planner = UpdatePlanner::new(BlastRadiusAnalyzer::new(graph), Arc::clone(&storage));
        (planner, storage)
    }

    fn lodash_request(repos: &[&str]) -> PlanRequest {
        PlanRequest {
            title: "Patch lodash".to_string(),
            package_updates: vec![PackageUpdate::new("lodash", "4.17.15", "4.17.21")],
            repository_ids: repos.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_scope_widened_by_analysis() {
        let (planner, storage) = planner(Arc::new(lodash_graph()));

        let plan = planner.create_plan(lodash_request(&["repoA"])).await.unwrap();

        assert_eq!(plan.affected_repos, vec!["repoA", "repoB"]);
        assert_eq!(plan.status, PlanStatus::Planned);
        assert_eq!(plan.priority, Priority::Medium);
        assert_eq!(plan.test_strategy, DEFAULT_TEST_STRATEGY);
        assert_eq!(plan.rollback_plan, DEFAULT_ROLLBACK_PLAN);

        let units = storage.get_executions(&plan.id).await.unwrap();
        let repos: Vec<_> = units.iter().map(|u| u.repository_id.as_str()).collect();
        assert_eq!(repos, vec!["repoA", "repoB"]);
        assert!(units.iter().all(|u| u.to_version == "4.17.21"));
    }

    #[tokio::test]
    async fn test_requested_repos_kept_even_if_unrelated() {
        let (planner, storage) = planner(Arc::new(lodash_graph()));
        let mut request = lodash_request(&["repoZ", "repoA", "repoZ"]);
        request
            .package_updates
            .push(PackageUpdate::new("react", "17.0.0", "18.0.0"));

        let plan = planner.create_plan(request).await.unwrap();

        assert_eq!(plan.affected_repos, vec!["repoZ", "repoA", "repoB"]);
        let units = storage.get_executions(&plan.id).await.unwrap();
        assert_eq!(units.len(), 3 * 2);
        assert_eq!(
            (units[0].repository_id.as_str(), units[0].package_name.as_str()),
            ("repoZ", "lodash")
        );
        assert_eq!(
            (units[1].repository_id.as_str(), units[1].package_name.as_str()),
            ("repoZ", "react")
        );
    }

    #[tokio::test]
    async fn test_nothing_affected_gives_empty_plan() {
        let (planner, storage) = planner(Arc::new(InMemoryGraph::new()));
        let plan = planner.create_plan(lodash_request(&[])).await.unwrap();
        assert!(plan.affected_repos.is_empty());
        assert!(storage.get_executions(&plan.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_writes_nothing() {
        let (planner, storage) = planner(Arc::new(lodash_graph()));
        let mut request = lodash_request(&["repoA"]);
        request.title = "  ".to_string();

        let result = planner.create_plan(request).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(storage
            .list_plans(&PlanFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_graph_failure_aborts_creation() {
        let (planner, storage) = planner(Arc::new(FailingGraph));

        let result = planner.create_plan(lodash_request(&["repoA"])).await;
        assert!(matches!(result, Err(Error::Graph(_))));
        assert!(storage
            .list_plans(&PlanFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_materialize_units_is_repository_major() {
        let repos = vec!["r1".to_string(), "r2".to_string()];
        let updates = vec![
            PackageUpdate::new("a", "1", "2"),
            PackageUpdate::new("b", "1", "2"),
        ];
        let units = materialize_units(&repos, &updates);
        let pairs: Vec<_> = units
            .iter()
            .map(|u| (u.repository_id.as_str(), u.update.package_name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("r1", "a"), ("r1", "b"), ("r2", "a"), ("r2", "b")]);
    }
}

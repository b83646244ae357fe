//! Property tests for risk scoring and plan scoping.

use proptest::prelude::*;
use ripple::analysis::{classify_risk, update_complexity};
use ripple::domain::{
    DependencyEdge, DependencyNode, ExecutionStatus, NodeId, NodeType, PackageUpdate, PlanRequest,
    PlanStatus,
};
use ripple::executor::DryRunDelegate;
use ripple::graph::InMemoryGraph;
use ripple::planner::materialize_units;
use ripple::service::Orchestrator;
use ripple::storage::in_memory::new_in_memory_storage;
use std::collections::HashSet;
use std::sync::Arc;

fn node(id: String, repo: String, package: &str) -> DependencyNode {
    DependencyNode {
        id: NodeId::new(id),
        repository_id: repo,
        package_name: package.to_string(),
        version: "1.0.0".to_string(),
        node_type: NodeType::Direct,
        is_outdated: false,
        has_vulnerability: false,
    }
}

/// `lodash` lives in `repo0`; dependent `i` lives in `repo{dependent_repos[i]}`.
fn graph_with_dependents(dependent_repos: &[u8]) -> InMemoryGraph {
    let mut graph = InMemoryGraph::new();
    graph
        .add_node(node("lodash".to_string(), "repo0".to_string(), "lodash"))
        .unwrap();
    for (i, repo) in dependent_repos.iter().enumerate() {
        let id = format!("dep{i}");
        graph
            .add_node(node(id.clone(), format!("repo{repo}"), &format!("pkg{i}")))
            .unwrap();
        graph
            .add_edge(DependencyEdge {
                from_node_id: NodeId::new(id),
                to_node_id: NodeId::new("lodash"),
                version_range: "*".to_string(),
            })
            .unwrap();
    }
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn complexity_always_in_range(repos in 0usize..100_000, deps in 0usize..100_000) {
        let score = update_complexity(repos, deps);
        prop_assert!((1..=10).contains(&score));
    }

    #[test]
    fn complexity_handles_extreme_counts(repos in any::<usize>(), deps in any::<usize>()) {
        prop_assert!((1..=10).contains(&update_complexity(repos, deps)));
    }

    #[test]
    fn risk_and_complexity_are_monotonic(
        repos in 0usize..200,
        deps in 0usize..200,
        more_repos in 0usize..50,
        more_deps in 0usize..50,
    ) {
        prop_assert!(classify_risk(repos, deps) <= classify_risk(repos + more_repos, deps + more_deps));
        prop_assert!(update_complexity(repos, deps) <= update_complexity(repos + more_repos, deps + more_deps));
    }

    #[test]
    fn unit_count_is_repositories_times_updates(
        repos in prop::collection::vec("[a-z]{1,8}", 0..10),
        updates in 0usize..5,
    ) {
        let updates: Vec<PackageUpdate> = (0..updates)
            .map(|i| PackageUpdate::new(format!("pkg{i}"), "1.0.0", "2.0.0"))
            .collect();
        let units = materialize_units(&repos, &updates);
        prop_assert_eq!(units.len(), repos.len() * updates.len());
    }

    #[test]
    fn plan_scope_covers_request_and_blast_radius(
        dependent_repos in prop::collection::vec(0u8..8, 0..12),
        requested in prop::collection::vec(0u8..8, 0..6),
        extra_updates in 0usize..3,
    ) {
        let orchestrator = Orchestrator::new(
            Arc::new(graph_with_dependents(&dependent_repos)),
            new_in_memory_storage("prop".to_string()),
            Arc::new(DryRunDelegate::new()),
        );

        let mut package_updates = vec![PackageUpdate::new("lodash", "4.17.15", "4.17.21")];
        package_updates.extend(
            (0..extra_updates).map(|i| PackageUpdate::new(format!("unknown{i}"), "1.0", "1.1")),
        );
        let requested: Vec<String> = requested.iter().map(|r| format!("repo{r}")).collect();

        let (radius, details) = tokio_test::block_on(async {
            let radius = orchestrator.analyze("lodash", None).await.unwrap();
            let plan_id = orchestrator
                .create_plan(PlanRequest {
                    title: "Property plan".to_string(),
                    package_updates: package_updates.clone(),
                    repository_ids: requested.clone(),
                    ..Default::default()
                })
                .await
                .unwrap();
            (radius, orchestrator.get_plan(&plan_id).await.unwrap())
        });
        let scope = &details.plan.affected_repos;

        let unique: HashSet<&String> = scope.iter().collect();
        prop_assert_eq!(unique.len(), scope.len());
        for repo in requested.iter().chain(radius.affected_repositories.iter()) {
            prop_assert!(unique.contains(repo), "{} missing from scope", repo);
        }

        // Requested repositories keep their order at the front
        let mut seen = HashSet::new();
        let requested_unique: Vec<&String> =
            requested.iter().filter(|r| seen.insert(r.as_str())).collect();
        prop_assert_eq!(
            scope.iter().take(requested_unique.len()).collect::<Vec<_>>(),
            requested_unique
        );

        prop_assert_eq!(details.plan.status, PlanStatus::Planned);
        prop_assert_eq!(details.executions.len(), scope.len() * package_updates.len());
        prop_assert!(details.executions.iter().all(|u| u.status == ExecutionStatus::Pending));
    }
}

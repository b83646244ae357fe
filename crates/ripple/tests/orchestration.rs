//! End-to-end tests for planning and executing rollouts against a workspace
//! on disk.
//!
//! Each test initializes a workspace in a temporary directory, writes a graph
//! snapshot, and drives the orchestrator through the library API.

use ripple::app::App;
use ripple::commands::init::{self, DelegateKind, RippleConfig, CONFIG_FILE_NAME};
use ripple::domain::{
    ExecutionStatus, PackageUpdate, PlanDetails, PlanId, PlanRequest, PlanStatus, Priority,
};
use ripple::executor::DryRunDelegate;
use ripple::graph::load_graph_from_jsonl;
use ripple::service::Orchestrator;
use ripple::storage::{create_storage, StorageBackend};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

mod common;
use common::{write_graph, GRAPH_FIXTURE};

async fn workspace() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    init::init(temp.path(), Some("test")).await.unwrap();
    write_graph(temp.path(), GRAPH_FIXTURE);
    temp
}

fn lodash_request(repos: &[&str]) -> PlanRequest {
    PlanRequest {
        title: "Bump lodash".to_string(),
        package_updates: vec![PackageUpdate::new("lodash", "4.17.15", "4.17.21")],
        repository_ids: repos.iter().map(|r| r.to_string()).collect(),
        ..Default::default()
    }
}

/// Poll until the plan reaches a terminal status.
async fn wait_for_terminal(orchestrator: &Orchestrator, plan_id: &PlanId) -> PlanDetails {
    for _ in 0..200 {
        let details = orchestrator.get_plan(plan_id).await.unwrap();
        if details.plan.status.is_terminal() {
            return details;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("plan {plan_id} did not finish");
}

#[tokio::test]
async fn test_blast_radius_from_snapshot() {
    let temp = workspace().await;
    let app = App::from_directory(temp.path()).await.unwrap();

    let radius = app
        .orchestrator()
        .analyze("lodash", Some("4.17.21"))
        .await
        .unwrap();

    assert_eq!(radius.version, "4.17.15");
    assert_eq!(
        radius.affected_repositories.iter().collect::<Vec<_>>(),
        vec!["repoA", "repoB", "repoC"]
    );
    assert_eq!(
        radius.dependent_packages.iter().collect::<Vec<_>>(),
        vec!["admin", "app"]
    );
    assert_eq!(radius.estimated_impact.update_complexity, 2);
}

#[tokio::test]
async fn test_plan_scope_grows_to_blast_radius_and_persists() {
    let temp = workspace().await;
    let app = App::from_directory(temp.path()).await.unwrap();
    let orchestrator = app.orchestrator();

    let plan_id = orchestrator
        .create_plan(lodash_request(&["repoA"]))
        .await
        .unwrap();
    assert!(plan_id.as_str().starts_with("test-"));

    let details = orchestrator.get_plan(&plan_id).await.unwrap();
    assert_eq!(details.plan.affected_repos, vec!["repoA", "repoB", "repoC"]);
    assert_eq!(details.plan.priority, Priority::Medium);
    assert_eq!(details.summary.total, 3);
    assert_eq!(details.summary.pending, 3);

    let handle = orchestrator.execute_plan(plan_id.clone());
    let finished = wait_for_terminal(orchestrator, &plan_id).await;
    assert_eq!(handle.await.unwrap().unwrap(), PlanStatus::Completed);
    assert_eq!(finished.plan.status, PlanStatus::Completed);
    assert_eq!(finished.summary.succeeded, 3);

    // A fresh process sees the same state
    let reopened = App::from_directory(temp.path()).await.unwrap();
    let details = reopened.orchestrator().get_plan(&plan_id).await.unwrap();
    assert_eq!(details.plan.status, PlanStatus::Completed);
    assert!(details.plan.started_at.is_some());
    assert!(details.plan.completed_at.is_some());
    assert!(details.executions.iter().all(|u| {
        u.status == ExecutionStatus::Success
            && u.logs.as_deref() == Some("Updated lodash from 4.17.15 to 4.17.21")
    }));
}

#[tokio::test]
async fn test_partial_failure_is_recorded_and_reported() {
    let temp = workspace().await;
    let root = temp.path();
    let plans_path = root.join(".ripple").join("plans.jsonl");

    let (graph, warnings) = load_graph_from_jsonl(&root.join(".ripple").join("graph.jsonl"))
        .await
        .unwrap();
    assert!(warnings.is_empty());

    let storage = create_storage(StorageBackend::Jsonl(plans_path.clone()), "test".to_string())
        .await
        .unwrap();
    let orchestrator = Orchestrator::new(
        Arc::new(graph),
        storage,
        Arc::new(DryRunDelegate::new().failing_on("repoB", "lodash")),
    );

    let plan_id = orchestrator
        .create_plan(PlanRequest {
            title: "Spring cleanup".to_string(),
            package_updates: vec![
                PackageUpdate::new("lodash", "4.17.15", "4.17.21"),
                PackageUpdate::new("axios", "0.21.0", "1.6.0"),
            ],
            priority: Some(Priority::High),
            ..Default::default()
        })
        .await
        .unwrap();

    let status = orchestrator.execute_plan_and_wait(&plan_id).await.unwrap();
    assert_eq!(status, PlanStatus::Failed);

    let details = orchestrator.get_plan(&plan_id).await.unwrap();
    assert_eq!(
        details.plan.affected_repos,
        vec!["repoA", "repoB", "repoC", "repoD"]
    );
    assert_eq!(details.summary.total, 8);
    assert_eq!(details.summary.failed, 1);
    assert_eq!(details.summary.succeeded, 7);
    assert_eq!(details.failed_pairs(), vec![("repoB", "lodash")]);

    // Repository-major: both of repoA's units come before repoB's
    let order: Vec<(&str, &str)> = details
        .executions
        .iter()
        .take(3)
        .map(|u| (u.repository_id.as_str(), u.package_name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("repoA", "lodash"), ("repoA", "axios"), ("repoB", "lodash")]
    );

    let reopened = create_storage(StorageBackend::Jsonl(plans_path), "test".to_string())
        .await
        .unwrap();
    let plan = reopened.get_plan(&plan_id).await.unwrap().unwrap();
    assert_eq!(plan.status, PlanStatus::Failed);
    let failed: Vec<_> = reopened
        .get_executions(&plan_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|u| u.status == ExecutionStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].logs.as_deref().is_some_and(|l| l.contains("repoB")));
}

#[tokio::test]
async fn test_rejected_request_writes_nothing() {
    let temp = workspace().await;
    let app = App::from_directory(temp.path()).await.unwrap();

    let result = app
        .orchestrator()
        .create_plan(PlanRequest {
            title: "No packages".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(ripple::error::Error::Validation(_))));

    let reopened = App::from_directory(temp.path()).await.unwrap();
    assert!(reopened.orchestrator().list_plans(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_plans_by_status() {
    let temp = workspace().await;
    let app = App::from_directory(temp.path()).await.unwrap();
    let orchestrator = app.orchestrator();

    let first = orchestrator
        .create_plan(lodash_request(&[]))
        .await
        .unwrap();
    let second = orchestrator
        .create_plan(lodash_request(&["repoZ"]))
        .await
        .unwrap();
    orchestrator.execute_plan_and_wait(&first).await.unwrap();

    let all = orchestrator.list_plans(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let planned = orchestrator
        .list_plans(Some(PlanStatus::Planned))
        .await
        .unwrap();
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].id, second);
    assert_eq!(planned[0].affected_repos[0], "repoZ");

    let completed = orchestrator
        .list_plans(Some(PlanStatus::Completed))
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, first);
}

async fn use_command_delegate(root: &Path, command: &[&str]) {
    let config_path = root.join(".ripple").join(CONFIG_FILE_NAME);
    let mut config = RippleConfig::load(&config_path).await.unwrap();
    config.delegate.kind = DelegateKind::Command;
    config.delegate.command = command.iter().map(|s| s.to_string()).collect();
    config.delegate.timeout_secs = 30;
    config.save(&config_path).await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_configured_command_delegate() {
    let temp = workspace().await;
    use_command_delegate(
        temp.path(),
        &[
            "sh",
            "-c",
            "echo \"$RIPPLE_PACKAGE@$RIPPLE_TO_VERSION in $RIPPLE_REPOSITORY\"; test \"$RIPPLE_REPOSITORY\" != repoC",
        ],
    )
    .await;

    let app = App::from_directory(temp.path()).await.unwrap();
    let orchestrator = app.orchestrator();
    let plan_id = orchestrator
        .create_plan(lodash_request(&[]))
        .await
        .unwrap();

    let status = orchestrator.execute_plan_and_wait(&plan_id).await.unwrap();
    assert_eq!(status, PlanStatus::Failed);

    let details = orchestrator.get_plan(&plan_id).await.unwrap();
    assert_eq!(details.failed_pairs(), vec![("repoC", "lodash")]);
    let first_log = details.executions[0].logs.as_deref().unwrap();
    assert_eq!(first_log.trim(), "lodash@4.17.21 in repoA");
}

#[tokio::test]
async fn test_command_delegate_without_command_is_rejected() {
    let temp = workspace().await;
    use_command_delegate(temp.path(), &[]).await;

    let err = App::from_directory(temp.path()).await.unwrap_err();
    assert!(err.to_string().contains("delegate.command"));
}

//! Plan execution.
//!
//! [`UpdateExecutor::execute`] drives one plan from `PLANNED` to a terminal
//! status:
//!
//! ```text
//! PLANNED --start_plan--> IN_PROGRESS --aggregate--> COMPLETED | FAILED
//!
//! per unit, strictly one at a time in sequence order:
//! PENDING --> RUNNING --> SUCCESS | FAILED
//! ```
//!
//! A failing unit never stops the remaining units. The final plan status is
//! computed from a fresh read of every unit, never from counters kept along
//! the way.

mod delegate;

pub use delegate::{
    CommandDelegate, DelegateError, DelegateOutcome, DryRunDelegate, ExecutionDelegate,
    ENV_FROM_VERSION, ENV_PACKAGE, ENV_REPOSITORY, ENV_TO_VERSION,
};

use crate::domain::{aggregate_status, ExecutionStatus, PlanId, PlanStatus, UpdateExecution};
use crate::error::{Error, Result};
use crate::storage::PlanStorage;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives plans to completion through an [`ExecutionDelegate`].
#[derive(Clone)]
pub struct UpdateExecutor {
    storage: Arc<dyn PlanStorage>,
    delegate: Arc<dyn ExecutionDelegate>,
}

impl UpdateExecutor {
    /// Create an executor
    pub fn new(storage: Arc<dyn PlanStorage>, delegate: Arc<dyn ExecutionDelegate>) -> Self {
        Self { storage, delegate }
    }

    /// Execute a plan and return its resulting status.
    ///
    /// Only a `PLANNED` plan is executed. For a plan that is already in
    /// progress or finished this is a no-op returning the current status, so
    /// concurrent or repeated calls run the units at most once.
    ///
    /// # Errors
    ///
    /// - `Error::PlanNotFound` if the plan doesn't exist
    /// - Storage errors are propagated; the plan then stays `IN_PROGRESS`
    ///   with its remaining units `PENDING`
    pub async fn execute(&self, plan_id: &PlanId) -> Result<PlanStatus> {
        let plan = self
            .storage
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| Error::PlanNotFound(plan_id.clone()))?;

        if !self.storage.start_plan(plan_id, Utc::now()).await? {
            debug!(plan_id = %plan_id, status = %plan.status, "Plan already started, skipping");
            return Ok(self
                .storage
                .get_plan(plan_id)
                .await?
                .map_or(plan.status, |p| p.status));
        }

        info!(plan_id = %plan_id, title = %plan.title, "Executing update plan");

        for unit in self.storage.get_executions(plan_id).await? {
            if unit.status == ExecutionStatus::Pending {
                self.run_unit(&unit).await?;
            }
        }

        let units = self.storage.get_executions(plan_id).await?;
        let status = aggregate_status(&units).ok_or_else(|| Error::UnfinishedUnits {
            plan_id: plan_id.clone(),
            unfinished: units.iter().filter(|u| !u.status.is_terminal()).count(),
        })?;

        self.storage.finish_plan(plan_id, status, Utc::now()).await?;

        let failed = units
            .iter()
            .filter(|u| u.status == ExecutionStatus::Failed)
            .count();
        info!(
            plan_id = %plan_id,
            %status,
            units = units.len(),
            failed,
            "Update plan finished"
        );

        Ok(status)
    }

    async fn run_unit(&self, unit: &UpdateExecution) -> Result<()> {
        if !self.storage.start_execution(&unit.id, Utc::now()).await? {
            return Ok(());
        }

        debug!(
            unit = %unit.id,
            repository = %unit.repository_id,
            package = %unit.package_name,
            "Applying update"
        );

        let (status, log) = match self.delegate.apply(unit).await {
            Ok(outcome) if outcome.succeeded => (ExecutionStatus::Success, outcome.log),
            Ok(outcome) => (ExecutionStatus::Failed, outcome.log),
            Err(e) => (ExecutionStatus::Failed, e.to_string()),
        };

        if status == ExecutionStatus::Failed {
            warn!(
                unit = %unit.id,
                repository = %unit.repository_id,
                package = %unit.package_name,
                log = %log,
                "Update failed"
            );
        }

        self.storage
            .finish_execution(&unit.id, status, log, Utc::now())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewExecution, NewPlan, PackageUpdate, Priority};
    use crate::storage::in_memory::new_in_memory_storage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn stored_plan(storage: &Arc<dyn PlanStorage>, repos: &[&str]) -> PlanId {
        let update = PackageUpdate::new("lodash", "4.17.15", "4.17.21");
        let plan = storage
            .create_plan(NewPlan {
                title: "Bump lodash".to_string(),
                description: None,
                priority: Priority::Medium,
                affected_repos: repos.iter().map(|r| r.to_string()).collect(),
                package_updates: vec![update.clone()],
                test_strategy: "ci".to_string(),
                rollback_plan: "revert".to_string(),
                units: repos
                    .iter()
                    .map(|r| NewExecution {
                        repository_id: r.to_string(),
                        update: update.clone(),
                    })
                    .collect(),
            })
            .await
            .unwrap();
        plan.id
    }

    /// Counts calls and asserts no other unit of the plan is running.
    struct ObservingDelegate {
        storage: Arc<dyn PlanStorage>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExecutionDelegate for ObservingDelegate {
        async fn apply(&self, unit: &UpdateExecution) -> std::result::Result<DelegateOutcome, DelegateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self
                .storage
                .get_executions(&unit.plan_id)
                .await
                .map_err(|e| DelegateError::Other(e.to_string()))?
                .iter()
                .filter(|u| u.status == ExecutionStatus::Running)
                .count();
            assert_eq!(running, 1);
            Ok(DelegateOutcome::success("ok"))
        }
    }

    /// Errors instead of reporting an outcome
    struct BrokenDelegate;

    #[async_trait]
    impl ExecutionDelegate for BrokenDelegate {
        async fn apply(&self, _unit: &UpdateExecution) -> std::result::Result<DelegateOutcome, DelegateError> {
            Err(DelegateError::Other("network unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_unit_does_not_stop_the_rest() {
        let storage = new_in_memory_storage("plan".to_string());
        let plan_id = stored_plan(&storage, &["repoA", "repoB", "repoC"]).await;
        let executor = UpdateExecutor::new(
            Arc::clone(&storage),
            Arc::new(DryRunDelegate::new().failing_on("repoB", "lodash")),
        );

        let status = executor.execute(&plan_id).await.unwrap();
        assert_eq!(status, PlanStatus::Failed);

        let units = storage.get_executions(&plan_id).await.unwrap();
        let statuses: Vec<_> = units.iter().map(|u| u.status).collect();
        assert_eq!(
            statuses,
            vec![
                ExecutionStatus::Success,
                ExecutionStatus::Failed,
                ExecutionStatus::Success
            ]
        );
        assert!(units[1].logs.as_deref().is_some_and(|l| !l.is_empty()));
        assert!(units.iter().all(|u| u.started_at.is_some() && u.completed_at.is_some()));

        let plan = storage.get_plan(&plan_id).await.unwrap().unwrap();
        assert_eq!(plan.status, PlanStatus::Failed);
        assert!(plan.started_at.is_some());
        assert!(plan.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_all_success_completes_plan() {
        let storage = new_in_memory_storage("plan".to_string());
        let plan_id = stored_plan(&storage, &["repoA", "repoB"]).await;
        let executor = UpdateExecutor::new(Arc::clone(&storage), Arc::new(DryRunDelegate::new()));

        assert_eq!(executor.execute(&plan_id).await.unwrap(), PlanStatus::Completed);
        let units = storage.get_executions(&plan_id).await.unwrap();
        assert_eq!(
            units[0].logs.as_deref(),
            Some("Updated lodash from 4.17.15 to 4.17.21")
        );
    }

    #[tokio::test]
    async fn test_second_execute_is_noop() {
        let storage = new_in_memory_storage("plan".to_string());
        let plan_id = stored_plan(&storage, &["repoA", "repoB"]).await;
        let delegate = Arc::new(ObservingDelegate {
            storage: Arc::clone(&storage),
            calls: AtomicUsize::new(0),
        });
        let executor = UpdateExecutor::new(Arc::clone(&storage), delegate.clone());

        assert_eq!(executor.execute(&plan_id).await.unwrap(), PlanStatus::Completed);
        assert_eq!(executor.execute(&plan_id).await.unwrap(), PlanStatus::Completed);
        assert_eq!(delegate.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_executes_run_units_once() {
        let storage = new_in_memory_storage("plan".to_string());
        let plan_id = stored_plan(&storage, &["repoA", "repoB", "repoC"]).await;
        let delegate = Arc::new(ObservingDelegate {
            storage: Arc::clone(&storage),
            calls: AtomicUsize::new(0),
        });
        let executor = UpdateExecutor::new(Arc::clone(&storage), delegate.clone());

        let (a, b) = tokio::join!(executor.execute(&plan_id), executor.execute(&plan_id));
        a.unwrap();
        b.unwrap();

        assert_eq!(delegate.calls.load(Ordering::SeqCst), 3);
        let plan = storage.get_plan(&plan_id).await.unwrap().unwrap();
        assert_eq!(plan.status, PlanStatus::Completed);
    }

    #[tokio::test]
    async fn test_empty_plan_completes() {
        let storage = new_in_memory_storage("plan".to_string());
        let plan_id = stored_plan(&storage, &[]).await;
        let executor = UpdateExecutor::new(Arc::clone(&storage), Arc::new(DryRunDelegate::new()));

        assert_eq!(executor.execute(&plan_id).await.unwrap(), PlanStatus::Completed);
    }

    #[tokio::test]
    async fn test_delegate_error_recorded_on_unit() {
        let storage = new_in_memory_storage("plan".to_string());
        let plan_id = stored_plan(&storage, &["repoA", "repoB"]).await;
        let executor = UpdateExecutor::new(Arc::clone(&storage), Arc::new(BrokenDelegate));

        assert_eq!(executor.execute(&plan_id).await.unwrap(), PlanStatus::Failed);
        let units = storage.get_executions(&plan_id).await.unwrap();
        assert!(units.iter().all(|u| u.status == ExecutionStatus::Failed));
        assert_eq!(units[0].logs.as_deref(), Some("network unreachable"));
    }

    #[tokio::test]
    async fn test_unknown_plan() {
        let storage = new_in_memory_storage("plan".to_string());
        let executor = UpdateExecutor::new(storage, Arc::new(DryRunDelegate::new()));
        let result = executor.execute(&PlanId::new("plan-none")).await;
        assert!(matches!(result, Err(Error::PlanNotFound(_))));
    }
}

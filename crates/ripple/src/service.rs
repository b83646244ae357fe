//! Operator-facing facade.
//!
//! [`Orchestrator`] wires the analyzer, planner and executor to one graph and
//! one plan store. It is cheap to clone; every clone shares the same
//! underlying state.

use crate::analysis::BlastRadiusAnalyzer;
use crate::domain::{
    BlastRadiusResult, PlanDetails, PlanFilter, PlanId, PlanRequest, PlanStatus, UpdatePlan,
};
use crate::error::{Error, Result};
use crate::executor::{ExecutionDelegate, UpdateExecutor};
use crate::graph::{dependency_graph_view, DependencyGraph, GraphView};
use crate::planner::UpdatePlanner;
use crate::storage::PlanStorage;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Entry point for analysis, planning and execution.
#[derive(Clone)]
pub struct Orchestrator {
    analyzer: BlastRadiusAnalyzer,
    planner: UpdatePlanner,
    executor: UpdateExecutor,
    storage: Arc<dyn PlanStorage>,
}

impl Orchestrator {
    /// Create an orchestrator over a graph, a plan store and a delegate
    pub fn new(
        graph: Arc<dyn DependencyGraph>,
        storage: Arc<dyn PlanStorage>,
        delegate: Arc<dyn ExecutionDelegate>,
    ) -> Self {
        let analyzer = BlastRadiusAnalyzer::new(graph);
        Self {
            planner: UpdatePlanner::new(analyzer.clone(), Arc::clone(&storage)),
            executor: UpdateExecutor::new(Arc::clone(&storage), delegate),
            analyzer,
            storage,
        }
    }

    /// Blast radius of changing `package_name`.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub async fn analyze(
        &self,
        package_name: &str,
        new_version: Option<&str>,
    ) -> Result<BlastRadiusResult> {
        self.analyzer.analyze(package_name, new_version).await
    }

    /// Create a plan and return its ID.
    ///
    /// # Errors
    ///
    /// See [`UpdatePlanner::create_plan`].
    pub async fn create_plan(&self, request: PlanRequest) -> Result<PlanId> {
        Ok(self.planner.create_plan(request).await?.id)
    }

    /// Start executing a plan in a background task.
    ///
    /// Returns immediately; poll [`get_plan`](Self::get_plan) for progress or
    /// await the handle for the final status. Must be called from within a
    /// tokio runtime.
    pub fn execute_plan(&self, plan_id: PlanId) -> JoinHandle<Result<PlanStatus>> {
        let executor = self.executor.clone();
        tokio::spawn(async move { executor.execute(&plan_id).await })
    }

    /// Execute a plan on the current task and wait for it to finish.
    ///
    /// # Errors
    ///
    /// See [`UpdateExecutor::execute`].
    pub async fn execute_plan_and_wait(&self, plan_id: &PlanId) -> Result<PlanStatus> {
        self.executor.execute(plan_id).await
    }

    /// A plan with all of its units and a freshly computed summary.
    ///
    /// # Errors
    ///
    /// Returns `Error::PlanNotFound` for an unknown ID.
    pub async fn get_plan(&self, plan_id: &PlanId) -> Result<PlanDetails> {
        let plan = self
            .storage
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| Error::PlanNotFound(plan_id.clone()))?;
        let executions = self.storage.get_executions(plan_id).await?;
        Ok(PlanDetails::new(plan, executions))
    }

    /// Plans newest first, optionally only those with `status`.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn list_plans(&self, status: Option<PlanStatus>) -> Result<Vec<UpdatePlan>> {
        self.storage
            .list_plans(&PlanFilter {
                status,
                limit: None,
            })
            .await
    }

    /// Nodes and edges for visualization, optionally for one repository.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub async fn dependency_graph(&self, repository_id: Option<&str>) -> Result<GraphView> {
        dependency_graph_view(self.analyzer.graph().as_ref(), repository_id).await
    }
}

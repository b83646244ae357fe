//! PlanStorage trait implementation for in-memory storage.

use super::InMemoryPlanStorage;
use crate::domain::{
    ExecutionId, ExecutionStatus, NewPlan, PlanFilter, PlanId, PlanStatus, UpdateExecution,
    UpdatePlan,
};
use crate::error::Result;
use crate::storage::PlanStorage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl PlanStorage for InMemoryPlanStorage {
    async fn create_plan(&self, new_plan: NewPlan) -> Result<UpdatePlan> {
        self.lock().await.create_plan(new_plan)
    }

    async fn get_plan(&self, id: &PlanId) -> Result<Option<UpdatePlan>> {
        Ok(self.lock().await.get_plan(id))
    }

    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<UpdatePlan>> {
        Ok(self.lock().await.list_plans(filter))
    }

    async fn get_executions(&self, plan_id: &PlanId) -> Result<Vec<UpdateExecution>> {
        self.lock().await.get_executions(plan_id)
    }

    async fn start_plan(&self, id: &PlanId, at: DateTime<Utc>) -> Result<bool> {
        self.lock().await.start_plan(id, at)
    }

    async fn finish_plan(
        &self,
        id: &PlanId,
        status: PlanStatus,
        at: DateTime<Utc>,
    ) -> Result<UpdatePlan> {
        self.lock().await.finish_plan(id, status, at)
    }

    async fn start_execution(&self, id: &ExecutionId, at: DateTime<Utc>) -> Result<bool> {
        self.lock().await.start_execution(id, at)
    }

    async fn finish_execution(
        &self,
        id: &ExecutionId,
        status: ExecutionStatus,
        logs: String,
        at: DateTime<Utc>,
    ) -> Result<UpdateExecution> {
        self.lock().await.finish_execution(id, status, logs, at)
    }
}

//! Core in-memory storage data structures.
//!
//! Every mutation here is synchronous and runs with the outer mutex held, so
//! a plan and all of its units become visible in one step.

use crate::domain::{
    ExecutionId, ExecutionStatus, NewPlan, PlanDetails, PlanFilter, PlanId, PlanStatus,
    UpdateExecution, UpdatePlan,
};
use crate::error::{Error, Result, StorageError};
use crate::id_generation::{execution_id, IdGenerator, IdGeneratorConfig};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Inner storage structure (not thread-safe).
///
/// Wrapped in `Arc<Mutex<>>` by [`super::InMemoryPlanStorage`].
pub(crate) struct PlanStoreInner {
    /// Plans indexed by ID
    pub(super) plans: HashMap<PlanId, UpdatePlan>,

    /// Plan IDs in insertion order
    pub(super) plan_order: Vec<PlanId>,

    /// Units of each plan, kept sorted by sequence
    pub(super) executions: HashMap<PlanId, Vec<UpdateExecution>>,

    /// Unit ID -> (owning plan, position in that plan's unit list)
    pub(super) execution_index: HashMap<ExecutionId, (PlanId, usize)>,

    /// ID generator for new plan IDs
    pub(super) id_generator: IdGenerator,

    /// Prefix for plan IDs (e.g., "plan")
    prefix: String,
}

impl PlanStoreInner {
    /// Create a new empty storage instance
    pub(crate) fn new(prefix: String) -> Self {
        let config = IdGeneratorConfig {
            prefix: prefix.clone(),
            database_size: 0,
        };

        Self {
            plans: HashMap::new(),
            plan_order: Vec::new(),
            executions: HashMap::new(),
            execution_index: HashMap::new(),
            id_generator: IdGenerator::new(config),
            prefix,
        }
    }

    /// Update the ID generator's database size if we've crossed a threshold.
    ///
    /// ID length changes at 500 and 1500 plans; the generator is only rebuilt
    /// when one of those boundaries is crossed.
    fn update_id_generator_if_needed(&mut self) {
        let current_size = self.plans.len();
        let old_size = self.id_generator.database_size();

        let needs_update = matches!(
            (old_size, current_size),
            (0..=500, 501..) | (0..=1500, 1501..)
        );

        if needs_update {
            self.id_generator = IdGenerator::new(IdGeneratorConfig {
                prefix: self.prefix.clone(),
                database_size: current_size,
            });
            for id in self.plans.keys() {
                self.id_generator.register_id(id.as_str().to_string());
            }
        }
    }

    fn generate_id(&mut self, new_plan: &NewPlan) -> Result<PlanId> {
        self.update_id_generator_if_needed();

        let scope: Vec<&str> = new_plan
            .package_updates
            .iter()
            .map(|u| u.package_name.as_str())
            .chain(new_plan.affected_repos.iter().map(String::as_str))
            .collect();

        let id = self
            .id_generator
            .generate(&new_plan.title, &scope)
            .map_err(|e| StorageError::IdGeneration(e.to_string()))?;

        Ok(PlanId::new(id))
    }

    /// Insert a plan (PLANNED) and all of its units (PENDING).
    pub(crate) fn create_plan(&mut self, new_plan: NewPlan) -> Result<UpdatePlan> {
        let id = self.generate_id(&new_plan)?;
        let now = Utc::now();

        let executions: Vec<UpdateExecution> = new_plan
            .units
            .into_iter()
            .enumerate()
            .map(|(sequence, unit)| UpdateExecution {
                id: ExecutionId::new(execution_id(id.as_str(), sequence)),
                plan_id: id.clone(),
                sequence,
                repository_id: unit.repository_id,
                package_name: unit.update.package_name,
                from_version: unit.update.from_version,
                to_version: unit.update.to_version,
                status: ExecutionStatus::Pending,
                logs: None,
                started_at: None,
                completed_at: None,
            })
            .collect();

        let plan = UpdatePlan {
            id: id.clone(),
            title: new_plan.title,
            description: new_plan.description,
            priority: new_plan.priority,
            affected_repos: new_plan.affected_repos,
            package_updates: new_plan.package_updates,
            test_strategy: new_plan.test_strategy,
            rollback_plan: new_plan.rollback_plan,
            status: PlanStatus::Planned,
            created_at: now,
            started_at: None,
            completed_at: None,
        };

        self.insert_plan(plan.clone());
        for execution in executions {
            self.insert_execution(execution);
        }

        Ok(plan)
    }

    /// Add a plan without touching its units.
    pub(super) fn insert_plan(&mut self, plan: UpdatePlan) {
        self.id_generator.register_id(plan.id.as_str().to_string());
        self.plan_order.push(plan.id.clone());
        self.executions.entry(plan.id.clone()).or_default();
        self.plans.insert(plan.id.clone(), plan);
    }

    /// Add a unit to an existing plan, keeping the list sorted by sequence.
    pub(super) fn insert_execution(&mut self, execution: UpdateExecution) {
        let units = self.executions.entry(execution.plan_id.clone()).or_default();
        let position = units.partition_point(|e| e.sequence <= execution.sequence);
        units.insert(position, execution);

        // Positions after the insertion point shifted by one
        let plan_id = units[position].plan_id.clone();
        for (index, unit) in units.iter().enumerate().skip(position) {
            self.execution_index
                .insert(unit.id.clone(), (plan_id.clone(), index));
        }
    }

    pub(crate) fn get_plan(&self, id: &PlanId) -> Option<UpdatePlan> {
        self.plans.get(id).cloned()
    }

    pub(crate) fn contains_execution(&self, id: &ExecutionId) -> bool {
        self.execution_index.contains_key(id)
    }

    /// Plans newest first.
    pub(crate) fn list_plans(&self, filter: &PlanFilter) -> Vec<UpdatePlan> {
        let mut plans: Vec<UpdatePlan> = self
            .plan_order
            .iter()
            .rev()
            .filter_map(|id| self.plans.get(id))
            .filter(|plan| filter.status.is_none_or(|status| plan.status == status))
            .cloned()
            .collect();

        // Stable: plans created in the same instant keep newest-inserted first
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = filter.limit {
            plans.truncate(limit);
        }
        plans
    }

    pub(crate) fn get_executions(&self, plan_id: &PlanId) -> Result<Vec<UpdateExecution>> {
        if !self.plans.contains_key(plan_id) {
            return Err(Error::PlanNotFound(plan_id.clone()));
        }
        Ok(self.executions.get(plan_id).cloned().unwrap_or_default())
    }

    /// PLANNED -> IN_PROGRESS. Returns `false` if the plan was not PLANNED.
    pub(crate) fn start_plan(&mut self, id: &PlanId, at: DateTime<Utc>) -> Result<bool> {
        let plan = self
            .plans
            .get_mut(id)
            .ok_or_else(|| Error::PlanNotFound(id.clone()))?;

        if plan.status != PlanStatus::Planned {
            return Ok(false);
        }

        plan.status = PlanStatus::InProgress;
        plan.started_at = Some(at);
        Ok(true)
    }

    /// IN_PROGRESS -> COMPLETED or FAILED.
    pub(crate) fn finish_plan(
        &mut self,
        id: &PlanId,
        status: PlanStatus,
        at: DateTime<Utc>,
    ) -> Result<UpdatePlan> {
        let plan = self
            .plans
            .get_mut(id)
            .ok_or_else(|| Error::PlanNotFound(id.clone()))?;

        if plan.status != PlanStatus::InProgress || !status.is_terminal() {
            return Err(Error::InvalidTransition {
                id: id.to_string(),
                from: plan.status.to_string(),
                to: status.to_string(),
            });
        }

        plan.status = status;
        plan.completed_at = Some(at);
        Ok(plan.clone())
    }

    fn execution_mut(&mut self, id: &ExecutionId) -> Result<&mut UpdateExecution> {
        let (plan_id, index) = self
            .execution_index
            .get(id)
            .ok_or_else(|| Error::ExecutionNotFound(id.clone()))?;

        self.executions
            .get_mut(plan_id)
            .and_then(|units| units.get_mut(*index))
            .ok_or_else(|| Error::ExecutionNotFound(id.clone()))
    }

    /// PENDING -> RUNNING. Returns `false` if the unit was not PENDING.
    ///
    /// Refuses to start a unit while another unit of the same plan is running.
    pub(crate) fn start_execution(&mut self, id: &ExecutionId, at: DateTime<Utc>) -> Result<bool> {
        let (plan_id, _) = self
            .execution_index
            .get(id)
            .ok_or_else(|| Error::ExecutionNotFound(id.clone()))?;

        let busy = self
            .executions
            .get(plan_id)
            .into_iter()
            .flatten()
            .find(|unit| unit.status == ExecutionStatus::Running && &unit.id != id)
            .map(|unit| unit.id.clone());

        let execution = self.execution_mut(id)?;
        if execution.status != ExecutionStatus::Pending {
            return Ok(false);
        }

        if let Some(running) = busy {
            return Err(Error::InvalidTransition {
                id: id.to_string(),
                from: execution.status.to_string(),
                to: format!("{} (unit {running} is already running)", ExecutionStatus::Running),
            });
        }

        execution.status = ExecutionStatus::Running;
        execution.started_at = Some(at);
        Ok(true)
    }

    /// RUNNING -> SUCCESS or FAILED, recording the delegate log.
    pub(crate) fn finish_execution(
        &mut self,
        id: &ExecutionId,
        status: ExecutionStatus,
        logs: String,
        at: DateTime<Utc>,
    ) -> Result<UpdateExecution> {
        let execution = self.execution_mut(id)?;

        if execution.status != ExecutionStatus::Running || !status.is_terminal() {
            return Err(Error::InvalidTransition {
                id: id.to_string(),
                from: execution.status.to_string(),
                to: status.to_string(),
            });
        }

        execution.status = status;
        execution.logs = Some(logs);
        execution.completed_at = Some(at);
        Ok(execution.clone())
    }

    /// Every plan with its units, in insertion order.
    pub(crate) fn export_all(&self) -> Vec<PlanDetails> {
        self.plan_order
            .iter()
            .filter_map(|id| {
                let plan = self.plans.get(id)?.clone();
                let units = self.executions.get(id).cloned().unwrap_or_default();
                Some(PlanDetails::new(plan, units))
            })
            .collect()
    }
}

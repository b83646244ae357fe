//! Update plans and execution units.
//!
//! A plan is created once in [`PlanStatus::Planned`] and afterwards only its
//! status and timestamps change. The plan status is never chosen freely: it is
//! derived from the statuses of its units by [`aggregate_status`].

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Test strategy recorded when the operator does not supply one
pub const DEFAULT_TEST_STRATEGY: &str = "Run automated tests before merge";

/// Rollback plan recorded when the operator does not supply one
pub const DEFAULT_ROLLBACK_PLAN: &str = "Revert commits and redeploy previous version";

string_id!(
    /// Unique identifier for an update plan
    PlanId
);

string_id!(
    /// Unique identifier for an execution unit
    ExecutionId
);

/// Operator-assigned urgency of a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Routine maintenance
    Low,
    /// Default priority
    #[default]
    Medium,
    /// Should be rolled out soon
    High,
    /// Roll out immediately
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "LOW"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::High => write!(f, "HIGH"),
            Priority::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Plan-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    /// Created, not yet executed
    Planned,
    /// Units are being driven
    InProgress,
    /// Every unit succeeded
    Completed,
    /// At least one unit failed
    Failed,
}

impl PlanStatus {
    /// Whether the plan can no longer change
    pub fn is_terminal(self) -> bool {
        matches!(self, PlanStatus::Completed | PlanStatus::Failed)
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStatus::Planned => write!(f, "PLANNED"),
            PlanStatus::InProgress => write!(f, "IN_PROGRESS"),
            PlanStatus::Completed => write!(f, "COMPLETED"),
            PlanStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Unit-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Waiting for its turn
    Pending,
    /// Handed to the execution delegate
    Running,
    /// Delegate reported success
    Success,
    /// Delegate reported failure, errored, or timed out
    Failed,
}

impl ExecutionStatus {
    /// Whether the unit can no longer change
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Success | ExecutionStatus::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Pending => write!(f, "PENDING"),
            ExecutionStatus::Running => write!(f, "RUNNING"),
            ExecutionStatus::Success => write!(f, "SUCCESS"),
            ExecutionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One package to move from one version to another.
///
/// Versions are opaque strings; no semantic-version validation happens here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageUpdate {
    /// Package name
    pub package_name: String,

    /// Version currently deployed
    pub from_version: String,

    /// Target version
    pub to_version: String,
}

impl PackageUpdate {
    /// Convenience constructor
    pub fn new(
        package_name: impl Into<String>,
        from_version: impl Into<String>,
        to_version: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            from_version: from_version.into(),
            to_version: to_version.into(),
        }
    }

    /// Check that all three fields are present.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.package_name.trim().is_empty() {
            return Err("package name cannot be empty".to_string());
        }
        if self.from_version.trim().is_empty() {
            return Err(format!("{}: from version cannot be empty", self.package_name));
        }
        if self.to_version.trim().is_empty() {
            return Err(format!("{}: to version cannot be empty", self.package_name));
        }
        Ok(())
    }
}

impl fmt::Display for PackageUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.package_name, self.from_version, self.to_version
        )
    }
}

/// A coordinated rollout of one or more package updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlan {
    /// Unique identifier
    pub id: PlanId,

    /// Short title
    pub title: String,

    /// Longer description (optional)
    pub description: Option<String>,

    /// Urgency
    pub priority: Priority,

    /// Every repository that receives every package update
    pub affected_repos: Vec<String>,

    /// Updates to apply, in operator order
    pub package_updates: Vec<PackageUpdate>,

    /// How changes are verified before merge
    pub test_strategy: String,

    /// How a bad rollout is undone
    pub rollback_plan: String,

    /// Current status
    pub status: PlanStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution reached a terminal status
    pub completed_at: Option<DateTime<Utc>>,
}

/// One package update applied to one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateExecution {
    /// Unique identifier
    pub id: ExecutionId,

    /// Owning plan
    pub plan_id: PlanId,

    /// Position within the plan; units run in ascending order
    pub sequence: usize,

    /// Target repository
    pub repository_id: String,

    /// Package to update
    pub package_name: String,

    /// Version currently deployed
    pub from_version: String,

    /// Target version
    pub to_version: String,

    /// Current status
    pub status: ExecutionStatus,

    /// Delegate output, set when the unit finishes
    pub logs: Option<String>,

    /// When the unit started running
    pub started_at: Option<DateTime<Utc>>,

    /// When the unit finished
    pub completed_at: Option<DateTime<Utc>>,
}

/// Operator input for creating a plan
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    /// Plan title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Package updates to roll out (must be non-empty)
    pub package_updates: Vec<PackageUpdate>,

    /// Repositories explicitly requested (may be empty)
    pub repository_ids: Vec<String>,

    /// Priority, defaults to [`Priority::Medium`]
    pub priority: Option<Priority>,

    /// Test strategy, defaults to [`DEFAULT_TEST_STRATEGY`]
    pub test_strategy: Option<String>,

    /// Rollback plan, defaults to [`DEFAULT_ROLLBACK_PLAN`]
    pub rollback_plan: Option<String>,
}

impl PlanRequest {
    /// Reject input that must never reach storage.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the title is blank, no package updates
    /// were given, or any update is missing a field.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title cannot be empty".to_string()));
        }
        if self.package_updates.is_empty() {
            return Err(Error::Validation(
                "at least one package update is required".to_string(),
            ));
        }
        for update in &self.package_updates {
            update.validate().map_err(Error::Validation)?;
        }
        if self.repository_ids.iter().any(|r| r.trim().is_empty()) {
            return Err(Error::Validation(
                "repository IDs cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fully resolved plan handed to storage.
///
/// Storage assigns IDs, sequence numbers and timestamps; everything else is
/// persisted verbatim.
#[derive(Debug, Clone)]
pub struct NewPlan {
    /// Plan title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Resolved priority
    pub priority: Priority,

    /// Resolved scope
    pub affected_repos: Vec<String>,

    /// Package updates
    pub package_updates: Vec<PackageUpdate>,

    /// Resolved test strategy
    pub test_strategy: String,

    /// Resolved rollback plan
    pub rollback_plan: String,

    /// Units to create, in execution order
    pub units: Vec<NewExecution>,
}

/// A unit to be created alongside its plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExecution {
    /// Target repository
    pub repository_id: String,

    /// Update to apply
    pub update: PackageUpdate,
}

/// Filter for listing plans
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Only plans with this status
    pub status: Option<PlanStatus>,

    /// Limit number of results
    pub limit: Option<usize>,
}

/// Unit counts for one plan, recomputed from unit statuses on every read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// All units
    pub total: usize,
    /// Units not yet started
    pub pending: usize,
    /// Units currently running
    pub running: usize,
    /// Units that succeeded
    pub succeeded: usize,
    /// Units that failed
    pub failed: usize,
}

impl PlanSummary {
    /// Count units by status
    pub fn from_executions(executions: &[UpdateExecution]) -> Self {
        executions
            .iter()
            .fold(Self::default(), |mut summary, execution| {
                summary.total += 1;
                match execution.status {
                    ExecutionStatus::Pending => summary.pending += 1,
                    ExecutionStatus::Running => summary.running += 1,
                    ExecutionStatus::Success => summary.succeeded += 1,
                    ExecutionStatus::Failed => summary.failed += 1,
                }
                summary
            })
    }
}

/// A plan together with its units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDetails {
    /// The plan row
    pub plan: UpdatePlan,

    /// Units in sequence order
    pub executions: Vec<UpdateExecution>,

    /// Unit counts
    pub summary: PlanSummary,
}

impl PlanDetails {
    /// Combine a plan with its units, computing the summary
    pub fn new(plan: UpdatePlan, executions: Vec<UpdateExecution>) -> Self {
        let summary = PlanSummary::from_executions(&executions);
        Self {
            plan,
            executions,
            summary,
        }
    }

    /// (repository, package) pairs whose unit failed, in sequence order.
    ///
    /// This is the scope an operator needs for a remediation plan; failed
    /// plans are never retried in place.
    pub fn failed_pairs(&self) -> Vec<(&str, &str)> {
        self.executions
            .iter()
            .filter(|e| e.status == ExecutionStatus::Failed)
            .map(|e| (e.repository_id.as_str(), e.package_name.as_str()))
            .collect()
    }
}

/// Derive the plan status from its units.
///
/// Returns `None` while any unit is still pending or running. Once every unit
/// is terminal the plan is `Failed` if any unit failed and `Completed`
/// otherwise. A plan without units is `Completed`.
pub fn aggregate_status(executions: &[UpdateExecution]) -> Option<PlanStatus> {
    if executions.iter().any(|e| !e.status.is_terminal()) {
        return None;
    }
    if executions
        .iter()
        .any(|e| e.status == ExecutionStatus::Failed)
    {
        Some(PlanStatus::Failed)
    } else {
        Some(PlanStatus::Completed)
    }
}

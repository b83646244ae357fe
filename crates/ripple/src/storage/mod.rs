//! Storage abstraction layer for update plans and their execution units.
//!
//! This module provides the core storage trait and factory for creating
//! storage backends:
//!
//! - **In-memory**: ephemeral storage behind `Arc<Mutex<_>>`
//! - **JSONL**: the in-memory backend plus a `plans.jsonl` file, rewritten
//!   atomically after every mutation
//!
//! # Architecture
//!
//! The trait takes `&self` throughout and implementations use interior
//! mutability, so one storage handle can be shared as `Arc<dyn PlanStorage>`
//! between the planner, the executor and any number of spawned tasks.
//!
//! State transitions are exposed as compare-and-set operations
//! ([`PlanStorage::start_plan`], [`PlanStorage::start_execution`]) rather
//! than free status setters; callers never write a plan status directly.
//!
//! # Example
//!
//! ```no_run
//! use ripple::storage::{create_storage, StorageBackend};
//! use ripple::domain::PlanFilter;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = create_storage(
//!         StorageBackend::Jsonl(".ripple/plans.jsonl".into()),
//!         "plan".to_string(),
//!     )
//!     .await?;
//!
//!     for plan in storage.list_plans(&PlanFilter::default()).await? {
//!         println!("{} [{}] {}", plan.id, plan.status, plan.title);
//!     }
//!     Ok(())
//! }
//! ```

use crate::domain::{
    ExecutionId, ExecutionStatus, NewPlan, PlanFilter, PlanId, PlanStatus, UpdateExecution,
    UpdatePlan,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use in_memory::{InMemoryPlanStorage, PlanStoreInner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

// Storage backend implementations
pub mod in_memory;

/// Core storage trait for plans and execution units.
///
/// Implementations must be `Send + Sync` to support concurrent access in
/// async contexts.
///
/// # Method Categories
///
/// - **Creation**: `create_plan`
/// - **Queries**: `get_plan`, `list_plans`, `get_executions`
/// - **Transitions**: `start_plan`, `finish_plan`, `start_execution`,
///   `finish_execution`
///
/// Persistent backends write through on every successful mutation; there is
/// no separate save step.
#[async_trait]
pub trait PlanStorage: Send + Sync {
    // ========== Creation ==========

    /// Create a plan and all of its units in one step.
    ///
    /// Assigns the plan ID, unit IDs (`{plan_id}.{n}`), sequence numbers and
    /// the creation timestamp. The plan starts `PLANNED` and every unit
    /// `PENDING`. Either everything is stored or nothing is.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if ID generation or persistence fails.
    async fn create_plan(&self, new_plan: NewPlan) -> Result<UpdatePlan>;

    // ========== Queries ==========

    /// Get a plan by ID. Returns `None` if it doesn't exist.
    async fn get_plan(&self, id: &PlanId) -> Result<Option<UpdatePlan>>;

    /// List plans matching the filter, newest first.
    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<UpdatePlan>>;

    /// All units of a plan in sequence order.
    ///
    /// # Errors
    ///
    /// Returns `Error::PlanNotFound` if the plan doesn't exist.
    async fn get_executions(&self, plan_id: &PlanId) -> Result<Vec<UpdateExecution>>;

    // ========== Transitions ==========

    /// Atomically move a plan from `PLANNED` to `IN_PROGRESS`.
    ///
    /// Returns `false` without changing anything if the plan is in any other
    /// status, so at most one caller ever wins.
    ///
    /// # Errors
    ///
    /// Returns `Error::PlanNotFound` if the plan doesn't exist.
    async fn start_plan(&self, id: &PlanId, at: DateTime<Utc>) -> Result<bool>;

    /// Move an `IN_PROGRESS` plan to a terminal status.
    ///
    /// # Errors
    ///
    /// - `Error::PlanNotFound` if the plan doesn't exist
    /// - `Error::InvalidTransition` if the plan is not in progress or
    ///   `status` is not terminal
    async fn finish_plan(
        &self,
        id: &PlanId,
        status: PlanStatus,
        at: DateTime<Utc>,
    ) -> Result<UpdatePlan>;

    /// Atomically move a unit from `PENDING` to `RUNNING`.
    ///
    /// Returns `false` if the unit was not pending.
    ///
    /// # Errors
    ///
    /// - `Error::ExecutionNotFound` if the unit doesn't exist
    /// - `Error::InvalidTransition` if another unit of the same plan is
    ///   already running
    async fn start_execution(&self, id: &ExecutionId, at: DateTime<Utc>) -> Result<bool>;

    /// Move a `RUNNING` unit to `SUCCESS` or `FAILED`, recording its log.
    ///
    /// # Errors
    ///
    /// - `Error::ExecutionNotFound` if the unit doesn't exist
    /// - `Error::InvalidTransition` if the unit is not running or `status`
    ///   is not terminal
    async fn finish_execution(
        &self,
        id: &ExecutionId,
        status: ExecutionStatus,
        logs: String,
        at: DateTime<Utc>,
    ) -> Result<UpdateExecution>;
}

/// Storage backend configuration.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl(PathBuf),
}

/// In-memory storage that rewrites a JSONL file after every mutation.
///
/// The mutation and the write happen under the same lock. If the write fails
/// the in-memory state is reloaded from disk before the error is returned,
/// so no other task ever observes a change that was not persisted.
///
/// Each write covers the full plan history, so a unit transition costs time
/// proportional to every stored plan, not just the running one.
// TODO: append transition records and compact on load once plans.jsonl grows
// large enough for whole-file rewrites to dominate execution time.
struct JsonlBackedStorage {
    state: InMemoryPlanStorage,
    path: PathBuf,
    prefix: String,
}

impl JsonlBackedStorage {
    async fn load(path: PathBuf, prefix: String) -> Result<Self> {
        let inner = read_state(&path, &prefix, "JSONL load warning").await?;
        Ok(Self {
            state: Arc::new(Mutex::new(inner)),
            path,
            prefix,
        })
    }

    /// Persist `inner`, restoring it from disk if the write fails.
    async fn persist(&self, inner: &mut MutexGuard<'_, PlanStoreInner>) -> Result<()> {
        let Err(e) = in_memory::save_to_jsonl(inner, &self.path).await else {
            return Ok(());
        };

        tracing::error!(
            error = %e,
            path = %self.path.display(),
            "Failed to save plans, restoring state from disk"
        );
        match read_state(&self.path, &self.prefix, "JSONL reload warning").await {
            Ok(restored) => **inner = restored,
            Err(reload_err) => {
                tracing::error!(error = %reload_err, "Failed to restore plans from disk");
            }
        }
        Err(e)
    }

    /// Run a mutation and persist its effect when `changed` says it had one.
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut PlanStoreInner) -> Result<T> + Send,
        changed: impl FnOnce(&T) -> bool + Send,
    ) -> Result<T>
    where
        T: Send,
    {
        let mut inner = self.state.lock().await;
        let value = op(&mut *inner)?;
        if changed(&value) {
            self.persist(&mut inner).await?;
        }
        Ok(value)
    }
}

/// Load state from `path`, or start empty if the file does not exist yet.
async fn read_state(path: &Path, prefix: &str, context: &'static str) -> Result<PlanStoreInner> {
    if !path.exists() {
        return Ok(PlanStoreInner::new(prefix.to_string()));
    }

    let (inner, warnings) = in_memory::load_from_jsonl(path, prefix.to_string()).await?;
    for warning in &warnings {
        tracing::warn!(warning = ?warning, "{context}");
    }
    Ok(inner)
}

#[async_trait]
impl PlanStorage for JsonlBackedStorage {
    async fn create_plan(&self, new_plan: NewPlan) -> Result<UpdatePlan> {
        self.mutate(|inner| inner.create_plan(new_plan), |_| true)
            .await
    }

    async fn get_plan(&self, id: &PlanId) -> Result<Option<UpdatePlan>> {
        self.state.get_plan(id).await
    }

    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<UpdatePlan>> {
        self.state.list_plans(filter).await
    }

    async fn get_executions(&self, plan_id: &PlanId) -> Result<Vec<UpdateExecution>> {
        self.state.get_executions(plan_id).await
    }

    async fn start_plan(&self, id: &PlanId, at: DateTime<Utc>) -> Result<bool> {
        self.mutate(|inner| inner.start_plan(id, at), |started| *started)
            .await
    }

    async fn finish_plan(
        &self,
        id: &PlanId,
        status: PlanStatus,
        at: DateTime<Utc>,
    ) -> Result<UpdatePlan> {
        self.mutate(|inner| inner.finish_plan(id, status, at), |_| true)
            .await
    }

    async fn start_execution(&self, id: &ExecutionId, at: DateTime<Utc>) -> Result<bool> {
        self.mutate(|inner| inner.start_execution(id, at), |started| *started)
            .await
    }

    async fn finish_execution(
        &self,
        id: &ExecutionId,
        status: ExecutionStatus,
        logs: String,
        at: DateTime<Utc>,
    ) -> Result<UpdateExecution> {
        self.mutate(
            |inner| inner.finish_execution(id, status, logs, at),
            |_| true,
        )
        .await
    }
}

/// Create a storage instance for the given backend.
///
/// # Arguments
///
/// * `backend` - The storage backend to use
/// * `prefix` - The prefix for generated plan IDs (e.g., "plan")
///
/// # Errors
///
/// Returns `Error::Io` if an existing JSONL file cannot be read.
pub async fn create_storage(
    backend: StorageBackend,
    prefix: String,
) -> Result<Arc<dyn PlanStorage>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_storage(prefix)),
        StorageBackend::Jsonl(path) => Ok(Arc::new(JsonlBackedStorage::load(path, prefix).await?)),
    }
}

//! In-memory plan storage.
//!
//! All data is held in RAM behind an `Arc<Mutex<PlanStoreInner>>`. On its own
//! the backend is **ephemeral**; [`crate::storage::create_storage`] wraps it
//! with JSONL persistence for the `Jsonl` backend.
//!
//! # Architecture
//!
//! - `HashMap<PlanId, UpdatePlan>` for plan lookups, plus insertion order
//! - `HashMap<PlanId, Vec<UpdateExecution>>` holding each plan's units sorted
//!   by sequence
//! - `HashMap<ExecutionId, (PlanId, usize)>` locating a unit without a scan
//! - Hash-based plan IDs with adaptive length (4-6 chars); unit IDs are
//!   `{plan_id}.{n}`
//!
//! # Thread Safety
//!
//! Every operation acquires the mutex for its whole duration, which makes
//! plan creation (plan plus all units) and the status compare-and-set
//! operations atomic with respect to other tasks.

mod inner;
mod jsonl;
mod trait_impl;

use crate::storage::PlanStorage;
use std::sync::Arc;
use tokio::sync::Mutex;

pub(crate) use inner::PlanStoreInner;
pub(crate) use jsonl::{load_from_jsonl, save_to_jsonl};
pub use jsonl::{LoadWarning, PlanRecord};

/// Thread-safe in-memory storage.
pub(crate) type InMemoryPlanStorage = Arc<Mutex<PlanStoreInner>>;

/// Create a new in-memory storage instance.
///
/// # Example
///
/// ```
/// use ripple::storage::in_memory::new_in_memory_storage;
///
/// let storage = new_in_memory_storage("plan".to_string());
/// ```
pub fn new_in_memory_storage(prefix: String) -> Arc<dyn PlanStorage> {
    Arc::new(Arc::new(Mutex::new(PlanStoreInner::new(prefix))))
}

//! Error types for ripple operations.
//!
//! Errors fall into three groups:
//!
//! - **Validation** ([`Error::Validation`]): malformed operator input, rejected
//!   before anything is written.
//! - **Infrastructure** ([`Error::Graph`], [`Error::Storage`], [`Error::Io`],
//!   [`Error::Json`]): the graph store or plan store could not be reached.
//!   These propagate unmodified to the caller.
//! - **Execution**: a delegate reporting failure for one unit. These never
//!   appear here; the executor records them on the unit as `FAILED` with a log
//!   (see [`crate::executor::DelegateError`]).

use crate::domain::{ExecutionId, PlanId};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for ripple operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operator input was rejected.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The dependency graph could not be queried or built.
    #[error("Graph error: {0}")]
    Graph(String),

    /// Plan not found.
    #[error("Plan not found: {0}")]
    PlanNotFound(PlanId),

    /// Execution unit not found.
    #[error("Execution unit not found: {0}")]
    ExecutionNotFound(ExecutionId),

    /// A status change was requested that the state machine does not allow.
    #[error("Invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition {
        /// The plan or execution unit ID.
        id: String,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },

    /// Plan units were still unfinished when aggregation was attempted.
    #[error("Plan {plan_id} has {unfinished} unit(s) that did not reach a terminal status")]
    UnfinishedUnits {
        /// The plan being aggregated.
        plan_id: PlanId,
        /// Number of units still pending or running.
        unfinished: usize,
    },

    /// Storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised by the plan storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A record could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// ID generation failed.
    #[error("ID generation failed: {0}")]
    IdGeneration(String),
}

/// Configuration and workspace discovery errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.ripple` directory was found.
    #[error("Not a ripple workspace (or any parent directory). Run 'ripple init' first.")]
    NotInitialized,

    /// `ripple init` was run in an initialized workspace.
    #[error("Ripple is already initialized in {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The configuration file could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A specialized Result type for ripple operations.
pub type Result<T> = std::result::Result<T, Error>;

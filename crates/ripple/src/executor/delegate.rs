//! Execution delegates: the code that actually changes a repository.
//!
//! The executor never touches a repository itself. For each unit it hands the
//! (repository, package, from, to) tuple to an [`ExecutionDelegate`] and
//! records what comes back.

use crate::domain::UpdateExecution;
use async_trait::async_trait;
use std::collections::HashSet;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Environment variable carrying the target repository
pub const ENV_REPOSITORY: &str = "RIPPLE_REPOSITORY";
/// Environment variable carrying the package name
pub const ENV_PACKAGE: &str = "RIPPLE_PACKAGE";
/// Environment variable carrying the current version
pub const ENV_FROM_VERSION: &str = "RIPPLE_FROM_VERSION";
/// Environment variable carrying the target version
pub const ENV_TO_VERSION: &str = "RIPPLE_TO_VERSION";

/// What a delegate reports for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateOutcome {
    /// Whether the update was applied
    pub succeeded: bool,

    /// Free-text log stored on the unit
    pub log: String,
}

impl DelegateOutcome {
    /// A successful outcome
    pub fn success(log: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            log: log.into(),
        }
    }

    /// A failed outcome
    pub fn failure(log: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            log: log.into(),
        }
    }
}

/// A delegate could not produce an outcome at all.
///
/// The executor records these as a failed unit with the error text as log;
/// they never abort the plan.
#[derive(Debug, Error)]
pub enum DelegateError {
    /// The update command could not be started
    #[error("failed to start update command: {0}")]
    Spawn(#[source] std::io::Error),

    /// The update did not finish in time
    #[error("update timed out after {limit:?}")]
    TimedOut {
        /// Configured timeout
        limit: Duration,
    },

    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Performs the package update for one unit.
#[async_trait]
pub trait ExecutionDelegate: Send + Sync {
    /// Apply `unit`'s update to its repository.
    ///
    /// Implementations enforce their own timeout and report it as an error.
    async fn apply(&self, unit: &UpdateExecution) -> Result<DelegateOutcome, DelegateError>;
}

/// Reports every update as applied without changing anything.
///
/// Specific (repository, package) pairs can be marked as failing to rehearse
/// a partially failed rollout.
#[derive(Debug, Clone, Default)]
pub struct DryRunDelegate {
    failing: HashSet<(String, String)>,
}

impl DryRunDelegate {
    /// A delegate that succeeds for every unit
    pub fn new() -> Self {
        Self::default()
    }

    /// Report failure for `package` in `repository`
    #[must_use]
    pub fn failing_on(mut self, repository: impl Into<String>, package: impl Into<String>) -> Self {
        self.failing.insert((repository.into(), package.into()));
        self
    }
}

#[async_trait]
impl ExecutionDelegate for DryRunDelegate {
    async fn apply(&self, unit: &UpdateExecution) -> Result<DelegateOutcome, DelegateError> {
        let key = (unit.repository_id.clone(), unit.package_name.clone());
        if self.failing.contains(&key) {
            return Ok(DelegateOutcome::failure(format!(
                "Failed to update {} from {} to {} in {}",
                unit.package_name, unit.from_version, unit.to_version, unit.repository_id
            )));
        }
        Ok(DelegateOutcome::success(format!(
            "Updated {} from {} to {}",
            unit.package_name, unit.from_version, unit.to_version
        )))
    }
}

/// Runs an external program once per unit.
///
/// The unit is passed through `RIPPLE_*` environment variables. Exit status 0
/// means success; stdout and stderr become the unit's log. A program still
/// running when the timeout expires is killed.
#[derive(Debug, Clone)]
pub struct CommandDelegate {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandDelegate {
    /// Create a delegate running `program` with `args`
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from a `[program, args...]` list, as stored in the config file.
    ///
    /// Returns `None` for an empty list.
    pub fn from_argv(argv: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec(), timeout))
    }
}

#[async_trait]
impl ExecutionDelegate for CommandDelegate {
    async fn apply(&self, unit: &UpdateExecution) -> Result<DelegateOutcome, DelegateError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .env(ENV_REPOSITORY, &unit.repository_id)
            .env(ENV_PACKAGE, &unit.package_name)
            .env(ENV_FROM_VERSION, &unit.from_version)
            .env(ENV_TO_VERSION, &unit.to_version)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(DelegateError::Spawn)?;

        // Dropping the child on timeout kills it
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DelegateError::TimedOut {
                limit: self.timeout,
            })?
            .map_err(|e| DelegateError::Other(format!("failed to collect output: {e}")))?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !log.is_empty() && !log.ends_with('\n') {
                log.push('\n');
            }
            log.push_str(&stderr);
        }

        if output.status.success() {
            Ok(DelegateOutcome::success(log))
        } else {
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            if !log.is_empty() && !log.ends_with('\n') {
                log.push('\n');
            }
            log.push_str(&format!("exit status: {code}"));
            Ok(DelegateOutcome::failure(log))
        }
    }
}

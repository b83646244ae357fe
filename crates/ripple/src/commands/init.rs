//! Implementation of the `init` command and the workspace configuration.
//!
//! `ripple init` creates a `.ripple/` directory holding the configuration,
//! an empty dependency graph snapshot and an empty plan store:
//!
//! ```text
//! .ripple/
//! ├── config.yaml
//! ├── graph.jsonl    (written by the ingestion pipeline)
//! ├── plans.jsonl
//! └── .gitignore
//! ```

use crate::error::{ConfigError, Result};
use crate::executor::{CommandDelegate, DryRunDelegate, ExecutionDelegate};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

/// Default plan ID prefix if none specified
pub const DEFAULT_PREFIX: &str = "plan";

/// Name of the ripple directory
pub const RIPPLE_DIR_NAME: &str = ".ripple";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the dependency graph snapshot
pub const GRAPH_FILE_NAME: &str = "graph.jsonl";

/// Name of the plan store
pub const PLANS_FILE_NAME: &str = "plans.jsonl";

/// Name of the gitignore file within .ripple
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Minimum prefix length
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Maximum prefix length
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Default delegate timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Maximum directory depth to traverse when searching for the ripple root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure for ripple
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RippleConfig {
    /// Plan ID prefix (e.g., "plan" for "plan-a3f8")
    #[serde(rename = "plan-prefix")]
    pub plan_prefix: String,

    /// Storage configuration
    pub storage: StorageConfig,

    /// How units are applied
    #[serde(default)]
    pub delegate: DelegateConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Dependency graph snapshot, relative to the workspace root
    pub graph_file: String,

    /// Plan store, relative to the workspace root
    pub plans_file: String,
}

/// Which delegate applies updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelegateKind {
    /// Log the update without changing anything
    #[default]
    DryRun,
    /// Run `delegate.command` once per unit
    Command,
}

/// Delegate configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelegateConfig {
    /// Delegate type
    #[serde(default)]
    pub kind: DelegateKind,

    /// Program and arguments for the `command` delegate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Per-unit timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            kind: DelegateKind::DryRun,
            command: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DelegateConfig {
    /// Build the configured delegate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the `command` delegate has no
    /// program or the timeout is zero.
    pub fn build(&self) -> Result<Arc<dyn ExecutionDelegate>> {
        match self.kind {
            DelegateKind::DryRun => Ok(Arc::new(DryRunDelegate::new())),
            DelegateKind::Command => {
                if self.timeout_secs == 0 {
                    return Err(ConfigError::Invalid(
                        "delegate.timeout_secs must be greater than 0".to_string(),
                    )
                    .into());
                }
                let delegate = CommandDelegate::from_argv(
                    &self.command,
                    Duration::from_secs(self.timeout_secs),
                )
                .ok_or_else(|| {
                    ConfigError::Invalid(
                        "delegate.command is required when delegate.kind is 'command'"
                            .to_string(),
                    )
                })?;
                Ok(Arc::new(delegate))
            }
        }
    }
}

impl StorageConfig {
    /// Plan store backend for a workspace rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an empty path.
    pub fn to_backend(&self, root: &Path) -> Result<StorageBackend> {
        Ok(StorageBackend::Jsonl(resolve(root, &self.plans_file, "plans_file")?))
    }

    /// Graph snapshot path for a workspace rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an empty path.
    pub fn graph_path(&self, root: &Path) -> Result<PathBuf> {
        resolve(root, &self.graph_file, "graph_file")
    }
}

fn resolve(root: &Path, file: &str, key: &str) -> Result<PathBuf> {
    let file = file.trim();
    if file.is_empty() {
        return Err(ConfigError::Invalid(format!("storage.{key} cannot be empty")).into());
    }
    Ok(root.join(file))
}

impl RippleConfig {
    /// Create a new configuration with the given prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            plan_prefix: prefix.to_string(),
            storage: StorageConfig {
                graph_file: format!("{RIPPLE_DIR_NAME}/{GRAPH_FILE_NAME}"),
                plans_file: format!("{RIPPLE_DIR_NAME}/{PLANS_FILE_NAME}"),
            },
            delegate: DelegateConfig::default(),
        }
    }

    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content).map_err(ConfigError::Yaml)?;
        validate_prefix(&config.plan_prefix)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(ConfigError::Yaml)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created ripple directory
    pub ripple_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created graph snapshot
    pub graph_file: PathBuf,
    /// Path to the created plan store
    pub plans_file: PathBuf,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
    /// The prefix used for plan IDs
    pub prefix: String,
}

/// Validate plan ID prefix format.
///
/// Requirements:
/// - 2-20 characters
/// - Alphanumeric only (letters and digits)
///
/// Expects pre-trimmed input.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PREFIX_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "Prefix must be at least {MIN_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "Prefix cannot exceed {MAX_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Invalid(
            "Prefix must contain only alphanumeric characters".to_string(),
        )
        .into());
    }

    Ok(())
}

/// Initialize a new ripple workspace in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.ripple/` directory already exists
/// - The prefix is invalid
/// - File system operations fail
pub async fn init(base_dir: &Path, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let ripple_dir = base_dir.join(RIPPLE_DIR_NAME);
    if ripple_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(base_dir.to_path_buf()).into());
    }

    fs::create_dir_all(&ripple_dir).await?;

    let config_file = ripple_dir.join(CONFIG_FILE_NAME);
    RippleConfig::new(prefix).save(&config_file).await?;

    let graph_file = ripple_dir.join(GRAPH_FILE_NAME);
    fs::write(&graph_file, "").await?;

    let plans_file = ripple_dir.join(PLANS_FILE_NAME);
    fs::write(&plans_file, "").await?;

    let gitignore_file = ripple_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# Temporary files left by interrupted writes
*.tmp
";
    fs::write(&gitignore_file, gitignore_content).await?;

    Ok(InitResult {
        ripple_dir,
        config_file,
        graph_file,
        plans_file,
        gitignore_file,
        prefix: prefix.to_string(),
    })
}

/// Find the ripple root directory by searching up the directory tree.
///
/// Returns the directory containing `.ripple/`, or `None` if none is found
/// within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_ripple_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(RIPPLE_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

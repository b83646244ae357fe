//! Application context for CLI command execution.
//!
//! `App` finds the workspace, loads its configuration, the dependency graph
//! snapshot and the plan store, and hands out an [`Orchestrator`] wired to
//! all three.
//!
//! # Example
//!
//! ```no_run
//! use ripple::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let radius = app.orchestrator().analyze("lodash", None).await?;
//!     println!("{} repositories affected", radius.estimated_impact.repository_count);
//!     Ok(())
//! }
//! ```

use crate::commands::init::{find_ripple_root, RippleConfig, CONFIG_FILE_NAME, RIPPLE_DIR_NAME};
use crate::error::{ConfigError, Result};
use crate::graph::{load_graph_from_jsonl, InMemoryGraph};
use crate::service::Orchestrator;
use crate::storage::create_storage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application context for CLI operations.
pub struct App {
    orchestrator: Orchestrator,

    /// Path to the ripple directory (.ripple)
    ripple_dir: PathBuf,

    config: RippleConfig,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("ripple_dir", &self.ripple_dir)
            .field("config", &self.config)
            .field("orchestrator", &"<Orchestrator>")
            .finish()
    }
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree to find a `.ripple/` directory. A
    /// missing graph snapshot is treated as an empty graph.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No ripple workspace is found in the directory tree
    /// - Configuration cannot be loaded or is invalid
    /// - The graph snapshot or plan store cannot be read
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_ripple_root(working_dir).ok_or(ConfigError::NotInitialized)?;

        let ripple_dir = root_dir.join(RIPPLE_DIR_NAME);
        let config = RippleConfig::load(&ripple_dir.join(CONFIG_FILE_NAME)).await?;

        let graph_path = config.storage.graph_path(&root_dir)?;
        let graph = if graph_path.exists() {
            let (graph, warnings) = load_graph_from_jsonl(&graph_path).await?;
            for warning in &warnings {
                tracing::warn!(%warning, "Graph snapshot warning");
            }
            graph
        } else {
            tracing::debug!(path = %graph_path.display(), "No graph snapshot, using empty graph");
            InMemoryGraph::new()
        };

        let backend = config.storage.to_backend(&root_dir)?;
        let storage = create_storage(backend, config.plan_prefix.clone()).await?;
        let delegate = config.delegate.build()?;

        Ok(Self {
            orchestrator: Orchestrator::new(Arc::new(graph), storage, delegate),
            ripple_dir,
            config,
        })
    }

    /// The orchestrator for this workspace
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Get the plan ID prefix.
    pub fn prefix(&self) -> &str {
        &self.config.plan_prefix
    }

    /// Get the path to the ripple directory.
    pub fn ripple_dir(&self) -> &Path {
        &self.ripple_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_app_from_initialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("test")).await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();

        assert_eq!(app.prefix(), "test");
        assert!(app.ripple_dir().ends_with(".ripple"));
        assert!(app.orchestrator().list_plans(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_app_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("web")).await.unwrap();

        let sub_dir = temp_dir.path().join("services").join("api");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let app = App::from_directory(&sub_dir).await.unwrap();
        assert_eq!(app.prefix(), "web");
    }

    #[tokio::test]
    async fn test_app_tolerates_missing_graph_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let result = init::init(temp_dir.path(), None).await.unwrap();
        std::fs::remove_file(&result.graph_file).unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();
        let view = app.orchestrator().dependency_graph(None).await.unwrap();
        assert!(view.nodes.is_empty());
    }

    #[tokio::test]
    async fn test_app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = App::from_directory(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Not a ripple workspace"));
    }
}

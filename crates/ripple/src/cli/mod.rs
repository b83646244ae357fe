//! Command-line interface for ripple.
//!
//! Ripple finds every repository a package change reaches and rolls the change
//! out as one tracked plan.
//!
//! ```text
//! ripple init --prefix web
//! ripple analyze lodash --to 4.17.21
//! ripple plan create "Bump lodash" --package lodash:4.17.15:4.17.21 --repo frontend
//! ripple plan execute web-a3f8
//! ripple plan show web-a3f8
//! ```

mod args;
mod execute;
mod types;
mod validators;

pub use args::{AnalyzeArgs, GraphArgs, InitArgs, PlanAction, PlanArgs, PlanCreateArgs};
pub use types::{PlanStatusArg, PriorityArg};
pub use validators::{parse_package_update, validate_identifier, validate_prefix, validate_title};

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Ripple - blast radius analysis and coordinated package rollouts
#[derive(Parser, Debug)]
#[command(name = "ripple")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format (for programmatic use)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new ripple workspace
    ///
    /// Creates a `.ripple/` directory with configuration, an empty dependency
    /// graph snapshot and an empty plan store.
    Init(InitArgs),

    /// Compute the blast radius of a package change
    ///
    /// Lists the repositories and packages that directly depend on the package,
    /// with a risk level and a complexity estimate.
    Analyze(AnalyzeArgs),

    /// Show the tracked dependency graph
    Graph(GraphArgs),

    /// Create, execute and inspect update plans
    Plan(PlanArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args, output_mode).await,
            Some(Commands::Analyze(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_analyze(&app, args, output_mode).await
            }
            Some(Commands::Graph(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_graph(&app, args, output_mode).await
            }
            Some(Commands::Plan(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_plan(&app, &args.action, output_mode).await
            }
            None => {
                println!("Ripple blast radius analysis and rollout planner");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}

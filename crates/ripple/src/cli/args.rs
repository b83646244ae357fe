//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::{Parser, Subcommand};

use super::types::{PlanStatusArg, PriorityArg};
use super::validators::{
    parse_package_update, validate_identifier, validate_prefix, validate_title,
};
use crate::domain::PackageUpdate;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Plan ID prefix (e.g., "plan" for "plan-a3f8")
    ///
    /// Must be 2-20 alphanumeric characters.
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `analyze` command
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Package to analyze
    #[arg(value_parser = validate_identifier)]
    pub package: String,

    /// Version the package would move to
    #[arg(short = 't', long = "to")]
    pub new_version: Option<String>,
}

/// Arguments for the `graph` command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Only show nodes of this repository
    #[arg(short, long, value_parser = validate_identifier)]
    pub repo: Option<String>,
}

/// Arguments for the `plan` command
#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    /// Plan subcommand
    #[command(subcommand)]
    pub action: PlanAction,
}

/// Plan management actions
#[derive(Subcommand, Debug, Clone)]
pub enum PlanAction {
    /// Create an update plan
    ///
    /// The plan covers the given repositories plus every repository the blast
    /// radius of each package reaches.
    Create(PlanCreateArgs),

    /// Execute a plan
    ///
    /// Runs every pending unit one at a time and prints the final status.
    Execute {
        /// Plan ID
        #[arg(value_parser = validate_identifier)]
        plan_id: String,
    },

    /// Show a plan with its execution units
    Show {
        /// Plan ID
        #[arg(value_parser = validate_identifier)]
        plan_id: String,
    },

    /// List plans, newest first
    List {
        /// Only show plans with this status
        #[arg(short, long, value_enum)]
        status: Option<PlanStatusArg>,
    },
}

/// Arguments for `plan create`
#[derive(Parser, Debug, Clone)]
pub struct PlanCreateArgs {
    /// Plan title
    #[arg(value_parser = validate_title)]
    pub title: String,

    /// Detailed description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Package update as name:from:to (repeatable)
    #[arg(short = 'u', long = "package", required = true, value_parser = parse_package_update)]
    pub packages: Vec<PackageUpdate>,

    /// Repository to include even if no blast radius reaches it (repeatable)
    #[arg(short, long = "repo", value_parser = validate_identifier)]
    pub repos: Vec<String>,

    /// Plan priority
    #[arg(short, long, value_enum, default_value = "medium")]
    pub priority: PriorityArg,

    /// How the rollout will be verified
    #[arg(long)]
    pub test_strategy: Option<String>,

    /// How the rollout will be reverted
    #[arg(long)]
    pub rollback_plan: Option<String>,
}

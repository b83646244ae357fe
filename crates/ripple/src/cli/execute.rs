//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::Result;

use super::args::{AnalyzeArgs, GraphArgs, InitArgs, PlanAction, PlanCreateArgs};
use super::types::PlanStatusArg;
use crate::app::App;
use crate::domain::{PlanId, PlanRequest, PlanStatus};
use crate::output::{self, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.prefix.as_deref()).await?;

    if !args.quiet {
        output::print_init_result(&result, output_mode)?;
    }

    Ok(())
}

/// Execute the analyze command
pub async fn execute_analyze(app: &App, args: &AnalyzeArgs, output_mode: OutputMode) -> Result<()> {
    let result = app
        .orchestrator()
        .analyze(&args.package, args.new_version.as_deref())
        .await?;
    output::print_blast_radius(&result, output_mode)?;
    Ok(())
}

/// Execute the graph command
pub async fn execute_graph(app: &App, args: &GraphArgs, output_mode: OutputMode) -> Result<()> {
    let view = app
        .orchestrator()
        .dependency_graph(args.repo.as_deref())
        .await?;
    output::print_graph(&view, output_mode)?;
    Ok(())
}

/// Execute a plan subcommand
pub async fn execute_plan(app: &App, action: &PlanAction, output_mode: OutputMode) -> Result<()> {
    match action {
        PlanAction::Create(args) => execute_plan_create(app, args, output_mode).await,
        PlanAction::Execute { plan_id } => {
            execute_plan_run(app, &PlanId::new(plan_id.as_str()), output_mode).await
        }
        PlanAction::Show { plan_id } => {
            let details = app
                .orchestrator()
                .get_plan(&PlanId::new(plan_id.as_str()))
                .await?;
            output::print_plan_details(&details, output_mode)?;
            Ok(())
        }
        PlanAction::List { status } => execute_plan_list(app, *status, output_mode).await,
    }
}

async fn execute_plan_create(
    app: &App,
    args: &PlanCreateArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let request = PlanRequest {
        title: args.title.clone(),
        description: args.description.clone(),
        package_updates: args.packages.clone(),
        repository_ids: args.repos.clone(),
        priority: Some(args.priority.into()),
        test_strategy: args.test_strategy.clone(),
        rollback_plan: args.rollback_plan.clone(),
    };

    let orchestrator = app.orchestrator();
    let plan_id = orchestrator.create_plan(request).await?;
    let details = orchestrator.get_plan(&plan_id).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&details)?,
        OutputMode::Text => {
            println!("Created plan: {}", plan_id);
            println!(
                "  {} repositories, {} execution units",
                details.plan.affected_repos.len(),
                details.summary.total
            );
        }
    }
    Ok(())
}

async fn execute_plan_run(app: &App, plan_id: &PlanId, output_mode: OutputMode) -> Result<()> {
    let orchestrator = app.orchestrator();

    if output_mode == OutputMode::Text {
        println!("Executing plan {}...", plan_id);
    }

    let status = orchestrator.execute_plan(plan_id.clone()).await??;
    let details = orchestrator.get_plan(plan_id).await?;
    output::print_plan_details(&details, output_mode)?;

    if status == PlanStatus::Failed {
        tracing::warn!(
            plan_id = %plan_id,
            failed = details.summary.failed,
            "Plan finished with failed units"
        );
    }
    Ok(())
}

async fn execute_plan_list(
    app: &App,
    status: Option<PlanStatusArg>,
    output_mode: OutputMode,
) -> Result<()> {
    let plans = app
        .orchestrator()
        .list_plans(status.map(Into::into))
        .await?;
    output::print_plans(&plans, output_mode)?;
    Ok(())
}

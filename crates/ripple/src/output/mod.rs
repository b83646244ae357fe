//! Output formatting for CLI commands.
//!
//! Every printer has a text form for people and a JSON form (`--json`) for
//! scripts. The text writers take any `io::Write` so they can be tested
//! against a buffer.

pub mod color;

use crate::commands::init::InitResult;
use crate::domain::{BlastRadiusResult, PlanDetails, UpdatePlan};
use crate::graph::GraphView;
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success};

use color::{
    bold, colorize_execution_status, colorize_plan_status, colorize_risk, dimmed, execution_icon,
};

// ============================================================================
// Output Configuration
// ============================================================================

/// Settings that control text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(use_ascii: bool, use_colors: bool) -> Self {
        Self {
            use_ascii,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `RIPPLE_ASCII`: "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: any value disables colors
    /// - `RIPPLE_COLOR`: "0" or "false" disables colors (default: true)
    pub fn from_env() -> Self {
        let use_ascii = match env::var("RIPPLE_ASCII") {
            Ok(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Ok(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Ok(v) => {
                tracing::warn!(
                    env_var = "RIPPLE_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            Err(_) => false,
        };

        // https://no-color.org/
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("RIPPLE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{}", json)
}

/// Print a blast radius
pub fn print_blast_radius(result: &BlastRadiusResult, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(result),
        OutputMode::Text => write_blast_radius_text(
            &mut io::stdout().lock(),
            result,
            &OutputConfig::from_env(),
        ),
    }
}

/// Print a plan with its units (for `plan show`)
pub fn print_plan_details(details: &PlanDetails, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(details),
        OutputMode::Text => write_plan_details_text(
            &mut io::stdout().lock(),
            details,
            &OutputConfig::from_env(),
        ),
    }
}

/// Print a list of plans
pub fn print_plans(plans: &[UpdatePlan], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&plans),
        OutputMode::Text => {
            write_plans_text(&mut io::stdout().lock(), plans, &OutputConfig::from_env())
        }
    }
}

/// Print the dependency graph view
pub fn print_graph(view: &GraphView, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(view),
        OutputMode::Text => {
            write_graph_text(&mut io::stdout().lock(), view, &OutputConfig::from_env())
        }
    }
}

/// Print what `init` created
pub fn print_init_result(result: &InitResult, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "ripple_dir": result.ripple_dir.display().to_string(),
            "config_file": result.config_file.display().to_string(),
            "graph_file": result.graph_file.display().to_string(),
            "plans_file": result.plans_file.display().to_string(),
            "prefix": result.prefix,
        })),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let mut w = io::stdout().lock();
            writeln!(
                w,
                "Initialized ripple in {}",
                info(&result.ripple_dir.display().to_string(), &config)
            )?;
            writeln!(w, "  Config: {}", result.config_file.display())?;
            writeln!(w, "  Graph:  {}", result.graph_file.display())?;
            writeln!(w, "  Plans:  {}", result.plans_file.display())?;
            writeln!(w, "  Plan prefix: {}", result.prefix)
        }
    }
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_list<W: Write>(
    w: &mut W,
    title: &str,
    items: impl ExactSizeIterator<Item = impl AsRef<str>>,
    config: &OutputConfig,
) -> io::Result<()> {
    let len = items.len();
    writeln!(w)?;
    writeln!(w, "{} ({}):", bold(title, config), len)?;
    if len == 0 {
        return writeln!(w, "  {}", dimmed("(none)", config));
    }
    for item in items {
        writeln!(w, "  {}", item.as_ref())?;
    }
    Ok(())
}

pub(crate) fn write_blast_radius_text<W: Write>(
    w: &mut W,
    result: &BlastRadiusResult,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}@{}",
        bold("Blast radius of", config),
        result.package_name,
        result.version
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Risk:      ", config),
        colorize_risk(result.risk_level, config)
    )?;
    writeln!(
        w,
        "{} {}/10",
        dimmed("Complexity:", config),
        result.estimated_impact.update_complexity
    )?;

    write_list(
        w,
        "Affected repositories",
        result
            .affected_repositories
            .iter()
            .map(|r| info(r, config)),
        config,
    )?;
    write_list(
        w,
        "Dependent packages",
        result.dependent_packages.iter(),
        config,
    )
}

pub(crate) fn write_plan_details_text<W: Write>(
    w: &mut W,
    details: &PlanDetails,
    config: &OutputConfig,
) -> io::Result<()> {
    let plan = &details.plan;
    writeln!(
        w,
        "{} {}",
        info(plan.id.as_str(), config),
        bold(&plan.title, config)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Status:   ", config),
        colorize_plan_status(plan.status, config)
    )?;
    writeln!(w, "{} {}", dimmed("Priority: ", config), plan.priority)?;
    writeln!(
        w,
        "{} {}",
        dimmed("Created:  ", config),
        plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    if let Some(description) = &plan.description {
        writeln!(w, "{} {}", dimmed("About:    ", config), description)?;
    }
    writeln!(w, "{} {}", dimmed("Testing:  ", config), plan.test_strategy)?;
    writeln!(w, "{} {}", dimmed("Rollback: ", config), plan.rollback_plan)?;

    write_list(
        w,
        "Package updates",
        plan.package_updates.iter().map(|u| u.to_string()),
        config,
    )?;

    let summary = &details.summary;
    writeln!(w)?;
    writeln!(
        w,
        "{} {} total, {} pending, {} running, {} succeeded, {} failed",
        bold("Units:", config),
        summary.total,
        summary.pending,
        summary.running,
        success(&summary.succeeded.to_string(), config),
        error(&summary.failed.to_string(), config),
    )?;
    for unit in &details.executions {
        writeln!(
            w,
            "  {} {} {} {} -> {} [{}]",
            execution_icon(unit.status, config),
            info(&unit.repository_id, config),
            unit.package_name,
            unit.from_version,
            unit.to_version,
            colorize_execution_status(unit.status, config),
        )?;
    }

    let failed = details.failed_pairs();
    if !failed.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", error("Failed updates:", config))?;
        for (repository, package) in failed {
            writeln!(w, "  {repository}: {package}")?;
        }
    }
    Ok(())
}

pub(crate) fn write_plans_text<W: Write>(
    w: &mut W,
    plans: &[UpdatePlan],
    config: &OutputConfig,
) -> io::Result<()> {
    if plans.is_empty() {
        return writeln!(w, "No plans found.");
    }
    for plan in plans {
        writeln!(
            w,
            "{} [{}] {} {}",
            info(plan.id.as_str(), config),
            colorize_plan_status(plan.status, config),
            plan.title,
            dimmed(
                &format!(
                    "({} repos, {} packages)",
                    plan.affected_repos.len(),
                    plan.package_updates.len()
                ),
                config
            ),
        )?;
    }
    Ok(())
}

pub(crate) fn write_graph_text<W: Write>(
    w: &mut W,
    view: &GraphView,
    config: &OutputConfig,
) -> io::Result<()> {
    if view.nodes.is_empty() {
        return writeln!(w, "Dependency graph is empty.");
    }

    writeln!(w, "{} ({}):", bold("Nodes", config), view.nodes.len())?;
    for node in &view.nodes {
        let mut flags = Vec::new();
        if node.is_outdated {
            flags.push("outdated");
        }
        if node.has_vulnerability {
            flags.push("vulnerable");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" {}", error(&flags.join(", "), config))
        };
        writeln!(
            w,
            "  {} {} {}{}",
            info(node.id.as_str(), config),
            node.label,
            dimmed(&node.node_type.to_string(), config),
            flags
        )?;
    }

    writeln!(w)?;
    writeln!(w, "{} ({}):", bold("Edges", config), view.edges.len())?;
    let arrow = if config.use_ascii { "->" } else { "→" };
    for edge in &view.edges {
        writeln!(
            w,
            "  {} {} {} {}",
            edge.source,
            arrow,
            edge.target,
            dimmed(&edge.version_range, config)
        )?;
    }
    Ok(())
}

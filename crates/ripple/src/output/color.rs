//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success:   green   (COMPLETED plans, SUCCESS units, LOW risk)
//!   - Active:    yellow  (IN_PROGRESS / RUNNING, MEDIUM risk)
//!   - Error:     red     (FAILED, HIGH and CRITICAL risk)
//!   - Reference: cyan    (plan IDs, repositories)
//!   - Muted:     dimmed  (field labels, PENDING units)
//!   - Emphasis:  bold    (section headers)

use crate::domain::{ExecutionStatus, PlanStatus, RiskLevel};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Apply color to a plan status.
pub(crate) fn colorize_plan_status(status: PlanStatus, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        PlanStatus::Planned => text.white().to_string(),
        PlanStatus::InProgress => text.yellow().to_string(),
        PlanStatus::Completed => text.green().to_string(),
        PlanStatus::Failed => text.red().to_string(),
    }
}

/// Apply color to a unit status.
pub(crate) fn colorize_execution_status(status: ExecutionStatus, config: &OutputConfig) -> String {
    colorize_by_execution_status(&status.to_string(), status, config)
}

/// Apply color to a risk level; CRITICAL is also bold.
pub(crate) fn colorize_risk(risk: RiskLevel, config: &OutputConfig) -> String {
    let text = risk.to_string();
    if !config.use_colors {
        return text;
    }
    match risk {
        RiskLevel::Low => text.green().to_string(),
        RiskLevel::Medium => text.yellow().to_string(),
        RiskLevel::High => text.red().to_string(),
        RiskLevel::Critical => text.red().bold().to_string(),
    }
}

/// Status icon for a unit.
pub(crate) fn execution_icon(status: ExecutionStatus, config: &OutputConfig) -> String {
    let icon = match (status, config.use_ascii) {
        (ExecutionStatus::Pending, false) => "○",
        (ExecutionStatus::Running, false) => "▶",
        (ExecutionStatus::Success, false) => "✓",
        (ExecutionStatus::Failed, false) => "✗",
        (ExecutionStatus::Pending, true) => "o",
        (ExecutionStatus::Running, true) => ">",
        (ExecutionStatus::Success, true) => "+",
        (ExecutionStatus::Failed, true) => "x",
    };
    colorize_by_execution_status(icon, status, config)
}

fn colorize_by_execution_status(
    text: &str,
    status: ExecutionStatus,
    config: &OutputConfig,
) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    match status {
        ExecutionStatus::Pending => text.dimmed().to_string(),
        ExecutionStatus::Running => text.yellow().to_string(),
        ExecutionStatus::Success => text.green().to_string(),
        ExecutionStatus::Failed => text.red().to_string(),
    }
}

//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::{PlanStatus, Priority};

/// Plan priority for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityArg {
    /// Routine maintenance
    Low,
    /// Default priority
    #[default]
    Medium,
    /// Should be rolled out soon
    High,
    /// Roll out immediately
    Critical,
}

impl std::fmt::Display for PriorityArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Critical => Priority::Critical,
        }
    }
}

/// Plan status for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatusArg {
    /// Created, not yet executed
    Planned,
    /// Currently executing
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    /// Every unit succeeded
    Completed,
    /// At least one unit failed
    Failed,
}

impl std::fmt::Display for PlanStatusArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planned => write!(f, "planned"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl From<PlanStatusArg> for PlanStatus {
    fn from(arg: PlanStatusArg) -> Self {
        match arg {
            PlanStatusArg::Planned => PlanStatus::Planned,
            PlanStatusArg::InProgress => PlanStatus::InProgress,
            PlanStatusArg::Completed => PlanStatus::Completed,
            PlanStatusArg::Failed => PlanStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PriorityArg::Low, Priority::Low)]
    #[case(PriorityArg::Medium, Priority::Medium)]
    #[case(PriorityArg::High, Priority::High)]
    #[case(PriorityArg::Critical, Priority::Critical)]
    fn test_priority_conversion(#[case] arg: PriorityArg, #[case] expected: Priority) {
        assert_eq!(Priority::from(arg), expected);
    }

    #[rstest]
    #[case(PlanStatusArg::Planned, PlanStatus::Planned)]
    #[case(PlanStatusArg::InProgress, PlanStatus::InProgress)]
    #[case(PlanStatusArg::Completed, PlanStatus::Completed)]
    #[case(PlanStatusArg::Failed, PlanStatus::Failed)]
    fn test_status_conversion(#[case] arg: PlanStatusArg, #[case] expected: PlanStatus) {
        assert_eq!(PlanStatus::from(arg), expected);
    }

    #[test]
    fn test_default_priority_matches_domain() {
        assert_eq!(Priority::from(PriorityArg::default()), Priority::default());
    }
}

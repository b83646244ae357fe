//! Domain types for blast radius analysis and update plans.
//!
//! - [`graph`]: dependency nodes, edges and the blast radius result
//! - [`plan`]: update plans, execution units and their status machines

/// Generates the shared string-newtype boilerplate for identifiers.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

pub mod graph;
pub mod plan;

pub use graph::{
    BlastRadiusResult, DependencyEdge, DependencyNode, EstimatedImpact, NodeId, NodeType,
    RiskLevel, UNKNOWN_VERSION,
};
pub use plan::{
    aggregate_status, ExecutionId, ExecutionStatus, NewExecution, NewPlan, PackageUpdate,
    PlanDetails, PlanFilter, PlanId, PlanRequest, PlanStatus, PlanSummary, Priority,
    UpdateExecution, UpdatePlan, DEFAULT_ROLLBACK_PLAN, DEFAULT_TEST_STRATEGY,
};

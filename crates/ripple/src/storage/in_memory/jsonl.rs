//! JSONL persistence for in-memory plan storage.
//!
//! Plans and their units share one file as two tagged record kinds. A plan
//! record is written first, followed by its units in sequence order:
//!
//! ```text
//! {"kind":"plan","id":"plan-a3f8","title":"Bump lodash",...}
//! {"kind":"execution","id":"plan-a3f8.1","plan_id":"plan-a3f8","sequence":0,...}
//! ```

use super::inner::PlanStoreInner;
use crate::domain::{ExecutionId, PlanDetails, PlanId, UpdateExecution, UpdatePlan};
use crate::error::Result;
use crate::jsonl::{read_jsonl_resilient, write_jsonl_atomic};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One line of `plans.jsonl`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlanRecord {
    /// An update plan
    Plan(UpdatePlan),
    /// One of a plan's execution units
    Execution(UpdateExecution),
}

/// Warnings that can occur during JSONL file loading.
///
/// These are non-fatal: the offending record is skipped and everything else
/// is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Malformed JSON line that couldn't be parsed
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser or decoder message
        error: String,
    },

    /// A plan ID appeared more than once; the first occurrence wins
    DuplicatePlan {
        /// The repeated ID
        plan_id: PlanId,
        /// Line of the skipped duplicate
        line_number: usize,
    },

    /// A unit ID appeared more than once; the first occurrence wins
    DuplicateExecution {
        /// The repeated ID
        execution_id: ExecutionId,
        /// Line of the skipped duplicate
        line_number: usize,
    },

    /// Unit references a plan that isn't in the file
    OrphanedExecution {
        /// The skipped unit
        execution_id: ExecutionId,
        /// The missing plan it points at
        plan_id: PlanId,
        /// Line of the skipped unit
        line_number: usize,
    },
}

/// Load plan state from a JSONL file.
///
/// Plans are loaded before units so record order within the file does not
/// matter.
pub(crate) async fn load_from_jsonl(
    path: &Path,
    prefix: String,
) -> Result<(PlanStoreInner, Vec<LoadWarning>)> {
    let (records, malformed) = read_jsonl_resilient::<PlanRecord>(path).await?;

    let mut warnings: Vec<LoadWarning> = malformed
        .into_iter()
        .map(|m| LoadWarning::MalformedJson {
            line_number: m.line_number,
            error: m.error,
        })
        .collect();

    let mut inner = PlanStoreInner::new(prefix);
    let mut executions = Vec::new();

    // First pass: plans
    for (line_number, record) in records {
        match record {
            PlanRecord::Plan(plan) => {
                if inner.get_plan(&plan.id).is_some() {
                    warnings.push(LoadWarning::DuplicatePlan {
                        plan_id: plan.id,
                        line_number,
                    });
                    continue;
                }
                inner.insert_plan(plan);
            }
            PlanRecord::Execution(execution) => executions.push((line_number, execution)),
        }
    }

    // Second pass: units, which need their plan
    for (line_number, execution) in executions {
        if inner.get_plan(&execution.plan_id).is_none() {
            warnings.push(LoadWarning::OrphanedExecution {
                execution_id: execution.id,
                plan_id: execution.plan_id,
                line_number,
            });
            continue;
        }
        if inner.contains_execution(&execution.id) {
            warnings.push(LoadWarning::DuplicateExecution {
                execution_id: execution.id,
                line_number,
            });
            continue;
        }
        inner.insert_execution(execution);
    }

    Ok((inner, warnings))
}

/// Save plan state to a JSONL file with an atomic write.
pub(crate) async fn save_to_jsonl(inner: &PlanStoreInner, path: &Path) -> Result<()> {
    write_jsonl_atomic(path, records(inner.export_all())).await
}

fn records(details: Vec<PlanDetails>) -> impl Iterator<Item = PlanRecord> {
    details.into_iter().flat_map(|d| {
        std::iter::once(PlanRecord::Plan(d.plan))
            .chain(d.executions.into_iter().map(PlanRecord::Execution))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewExecution, NewPlan, PackageUpdate, PlanFilter, Priority};
    use tempfile::tempdir;

    fn new_plan(repos: &[&str]) -> NewPlan {
        let update = PackageUpdate::new("lodash", "4.17.15", "4.17.21");
        NewPlan {
            title: "Bump lodash".to_string(),
            description: None,
            priority: Priority::High,
            affected_repos: repos.iter().map(|r| r.to_string()).collect(),
            package_updates: vec![update.clone()],
            test_strategy: "ci".to_string(),
            rollback_plan: "revert".to_string(),
            units: repos
                .iter()
                .map(|r| NewExecution {
                    repository_id: r.to_string(),
                    update: update.clone(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_plans_and_units() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plans.jsonl");

        let mut inner = PlanStoreInner::new("plan".to_string());
        let plan = inner.create_plan(new_plan(&["repoA", "repoB"])).unwrap();
        save_to_jsonl(&inner, &path).await.unwrap();

        let (loaded, warnings) = load_from_jsonl(&path, "plan".to_string()).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(loaded.get_plan(&plan.id), Some(plan.clone()));

        let units = loaded.get_executions(&plan.id).unwrap();
        let repos: Vec<_> = units.iter().map(|u| u.repository_id.as_str()).collect();
        assert_eq!(repos, vec!["repoA", "repoB"]);
        assert_eq!(loaded.list_plans(&PlanFilter::default()).len(), 1);
    }

    #[tokio::test]
    async fn test_orphaned_and_malformed_records_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plans.jsonl");

        let mut inner = PlanStoreInner::new("plan".to_string());
        let plan = inner.create_plan(new_plan(&["repoA"])).unwrap();
        let mut orphan = inner.get_executions(&plan.id).unwrap().remove(0);
        orphan.id = ExecutionId::new("plan-gone.1");
        orphan.plan_id = PlanId::new("plan-gone");

        let mut lines = vec![serde_json::to_string(&PlanRecord::Execution(orphan)).unwrap()];
        lines.push("not json".to_string());
        for record in records(inner.export_all()) {
            lines.push(serde_json::to_string(&record).unwrap());
        }
        std::fs::write(&path, lines.join("\n")).unwrap();

        let (loaded, warnings) = load_from_jsonl(&path, "plan".to_string()).await.unwrap();
        assert_eq!(loaded.get_executions(&plan.id).unwrap().len(), 1);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            warnings[0],
            LoadWarning::MalformedJson { line_number: 2, .. }
        ));
        assert!(matches!(
            warnings[1],
            LoadWarning::OrphanedExecution { line_number: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_line_does_not_block_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plans.jsonl");

        let mut inner = PlanStoreInner::new("plan".to_string());
        let plan = inner.create_plan(new_plan(&["repoA"])).unwrap();
        let mut content = b"\xc3\x28 corrupt\n".to_vec();
        for record in records(inner.export_all()) {
            content.extend_from_slice(serde_json::to_string(&record).unwrap().as_bytes());
            content.push(b'\n');
        }
        std::fs::write(&path, content).unwrap();

        let (loaded, warnings) = load_from_jsonl(&path, "plan".to_string()).await.unwrap();
        assert_eq!(loaded.get_plan(&plan.id), Some(plan.clone()));
        assert_eq!(loaded.get_executions(&plan.id).unwrap().len(), 1);
        assert!(matches!(
            warnings.as_slice(),
            [LoadWarning::MalformedJson { line_number: 1, .. }]
        ));
    }

    #[tokio::test]
    async fn test_unit_order_restored_from_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plans.jsonl");

        let mut inner = PlanStoreInner::new("plan".to_string());
        let plan = inner
            .create_plan(new_plan(&["repoA", "repoB", "repoC"]))
            .unwrap();

        // Units written in reverse
        let details = inner.export_all().remove(0);
        let mut lines = vec![serde_json::to_string(&PlanRecord::Plan(details.plan)).unwrap()];
        for unit in details.executions.into_iter().rev() {
            lines.push(serde_json::to_string(&PlanRecord::Execution(unit)).unwrap());
        }
        std::fs::write(&path, lines.join("\n")).unwrap();

        let (loaded, _) = load_from_jsonl(&path, "plan".to_string()).await.unwrap();
        let sequences: Vec<_> = loaded
            .get_executions(&plan.id)
            .unwrap()
            .iter()
            .map(|u| u.sequence)
            .collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }
}

//! Step sequencing
//!
//! A pipeline stage is an ordered list of named statements. Steps run one at
//! a time and each is committed on its own; there is no stage-level
//! transaction. When a step fails the stage stops there, so everything before
//! it stays applied and a rerun can resume at the failed step.

use crate::db::Warehouse;
use crate::{Error, Result};
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info};

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DropTables,
    CreateTables,
    LoadStaging,
    InsertAnalytical,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::DropTables => "drop tables",
            Stage::CreateTables => "create tables",
            Stage::LoadStaging => "load staging",
            Stage::InsertAnalytical => "insert analytical",
        };
        f.write_str(name)
    }
}

/// One named, independently committed statement
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Step name (the table it targets)
    pub name: &'static str,
    pub sql: String,
}

impl Step {
    pub fn new(name: &'static str, sql: impl Into<String>) -> Self {
        Self {
            name,
            sql: sql.into(),
        }
    }
}

/// Outcome of a completed stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage: Stage,
    /// (step name, rows affected) in execution order
    pub steps: Vec<(&'static str, u64)>,
}

/// Run steps in order, stopping at the first failure
pub async fn run_steps<W>(warehouse: &mut W, stage: Stage, steps: &[Step]) -> Result<StageSummary>
where
    W: Warehouse + ?Sized,
{
    info!("=== {} ({} steps, {}) ===", stage, steps.len(), warehouse.describe());

    let mut summary = StageSummary {
        stage,
        steps: Vec::with_capacity(steps.len()),
    };

    for step in steps {
        info!("{}: {}", stage, step.name);
        debug!("{}", step.sql.trim());

        let started = Instant::now();
        match warehouse.run_statement(&step.sql).await {
            Ok(rows) => {
                info!(
                    "  ✓ {} ({} rows, {:.1}s)",
                    step.name,
                    rows,
                    started.elapsed().as_secs_f64()
                );
                summary.steps.push((step.name, rows));
            }
            Err(e) => {
                error!("  ✗ {} failed: {}", step.name, e);
                return Err(Error::Statement {
                    stage: stage.to_string(),
                    step: step.name.to_string(),
                    source: Box::new(e),
                });
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Fails on the first statement containing `fail_on`
    struct FailingWarehouse {
        fail_on: &'static str,
        executed: Vec<String>,
    }

    #[async_trait]
    impl Warehouse for FailingWarehouse {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        async fn run_statement(&mut self, sql: &str) -> Result<u64> {
            if sql.contains(self.fail_on) {
                return Err(Error::InvalidInput(format!("rejected: {}", sql)));
            }
            self.executed.push(sql.to_string());
            Ok(1)
        }
    }

    fn steps() -> Vec<Step> {
        vec![
            Step::new("first", "SELECT 'first'"),
            Step::new("second", "SELECT 'second'"),
            Step::new("third", "SELECT 'third'"),
        ]
    }

    #[tokio::test]
    async fn test_run_steps_in_order() {
        let mut warehouse = FailingWarehouse {
            fail_on: "never",
            executed: Vec::new(),
        };

        let summary = run_steps(&mut warehouse, Stage::InsertAnalytical, &steps())
            .await
            .unwrap();

        assert_eq!(summary.stage, Stage::InsertAnalytical);
        assert_eq!(summary.steps, vec![("first", 1), ("second", 1), ("third", 1)]);
        assert_eq!(
            warehouse.executed,
            vec!["SELECT 'first'", "SELECT 'second'", "SELECT 'third'"]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_stage_and_keeps_prior_steps() {
        let mut warehouse = FailingWarehouse {
            fail_on: "second",
            executed: Vec::new(),
        };

        let err = run_steps(&mut warehouse, Stage::LoadStaging, &steps())
            .await
            .unwrap_err();

        // First step stays applied, third never runs
        assert_eq!(warehouse.executed, vec!["SELECT 'first'"]);
        match err {
            Error::Statement { stage, step, source } => {
                assert_eq!(stage, "load staging");
                assert_eq!(step, "second");
                assert!(source.to_string().contains("rejected"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_statement_error_message_names_step() {
        let err = Error::Statement {
            stage: Stage::CreateTables.to_string(),
            step: "songs".to_string(),
            source: Box::new(Error::InvalidInput("boom".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "create tables step 'songs' failed: Invalid input: boom"
        );
    }
}

//! Schema Manager
//!
//! Drops and recreates the seven warehouse tables, staging tables first. No
//! foreign keys are declared, so the order is convention only. Each DDL
//! statement commits on its own; a failure leaves earlier statements applied
//! and a rerun is always safe because drops use `IF EXISTS`.

use crate::db::{all_tables, Dialect, Warehouse};
use crate::pipeline::{run_steps, Stage, StageSummary, Step};
use crate::Result;

/// Drop statements for all tables, staging first
pub fn drop_steps() -> Vec<Step> {
    all_tables()
        .into_iter()
        .map(|t| Step::new(t.name, t.drop_sql()))
        .collect()
}

/// Create statements for all tables, staging first
pub fn create_steps(dialect: Dialect) -> Vec<Step> {
    all_tables()
        .into_iter()
        .map(|t| Step::new(t.name, t.create_sql(dialect)))
        .collect()
}

/// Drop every table if it exists
pub async fn drop_all<W>(warehouse: &mut W) -> Result<StageSummary>
where
    W: Warehouse + ?Sized,
{
    run_steps(warehouse, Stage::DropTables, &drop_steps()).await
}

/// Create every table
pub async fn create_all<W>(warehouse: &mut W, dialect: Dialect) -> Result<StageSummary>
where
    W: Warehouse + ?Sized,
{
    run_steps(warehouse, Stage::CreateTables, &create_steps(dialect)).await
}

/// Drop then create, as the `create-tables` tool does
pub async fn recreate_all<W>(warehouse: &mut W, dialect: Dialect) -> Result<()>
where
    W: Warehouse + ?Sized,
{
    drop_all(warehouse).await?;
    create_all(warehouse, dialect).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DryRunWarehouse;

    #[tokio::test]
    async fn test_drop_all_order() {
        let mut warehouse = DryRunWarehouse::new();
        let summary = drop_all(&mut warehouse).await.unwrap();

        assert_eq!(summary.steps.len(), 7);
        assert_eq!(
            warehouse.statements(),
            [
                "DROP TABLE IF EXISTS staging_events",
                "DROP TABLE IF EXISTS staging_songs",
                "DROP TABLE IF EXISTS songplays",
                "DROP TABLE IF EXISTS users",
                "DROP TABLE IF EXISTS songs",
                "DROP TABLE IF EXISTS artists",
                "DROP TABLE IF EXISTS time",
            ]
        );
    }

    #[tokio::test]
    async fn test_create_all_order_staging_first() {
        let mut warehouse = DryRunWarehouse::new();
        create_all(&mut warehouse, Dialect::Redshift).await.unwrap();

        let created: Vec<&str> = warehouse
            .statements()
            .iter()
            .map(|s| s.lines().next().unwrap_or(""))
            .collect();
        assert_eq!(
            created,
            [
                "CREATE TABLE staging_events",
                "CREATE TABLE staging_songs",
                "CREATE TABLE songplays",
                "CREATE TABLE users",
                "CREATE TABLE songs",
                "CREATE TABLE artists",
                "CREATE TABLE time",
            ]
        );
    }

    #[tokio::test]
    async fn test_recreate_twice_issues_identical_statements() {
        let mut first = DryRunWarehouse::new();
        recreate_all(&mut first, Dialect::Redshift).await.unwrap();

        let mut second = DryRunWarehouse::new();
        recreate_all(&mut second, Dialect::Redshift).await.unwrap();
        recreate_all(&mut second, Dialect::Redshift).await.unwrap();

        let statements = second.into_statements();
        assert_eq!(statements.len(), 28);
        assert_eq!(&statements[..14], first.statements());
        assert_eq!(&statements[14..], first.statements());
    }

    #[test]
    fn test_step_names_match_tables() {
        let names: Vec<&str> = create_steps(Dialect::Postgres).iter().map(|s| s.name).collect();
        let drop_names: Vec<&str> = drop_steps().iter().map(|s| s.name).collect();
        assert_eq!(names, drop_names);
    }
}

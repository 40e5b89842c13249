//! Tool workflows
//!
//! The write path of each tool is generic over [`Warehouse`] so the same
//! sequence runs against the live connection or a dry run.

use crate::cli::{CreateTablesArgs, EtlArgs};
use anyhow::{Context, Result};
use futures::TryStreamExt;
use playdw_common::config::DwhConfig;
use playdw_common::db::{connect, Dialect, DryRunWarehouse, Warehouse};
use playdw_common::report::Report;
use playdw_common::schema_manager::{create_all, drop_all};
use playdw_common::staging::load_staging;
use playdw_common::transform::{insert_steps_from, run_inserts};
use playdw_common::verify::{verify, VerificationReport, VerifyOptions};
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

/// Drop then create every table
pub async fn recreate_schema<W>(warehouse: &mut W, dialect: Dialect) -> Result<()>
where
    W: Warehouse + ?Sized,
{
    info!("Dropping existing tables...");
    drop_all(warehouse).await?;

    info!("Creating new tables...");
    create_all(warehouse, dialect).await?;
    info!("Tables created!");

    Ok(())
}

/// Staging load (unless skipped) followed by the analytical inserts
pub async fn load_warehouse<W>(warehouse: &mut W, config: &DwhConfig, args: &EtlArgs) -> Result<()>
where
    W: Warehouse + ?Sized,
{
    if args.loads_staging() {
        info!("Loading staging tables...");
        load_staging(warehouse, &config.staging_sources(), config.etl.dialect).await?;
        info!("Data is now staged in the warehouse");
    } else {
        warn!("Skipping staging load; using the staging tables as they are");
    }

    info!("Populating analytical tables...");
    run_inserts(
        warehouse,
        &config.transform_options(),
        args.start_at.as_deref(),
    )
    .await?;
    info!("Analytical tables are now loaded");

    Ok(())
}

fn print_statements(statements: &[String]) {
    for statement in statements {
        println!("{};\n", statement.trim());
    }
}

/// `create-tables` entry point
pub async fn create_tables(args: &CreateTablesArgs, config: &DwhConfig) -> Result<()> {
    let dialect = config.etl.dialect;

    if args.common.dry_run {
        let mut warehouse = DryRunWarehouse::new();
        recreate_schema(&mut warehouse, dialect).await?;
        print_statements(warehouse.statements());
        return Ok(());
    }

    let mut conn = connect(config).await?;
    recreate_schema(&mut conn, dialect).await?;
    conn.close().await.context("Failed to close connection")?;

    Ok(())
}

/// `etl` entry point
pub async fn etl(args: &EtlArgs, config: &DwhConfig) -> Result<()> {
    // Reject a bad --start-at before touching the warehouse
    insert_steps_from(&config.transform_options(), args.start_at.as_deref())?;

    if args.common.dry_run {
        let mut warehouse = DryRunWarehouse::new();
        load_warehouse(&mut warehouse, config, args).await?;
        print_statements(warehouse.statements());
        if args.report || args.verify {
            warn!("--report and --verify need a live warehouse; skipped in dry run");
        }
        return Ok(());
    }

    let mut conn = connect(config).await?;
    load_warehouse(&mut conn, config, args).await?;

    if args.report {
        print_reports(&mut conn).await?;
    }

    if args.verify {
        let options = VerifyOptions {
            time_sample_size: config.etl.verify_sample_size,
        };
        let report = verify(&mut conn, &options).await?;
        print_verification(&report);
        if !report.passed() {
            anyhow::bail!(
                "{} verification check(s) failed",
                report.failures().count()
            );
        }
    }

    conn.close().await.context("Failed to close connection")?;
    Ok(())
}

/// Print every report, row by row as they arrive
pub async fn print_reports(conn: &mut PgConnection) -> Result<()> {
    for report in Report::ALL {
        println!("{}", report.label());

        let mut rows = report.rows(conn);
        let mut printed = 0;
        while let Some(row) = rows.try_next().await? {
            println!("  {}", row);
            printed += 1;
        }
        if printed == 0 {
            println!("  (no rows)");
        }
        println!();
    }

    Ok(())
}

fn print_verification(report: &VerificationReport) {
    println!("Verification");
    for check in &report.checks {
        let mark = if check.passed { "ok  " } else { "FAIL" };
        println!("  [{}] {}: {}", mark, check.name, check.detail);
    }
}

//! create-tables - drop and recreate the warehouse schema
//!
//! Drops all seven tables if they exist, then creates them, staging tables
//! first. Safe to rerun at any time.

use anyhow::Result;
use clap::Parser;
use playdw_common::config::{ConfigResolver, DwhConfig};
use playdw_etl::cli::CreateTablesArgs;
use playdw_etl::{build_info, logging, run};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CreateTablesArgs::parse();

    let resolver = ConfigResolver::new(args.common.config.clone());
    let config_path = resolver.resolve()?;
    let config = DwhConfig::load(&config_path)?;

    logging::init_tracing(&config.logging)?;
    info!("Starting {}", build_info("create-tables"));
    info!("Configuration: {}", config_path.display());

    if let Err(e) = run::create_tables(&args, &config).await {
        error!("create-tables failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}

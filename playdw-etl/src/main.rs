//! etl - load staging data and populate the analytical tables
//!
//! Sequence: bulk-load `staging_events` and `staging_songs` from object
//! storage, then run the five analytical inserts. Each statement commits on
//! its own; a failure stops the run and leaves earlier statements applied.

use anyhow::Result;
use clap::Parser;
use playdw_common::config::{ConfigResolver, DwhConfig};
use playdw_etl::cli::EtlArgs;
use playdw_etl::{build_info, logging, run};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = EtlArgs::parse();

    let resolver = ConfigResolver::new(args.common.config.clone());
    let config_path = resolver.resolve()?;
    let config = DwhConfig::load(&config_path)?;

    logging::init_tracing(&config.logging)?;
    info!("Starting {}", build_info("etl"));
    info!("Configuration: {}", config_path.display());
    info!(
        "Dialect: {}, join rule: {:?}, user dedup: {:?}",
        config.etl.dialect, config.etl.join_rule, config.etl.user_dedup
    );

    if let Err(e) = run::etl(&args, &config).await {
        error!("ETL failed: {:#}", e);
        return Err(e);
    }

    info!("ETL complete");
    Ok(())
}

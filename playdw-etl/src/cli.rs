//! Command-line arguments

use clap::{Args, Parser};
use std::path::PathBuf;

/// Options shared by both tools
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to dwh.toml (default: $PLAYDW_CONFIG, ./dwh.toml, then the user config dir)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the statements that would run without connecting
    #[arg(long)]
    pub dry_run: bool,
}

/// Drop and recreate all warehouse tables
#[derive(Parser, Debug, Clone)]
#[command(name = "create-tables")]
#[command(about = "Drop and recreate the staging and analytical tables")]
#[command(version)]
pub struct CreateTablesArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Load staging data and populate the analytical tables
#[derive(Parser, Debug, Clone)]
#[command(name = "etl")]
#[command(about = "Load staging tables from object storage and populate the analytical tables")]
#[command(version)]
pub struct EtlArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Do not bulk-load the staging tables (they are already loaded)
    #[arg(long)]
    pub skip_staging: bool,

    /// Resume the inserts at this step (songplays, users, songs, artists, time); implies --skip-staging
    #[arg(long, value_name = "STEP")]
    pub start_at: Option<String>,

    /// Print the reporting queries after loading
    #[arg(long)]
    pub report: bool,

    /// Check the loaded tables after loading; fails if any check fails
    #[arg(long)]
    pub verify: bool,
}

impl EtlArgs {
    /// Whether the staging load runs
    pub fn loads_staging(&self) -> bool {
        !self.skip_staging && self.start_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etl_defaults() {
        let args = EtlArgs::try_parse_from(["etl"]).unwrap();

        assert!(args.common.config.is_none());
        assert!(!args.common.dry_run);
        assert!(args.loads_staging());
        assert!(!args.report);
        assert!(!args.verify);
    }

    #[test]
    fn test_etl_all_flags() {
        let args = EtlArgs::try_parse_from([
            "etl",
            "--config",
            "/etc/playdw/dwh.toml",
            "--dry-run",
            "--skip-staging",
            "--report",
            "--verify",
        ])
        .unwrap();

        assert_eq!(args.common.config, Some(PathBuf::from("/etc/playdw/dwh.toml")));
        assert!(args.common.dry_run);
        assert!(!args.loads_staging());
        assert!(args.report);
        assert!(args.verify);
    }

    #[test]
    fn test_start_at_implies_skip_staging() {
        let args = EtlArgs::try_parse_from(["etl", "--start-at", "users"]).unwrap();

        assert_eq!(args.start_at.as_deref(), Some("users"));
        assert!(!args.skip_staging);
        assert!(!args.loads_staging());
    }

    #[test]
    fn test_create_tables_args() {
        let args = CreateTablesArgs::try_parse_from(["create-tables", "-c", "dwh.toml"]).unwrap();
        assert_eq!(args.common.config, Some(PathBuf::from("dwh.toml")));

        assert!(CreateTablesArgs::try_parse_from(["create-tables", "--report"]).is_err());
    }
}

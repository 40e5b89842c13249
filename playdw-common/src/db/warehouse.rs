//! Statement execution against the warehouse
//!
//! Every pipeline statement goes through [`Warehouse::run_statement`]. The
//! live implementation sends each statement on its own over a single
//! connection with no surrounding transaction, so each one is committed by
//! the server as soon as it completes.

use crate::config::DwhConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::{Connection, PgConnection};
use tracing::{debug, error, info};

/// Executes write statements, one committed unit each
#[async_trait]
pub trait Warehouse: Send {
    /// Target description for log lines
    fn describe(&self) -> String;

    /// Execute one statement and commit it; returns rows affected
    async fn run_statement(&mut self, sql: &str) -> Result<u64>;
}

#[async_trait]
impl Warehouse for PgConnection {
    fn describe(&self) -> String {
        "warehouse connection".to_string()
    }

    async fn run_statement(&mut self, sql: &str) -> Result<u64> {
        // Simple query protocol: COPY and DDL are not prepared
        let result = sqlx::Executor::execute(self, sqlx::raw_sql(sql)).await?;
        Ok(result.rows_affected())
    }
}

/// Open the single connection used for a whole run
pub async fn connect(config: &DwhConfig) -> Result<PgConnection> {
    info!(
        "Connecting to {}:{}/{} as {}",
        config.cluster.host, config.cluster.db_port, config.cluster.db_name, config.cluster.db_user
    );

    match PgConnection::connect_with(&config.connect_options()).await {
        Ok(conn) => {
            info!("✓ Connected to warehouse");
            Ok(conn)
        }
        Err(e) => {
            error!("Failed to connect to warehouse: {}", e);
            Err(Error::Connection(e))
        }
    }
}

/// Records statements instead of executing them
///
/// Backs the `--dry-run` CLI flag and the statement-order tests.
#[derive(Debug, Default)]
pub struct DryRunWarehouse {
    statements: Vec<String>,
}

impl DryRunWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements in execution order
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }
}

#[async_trait]
impl Warehouse for DryRunWarehouse {
    fn describe(&self) -> String {
        "dry run".to_string()
    }

    async fn run_statement(&mut self, sql: &str) -> Result<u64> {
        debug!("dry run: {}", sql.trim());
        self.statements.push(sql.to_string());
        Ok(0)
    }
}

//! Configuration loading and config file resolution
//!
//! Configuration comes from a single TOML file (`dwh.toml`). Resolution of the
//! file follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `PLAYDW_CONFIG` environment variable
//! 3. `./dwh.toml` in the working directory
//! 4. `<user config dir>/playdw/dwh.toml` (fallback)
//!
//! Secrets may be supplied through `PLAYDW_DB_PASSWORD` and `PLAYDW_ROLE_ARN`,
//! which override the corresponding file values.

use crate::db::Dialect;
use crate::staging::StagingSources;
use crate::transform::{JoinRule, TransformOptions, UserDedup};
use crate::{Error, Result};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PLAYDW_CONFIG";
/// Environment variable overriding `cluster.db_password`
pub const PASSWORD_ENV_VAR: &str = "PLAYDW_DB_PASSWORD";
/// Environment variable overriding `iam.role_arn`
pub const ROLE_ARN_ENV_VAR: &str = "PLAYDW_ROLE_ARN";

const CONFIG_FILE_NAME: &str = "dwh.toml";

/// Complete tool configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct DwhConfig {
    /// Warehouse cluster endpoint and credentials
    pub cluster: ClusterConfig,

    /// Role used by the bulk-load statements
    pub iam: IamConfig,

    /// External dataset locations
    #[serde(default)]
    pub s3: S3Config,

    /// Transform and verification options
    #[serde(default)]
    pub etl: EtlConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cluster connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    #[serde(default)]
    pub db_password: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
}

/// IAM role settings
#[derive(Debug, Clone, Deserialize)]
pub struct IamConfig {
    #[serde(default)]
    pub role_arn: String,
}

/// Object storage dataset locations
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    #[serde(default = "default_log_data")]
    pub log_data: String,
    #[serde(default = "default_log_jsonpath")]
    pub log_jsonpath: String,
    #[serde(default = "default_song_data")]
    pub song_data: String,
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            log_data: default_log_data(),
            log_jsonpath: default_log_jsonpath(),
            song_data: default_song_data(),
            region: default_region(),
        }
    }
}

/// Pipeline options
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    /// SQL dialect used to render DDL
    #[serde(default)]
    pub dialect: Dialect,

    /// Condition joining events to songs for the songplays fact table
    #[serde(default)]
    pub join_rule: JoinRule,

    /// Which event row represents a user
    #[serde(default)]
    pub user_dedup: UserDedup,

    /// Number of `time` rows checked against the Rust decomposition
    #[serde(default = "default_verify_sample_size")]
    pub verify_sample_size: u32,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            join_rule: JoinRule::default(),
            user_dedup: UserDedup::default(),
            verify_sample_size: default_verify_sample_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stdout if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_db_port() -> u16 {
    5439 // Redshift default port
}

fn default_log_data() -> String {
    "s3://udacity-dend/log_data/".to_string()
}

fn default_log_jsonpath() -> String {
    "s3://udacity-dend/log_json_path.json".to_string()
}

fn default_song_data() -> String {
    "s3://udacity-dend/song_data/".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_verify_sample_size() -> u32 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DwhConfig {
    /// Parse configuration from TOML text (no env overrides, no validation)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration from a file, apply env overrides and validate
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Replace secrets with environment values when present
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var(PASSWORD_ENV_VAR) {
            debug!("Using database password from {}", PASSWORD_ENV_VAR);
            self.cluster.db_password = password;
        }
        if let Ok(role_arn) = std::env::var(ROLE_ARN_ENV_VAR) {
            debug!("Using role ARN from {}", ROLE_ARN_ENV_VAR);
            self.iam.role_arn = role_arn;
        }
    }

    /// Check required values
    pub fn validate(&self) -> Result<()> {
        if self.cluster.host.trim().is_empty() {
            return Err(Error::Config("cluster.host must not be empty".to_string()));
        }
        if self.cluster.db_name.trim().is_empty() {
            return Err(Error::Config("cluster.db_name must not be empty".to_string()));
        }
        if self.cluster.db_user.trim().is_empty() {
            return Err(Error::Config("cluster.db_user must not be empty".to_string()));
        }
        if self.cluster.db_port == 0 {
            return Err(Error::Config("cluster.db_port must not be 0".to_string()));
        }

        // Postgres targets never bulk-load from object storage
        if self.etl.dialect == Dialect::Redshift {
            if !self.iam.role_arn.starts_with("arn:") {
                return Err(Error::Config(format!(
                    "iam.role_arn must be an ARN (got '{}')",
                    self.iam.role_arn
                )));
            }
            for (key, uri) in [
                ("s3.log_data", &self.s3.log_data),
                ("s3.log_jsonpath", &self.s3.log_jsonpath),
                ("s3.song_data", &self.s3.song_data),
            ] {
                if !uri.starts_with("s3://") {
                    return Err(Error::Config(format!(
                        "{} must be an s3:// URI (got '{}')",
                        key, uri
                    )));
                }
            }
        }

        Ok(())
    }

    /// Connection options for the warehouse cluster
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.cluster.host)
            .port(self.cluster.db_port)
            .username(&self.cluster.db_user)
            .password(&self.cluster.db_password)
            .database(&self.cluster.db_name)
    }

    /// Bulk-load sources for the staging loader
    pub fn staging_sources(&self) -> StagingSources {
        StagingSources {
            role_arn: self.iam.role_arn.clone(),
            log_data: self.s3.log_data.clone(),
            log_jsonpath: self.s3.log_jsonpath.clone(),
            song_data: self.s3.song_data.clone(),
            region: self.s3.region.clone(),
        }
    }

    /// Options for the transform engine
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            join_rule: self.etl.join_rule,
            user_dedup: self.etl.user_dedup,
        }
    }
}

/// Config file resolution
pub struct ConfigResolver {
    cli_arg: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create resolver; `cli_arg` is the `--config` value if given
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self { cli_arg }
    }

    /// Find the config file following the priority order
    pub fn resolve(&self) -> Result<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return Ok(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        // Priority 3: Working directory
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Ok(local);
        }

        // Priority 4: User config directory
        if let Some(path) = user_config_path() {
            if path.exists() {
                return Ok(path);
            }
        }

        Err(Error::Config(format!(
            "No config file found (use --config, set {}, or create ./{})",
            CONFIG_ENV_VAR, CONFIG_FILE_NAME
        )))
    }

    /// Resolve and load
    pub fn load(&self) -> Result<DwhConfig> {
        let path = self.resolve()?;
        DwhConfig::load(&path)
    }
}

/// `<user config dir>/playdw/dwh.toml`, if the platform has a config dir
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("playdw").join(CONFIG_FILE_NAME))
}

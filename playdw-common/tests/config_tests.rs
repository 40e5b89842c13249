//! Tests for configuration file resolution and environment overrides
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate PLAYDW_* variables are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use playdw_common::config::{
    ConfigResolver, DwhConfig, CONFIG_ENV_VAR, PASSWORD_ENV_VAR, ROLE_ARN_ENV_VAR,
};
use playdw_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
[cluster]
host = "dwhcluster.example.us-west-2.redshift.amazonaws.com"
db_name = "dwh"
db_user = "dwhuser"
db_password = "from-file"
db_port = 5439

[iam]
role_arn = "arn:aws:iam::123456789012:role/fromFile"

[logging]
level = "debug"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(PASSWORD_ENV_VAR);
    env::remove_var(ROLE_ARN_ENV_VAR);
}

#[test]
#[serial]
fn test_load_from_file() {
    clear_env();
    let file = write_config(CONFIG);

    let config = DwhConfig::load(file.path()).unwrap();

    assert_eq!(config.cluster.host, "dwhcluster.example.us-west-2.redshift.amazonaws.com");
    assert_eq!(config.cluster.db_password, "from-file");
    assert_eq!(config.iam.role_arn, "arn:aws:iam::123456789012:role/fromFile");
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_env_overrides_secrets() {
    clear_env();
    let file = write_config(CONFIG);
    env::set_var(PASSWORD_ENV_VAR, "from-env");
    env::set_var(ROLE_ARN_ENV_VAR, "arn:aws:iam::123456789012:role/fromEnv");

    let config = DwhConfig::load(file.path()).unwrap();

    assert_eq!(config.cluster.db_password, "from-env");
    assert_eq!(config.iam.role_arn, "arn:aws:iam::123456789012:role/fromEnv");

    clear_env();
}

#[test]
#[serial]
fn test_env_override_is_validated() {
    clear_env();
    let file = write_config(CONFIG);
    env::set_var(ROLE_ARN_ENV_VAR, "not-an-arn");

    let result = DwhConfig::load(file.path());
    assert!(matches!(result, Err(Error::Config(_))));

    clear_env();
}

#[test]
#[serial]
fn test_missing_file_is_config_error() {
    clear_env();
    let result = DwhConfig::load(&PathBuf::from("/nonexistent/playdw/dwh.toml"));

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("/nonexistent/playdw/dwh.toml")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_resolver_cli_arg_wins_over_env() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/from-cli.toml")));
    assert_eq!(resolver.resolve().unwrap(), PathBuf::from("/tmp/from-cli.toml"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_env_var() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolver = ConfigResolver::new(None);
    assert_eq!(resolver.resolve().unwrap(), PathBuf::from("/tmp/from-env.toml"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_load_reads_resolved_file() {
    clear_env();
    let file = write_config(CONFIG);
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = ConfigResolver::new(None).load().unwrap();
    assert_eq!(config.cluster.db_name, "dwh");

    clear_env();
}

#[test]
#[serial]
fn test_connect_options_from_config() {
    clear_env();
    let file = write_config(CONFIG);
    let config = DwhConfig::load(file.path()).unwrap();

    let options = config.connect_options();
    assert_eq!(options.get_host(), "dwhcluster.example.us-west-2.redshift.amazonaws.com");
    assert_eq!(options.get_port(), 5439);
    assert_eq!(options.get_username(), "dwhuser");
    assert_eq!(options.get_database(), Some("dwh"));
}

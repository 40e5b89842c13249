//! playdw-etl library - command-line tools for the play warehouse
//!
//! Two entry points share this library:
//! - `create-tables`: drop and recreate the warehouse schema
//! - `etl`: bulk-load staging, populate analytical tables, optionally
//!   print reports and verify the result

pub mod cli;
pub mod logging;
pub mod run;

/// Build identification line logged at startup
pub fn build_info(binary: &str) -> String {
    format!(
        "{} v{} [{}] built {} ({})",
        binary,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    )
}

//! # playdw Common Library
//!
//! Shared code for the playdw warehouse tools:
//! - Configuration loading and resolution
//! - Table schema definitions (staging, fact and dimension tables)
//! - Statement execution against the warehouse
//! - Pipeline stages: schema, staging load, transforms, reports
//! - Post-load verification

pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod schema_manager;
pub mod staging;
pub mod time_parts;
pub mod transform;
pub mod verify;

pub use error::{Error, Result};
pub use time_parts::TimeParts;

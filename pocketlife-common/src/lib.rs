//! # pocketlife Common Library
//!
//! Shared code for the pocketlife telemetry service:
//! - Telemetry payload classification, field coercion and record building
//! - HTTP Basic credential checks and response body types
//! - Configuration loading
//! - Database schema initialization

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod telemetry;

pub use error::{Error, Result};
pub use telemetry::{classify, build_record, BuildError, RecordKind, TelemetryRecord};

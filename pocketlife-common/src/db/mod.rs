//! Database schema and initialization

pub mod init;

pub use init::{create_telemetry_tables, init_database, TELEMETRY_TABLES};

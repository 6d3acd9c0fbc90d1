//! HTTP API handlers for pocketlife-ingest

pub mod health;
pub mod ingest;

pub use health::health_routes;
pub use ingest::{ingest_routes, ingest_telemetry};

//! pocketlife-ingest library - telemetry ingestion service
//!
//! Exposes the router, pipeline and storage layer for `main` and for
//! integration testing.

use std::sync::Arc;

use axum::Router;
use pocketlife_common::api::ApiCredentials;
use pocketlife_common::config::ServiceConfig;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod pipeline;

pub use crate::db::{SqliteTelemetryStore, StoreError, TelemetryStore};
pub use crate::error::IngestError;
pub use crate::pipeline::{IngestOutcome, IngestPipeline};

/// Application state shared across HTTP handlers
///
/// Read-only after start-up; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: IngestPipeline,
    /// Realm announced in `WWW-Authenticate` on 401 responses
    pub realm: Arc<str>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        credentials: ApiCredentials,
        realm: &str,
        redact_errors: bool,
    ) -> Self {
        Self {
            pipeline: IngestPipeline::new(credentials, store, redact_errors),
            realm: Arc::from(realm),
        }
    }

    /// State backed by SQLite, using the resolved service configuration
    pub fn from_config(db: SqlitePool, config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(SqliteTelemetryStore::new(db)),
            config.credentials.clone(),
            &config.realm,
            config.redact_errors,
        )
    }
}

/// Build application router
///
/// `POST /` is the authenticated ingest endpoint; `/health` is public.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ingest_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

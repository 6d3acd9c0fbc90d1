//! Ingestion pipeline
//!
//! One pass per request, no retries:
//!
//! ```text
//! AwaitAuth → AwaitBody → AwaitDecode → Classify → Build → Persist → Respond
//! ```
//!
//! Every request ends in exactly one [`IngestOutcome`]. Either one record is
//! persisted and the outcome is a success, or nothing is persisted and the
//! outcome is a failure.

use std::sync::Arc;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pocketlife_common::api::{validate_credentials, ApiCredentials, ErrorResponse, SuccessResponse};
use pocketlife_common::telemetry::{build_record, classify, RawPayload, RecordKind};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::db::TelemetryStore;
use crate::error::IngestError;

/// Request bodies above this size are rejected as unreadable
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Result of one ingest request, independent of transport encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Success { message: String },
    Failure { status: StatusCode, message: String },
}

impl IngestOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            IngestOutcome::Success { .. } => StatusCode::OK,
            IngestOutcome::Failure { status, .. } => *status,
        }
    }
}

impl IntoResponse for IngestOutcome {
    fn into_response(self) -> Response {
        match self {
            IngestOutcome::Success { message } => {
                (StatusCode::OK, Json(SuccessResponse::new(message))).into_response()
            }
            IngestOutcome::Failure { status, message } => {
                (status, Json(ErrorResponse::new(message))).into_response()
            }
        }
    }
}

/// Authenticates, decodes, classifies, builds and persists one payload
#[derive(Clone)]
pub struct IngestPipeline {
    credentials: Arc<ApiCredentials>,
    store: Arc<dyn TelemetryStore>,
    redact_errors: bool,
}

impl IngestPipeline {
    pub fn new(
        credentials: ApiCredentials,
        store: Arc<dyn TelemetryStore>,
        redact_errors: bool,
    ) -> Self {
        Self {
            credentials: Arc::new(credentials),
            store,
            redact_errors,
        }
    }

    /// Run one request to its single outcome
    pub async fn run(&self, authorization: Option<&str>, body: Body) -> IngestOutcome {
        let payload = match self.receive(authorization, body).await {
            Ok(payload) => payload,
            Err(err) => return self.failure(None, err),
        };

        // Classify
        let kind = classify(&payload);

        match self.store(kind, &payload).await {
            Ok(()) => {
                debug!(kind = %kind, "Telemetry record stored");
                IngestOutcome::Success {
                    message: kind.success_message().unwrap_or_default().to_string(),
                }
            }
            Err(err) => self.failure(Some(kind), err),
        }
    }

    /// AwaitAuth, AwaitBody and AwaitDecode
    pub async fn receive(
        &self,
        authorization: Option<&str>,
        body: Body,
    ) -> Result<RawPayload, IngestError> {
        validate_credentials(authorization, &self.credentials)?;

        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| IngestError::InvalidJson(format!("Failed to read body: {}", e)))?;

        decode_payload(&bytes)
    }

    /// Build and Persist for an already classified payload
    pub async fn store(&self, kind: RecordKind, payload: &RawPayload) -> Result<(), IngestError> {
        let record = build_record(kind, payload)?;
        self.store.insert_record(&record).await?;
        Ok(())
    }

    fn failure(&self, kind: Option<RecordKind>, err: IngestError) -> IngestOutcome {
        let status = err.status();
        // Failures before classification have no kind
        let kind = kind.map_or("-", |kind| kind.as_str());
        if status.is_server_error() {
            error!(status = status.as_u16(), kind, "Ingest failed: {}", err);
        } else {
            warn!(status = status.as_u16(), kind, "Ingest rejected: {}", err);
        }
        IngestOutcome::Failure {
            status,
            message: err.public_message(self.redact_errors),
        }
    }
}

/// Decode a request body into a key/value payload
///
/// Literal `null` is treated as a decode failure. Other non-object JSON
/// values have no keys and decode to an empty payload, which then classifies
/// as unrecognized.
pub fn decode_payload(bytes: &[u8]) -> Result<RawPayload, IngestError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| IngestError::InvalidJson(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Err(IngestError::InvalidJson(
            "expected a JSON object, found null".to_string(),
        )),
        _ => Ok(RawPayload::new()),
    }
}

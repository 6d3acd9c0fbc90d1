//! Error types for pocketlife-ingest
//!
//! One variant per failure class a request can end in. Each maps to exactly
//! one HTTP status; the message becomes the `error` field of the response.

use axum::http::StatusCode;
use pocketlife_common::api::ApiAuthError;
use pocketlife_common::telemetry::{BuildError, CoercionError};
use thiserror::Error;

use crate::db::StoreError;

/// Terminal failure of one ingest request
#[derive(Debug, Error)]
pub enum IngestError {
    /// Missing or wrong Basic credentials (401)
    #[error(transparent)]
    Auth(#[from] ApiAuthError),

    /// Body unreadable, not JSON, or JSON `null` (400)
    #[error("Invalid JSON data: {0}")]
    InvalidJson(String),

    /// No record kind matched (400)
    #[error("Unrecognized data format.")]
    Unrecognized,

    /// `bandwidth` string did not match the wire format (400)
    #[error("Failed to parse bandwidth data.")]
    BandwidthParse,

    /// Numeric field held a non-numeric value (500)
    #[error("An error occurred: {0}")]
    Coercion(#[from] CoercionError),

    /// Storage collaborator failed (500)
    #[error("An error occurred: {0}")]
    Storage(#[from] StoreError),
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::Auth(_) => StatusCode::UNAUTHORIZED,
            IngestError::InvalidJson(_)
            | IngestError::Unrecognized
            | IngestError::BandwidthParse => StatusCode::BAD_REQUEST,
            IngestError::Coercion(_) | IngestError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message for the response body
    ///
    /// With `redact` set, storage errors hide the underlying database text.
    pub fn public_message(&self, redact: bool) -> String {
        match self {
            IngestError::Storage(_) if redact => "An error occurred: internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<BuildError> for IngestError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Unrecognized => IngestError::Unrecognized,
            BuildError::Bandwidth(_) => IngestError::BandwidthParse,
            BuildError::Coercion(e) => IngestError::Coercion(e),
        }
    }
}

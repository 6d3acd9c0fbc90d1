//! Shared API response types
//!
//! Every response body is exactly one of these two shapes.

use serde::{Deserialize, Serialize};

/// Body of a successful ingest: `{"status":"success","message":...}`
///
/// # Examples
///
/// ```
/// use pocketlife_common::api::types::SuccessResponse;
///
/// let body = SuccessResponse::new("Arguments data inserted successfully.");
/// assert_eq!(
///     serde_json::to_string(&body).unwrap(),
///     r#"{"status":"success","message":"Arguments data inserted successfully."}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub status: String,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

/// Body of any failed request: `{"error":...}`
///
/// # Examples
///
/// ```
/// use pocketlife_common::api::types::ErrorResponse;
///
/// let body = ErrorResponse::new("Unrecognized data format.");
/// assert_eq!(
///     serde_json::to_string(&body).unwrap(),
///     r#"{"error":"Unrecognized data format."}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

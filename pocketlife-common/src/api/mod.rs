//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared request/response types
//!
//! The ingest service wraps these with axum-specific handling.

pub mod auth;
pub mod types;

pub use auth::{parse_basic_authorization, validate_credentials, ApiAuthError, ApiCredentials};
pub use types::{ErrorResponse, SuccessResponse};

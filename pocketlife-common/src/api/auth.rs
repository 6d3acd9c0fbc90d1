//! API authentication via HTTP Basic credentials
//!
//! # Rules
//!
//! - Missing `Authorization` header, a scheme other than `Basic`, or a token
//!   that is not base64 `user:password` → [`ApiAuthError::Missing`]
//! - Username or password differing from the configured pair (exact,
//!   case-sensitive comparison) → [`ApiAuthError::Invalid`]
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies; the ingest service supplies the header
//! value and turns the error into a 401 response.

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiAuthError {
    /// No usable Basic credentials were supplied
    #[error("Authentication required.")]
    Missing,

    /// Credentials were supplied but do not match
    #[error("Invalid credentials.")]
    Invalid,
}

// ========================================
// Credentials
// ========================================

/// Configured API username/password pair
///
/// Loaded once at start-up and never logged; `Debug` hides the password.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub username: String,
    pub password: String,
}

impl ApiCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ========================================
// Header Parsing
// ========================================

/// Decode an `Authorization: Basic <token>` header value
///
/// The scheme name is matched case-insensitively. The password is everything
/// after the first `:`, so it may itself contain colons.
///
/// # Examples
///
/// ```
/// use pocketlife_common::api::auth::parse_basic_authorization;
///
/// // "user:pa:ss"
/// let creds = parse_basic_authorization("Basic dXNlcjpwYTpzcw==").unwrap();
/// assert_eq!(creds.username, "user");
/// assert_eq!(creds.password, "pa:ss");
///
/// assert!(parse_basic_authorization("Bearer abc").is_err());
/// ```
pub fn parse_basic_authorization(header: &str) -> Result<ApiCredentials, ApiAuthError> {
    let (scheme, token) = header.trim().split_once(' ').ok_or(ApiAuthError::Missing)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(ApiAuthError::Missing);
    }

    let decoded = general_purpose::STANDARD
        .decode(token.trim())
        .map_err(|_| ApiAuthError::Missing)?;
    // Credentials were supplied but cannot match the configured UTF-8 pair
    let decoded = String::from_utf8(decoded).map_err(|_| ApiAuthError::Invalid)?;

    let (username, password) = decoded.split_once(':').ok_or(ApiAuthError::Missing)?;

    Ok(ApiCredentials::new(username, password))
}

// ========================================
// Validation
// ========================================

/// Check an optional `Authorization` header value against the configured pair
pub fn validate_credentials(
    header: Option<&str>,
    expected: &ApiCredentials,
) -> Result<(), ApiAuthError> {
    let provided = parse_basic_authorization(header.ok_or(ApiAuthError::Missing)?)?;

    if provided.username != expected.username || provided.password != expected.password {
        return Err(ApiAuthError::Invalid);
    }

    Ok(())
}

// ========================================
// Tests
// ========================================

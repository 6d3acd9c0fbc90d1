//! Telemetry ingest endpoint
//!
//! POST / with a JSON body and HTTP Basic credentials. Other methods run the
//! same pipeline, so they also get a JSON auth or decode error.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

use crate::AppState;

/// ANY /
///
/// Runs the ingest pipeline and encodes its outcome. Failed authentication
/// also carries the Basic challenge header.
pub async fn ingest_telemetry(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    // A header that is not visible ASCII is treated like a missing one
    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let outcome = state.pipeline.run(authorization, body).await;

    let mut response = outcome.into_response();
    if response.status() == StatusCode::UNAUTHORIZED {
        if let Ok(challenge) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", state.realm)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }
    }

    response
}

/// Build ingest routes
pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/", any(ingest_telemetry))
}

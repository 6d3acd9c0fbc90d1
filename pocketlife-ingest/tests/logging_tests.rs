//! Request logging tests
//!
//! Failures are logged with their status and the record kind; failures
//! before classification carry kind `-`.

use std::io;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use pocketlife_common::api::ApiCredentials;
use pocketlife_common::db::create_telemetry_tables;
use pocketlife_ingest::{build_router, AppState, SqliteTelemetryStore};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Test helper: send one request with logs captured, returning status and log text
async fn logged_request(authorization: Option<&str>, body: &str) -> (StatusCode, String) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_telemetry_tables(&pool).await.unwrap();
    let app = build_router(AppState::new(
        Arc::new(SqliteTelemetryStore::new(pool)),
        ApiCredentials::new("telemetry", "s3cret"),
        "Telemetry API",
        false,
    ));

    let mut request = Request::builder().method("POST").uri("/");
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_max_level(Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = app.oneshot(request).await.unwrap();
    (response.status(), sink.text())
}

fn valid_auth() -> String {
    format!("Basic {}", general_purpose::STANDARD.encode("telemetry:s3cret"))
}

/// `&str` fields may be rendered quoted or bare depending on the formatter
fn has_field(line: &str, name: &str, value: &str) -> bool {
    line.contains(&format!("{}={}", name, value)) || line.contains(&format!("{}=\"{}\"", name, value))
}

fn line_with<'a>(text: &'a str, needle: &str) -> &'a str {
    text.lines()
        .find(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("no log line containing {:?} in:\n{}", needle, text))
}

#[tokio::test]
async fn test_client_failure_logged_with_kind() {
    let auth = valid_auth();
    let (status, logs) =
        logged_request(Some(&auth), r#"{"bandwidth": "nothing to see"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let line = line_with(&logs, "Ingest rejected");
    assert!(line.contains("WARN"), "{}", line);
    assert!(line.contains("status=400"), "{}", line);
    assert!(has_field(line, "kind", "bandwidth"), "{}", line);
}

#[tokio::test]
async fn test_server_failure_logged_with_kind() {
    let auth = valid_auth();
    let (status, logs) =
        logged_request(Some(&auth), r#"{"function_name": "f", "execution_time": "slow"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let line = line_with(&logs, "Ingest failed");
    assert!(line.contains("ERROR"), "{}", line);
    assert!(line.contains("status=500"), "{}", line);
    assert!(has_field(line, "kind", "function_trace"), "{}", line);
}

#[tokio::test]
async fn test_auth_failure_logged_without_kind_or_credentials() {
    let (status, logs) = logged_request(None, r#"{"arguments": "x"}"#).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let line = line_with(&logs, "Ingest rejected");
    assert!(line.contains("status=401"), "{}", line);
    assert!(has_field(line, "kind", "-"), "{}", line);
    assert!(!line.contains("arguments"), "{}", line);
    assert!(!logs.contains("s3cret"));
}

//! Storage collaborator for ingested records
//!
//! The pipeline only sees [`TelemetryStore`]; [`SqliteTelemetryStore`] is the
//! production implementation. Each insert either succeeds or returns a
//! [`StoreError`], nothing else is interpreted.

mod sqlite;

pub use sqlite::SqliteTelemetryStore;

use async_trait::async_trait;
use pocketlife_common::telemetry::TelemetryRecord;
use thiserror::Error;

/// Storage failure; the text is what the sender sees (unless redacted)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// One insert operation per record kind
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    async fn insert_arguments(&self, arguments: &str) -> Result<(), StoreError>;

    async fn insert_bandwidth(&self, sent_kb: f64, received_kb: f64) -> Result<(), StoreError>;

    async fn insert_device_info(
        &self,
        language: &str,
        operating_system: &str,
        public_ip_address: &str,
    ) -> Result<(), StoreError>;

    async fn insert_function_trace(
        &self,
        result: Option<&str>,
        function_name: &str,
        execution_time: Option<f64>,
        cpu_usage_change: Option<f64>,
        ram_usage_change: Option<f64>,
        function_arguments: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn insert_program_usage(
        &self,
        cpu_usage: Option<f64>,
        ram_usage: Option<f64>,
    ) -> Result<(), StoreError>;

    /// Dispatch a typed record to its insert operation
    async fn insert_record(&self, record: &TelemetryRecord) -> Result<(), StoreError> {
        match record {
            TelemetryRecord::Arguments(r) => self.insert_arguments(&r.arguments).await,
            TelemetryRecord::Bandwidth(r) => self.insert_bandwidth(r.sent_kb, r.received_kb).await,
            TelemetryRecord::DeviceInfo(r) => {
                self.insert_device_info(&r.language, &r.operating_system, &r.public_ip_address)
                    .await
            }
            TelemetryRecord::FunctionTrace(r) => {
                self.insert_function_trace(
                    r.result.as_deref(),
                    &r.function_name,
                    r.execution_time,
                    r.cpu_usage_change,
                    r.ram_usage_change,
                    r.function_arguments.as_deref(),
                )
                .await
            }
            TelemetryRecord::ProgramUsage(r) => {
                self.insert_program_usage(r.cpu_usage, r.ram_usage).await
            }
        }
    }
}

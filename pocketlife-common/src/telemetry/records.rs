//! Typed telemetry records and their builders

use serde::Serialize;
use thiserror::Error;

use super::coerce::{
    as_optional_float, as_string, as_text, extract_bandwidth, BandwidthParseError, CoercionError,
    RawPayload,
};

/// The five record shapes the service accepts, plus the catch-all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Arguments,
    Bandwidth,
    DeviceInfo,
    FunctionTrace,
    ProgramUsage,
    Unrecognized,
}

impl RecordKind {
    /// Stable lowercase name, also the storage table name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Arguments => "arguments",
            RecordKind::Bandwidth => "bandwidth",
            RecordKind::DeviceInfo => "device_info",
            RecordKind::FunctionTrace => "function_trace",
            RecordKind::ProgramUsage => "program_usage",
            RecordKind::Unrecognized => "unrecognized",
        }
    }

    /// Message returned to the sender once a record of this kind is stored
    pub fn success_message(&self) -> Option<&'static str> {
        match self {
            RecordKind::Arguments => Some("Arguments data inserted successfully."),
            RecordKind::Bandwidth => Some("Bandwidth data inserted successfully."),
            RecordKind::DeviceInfo => Some("Device information inserted successfully."),
            RecordKind::FunctionTrace => Some("Function trace data inserted successfully."),
            RecordKind::ProgramUsage => Some("Program usage data inserted successfully."),
            RecordKind::Unrecognized => None,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentsRecord {
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandwidthRecord {
    pub sent_kb: f64,
    pub received_kb: f64,
}

/// Device/environment info; absent fields are stored as empty strings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfoRecord {
    pub language: String,
    pub operating_system: String,
    pub public_ip_address: String,
}

/// One traced function call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionTraceRecord {
    /// Return value re-encoded as JSON text
    pub result: Option<String>,
    pub function_name: String,
    /// Seconds
    pub execution_time: Option<f64>,
    pub cpu_usage_change: Option<f64>,
    /// MB
    pub ram_usage_change: Option<f64>,
    pub function_arguments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramUsageRecord {
    pub cpu_usage: Option<f64>,
    pub ram_usage: Option<f64>,
}

/// Fully typed record, ready for storage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryRecord {
    Arguments(ArgumentsRecord),
    Bandwidth(BandwidthRecord),
    DeviceInfo(DeviceInfoRecord),
    FunctionTrace(FunctionTraceRecord),
    ProgramUsage(ProgramUsageRecord),
}

impl TelemetryRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            TelemetryRecord::Arguments(_) => RecordKind::Arguments,
            TelemetryRecord::Bandwidth(_) => RecordKind::Bandwidth,
            TelemetryRecord::DeviceInfo(_) => RecordKind::DeviceInfo,
            TelemetryRecord::FunctionTrace(_) => RecordKind::FunctionTrace,
            TelemetryRecord::ProgramUsage(_) => RecordKind::ProgramUsage,
        }
    }
}

/// Why a payload could not become a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// No record kind matched the payload's keys
    #[error("Unrecognized data format.")]
    Unrecognized,

    /// `bandwidth` string did not match the wire format
    #[error(transparent)]
    Bandwidth(#[from] BandwidthParseError),

    /// A numeric field held a non-numeric value
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// Build the record for an already classified payload
///
/// `kind` must come from [`classify`](super::classify) on the same payload;
/// builders rely on the key guaranteed by classification.
pub fn build_record(kind: RecordKind, payload: &RawPayload) -> Result<TelemetryRecord, BuildError> {
    let record = match kind {
        RecordKind::Arguments => TelemetryRecord::Arguments(build_arguments(payload)),
        RecordKind::Bandwidth => TelemetryRecord::Bandwidth(build_bandwidth(payload)?),
        RecordKind::DeviceInfo => TelemetryRecord::DeviceInfo(build_device_info(payload)),
        RecordKind::FunctionTrace => TelemetryRecord::FunctionTrace(build_function_trace(payload)?),
        RecordKind::ProgramUsage => TelemetryRecord::ProgramUsage(build_program_usage(payload)?),
        RecordKind::Unrecognized => return Err(BuildError::Unrecognized),
    };

    Ok(record)
}

fn build_arguments(payload: &RawPayload) -> ArgumentsRecord {
    ArgumentsRecord {
        arguments: as_string(payload, "arguments", ""),
    }
}

fn build_bandwidth(payload: &RawPayload) -> Result<BandwidthRecord, BuildError> {
    let raw = payload
        .get("bandwidth")
        .and_then(|value| value.as_str())
        .ok_or(BandwidthParseError)?;

    let (sent_kb, received_kb) = extract_bandwidth(raw)?;

    Ok(BandwidthRecord {
        sent_kb,
        received_kb,
    })
}

fn build_device_info(payload: &RawPayload) -> DeviceInfoRecord {
    DeviceInfoRecord {
        language: as_string(payload, "Language", ""),
        operating_system: as_string(payload, "OperatingSystem", ""),
        public_ip_address: as_string(payload, "PublicIPAddress", ""),
    }
}

fn build_function_trace(payload: &RawPayload) -> Result<FunctionTraceRecord, BuildError> {
    // `result` is always JSON-encoded, even for plain strings
    let result = payload
        .get("result")
        .filter(|value| !value.is_null())
        .map(|value| value.to_string());

    let function_arguments = payload
        .get("function_arguments")
        .filter(|value| !value.is_null())
        .map(as_text);

    Ok(FunctionTraceRecord {
        result,
        function_name: as_string(payload, "function_name", ""),
        execution_time: as_optional_float(payload, "execution_time")?,
        cpu_usage_change: as_optional_float(payload, "cpu_usage_change")?,
        ram_usage_change: as_optional_float(payload, "ram_usage_change")?,
        function_arguments,
    })
}

fn build_program_usage(payload: &RawPayload) -> Result<ProgramUsageRecord, BuildError> {
    Ok(ProgramUsageRecord {
        cpu_usage: as_optional_float(payload, "CPUUsage")?,
        ram_usage: as_optional_float(payload, "RAMUsage")?,
    })
}

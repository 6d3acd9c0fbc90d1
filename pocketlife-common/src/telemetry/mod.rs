//! Telemetry payload handling
//!
//! Turns one decoded request body into one typed record:
//!
//! ```text
//! RawPayload → classify() → RecordKind → build_record() → TelemetryRecord
//! ```
//!
//! Everything in here is pure computation over a single request's data.
//! No HTTP framework or database types appear in this module; the ingest
//! service wraps these functions with its own handler and storage layer.

pub mod classify;
pub mod coerce;
pub mod records;

pub use classify::classify;
pub use coerce::{
    as_float, as_optional_float, as_string, as_text, extract_bandwidth, is_present,
    BandwidthParseError, CoercionError, RawPayload,
};
pub use records::{
    build_record, ArgumentsRecord, BandwidthRecord, BuildError, DeviceInfoRecord,
    FunctionTraceRecord, ProgramUsageRecord, RecordKind, TelemetryRecord,
};

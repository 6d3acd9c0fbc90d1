//! Record classification by key presence
//!
//! Precedence is fixed and first match wins. A payload carrying keys for more
//! than one kind (e.g. `arguments` and `CPUUsage`) takes the earliest kind.

use super::coerce::{is_present, RawPayload};
use super::records::RecordKind;

const DEVICE_INFO_KEYS: [&str; 3] = ["Language", "OperatingSystem", "PublicIPAddress"];
const PROGRAM_USAGE_KEYS: [&str; 2] = ["CPUUsage", "RAMUsage"];

/// Determine which record kind a payload represents
///
/// Order: Arguments → Bandwidth → DeviceInfo → FunctionTrace → ProgramUsage.
/// Keys whose value is `null` do not count as present.
pub fn classify(payload: &RawPayload) -> RecordKind {
    if is_present(payload, "arguments") {
        RecordKind::Arguments
    } else if is_present(payload, "bandwidth") {
        RecordKind::Bandwidth
    } else if any_present(payload, &DEVICE_INFO_KEYS) {
        RecordKind::DeviceInfo
    } else if is_present(payload, "function_name") {
        RecordKind::FunctionTrace
    } else if any_present(payload, &PROGRAM_USAGE_KEYS) {
        RecordKind::ProgramUsage
    } else {
        RecordKind::Unrecognized
    }
}

fn any_present(payload: &RawPayload, keys: &[&str]) -> bool {
    keys.iter().any(|key| is_present(payload, key))
}

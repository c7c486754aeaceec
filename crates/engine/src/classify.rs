//! Transport failure classification.
//!
//! Only two enhanced status codes get a label of their own; the first
//! `5.X.Y` code in the fault text decides, and everything else is reported
//! verbatim.

use std::sync::LazyLock;

use regex::Regex;

use courier_common::types::FailureReason;

static ENHANCED_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"5\.\d+\.\d+").expect("static pattern is valid"));

/// Map raw transport fault text to the reason shown in reports.
pub fn classify(raw: &str) -> FailureReason {
    match ENHANCED_STATUS.find(raw).map(|m| m.as_str()) {
        Some("5.5.2") => FailureReason::EmptyLine,
        Some("5.1.3") => FailureReason::BadAddress,
        _ => FailureReason::Other(raw.to_string()),
    }
}

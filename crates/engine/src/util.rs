//! Internal helpers for normalization and conversion.
//!
//! These utilities are **not** part of the public API.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use unicode_normalization::UnicodeNormalization;

/// Key used to compare names: NFKC, whitespace collapsed, lowercased.
pub(crate) fn name_key(value: &str) -> String {
    let normalized: String = value.nfkc().collect();
    normalized
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC3339 so stored timestamps sort chronologically as text.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

//! Serde helpers for BaaS record fields.
//!
//! The BaaS stores unset relations and text as `""`, dates as
//! `YYYY-MM-DD HH:MM:SS.sssZ`, and numbers that were written by older
//! clients may arrive as strings.

use chrono::{DateTime, NaiveDateTime, Utc};
use radio_core::types::Timestamp;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Placeholder id for a room whose `active_request` was stored as the
/// legacy boolean `true`. It never matches a real request id.
pub const LEGACY_ACTIVE_REQUEST: &str = "legacy-in-flight";

const BAAS_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.fZ";

/// Format a timestamp the way the BaaS stores dates.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3fZ").to_string()
}

/// Parse either the BaaS date format or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, BAAS_DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `""` and `null` become `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(de)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// `null` becomes an empty string.
pub fn string_or_empty<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

/// `null` becomes `false`.
pub fn bool_or_false<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(de)?.unwrap_or(false))
}

/// Dates in either format; `""`, `null` and unparseable values become `None`.
pub fn opt_timestamp<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Timestamp>, D::Error> {
    let value = Option::<String>::deserialize(de)?;
    Ok(value.as_deref().and_then(parse_timestamp))
}

/// Numbers, numeric strings and `null` (as `0.0`).
pub fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// A request relation that older records stored as a boolean.
pub fn active_request<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Bool(true) => Some(LEGACY_ACTIVE_REQUEST.to_string()),
        _ => None,
    })
}

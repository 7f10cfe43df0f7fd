use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::warn;

use crate::models::CellValue;
use crate::taxonomy::DEFAULT_NA_VALUE;

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses the variety of timestamp spellings found in dataset exports.
///
/// Offset-carrying values are converted to UTC and stored naive so every
/// timestamp in a table is directly comparable.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Parse a table cell. `Null`, lists and unparseable text yield `None`.
    pub fn parse_cell(cell: &CellValue) -> Option<NaiveDateTime> {
        match cell {
            CellValue::Timestamp(ts) => Some(*ts),
            CellValue::Text(s) => Self::parse_str(s),
            CellValue::Null | CellValue::List(_) => None,
        }
    }

    /// Parse a timestamp string.
    pub fn parse_str(raw: &str) -> Option<NaiveDateTime> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.naive_utc());
        }

        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Some(dt.naive_utc());
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y/%m/%d %H:%M:%S",
            "%m/%d/%Y %H:%M:%S",
        ];
        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return date.and_hms_opt(0, 0, 0);
            }
        }

        warn!(
            "TimestampProcessor: could not parse timestamp string \"{}\"",
            s
        );
        None
    }

    /// ISO-8601 rendering; fractional seconds appear only when non-zero.
    pub fn format_iso(ts: &NaiveDateTime) -> String {
        ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

// ── JsonArrayDecoder ──────────────────────────────────────────────────────────

/// Decodes cells that hold JSON-encoded arrays (examples, test cases,
/// constraints). Lists pass through and nulls decode to an empty array.
pub struct JsonArrayDecoder;

impl JsonArrayDecoder {
    /// Decode `cell`, or explain why a text cell is not a JSON array.
    pub fn try_decode(cell: &CellValue) -> std::result::Result<Vec<Value>, String> {
        match cell {
            CellValue::List(items) => Ok(items.clone()),
            CellValue::Null | CellValue::Timestamp(_) => Ok(Vec::new()),
            CellValue::Text(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Array(items)) => Ok(items),
                Ok(other) => Err(format!("expected array, found {}", kind_name(&other))),
                Err(e) => Err(format!("invalid JSON array cell: {}", e)),
            },
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── TextNormalizer ────────────────────────────────────────────────────────────

/// String clean-up helpers for free-text columns.
pub struct TextNormalizer;

impl TextNormalizer {
    /// Upper-case the first letter of every alphabetic run, lower-case the rest.
    ///
    /// `"very HARD"` → `"Very Hard"`, `"medium-easy"` → `"Medium-Easy"`.
    pub fn title_case(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut prev_alpha = false;
        for ch in s.chars() {
            if ch.is_alphabetic() {
                if prev_alpha {
                    out.extend(ch.to_lowercase());
                } else {
                    out.extend(ch.to_uppercase());
                }
                prev_alpha = true;
            } else {
                out.push(ch);
                prev_alpha = false;
            }
        }
        out
    }

    /// Normalized difficulty label; blank or missing values become `"Unknown"`.
    pub fn difficulty(cell: &CellValue) -> String {
        match cell.to_plain_string() {
            Some(s) if !s.trim().is_empty() => Self::title_case(s.trim()),
            _ => DEFAULT_NA_VALUE.to_string(),
        }
    }

    /// Plain text of a cell, empty for `Null`.
    pub fn text_or_empty(cell: &CellValue) -> String {
        cell.to_plain_string().unwrap_or_default()
    }
}

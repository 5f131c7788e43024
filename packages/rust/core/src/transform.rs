//! Raw submitted value → CRM string representation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use leadbridge_shared::{FieldDataType, LeadBridgeError, Result};
use serde_json::Value;

use crate::specs::SemanticFieldSpec;

/// Hard ceiling on any written value, even if the CRM would accept more.
pub const HARD_MAX_LENGTH: usize = 5_000;

/// Output format for dates.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render `raw` for the CRM field described by `spec`.
///
/// Fails with `UnsupportedValueShape` when the value's JSON shape does not
/// fit the field spec (an object for a scalar field, an array for a number, ...).
pub fn transform(spec: &SemanticFieldSpec, raw: &Value) -> Result<String> {
    let rendered = match spec.data_type {
        FieldDataType::Number => render_number(spec, raw)?,
        FieldDataType::Date => render_date(spec, raw)?,
        FieldDataType::LongText => match raw {
            Value::Object(map) => map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| format!("{k}: {}", render_plain(v)))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => render_text(spec, raw)?,
        },
        FieldDataType::Text
        | FieldDataType::SingleOption
        | FieldDataType::MultiOption
        | FieldDataType::Checkbox => render_text(spec, raw)?,
    };

    Ok(truncate(rendered, effective_limit(spec)))
}

/// Character limit for a spec: its own limit, never above the hard cap.
pub fn effective_limit(spec: &SemanticFieldSpec) -> usize {
    spec.max_length
        .unwrap_or(HARD_MAX_LENGTH)
        .min(HARD_MAX_LENGTH)
}

/// Truncate to at most `limit` characters, without an ellipsis marker.
pub fn truncate(mut value: String, limit: usize) -> String {
    if let Some((byte_idx, _)) = value.char_indices().nth(limit) {
        value.truncate(byte_idx);
    }
    value
}

/// Best-effort human rendering of any JSON value, used for text dumps.
pub fn render_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => yes_no(*b).to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_plain)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| format!("{k}={}", render_plain(v)))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

// ---------------------------------------------------------------------------
// Per-type renderers
// ---------------------------------------------------------------------------

fn render_text(spec: &SemanticFieldSpec, raw: &Value) -> Result<String> {
    match raw {
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if item.is_null() {
                    continue;
                }
                let part = render_scalar(spec, item)?;
                if !part.is_empty() {
                    parts.push(part);
                }
            }
            Ok(parts.join(", "))
        }
        _ => render_scalar(spec, raw),
    }
}

fn render_scalar(spec: &SemanticFieldSpec, raw: &Value) -> Result<String> {
    match raw {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(yes_no(*b).to_string()),
        Value::Number(n) => Ok(format_number(n)),
        Value::String(s) => Ok(spec.label_for(s.trim()).to_string()),
        other => Err(shape_error(spec, "scalar", other)),
    }
}

fn render_number(spec: &SemanticFieldSpec, raw: &Value) -> Result<String> {
    match raw {
        Value::Number(n) => Ok(format_number(n)),
        Value::String(s) => {
            let parsed: f64 = s
                .trim()
                .parse()
                .map_err(|_| shape_error(spec, "number", raw))?;
            if !parsed.is_finite() {
                return Err(shape_error(spec, "number", raw));
            }
            Ok(format_f64(parsed))
        }
        other => Err(shape_error(spec, "number", other)),
    }
}

fn render_date(spec: &SemanticFieldSpec, raw: &Value) -> Result<String> {
    let parsed = match raw {
        Value::String(s) => parse_date(s.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    };

    parsed
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .ok_or_else(|| shape_error(spec, "date", raw))
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(format_f64).unwrap_or_else(|| n.to_string())
    }
}

/// Minimal decimal form: no trailing zeros, no exponent for integral values.
fn format_f64(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn shape_error(spec: &SemanticFieldSpec, expected: &'static str, found: &Value) -> LeadBridgeError {
    let found = match found {
        Value::String(s) => format!("string {s:?}"),
        other => shape_name(other).to_string(),
    };
    LeadBridgeError::unsupported_shape(spec.semantic_key, expected, found)
}

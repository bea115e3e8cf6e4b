//! Field extraction helpers shared by the entity decoders.
//!
//! The backend is loose about shapes: ids arrive as strings, numbers or
//! `{ "$oid": ... }`, lists arrive as arrays or delimited strings, and
//! single records are sometimes wrapped in `{ "data": ... }`.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Unwrap a single `{ "data": {...} }` envelope around a record.
pub fn unwrap_envelope(value: &Value) -> &Value {
    match value.get("data") {
        Some(inner) if inner.is_object() && record_id(value).is_none() => inner,
        _ => value,
    }
}

/// Extract the record id from `_id` (string, number or `{ "$oid": ... }`) or `id`.
pub fn record_id(value: &Value) -> Option<String> {
    ["_id", "id"].iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("$oid")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}

/// Id of a newly inserted record from `{ "insertedId": ... }`, falling back
/// to the record's own id when the server echoes the whole document.
pub fn inserted_id(value: &Value) -> Option<String> {
    match value.get("insertedId") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Object(map)) => map
            .get("$oid")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => record_id(unwrap_envelope(value)),
    }
}

/// Counter from a mutation result such as `{ "deletedCount": 1 }`.
pub fn count_field(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

/// First non-blank scalar among `keys`, in order.
pub fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| scalar_text(value.get(*key)?))
}

/// Non-blank scalar under `key`, or an empty string.
pub fn text_or_empty(value: &Value, key: &str) -> String {
    first_text(value, &[key]).unwrap_or_default()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split a delimited string on `,` or `|`, trimming entries and dropping blanks.
pub fn split_list(text: &str) -> Vec<String> {
    text.split([',', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a list field that may be an array or a delimited string.
///
/// Array entries may be plain scalars or objects carrying a `name`.
pub fn list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) => first_text(item, &["name", "title"]),
                other => scalar_text(other),
            })
            .collect(),
        Some(Value::String(s)) => split_list(s),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Parse a listing date from `YYYY-MM-DD`, RFC 3339 or `Mon D, YYYY`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.date_naive());
    }
    ["%b %d, %Y", "%B %d, %Y", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Human form of a listing date, e.g. `Jan 5, 2025`.
pub fn pretty_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Format an amount the way the listing form does: `$1,200`, `$99.5`.
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    let rounded = if abs.fract() == 0.0 {
        abs
    } else {
        (abs * 1000.0).round() / 1000.0
    };
    let whole = rounded.trunc();
    let mut out = group_thousands(&format!("{:.0}", whole));

    let fraction = rounded - whole;
    if fraction > 0.0 {
        let digits = format!("{:.3}", fraction);
        let digits = digits.trim_start_matches('0').trim_end_matches('0');
        if digits != "." {
            out.push_str(digits);
        }
    }
    format!("{}${}", sign, out)
}

fn group_thousands(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

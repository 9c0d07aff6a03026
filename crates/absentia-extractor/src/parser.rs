//! Normalize provider output into a `ParsedAbsenceRequest`
//!
//! Provider text is untrusted. Every field is read defensively and every id is
//! checked against the request context.

use crate::context::RequestContext;
use absentia_domain::{
    AbsenceTypeId, AbsenceTypeMatch, EmployeeId, EmployeeMatch, ExtractionMetadata, MatchMethod,
    ParsedAbsenceRequest,
};
use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use tracing::warn;

/// The first top-level balanced `{...}` block of `text`
///
/// Braces inside JSON strings are ignored, so prose around the object and
/// markdown fences do not matter.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and normalize provider text
///
/// Unparseable text yields a zero-confidence negative result carrying the raw
/// text and the parse error.
pub fn parse_response(
    raw: &str,
    context: &RequestContext,
    metadata: ExtractionMetadata,
) -> ParsedAbsenceRequest {
    let block = match first_json_object(raw) {
        Some(block) => block,
        None => {
            warn!("Provider response contains no JSON object");
            return ParsedAbsenceRequest::malformed(raw, "no JSON object found", metadata);
        }
    };

    match serde_json::from_str::<Value>(block) {
        Ok(Value::Object(fields)) => normalize(&fields, context, metadata),
        Ok(_) => ParsedAbsenceRequest::malformed(raw, "JSON block is not an object", metadata),
        Err(e) => {
            warn!("Provider response JSON invalid: {}", e);
            ParsedAbsenceRequest::malformed(raw, format!("JSON parse error: {}", e), metadata)
        }
    }
}

/// Apply defaulting and trust rules to a decoded object
pub fn normalize(
    fields: &Map<String, Value>,
    context: &RequestContext,
    metadata: ExtractionMetadata,
) -> ParsedAbsenceRequest {
    // Provider-reported data is untrusted and kept apart from our own keys
    let mut diagnostics = Map::new();
    if let Some(Value::Object(reported)) = field(fields, &["extracted_data", "extractedData"]) {
        diagnostics.insert("provider".to_string(), Value::Object(reported.clone()));
    }

    let employee = field(fields, &["employee"]).and_then(|value| {
        let raw_id = id_of(value)?;
        match EmployeeId::from_string(&raw_id) {
            Ok(id) if context.contains_employee(id) => Some(EmployeeMatch {
                id,
                match_method: value
                    .get("match_method")
                    .or_else(|| value.get("matchMethod"))
                    .and_then(Value::as_str)
                    .and_then(MatchMethod::parse)
                    .unwrap_or(MatchMethod::Name),
            }),
            _ => {
                warn!("Discarding employee id not in context: {}", raw_id);
                diagnostics.insert("rejected_employee_id".to_string(), Value::String(raw_id));
                None
            }
        }
    });

    let absence_type = field(fields, &["absence_type", "absenceType"]).and_then(|value| {
        let raw_id = id_of(value)?;
        match AbsenceTypeId::from_string(&raw_id) {
            Ok(id) if context.contains_absence_type(id) => Some(AbsenceTypeMatch {
                id,
                matched_keywords: value
                    .get("matched_keywords")
                    .or_else(|| value.get("matchedKeywords"))
                    .and_then(Value::as_array)
                    .map(|words| {
                        words
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            }),
            _ => {
                warn!("Discarding absence type id not in context: {}", raw_id);
                diagnostics.insert("rejected_absence_type_id".to_string(), Value::String(raw_id));
                None
            }
        }
    });

    let mut date_field = |names: &[&str], label: &str| -> Option<NaiveDate> {
        let value = field(fields, names)?;
        if value.is_null() {
            return None;
        }
        let parsed = value.as_str().and_then(parse_date);
        if parsed.is_none() {
            diagnostics.insert(format!("invalid_{}", label), value.clone());
        }
        parsed
    };
    let start_date = date_field(&["start_date", "startDate"], "start_date");
    let end_date = date_field(&["end_date", "endDate"], "end_date");

    ParsedAbsenceRequest {
        is_absence_request: field(fields, &["is_absence_request", "isAbsenceRequest"])
            .and_then(as_bool)
            .unwrap_or(false),
        confidence_score: field(fields, &["confidence_score", "confidenceScore", "confidence"])
            .map(clamp_confidence)
            .unwrap_or(0.0),
        employee,
        absence_type,
        start_date,
        end_date,
        reason: field(fields, &["reason"]).and_then(non_empty_string),
        duration: field(fields, &["duration"]).and_then(non_empty_string),
        requires_approval: field(fields, &["requires_approval", "requiresApproval"])
            .and_then(as_bool)
            .unwrap_or(true),
        extracted_data: Value::Object(diagnostics),
        parse_error: None,
        metadata,
    }
}

/// Accept `YYYY-MM-DD` or the date part of an RFC 3339 timestamp
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Clamp to [0, 1]; non-numeric and NaN become 0
fn clamp_confidence(value: &Value) -> f64 {
    match value.as_f64() {
        Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn field<'v>(fields: &'v Map<String, Value>, names: &[&str]) -> Option<&'v Value> {
    names.iter().find_map(|name| fields.get(*name))
}

/// Id of a match object, or of a bare id string
fn id_of(value: &Value) -> Option<String> {
    let id = match value {
        Value::Object(map) => map.get("id")?,
        other => other,
    };
    match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Null => None,
        Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

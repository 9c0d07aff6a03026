//! Parsed absence request - the typed result of extraction
//!
//! Provider output is untrusted; every field here is optional or defaulted so
//! a partial answer still yields a usable value.

use crate::calendar::DateRange;
use crate::ids::{AbsenceTypeId, EmployeeId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// How the employee was identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMethod {
    /// Sender or body email address
    Email,
    /// Name mentioned in the email
    Name,
    /// External employee number
    EmployeeId,
}

impl MatchMethod {
    /// Parse a match method as a provider writes it
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "email" => Some(MatchMethod::Email),
            "name" => Some(MatchMethod::Name),
            "employeeid" | "employeenumber" => Some(MatchMethod::EmployeeId),
            _ => None,
        }
    }
}

/// Employee matched against the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeMatch {
    /// Roster id
    pub id: EmployeeId,
    /// How the match was made
    pub match_method: MatchMethod,
}

/// Absence type matched against the taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceTypeMatch {
    /// Taxonomy id
    pub id: AbsenceTypeId,
    /// Keywords that led to the match
    pub matched_keywords: Vec<String>,
}

/// One provider call made during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    /// Provider name
    pub provider: String,
    /// Whether the call returned usable content
    pub succeeded: bool,
    /// Failure description
    pub error: Option<String>,
    /// Wall time of the call
    pub latency_ms: u64,
}

/// Provenance of the extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Provider whose output was normalized
    pub provider: String,
    /// Model id used by that provider
    pub model: String,
    /// Tokens billed by that provider
    pub tokens_used: u64,
    /// Cost of that provider call
    pub cost_usd: f64,
    /// Latency of that provider call
    pub latency_ms: u64,
    /// Every attempt in priority order, including failures
    pub attempts: Vec<ProviderAttempt>,
}

/// Structured guess produced from a free-text request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedAbsenceRequest {
    /// Whether the text asks for an absence at all
    pub is_absence_request: bool,

    /// Confidence in [0, 1]
    pub confidence_score: f64,

    /// Matched employee
    pub employee: Option<EmployeeMatch>,

    /// Matched absence type
    pub absence_type: Option<AbsenceTypeMatch>,

    /// First day requested
    pub start_date: Option<NaiveDate>,

    /// Last day requested
    pub end_date: Option<NaiveDate>,

    /// Stated reason
    pub reason: Option<String>,

    /// Free-text duration hint ("3 days", "half day")
    pub duration: Option<String>,

    /// Whether the request should go through approval
    pub requires_approval: bool,

    /// Diagnostics: raw text, rejected ids, parse errors
    ///
    /// Whatever the provider reported itself sits under `"provider"`.
    pub extracted_data: Value,

    /// Why the provider answer could not be decoded, when it could not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,

    /// Provider, tokens, cost
    pub metadata: ExtractionMetadata,
}

impl ParsedAbsenceRequest {
    /// Negative result for provider output that could not be parsed
    pub fn malformed(raw_text: &str, parse_error: impl Into<String>, metadata: ExtractionMetadata) -> Self {
        let parse_error = parse_error.into();
        Self {
            is_absence_request: false,
            confidence_score: 0.0,
            employee: None,
            absence_type: None,
            start_date: None,
            end_date: None,
            reason: None,
            duration: None,
            requires_approval: true,
            extracted_data: json!({
                "raw_text": raw_text,
                "parse_error": parse_error,
            }),
            parse_error: Some(parse_error),
            metadata,
        }
    }

    /// The requested range, if both dates exist and are ordered
    pub fn date_range(&self) -> Option<DateRange> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => DateRange::new(start, end).ok(),
            _ => None,
        }
    }

    /// Whether the result came from unparseable provider output
    pub fn is_malformed(&self) -> bool {
        self.parse_error.is_some()
    }
}

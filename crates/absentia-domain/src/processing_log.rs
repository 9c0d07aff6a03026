//! Processing log - the audit entry of one pipeline run
//!
//! A log is opened in [`ProcessingStatus::Processing`], closed exactly once as
//! completed or failed, and is append-only afterwards: a created record can be
//! linked once and reviewer feedback is appended to `input_data["feedback"]`.

use crate::ids::{AbsenceRecordId, ProcessingLogId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Processing type written for email extraction runs
pub const EMAIL_PARSING: &str = "email_parsing";

/// State of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Run in progress
    Processing,
    /// Run reached a decision (which may be "nothing to create")
    Completed,
    /// Run could not complete
    Failed,
}

impl ProcessingStatus {
    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "processing" => Some(ProcessingStatus::Processing),
            "completed" => Some(ProcessingStatus::Completed),
            "failed" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }
}

/// Attempt to write a log entry outside its allowed lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogStateError {
    /// Terminal outcome already recorded
    #[error("Processing log {0} already closed")]
    AlreadyClosed(ProcessingLogId),

    /// Operation needs a closed log
    #[error("Processing log {0} is still processing")]
    StillProcessing(ProcessingLogId),

    /// A record is already linked
    #[error("Processing log {0} already linked to record {1}")]
    RecordAlreadyLinked(ProcessingLogId, AbsenceRecordId),
}

/// Extraction figures copied into the log when a run closes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Provider whose output was used, or the last one tried
    pub provider: Option<String>,
    /// Raw and normalized extraction output
    pub ai_response: Option<Value>,
    /// Normalized confidence
    pub confidence_score: Option<f64>,
    /// Tokens billed by the answering provider
    pub tokens_used: u64,
    /// Cost of the answering provider's call
    pub cost_usd: f64,
    /// Wall time of the run
    pub processing_time_ms: u64,
}

/// Durable audit record of one pipeline invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingLog {
    /// Unique identifier
    pub id: ProcessingLogId,

    /// Owning tenant
    pub tenant_id: TenantId,

    /// Kind of run (e.g. "email_parsing")
    pub processing_type: String,

    /// Provider used
    pub provider: Option<String>,

    /// Redacted input plus appended feedback
    pub input_data: Value,

    /// Extraction output
    pub ai_response: Option<Value>,

    /// Extraction confidence
    pub confidence_score: Option<f64>,

    /// Run state
    pub status: ProcessingStatus,

    /// Failure description
    pub error_message: Option<String>,

    /// Wall time of the run
    pub processing_time_ms: u64,

    /// Tokens billed
    pub tokens_used: u64,

    /// Cost in USD
    pub cost_usd: f64,

    /// Record created from this run
    pub related_record_id: Option<AbsenceRecordId>,

    /// When the run started
    pub created_at: DateTime<Utc>,

    /// When the run was closed
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProcessingLog {
    /// Open a new log entry in `processing` state
    pub fn start(tenant_id: TenantId, processing_type: impl Into<String>, input_data: Value) -> Self {
        Self {
            id: ProcessingLogId::new(),
            tenant_id,
            processing_type: processing_type.into(),
            provider: None,
            input_data,
            ai_response: None,
            confidence_score: None,
            status: ProcessingStatus::Processing,
            error_message: None,
            processing_time_ms: 0,
            tokens_used: 0,
            cost_usd: 0.0,
            related_record_id: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Close the run as completed
    pub fn complete(&mut self, summary: RunSummary) -> Result<(), LogStateError> {
        self.close(ProcessingStatus::Completed, summary, None)
    }

    /// Close the run as failed
    pub fn fail(&mut self, error: impl Into<String>, summary: RunSummary) -> Result<(), LogStateError> {
        self.close(ProcessingStatus::Failed, summary, Some(error.into()))
    }

    fn close(
        &mut self,
        status: ProcessingStatus,
        summary: RunSummary,
        error: Option<String>,
    ) -> Result<(), LogStateError> {
        if self.status != ProcessingStatus::Processing {
            return Err(LogStateError::AlreadyClosed(self.id));
        }
        self.status = status;
        self.provider = summary.provider;
        self.ai_response = summary.ai_response;
        self.confidence_score = summary.confidence_score;
        self.tokens_used = summary.tokens_used;
        self.cost_usd = summary.cost_usd;
        self.processing_time_ms = summary.processing_time_ms;
        self.error_message = error;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Link the record materialized from a completed run
    pub fn link_record(&mut self, record_id: AbsenceRecordId) -> Result<(), LogStateError> {
        if self.status == ProcessingStatus::Processing {
            return Err(LogStateError::StillProcessing(self.id));
        }
        if let Some(existing) = self.related_record_id {
            return Err(LogStateError::RecordAlreadyLinked(self.id, existing));
        }
        self.related_record_id = Some(record_id);
        Ok(())
    }

    /// Record what happened to the record a completed run proposed
    ///
    /// Stored under `ai_response["materialization"]`. When `outcome` is given it
    /// replaces `ai_response["outcome"]`, so the entry states the final decision.
    pub fn note_materialization(&mut self, note: Value, outcome: Option<Value>) -> Result<(), LogStateError> {
        if self.status == ProcessingStatus::Processing {
            return Err(LogStateError::StillProcessing(self.id));
        }

        let response = self.ai_response.get_or_insert_with(|| json!({}));
        if !response.is_object() {
            let previous = std::mem::take(response);
            *response = json!({ "original": previous });
        }
        if let Some(fields) = response.as_object_mut() {
            if let Some(outcome) = outcome {
                fields.insert("outcome".to_string(), outcome);
            }
            fields.insert("materialization".to_string(), note);
        }
        Ok(())
    }

    /// Append a feedback entry under `input_data["feedback"]`
    ///
    /// Earlier entries and the original input fields are kept as they are.
    pub fn append_feedback(&mut self, entry: Value) -> Result<(), LogStateError> {
        if self.status == ProcessingStatus::Processing {
            return Err(LogStateError::StillProcessing(self.id));
        }

        if !self.input_data.is_object() {
            let original = std::mem::take(&mut self.input_data);
            self.input_data = json!({ "original": original });
        }

        if let Some(fields) = self.input_data.as_object_mut() {
            let feedback = fields.entry("feedback").or_insert_with(|| json!([]));
            if !feedback.is_array() {
                let previous = std::mem::take(feedback);
                *feedback = json!([previous]);
            }
            if let Some(entries) = feedback.as_array_mut() {
                entries.push(entry);
            }
        }
        Ok(())
    }

    /// Feedback entries appended so far
    pub fn feedback(&self) -> Vec<&Value> {
        self.input_data
            .get("feedback")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().collect())
            .unwrap_or_default()
    }
}

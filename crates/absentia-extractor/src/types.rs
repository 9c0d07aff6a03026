//! Types for extraction requests and results

use absentia_domain::ParsedAbsenceRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plain email handed over by the mailbox layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub body: String,

    /// Sender address
    pub sender: String,

    /// When the email was received
    pub timestamp: DateTime<Utc>,
}

impl EmailMessage {
    /// Create an email received now
    pub fn new(subject: impl Into<String>, body: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
            timestamp: Utc::now(),
        }
    }

    /// Set the received timestamp
    pub fn received_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Result of a successful orchestrator run
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// Normalized extraction
    pub parsed: ParsedAbsenceRequest,

    /// Text returned by the provider that answered
    pub raw_text: String,
}

//! Redacted copy of an email for the processing log
//!
//! The log keeps enough to identify and audit a run without storing the full
//! message: a capped body excerpt, the body length and a digest of the input.

use absentia_extractor::{truncate_chars, EmailMessage};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// SHA-256 hex digest over sender, subject and body
pub fn input_digest(email: &EmailMessage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.sender.as_bytes());
    hasher.update(b"\n");
    hasher.update(email.subject.as_bytes());
    hasher.update(b"\n");
    hasher.update(email.body.as_bytes());
    hex::encode(hasher.finalize())
}

/// The `input_data` written when a run starts
pub fn redact_email(email: &EmailMessage, excerpt_chars: usize) -> Value {
    json!({
        "subject": email.subject,
        "sender": email.sender,
        "timestamp": email.timestamp.to_rfc3339(),
        "body_excerpt": truncate_chars(&email.body, excerpt_chars),
        "body_chars": email.body.chars().count(),
        "input_digest": input_digest(email),
    })
}

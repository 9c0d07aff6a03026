//! Prompt construction for absence extraction

use crate::context::RequestContext;
use crate::types::EmailMessage;
use absentia_llm::ChatPrompt;

/// Builds the chat prompt for one email
pub struct PromptBuilder<'a> {
    context: &'a RequestContext,
    email: &'a EmailMessage,
    max_body_chars: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(context: &'a RequestContext, email: &'a EmailMessage, max_body_chars: usize) -> Self {
        Self {
            context,
            email,
            max_body_chars,
        }
    }

    /// Build the system instruction and the user message
    pub fn build(&self) -> ChatPrompt {
        let mut user = String::new();

        // 1. The email
        user.push_str("Email:\n---\n");
        user.push_str(&format!("From: {}\n", self.email.sender));
        user.push_str(&format!("Received: {}\n", self.email.timestamp.to_rfc3339()));
        user.push_str(&format!("Subject: {}\n\n", self.email.subject));
        user.push_str(truncate_chars(&self.email.body, self.max_body_chars));
        if self.email.body.chars().count() > self.max_body_chars {
            user.push_str("\n[body truncated]");
        }
        user.push_str("\n---\n\n");

        // 2. The closed roster
        user.push_str("Known employees:\n");
        user.push_str(&to_json(&self.context.employees));
        user.push_str("\n\nKnown absence types:\n");
        user.push_str(&to_json(&self.context.absence_types));
        user.push_str("\n\n");

        // 3. Output reminder
        user.push_str(OUTPUT_FORMAT_REMINDER);

        ChatPrompt::new(EXTRACTION_INSTRUCTIONS, user)
    }
}

/// The first `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    // Roster entries are plain strings and ids; serialization cannot fail
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You read emails sent to an HR mailbox and decide whether each one asks for an absence from work.

Answer with exactly one JSON object of this shape:

{
  "is_absence_request": true | false,
  "confidence_score": 0.0-1.0,
  "employee": { "id": "<id from the known employees>", "match_method": "email" | "name" | "employeeId" } | null,
  "absence_type": { "id": "<id from the known absence types>", "matched_keywords": ["..."] } | null,
  "start_date": "YYYY-MM-DD" | null,
  "end_date": "YYYY-MM-DD" | null,
  "reason": "short reason in the sender's words" | null,
  "duration": "free-text duration such as 'half day' or '3 days'" | null,
  "requires_approval": true | false,
  "extracted_data": { }
}

Rules:
- Only use ids that appear in the known employees and known absence types lists; use null when unsure
- Prefer matching the employee by the sender address, then by employee number, then by name
- Resolve relative dates ("tomorrow", "next Monday") against the received timestamp
- A single-day absence has the same start_date and end_date
- Lower the confidence when dates, the employee or the absence type are guessed
- Emails that are not absence requests get is_absence_request false and confidence 0 or close to it"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Output format: one JSON object only, no markdown and no additional text.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AbsenceTypeEntry, EmployeeEntry};
    use absentia_domain::{AbsenceTypeId, EmployeeId};

    fn context() -> RequestContext {
        RequestContext::new(
            vec![EmployeeEntry {
                id: EmployeeId::new(),
                display_name: "Ada Lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                employee_number: None,
                department: Some("Engineering".to_string()),
            }],
            vec![AbsenceTypeEntry {
                id: AbsenceTypeId::new(),
                name: "Sick Leave".to_string(),
                code: "SICK".to_string(),
                keywords: vec!["sick".to_string(), "doctor".to_string()],
            }],
        )
    }

    #[test]
    fn test_prompt_embeds_email_and_roster() {
        let context = context();
        let email = EmailMessage::new("Out sick", "I have the flu, back Wednesday.", "ada@example.com");
        let prompt = PromptBuilder::new(&context, &email, 1_000).build();

        assert!(prompt.system.contains("is_absence_request"));
        assert!(prompt.user.contains("Subject: Out sick"));
        assert!(prompt.user.contains("From: ada@example.com"));
        assert!(prompt.user.contains("I have the flu"));
        assert!(prompt.user.contains(&context.employees[0].id.to_string()));
        assert!(prompt.user.contains("\"SICK\""));
        assert!(!prompt.user.contains("[body truncated]"));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let context = context();
        let email = EmailMessage::new("Leave", "x".repeat(50), "a@example.com");
        let prompt = PromptBuilder::new(&context, &email, 10).build();
        assert!(prompt.user.contains(&format!("{}\n[body truncated]", "x".repeat(10))));
        assert!(!prompt.user.contains(&"x".repeat(11)));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}

//! Lenient parsing of batch-level AI output.

use serde::Serialize;
use serde_json::Value;

/// An AI priority judgment keyed by free-text subject.
///
/// `priority` is kept as the raw label; it is parsed during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectPriority {
    pub subject: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BatchAnalysis {
    pub overall_summary: String,
    pub priorities: Vec<SubjectPriority>,
}

/// Removes a surrounding markdown code fence (```json ... ```), if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

fn entry_from_value(value: &Value) -> Option<SubjectPriority> {
    let subject = value.get("subject")?.as_str()?;
    let priority = value.get("priority")?.as_str()?;
    Some(SubjectPriority {
        subject: subject.to_string(),
        priority: priority.to_string(),
    })
}

impl BatchAnalysis {
    /// Parses raw model output. Never fails.
    ///
    /// Anything that is not a JSON object becomes an analysis whose summary
    /// is the raw text and whose priority list is empty. A missing or
    /// non-array `priorities` is treated as empty; entries without string
    /// `subject` and `priority` fields are skipped.
    pub fn parse(raw: &str) -> Self {
        let candidate = strip_code_fence(raw);
        let object = match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => object,
            _ => {
                return Self {
                    overall_summary: raw.trim().to_string(),
                    priorities: Vec::new(),
                }
            }
        };

        let overall_summary = match object.get("overall_summary") {
            Some(Value::String(summary)) => summary.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let priorities = object
            .get("priorities")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(entry_from_value).collect())
            .unwrap_or_default();

        Self {
            overall_summary,
            priorities,
        }
    }

    /// Placeholder analysis used when the summarizer could not be consulted.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            overall_summary: format!("AI analysis unavailable: {}", reason),
            priorities: Vec::new(),
        }
    }

    /// First entry whose subject equals `subject` byte for byte.
    pub fn priority_for(&self, subject: &str) -> Option<&SubjectPriority> {
        self.priorities.iter().find(|p| p.subject == subject)
    }
}

//! Applies a batch-level AI priority judgment to stored messages.
//!
//! The AI keys its judgments by subject text only, so matching is exact
//! string equality on the subject, either as stored or as it was escaped
//! for the prompt. Messages sharing a subject receive the same priority.

use serde::Serialize;
use tracing::{debug, info};

use crate::ai::prompt::sanitize_for_prompt;
use crate::ai::{BatchAnalysis, SubjectPriority};
use crate::db::{message_repo, Database};
use crate::model::{Message, Priority};

use super::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageReconciliation {
    pub message_id: String,
    pub subject: String,
    /// Priority after reconciliation.
    pub priority: Priority,
    /// Whether an AI entry matched and parsed.
    pub matched: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub overall_summary: String,
    pub matched: usize,
    pub defaulted: usize,
    /// One entry per batch message, in batch order.
    pub outcomes: Vec<MessageReconciliation>,
}

impl ReconcileReport {
    pub fn priority_of(&self, message_id: &str) -> Option<Priority> {
        self.outcomes
            .iter()
            .find(|o| o.message_id == message_id)
            .map(|o| o.priority)
    }
}

pub struct PriorityReconciler {
    db: Database,
}

impl PriorityReconciler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Updates the stored priority of every batch message whose subject has
    /// an AI entry with a recognizable priority. Others keep their current
    /// priority.
    pub fn reconcile(
        &self,
        owner: &str,
        batch: &[Message],
        analysis: &BatchAnalysis,
    ) -> Result<ReconcileReport, PipelineError> {
        let mut report = ReconcileReport {
            overall_summary: analysis.overall_summary.clone(),
            ..Default::default()
        };
        let mut updates = Vec::new();

        for message in batch {
            let judged = judged_entry(analysis, &message.subject).and_then(|entry| {
                let parsed = Priority::parse_label(&entry.priority);
                if parsed.is_none() {
                    debug!(
                        message_id = %message.message_id,
                        label = %entry.priority,
                        "Unrecognized AI priority, keeping placeholder"
                    );
                }
                parsed
            });

            let outcome = match judged {
                Some(priority) => {
                    updates.push((message.message_id.clone(), priority));
                    report.matched += 1;
                    MessageReconciliation {
                        message_id: message.message_id.clone(),
                        subject: message.subject.clone(),
                        priority,
                        matched: true,
                    }
                }
                None => {
                    report.defaulted += 1;
                    MessageReconciliation {
                        message_id: message.message_id.clone(),
                        subject: message.subject.clone(),
                        priority: message.priority,
                        matched: false,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        let changed = message_repo::update_priorities(&self.db, owner, &updates)?;

        info!(
            owner = %owner,
            matched = report.matched,
            defaulted = report.defaulted,
            changed,
            "Priorities reconciled"
        );
        Ok(report)
    }
}

/// The model sees subjects with chat markers escaped and may echo them back
/// in that form.
fn judged_entry<'a>(analysis: &'a BatchAnalysis, subject: &str) -> Option<&'a SubjectPriority> {
    analysis.priority_for(subject).or_else(|| {
        let shown = sanitize_for_prompt(subject);
        if shown == subject {
            None
        } else {
            analysis.priority_for(&shown)
        }
    })
}

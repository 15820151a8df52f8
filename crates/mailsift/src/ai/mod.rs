//! AI collaborators: a category classifier and a batch summarizer.
//!
//! Both are black boxes behind async traits. The pipeline never trusts their
//! output: labels are parsed against closed sets and batch analyses are
//! parsed leniently, so a misbehaving model degrades results without failing
//! a cycle.

pub mod analysis;
pub mod client;
pub mod error;
pub mod prompt;

use async_trait::async_trait;
use serde::Serialize;

pub use analysis::{BatchAnalysis, SubjectPriority};
pub use client::ChatCompletionsClient;
pub use error::AiError;

/// Free-text category classification.
///
/// Returns whatever label the model produced; mapping onto the closed
/// category set happens in the caller.
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    async fn classify_category(
        &self,
        sender: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, AiError>;
}

/// One line of the digest handed to the batch summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestItem {
    pub sender: String,
    pub subject: String,
    pub summary: String,
}

/// Overall summary plus per-subject priorities for a batch of messages.
#[async_trait]
pub trait BatchSummarizer: Send + Sync {
    async fn summarize_and_prioritize(
        &self,
        items: &[DigestItem],
    ) -> Result<BatchAnalysis, AiError>;
}

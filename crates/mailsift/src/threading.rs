//! Greedy online clustering of messages into threads by subject similarity.
//!
//! Each new message joins the cluster of its most similar prior message when
//! that similarity strictly exceeds the threshold, otherwise it starts a new
//! cluster. Earlier assignments are never revisited.

use serde::Serialize;
use tracing::debug;

use crate::model::Message;
use crate::similarity;

/// Default similarity (0-100) a subject must strictly exceed to join a cluster.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 85.0;

/// Prefix of every minted cluster id. Keeps them apart from provider thread ids.
pub const MINTED_THREAD_PREFIX: &str = "smart-";

/// Result of assigning a subject to a cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadAssignment {
    /// Joined the cluster of the best-scoring prior message.
    Joined { thread_id: String, score: f64 },
    /// No prior message was similar enough; a fresh id was minted.
    Minted { thread_id: String },
}

impl ThreadAssignment {
    pub fn thread_id(&self) -> &str {
        match self {
            ThreadAssignment::Joined { thread_id, .. } | ThreadAssignment::Minted { thread_id } => {
                thread_id
            }
        }
    }

    pub fn into_thread_id(self) -> String {
        match self {
            ThreadAssignment::Joined { thread_id, .. } | ThreadAssignment::Minted { thread_id } => {
                thread_id
            }
        }
    }
}

/// Mints a collision-resistant cluster id from a random v4 UUID.
pub fn mint_thread_id() -> String {
    format!("{}{}", MINTED_THREAD_PREFIX, uuid::Uuid::new_v4().simple())
}

#[derive(Debug, Clone)]
pub struct ThreadAssigner {
    threshold: f64,
}

impl Default for ThreadAssigner {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl ThreadAssigner {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Picks a cluster for `subject` among the owner's prior messages.
    ///
    /// `prior` is expected in insertion order; on equal scores the earliest
    /// message wins. Messages of other owners are ignored.
    pub fn assign(&self, owner: &str, subject: &str, prior: &[Message]) -> ThreadAssignment {
        let mut best: Option<(&str, f64)> = None;

        for message in prior.iter().filter(|m| m.owner == owner) {
            let score = similarity::score(subject, &message.subject);
            let beats_best = best.map_or(true, |(_, best_score)| score > best_score);
            if score > self.threshold && beats_best {
                best = Some((&message.computed_thread_id, score));
            }
        }

        match best {
            Some((thread_id, score)) => {
                debug!(thread_id, score, "Joined existing thread");
                ThreadAssignment::Joined {
                    thread_id: thread_id.to_string(),
                    score,
                }
            }
            None => {
                let thread_id = mint_thread_id();
                debug!(thread_id = %thread_id, candidates = prior.len(), "Minted new thread");
                ThreadAssignment::Minted { thread_id }
            }
        }
    }
}

/// Messages sharing one thread key, in ingestion order.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadGroup {
    pub thread_id: String,
    pub messages: Vec<Message>,
}

/// Groups messages by a key, keeping groups in first-seen order.
fn group_by<F>(messages: Vec<Message>, key: F) -> Vec<ThreadGroup>
where
    F: Fn(&Message) -> String,
{
    let mut groups: Vec<ThreadGroup> = Vec::new();
    for message in messages {
        let thread_id = key(&message);
        match groups.iter_mut().find(|g| g.thread_id == thread_id) {
            Some(group) => group.messages.push(message),
            None => groups.push(ThreadGroup {
                thread_id,
                messages: vec![message],
            }),
        }
    }
    groups
}

/// Groups by the system's own cluster id.
pub fn group_by_computed_thread(messages: Vec<Message>) -> Vec<ThreadGroup> {
    group_by(messages, |m| m.computed_thread_id.clone())
}

/// Groups by the provider's thread id. Messages without one share the empty key.
pub fn group_by_provider_thread(messages: Vec<Message>) -> Vec<ThreadGroup> {
    group_by(messages, |m| m.provider_thread_id.clone().unwrap_or_default())
}

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, info_span, Instrument};

use crate::ai::CategoryClassifier;
use crate::categorizer::HybridClassifier;
use crate::db::{message_repo, Database};
use crate::model::{Message, Priority, RawMessage};
use crate::sanitize;
use crate::threading::ThreadAssigner;

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::excerpt;
use super::locks::OwnerLocks;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IngestOutcome {
    Inserted(Message),
    /// The id was already stored; nothing was classified or written.
    Duplicate { message_id: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Newly stored messages in input order.
    pub inserted: Vec<Message>,
    pub duplicates: Vec<String>,
}

impl IngestReport {
    pub fn inserted_count(&self) -> usize {
        self.inserted.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }
}

/// Gate in front of the store: deduplicates by message id, then classifies,
/// threads and persists new messages.
pub struct Ingestor {
    db: Database,
    classifier: HybridClassifier,
    assigner: ThreadAssigner,
    body_max_chars: usize,
    locks: OwnerLocks,
}

impl Ingestor {
    pub fn new(
        db: Database,
        classifier: HybridClassifier,
        assigner: ThreadAssigner,
        body_max_chars: usize,
    ) -> Self {
        Self {
            db,
            classifier,
            assigner,
            body_max_chars,
            locks: OwnerLocks::new(),
        }
    }

    /// Builds the rule/AI classifier and thread assigner from settings.
    pub fn from_config(
        db: Database,
        config: &PipelineConfig,
        ai: Option<Arc<dyn CategoryClassifier>>,
    ) -> Self {
        let mut classifier =
            HybridClassifier::new(config.sender_rules.clone(), config.default_category);
        if let Some(ai) = ai {
            classifier = classifier.with_ai(ai, config.classify_timeout);
        }
        Self::new(
            db,
            classifier,
            ThreadAssigner::new(config.similarity_threshold),
            config.body_max_chars,
        )
    }

    /// Shares owner locks with other components touching the same store.
    pub fn with_locks(mut self, locks: OwnerLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &OwnerLocks {
        &self.locks
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ingests one message under the owner's lock.
    pub async fn ingest(
        &self,
        owner: &str,
        raw: RawMessage,
    ) -> Result<IngestOutcome, PipelineError> {
        let _guard = self.locks.acquire(owner).await;
        self.ingest_one(owner, raw).await
    }

    /// Ingests messages in order, holding the owner's lock for the whole
    /// batch. Stops at the first store failure; earlier messages stay
    /// committed.
    pub async fn ingest_batch(
        &self,
        owner: &str,
        raws: Vec<RawMessage>,
    ) -> Result<IngestReport, PipelineError> {
        let _guard = self.locks.acquire(owner).await;
        self.ingest_batch_locked(owner, raws).await
    }

    /// Batch ingestion for callers already holding the owner's lock.
    pub(crate) async fn ingest_batch_locked(
        &self,
        owner: &str,
        raws: Vec<RawMessage>,
    ) -> Result<IngestReport, PipelineError> {
        let mut report = IngestReport::default();
        for raw in raws {
            match self.ingest_one(owner, raw).await? {
                IngestOutcome::Inserted(message) => report.inserted.push(message),
                IngestOutcome::Duplicate { message_id } => report.duplicates.push(message_id),
            }
        }

        info!(
            owner = %owner,
            inserted = report.inserted_count(),
            duplicates = report.duplicate_count(),
            "Batch ingested"
        );
        Ok(report)
    }

    async fn ingest_one(
        &self,
        owner: &str,
        raw: RawMessage,
    ) -> Result<IngestOutcome, PipelineError> {
        let span = info_span!("ingest",
            owner = %owner,
            message_id = %raw.message_id,
            sender_domain = %sanitize::sender_domain(&raw.sender),
            subject_hash = %sanitize::subject_fingerprint(&raw.subject),
        );

        async move {
            if message_repo::exists(&self.db, &raw.message_id)? {
                debug!("Already stored, skipping");
                return Ok(IngestOutcome::Duplicate {
                    message_id: raw.message_id,
                });
            }

            let body_excerpt = excerpt::clean_body(&raw.body, self.body_max_chars);
            let summary = excerpt::summarize(&body_excerpt);

            let classification = self
                .classifier
                .classify(&raw.sender, &raw.subject, &body_excerpt)
                .await;

            let prior = message_repo::find_by_owner(&self.db, owner)?;
            let assignment = self.assigner.assign(owner, &raw.subject, &prior);

            debug!(
                sender = %raw.sender,
                subject = %raw.subject,
                category = %classification.category,
                source = ?classification.source,
                thread_id = %assignment.thread_id(),
                "Classified and threaded"
            );

            let message = Message {
                message_id: raw.message_id,
                owner: owner.to_string(),
                sender: raw.sender,
                subject: raw.subject,
                body_excerpt,
                summary,
                provider_thread_id: raw.provider_thread_id,
                computed_thread_id: assignment.into_thread_id(),
                category: classification.category,
                priority: Priority::Medium,
                attachments: raw.attachments,
                received_at: Utc::now(),
            };

            if !message_repo::insert_if_absent(&self.db, &message)? {
                debug!("Lost insert race, reporting duplicate");
                return Ok(IngestOutcome::Duplicate {
                    message_id: message.message_id,
                });
            }

            info!(
                category = %message.category,
                thread_id = %message.computed_thread_id,
                "Message stored"
            );
            Ok(IngestOutcome::Inserted(message))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use crate::categorizer::SenderRules;
    use crate::model::{Attachment, Category};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClassifier {
        label: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CategoryClassifier for CountingClassifier {
        async fn classify_category(&self, _: &str, _: &str, _: &str) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label.to_string())
        }
    }

    fn raw(id: &str, sender: &str, subject: &str, body: &str) -> RawMessage {
        RawMessage {
            message_id: id.to_string(),
            sender: sender.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            provider_thread_id: None,
            attachments: Vec::new(),
        }
    }

    fn ingestor_with(ai: Arc<CountingClassifier>) -> Ingestor {
        let db = Database::open_in_memory().unwrap();
        Ingestor::from_config(
            db,
            &PipelineConfig::default(),
            Some(ai as Arc<dyn CategoryClassifier>),
        )
    }

    #[tokio::test]
    async fn test_inserted_message_fields() {
        let ai = Arc::new(CountingClassifier {
            label: "Work",
            calls: AtomicUsize::new(0),
        });
        let ingestor = ingestor_with(ai);

        let mut message = raw(
            "m1",
            "Alice <alice@corp.example>",
            "Quarterly report",
            "  The report is attached.\r\nSee page two.  ",
        );
        message.provider_thread_id = Some("provider-1".to_string());
        message.attachments.push(Attachment {
            filename: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 1024,
            provider_ref: Some("part-0".to_string()),
        });

        let outcome = ingestor.ingest("alice", message).await.unwrap();
        let IngestOutcome::Inserted(stored) = outcome else {
            panic!("expected insert, got {:?}", outcome);
        };
        assert_eq!(stored.owner, "alice");
        assert_eq!(stored.category, Category::Work);
        assert_eq!(stored.priority, Priority::Medium);
        assert_eq!(stored.body_excerpt, "The report is attached. See page two.");
        assert_eq!(stored.summary, "The report is attached");
        assert!(stored.computed_thread_id.starts_with("smart-"));
        assert_eq!(stored.provider_thread_id.as_deref(), Some("provider-1"));

        let loaded = message_repo::find_by_id(ingestor.database(), "m1")
            .unwrap()
            .unwrap();
        assert_eq!(loaded.attachments.len(), 1);
        assert_eq!(loaded.computed_thread_id, stored.computed_thread_id);
    }

    #[tokio::test]
    async fn test_duplicate_skips_classification() {
        let ai = Arc::new(CountingClassifier {
            label: "Work",
            calls: AtomicUsize::new(0),
        });
        let ingestor = ingestor_with(ai.clone());

        let first = ingestor
            .ingest("alice", raw("m1", "friend@gmail.com", "Hello", "Hi"))
            .await
            .unwrap();
        assert!(matches!(first, IngestOutcome::Inserted(_)));
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);

        let second = ingestor
            .ingest("alice", raw("m1", "friend@gmail.com", "Hello", "Hi"))
            .await
            .unwrap();
        assert_eq!(
            second,
            IngestOutcome::Duplicate {
                message_id: "m1".to_string()
            }
        );
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);
        assert_eq!(message_repo::count_by_owner(ingestor.database(), "alice").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_body_is_bounded() {
        let db = Database::open_in_memory().unwrap();
        let ingestor = Ingestor::new(
            db,
            HybridClassifier::new(SenderRules::builtin(), Category::Personal),
            ThreadAssigner::default(),
            10,
        );
        let outcome = ingestor
            .ingest("alice", raw("m1", "friend@gmail.com", "Hello", &"y".repeat(50)))
            .await
            .unwrap();
        let IngestOutcome::Inserted(stored) = outcome else {
            panic!("expected insert");
        };
        assert_eq!(stored.body_excerpt.chars().count(), 10);
    }

    #[tokio::test]
    async fn test_batch_report_keeps_input_order() {
        let db = Database::open_in_memory().unwrap();
        let ingestor = Ingestor::from_config(db, &PipelineConfig::default(), None);

        let report = ingestor
            .ingest_batch(
                "alice",
                vec![
                    raw("a", "friend@gmail.com", "Lunch?", ""),
                    raw("b", "friend@gmail.com", "Movie tonight", ""),
                    raw("a", "friend@gmail.com", "Lunch?", ""),
                ],
            )
            .await
            .unwrap();

        let ids: Vec<&str> = report
            .inserted
            .iter()
            .map(|m| m.message_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(report.duplicates, vec!["a".to_string()]);
        assert_eq!(report.inserted_count(), 2);
        assert_eq!(report.duplicate_count(), 1);
    }
}

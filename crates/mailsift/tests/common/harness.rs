//! Test harness for isolated pipeline execution.
//!
//! Each harness owns a temporary directory holding an on-disk database, so
//! tests can reopen the store and never share state.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use mailsift::ai::{BatchSummarizer, CategoryClassifier};
use mailsift::db::{message_repo, Database};
use mailsift::model::Message;
use mailsift::pipeline::{FetchCycle, Ingestor, PipelineConfig, PriorityReconciler};

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub config: PipelineConfig,
}

impl TestHarness {
    /// A harness with default pipeline settings.
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("mailsift.db"))
            .expect("Failed to open test database");
        Self {
            temp_dir,
            db,
            config,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.temp_dir.path().join("mailsift.db")
    }

    /// Opens a second handle on the same database file.
    pub fn reopen(&self) -> Database {
        Database::open(&self.db_path()).expect("Failed to reopen test database")
    }

    pub fn ingestor(&self, ai: Option<Arc<dyn CategoryClassifier>>) -> Ingestor {
        Ingestor::from_config(self.db.clone(), &self.config, ai)
    }

    pub fn cycle(
        &self,
        ai: Option<Arc<dyn CategoryClassifier>>,
        summarizer: Option<Arc<dyn BatchSummarizer>>,
    ) -> FetchCycle {
        let cycle = FetchCycle::new(self.ingestor(ai), PriorityReconciler::new(self.db.clone()));
        match summarizer {
            Some(summarizer) => cycle.with_summarizer(summarizer, self.config.summarize_timeout),
            None => cycle,
        }
    }

    /// Shortens the AI timeouts for tests that exercise them.
    pub fn with_timeouts(mut self, classify: Duration, summarize: Duration) -> Self {
        self.config.classify_timeout = classify;
        self.config.summarize_timeout = summarize;
        self
    }

    pub fn messages(&self, owner: &str) -> Vec<Message> {
        message_repo::find_by_owner(&self.db, owner).expect("Failed to read messages")
    }

    pub fn message(&self, message_id: &str) -> Message {
        message_repo::find_by_id(&self.db, message_id)
            .expect("Failed to read message")
            .unwrap_or_else(|| panic!("message {} not stored", message_id))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

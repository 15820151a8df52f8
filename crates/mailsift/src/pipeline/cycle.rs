use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::ai::{
    AiError, BatchAnalysis, BatchSummarizer, CategoryClassifier, ChatCompletionsClient,
    DigestItem,
};
use crate::config::Config;
use crate::db::Database;
use crate::error::ConfigError;
use crate::mail::MailTransport;
use crate::model::{Message, RawMessage};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::ingest::Ingestor;
use super::reconcile::{PriorityReconciler, ReconcileReport};

/// Default budget for the batch summarizer call.
pub const DEFAULT_SUMMARIZE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub owner: String,
    pub fetched: usize,
    /// Newly stored messages carrying their reconciled priority.
    pub inserted: Vec<Message>,
    pub duplicates: usize,
    pub reconciliation: ReconcileReport,
    /// False when the summarizer was skipped, failed or timed out.
    pub analysis_available: bool,
}

/// One fetch cycle for a mailbox: ingest, summarize, reconcile.
pub struct FetchCycle {
    ingestor: Ingestor,
    reconciler: PriorityReconciler,
    summarizer: Option<Arc<dyn BatchSummarizer>>,
    summarize_timeout: Duration,
}

impl FetchCycle {
    pub fn new(ingestor: Ingestor, reconciler: PriorityReconciler) -> Self {
        Self {
            ingestor,
            reconciler,
            summarizer: None,
            summarize_timeout: DEFAULT_SUMMARIZE_TIMEOUT,
        }
    }

    pub fn with_summarizer(
        mut self,
        summarizer: Arc<dyn BatchSummarizer>,
        timeout: Duration,
    ) -> Self {
        self.summarizer = Some(summarizer);
        self.summarize_timeout = timeout;
        self
    }

    /// Wires the pipeline from configuration.
    ///
    /// When the AI client cannot be built (disabled, missing key) the cycle
    /// runs with sender rules and default priorities only.
    pub fn from_config(db: Database, config: &Config) -> Self {
        let pipeline = PipelineConfig::from_config(config);

        let client = match ChatCompletionsClient::from_config(&config.ai) {
            Ok(client) => {
                info!(model = %client.model(), "AI collaborator configured");
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!(error = %e, "Running without AI collaborator");
                None
            }
        };

        let classifier = client.clone().map(|c| c as Arc<dyn CategoryClassifier>);
        let ingestor = Ingestor::from_config(db.clone(), &pipeline, classifier);
        let cycle = Self::new(ingestor, PriorityReconciler::new(db));

        match client {
            Some(client) => cycle.with_summarizer(client, pipeline.summarize_timeout),
            None => cycle,
        }
    }

    /// Opens the configured database and wires a cycle over it.
    pub fn open(config: &Config) -> crate::Result<Self> {
        let path = config
            .resolved_database_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "database_path is not set and no home directory was found".to_string(),
            })?;
        let db = Database::open(&path)?;
        Ok(Self::from_config(db, config))
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    /// Runs a cycle over already-fetched raw messages, holding the owner's
    /// lock throughout.
    pub async fn run(
        &self,
        owner: &str,
        raws: Vec<RawMessage>,
    ) -> Result<CycleReport, PipelineError> {
        let span = info_span!("fetch_cycle", owner = %owner, fetched = raws.len());

        async move {
            let _guard = self.ingestor.locks().acquire(owner).await;

            let fetched = raws.len();
            let ingested = self.ingestor.ingest_batch_locked(owner, raws).await?;
            let (analysis, analysis_available) = self.analyze(&ingested.inserted).await;
            let reconciliation = self
                .reconciler
                .reconcile(owner, &ingested.inserted, &analysis)?;

            let mut inserted = ingested.inserted;
            for (message, outcome) in inserted.iter_mut().zip(&reconciliation.outcomes) {
                message.priority = outcome.priority;
            }

            info!(
                inserted = inserted.len(),
                duplicates = ingested.duplicates.len(),
                analysis_available,
                "Fetch cycle complete"
            );

            Ok(CycleReport {
                owner: owner.to_string(),
                fetched,
                inserted,
                duplicates: ingested.duplicates.len(),
                reconciliation,
                analysis_available,
            })
        }
        .instrument(span)
        .await
    }

    /// Pulls recent messages from `transport`, then runs a cycle.
    pub async fn run_from(
        &self,
        owner: &str,
        transport: &dyn MailTransport,
    ) -> Result<CycleReport, PipelineError> {
        let raws = transport.fetch_recent(owner).await?;
        self.run(owner, raws).await
    }

    async fn analyze(&self, inserted: &[Message]) -> (BatchAnalysis, bool) {
        if inserted.is_empty() {
            return (BatchAnalysis::default(), false);
        }
        let Some(summarizer) = &self.summarizer else {
            return (BatchAnalysis::unavailable("no summarizer configured"), false);
        };

        let items: Vec<DigestItem> = inserted
            .iter()
            .map(|m| DigestItem {
                sender: m.sender.clone(),
                subject: m.subject.clone(),
                summary: m.summary.clone(),
            })
            .collect();

        match tokio::time::timeout(
            self.summarize_timeout,
            summarizer.summarize_and_prioritize(&items),
        )
        .await
        {
            Ok(Ok(analysis)) => (analysis, true),
            Ok(Err(e)) => {
                warn!(error = %e, "Batch summarizer failed, keeping default priorities");
                (BatchAnalysis::unavailable(&e.to_string()), false)
            }
            Err(_) => {
                let e = AiError::Timeout {
                    secs: self.summarize_timeout.as_secs(),
                };
                warn!(error = %e, "Batch summarizer timed out, keeping default priorities");
                (BatchAnalysis::unavailable(&e.to_string()), false)
            }
        }
    }
}

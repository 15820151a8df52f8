pub mod ai;
pub mod categorizer;
pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod model;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod similarity;
pub mod telemetry;
pub mod threading;

pub use ai::{
    AiError, BatchAnalysis, BatchSummarizer, CategoryClassifier, ChatCompletionsClient, DigestItem,
};
pub use categorizer::{Classification, ClassificationSource, HybridClassifier, SenderRules};
pub use config::{load_config, Config};
pub use db::{Database, DatabaseError, FeedbackStats};
pub use error::{ConfigError, MailsiftError, Result};
pub use mail::{parse_rfc822, MailError, MailTransport};
pub use model::{Attachment, Category, Feedback, Message, Priority, RawMessage};
pub use pipeline::{
    CycleReport, FetchCycle, IngestOutcome, IngestReport, Ingestor, OwnerLocks, PipelineConfig,
    PipelineError, PriorityReconciler, ReconcileReport,
};
pub use secrets::{SecretError, SecretSource};
pub use threading::{ThreadAssigner, ThreadAssignment, ThreadGroup};

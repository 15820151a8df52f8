//! Ingestion pipeline: dedup gate, classification and threading, priority
//! reconciliation, and the fetch cycle tying them together.

pub mod config;
pub mod cycle;
pub mod error;
pub mod excerpt;
pub mod ingest;
pub mod locks;
pub mod reconcile;

pub use config::PipelineConfig;
pub use cycle::{CycleReport, FetchCycle, DEFAULT_SUMMARIZE_TIMEOUT};
pub use error::PipelineError;
pub use ingest::{IngestOutcome, IngestReport, Ingestor};
pub use locks::{OwnerGuard, OwnerLocks};
pub use reconcile::{MessageReconciliation, PriorityReconciler, ReconcileReport};

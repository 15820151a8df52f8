//! Hybrid category classification: deterministic sender rules backed by an
//! AI classifier with a safe default.

pub mod classifier;
pub mod rules;

pub use classifier::{
    Classification, ClassificationSource, FallbackReason, HybridClassifier,
    DEFAULT_CLASSIFY_TIMEOUT,
};
pub use rules::{SenderRule, SenderRules};

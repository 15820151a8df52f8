use std::time::Duration;

use crate::categorizer::SenderRules;
use crate::config::Config;
use crate::model::Category;

/// Settings the ingestion pipeline reads, flattened out of [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub body_max_chars: usize,
    pub similarity_threshold: f64,
    pub default_category: Category,
    pub sender_rules: SenderRules,
    pub classify_timeout: Duration,
    pub summarize_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            body_max_chars: config.ingest.body_max_chars,
            similarity_threshold: config.threading.similarity_threshold,
            default_category: config.classifier.default_category,
            sender_rules: config.classifier.sender_rules(),
            classify_timeout: config.ai.classify_timeout(),
            summarize_timeout: config.ai.summarize_timeout(),
        }
    }
}

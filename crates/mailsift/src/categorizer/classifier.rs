use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::rules::SenderRules;
use crate::ai::CategoryClassifier;
use crate::model::Category;

/// Default budget for one AI classification call.
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(20);

/// Why the default category was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    AiDisabled,
    AiError(String),
    Timeout,
    /// The model answered with something outside the closed label set.
    UnknownLabel(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationSource {
    Rule { rule_id: String },
    Ai,
    Fallback(FallbackReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub source: ClassificationSource,
}

/// Sender rules first, then the AI classifier, then the default category.
///
/// Never fails: every AI problem degrades to the default category.
pub struct HybridClassifier {
    rules: SenderRules,
    ai: Option<Arc<dyn CategoryClassifier>>,
    timeout: Duration,
    default_category: Category,
}

impl HybridClassifier {
    pub fn new(rules: SenderRules, default_category: Category) -> Self {
        Self {
            rules,
            ai: None,
            timeout: DEFAULT_CLASSIFY_TIMEOUT,
            default_category,
        }
    }

    pub fn with_ai(mut self, ai: Arc<dyn CategoryClassifier>, timeout: Duration) -> Self {
        self.ai = Some(ai);
        self.timeout = timeout;
        self
    }

    pub fn default_category(&self) -> Category {
        self.default_category
    }

    fn fallback(&self, reason: FallbackReason) -> Classification {
        Classification {
            category: self.default_category,
            source: ClassificationSource::Fallback(reason),
        }
    }

    pub async fn classify(&self, sender: &str, subject: &str, body: &str) -> Classification {
        if let Some(rule) = self.rules.matching_rule(sender) {
            debug!(rule_id = %rule.id, category = %rule.category, "Sender rule matched");
            return Classification {
                category: rule.category,
                source: ClassificationSource::Rule {
                    rule_id: rule.id.clone(),
                },
            };
        }

        let Some(ai) = &self.ai else {
            return self.fallback(FallbackReason::AiDisabled);
        };

        match tokio::time::timeout(self.timeout, ai.classify_category(sender, subject, body)).await
        {
            Ok(Ok(label)) => match Category::parse_label(&label) {
                Some(category) => Classification {
                    category,
                    source: ClassificationSource::Ai,
                },
                None => {
                    debug!(label = %label, "AI returned a label outside the category set");
                    self.fallback(FallbackReason::UnknownLabel(label))
                }
            },
            Ok(Err(e)) => {
                warn!(error = %e, "AI classification failed, using default category");
                self.fallback(FallbackReason::AiError(e.to_string()))
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "AI classification timed out, using default category"
                );
                self.fallback(FallbackReason::Timeout)
            }
        }
    }
}

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::categorizer::{SenderRule, SenderRules};
use crate::model::Category;
use crate::secrets::{self, SecretSource};
use crate::threading::DEFAULT_SIMILARITY_THRESHOLD;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Defaults to `~/.mailsift/data/mailsift.db`.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub threading: ThreadingConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            ingest: IngestConfig::default(),
            threading: ThreadingConfig::default(),
            classifier: ClassifierConfig::default(),
            ai: AiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Configured database path with `~` expanded, or the default location.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) => Some(PathBuf::from(secrets::expand_home(path))),
            None => crate::db::default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_body_max_chars")]
    pub body_max_chars: usize,
}

fn default_body_max_chars() -> usize {
    2000
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            body_max_chars: default_body_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadingConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_category")]
    pub default_category: Category,
    /// Replaces the built-in sender rules when present.
    #[serde(default)]
    pub rules: Option<Vec<SenderRule>>,
}

fn default_category() -> Category {
    Category::Personal
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            rules: None,
        }
    }
}

impl ClassifierConfig {
    pub fn sender_rules(&self) -> SenderRules {
        match &self.rules {
            Some(rules) => SenderRules::new(rules.clone()),
            None => SenderRules::builtin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: Option<String>,
    #[serde(default = "default_classify_timeout_secs")]
    pub classify_timeout_secs: u64,
    #[serde(default = "default_summarize_timeout_secs")]
    pub summarize_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env_var() -> Option<String> {
    Some("OPENROUTER_API_KEY".to_string())
}

fn default_classify_timeout_secs() -> u64 {
    20
}

fn default_summarize_timeout_secs() -> u64 {
    60
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_api_key_env_var(),
            classify_timeout_secs: default_classify_timeout_secs(),
            summarize_timeout_secs: default_summarize_timeout_secs(),
        }
    }
}

impl AiConfig {
    pub fn api_key_source(&self) -> SecretSource<'_> {
        SecretSource {
            direct: self.api_key.as_deref(),
            file: self.api_key_file.as_deref(),
            env_var: self.api_key_env_var.as_deref(),
        }
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }

    pub fn summarize_timeout(&self) -> Duration {
        Duration::from_secs(self.summarize_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Checks the constraints the schema cannot express, and re-checks the
/// numeric ranges for configs built in code.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let threshold = config.threading.similarity_threshold;
    if !(threshold > 0.0 && threshold < 100.0) {
        return Err(ConfigError::Validation {
            message: format!(
                "threading.similarity_threshold must be between 0 and 100 (exclusive), got {}",
                threshold
            ),
        });
    }

    if config.ingest.body_max_chars == 0 {
        return Err(ConfigError::Validation {
            message: "ingest.body_max_chars must be greater than 0".to_string(),
        });
    }

    if config.ai.classify_timeout_secs == 0 || config.ai.summarize_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "AI timeouts must be at least one second".to_string(),
        });
    }

    if let Some(rules) = &config.classifier.rules {
        let mut rule_ids = HashSet::new();
        for rule in rules {
            if !rule_ids.insert(rule.id.as_str()) {
                return Err(ConfigError::InvalidRule {
                    id: rule.id.clone(),
                    reason: "Duplicate rule ID".to_string(),
                });
            }
            if rule.sender_contains_any.is_empty()
                || rule.sender_contains_any.iter().any(|n| n.trim().is_empty())
            {
                return Err(ConfigError::InvalidRule {
                    id: rule.id.clone(),
                    reason: "sender_contains_any must list non-empty strings".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Validates a config that did not come through the loader.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_config(config)
}

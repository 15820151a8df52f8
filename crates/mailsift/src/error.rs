use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailsiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("AI collaborator error: {0}")]
    Ai(#[from] crate::ai::AiError),

    #[error("Mail error: {0}")]
    Mail(#[from] crate::mail::MailError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] crate::telemetry::TelemetryError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid sender rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, MailsiftError>;

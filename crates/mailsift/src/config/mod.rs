pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, validate};
pub use schema::{
    AiConfig, ClassifierConfig, Config, IngestConfig, LoggingConfig, ThreadingConfig,
};

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Rule not found: {engine}:{rule}")]
    RuleNotFound { engine: String, rule: String },

    #[error("Filesystem access error at {}: {source}", path.display())]
    FilesystemAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine '{engine}' failed to initialize: {message}")]
    EngineInit { engine: String, message: String },

    #[error("Engine '{engine}' failed: {message}")]
    EngineExecution { engine: String, message: String },

    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScanError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid check-in: {}", .problems.join("; "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

impl ValidationError {
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row no longer decodes into the domain model
    #[error("corrupt record in namespace {namespace}: {message}")]
    Corrupt { namespace: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("analysis unavailable: {0}")]
    Unavailable(String),

    #[error("invalid analysis response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    AnalysisUnavailable(#[from] AnalysisError),

    /// Superseded by a newer live-preview request; callers drop it silently.
    #[error("request superseded by a newer one")]
    StaleRequest,
}

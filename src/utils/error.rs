use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DwvError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Kubernetes error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Kubernetes exec error: {0}")]
    KubeExecError(String),

    #[error("malformed {context} response: {source}")]
    MalformedResponse {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("requested fields {fields:?} not found in any results")]
    FieldNotFound { fields: Vec<String> },

    #[error("Query error: {message}")]
    QueryError { message: String },

    #[error("Ingest error: {message}")]
    IngestError { message: String },

    #[error("no pod found with labels `{labels}` in namespace `{namespace}`")]
    PodNotFound { labels: String, namespace: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("file not found: {0}")]
    FileNotFoundError(PathBuf),

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

pub type Result<T> = std::result::Result<T, DwvError>;

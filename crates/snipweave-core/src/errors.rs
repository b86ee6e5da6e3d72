//! Error types for the snipweave core library.
//!
//! Only collaborator-boundary failures (I/O, walking, config parsing) are
//! errors. Per-item anomalies inside the pipeline are [`Diagnostic`]s and
//! never abort a run.
//!
//! [`Diagnostic`]: crate::models::Diagnostic

/// Top-level error enum for the snipweave core library.
#[derive(Debug, thiserror::Error)]
pub enum WeaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type WeaveResult<T> = Result<T, WeaveError>;

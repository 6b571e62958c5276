//! Error types for the harness

use thiserror::Error;

/// A candidate that was dropped from a training run, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub name: String,
    pub reason: String,
}

impl std::fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

fn join_failures(failures: &[CandidateFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum HarnessError {
    /// Missing or malformed source file, unreadable model artifact
    #[error("Load error: {0}")]
    Load(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("All {} candidates failed: {}", .0.len(), join_failures(.0))]
    AllCandidatesFailed(Vec<CandidateFailure>),

    #[error("Model is not ready for prediction: {0}")]
    ModelNotReady(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for HarnessError {
    fn from(e: serde_json::Error) -> Self {
        HarnessError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

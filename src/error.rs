//! Error types for churn scoring

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which persisted artifact a resource error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Model,
    FeatureNames,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::FeatureNames => write!(f, "feature names"),
        }
    }
}

/// Errors surfaced to the dashboard. None of them are retried.
#[derive(Debug, Error)]
pub enum ChurnError {
    /// An artifact is missing, unreadable, or fails to decode. Fatal at startup.
    #[error("{artifact} artifact unavailable at {path:?}: {reason}")]
    ResourceUnavailable {
        artifact: Artifact,
        path: PathBuf,
        reason: String,
    },

    /// The model could not score the feature vector. Aborts the current request.
    #[error("prediction failed: {0}")]
    PredictionFailed(String),

    /// The attribution routine failed. An already computed prediction stays valid.
    #[error("explanation failed: {0}")]
    ExplanationFailed(String),

    /// A profile value is outside its declared range
    #[error("invalid customer profile: {0}")]
    InvalidProfile(String),
}

impl ChurnError {
    pub(crate) fn unavailable(
        artifact: Artifact,
        path: impl Into<PathBuf>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::ResourceUnavailable {
            artifact,
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type ChurnResult<T> = std::result::Result<T, ChurnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_unavailable_message() {
        let err = ChurnError::unavailable(Artifact::Model, "artifacts/churn_model.json", "not found");
        let msg = err.to_string();
        assert!(msg.starts_with("model artifact unavailable"));
        assert!(msg.contains("churn_model.json"));
        assert!(msg.ends_with("not found"));
    }
}

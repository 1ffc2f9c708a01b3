//! Error types for the research pipeline
//!
//! None of these reach a caller of [`crate::ResearchPipeline::run_research`]:
//! every variant is recovered inside the pipeline and reported through
//! `tracing` only.

use std::fmt;

use thiserror::Error;

/// Which outbound backend call a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classification,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Classification => write!(f, "classification"),
            Stage::Generation => write!(f, "generation"),
        }
    }
}

/// Main error type for the research pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("{stage} call timed out after {after_ms}ms")]
    Timeout { stage: Stage, after_ms: u64 },

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = PipelineError::Timeout {
            stage: Stage::Generation,
            after_ms: 8000,
        };
        assert_eq!(err.to_string(), "generation call timed out after 8000ms");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_backend_from_anyhow() {
        let err: PipelineError = anyhow::anyhow!("connection refused").into();
        assert!(matches!(err, PipelineError::Backend(_)));
        assert!(!err.is_timeout());
    }
}

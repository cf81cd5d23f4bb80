use thiserror::Error;

use crate::domain::StepKind;

/// Main error type for strategy execution
#[derive(Error, Debug)]
pub enum ExecError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream rejected request: {0}")]
    Upstream(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Step errors
    #[error("Planning failed for {step}: {message}")]
    Planning { step: StepKind, message: String },

    #[error("Submission failed for {step}: {message}")]
    Submission { step: StepKind, message: String },

    #[error("Delegated execution failed: {0}")]
    Delegation(String),

    #[error("Timed out after {elapsed_ms}ms: {operation}")]
    Timeout { operation: String, elapsed_ms: u64 },

    // Data errors
    #[error("Market not found: {0}")]
    MarketNotFound(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Cancelled,

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ExecError {
    /// Whether another attempt of the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ExecError::Config(_)
                | ExecError::Validation(_)
                | ExecError::MarketNotFound(_)
                | ExecError::Cancelled
        )
    }

    /// Attach the step to an error raised while planning it.
    pub fn into_planning(self, step: StepKind) -> Self {
        match self {
            e @ (ExecError::Planning { .. }
            | ExecError::Timeout { .. }
            | ExecError::Validation(_)
            | ExecError::Cancelled) => e,
            other => ExecError::Planning {
                step,
                message: other.to_string(),
            },
        }
    }

    /// Attach the step to an error raised while submitting its transactions.
    pub fn into_submission(self, step: StepKind) -> Self {
        match self {
            e @ (ExecError::Submission { .. }
            | ExecError::Timeout { .. }
            | ExecError::Validation(_)
            | ExecError::Cancelled) => e,
            other => ExecError::Submission {
                step,
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for ExecError
pub type Result<T> = std::result::Result<T, ExecError>;

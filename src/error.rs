//! Error types for algorithm runs
//!
//! All failures surface through a single root [`AlgorithmError`] so callers
//! can match broadly or on a specific subkind.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running a hybrid quantum-classical algorithm
#[derive(Debug, Error)]
pub enum AlgorithmError {
    /// Invalid or missing input, detected before any backend dispatch.
    /// Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A single backend dispatch failed. Retryable up to the configured
    /// retry budget.
    #[error("backend failure: {0}")]
    Backend(String),

    /// A single backend dispatch exceeded its time budget. Counted toward
    /// the retry budget, not immediately fatal.
    #[error("backend dispatch took {elapsed:?}, exceeding the {budget:?} budget")]
    BackendTimeout {
        /// Time the dispatch actually took
        elapsed: Duration,
        /// Configured per-evaluation time budget
        budget: Duration,
    },

    /// The backend kept failing until the retry budget was exhausted.
    /// Aborts the run; no partial result is fabricated.
    #[error("execution failed after {attempts} dispatch attempts: {message}")]
    Execution {
        /// Number of dispatch attempts issued before giving up
        attempts: usize,
        /// Description of the last underlying failure
        message: String,
    },

    /// The run was cancelled from outside. Used to unwind the optimizer;
    /// converted to a result status by the loop and never returned from
    /// `run`.
    #[error("run cancelled")]
    Cancelled,

    /// The hard evaluation ceiling was reached. Used to unwind the
    /// optimizer; converted to a result status by the loop and never
    /// returned from `run`.
    #[error("evaluation budget exhausted")]
    BudgetExhausted,
}

impl AlgorithmError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a transient backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Whether a failed dispatch with this error may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::BackendTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AlgorithmError::backend("queue unavailable").is_retryable());
        assert!(AlgorithmError::BackendTimeout {
            elapsed: Duration::from_secs(2),
            budget: Duration::from_secs(1),
        }
        .is_retryable());
        assert!(!AlgorithmError::configuration("empty ansatz").is_retryable());
        assert!(!AlgorithmError::Execution {
            attempts: 3,
            message: "gone".into(),
        }
        .is_retryable());
    }

    #[test]
    fn test_execution_error_message() {
        let err = AlgorithmError::Execution {
            attempts: 3,
            message: "device offline".into(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("3"));
        assert!(msg.contains("device offline"));
    }
}

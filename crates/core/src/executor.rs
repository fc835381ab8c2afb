//! Execution results and the Executor trait.
//!
//! An Executor carries out a classified intent under a chosen strategy. The
//! default implementation in the pipeline crate is a stub that simulates
//! latency; production deployments substitute a real tool-running
//! collaborator behind the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExecutorError;
use crate::intent::ClassifiedIntent;
use crate::strategy::SelectedStrategy;

/// The outcome of executing one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the execution succeeded.
    pub success: bool,

    /// Human-readable output of the execution.
    pub output: String,

    /// Error message when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution telemetry.
    pub metrics: ExecutionMetrics,
}

impl ExecutionResult {
    /// A failed result carrying the collaborator's error and retry count.
    /// Executor failures are absorbed into results — never propagated as
    /// pipeline errors.
    pub fn from_error(err: &ExecutorError, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(err.to_string()),
            metrics: ExecutionMetrics {
                duration_ms,
                resource_units: None,
                retries_attempted: err.retries_attempted(),
            },
        }
    }
}

/// Telemetry for one execution attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Wall-clock duration of the execution.
    pub duration_ms: u64,

    /// Optional resource-usage counter (tokens, API calls, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_units: Option<u64>,

    /// How many retries the executor attempted. Retrying is entirely the
    /// executor's responsibility; the pipeline never retries.
    pub retries_attempted: u32,
}

/// The task-execution collaborator.
#[async_trait]
pub trait Executor: Send + Sync {
    /// A human-readable name for this executor (e.g., "simulated").
    fn name(&self) -> &str;

    /// Execute the intent under the selected strategy.
    ///
    /// Implementations must report `retries_attempted` accurately in either
    /// the result metrics or the error, and must not leave partial results
    /// behind on failure or cancellation.
    async fn execute(
        &self,
        intent: &ClassifiedIntent,
        strategy: &SelectedStrategy,
    ) -> std::result::Result<ExecutionResult, ExecutorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_error_carries_retries_and_message() {
        let err = ExecutorError::Failed {
            reason: "tool crashed".into(),
            retries_attempted: 3,
        };
        let result = ExecutionResult::from_error(&err, 120);
        assert!(!result.success);
        assert_eq!(result.metrics.retries_attempted, 3);
        assert_eq!(result.metrics.duration_ms, 120);
        assert!(result.error.unwrap().contains("tool crashed"));
    }

    #[test]
    fn metrics_default_is_zeroed() {
        let metrics = ExecutionMetrics::default();
        assert_eq!(metrics.duration_ms, 0);
        assert_eq!(metrics.retries_attempted, 0);
        assert!(metrics.resource_units.is_none());
    }
}

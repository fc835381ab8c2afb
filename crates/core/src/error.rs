//! Error types for the Helmsman domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Helmsman operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Feedback or a lookup referenced a session the orchestrator has never
    /// seen (or one that was cleared). Surfaced to the caller, never retried.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A stage handler was invoked without the upstream data it requires,
    /// e.g. strategy selection before any intent was classified. Fatal to
    /// the turn.
    #[error("Missing precondition for stage '{stage}': {message}")]
    MissingPrecondition { stage: String, message: String },

    // --- Collaborator errors ---
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    // --- Policy errors ---
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors from the intent-classification collaborator.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("Classification failed: {0}")]
    Failed(String),

    #[error("Classifier not configured: {0}")]
    NotConfigured(String),

    #[error("Classifier request timed out: {0}")]
    Timeout(String),
}

/// Errors from the task-execution collaborator.
///
/// These are absorbed at the execution stage and converted into a failed
/// `ExecutionResult`; they never terminate a turn on their own.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error("Execution failed: {reason} (after {retries_attempted} retries)")]
    Failed {
        reason: String,
        retries_attempted: u32,
    },

    #[error("Execution timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Execution cancelled: {0}")]
    Cancelled(String),
}

impl ExecutorError {
    /// How many retries the collaborator attempted before giving up.
    pub fn retries_attempted(&self) -> u32 {
        match self {
            ExecutorError::Failed {
                retries_attempted, ..
            } => *retries_attempted,
            _ => 0,
        }
    }
}

/// Errors from the preference model.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A persisted snapshot could not be parsed or validated. The model
    /// state is left untouched when this is returned.
    #[error("Model import failed: {0}")]
    Import(String),

    #[error("Feature vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

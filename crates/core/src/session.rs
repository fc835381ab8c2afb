//! The per-session context threaded through the pipeline.

use serde::{Deserialize, Serialize};

use crate::event::PipelineEvent;
use crate::executor::ExecutionResult;
use crate::finding::AntiPatternFinding;
use crate::intent::ClassifiedIntent;
use crate::strategy::SelectedStrategy;

/// Everything the orchestrator knows about one ongoing conversation.
///
/// Owned exclusively by the orchestrator: one instance per active session,
/// created on the first turn and retained until explicitly cleared. The
/// `history` is append-only and grows monotonically — truncation is an
/// external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Ordered, append-only event history across all turns.
    #[serde(default)]
    pub history: Vec<PipelineEvent>,

    /// The most recent classification (post-gate).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_intent: Option<ClassifiedIntent>,

    /// The most recent strategy selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_strategy: Option<SelectedStrategy>,

    /// The most recent execution result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<ExecutionResult>,

    /// Set when the detector fires; halts stage progression for that turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_pattern: Option<AntiPatternFinding>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id,
            history: Vec::new(),
            current_intent: None,
            selected_strategy: None,
            execution_result: None,
            anti_pattern: None,
        }
    }

    /// Append one event to history. Events are immutable once appended.
    pub fn push_event(&mut self, event: PipelineEvent) {
        self.history.push(event);
    }

    /// Fraction of execution events that succeeded, or `None` when the
    /// session has no execution events yet.
    pub fn success_rate(&self) -> Option<f64> {
        let mut total = 0u32;
        let mut ok = 0u32;
        for event in &self.history {
            if let Some(result) = event.payload.as_execution() {
                total += 1;
                if result.success {
                    ok += 1;
                }
            }
        }
        if total == 0 {
            None
        } else {
            Some(f64::from(ok) / f64::from(total))
        }
    }
}

//! Pipeline stages and the events they emit into session history.
//!
//! Every stage transition appends exactly one `PipelineEvent` to the
//! session's history before observers run, so an observer can always read
//! the just-appended event plus everything before it. Events are immutable
//! once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::executor::ExecutionResult;
use crate::feedback::TurnFeedback;
use crate::finding::AntiPatternFinding;
use crate::intent::{ClassifiedIntent, IntentKind};
use crate::strategy::SelectedStrategy;

/// The named steps of the orchestration pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Classification,
    ConfidenceGate,
    AntiPatternScan,
    StrategySelection,
    Execution,
    FeedbackCollection,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelineStage::Classification => "classification",
            PipelineStage::ConfidenceGate => "confidence_gate",
            PipelineStage::AntiPatternScan => "anti_pattern_scan",
            PipelineStage::StrategySelection => "strategy_selection",
            PipelineStage::Execution => "execution",
            PipelineStage::FeedbackCollection => "feedback_collection",
        };
        f.write_str(s)
    }
}

/// Typed payload of a pipeline event — one variant per stage kind, so
/// observers can pattern-match exhaustively instead of downcasting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// The classifier produced an intent.
    Classification { intent: ClassifiedIntent },

    /// The confidence gate ran. `downgraded_from` is set when the intent
    /// kind was forced to clarification-needed.
    ConfidenceGate {
        overall: f64,
        threshold: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        downgraded_from: Option<IntentKind>,
    },

    /// The anti-pattern detector ran over history.
    AntiPatternScan {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finding: Option<AntiPatternFinding>,
    },

    /// A strategy was selected for the turn.
    StrategySelection { strategy: SelectedStrategy },

    /// The executor finished (successfully or not).
    Execution { result: ExecutionResult },

    /// Feedback was submitted for this session.
    FeedbackCollection { feedback: TurnFeedback },
}

impl EventPayload {
    /// The intent carried by a classification payload, if any.
    pub fn as_classification(&self) -> Option<&ClassifiedIntent> {
        match self {
            EventPayload::Classification { intent } => Some(intent),
            _ => None,
        }
    }

    /// The execution result carried by an execution payload, if any.
    pub fn as_execution(&self) -> Option<&ExecutionResult> {
        match self {
            EventPayload::Execution { result } => Some(result),
            _ => None,
        }
    }
}

/// Metadata attached to every pipeline event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMeta {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// One immutable entry in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub stage: PipelineStage,
    pub payload: EventPayload,
    pub meta: EventMeta,
}

impl PipelineEvent {
    pub fn new(
        stage: PipelineStage,
        payload: EventPayload,
        session_id: impl Into<String>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            stage,
            payload,
            meta: EventMeta {
                timestamp: Utc::now(),
                session_id: session_id.into(),
                user_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::ConfidenceScore;

    #[test]
    fn payload_accessor_matches_variant() {
        let intent = ClassifiedIntent::new(
            IntentKind::Conversational,
            ConfidenceScore::new(0.7, 0.7, 0.75, 0.8),
            "hello there",
        );
        let payload = EventPayload::Classification {
            intent: intent.clone(),
        };
        assert_eq!(
            payload.as_classification().map(|i| i.raw_input.as_str()),
            Some("hello there")
        );
        assert!(payload.as_execution().is_none());
    }

    #[test]
    fn event_serializes_with_tagged_payload() {
        let event = PipelineEvent::new(
            PipelineStage::ConfidenceGate,
            EventPayload::ConfidenceGate {
                overall: 0.55,
                threshold: 0.7,
                downgraded_from: Some(IntentKind::Conversational),
            },
            "sess-1",
            None,
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"confidence_gate\""));
        assert!(json.contains("\"downgraded_from\""));
        assert!(json.contains("sess-1"));
    }
}

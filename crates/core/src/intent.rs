//! Intent classification types and the Classifier trait.
//!
//! A Classifier turns raw user input into a `ClassifiedIntent` — one of four
//! categories plus a four-dimensional confidence score. The default
//! implementation in the pipeline crate is a lexical heuristic; production
//! deployments substitute a model-backed classifier behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ClassifierError;
use crate::session::SessionContext;

/// The four intent categories a turn can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// The user is asking for information ("how does X work?")
    InformationalQuery,
    /// The user wants something done ("create a new service")
    ActionableTask,
    /// The input is too ambiguous to act on — ask before acting
    ClarificationNeeded,
    /// Small talk / open-ended conversation
    Conversational,
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntentKind::InformationalQuery => "informational_query",
            IntentKind::ActionableTask => "actionable_task",
            IntentKind::ClarificationNeeded => "clarification_needed",
            IntentKind::Conversational => "conversational",
        };
        f.write_str(s)
    }
}

/// Four-dimensional confidence for a classification, each axis in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// How well the input matched a known lexical/semantic pattern
    pub pattern_match: f64,
    /// How unambiguous the input itself is
    pub clarity: f64,
    /// How well existing response templates cover this intent
    pub template_coverage: f64,
    /// How often this intent kind was handled successfully in the past
    pub historical_success: f64,
}

impl ConfidenceScore {
    pub fn new(
        pattern_match: f64,
        clarity: f64,
        template_coverage: f64,
        historical_success: f64,
    ) -> Self {
        Self {
            pattern_match,
            clarity,
            template_coverage,
            historical_success,
        }
    }

    /// The overall confidence: arithmetic mean of the four axes.
    pub fn overall(&self) -> f64 {
        (self.pattern_match + self.clarity + self.template_coverage + self.historical_success) / 4.0
    }
}

/// The result of classifying one user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedIntent {
    /// The intent category. May be downgraded to `ClarificationNeeded` by
    /// the confidence gate after classification.
    pub kind: IntentKind,

    /// Confidence scores. The gate leaves these untouched when it
    /// downgrades `kind` — they remain the classifier's original evidence.
    pub confidence: ConfidenceScore,

    /// The raw input this classification was produced from.
    pub raw_input: String,

    /// Entities extracted from the input (name → value).
    #[serde(default)]
    pub entities: HashMap<String, String>,

    /// When the classification happened.
    pub classified_at: DateTime<Utc>,
}

impl ClassifiedIntent {
    pub fn new(kind: IntentKind, confidence: ConfidenceScore, raw_input: impl Into<String>) -> Self {
        Self {
            kind,
            confidence,
            raw_input: raw_input.into(),
            entities: HashMap::new(),
            classified_at: Utc::now(),
        }
    }
}

/// The intent-classification collaborator.
///
/// Consumes raw input text plus the session context (for history-aware
/// classifiers) and produces a `ClassifiedIntent`. The pipeline treats a
/// classifier failure as fatal to the turn.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// A human-readable name for this classifier (e.g., "heuristic").
    fn name(&self) -> &str;

    /// Classify one user turn.
    async fn classify(
        &self,
        input: &str,
        context: &SessionContext,
    ) -> std::result::Result<ClassifiedIntent, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_is_mean_of_four_axes() {
        let score = ConfidenceScore::new(0.85, 0.9, 0.75, 0.8);
        assert!((score.overall() - 0.825).abs() < 1e-12);

        let uniform = ConfidenceScore::new(0.5, 0.5, 0.5, 0.5);
        assert!((uniform.overall() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn intent_kind_serializes_snake_case() {
        let json = serde_json::to_string(&IntentKind::InformationalQuery).unwrap();
        assert_eq!(json, "\"informational_query\"");
        assert_eq!(IntentKind::ActionableTask.to_string(), "actionable_task");
    }

    #[test]
    fn classified_intent_round_trips() {
        let mut intent = ClassifiedIntent::new(
            IntentKind::ActionableTask,
            ConfidenceScore::new(0.85, 0.9, 0.75, 0.8),
            "Create a new service",
        );
        intent.entities.insert("target".into(), "service".into());

        let json = serde_json::to_string(&intent).unwrap();
        let back: ClassifiedIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, IntentKind::ActionableTask);
        assert_eq!(back.raw_input, "Create a new service");
        assert_eq!(back.entities.get("target").map(String::as_str), Some("service"));
    }
}

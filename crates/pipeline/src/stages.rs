//! Default stage handlers — the baseline semantics a deployment starts from.
//!
//! Each handler is replaceable through the orchestrator's builder methods.
//! The classifier and executor here are deliberately simple stand-ins: the
//! classifier is a lexical heuristic and the executor only simulates work.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

use helmsman_core::error::{ClassifierError, ExecutorError, Result};
use helmsman_core::executor::{ExecutionMetrics, ExecutionResult, Executor};
use helmsman_core::intent::{Classifier, ClassifiedIntent, ConfidenceScore, IntentKind};
use helmsman_core::session::SessionContext;
use helmsman_core::strategy::{SelectedStrategy, StrategyKind};

/// The strategy-selection stage handler.
///
/// Unlike `Classifier` and `Executor` this is not an external collaborator;
/// it is the pipeline's own decision seam, replaceable so the preference
/// model (or anything else) can drive selection.
#[async_trait]
pub trait StrategySelector: Send + Sync {
    /// A human-readable name for this selector (e.g., "rule_based").
    fn name(&self) -> &str;

    /// Pick a strategy for the classified (post-gate) intent.
    async fn select(
        &self,
        intent: &ClassifiedIntent,
        context: &SessionContext,
    ) -> Result<SelectedStrategy>;
}

// ── Classification ──────────────────────────────────────────────────────────

/// Words that mark a question about how something works.
const INTERROGATIVE_MARKERS: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "which", "explain",
];

/// Verbs that mark a request to produce or change something.
const CREATION_VERBS: &[&str] = &[
    "create", "build", "implement", "write", "add", "make", "generate", "deploy", "fix",
    "refactor", "update", "delete",
];

/// Inputs shorter than this are assumed to need clarification.
const MIN_ACTIONABLE_LEN: usize = 10;

/// Lexical heuristic classifier.
///
/// Template coverage and historical success are fixed placeholders here
/// (0.75 / 0.8); a production classifier replaces both with real estimates
/// behind the same trait.
#[derive(Debug, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    fn words(input: &str) -> impl Iterator<Item = &str> {
        input.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn classify(
        &self,
        input: &str,
        _context: &SessionContext,
    ) -> std::result::Result<ClassifiedIntent, ClassifierError> {
        let lower = input.to_lowercase();

        let (kind, pattern_match, clarity) =
            if Self::words(&lower).any(|w| INTERROGATIVE_MARKERS.contains(&w)) {
                (IntentKind::InformationalQuery, 0.8, 0.85)
            } else if Self::words(&lower).any(|w| CREATION_VERBS.contains(&w)) {
                (IntentKind::ActionableTask, 0.85, 0.9)
            } else if input.contains('?') || input.len() < MIN_ACTIONABLE_LEN {
                (IntentKind::ClarificationNeeded, 0.6, 0.5)
            } else {
                (IntentKind::Conversational, 0.7, 0.7)
            };

        let confidence = ConfidenceScore::new(pattern_match, clarity, 0.75, 0.8);
        debug!(intent = %kind, overall = confidence.overall(), "Classified input");

        Ok(ClassifiedIntent::new(kind, confidence, input))
    }
}

// ── Strategy selection ──────────────────────────────────────────────────────

/// Confidence over which an actionable task may run without confirmation.
const AUTONOMOUS_TASK_THRESHOLD: f64 = 0.9;

/// Deterministic intent-to-strategy mapping.
#[derive(Debug, Default)]
pub struct RuleBasedSelector;

#[async_trait]
impl StrategySelector for RuleBasedSelector {
    fn name(&self) -> &str {
        "rule_based"
    }

    async fn select(
        &self,
        intent: &ClassifiedIntent,
        _context: &SessionContext,
    ) -> Result<SelectedStrategy> {
        let overall = intent.confidence.overall();
        let kind = match intent.kind {
            IntentKind::InformationalQuery => StrategyKind::Autonomous,
            IntentKind::ActionableTask => {
                if overall > AUTONOMOUS_TASK_THRESHOLD {
                    StrategyKind::Autonomous
                } else {
                    StrategyKind::ConfirmFirst
                }
            }
            IntentKind::ClarificationNeeded => StrategyKind::Guided,
            IntentKind::Conversational => StrategyKind::Autonomous,
        };

        Ok(SelectedStrategy::new(
            kind,
            0.85,
            format!(
                "{} intent with overall confidence {:.2} maps to {}",
                intent.kind, overall, kind
            ),
        ))
    }
}

// ── Execution ───────────────────────────────────────────────────────────────

/// Executor stub that always succeeds after a fixed simulated latency.
///
/// A real implementation replaces this with tool/network calls and must
/// preserve the result shape, including an accurate retry count.
#[derive(Debug)]
pub struct SimulatedExecutor {
    latency: Duration,
}

impl SimulatedExecutor {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(25))
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn execute(
        &self,
        intent: &ClassifiedIntent,
        strategy: &SelectedStrategy,
    ) -> std::result::Result<ExecutionResult, ExecutorError> {
        let start = Instant::now();
        tokio::time::sleep(self.latency).await;

        Ok(ExecutionResult {
            success: true,
            output: format!(
                "Simulated handling of {} intent via {} strategy",
                intent.kind, strategy.kind
            ),
            error: None,
            metrics: ExecutionMetrics {
                duration_ms: start.elapsed().as_millis() as u64,
                resource_units: None,
                retries_attempted: 0,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SessionContext {
        SessionContext::new("sess-1", None)
    }

    async fn classify(input: &str) -> ClassifiedIntent {
        HeuristicClassifier.classify(input, &ctx()).await.unwrap()
    }

    #[tokio::test]
    async fn question_is_informational() {
        let intent = classify("How does X work?").await;
        assert_eq!(intent.kind, IntentKind::InformationalQuery);
        assert!((intent.confidence.pattern_match - 0.8).abs() < f64::EPSILON);
        assert!((intent.confidence.clarity - 0.85).abs() < f64::EPSILON);
        assert!((intent.confidence.overall() - 0.8).abs() < 1e-12);
    }

    #[tokio::test]
    async fn creation_verb_is_actionable() {
        let intent = classify("Create a new service").await;
        assert_eq!(intent.kind, IntentKind::ActionableTask);
        // (0.85 + 0.9 + 0.75 + 0.8) / 4
        assert!((intent.confidence.overall() - 0.825).abs() < 1e-12);
    }

    #[tokio::test]
    async fn short_input_needs_clarification() {
        let intent = classify("hmm ok").await;
        assert_eq!(intent.kind, IntentKind::ClarificationNeeded);
        assert!((intent.confidence.clarity - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn bare_question_mark_needs_clarification() {
        let intent = classify("is this really it?").await;
        assert_eq!(intent.kind, IntentKind::ClarificationNeeded);
    }

    #[tokio::test]
    async fn plain_statement_is_conversational() {
        let intent = classify("I enjoyed working with the new setup today").await;
        assert_eq!(intent.kind, IntentKind::Conversational);
    }

    #[tokio::test]
    async fn interrogative_wins_over_creation_verb() {
        // "how" is checked before "create"
        let intent = classify("How do I create a service?").await;
        assert_eq!(intent.kind, IntentKind::InformationalQuery);
    }

    #[tokio::test]
    async fn selector_maps_informational_to_autonomous() {
        let intent = classify("How does X work?").await;
        let strategy = RuleBasedSelector.select(&intent, &ctx()).await.unwrap();
        assert_eq!(strategy.kind, StrategyKind::Autonomous);
        assert!((strategy.confidence - 0.85).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn selector_confirms_actionable_below_autonomy_bar() {
        // overall 0.825 ≤ 0.9 under the default heuristic
        let intent = classify("Create a new service").await;
        let strategy = RuleBasedSelector.select(&intent, &ctx()).await.unwrap();
        assert_eq!(strategy.kind, StrategyKind::ConfirmFirst);
        assert!(strategy.reasoning.contains("actionable_task"));
    }

    #[tokio::test]
    async fn selector_runs_high_confidence_tasks_autonomously() {
        let mut intent = classify("Create a new service").await;
        intent.confidence = ConfidenceScore::new(0.95, 0.95, 0.9, 0.9);
        let strategy = RuleBasedSelector.select(&intent, &ctx()).await.unwrap();
        assert_eq!(strategy.kind, StrategyKind::Autonomous);
    }

    #[tokio::test]
    async fn selector_guides_clarification() {
        let intent = classify("eh?").await;
        let strategy = RuleBasedSelector.select(&intent, &ctx()).await.unwrap();
        assert_eq!(strategy.kind, StrategyKind::Guided);
    }

    #[tokio::test]
    async fn simulated_executor_succeeds_with_measured_duration() {
        let intent = classify("How does X work?").await;
        let strategy = RuleBasedSelector.select(&intent, &ctx()).await.unwrap();

        let executor = SimulatedExecutor::new(Duration::from_millis(5));
        let result = executor.execute(&intent, &strategy).await.unwrap();
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.metrics.retries_attempted, 0);
        assert!(result.output.contains("informational_query"));
        assert!(result.metrics.duration_ms >= 5);
    }
}

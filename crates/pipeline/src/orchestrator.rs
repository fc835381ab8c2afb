//! The pipeline orchestrator — owns session contexts, runs the stage
//! sequence, and dispatches events to registered observers.
//!
//! Concurrency model: one `tokio::sync::Mutex` per session serializes turns
//! for the same session id (a second `process` call waits for the turn in
//! flight), while turns for different sessions run fully in parallel.
//! Observer dispatch within a turn is strictly sequential — each observer is
//! awaited before the next runs, so later observers see the effects of
//! earlier ones. Do not parallelize dispatch; determinism is the contract.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use helmsman_config::{DetectorConfig, HelmsmanConfig, PipelineConfig};
use helmsman_core::error::{Error, ExecutorError, Result};
use helmsman_core::event::{EventPayload, PipelineEvent, PipelineStage};
use helmsman_core::executor::{ExecutionResult, Executor};
use helmsman_core::feedback::TurnFeedback;
use helmsman_core::intent::{Classifier, IntentKind};
use helmsman_core::session::SessionContext;

use crate::detector;
use crate::stages::{HeuristicClassifier, RuleBasedSelector, SimulatedExecutor, StrategySelector};

/// A function registered against a stage, invoked with the stage's event
/// and the live session context.
///
/// Observers receive the context mutably but should only write fields their
/// stage owns; everything else is read-only by convention.
#[async_trait]
pub trait StageObserver: Send + Sync {
    async fn on_event(&self, event: &PipelineEvent, context: &mut SessionContext);
}

type SessionMap = HashMap<String, Arc<Mutex<SessionContext>>>;

/// The pipeline orchestrator.
pub struct Orchestrator {
    pipeline: PipelineConfig,
    detector: DetectorConfig,
    classifier: Arc<dyn Classifier>,
    selector: Arc<dyn StrategySelector>,
    executor: Arc<dyn Executor>,
    /// Observer lists per stage, in registration order. Guarded by a std
    /// lock; the list is cloned out before any await.
    observers: std::sync::RwLock<HashMap<PipelineStage, Vec<Arc<dyn StageObserver>>>>,
    /// One context per session, each behind its own turn mutex.
    sessions: tokio::sync::RwLock<SessionMap>,
}

impl Orchestrator {
    /// Create an orchestrator with the default stage handlers.
    pub fn new(config: &HelmsmanConfig) -> Self {
        Self {
            pipeline: config.pipeline.clone(),
            detector: config.detector.clone(),
            classifier: Arc::new(HeuristicClassifier),
            selector: Arc::new(RuleBasedSelector),
            executor: Arc::new(SimulatedExecutor::default()),
            observers: std::sync::RwLock::new(HashMap::new()),
            sessions: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    /// Replace the classification handler.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the strategy-selection handler.
    pub fn with_selector(mut self, selector: Arc<dyn StrategySelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Replace the execution handler.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Register an additional observer for a stage. Observers never replace
    /// the stage handler; they run after the stage's event is appended, in
    /// registration order.
    pub fn on(&self, stage: PipelineStage, observer: Arc<dyn StageObserver>) {
        self.observers
            .write()
            .expect("observer registry lock poisoned")
            .entry(stage)
            .or_default()
            .push(observer);
    }

    /// Process one user turn.
    ///
    /// Creates the session context on first use (never resets an existing
    /// one), then runs the fixed stage order. When the anti-pattern scan
    /// fires, the turn short-circuits and the returned context carries the
    /// finding instead of a strategy and execution result.
    ///
    /// Handler failures in classification or strategy selection propagate
    /// to the caller; mutations already applied by earlier stages remain —
    /// there is no rollback. Executor failures never propagate; they become
    /// a failed `ExecutionResult`.
    pub async fn process(
        &self,
        input: &str,
        session_id: &str,
        user_id: Option<String>,
    ) -> Result<SessionContext> {
        let session = self.session_handle(session_id, user_id.clone()).await;
        // Held for the whole turn: same-session calls serialize here.
        let mut ctx = session.lock().await;

        info!(
            session_id,
            history = ctx.history.len(),
            "Processing turn"
        );

        // ── Classification ──
        let intent = match self.classifier.classify(input, &ctx).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(session_id, error = %e, "Classification failed");
                return Err(e.into());
            }
        };
        ctx.current_intent = Some(intent.clone());
        self.emit(
            &mut ctx,
            PipelineStage::Classification,
            EventPayload::Classification { intent },
        )
        .await;

        // ── Confidence gate ──
        self.gate_intent(&mut ctx).await?;

        // ── Anti-pattern scan ──
        if self.pipeline.detection_enabled {
            let finding = detector::detect(&ctx.history, &self.detector);
            if let Some(finding) = &finding {
                warn!(
                    session_id,
                    pattern = %finding.pattern,
                    severity = finding.severity,
                    "Anti-pattern detected, short-circuiting turn"
                );
                ctx.anti_pattern = Some(finding.clone());
            }
            let fired = finding.is_some();
            self.emit(
                &mut ctx,
                PipelineStage::AntiPatternScan,
                EventPayload::AntiPatternScan { finding },
            )
            .await;
            if fired {
                return Ok(ctx.clone());
            }
        }

        // ── Strategy selection ──
        let intent = ctx.current_intent.clone().ok_or_else(|| {
            Error::MissingPrecondition {
                stage: PipelineStage::StrategySelection.to_string(),
                message: "no classified intent on context".into(),
            }
        })?;
        let strategy = match self.selector.select(&intent, &ctx).await {
            Ok(strategy) => strategy,
            Err(e) => {
                warn!(session_id, error = %e, "Strategy selection failed");
                return Err(e);
            }
        };
        debug!(session_id, strategy = %strategy.kind, "Strategy selected");
        ctx.selected_strategy = Some(strategy.clone());
        self.emit(
            &mut ctx,
            PipelineStage::StrategySelection,
            EventPayload::StrategySelection { strategy: strategy.clone() },
        )
        .await;

        // ── Execution ──
        let start = Instant::now();
        let timeout = Duration::from_millis(self.pipeline.execution_timeout_ms);
        let result = match tokio::time::timeout(timeout, self.executor.execute(&intent, &strategy))
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(session_id, error = %e, "Execution failed");
                ExecutionResult::from_error(&e, start.elapsed().as_millis() as u64)
            }
            Err(_) => {
                let e = ExecutorError::Timeout {
                    timeout_ms: self.pipeline.execution_timeout_ms,
                };
                warn!(session_id, error = %e, "Execution timed out");
                ExecutionResult::from_error(&e, start.elapsed().as_millis() as u64)
            }
        };
        ctx.execution_result = Some(result.clone());
        self.emit(
            &mut ctx,
            PipelineStage::Execution,
            EventPayload::Execution { result },
        )
        .await;

        Ok(ctx.clone())
    }

    /// Submit feedback for a previously processed session.
    ///
    /// Fails with `SessionNotFound` when the session id was never processed
    /// (or was cleared). Otherwise appends a feedback-collection event and
    /// dispatches observers — the learning bridge reacts here.
    pub async fn submit_feedback(&self, session_id: &str, feedback: TurnFeedback) -> Result<()> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions
                .get(session_id)
                .cloned()
                .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?
        };
        let mut ctx = session.lock().await;

        debug!(session_id, rating = ?feedback.rating, "Feedback received");
        self.emit(
            &mut ctx,
            PipelineStage::FeedbackCollection,
            EventPayload::FeedbackCollection { feedback },
        )
        .await;
        Ok(())
    }

    /// A point-in-time copy of a session's context.
    pub async fn get_context(&self, session_id: &str) -> Option<SessionContext> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        }?;
        let ctx = session.lock().await;
        Some(ctx.clone())
    }

    /// Remove all retained state for a session. Returns whether a session
    /// existed.
    pub async fn clear_context(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Get or create the session's shared handle.
    async fn session_handle(
        &self,
        session_id: &str,
        user_id: Option<String>,
    ) -> Arc<Mutex<SessionContext>> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "Creating session context");
                Arc::new(Mutex::new(SessionContext::new(session_id, user_id)))
            })
            .clone()
    }

    /// Downgrade low-confidence intents to clarification-needed.
    ///
    /// The confidence sub-scores are deliberately left untouched when the
    /// kind is downgraded — they remain the classifier's original evidence.
    async fn gate_intent(&self, ctx: &mut SessionContext) -> Result<()> {
        let intent = ctx
            .current_intent
            .as_mut()
            .ok_or_else(|| Error::MissingPrecondition {
                stage: PipelineStage::ConfidenceGate.to_string(),
                message: "no classified intent on context".into(),
            })?;

        let overall = intent.confidence.overall();
        let threshold = self.pipeline.confidence_threshold;
        let downgraded_from = if overall < threshold && intent.kind != IntentKind::ClarificationNeeded
        {
            let original = intent.kind;
            intent.kind = IntentKind::ClarificationNeeded;
            debug!(
                session_id = %ctx.session_id,
                overall,
                threshold,
                from = %original,
                "Intent downgraded by confidence gate"
            );
            Some(original)
        } else {
            None
        };

        self.emit(
            ctx,
            PipelineStage::ConfidenceGate,
            EventPayload::ConfidenceGate {
                overall,
                threshold,
                downgraded_from,
            },
        )
        .await;
        Ok(())
    }

    /// Append the stage's event to history, then run that stage's observers
    /// sequentially in registration order.
    async fn emit(&self, ctx: &mut SessionContext, stage: PipelineStage, payload: EventPayload) {
        let event = PipelineEvent::new(stage, payload, ctx.session_id.clone(), ctx.user_id.clone());
        // Append before dispatch: observers always see the event they are
        // handed as the last history entry.
        ctx.push_event(event.clone());

        let observers: Vec<Arc<dyn StageObserver>> = {
            let registry = self.observers.read().expect("observer registry lock poisoned");
            registry.get(&stage).cloned().unwrap_or_default()
        };
        for observer in observers {
            observer.on_event(&event, ctx).await;
        }
    }
}

//! Wiring between the pipeline and the preference model.
//!
//! `PolicySelector` replaces the rule-based strategy stage with bandit
//! selection; `LearningBridge` observes the feedback-collection stage and
//! feeds rewards back into the model. Both share one `PreferenceModel`
//! because strategy weights are global across sessions.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use helmsman_core::error::Result;
use helmsman_core::event::{EventPayload, PipelineEvent};
use helmsman_core::intent::ClassifiedIntent;
use helmsman_core::session::SessionContext;
use helmsman_core::strategy::SelectedStrategy;

use helmsman_policy::{ContextFeatures, PreferenceModel};

use crate::orchestrator::StageObserver;
use crate::stages::StrategySelector;

/// Strategy selection driven by the contextual bandit.
pub struct PolicySelector {
    model: Arc<PreferenceModel>,
}

impl PolicySelector {
    pub fn new(model: Arc<PreferenceModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl StrategySelector for PolicySelector {
    fn name(&self) -> &str {
        "policy"
    }

    async fn select(
        &self,
        _intent: &ClassifiedIntent,
        context: &SessionContext,
    ) -> Result<SelectedStrategy> {
        let features = ContextFeatures::from_session(context, Utc::now());
        let kind = self.model.select_strategy(&features);

        let exploration = self.model.exploration_rate();
        let iteration = self.model.iterations();
        // Selection confidence grows as exploration pressure fades.
        let confidence = (1.0 - exploration).clamp(0.5, 0.95);

        Ok(SelectedStrategy::new(
            kind,
            confidence,
            format!(
                "preference model pick at iteration {iteration} \
                 (exploration rate {exploration:.3})"
            ),
        ))
    }
}

/// Observer for the feedback-collection stage that converts submitted
/// feedback into a model update for the turn's selected strategy.
pub struct LearningBridge {
    model: Arc<PreferenceModel>,
}

impl LearningBridge {
    pub fn new(model: Arc<PreferenceModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl StageObserver for LearningBridge {
    async fn on_event(&self, event: &PipelineEvent, context: &mut SessionContext) {
        let EventPayload::FeedbackCollection { feedback } = &event.payload else {
            return;
        };

        let Some(strategy) = &context.selected_strategy else {
            warn!(
                session_id = %context.session_id,
                "Feedback received before any strategy was selected; skipping update"
            );
            return;
        };

        let features = ContextFeatures::from_session(context, Utc::now());
        self.model
            .update_from_feedback(&features, strategy.kind, feedback);
        debug!(
            session_id = %context.session_id,
            strategy = %strategy.kind,
            "Preference model updated from feedback"
        );
    }
}

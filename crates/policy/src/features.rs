//! Context feature extraction — turns session state into the fixed-length
//! numeric vector the bandit scores against.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use helmsman_core::intent::IntentKind;
use helmsman_core::session::SessionContext;

/// Dimension of the context feature vector.
pub const FEATURE_DIM: usize = 6;

/// The abstract context the bandit conditions on. Each field is normalized
/// to roughly [0, 1] by `to_vector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFeatures {
    /// The intent category of the current turn.
    pub intent: IntentKind,

    /// Estimated task complexity, in [0, 1].
    pub task_complexity: f64,

    /// User experience level, in [0, 1].
    pub user_experience: f64,

    /// Hour of day, 0–23.
    pub hour_of_day: u32,

    /// Session length so far (turns, used as a minutes proxy).
    pub session_length: usize,

    /// Fraction of prior executions in this session that succeeded.
    pub prior_success_rate: f64,
}

impl ContextFeatures {
    /// Fixed numeric code per intent category, evenly spread over (0, 1].
    pub fn intent_code(intent: IntentKind) -> f64 {
        match intent {
            IntentKind::InformationalQuery => 0.25,
            IntentKind::ActionableTask => 0.5,
            IntentKind::ClarificationNeeded => 0.75,
            IntentKind::Conversational => 1.0,
        }
    }

    /// The fixed-length vector the bandit consumes.
    pub fn to_vector(&self) -> [f64; FEATURE_DIM] {
        [
            Self::intent_code(self.intent),
            self.task_complexity.clamp(0.0, 1.0),
            self.user_experience.clamp(0.0, 1.0),
            f64::from(self.hour_of_day) / 24.0,
            (self.session_length as f64 / 60.0).min(1.0),
            self.prior_success_rate.clamp(0.0, 1.0),
        ]
    }

    /// Derive features for the current turn of a session.
    ///
    /// Complexity is estimated from the raw input length of the latest
    /// intent; user experience is a flat 0.5 until a profile store exists.
    pub fn from_session(context: &SessionContext, now: DateTime<Utc>) -> Self {
        let (intent, complexity) = match &context.current_intent {
            Some(intent) => (
                intent.kind,
                (intent.raw_input.len() as f64 / 200.0).min(1.0),
            ),
            None => (IntentKind::Conversational, 0.5),
        };

        Self {
            intent,
            task_complexity: complexity,
            user_experience: 0.5,
            hour_of_day: now.hour(),
            session_length: context.history.len(),
            prior_success_rate: context.success_rate().unwrap_or(0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use helmsman_core::intent::{ClassifiedIntent, ConfidenceScore};

    fn features(intent: IntentKind) -> ContextFeatures {
        ContextFeatures {
            intent,
            task_complexity: 0.4,
            user_experience: 0.5,
            hour_of_day: 12,
            session_length: 30,
            prior_success_rate: 0.8,
        }
    }

    #[test]
    fn vector_has_fixed_dimension_and_scaling() {
        let v = features(IntentKind::ActionableTask).to_vector();
        assert_eq!(v.len(), FEATURE_DIM);
        assert!((v[0] - 0.5).abs() < 1e-12); // intent code
        assert!((v[3] - 0.5).abs() < 1e-12); // hour 12 / 24
        assert!((v[4] - 0.5).abs() < 1e-12); // 30 turns / 60
        assert!(v.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn intent_codes_are_distinct() {
        let codes: Vec<f64> = [
            IntentKind::InformationalQuery,
            IntentKind::ActionableTask,
            IntentKind::ClarificationNeeded,
            IntentKind::Conversational,
        ]
        .iter()
        .map(|k| ContextFeatures::intent_code(*k))
        .collect();
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert!((a - b).abs() > 1e-9);
            }
        }
    }

    #[test]
    fn long_sessions_saturate_at_one() {
        let mut f = features(IntentKind::Conversational);
        f.session_length = 500;
        assert!((f.to_vector()[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn from_session_uses_current_intent() {
        let mut ctx = SessionContext::new("sess-1", None);
        ctx.current_intent = Some(ClassifiedIntent::new(
            IntentKind::InformationalQuery,
            ConfidenceScore::new(0.8, 0.85, 0.75, 0.8),
            "How does the scheduler distribute work across threads?",
        ));

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let f = ContextFeatures::from_session(&ctx, now);
        assert_eq!(f.intent, IntentKind::InformationalQuery);
        assert_eq!(f.hour_of_day, 9);
        assert!(f.task_complexity > 0.0 && f.task_complexity < 1.0);
        // no executions yet — neutral prior
        assert!((f.prior_success_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn from_session_without_intent_is_neutral() {
        let ctx = SessionContext::new("sess-1", None);
        let f = ContextFeatures::from_session(&ctx, Utc::now());
        assert_eq!(f.intent, IntentKind::Conversational);
        assert!((f.task_complexity - 0.5).abs() < 1e-12);
    }
}

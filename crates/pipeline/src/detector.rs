//! Anti-pattern detection over session history.
//!
//! A pure function of `(history, config)` — side-effect-free and
//! deterministic for a given history snapshot. Checks run in a fixed order
//! and the first positive short-circuits, so at most one finding is
//! reported per turn. A finding is never revoked by the detector itself; a
//! later turn may or may not reproduce it depending on updated history.

use helmsman_config::DetectorConfig;
use helmsman_core::event::PipelineEvent;
use helmsman_core::finding::{AntiPattern, AntiPatternFinding};

/// Inputs shorter than this are treated as clarification noise.
const SHORT_INPUT_LEN: usize = 10;

/// Scan history for unproductive conversational shapes.
///
/// Check order matters: infinite-clarification before stuck-loop.
pub fn detect(history: &[PipelineEvent], config: &DetectorConfig) -> Option<AntiPatternFinding> {
    if let Some(finding) = check_infinite_clarification(history, config) {
        return Some(finding);
    }
    check_stuck_loop(history, config)
}

/// The user keeps sending inputs too short to act on. Counts
/// classification events with a raw input under `SHORT_INPUT_LEN` chars;
/// fires once the count exceeds `max_clarification_attempts`.
fn check_infinite_clarification(
    history: &[PipelineEvent],
    config: &DetectorConfig,
) -> Option<AntiPatternFinding> {
    let short_inputs: Vec<&str> = history
        .iter()
        .filter_map(|e| e.payload.as_classification())
        .filter(|intent| intent.raw_input.len() < SHORT_INPUT_LEN)
        .map(|intent| intent.raw_input.as_str())
        .collect();

    if short_inputs.len() <= config.max_clarification_attempts {
        return None;
    }

    Some(AntiPatternFinding {
        pattern: AntiPattern::InfiniteClarification,
        severity: 0.9,
        evidence: short_inputs
            .iter()
            .map(|input| format!("short input '{}' ({} chars)", input, input.len()))
            .collect(),
        suggested_pivot: "Stop asking open questions; offer a short list of concrete options \
                          and let the user pick one."
            .into(),
    })
}

/// The last `loop_window` events span fewer than `min_distinct_stages`
/// distinct stages — the conversation is cycling without progress. Only
/// evaluated once a full window of events exists.
fn check_stuck_loop(
    history: &[PipelineEvent],
    config: &DetectorConfig,
) -> Option<AntiPatternFinding> {
    if history.len() < config.loop_window {
        return None;
    }

    let window = &history[history.len() - config.loop_window..];
    let mut stages: Vec<_> = window.iter().map(|e| e.stage).collect();
    stages.sort_by_key(|s| *s as u8);
    stages.dedup();

    if stages.len() >= config.min_distinct_stages {
        return None;
    }

    Some(AntiPatternFinding {
        pattern: AntiPattern::StuckLoop,
        severity: 0.85,
        evidence: window
            .iter()
            .map(|e| format!("{} at {}", e.stage, e.meta.timestamp.to_rfc3339()))
            .collect(),
        suggested_pivot: "Break the loop: summarize progress so far and propose a different \
                          approach to the task."
            .into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use helmsman_core::event::{EventPayload, PipelineStage};
    use helmsman_core::intent::{ClassifiedIntent, ConfidenceScore, IntentKind};

    fn classification_event(input: &str) -> PipelineEvent {
        PipelineEvent::new(
            PipelineStage::Classification,
            EventPayload::Classification {
                intent: ClassifiedIntent::new(
                    IntentKind::ClarificationNeeded,
                    ConfidenceScore::new(0.6, 0.5, 0.75, 0.8),
                    input,
                ),
            },
            "sess-1",
            None,
        )
    }

    fn scan_event() -> PipelineEvent {
        PipelineEvent::new(
            PipelineStage::AntiPatternScan,
            EventPayload::AntiPatternScan { finding: None },
            "sess-1",
            None,
        )
    }

    #[test]
    fn empty_history_has_no_finding() {
        assert!(detect(&[], &DetectorConfig::default()).is_none());
    }

    #[test]
    fn infinite_clarification_fires_above_threshold() {
        let config = DetectorConfig::default(); // max_clarification_attempts = 3
        let mut history: Vec<PipelineEvent> =
            (0..3).map(|_| classification_event("what?")).collect();

        // exactly at the threshold — not yet a finding
        assert!(detect(&history, &config).is_none());

        history.push(classification_event("huh?"));
        let finding = detect(&history, &config).unwrap();
        assert_eq!(finding.pattern, AntiPattern::InfiniteClarification);
        assert!((finding.severity - 0.9).abs() < f64::EPSILON);
        assert_eq!(finding.evidence.len(), 4);
        assert!(finding.evidence[3].contains("huh?"));
    }

    #[test]
    fn long_inputs_do_not_count_as_clarification() {
        let config = DetectorConfig::default();
        let history: Vec<PipelineEvent> = (0..10)
            .map(|i| classification_event(&format!("please summarize chapter number {i}")))
            .collect();
        // all same stage though — the stuck-loop check fires instead
        let finding = detect(&history, &config).unwrap();
        assert_eq!(finding.pattern, AntiPattern::StuckLoop);
    }

    #[test]
    fn stuck_loop_fires_on_single_stage_window() {
        let config = DetectorConfig::default();
        let history: Vec<PipelineEvent> = (0..5)
            .map(|i| classification_event(&format!("tell me more about topic {i}")))
            .collect();

        let finding = detect(&history, &config).unwrap();
        assert_eq!(finding.pattern, AntiPattern::StuckLoop);
        assert!((finding.severity - 0.85).abs() < f64::EPSILON);
        assert_eq!(finding.evidence.len(), 5);
    }

    #[test]
    fn stuck_loop_needs_full_window() {
        let config = DetectorConfig::default();
        let history: Vec<PipelineEvent> = (0..4)
            .map(|i| classification_event(&format!("tell me more about topic {i}")))
            .collect();
        assert!(detect(&history, &config).is_none());
    }

    #[test]
    fn mixed_stages_are_not_a_loop() {
        let config = DetectorConfig::default();
        let mut history = Vec::new();
        for i in 0..3 {
            history.push(classification_event(&format!("please review module {i}")));
            history.push(scan_event());
        }
        assert!(detect(&history, &config).is_none());
    }

    #[test]
    fn clarification_check_wins_over_stuck_loop() {
        // history satisfying both checks reports infinite-clarification
        let config = DetectorConfig::default();
        let history: Vec<PipelineEvent> = (0..5).map(|_| classification_event("eh?")).collect();
        let finding = detect(&history, &config).unwrap();
        assert_eq!(finding.pattern, AntiPattern::InfiniteClarification);
    }

    #[test]
    fn detector_is_deterministic() {
        let config = DetectorConfig::default();
        let history: Vec<PipelineEvent> = (0..5).map(|_| classification_event("eh?")).collect();
        let a = detect(&history, &config).unwrap();
        let b = detect(&history, &config).unwrap();
        assert_eq!(a.pattern, b.pattern);
        assert_eq!(a.evidence, b.evidence);
    }
}

//! Anti-pattern findings — detected unproductive conversational shapes.

use serde::{Deserialize, Serialize};

/// The unproductive conversational shapes the detector can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiPattern {
    /// The user keeps sending inputs too short to act on
    InfiniteClarification,
    /// The conversation is cycling through the same stage without progress
    StuckLoop,
    /// The conversation has wandered away from its original topic
    ContextDrift,
    /// The task keeps growing beyond its original bounds
    ScopeCreep,
    /// Responses are compounding on fabricated premises
    HallucinationSpiral,
}

impl std::fmt::Display for AntiPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AntiPattern::InfiniteClarification => "infinite_clarification",
            AntiPattern::StuckLoop => "stuck_loop",
            AntiPattern::ContextDrift => "context_drift",
            AntiPattern::ScopeCreep => "scope_creep",
            AntiPattern::HallucinationSpiral => "hallucination_spiral",
        };
        f.write_str(s)
    }
}

/// One detected anti-pattern.
///
/// Once set on a session context, the pipeline stops stage progression for
/// that turn and returns early — the finding is the turn's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiPatternFinding {
    pub pattern: AntiPattern,

    /// How severe the detector judges this occurrence, in [0, 1].
    pub severity: f64,

    /// Ordered evidence lines supporting the finding.
    pub evidence: Vec<String>,

    /// Recommended pivot for the next turn.
    pub suggested_pivot: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_round_trips() {
        let finding = AntiPatternFinding {
            pattern: AntiPattern::InfiniteClarification,
            severity: 0.9,
            evidence: vec!["input 'what?' (5 chars)".into()],
            suggested_pivot: "Switch to guided mode and offer concrete options".into(),
        };
        let json = serde_json::to_string(&finding).unwrap();
        let back: AntiPatternFinding = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pattern, AntiPattern::InfiniteClarification);
        assert!((back.severity - 0.9).abs() < f64::EPSILON);
        assert_eq!(back.evidence.len(), 1);
    }
}

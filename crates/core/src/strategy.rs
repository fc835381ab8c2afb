//! Execution strategies — how the assistant acts on a classified intent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The execution strategies the pipeline can choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Act without asking
    Autonomous,
    /// Propose the action and wait for approval
    ConfirmFirst,
    /// Walk the user through the task step by step
    Guided,
    /// Hand the task to a specialist agent
    Delegated,
    /// Observe and collect signal without acting
    Learning,
}

impl StrategyKind {
    /// The stable enumeration order. The preference model iterates this
    /// slice when scoring, so score ties always resolve to the earliest
    /// entry here.
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Autonomous,
        StrategyKind::ConfirmFirst,
        StrategyKind::Guided,
        StrategyKind::Delegated,
        StrategyKind::Learning,
    ];
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StrategyKind::Autonomous => "autonomous",
            StrategyKind::ConfirmFirst => "confirm_first",
            StrategyKind::Guided => "guided",
            StrategyKind::Delegated => "delegated",
            StrategyKind::Learning => "learning",
        };
        f.write_str(s)
    }
}

/// A strategy chosen for one turn, with the selector's confidence and
/// reasoning. Consumed by the execution stage and used as the learning
/// label when feedback arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedStrategy {
    pub kind: StrategyKind,

    /// The selector's confidence in this choice, in [0, 1].
    pub confidence: f64,

    /// Free-text explanation of why this strategy was picked.
    pub reasoning: String,

    /// Strategy parameters (name → value).
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl SelectedStrategy {
    pub fn new(kind: StrategyKind, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            kind,
            confidence,
            reasoning: reasoning.into(),
            parameters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_order_is_stable() {
        assert_eq!(StrategyKind::ALL[0], StrategyKind::Autonomous);
        assert_eq!(StrategyKind::ALL[4], StrategyKind::Learning);
        assert_eq!(StrategyKind::ALL.len(), 5);
    }

    #[test]
    fn strategy_kind_serializes_snake_case() {
        let json = serde_json::to_string(&StrategyKind::ConfirmFirst).unwrap();
        assert_eq!(json, "\"confirm_first\"");
    }
}

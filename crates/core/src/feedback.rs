//! Turn feedback — explicit ratings and implicit completion signals.

use serde::{Deserialize, Serialize};

/// Feedback for one processed turn.
///
/// At least one of `rating` or `implicit` should be present for the
/// feedback to carry any reward signal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnFeedback {
    /// Explicit user rating, 0–5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    /// Implicit signals observed around the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<ImplicitSignals>,
}

impl TurnFeedback {
    /// Feedback carrying only an explicit rating.
    pub fn rating(rating: u8) -> Self {
        Self {
            rating: Some(rating),
            implicit: None,
        }
    }

    /// True when neither a rating nor implicit signals are present.
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.implicit.is_none()
    }
}

/// Implicit signals collected without asking the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImplicitSignals {
    /// Did the user's task actually complete?
    pub task_completed: bool,

    /// Seconds from turn start to task completion.
    #[serde(default)]
    pub seconds_to_completion: f64,

    /// How many manual edits the user made to the assistant's output.
    #[serde(default)]
    pub edits_made: u32,
}

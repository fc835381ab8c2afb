//! The contextual-bandit preference model.
//!
//! One linear weight vector per strategy. Selection scores each strategy as
//! `dot(weights, features) + exploration · ucb_bonus` and takes the argmax;
//! feedback performs one gradient-descent step on the chosen strategy's
//! weights only. All state lives behind a single lock because the model is
//! shared across sessions.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use helmsman_config::PolicyConfig;
use helmsman_core::error::PolicyError;
use helmsman_core::feedback::TurnFeedback;
use helmsman_core::strategy::StrategyKind;

use crate::features::{ContextFeatures, FEATURE_DIM};

/// Snapshot format version. Bumped on incompatible layout changes.
const SNAPSHOT_VERSION: u32 = 1;

/// One recorded (context, strategy, reward) observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEntry {
    pub features: [f64; FEATURE_DIM],
    pub strategy: StrategyKind,
    pub reward: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregated per-strategy feedback statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StrategyStats {
    pub count: usize,
    pub avg_reward: f64,
}

/// Mutable model state, guarded by the `PreferenceModel` lock.
struct ModelState {
    /// Per-strategy linear weights.
    weights: HashMap<StrategyKind, [f64; FEATURE_DIM]>,
    /// Current exploration rate (the UCB bonus multiplier). Decays on every
    /// selection, floored by config.
    exploration: f64,
    /// Total selections made, across all strategies.
    total_iterations: u64,
    /// How many times each strategy has been selected.
    usage: HashMap<StrategyKind, u64>,
    /// All recorded rewards. Unbounded in memory; export caps to the most
    /// recent `history_export_cap` entries.
    rewards: Vec<RewardEntry>,
}

/// The wire format for `export_model` / `import_model`.
///
/// Weights are plain vectors here (not fixed arrays) so a snapshot produced
/// by a different build can be rejected with a dimension error instead of
/// failing opaquely inside serde.
#[derive(Debug, Serialize, Deserialize)]
struct ModelSnapshot {
    version: u32,
    weights: HashMap<StrategyKind, Vec<f64>>,
    exploration: f64,
    total_iterations: u64,
    usage: HashMap<StrategyKind, u64>,
    rewards: Vec<RewardEntry>,
}

/// The strategy-preference model. Shared across sessions; all access is
/// serialized through the internal lock.
pub struct PreferenceModel {
    config: PolicyConfig,
    state: Mutex<ModelState>,
}

impl PreferenceModel {
    /// Create a model with small seeded-random initial weights.
    ///
    /// The seed comes from config (`weight_seed`), so a given configuration
    /// always produces the same starting point.
    pub fn new(config: PolicyConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.weight_seed);
        let mut weights = HashMap::new();
        let mut usage = HashMap::new();
        for kind in StrategyKind::ALL {
            let mut w = [0.0; FEATURE_DIM];
            for slot in &mut w {
                *slot = rng.gen_range(-0.05..0.05);
            }
            weights.insert(kind, w);
            usage.insert(kind, 0);
        }

        Self {
            state: Mutex::new(ModelState {
                weights,
                exploration: config.initial_exploration,
                total_iterations: 0,
                usage,
                rewards: Vec::new(),
            }),
            config,
        }
    }

    /// Select the strategy with the highest upper-confidence-bound score for
    /// the given context.
    ///
    /// Ties resolve to the earliest entry in `StrategyKind::ALL`. Every call
    /// decays the exploration rate and bumps the iteration counter — there
    /// is no read-only scoring path, by contract.
    pub fn select_strategy(&self, features: &ContextFeatures) -> StrategyKind {
        let vector = features.to_vector();
        let mut state = self.state.lock().expect("preference model lock poisoned");

        let total = state.total_iterations;
        let exploration = state.exploration;

        let mut best = StrategyKind::ALL[0];
        let mut best_score = f64::NEG_INFINITY;
        for kind in StrategyKind::ALL {
            let weights = state.weights[&kind];
            let exploitation = dot(&weights, &vector);
            let tried = state.usage[&kind];
            let uncertainty =
                (2.0 * ((total + 1) as f64).ln() / ((tried + 1) as f64)).sqrt();
            let score = exploitation + exploration * uncertainty;
            if score > best_score {
                best_score = score;
                best = kind;
            }
        }

        state.exploration =
            (state.exploration * self.config.exploration_decay).max(self.config.exploration_floor);
        state.total_iterations += 1;
        *state.usage.entry(best).or_insert(0) += 1;

        debug!(
            strategy = %best,
            score = best_score,
            exploration = state.exploration,
            iteration = state.total_iterations,
            "Selected strategy"
        );

        best
    }

    /// Record feedback for a (context, strategy) pair and take one gradient
    /// step on that strategy's weights. Other strategies are untouched.
    pub fn update_from_feedback(
        &self,
        features: &ContextFeatures,
        strategy: StrategyKind,
        feedback: &TurnFeedback,
    ) {
        let reward = shape_reward(feedback);
        let vector = features.to_vector();
        let mut state = self.state.lock().expect("preference model lock poisoned");

        state.rewards.push(RewardEntry {
            features: vector,
            strategy,
            reward,
            recorded_at: Utc::now(),
        });

        let learning_rate = 0.1 / (1.0 + state.total_iterations as f64 * 0.001);
        let weights = state
            .weights
            .get_mut(&strategy)
            .expect("all strategies initialized at construction");
        let error = reward - dot(weights, &vector);
        for (w, x) in weights.iter_mut().zip(vector.iter()) {
            *w += learning_rate * error * x;
        }

        debug!(
            strategy = %strategy,
            reward,
            error,
            learning_rate,
            history = state.rewards.len(),
            "Applied feedback update"
        );
    }

    /// Per-strategy count and average reward over all recorded feedback.
    /// Strategies with no feedback report a count of 0 and average 0.0.
    pub fn strategy_stats(&self) -> HashMap<StrategyKind, StrategyStats> {
        let state = self.state.lock().expect("preference model lock poisoned");
        let mut stats: HashMap<StrategyKind, StrategyStats> = StrategyKind::ALL
            .iter()
            .map(|k| (*k, StrategyStats::default()))
            .collect();

        for entry in &state.rewards {
            let s = stats.entry(entry.strategy).or_default();
            s.count += 1;
            s.avg_reward += entry.reward;
        }
        for s in stats.values_mut() {
            if s.count > 0 {
                s.avg_reward /= s.count as f64;
            }
        }
        stats
    }

    /// Serialize the model to an opaque JSON blob. Reward history is capped
    /// to the most recent `history_export_cap` entries.
    pub fn export_model(&self) -> helmsman_core::Result<String> {
        let state = self.state.lock().expect("preference model lock poisoned");
        let cap = self.config.history_export_cap;
        let start = state.rewards.len().saturating_sub(cap);

        let snapshot = ModelSnapshot {
            version: SNAPSHOT_VERSION,
            weights: state
                .weights
                .iter()
                .map(|(k, w)| (*k, w.to_vec()))
                .collect(),
            exploration: state.exploration,
            total_iterations: state.total_iterations,
            usage: state.usage.clone(),
            rewards: state.rewards[start..].to_vec(),
        };
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Restore model state from a blob produced by `export_model`.
    ///
    /// Fail-soft: the blob is parsed and validated in full before anything
    /// is committed, so a malformed payload never leaves the model
    /// half-imported.
    pub fn import_model(&self, blob: &str) -> Result<(), PolicyError> {
        let snapshot: ModelSnapshot = serde_json::from_str(blob)
            .map_err(|e| PolicyError::Import(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PolicyError::Import(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut parsed_weights: HashMap<StrategyKind, [f64; FEATURE_DIM]> = HashMap::new();
        for (kind, w) in &snapshot.weights {
            if w.len() != FEATURE_DIM {
                return Err(PolicyError::DimensionMismatch {
                    expected: FEATURE_DIM,
                    actual: w.len(),
                });
            }
            let mut arr = [0.0; FEATURE_DIM];
            arr.copy_from_slice(w);
            parsed_weights.insert(*kind, arr);
        }
        if snapshot.exploration <= 0.0 {
            return Err(PolicyError::Import(format!(
                "exploration rate must be positive, got {}",
                snapshot.exploration
            )));
        }

        // Everything validated — commit.
        let mut state = self.state.lock().expect("preference model lock poisoned");
        for (kind, w) in parsed_weights {
            state.weights.insert(kind, w);
        }
        state.exploration = snapshot.exploration;
        state.total_iterations = snapshot.total_iterations;
        for kind in StrategyKind::ALL {
            let count = snapshot.usage.get(&kind).copied().unwrap_or(0);
            state.usage.insert(kind, count);
        }
        state.rewards = snapshot.rewards;
        debug!(
            iterations = state.total_iterations,
            history = state.rewards.len(),
            "Imported model snapshot"
        );
        Ok(())
    }

    /// Total selections made since construction (or import).
    pub fn iterations(&self) -> u64 {
        self.state
            .lock()
            .expect("preference model lock poisoned")
            .total_iterations
    }

    /// Current exploration rate.
    pub fn exploration_rate(&self) -> f64 {
        self.state
            .lock()
            .expect("preference model lock poisoned")
            .exploration
    }

    /// Number of recorded reward entries (in memory, uncapped).
    pub fn reward_history_len(&self) -> usize {
        self.state
            .lock()
            .expect("preference model lock poisoned")
            .rewards
            .len()
    }

    /// Copy of a strategy's current weight vector.
    pub fn weights_for(&self, strategy: StrategyKind) -> [f64; FEATURE_DIM] {
        self.state.lock().expect("preference model lock poisoned").weights[&strategy]
    }
}

/// Convert feedback into a scalar reward in [0, 1].
///
/// Explicit rating contributes up to 0.6, task completion a flat 0.4, time
/// efficiency up to 0.2 (against a 300-second baseline), and low edit count
/// up to 0.2 (against a 10-edit baseline). The raw sum can exceed 1; the
/// result is clamped.
pub fn shape_reward(feedback: &TurnFeedback) -> f64 {
    if feedback.is_empty() {
        warn!("Feedback carried neither rating nor implicit signals");
    }

    let mut reward = 0.0;
    if let Some(rating) = feedback.rating {
        reward += (f64::from(rating.min(5)) / 5.0) * 0.6;
    }
    if let Some(implicit) = &feedback.implicit {
        if implicit.task_completed {
            reward += 0.4;
        }
        reward += (1.0 - implicit.seconds_to_completion / 300.0).max(0.0) * 0.2;
        reward += (1.0 - f64::from(implicit.edits_made) / 10.0).max(0.0) * 0.2;
    }
    reward.clamp(0.0, 1.0)
}

fn dot(a: &[f64; FEATURE_DIM], b: &[f64; FEATURE_DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

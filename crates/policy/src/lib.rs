//! # Helmsman Policy
//!
//! The strategy-preference model: a contextual bandit that learns, per
//! execution strategy, a linear reward predictor over context features and
//! selects the strategy maximizing an upper-confidence bound.
//!
//! The model is shared across sessions (strategy weights are global, not
//! per-session) and serializes all access through an internal lock.

pub mod bandit;
pub mod features;

pub use bandit::{PreferenceModel, RewardEntry, StrategyStats};
pub use features::{ContextFeatures, FEATURE_DIM};

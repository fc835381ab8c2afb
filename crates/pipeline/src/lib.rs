//! # Helmsman Pipeline
//!
//! The per-turn orchestration core. A turn runs through a fixed stage
//! sequence — classification → confidence gate → anti-pattern scan →
//! strategy selection → execution — with one event appended to session
//! history per stage and observers dispatched sequentially after each
//! append. Feedback submission re-enters the same dispatch mechanism.
//!
//! Default stage handlers are provided (`HeuristicClassifier`,
//! `RuleBasedSelector`, `SimulatedExecutor`); production deployments swap
//! them for real collaborators via the orchestrator's builder methods.

pub mod detector;
pub mod learning;
pub mod orchestrator;
pub mod stages;

pub use detector::detect;
pub use learning::{LearningBridge, PolicySelector};
pub use orchestrator::{Orchestrator, StageObserver};
pub use stages::{HeuristicClassifier, RuleBasedSelector, SimulatedExecutor, StrategySelector};

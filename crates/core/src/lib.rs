//! # Helmsman Core
//!
//! Domain types, traits, and error definitions for the Helmsman
//! turn-orchestration runtime. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The external collaborators (the intent classifier and the task executor)
//! are defined as traits here. Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod executor;
pub mod feedback;
pub mod finding;
pub mod intent;
pub mod session;
pub mod strategy;

// Re-export key types at crate root for ergonomics
pub use error::{ClassifierError, Error, ExecutorError, PolicyError, Result};
pub use event::{EventMeta, EventPayload, PipelineEvent, PipelineStage};
pub use executor::{ExecutionMetrics, ExecutionResult, Executor};
pub use feedback::{ImplicitSignals, TurnFeedback};
pub use finding::{AntiPattern, AntiPatternFinding};
pub use intent::{Classifier, ClassifiedIntent, ConfidenceScore, IntentKind};
pub use session::SessionContext;
pub use strategy::{SelectedStrategy, StrategyKind};

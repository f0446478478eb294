// src/engine/mod.rs

//! Exercise engine.
//!
//! This module ties together:
//! - the shared exercise context (registry, current selection, runner)
//! - the batch evaluator used at startup and by "check all"
//! - the foreground session actions (advance, reset, jump, hint)
//!
//! Background work (the change watcher, batch workers) never touches the
//! terminal; it posts [`EngineEvent`]s that the foreground loop drains.

pub mod batch;
pub mod context;
pub mod session;

pub use batch::{BatchEvaluator, BatchProgress};
pub use context::ExerciseContext;
pub use session::{ActionOutcome, Session};

/// Messages from background workers to the foreground loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// `name` was re-evaluated after a file change; the view is stale.
    RefreshRequested { name: String },
    /// The last pending exercise became done.
    Finished,
}

// src/exercise/mod.rs

//! Exercise model: records, discovery, the registry and its progress counter.

pub mod discovery;
pub mod progress;
pub mod record;
pub mod registry;

pub use discovery::{discover_exercise_files, exercise_matcher};
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use record::{ExerciseRecord, exercise_id};
pub use registry::{Registry, RegistrySnapshot, RunTicket, Transition};

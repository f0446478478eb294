// src/watch/event_handler.rs

//! Per-event decisions: is this event about the selected exercise, and did
//! its contents actually change?

use std::path::Path;

use notify::EventKind;
use notify::event::{AccessKind, AccessMode};
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::hash::{DigestCache, compute_file_hash};
use crate::watch::path_utils::same_file;

/// What to do with one filesystem event path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeDecision {
    /// A different file in the watched directory.
    Ignored,
    /// The file could not be read; treated as no change.
    Unreadable,
    /// Same digest as last seen (touch, save without edits, duplicate event).
    Unchanged,
    /// Genuine content change.
    Changed,
}

/// Only creations and writes can change an exercise.
pub fn is_relevant_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(_)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

/// Classify a single event path against the selected exercise `target`.
pub fn classify_change(
    fs: &dyn FileSystem,
    digests: &mut DigestCache,
    event_path: &Path,
    target: &Path,
) -> ChangeDecision {
    if !same_file(event_path, target) {
        return ChangeDecision::Ignored;
    }

    let digest = match compute_file_hash(fs, target) {
        Ok(d) => d,
        Err(err) => {
            warn!(
                exercise = ?target,
                error = %err,
                "could not digest changed exercise; ignoring event"
            );
            return ChangeDecision::Unreadable;
        }
    };

    if digests.observe(target, digest) {
        ChangeDecision::Changed
    } else {
        debug!(exercise = ?target, "content unchanged; ignoring event");
        ChangeDecision::Unchanged
    }
}

// src/watch/debounce.rs

use std::time::Duration;

use tokio::time::Instant;

/// Single pending deadline with "last change wins" semantics.
///
/// Arming while a deadline is pending replaces it, so a burst of changes
/// shorter than `window` produces exactly one firing.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Schedule a firing `window` after `now`. Returns `true` if this
    /// replaced a pending deadline.
    pub fn arm(&mut self, now: Instant) -> bool {
        self.deadline.replace(now + self.window).is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop a pending deadline. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

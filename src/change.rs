//! Change notification for hot-swappable key and algorithm sets.
//!
//! Modeled as a generation counter: a [`ChangeSource`] owns the
//! counter, and each [`ChangeToken`] remembers the generation it was
//! vended at. A consumer that reads data and then a token cannot miss a
//! change that happened before the read, and cannot observe an unfired
//! token after the data changed: the counter is bumped before any new
//! snapshot becomes observable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Producer side of a change notification.
#[derive(Debug, Default)]
pub struct ChangeSource {
    generation: Arc<AtomicU64>,
}

impl ChangeSource {
    /// Create a new source at generation zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that the underlying data changed.
    ///
    /// Every token vended before this call reports
    /// [`ChangeToken::has_changed`] afterwards.
    pub fn notify(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Vend a fresh, unfired token for the current generation.
    pub fn token(&self) -> ChangeToken {
        ChangeToken {
            generation: Arc::clone(&self.generation),
            seen: self.generation.load(Ordering::Acquire),
        }
    }
}

/// Consumer side of a change notification.
///
/// A token fires exactly once per generation: once the source moves
/// past the generation the token was vended at, [`has_changed`] stays
/// true until a fresh token is obtained.
///
/// [`has_changed`]: ChangeToken::has_changed
#[derive(Debug, Clone)]
pub struct ChangeToken {
    generation: Arc<AtomicU64>,
    seen: u64,
}

impl ChangeToken {
    /// Whether the source has changed since this token was vended.
    pub fn has_changed(&self) -> bool {
        self.generation.load(Ordering::Acquire) != self.seen
    }
}

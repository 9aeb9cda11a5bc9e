//! Walk state definitions for tracking listing progress
//!
//! A listing walk moves through `Discovering -> Walking(1) -> ... ->
//! Walking(n) -> Finalizing -> Done`, and may fail out of any active state.

use crate::ScrapeError;
use std::fmt;

/// Represents the current state of one listing walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkState {
    // ===== Active States =====
    /// Fetching the first page and reading the pagination control
    Discovering,

    /// Fetching and extracting the page with this ordinal (1-based)
    Walking(u32),

    /// Merging collected fragments and writing the artifact
    Finalizing,

    // ===== Terminal States =====
    /// Artifact is complete and valid JSON
    Done,

    /// Transport or parse failure; nothing was written
    Failed,
}

impl WalkState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the walk is still in progress
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Checks whether moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: WalkState) -> bool {
        match (*self, next) {
            (Self::Discovering, Self::Walking(1)) => true,
            (Self::Discovering, Self::Finalizing) => true,
            (Self::Walking(k), Self::Walking(n)) => n == k + 1,
            (Self::Walking(_), Self::Finalizing) => true,
            (Self::Finalizing, Self::Done) => true,
            (from, Self::Failed) => from.is_active(),
            _ => false,
        }
    }

    /// Performs a transition, rejecting illegal steps
    pub fn transition(self, next: WalkState) -> Result<WalkState, ScrapeError> {
        if self.can_transition_to(next) {
            tracing::trace!("Walk state {} -> {}", self, next);
            Ok(next)
        } else {
            Err(ScrapeError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for WalkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovering => write!(f, "discovering"),
            Self::Walking(page) => write!(f, "walking({})", page),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

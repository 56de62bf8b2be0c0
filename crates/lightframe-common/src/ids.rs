//! Typed ID wrappers for type safety across lightframe.
//!
//! Page views get random UUIDs so log lines from two consecutive views of the
//! same page can be told apart. Listener and timer handles are plain counters
//! handed out by the document that owns them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one page view (one document lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageViewId(Uuid);

impl PageViewId {
    /// Generate a new random page-view ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PageViewId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<PageViewId> for Uuid {
    fn from(id: PageViewId) -> Self {
        id.0
    }
}

impl std::fmt::Display for PageViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for one installed event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for ListenerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Handle for one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for TimerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

//! Core type definitions shared by page modules and the lifecycle coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one page module.
///
/// Transitions happen only through `init()` (`Uninitialized | TornDown` →
/// `Active`) and `cleanup()` (any → `TornDown`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Created but never initialized.
    #[default]
    Uninitialized,
    /// Bindings installed.
    Active,
    /// Cleaned up; may be initialized again.
    TornDown,
}

impl ModuleState {
    /// Whether `init()` is allowed from this state.
    pub fn can_init(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Whether the module currently owns live bindings.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Active => write!(f, "active"),
            Self::TornDown => write!(f, "torn_down"),
        }
    }
}

/// A page-level signal after which the current view's bindings must go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationSignal {
    /// The document is about to be unloaded.
    BeforeUnload,
    /// The page is being hidden (bfcache, tab close on mobile).
    PageHide,
    /// History navigation.
    PopState,
    /// Fragment navigation.
    HashChange,
    /// The tab became hidden.
    VisibilityHidden,
}

impl TerminationSignal {
    /// All signals, in the order the coordinator installs them.
    pub const ALL: [TerminationSignal; 5] = [
        Self::BeforeUnload,
        Self::PageHide,
        Self::PopState,
        Self::HashChange,
        Self::VisibilityHidden,
    ];

    /// Whether this signal is on the full unload path, where pending timers
    /// are cancelled too.
    pub fn is_unload(self) -> bool {
        matches!(self, Self::BeforeUnload | Self::PopState | Self::HashChange)
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeUnload => write!(f, "beforeunload"),
            Self::PageHide => write!(f, "pagehide"),
            Self::PopState => write!(f, "popstate"),
            Self::HashChange => write!(f, "hashchange"),
            Self::VisibilityHidden => write!(f, "visibilitychange"),
        }
    }
}

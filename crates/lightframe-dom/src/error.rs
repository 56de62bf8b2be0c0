//! Errors raised by the document host.

use indextree::NodeId;

/// Error type for document operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomError {
    /// The node was removed from the document arena.
    #[error("node {0:?} no longer exists")]
    StaleNode(NodeId),

    /// The node is a text or document node where an element was required.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// A media operation was attempted on a non-media element.
    #[error("node {0:?} is not a media element")]
    NotMedia(NodeId),

    /// A value was outside its allowed range (e.g. volume > 1).
    #[error("value {value} out of range for {what}")]
    OutOfRange {
        /// What was being set.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The element does not expose the requested capability.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// The media element is in an error state and cannot play.
    #[error("media playback failed: {0}")]
    Playback(String),

    /// The tree operation would create a cycle.
    #[error("cannot insert {child:?} under {parent:?}")]
    Hierarchy {
        /// Intended parent.
        parent: NodeId,
        /// Node that could not be inserted.
        child: NodeId,
    },

    /// A selector could not be parsed.
    #[error("invalid selector {selector:?}: {reason}")]
    Selector {
        /// The selector text.
        selector: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

impl DomError {
    /// Convenience constructor for [`DomError::Selector`].
    pub fn selector(selector: &str, reason: &'static str) -> Self {
        Self::Selector {
            selector: selector.to_string(),
            reason,
        }
    }

    /// Whether the error only means the node is gone.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleNode(_))
    }
}

/// Result alias for document operations.
pub type DomResult<T> = std::result::Result<T, DomError>;

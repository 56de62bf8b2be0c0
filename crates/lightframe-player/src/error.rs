//! Error types for lightframe-player.

use lightframe_dom::DomError;

/// Result type alias using [`PlayerError`].
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Errors raised while binding behavior to page elements.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// A control the binder needs is not in the markup.
    #[error("missing control: {selector}")]
    MissingControl { selector: &'static str },

    /// A document operation failed.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// A third-party widget is not loaded on the page.
    #[error("{0} widget is not available")]
    WidgetUnavailable(String),

    /// `init()` was called on a module that is already running.
    #[error("{module} is already active")]
    AlreadyActive { module: String },
}

impl PlayerError {
    /// Create a missing control error.
    pub fn missing(selector: &'static str) -> Self {
        Self::MissingControl { selector }
    }

    /// Create an already active error.
    pub fn already_active(module: impl Into<String>) -> Self {
        Self::AlreadyActive {
            module: module.into(),
        }
    }
}

//! Media resource lifecycle for lightframe page views.
//!
//! - [`ListenerRegistry`] records every event subscription a page module
//!   installs and removes exactly those on cleanup.
//! - [`PlaybackBinder`] wires a video element to its custom control surface,
//!   deriving every piece of UI state from the element's live state.
//! - [`OverlayReconciler`] keeps one caption overlay per lightbox slide.
//! - [`LifecycleCoordinator`] runs module cleanup on page termination
//!   signals.
//!
//! # Example
//!
//! ```
//! use lightframe_dom::{Document, EventTarget, EventType};
//! use lightframe_player::ListenerRegistry;
//!
//! let mut doc = Document::new();
//! let mut registry = ListenerRegistry::new();
//! registry
//!     .on(&mut doc, EventTarget::Window, EventType::Resize, |_, _| Ok(()))
//!     .unwrap();
//!
//! let report = registry.cleanup(&mut doc);
//! assert_eq!(report.removed, 1);
//! assert!(registry.cleanup(&mut doc).is_empty());
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod lightbox;
pub mod overlay;
pub mod playback;
pub mod registry;

#[cfg(test)]
mod fixtures;

pub use config::{LifecycleConfig, PlayerConfig};
pub use error::{PlayerError, Result};
pub use lifecycle::{LifecycleCoordinator, ModuleHandle, PageModule, Teardown};
pub use lightbox::{GLightbox, LightboxAdapter};
pub use overlay::{reconcile_slide, OverlayOutcome, OverlayReconciler, SlideOutcome};
pub use playback::{PlaybackBinder, PlayerControls, VolumeIcon};
pub use registry::{CleanupReport, ListenerRegistry, Subscription, TimerSlot};

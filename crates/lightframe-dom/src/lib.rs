//! Headless document host for lightframe.
//!
//! A single-threaded stand-in for the browser surface the page modules run
//! against:
//!
//! - an arena DOM ([`Document`]) with a CSS selector subset (tokenized by
//!   cssparser) and html5ever-backed markup fragment parsing,
//! - event targets, listener tables and run-to-completion dispatch,
//! - media elements whose state only changes through native-style
//!   operations that raise the matching events,
//! - a virtual-clock timer queue,
//! - a headless [`Lightbox`] carousel widget.
//!
//! # Example
//!
//! ```
//! use lightframe_dom::{Document, Event, EventType, Listener, ListenerOptions};
//!
//! let mut doc = Document::new();
//! let video = doc.create_element("video");
//! doc.append_child(doc.body(), video).unwrap();
//!
//! let on_play = Listener::new(|_, _| Ok(()));
//! doc.add_event_listener(video, EventType::Play, on_play, ListenerOptions::default())
//!     .unwrap();
//! doc.play(video).unwrap();
//! assert!(doc.media(video).unwrap().is_playing());
//! ```

pub mod document;
pub mod error;
pub mod event;
pub mod lightbox;
pub mod markup;
pub mod media;
pub mod node;
pub mod selector;
pub mod timer;

pub use document::{Document, Visibility};
pub use error::{DomError, DomResult};
pub use event::{Dispatch, Event, EventTarget, EventType, KeyCode, Listener, ListenerOptions};
pub use lightbox::{Lightbox, LightboxEvent, LightboxOptions, SlideEvent, SlideHandler};
pub use media::{FullscreenApi, MediaState, NetworkState};
pub use node::{Element, NodeKind, Rect};
pub use selector::Selector;

pub use indextree::NodeId;

//! Events, listeners and run-to-completion dispatch.
//!
//! Listeners are stored per [`EventTarget`] in installation order. Dispatch
//! walks capture, target and bubble phases like the DOM, snapshots the
//! listener list of each target before invoking it and re-checks that each
//! snapshotted listener is still installed right before calling it, so a
//! handler removing a later listener prevents that call.
//!
//! Events raised while a dispatch is running (by handlers, media operations
//! or timers fired from handlers) are queued and delivered after the current
//! event finishes.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indextree::NodeId;
use lightframe_common::ListenerId;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{DomError, DomResult};

/// Something listeners can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// The global window.
    Window,
    /// The document object.
    Document,
    /// A node in the tree.
    Node(NodeId),
}

impl From<NodeId> for EventTarget {
    fn from(node: NodeId) -> Self {
        EventTarget::Node(node)
    }
}

impl fmt::Display for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTarget::Window => write!(f, "window"),
            EventTarget::Document => write!(f, "document"),
            EventTarget::Node(node) => write!(f, "node {node:?}"),
        }
    }
}

/// Event types the host knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    MouseDown,
    MouseMove,
    MouseUp,
    MouseLeave,
    Input,
    KeyDown,
    ContextMenu,
    Focus,
    Blur,
    Play,
    Pause,
    Ended,
    TimeUpdate,
    LoadedMetadata,
    LoadStart,
    CanPlay,
    Error,
    VolumeChange,
    Load,
    DomContentLoaded,
    BeforeUnload,
    PageHide,
    PopState,
    HashChange,
    VisibilityChange,
    Resize,
    Scroll,
}

impl EventType {
    /// The DOM event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::MouseDown => "mousedown",
            EventType::MouseMove => "mousemove",
            EventType::MouseUp => "mouseup",
            EventType::MouseLeave => "mouseleave",
            EventType::Input => "input",
            EventType::KeyDown => "keydown",
            EventType::ContextMenu => "contextmenu",
            EventType::Focus => "focus",
            EventType::Blur => "blur",
            EventType::Play => "play",
            EventType::Pause => "pause",
            EventType::Ended => "ended",
            EventType::TimeUpdate => "timeupdate",
            EventType::LoadedMetadata => "loadedmetadata",
            EventType::LoadStart => "loadstart",
            EventType::CanPlay => "canplay",
            EventType::Error => "error",
            EventType::VolumeChange => "volumechange",
            EventType::Load => "load",
            EventType::DomContentLoaded => "DOMContentLoaded",
            EventType::BeforeUnload => "beforeunload",
            EventType::PageHide => "pagehide",
            EventType::PopState => "popstate",
            EventType::HashChange => "hashchange",
            EventType::VisibilityChange => "visibilitychange",
            EventType::Resize => "resize",
            EventType::Scroll => "scroll",
        }
    }

    /// Whether events of this type propagate to ancestors.
    ///
    /// Media, load and focus events do not bubble; `mouseleave` does not
    /// either.
    pub fn bubbles(&self) -> bool {
        matches!(
            self,
            EventType::Click
                | EventType::MouseDown
                | EventType::MouseMove
                | EventType::MouseUp
                | EventType::Input
                | EventType::KeyDown
                | EventType::ContextMenu
                | EventType::DomContentLoaded
                | EventType::VisibilityChange
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyboard keys, by physical code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Enter,
    Escape,
    /// A letter key, upper case (`KeyM` is `Letter('M')`).
    Letter(char),
}

impl KeyCode {
    /// Build a letter key, normalizing case.
    pub fn letter(c: char) -> Self {
        KeyCode::Letter(c.to_ascii_uppercase())
    }
}

/// One event instance.
#[derive(Debug)]
pub struct Event {
    pub kind: EventType,
    pub target: EventTarget,
    pub client_x: f64,
    pub client_y: f64,
    pub key: Option<KeyCode>,
    default_prevented: Cell<bool>,
    passive: Cell<bool>,
}

impl Event {
    pub fn new(kind: EventType, target: impl Into<EventTarget>) -> Self {
        Self {
            kind,
            target: target.into(),
            client_x: 0.0,
            client_y: 0.0,
            key: None,
            default_prevented: Cell::new(false),
            passive: Cell::new(false),
        }
    }

    /// A pointer event of `kind` at the given client coordinates.
    pub fn pointer(kind: EventType, target: impl Into<EventTarget>, client_x: f64, client_y: f64) -> Self {
        Self {
            client_x,
            client_y,
            ..Self::new(kind, target)
        }
    }

    /// A click at the given client coordinates.
    pub fn click_at(target: impl Into<EventTarget>, client_x: f64, client_y: f64) -> Self {
        Self::pointer(EventType::Click, target, client_x, client_y)
    }

    /// A keydown for `key`.
    pub fn key_down(target: impl Into<EventTarget>, key: KeyCode) -> Self {
        Self {
            key: Some(key),
            ..Self::new(EventType::KeyDown, target)
        }
    }

    /// Suppress the default action. Ignored inside passive listeners.
    pub fn prevent_default(&self) {
        if !self.passive.get() {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Handler signature.
pub type HandlerFn = dyn Fn(&mut Document, &Event) -> DomResult<()>;

/// A reference-counted event handler.
///
/// Two listeners are the same handler when they share the allocation, which
/// is what removal matches on.
#[derive(Clone)]
pub struct Listener(Rc<HandlerFn>);

impl Listener {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut Document, &Event) -> DomResult<()> + 'static,
    {
        Self(Rc::new(handler))
    }

    /// Pointer identity.
    pub fn same(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn call(&self, doc: &mut Document, event: &Event) -> DomResult<()> {
        (self.0)(doc, event)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

/// `addEventListener` options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self {
            capture: true,
            ..Self::default()
        }
    }

    pub fn once() -> Self {
        Self {
            once: true,
            ..Self::default()
        }
    }

    pub fn passive() -> Self {
        Self {
            passive: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Installed {
    pub(crate) id: ListenerId,
    pub(crate) kind: EventType,
    pub(crate) listener: Listener,
    pub(crate) options: ListenerOptions,
}

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Delivered now.
    Delivered {
        /// Handlers invoked.
        handlers: usize,
        /// Whether any handler called `prevent_default`.
        default_prevented: bool,
    },
    /// Another dispatch is running; delivered once it finishes.
    Queued,
    /// The target no longer exists.
    Dropped,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Capture,
    Target,
    Bubble,
}

impl Document {
    fn check_target(&self, target: EventTarget) -> DomResult<()> {
        match target {
            EventTarget::Node(node) if !self.is_alive(node) => Err(DomError::StaleNode(node)),
            _ => Ok(()),
        }
    }

    /// Install a listener. Installing the same `(type, handler, capture)`
    /// twice is a no-op returning the original id.
    pub fn add_event_listener(
        &mut self,
        target: impl Into<EventTarget>,
        kind: EventType,
        listener: Listener,
        options: ListenerOptions,
    ) -> DomResult<ListenerId> {
        let target = target.into();
        self.check_target(target)?;

        let entries = self.listeners.entry(target).or_default();
        if let Some(existing) = entries.iter().find(|i| {
            i.kind == kind && i.listener.same(&listener) && i.options.capture == options.capture
        }) {
            return Ok(existing.id);
        }

        self.next_listener += 1;
        let id = ListenerId::from(self.next_listener);
        entries.push(Installed {
            id,
            kind,
            listener,
            options,
        });
        Ok(id)
    }

    /// Remove a listener matching `(type, handler, capture)`.
    ///
    /// Returns whether a listener was removed. Fails only when the target
    /// node no longer exists.
    pub fn remove_event_listener(
        &mut self,
        target: impl Into<EventTarget>,
        kind: EventType,
        listener: &Listener,
        capture: bool,
    ) -> DomResult<bool> {
        let target = target.into();
        self.check_target(target)?;

        let Some(entries) = self.listeners.get_mut(&target) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|i| {
            !(i.kind == kind && i.listener.same(listener) && i.options.capture == capture)
        });
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.listeners.remove(&target);
        }
        Ok(removed)
    }

    /// Listeners installed on `target`.
    pub fn listener_count(&self, target: impl Into<EventTarget>) -> usize {
        self.listeners
            .get(&target.into())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Listeners of one type installed on `target`.
    pub fn listener_count_for(&self, target: impl Into<EventTarget>, kind: EventType) -> usize {
        self.listeners
            .get(&target.into())
            .map(|entries| entries.iter().filter(|i| i.kind == kind).count())
            .unwrap_or(0)
    }

    /// Listeners installed anywhere in the document.
    pub fn total_listeners(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub(crate) fn drop_listeners_for(&mut self, node: NodeId) {
        self.listeners.remove(&EventTarget::Node(node));
    }

    /// Dispatch an event, or queue it if a dispatch is already running.
    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        if self.dispatching {
            self.queue.push_back(event);
            return Dispatch::Queued;
        }

        self.dispatching = true;
        let outcome = self.deliver(&event);
        while let Some(next) = self.queue.pop_front() {
            self.deliver(&next);
        }
        self.dispatching = false;
        outcome
    }

    fn propagation_path(&self, target: EventTarget) -> Vec<EventTarget> {
        match target {
            EventTarget::Window => vec![EventTarget::Window],
            EventTarget::Document => vec![EventTarget::Document, EventTarget::Window],
            EventTarget::Node(node) => {
                let mut path: Vec<EventTarget> = node
                    .ancestors(&self.arena)
                    .filter(|&n| n != self.root())
                    .map(EventTarget::Node)
                    .collect();
                if self.is_connected(node) {
                    path.push(EventTarget::Document);
                    path.push(EventTarget::Window);
                }
                path
            }
        }
    }

    fn deliver(&mut self, event: &Event) -> Dispatch {
        if self.check_target(event.target).is_err() {
            debug!(event = %event.kind, target = %event.target, "dropping event for removed target");
            return Dispatch::Dropped;
        }

        let path = self.propagation_path(event.target);
        let mut handlers = 0;

        for &current in path.iter().skip(1).rev() {
            handlers += self.invoke(current, event, Phase::Capture);
        }
        handlers += self.invoke(event.target, event, Phase::Target);
        if event.kind.bubbles() {
            for &current in path.iter().skip(1) {
                handlers += self.invoke(current, event, Phase::Bubble);
            }
        }

        Dispatch::Delivered {
            handlers,
            default_prevented: event.default_prevented(),
        }
    }

    fn invoke(&mut self, current: EventTarget, event: &Event, phase: Phase) -> usize {
        let snapshot: Vec<Installed> = match self.listeners.get(&current) {
            Some(entries) => entries
                .iter()
                .filter(|i| i.kind == event.kind)
                .filter(|i| match phase {
                    Phase::Capture => i.options.capture,
                    Phase::Target => true,
                    Phase::Bubble => !i.options.capture,
                })
                .cloned()
                .collect(),
            None => return 0,
        };

        let mut invoked = 0;
        for installed in snapshot {
            let still_installed = self
                .listeners
                .get(&current)
                .is_some_and(|entries| entries.iter().any(|i| i.id == installed.id));
            if !still_installed {
                continue;
            }
            if installed.options.once {
                if let Some(entries) = self.listeners.get_mut(&current) {
                    entries.retain(|i| i.id != installed.id);
                }
            }

            event.passive.set(installed.options.passive);
            let result = installed.listener.call(self, event);
            event.passive.set(false);
            invoked += 1;

            if let Err(e) = result {
                warn!(
                    event = %event.kind,
                    target = %current,
                    listener = %installed.id,
                    error = %e,
                    "event handler failed"
                );
            }
        }
        invoked
    }
}

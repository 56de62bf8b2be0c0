//! Listener registry.
//!
//! Every subscription a page module installs goes through a
//! [`ListenerRegistry`], which keeps the exact `(target, type, handler,
//! options)` tuple so [`ListenerRegistry::cleanup`] can remove precisely
//! what was installed. Removal problems (a target that no longer exists, a
//! listener already gone) are logged and counted, never propagated, and the
//! registry is always empty afterwards.
//!
//! Timers a handler may leave pending (the controls idle timer, say) can be
//! tracked through a [`TimerSlot`]; cleanup cancels whatever the slot holds.

use std::cell::Cell;
use std::ops::AddAssign;
use std::rc::Rc;

use lightframe_common::{ListenerId, TimerId};
use lightframe_dom::{Document, DomResult, EventTarget, EventType, Listener, ListenerOptions};
use serde::Serialize;
use tracing::{debug, warn};

/// One recorded subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: ListenerId,
    pub target: EventTarget,
    pub kind: EventType,
    pub listener: Listener,
    pub options: ListenerOptions,
}

/// Shared handle to at most one pending timer.
pub type TimerSlot = Rc<Cell<Option<TimerId>>>;

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Subscriptions removed from their target.
    pub removed: usize,
    /// Subscriptions whose target no longer held them (e.g. `once` listeners
    /// that already fired).
    pub absent: usize,
    /// Subscriptions whose removal failed.
    pub failed: usize,
    /// Pending timers cancelled.
    pub timers: usize,
}

impl CleanupReport {
    /// Subscriptions processed.
    pub fn total(&self) -> usize {
        self.removed + self.absent + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0 && self.timers == 0
    }
}

impl AddAssign for CleanupReport {
    fn add_assign(&mut self, other: Self) {
        self.removed += other.removed;
        self.absent += other.absent;
        self.failed += other.failed;
        self.timers += other.timers;
    }
}

/// Records subscriptions as they are installed and removes them on cleanup.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    subscriptions: Vec<Subscription>,
    timers: Vec<TimerSlot>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `listener` on `target` and record it.
    pub fn add(
        &mut self,
        doc: &mut Document,
        target: impl Into<EventTarget>,
        kind: EventType,
        listener: Listener,
    ) -> DomResult<ListenerId> {
        self.add_with_options(doc, target, kind, listener, ListenerOptions::default())
    }

    /// Install with explicit options.
    pub fn add_with_options(
        &mut self,
        doc: &mut Document,
        target: impl Into<EventTarget>,
        kind: EventType,
        listener: Listener,
        options: ListenerOptions,
    ) -> DomResult<ListenerId> {
        let target = target.into();
        let id = doc.add_event_listener(target, kind, listener.clone(), options)?;
        self.subscriptions.push(Subscription {
            id,
            target,
            kind,
            listener,
            options,
        });
        Ok(id)
    }

    /// Convenience for closures.
    pub fn on<F>(
        &mut self,
        doc: &mut Document,
        target: impl Into<EventTarget>,
        kind: EventType,
        handler: F,
    ) -> DomResult<ListenerId>
    where
        F: Fn(&mut Document, &lightframe_dom::Event) -> DomResult<()> + 'static,
    {
        self.add(doc, target, kind, Listener::new(handler))
    }

    /// Cancel whatever `slot` holds when the registry is cleaned up.
    pub fn track_timer(&mut self, slot: TimerSlot) {
        self.timers.push(slot);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty() && self.timers.is_empty()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Remove every recorded subscription, then forget them all.
    ///
    /// Calling this again on an empty registry is a no-op.
    pub fn cleanup(&mut self, doc: &mut Document) -> CleanupReport {
        let mut report = CleanupReport::default();
        for sub in self.subscriptions.drain(..) {
            match doc.remove_event_listener(sub.target, sub.kind, &sub.listener, sub.options.capture) {
                Ok(true) => report.removed += 1,
                Ok(false) => {
                    debug!(listener = %sub.id, event = %sub.kind, target = %sub.target, "listener already gone");
                    report.absent += 1;
                }
                Err(e) => {
                    warn!(
                        listener = %sub.id,
                        event = %sub.kind,
                        target = %sub.target,
                        error = %e,
                        "listener cleanup failed (non-critical)"
                    );
                    report.failed += 1;
                }
            }
        }
        for slot in self.timers.drain(..) {
            if slot.take().is_some_and(|id| doc.clear_timeout(id)) {
                report.timers += 1;
            }
        }

        if !report.is_empty() {
            debug!(
                removed = report.removed,
                absent = report.absent,
                failed = report.failed,
                timers = report.timers,
                "event listeners cleaned up"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightframe_dom::Event;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting(counter: &Rc<Cell<usize>>) -> Listener {
        let counter = Rc::clone(counter);
        Listener::new(move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        doc.append_child(doc.body(), button).unwrap();
        let hits = Rc::new(Cell::new(0));

        let mut registry = ListenerRegistry::new();
        registry.add(&mut doc, button, EventType::Click, counting(&hits)).unwrap();
        registry
            .add(&mut doc, EventTarget::Window, EventType::Resize, counting(&hits))
            .unwrap();
        registry
            .add_with_options(
                &mut doc,
                EventTarget::Document,
                EventType::VisibilityChange,
                counting(&hits),
                ListenerOptions::capture(),
            )
            .unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(doc.total_listeners(), 3);

        let first = registry.cleanup(&mut doc);
        assert_eq!(first.removed, 3);
        assert_eq!(first.failed, 0);
        assert!(registry.is_empty());
        assert_eq!(doc.total_listeners(), 0);

        doc.dispatch(Event::new(EventType::Click, button));
        assert_eq!(hits.get(), 0);

        let second = registry.cleanup(&mut doc);
        assert!(second.is_empty());
    }

    #[test]
    fn test_cleanup_tolerates_destroyed_targets() {
        let mut doc = Document::new();
        let gone = doc.create_element("div");
        let kept = doc.create_element("div");
        doc.append_child(doc.body(), gone).unwrap();
        doc.append_child(doc.body(), kept).unwrap();
        let hits = Rc::new(Cell::new(0));

        let mut registry = ListenerRegistry::new();
        registry.add(&mut doc, gone, EventType::Click, counting(&hits)).unwrap();
        registry.add(&mut doc, kept, EventType::Click, counting(&hits)).unwrap();

        doc.remove_node(gone).unwrap();
        let report = registry.cleanup(&mut doc);
        assert_eq!(report.failed, 1);
        assert_eq!(report.removed, 1);
        assert!(registry.is_empty());
        assert_eq!(doc.listener_count(kept), 0);
    }

    #[test]
    fn test_cleanup_handles_detached_targets() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        doc.append_child(doc.body(), node).unwrap();
        let hits = Rc::new(Cell::new(0));

        let mut registry = ListenerRegistry::new();
        registry.add(&mut doc, node, EventType::Click, counting(&hits)).unwrap();
        doc.detach(node).unwrap();

        let report = registry.cleanup(&mut doc);
        assert_eq!(report.removed, 1);
        assert_eq!(doc.listener_count(node), 0);
    }

    #[test]
    fn test_fired_once_listener_counts_as_absent() {
        let mut doc = Document::new();
        let hits = Rc::new(Cell::new(0));
        let mut registry = ListenerRegistry::new();
        registry
            .add_with_options(
                &mut doc,
                EventTarget::Window,
                EventType::Scroll,
                counting(&hits),
                ListenerOptions::once(),
            )
            .unwrap();
        doc.dispatch(Event::new(EventType::Scroll, EventTarget::Window));

        let report = registry.cleanup(&mut doc);
        assert_eq!(report.absent, 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_registry_repopulates_after_cleanup() {
        let mut doc = Document::new();
        let mut registry = ListenerRegistry::new();
        registry
            .on(&mut doc, EventTarget::Window, EventType::Resize, |_, _| Ok(()))
            .unwrap();
        registry.cleanup(&mut doc);
        registry
            .on(&mut doc, EventTarget::Window, EventType::Resize, |_, _| Ok(()))
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(doc.total_listeners(), 1);
    }

    #[test]
    fn test_add_to_destroyed_target_records_nothing() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        doc.remove_node(node).unwrap();
        let mut registry = ListenerRegistry::new();
        assert!(registry
            .on(&mut doc, node, EventType::Click, |_, _| Ok(()))
            .is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cleanup_cancels_tracked_timers() {
        let mut doc = Document::new();
        let mut registry = ListenerRegistry::new();
        let fired = Rc::new(Cell::new(false));
        let slot: TimerSlot = Rc::default();
        let flag = Rc::clone(&fired);
        slot.set(Some(doc.set_timeout(std::time::Duration::from_secs(3), move |_| flag.set(true))));
        registry.track_timer(Rc::clone(&slot));
        registry.track_timer(Rc::default());
        assert!(!registry.is_empty());

        let report = registry.cleanup(&mut doc);
        assert_eq!(report.timers, 1);
        assert_eq!(report.total(), 0);
        assert!(registry.is_empty());
        assert_eq!(slot.get(), None);

        doc.advance(std::time::Duration::from_secs(5));
        assert!(!fired.get());
        assert!(registry.cleanup(&mut doc).is_empty());
    }

    #[test]
    fn test_report_accumulates() {
        let mut total = CleanupReport::default();
        total += CleanupReport {
            removed: 2,
            failed: 1,
            ..CleanupReport::default()
        };
        total += CleanupReport {
            removed: 1,
            absent: 1,
            timers: 1,
            ..CleanupReport::default()
        };
        assert_eq!(total.total(), 5);
        assert_eq!(total.timers, 1);
    }
}

//! Virtual-clock timers.
//!
//! The document owns a monotonic clock that only moves when
//! [`Document::advance`] is called. Playing media progresses with the clock,
//! interleaved with timer deadlines so a timer scheduled at 3 s observes the
//! media state as of 3 s.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use lightframe_common::TimerId;
use tracing::trace;

use crate::document::Document;

pub(crate) type TimerCallback = Box<dyn FnOnce(&mut Document)>;

#[derive(Default)]
pub(crate) struct TimerQueue {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, TimerId), TimerCallback>,
    deadlines: HashMap<TimerId, Duration>,
}

impl TimerQueue {
    fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.next_id += 1;
        let id = TimerId::from(self.next_id);
        let deadline = self.now + delay;
        self.pending.insert((deadline, id), callback);
        self.deadlines.insert(id, deadline);
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.pending.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    fn pop_due(&mut self, now: Duration) -> Option<(TimerId, TimerCallback)> {
        let key = *self.pending.keys().next()?;
        if key.0 > now {
            return None;
        }
        let callback = self.pending.remove(&key)?;
        self.deadlines.remove(&key.1);
        Some((key.1, callback))
    }
}

impl Document {
    /// Current virtual time since the document was created.
    pub fn now(&self) -> Duration {
        self.timers.now
    }

    /// Schedule `callback` to run once `delay` has elapsed.
    pub fn set_timeout<F>(&mut self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce(&mut Document) + 'static,
    {
        let id = self.timers.schedule(delay, Box::new(callback));
        trace!(timer = %id, delay_ms = delay.as_millis() as u64, "timer scheduled");
        id
    }

    /// Cancel a pending timer. Unknown or already-fired ids are ignored.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Cancel every pending timer, returning how many were dropped.
    pub fn clear_all_timers(&mut self) -> usize {
        let dropped = self.timers.pending.len();
        self.timers.pending.clear();
        self.timers.deadlines.clear();
        dropped
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending.len()
    }

    pub fn has_timer(&self, id: TimerId) -> bool {
        self.timers.deadlines.contains_key(&id)
    }

    /// Move the clock forward by `by`, progressing playing media and firing
    /// every timer that falls due, in deadline order.
    pub fn advance(&mut self, by: Duration) {
        let target = self.timers.now + by;
        loop {
            let step_to = match self.timers.next_deadline() {
                Some(deadline) if deadline <= target => deadline.max(self.timers.now),
                _ => target,
            };

            let elapsed = step_to - self.timers.now;
            if !elapsed.is_zero() {
                self.timers.now = step_to;
                self.progress_media(elapsed);
            }

            match self.timers.pop_due(self.timers.now) {
                Some((id, callback)) => {
                    trace!(timer = %id, "timer fired");
                    callback(self);
                }
                None if self.timers.now >= target => break,
                None => {}
            }
        }
    }
}

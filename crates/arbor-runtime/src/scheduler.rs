//! Single-threaded cooperative scheduler.
//!
//! Three queues, drained by [`Scheduler::tick`] in a fixed discipline:
//! microtasks first, then timers that have come due, then frame callbacks.
//! The host calls `tick` at its own cadence; a fixed-rate tick stands in
//! for paint alignment.
//!
//! The scheduler is deliberately dumb: it stores opaque tasks and returns
//! the due ones in order. What a task *means* is the runtime's business,
//! which keeps this piece trivially testable.

use std::collections::VecDeque;

use web_time::{Duration, Instant};

/// Cancellation handle for a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct TimerEntry<T> {
    due: Instant,
    id: u64,
    task: T,
}

/// Timer, frame, and microtask queues over an opaque task type.
#[derive(Debug)]
pub struct Scheduler<T> {
    timers: Vec<TimerEntry<T>>,
    frame: Vec<T>,
    microtasks: VecDeque<T>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            frame: Vec::new(),
            microtasks: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Run `task` once `delay` has elapsed from `now`.
    pub fn schedule_timer(&mut self, now: Instant, delay: Duration, task: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.push(TimerEntry {
            due: now + delay,
            id,
            task,
        });
        TimerHandle(id)
    }

    /// Cancel a pending timer. A handle that already fired is a no-op.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.timers.retain(|entry| entry.id != handle.0);
    }

    /// Run `task` on the next frame boundary.
    pub fn request_frame(&mut self, task: T) {
        self.frame.push(task);
    }

    /// Run `task` before the next frame or timer work.
    pub fn enqueue_microtask(&mut self, task: T) {
        self.microtasks.push_back(task);
    }

    /// Whether anything is pending at all.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.frame.is_empty() && self.microtasks.is_empty()
    }

    /// The next instant at which a timer comes due, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.timers.iter().map(|entry| entry.due).min()
    }

    /// Collect the work due at `now`: all microtasks, then due timers in
    /// due-time order (insertion order breaking ties), then all frame
    /// callbacks.
    #[must_use]
    pub fn tick(&mut self, now: Instant) -> Vec<T> {
        let mut due: Vec<T> = self.microtasks.drain(..).collect();

        let mut fired: Vec<TimerEntry<T>> = Vec::new();
        let mut remaining: Vec<TimerEntry<T>> = Vec::new();
        for entry in self.timers.drain(..) {
            if entry.due <= now {
                fired.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.timers = remaining;
        fired.sort_by_key(|entry| (entry.due, entry.id));
        due.extend(fired.into_iter().map(|entry| entry.task));

        due.extend(self.frame.drain(..));
        due
    }
}

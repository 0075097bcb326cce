// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred, delayed and repeating work on the logic thread.
//!
//! The [`Scheduler`] owns a queue of tasks ordered by due time (ties run in
//! scheduling order). [`update`](Scheduler::update) advances the virtual
//! clock and runs every task that is due at the new time. Tasks receive the
//! caller's context (typically the scene) and the scheduler itself, so they
//! can mutate the scene and schedule follow-up work.
//!
//! Work scheduled while a task runs never runs inline: the due set is taken
//! before the first task executes, so new tasks wait for the next update at
//! the earliest. A repeating task runs at most once per update.

use core::cmp::Ordering;
use core::fmt;
use std::cell::Cell;
use std::collections::BinaryHeap;
use std::rc::Rc;

use tracing::trace;

use crate::time::{ClockTime, Duration};

/// How a repeating task that fell behind catches up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CatchUp {
    /// Drop missed invocations: the next run is one interval after the time
    /// the late invocation actually ran.
    #[default]
    Skip,
    /// Keep the fixed cadence: missed invocations run one per update until
    /// the task has caught up.
    Burst,
}

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Catch-up policy of repeating tasks.
    pub catch_up: CatchUp,
}

impl SchedulerConfig {
    /// Configuration for animation work: late frames are skipped.
    #[must_use]
    pub const fn animation() -> Self {
        Self {
            catch_up: CatchUp::Skip,
        }
    }

    /// Configuration for fixed-rate simulation: every step runs.
    #[must_use]
    pub const fn fixed_rate() -> Self {
        Self {
            catch_up: CatchUp::Burst,
        }
    }
}

/// A scheduled unit of work.
pub type Task<C> = Box<dyn FnMut(&mut C, &mut Scheduler<C>)>;

/// A cancellation handle for a scheduled task.
///
/// Clones share the same token. Cancelling suppresses every invocation that
/// has not started yet; an invocation that already ran is unaffected.
#[derive(Clone, Debug)]
pub struct ScheduledTask {
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl ScheduledTask {
    /// Cancels the task.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Returns whether the task was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Scheduler-unique identifier of the task.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

struct Pending<C> {
    due: ClockTime,
    order: u64,
    interval: Option<Duration>,
    handle: ScheduledTask,
    task: Task<C>,
}

impl<C> PartialEq for Pending<C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C> Eq for Pending<C> {}

impl<C> PartialOrd for Pending<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Pending<C> {
    // Reversed so the max-heap pops the earliest due, then earliest
    // scheduled, task.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Time-ordered queue of logic-thread tasks over a context `C`.
pub struct Scheduler<C> {
    config: SchedulerConfig,
    now: ClockTime,
    queue: BinaryHeap<Pending<C>>,
    next_id: u64,
    next_order: u64,
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("next_id", &self.next_id)
            .field("next_order", &self.next_order)
            .finish()
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<C> Scheduler<C> {
    /// Creates an empty scheduler with its clock at [`ClockTime::ZERO`].
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            now: ClockTime::ZERO,
            queue: BinaryHeap::new(),
            next_id: 0,
            next_order: 0,
        }
    }

    /// The current virtual time.
    #[must_use]
    pub fn now(&self) -> ClockTime {
        self.now
    }

    /// Runs `task` on the next update.
    pub fn add(&mut self, task: impl FnMut(&mut C, &mut Self) + 'static) -> ScheduledTask {
        self.push(Duration::ZERO, None, Box::new(task))
    }

    /// Runs `task` once, no earlier than `delay` after the current time.
    pub fn schedule_once(
        &mut self,
        delay: Duration,
        task: impl FnMut(&mut C, &mut Self) + 'static,
    ) -> ScheduledTask {
        self.push(delay, None, Box::new(task))
    }

    /// Runs `task` first after `delay`, then every `interval` until
    /// cancelled.
    pub fn schedule_repeating(
        &mut self,
        delay: Duration,
        interval: Duration,
        task: impl FnMut(&mut C, &mut Self) + 'static,
    ) -> ScheduledTask {
        self.push(delay, Some(interval), Box::new(task))
    }

    /// Cancels and drops every pending task.
    pub fn cancel_all(&mut self) {
        for pending in self.queue.drain() {
            pending.handle.cancel();
        }
    }

    /// Number of tasks waiting to run (cancelled tasks not yet swept
    /// included).
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Advances the clock to `now` and runs the tasks due by then.
    ///
    /// The clock never moves backwards; an earlier `now` is treated as the
    /// current time. Returns how many tasks ran.
    pub fn update(&mut self, now: ClockTime, context: &mut C) -> usize {
        self.now = self.now.max(now);

        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|top| top.due <= self.now) {
            if let Some(pending) = self.queue.pop() {
                due.push(pending);
            }
        }

        let mut ran = 0;
        for mut pending in due {
            if pending.handle.is_cancelled() {
                continue;
            }
            (pending.task)(context, self);
            ran += 1;

            let Some(interval) = pending.interval else {
                continue;
            };
            if pending.handle.is_cancelled() {
                continue;
            }
            let mut next = pending.due.saturating_add(interval);
            if next <= self.now && self.config.catch_up == CatchUp::Skip {
                next = self.now.saturating_add(interval);
            }
            pending.due = next;
            pending.order = self.take_order();
            self.queue.push(pending);
        }

        if ran > 0 {
            trace!(now = ?self.now, ran, pending = self.queue.len(), "scheduler update");
        }
        ran
    }

    fn push(&mut self, delay: Duration, interval: Option<Duration>, task: Task<C>) -> ScheduledTask {
        let handle = ScheduledTask {
            id: self.next_id,
            cancelled: Rc::new(Cell::new(false)),
        };
        self.next_id += 1;
        let order = self.take_order();
        self.queue.push(Pending {
            due: self.now.saturating_add(delay),
            order,
            interval,
            handle: handle.clone(),
            task,
        });
        handle
    }

    fn take_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }
}

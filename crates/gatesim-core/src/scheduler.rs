//! Delayed cascade scheduling.
//!
//! Every cascade hop is handed to the [`Scheduler`] as part of a batch, and only
//! applied once the logical clock has advanced by the clock speed. Batches are
//! released in submission order among batches due at the same time, entries within
//! a batch in insertion order.

use std::time::Duration;

use gatesim_common::DelayQueue;

use crate::{InputId, OutputId};

/// A pending update of one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCall {
    /// Level to apply.
    pub powered: bool,
    /// Input to update.
    pub input: InputId,
    /// Output the level originates from.
    pub output: OutputId,
}

/// Updates applied together once their delay has elapsed.
pub type Batch = Vec<UpdateCall>;

/// Queues batches of update calls against a logical clock.
#[derive(Debug)]
pub struct Scheduler {
    clock_speed: Duration,
    now: Duration,
    queue: DelayQueue<Batch>,
}

impl Scheduler {
    /// Creates a new scheduler.
    ///
    /// # Arguments
    ///
    /// * `clock_speed` - Delay applied by [`Scheduler::initiate`].
    pub fn new(clock_speed: Duration) -> Self {
        Self {
            clock_speed,
            now: Duration::ZERO,
            queue: DelayQueue::new(),
        }
    }

    /// Returns the delay applied to every cascade hop.
    pub fn clock_speed(&self) -> Duration {
        self.clock_speed
    }

    /// Returns the current logical time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules a batch to be applied `delay` from now.
    pub fn schedule(&mut self, delay: Duration, batch: Batch) {
        if batch.is_empty() {
            return;
        }

        self.queue.schedule(self.now, delay, batch);
    }

    /// Schedules a batch to be applied one clock tick from now.
    pub fn initiate(&mut self, batch: Batch) {
        self.schedule(self.clock_speed, batch);
    }

    /// Returns the due time of the next batch.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.next_due()
    }

    /// Returns the number of pending batches.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pops the next batch due at or before `now`, moving the clock to its due time.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<Batch> {
        let (due, batch) = self.queue.pop_due(now)?;
        self.now = self.now.max(due);
        Some(batch)
    }

    /// Moves the clock forward to `now`, it never moves backwards.
    pub(crate) fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Drops every pending batch.
    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}

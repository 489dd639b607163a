//! Delay queue over a logical clock.

use std::{cmp::Ordering, collections::BinaryHeap, time::Duration};

use crate::Counter;

/// An item waiting in a [`DelayQueue`].
#[derive(Debug)]
struct Entry<T> {
    due: Duration,
    seq: Counter,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed so the max-heap pops the earliest due entry, then the earliest
    // scheduled among entries due at the same time.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A queue that releases items once the logical clock passes their due time.
///
/// Items due at the same time are released in the order they were scheduled.
#[derive(Debug)]
pub struct DelayQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    seq: Counter,
}

impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: Counter::default(),
        }
    }
}

impl<T> DelayQueue<T> {
    /// Creates a new, empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `item` to become due `delay` after `now`.
    pub fn schedule(&mut self, now: Duration, delay: Duration, item: T) {
        self.heap.push(Entry {
            due: now.saturating_add(delay),
            seq: self.seq.next(),
            item,
        });
    }

    /// Pops the next item which is due at or before `now`, along with its due time.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        if self.heap.peek()?.due > now {
            return None;
        }

        self.heap.pop().map(|entry| (entry.due, entry.item))
    }

    /// Returns the due time of the next item.
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|entry| entry.due)
    }

    /// Returns the number of pending items.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if no items are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops all pending items.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_nothing_due_before_delay() {
        let mut queue = DelayQueue::new();
        queue.schedule(Duration::ZERO, 10 * MS, "a");

        assert_eq!(queue.pop_due(9 * MS), None);
        assert_eq!(queue.next_due(), Some(10 * MS));
        assert_eq!(queue.pop_due(10 * MS), Some((10 * MS, "a")));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_for_equal_due_times() {
        let mut queue = DelayQueue::new();
        for item in 0..8 {
            queue.schedule(Duration::ZERO, MS, item);
        }

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop_due(MS))
            .map(|(_, item)| item)
            .collect();

        pretty_assertions::assert_eq!(drained, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_earliest_due_first() {
        let mut queue = DelayQueue::new();
        queue.schedule(Duration::ZERO, 5 * MS, "late");
        queue.schedule(Duration::ZERO, 2 * MS, "early");

        assert_eq!(queue.pop_due(10 * MS), Some((2 * MS, "early")));
        assert_eq!(queue.pop_due(10 * MS), Some((5 * MS, "late")));
        assert_eq!(queue.pop_due(10 * MS), None);
    }

    #[test]
    fn test_clear() {
        let mut queue = DelayQueue::new();
        queue.schedule(Duration::ZERO, MS, ());
        queue.schedule(Duration::ZERO, MS, ());
        assert_eq!(queue.len(), 2);

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.next_due(), None);
    }
}

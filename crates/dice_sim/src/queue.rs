//! Bounded min-heap of pending chip re-evaluations.

use crate::error::SimError;
use crate::ids::ChipId;
use crate::time::SimTime;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A scheduled re-evaluation of `chip` at `time`.
///
/// Entries are ordered by time, then by insertion sequence, so events due at
/// the same instant fire in the order they were scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueueEntry {
    /// When the event is due.
    pub time: SimTime,
    seq: u64,
    /// The chip to re-evaluate.
    pub chip: ChipId,
}

/// The scheduler's event queue.
///
/// Entries are never removed early: rescheduling a chip leaves the old entry
/// in place and the run loop discards it when it no longer matches the
/// chip's pending event.
#[derive(Debug)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    capacity: usize,
    next_seq: u64,
}

impl EventQueue {
    /// Creates a queue holding at most `capacity` entries, reserving the space up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    /// Queues `chip` for re-evaluation at `time`.
    pub fn push(&mut self, time: SimTime, chip: ChipId) -> Result<(), SimError> {
        if self.heap.len() >= self.capacity {
            return Err(SimError::QueueOverflow {
                capacity: self.capacity,
                time,
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(QueueEntry { time, seq, chip }));
        Ok(())
    }

    /// The earliest entry, without removing it.
    pub fn peek(&self) -> Option<QueueEntry> {
        self.heap.peek().map(|Reverse(entry)| *entry)
    }

    /// Removes and returns the earliest entry.
    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    /// Number of queued entries, stale ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chip(n: u32) -> ChipId {
        ChipId::from_raw(n)
    }

    #[test]
    fn pops_in_time_order() {
        let mut q = EventQueue::with_capacity(8);
        q.push(SimTime::from_ps(30), chip(1)).unwrap();
        q.push(SimTime::from_ps(10), chip(2)).unwrap();
        q.push(SimTime::from_ps(20), chip(3)).unwrap();
        let order: Vec<u64> = std::iter::from_fn(|| q.pop())
            .map(|e| e.time.as_ps())
            .collect();
        assert_eq!(order, vec![10, 20, 30]);
    }

    #[test]
    fn ties_break_fifo() {
        let mut q = EventQueue::with_capacity(8);
        for n in [5, 3, 9, 1] {
            q.push(SimTime::from_ps(100), chip(n)).unwrap();
        }
        let order: Vec<u32> = std::iter::from_fn(|| q.pop())
            .map(|e| e.chip.as_raw())
            .collect();
        assert_eq!(order, vec![5, 3, 9, 1]);
    }

    #[test]
    fn overflow_is_reported() {
        let mut q = EventQueue::with_capacity(2);
        q.push(SimTime::from_ps(1), chip(0)).unwrap();
        q.push(SimTime::from_ps(2), chip(0)).unwrap();
        let err = q.push(SimTime::from_ps(3), chip(0)).unwrap_err();
        assert!(matches!(err, SimError::QueueOverflow { capacity: 2, .. }));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn peek_does_not_remove() {
        let mut q = EventQueue::with_capacity(4);
        assert!(q.peek().is_none());
        q.push(SimTime::from_ps(7), chip(4)).unwrap();
        assert_eq!(q.peek().map(|e| e.chip), Some(chip(4)));
        assert_eq!(q.len(), 1);
        assert!(q.pop().is_some());
        assert!(q.is_empty());
        assert_eq!(q.capacity(), 4);
    }
}

//! Timer queue for the single-threaded sync loop
//!
//! Debounces, suppression re-enables, seek settling and the two drift
//! intervals are all entries in one queue keyed by host time. Entries with
//! equal deadlines fire in the order they were scheduled.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deadline-ordered queue of pending tasks
#[derive(Debug)]
pub struct Scheduler<T> {
    heap: BinaryHeap<Reverse<(Duration, TimerId)>>,
    tasks: HashMap<TimerId, T>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            tasks: HashMap::new(),
            next_id: 0,
        }
    }

    /// Schedule `task` to fire at `deadline`
    pub fn schedule(&mut self, deadline: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse((deadline, id)));
        self.tasks.insert(id, task);
        id
    }

    /// Cancel a pending timer; returns the task if it had not fired yet
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        // The heap entry is left behind and skipped when it surfaces
        self.tasks.remove(&id)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Deadline of the earliest live timer
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Remove and return the earliest timer due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, TimerId, T)> {
        self.discard_cancelled();
        match self.heap.peek() {
            Some(Reverse((deadline, _))) if *deadline <= now => {}
            _ => return None,
        }
        let Reverse((deadline, id)) = self.heap.pop()?;
        let task = self.tasks.remove(&id)?;
        Some((deadline, id, task))
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.heap.clear();
        self.tasks.clear();
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, id))) = self.heap.peek() {
            if self.tasks.contains_key(id) {
                break;
            }
            self.heap.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut sched = Scheduler::new();
        sched.schedule(ms(30), "c");
        sched.schedule(ms(10), "a");
        sched.schedule(ms(20), "b");

        assert!(sched.pop_due(ms(5)).is_none());

        let order: Vec<_> = std::iter::from_fn(|| sched.pop_due(ms(100)).map(|(_, _, t)| t)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_deadlines_keep_schedule_order() {
        let mut sched = Scheduler::new();
        sched.schedule(ms(10), 1);
        sched.schedule(ms(10), 2);
        sched.schedule(ms(10), 3);

        let order: Vec<_> = std::iter::from_fn(|| sched.pop_due(ms(10)).map(|(_, _, t)| t)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel() {
        let mut sched = Scheduler::new();
        let first = sched.schedule(ms(10), "first");
        sched.schedule(ms(20), "second");

        assert_eq!(sched.cancel(first), Some("first"));
        assert_eq!(sched.cancel(first), None);
        assert!(!sched.is_pending(first));
        assert_eq!(sched.next_deadline(), Some(ms(20)));
        assert_eq!(sched.len(), 1);
    }
}

//! Deferred work queue
//!
//! Tasks run in deadline order, ties broken by scheduling order. Time is
//! a virtual clock moved forward by the owner, so nothing here sleeps or
//! spawns.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_task_id: u64,
    queue: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_task_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        self.next_task_id += 1;
        let id = self.next_task_id;
        let deadline = self.now + delay;
        self.queue.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        TaskId(id)
    }

    pub fn cancel(&mut self, task_id: TaskId) -> Option<T> {
        let deadline = self.deadlines.remove(&task_id.0)?;
        self.queue.remove(&(deadline, task_id.0))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove the earliest task due at or before `until`, moving the clock
    /// to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskId, T)> {
        let (deadline, id) = *self.queue.keys().next()?;
        if deadline > until {
            return None;
        }
        let task = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(deadline);
        Some((TaskId(id), task))
    }

    /// Move the clock forward. The clock never goes back.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    pub fn task_count(&self) -> usize {
        self.queue.len()
    }
}

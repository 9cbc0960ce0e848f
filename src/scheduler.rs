//! Single-fire timers.
//!
//! Timers sit in a priority queue ordered by fire time. Cancelling only
//! forgets the event, the stale queue slot is skipped when it reaches the
//! front. The scheduler never reads a clock: the owner passes `now` in and
//! drains due events with [`Scheduler::pop_due`].

use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashMap},
};

use crate::timestamp::Timestamp;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct ScheduledTimer {
    fire_at: Timestamp,
    id: TimerId,
}

impl PartialEq for ScheduledTimer {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}

impl Eq for ScheduledTimer {}

impl PartialOrd for ScheduledTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTimer {
    // Timers due at the same time fire in the order they were scheduled
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .cmp(&other.fire_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

pub struct Scheduler<E> {
    timers: BinaryHeap<Reverse<ScheduledTimer>>,
    // Only armed timers have an event here
    events: HashMap<TimerId, E>,
    next_id: u64,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            timers: BinaryHeap::new(),
            events: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, now: Timestamp, delay_ms: u64, event: E) -> TimerId {
        self.schedule_at(now.adding(delay_ms), event)
    }

    pub fn schedule_at(&mut self, fire_at: Timestamp, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Reverse(ScheduledTimer { fire_at, id }));
        self.events.insert(id, event);
        id
    }

    // Cancelling a timer that already fired or was cancelled does nothing
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        self.events.remove(&id)
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.events.contains_key(&id)
    }

    pub fn next_deadline(&mut self) -> Option<Timestamp> {
        self.discard_cancelled();
        self.timers.peek().map(|Reverse(t)| t.fire_at)
    }

    pub fn pop_due(&mut self, now: Timestamp) -> Option<(TimerId, E)> {
        self.discard_cancelled();
        match self.timers.peek() {
            Some(Reverse(t)) if t.fire_at <= now => {
                let Reverse(timer) = self.timers.pop()?;
                let event = self.events.remove(&timer.id)?;
                Some((timer.id, event))
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse(t)) = self.timers.peek() {
            if self.events.contains_key(&t.id) {
                break;
            }
            self.timers.pop();
        }
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

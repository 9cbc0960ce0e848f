use std::{
    cell::Cell,
    rc::Rc,
    time::Instant,
};

use crate::timestamp::Timestamp;

pub trait Clock {
    fn now(&self) -> Timestamp;
}

// Milliseconds elapsed since the clock was created, never goes backwards.
pub struct MonotonicClock {
    reference: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            reference: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        let millis = u64::try_from(Instant::now().duration_since(self.reference).as_millis())
            .unwrap_or(u64::MAX);
        Timestamp::from_ms(millis)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a simulation (or a test) can keep one
/// handle and give another to the forwarder.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Rc::new(Cell::new(start.ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now.ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_ms(self.now.get())
    }
}

use core::fmt;

/// A point in time in milliseconds, measured from the epoch of whichever
/// `Clock` produced it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub ms: u64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { ms: 0 };
    pub const MAX: Timestamp = Timestamp { ms: u64::MAX };

    pub fn from_ms(ms: u64) -> Self {
        Self { ms }
    }

    pub fn adding(&self, ms: u64) -> Self {
        Self {
            ms: self.ms.saturating_add(ms),
        }
    }

    pub fn removing(&self, ms: u64) -> Self {
        Self {
            ms: self.ms.saturating_sub(ms),
        }
    }

    // None if `other` is later than `self`
    pub fn difference(&self, other: &Self) -> Option<u64> {
        self.ms.checked_sub(other.ms)
    }

    // Time left until `self`, zero if it is already in the past
    pub fn remaining_from(&self, now: Timestamp) -> u64 {
        self.difference(&now).unwrap_or(0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.ms)
    }
}

use core::ops::{BitOr, BitOrAssign};

use crate::{
    face::FaceId,
    packet::{Interest, Nack, NackReason, Nonce},
    timestamp::Timestamp,
};

// A downstream that asked for this entry's Interest.
#[derive(Clone, Debug)]
pub struct InRecord {
    pub face: FaceId,
    // The latest copy received from this face
    pub interest: Interest,
    pub last_nonce: Nonce,
    pub last_renewed: Timestamp,
    pub expiry: Timestamp,
}

impl InRecord {
    pub(crate) fn new(face: FaceId, interest: &Interest, now: Timestamp, lifetime_ms: u64) -> Self {
        Self {
            face,
            interest: interest.clone(),
            last_nonce: interest.nonce,
            last_renewed: now,
            expiry: now.adding(lifetime_ms),
        }
    }

    pub(crate) fn update(&mut self, interest: &Interest, now: Timestamp, lifetime_ms: u64) {
        self.interest = interest.clone();
        self.last_nonce = interest.nonce;
        self.last_renewed = now;
        self.expiry = now.adding(lifetime_ms);
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry <= now
    }
}

// An upstream this entry's Interest was forwarded to.
#[derive(Clone, Debug)]
pub struct OutRecord {
    pub face: FaceId,
    pub last_nonce: Nonce,
    pub last_renewed: Timestamp,
    pub expiry: Timestamp,
    incoming_nack: Option<NackReason>,
    received_data: u32,
    expected_data: u32,
}

impl OutRecord {
    pub(crate) fn new(face: FaceId, interest: &Interest, now: Timestamp, lifetime_ms: u64) -> Self {
        Self {
            face,
            last_nonce: interest.nonce,
            last_renewed: now,
            expiry: now.adding(lifetime_ms),
            incoming_nack: None,
            received_data: 0,
            expected_data: interest.expected_data.unwrap_or(0),
        }
    }

    // Sending the Interest again forgets about any earlier Nack
    pub(crate) fn update(&mut self, interest: &Interest, now: Timestamp, lifetime_ms: u64) {
        self.last_nonce = interest.nonce;
        self.last_renewed = now;
        self.expiry = now.adding(lifetime_ms);
        self.incoming_nack = None;
        if let Some(expected) = interest.expected_data {
            self.expected_data = expected;
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry <= now
    }

    pub fn incoming_nack(&self) -> Option<NackReason> {
        self.incoming_nack
    }

    // Only a Nack for the nonce we last sent is accepted; the newest one wins
    pub(crate) fn set_incoming_nack(&mut self, nack: &Nack) -> bool {
        if nack.nonce() != self.last_nonce {
            return false;
        }
        self.incoming_nack = Some(nack.reason);
        true
    }

    pub fn clear_incoming_nack(&mut self) {
        self.incoming_nack = None;
    }

    pub fn received_data(&self) -> u32 {
        self.received_data
    }

    pub(crate) fn record_received_data(&mut self) {
        self.received_data = self.received_data.saturating_add(1);
    }

    pub fn expected_data(&self) -> u32 {
        self.expected_data
    }
}

// Where a nonce was already seen on a PIT entry.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct DuplicateNonce(u8);

impl DuplicateNonce {
    pub const NONE: DuplicateNonce = DuplicateNonce(0);
    // In-record of the same face
    pub const IN_SAME: DuplicateNonce = DuplicateNonce(1 << 0);
    // In-record of another face
    pub const IN_OTHER: DuplicateNonce = DuplicateNonce(1 << 1);
    // Out-record of the same face
    pub const OUT_SAME: DuplicateNonce = DuplicateNonce(1 << 2);
    // Out-record of another face
    pub const OUT_OTHER: DuplicateNonce = DuplicateNonce(1 << 3);

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: DuplicateNonce) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DuplicateNonce {
    type Output = DuplicateNonce;

    fn bitor(self, rhs: Self) -> Self::Output {
        DuplicateNonce(self.0 | rhs.0)
    }
}

impl BitOrAssign for DuplicateNonce {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl core::fmt::Debug for DuplicateNonce {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let names = [
            (Self::IN_SAME, "IN_SAME"),
            (Self::IN_OTHER, "IN_OTHER"),
            (Self::OUT_SAME, "OUT_SAME"),
            (Self::OUT_OTHER, "OUT_OTHER"),
        ];
        let set: Vec<_> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, n)| *n)
            .collect();
        if set.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&set.join("|"))
        }
    }
}

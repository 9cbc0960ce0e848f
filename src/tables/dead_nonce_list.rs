use std::collections::{HashMap, VecDeque};

use crate::{name::Name, packet::Nonce, timestamp::Timestamp};

/// Remembers (name, nonce) pairs for a while after their PIT entry is gone,
/// so that a looping Interest is still recognised.
///
/// Pairs are stored as 64-bit hashes; a collision can only cause a spurious
/// loop detection, never a missed one.
pub struct DeadNonceList {
    // Hash to the time it stops being considered present
    elements: HashMap<u64, Timestamp>,
    // Insertion order, for pruning
    queue: VecDeque<(Timestamp, u64)>,
    lifetime_ms: u64,
}

impl DeadNonceList {
    pub fn new(lifetime_ms: u64) -> Self {
        Self {
            elements: HashMap::new(),
            queue: VecDeque::new(),
            lifetime_ms,
        }
    }

    pub fn lifetime_ms(&self) -> u64 {
        self.lifetime_ms
    }

    pub fn contains(&self, name: &Name, nonce: Nonce, now: Timestamp) -> bool {
        let hash = Self::hash_name_and_nonce(name, nonce);
        self.elements.get(&hash).map_or(false, |expiry| *expiry > now)
    }

    pub fn insert(&mut self, name: &Name, nonce: Nonce, now: Timestamp) {
        let hash = Self::hash_name_and_nonce(name, nonce);
        let expiry = now.adding(self.lifetime_ms);
        self.elements.insert(hash, expiry);
        self.queue.push_back((expiry, hash));
        self.prune(now);
    }

    // Drops pairs older than the lifetime
    pub fn prune(&mut self, now: Timestamp) {
        while let Some((expiry, hash)) = self.queue.front().copied() {
            if expiry > now {
                break;
            }
            self.queue.pop_front();
            // A re-insertion moved the expiry further, keep it
            if self.elements.get(&hash) == Some(&expiry) {
                self.elements.remove(&hash);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn hash_name_and_nonce(name: &Name, nonce: Nonce) -> u64 {
        let mut hash = 0u64;

        for cc in name.components() {
            Self::add_to_hash(&mut hash, cc.typ.get() as u64);
            Self::add_to_hash(&mut hash, cc.bytes.len() as u64);
            for chunk in cc.bytes.chunks(8) {
                let mut arr = [0u8; 8];
                arr[..chunk.len()].copy_from_slice(chunk);
                Self::add_to_hash(&mut hash, u64::from_be_bytes(arr));
            }
        }
        Self::add_to_hash(&mut hash, nonce as u64);
        hash
    }

    #[inline]
    fn add_to_hash(hash: &mut u64, i: u64) {
        use core::ops::BitXor;
        *hash = hash
            .rotate_left(5)
            .bitxor(i)
            .wrapping_mul(0x517cc1b727220a95);
    }
}

#[cfg(test)]
mod tests {
    use super::DeadNonceList;
    use crate::{name::Name, timestamp::Timestamp};

    #[test]
    fn test_membership_expires() {
        let mut dnl = DeadNonceList::new(6000);
        let name: Name = "/a/b".parse().unwrap();
        dnl.insert(&name, 42, Timestamp::from_ms(1000));

        assert!(dnl.contains(&name, 42, Timestamp::from_ms(1000)));
        assert!(dnl.contains(&name, 42, Timestamp::from_ms(6999)));
        assert!(!dnl.contains(&name, 42, Timestamp::from_ms(7000)));
        assert!(!dnl.contains(&name, 43, Timestamp::from_ms(1000)));
        assert!(!dnl.contains(&"/a/bb".parse().unwrap(), 42, Timestamp::from_ms(1000)));
    }

    #[test]
    fn test_prune_keeps_refreshed() {
        let mut dnl = DeadNonceList::new(100);
        let a: Name = "/a".parse().unwrap();
        let b: Name = "/b".parse().unwrap();
        dnl.insert(&a, 1, Timestamp::from_ms(0));
        dnl.insert(&b, 1, Timestamp::from_ms(50));
        dnl.insert(&a, 1, Timestamp::from_ms(80));
        assert_eq!(dnl.len(), 2);

        dnl.prune(Timestamp::from_ms(120));
        assert!(dnl.contains(&a, 1, Timestamp::from_ms(120)));
        assert!(dnl.contains(&b, 1, Timestamp::from_ms(120)));

        dnl.prune(Timestamp::from_ms(150));
        assert!(!dnl.contains(&b, 1, Timestamp::from_ms(150)));
        assert_eq!(dnl.len(), 1);

        dnl.prune(Timestamp::from_ms(180));
        assert!(dnl.is_empty());
    }
}

use std::collections::BTreeMap;

use crate::{
    name::Name,
    packet::{Data, Interest},
    timestamp::Timestamp,
};

pub trait ContentStore {
    // Looks for cached Data satisfying the Interest
    fn find(&mut self, interest: &Interest, now: Timestamp) -> Option<Data>;

    // Unsolicited Data is the first to go when space runs out
    fn insert(&mut self, data: &Data, is_unsolicited: bool, now: Timestamp);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct CsEntry {
    data: Data,
    stale_at: Timestamp,
    is_unsolicited: bool,
    seq: u64,
}

/// An in-memory cache bounded by packet count.
///
/// Entries are keyed by full name, so all the Data under a prefix sit next
/// to each other. Eviction takes unsolicited Data first, then stale Data,
/// then the oldest fresh Data.
pub struct MemoryContentStore {
    entries: BTreeMap<Name, CsEntry>,
    // Insertion order by class, keyed by sequence number
    unsolicited: BTreeMap<u64, Name>,
    solicited: BTreeMap<u64, Name>,
    capacity: usize,
    next_seq: u64,
}

impl MemoryContentStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            unsolicited: BTreeMap::new(),
            solicited: BTreeMap::new(),
            capacity,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize, now: Timestamp) {
        self.capacity = capacity;
        while self.entries.len() > self.capacity {
            if !self.evict_one(now) {
                break;
            }
        }
    }

    fn matches(entry: &CsEntry, interest: &Interest, now: Timestamp) -> bool {
        if interest.must_be_fresh && entry.stale_at <= now {
            return false;
        }
        interest.can_be_prefix || entry.data.name == interest.name
    }

    fn remove(&mut self, full_name: &Name) {
        if let Some(entry) = self.entries.remove(full_name) {
            if entry.is_unsolicited {
                self.unsolicited.remove(&entry.seq);
            } else {
                self.solicited.remove(&entry.seq);
            }
        }
    }

    fn evict_one(&mut self, now: Timestamp) -> bool {
        let victim = self
            .unsolicited
            .values()
            .next()
            .or_else(|| {
                self.solicited.values().find(|name| {
                    self.entries
                        .get(*name)
                        .map_or(false, |e| e.stale_at <= now)
                })
            })
            .or_else(|| self.solicited.values().next())
            .cloned();
        match victim {
            Some(name) => {
                self.remove(&name);
                true
            }
            None => false,
        }
    }
}

impl ContentStore for MemoryContentStore {
    fn find(&mut self, interest: &Interest, now: Timestamp) -> Option<Data> {
        // Names ending with a digest only match that exact packet
        if interest.name.last().map_or(false, |c| c.is_implicit_digest()) {
            return self
                .entries
                .get(&interest.name)
                .filter(|e| !interest.must_be_fresh || e.stale_at > now)
                .map(|e| e.data.clone());
        }

        self.entries
            .range(interest.name.clone()..)
            .take_while(|(full_name, _)| interest.name.is_prefix_of(full_name))
            .find(|(_, entry)| Self::matches(entry, interest, now))
            .map(|(_, entry)| entry.data.clone())
    }

    fn insert(&mut self, data: &Data, is_unsolicited: bool, now: Timestamp) {
        if self.capacity == 0 {
            return;
        }

        let full_name = data.full_name();
        // Solicited Data replaces unsolicited, never the other way around
        let is_unsolicited = is_unsolicited
            && self
                .entries
                .get(&full_name)
                .map_or(true, |e| e.is_unsolicited);
        self.remove(&full_name);

        let seq = self.next_seq;
        self.next_seq += 1;
        if is_unsolicited {
            self.unsolicited.insert(seq, full_name.clone());
        } else {
            self.solicited.insert(seq, full_name.clone());
        }
        self.entries.insert(
            full_name,
            CsEntry {
                data: data.clone(),
                stale_at: now.adding(data.freshness_period_ms.unwrap_or(0)),
                is_unsolicited,
                seq,
            },
        );

        while self.entries.len() > self.capacity {
            if !self.evict_one(now) {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

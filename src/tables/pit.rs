use std::collections::HashMap;

use crate::{
    face::{FaceId, FaceScope, FaceTable},
    name::Name,
    packet::{Data, Interest, Nonce},
    scheduler::TimerId,
    timestamp::Timestamp,
};

use super::record::{DuplicateNonce, InRecord, OutRecord};

/// Identifies a PIT entry for as long as it lives.
///
/// Slots are reused after an entry is erased, but the generation is bumped,
/// so a token held by a timer or a strategy never reaches a newer entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PitToken {
    index: u32,
    generation: u32,
}

pub struct Entry {
    interest: Interest,
    in_records: Vec<InRecord>,
    out_records: Vec<OutRecord>,
    pub(crate) unsatisfy_timer: Option<TimerId>,
    pub(crate) straggler_timer: Option<TimerId>,
}

impl Entry {
    fn new(interest: &Interest) -> Self {
        Self {
            interest: interest.clone(),
            in_records: Vec::new(),
            out_records: Vec::new(),
            unsatisfy_timer: None,
            straggler_timer: None,
        }
    }

    // The Interest that created this entry
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn name(&self) -> &Name {
        &self.interest.name
    }

    pub fn is_push(&self) -> bool {
        self.interest.push
    }

    pub fn in_records(&self) -> &[InRecord] {
        &self.in_records
    }

    pub fn out_records(&self) -> &[OutRecord] {
        &self.out_records
    }

    pub fn in_record(&self, face: FaceId) -> Option<&InRecord> {
        self.in_records.iter().find(|r| r.face == face)
    }

    pub fn out_record(&self, face: FaceId) -> Option<&OutRecord> {
        self.out_records.iter().find(|r| r.face == face)
    }

    pub(crate) fn out_record_mut(&mut self, face: FaceId) -> Option<&mut OutRecord> {
        self.out_records.iter_mut().find(|r| r.face == face)
    }

    pub(crate) fn insert_or_update_in_record(
        &mut self,
        face: FaceId,
        interest: &Interest,
        now: Timestamp,
        lifetime_ms: u64,
    ) -> &InRecord {
        let idx = match self.in_records.iter().position(|r| r.face == face) {
            Some(idx) => {
                self.in_records[idx].update(interest, now, lifetime_ms);
                idx
            }
            None => {
                self.in_records
                    .push(InRecord::new(face, interest, now, lifetime_ms));
                self.in_records.len() - 1
            }
        };
        &self.in_records[idx]
    }

    pub(crate) fn delete_in_record(&mut self, face: FaceId) -> bool {
        let before = self.in_records.len();
        self.in_records.retain(|r| r.face != face);
        self.in_records.len() != before
    }

    pub(crate) fn clear_in_records(&mut self) {
        self.in_records.clear()
    }

    // Never shortens a record
    pub(crate) fn extend_in_records(&mut self, until: Timestamp) {
        for record in self.in_records.iter_mut() {
            record.expiry = record.expiry.max(until);
        }
    }

    pub(crate) fn insert_or_update_out_record(
        &mut self,
        face: FaceId,
        interest: &Interest,
        now: Timestamp,
        lifetime_ms: u64,
    ) -> &mut OutRecord {
        let idx = match self.out_records.iter().position(|r| r.face == face) {
            Some(idx) => {
                self.out_records[idx].update(interest, now, lifetime_ms);
                idx
            }
            None => {
                self.out_records
                    .push(OutRecord::new(face, interest, now, lifetime_ms));
                self.out_records.len() - 1
            }
        };
        &mut self.out_records[idx]
    }

    pub(crate) fn delete_out_record(&mut self, face: FaceId) -> bool {
        let before = self.out_records.len();
        self.out_records.retain(|r| r.face != face);
        self.out_records.len() != before
    }

    pub fn find_nonce(&self, nonce: Nonce, face: FaceId) -> DuplicateNonce {
        let mut found = DuplicateNonce::NONE;
        for r in self.in_records.iter().filter(|r| r.last_nonce == nonce) {
            found |= if r.face == face {
                DuplicateNonce::IN_SAME
            } else {
                DuplicateNonce::IN_OTHER
            };
        }
        for r in self.out_records.iter().filter(|r| r.last_nonce == nonce) {
            found |= if r.face == face {
                DuplicateNonce::OUT_SAME
            } else {
                DuplicateNonce::OUT_OTHER
            };
        }
        found
    }

    pub fn has_unexpired_out_records(&self, now: Timestamp) -> bool {
        self.out_records.iter().any(|r| !r.is_expired(now))
    }

    pub fn latest_in_record_expiry(&self) -> Option<Timestamp> {
        self.in_records.iter().map(|r| r.expiry).max()
    }

    // /localhost never leaves the node, /localhop travels one hop at most
    pub fn violates_scope(&self, out_face: FaceId, faces: &FaceTable) -> bool {
        if faces.scope(out_face) != Some(FaceScope::NonLocal) {
            return false;
        }
        if self.name().is_localhost() {
            return true;
        }
        if self.name().is_localhop() {
            return !self
                .in_records
                .iter()
                .any(|r| faces.scope(r.face) == Some(FaceScope::Local));
        }
        false
    }

    pub fn can_forward_to(&self, out_face: FaceId, now: Timestamp, faces: &FaceTable) -> bool {
        if self
            .out_record(out_face)
            .map_or(false, |r| !r.is_expired(now))
        {
            return false;
        }
        if self.violates_scope(out_face, faces) {
            return false;
        }
        self.in_records
            .iter()
            .any(|r| r.face != out_face && !r.is_expired(now))
    }

    pub(crate) fn delete_records_for_face(&mut self, face: FaceId) {
        self.in_records.retain(|r| r.face != face);
        self.out_records.retain(|r| r.face != face);
    }
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// The Pending Interest Table.
///
/// Entries live in an arena and are addressed by [`PitToken`]; a name index
/// maps each Interest name to the entries for its different selectors.
pub struct Pit {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_name: HashMap<Name, Vec<PitToken>>,
    len: usize,
}

impl Pit {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_name: HashMap::new(),
            len: 0,
        }
    }

    pub fn find(&self, interest: &Interest) -> Option<PitToken> {
        self.by_name.get(&interest.name)?.iter().copied().find(|t| {
            self.get(*t)
                .map_or(false, |e| e.interest.same_selectors(interest))
        })
    }

    // Returns the entry for this Interest and whether it was just created
    pub fn insert(&mut self, interest: &Interest) -> (PitToken, bool) {
        if let Some(token) = self.find(interest) {
            return (token, false);
        }

        let entry = Entry::new(interest);
        let token = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                PitToken {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                PitToken {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.by_name
            .entry(interest.name.clone())
            .or_default()
            .push(token);
        self.len += 1;
        (token, true)
    }

    pub fn get(&self, token: PitToken) -> Option<&Entry> {
        let slot = self.slots.get(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub fn get_mut(&mut self, token: PitToken) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn contains(&self, token: PitToken) -> bool {
        self.get(token).is_some()
    }

    pub fn erase(&mut self, token: PitToken) -> Option<Entry> {
        let slot = self.slots.get_mut(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(token.index);
        self.len -= 1;

        if let Some(tokens) = self.by_name.get_mut(entry.name()) {
            tokens.retain(|t| *t != token);
            if tokens.is_empty() {
                self.by_name.remove(entry.name());
            }
        }
        Some(entry)
    }

    // Every entry this Data satisfies, shorter names first
    pub fn find_all_data_matches(&self, data: &Data) -> Vec<PitToken> {
        let mut matches = Vec::new();
        for count in 0..=data.name.component_count() {
            let prefix = data.name.prefix(count);
            if let Some(tokens) = self.by_name.get(&prefix) {
                matches.extend(tokens.iter().copied().filter(|t| {
                    self.get(*t)
                        .map_or(false, |e| e.interest.matches_data(data))
                }));
            }
        }
        // An Interest naming the implicit digest matches whatever its selectors say
        if let Some(tokens) = self.by_name.get(&data.full_name()) {
            matches.extend(tokens.iter().copied());
        }
        matches
    }

    pub fn tokens(&self) -> Vec<PitToken> {
        self.by_name.values().flatten().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Pit {
    fn default() -> Self {
        Self::new()
    }
}

//! The forwarding pipelines.
//!
//! Every packet arrival and every timer expiry runs one pipeline to
//! completion. Strategies are called at fixed points and act back on the
//! forwarder through [`StrategyHost`], which is implemented by the part of
//! the forwarder that owns the tables, so a strategy can be borrowed from
//! the strategy choice table at the same time.

mod config;
mod counters;
#[cfg(test)]
mod tests;

pub use config::ForwarderConfig;
pub use counters::ForwarderCounters;

use std::collections::BTreeSet;

use log::{debug, error, trace, warn};

use crate::{
    clock::Clock,
    error::Error,
    face::{Face, FaceError, FaceId, FaceScope, FaceTable, LinkType},
    name::Name,
    packet::{Data, Interest, Link, Nack, NackReason, Packet, PacketTags},
    scheduler::Scheduler,
    strategy::{Strategy, StrategyHost},
    tables::{
        cs::{ContentStore, MemoryContentStore},
        dead_nonce_list::DeadNonceList,
        fib::{Fib, FibEntry},
        network_region::NetworkRegionTable,
        pit::{Entry, Pit, PitToken},
        record::InRecord,
        strategy_choice::StrategyChoice,
    },
    timestamp::Timestamp,
};

/// Watches PIT entries being satisfied or expiring.
pub trait PitObserver {
    fn before_satisfy_interest(&mut self, _entry: &Entry, _in_face: FaceId, _data: &Data) {}

    fn before_expire_pending_interest(&mut self, _entry: &Entry) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    Unsatisfy(PitToken),
    Straggler {
        entry: PitToken,
        satisfied: bool,
        data_freshness_ms: Option<u64>,
    },
}

// Everything a pipeline touches except the strategies
struct Core<C, CS> {
    clock: C,
    config: ForwarderConfig,
    faces: FaceTable,
    pit: Pit,
    fib: Fib,
    cs: CS,
    dead_nonce_list: DeadNonceList,
    network_region: NetworkRegionTable,
    scheduler: Scheduler<TimerEvent>,
    counters: ForwarderCounters,
    observers: Vec<Box<dyn PitObserver>>,
}

pub struct Forwarder<C, CS>
where
    C: Clock,
    CS: ContentStore,
{
    core: Core<C, CS>,
    strategy_choice: StrategyChoice,
}

impl<C> Forwarder<C, MemoryContentStore>
where
    C: Clock,
{
    // A forwarder caching into a `MemoryContentStore` sized by the config
    pub fn with_config(clock: C, config: ForwarderConfig) -> Self {
        let cs = MemoryContentStore::new(config.cs_capacity);
        Self::new(clock, cs, config)
    }
}

impl<C, CS> Forwarder<C, CS>
where
    C: Clock,
    CS: ContentStore,
{
    pub fn new(clock: C, content_store: CS, config: ForwarderConfig) -> Self {
        let dead_nonce_list = DeadNonceList::new(config.dead_nonce_lifetime_ms);
        Self {
            core: Core {
                clock,
                config,
                faces: FaceTable::new(),
                pit: Pit::new(),
                fib: Fib::new(),
                cs: content_store,
                dead_nonce_list,
                network_region: NetworkRegionTable::new(),
                scheduler: Scheduler::new(),
                counters: ForwarderCounters::default(),
                observers: Vec::new(),
            },
            strategy_choice: StrategyChoice::new(),
        }
    }

    pub fn add_face(&mut self, face: Box<dyn Face>) -> Option<FaceId> {
        let id = self.core.faces.add(face)?;
        debug!("addFace face={}", id);
        Some(id)
    }

    /// Removes a face along with its routes and PIT records.
    ///
    /// PIT entries left without any record because of the removal are
    /// finalized immediately: a pending straggler timer fires early with the
    /// outcome it carries, anything else finalizes as unsatisfied. Nonces
    /// sent to the removed face still reach the Dead Nonce List.
    pub fn remove_face(&mut self, face: FaceId) -> Option<Box<dyn Face>> {
        let removed = self.core.faces.remove(face)?;
        self.core.fib.remove_face(face);

        for token in self.core.pit.tokens() {
            let Some(entry) = self.core.pit.get_mut(token) else {
                continue;
            };
            let touched = entry.in_record(face).is_some() || entry.out_record(face).is_some();
            if !touched {
                continue;
            }
            let emptied = entry.in_records().iter().all(|r| r.face == face)
                && entry.out_records().iter().all(|r| r.face == face);
            if !emptied {
                entry.delete_records_for_face(face);
                continue;
            }

            let straggler = entry
                .straggler_timer
                .take()
                .and_then(|id| self.core.scheduler.cancel(id));
            let (satisfied, data_freshness_ms) = match straggler {
                Some(TimerEvent::Straggler {
                    satisfied,
                    data_freshness_ms,
                    ..
                }) => (satisfied, data_freshness_ms),
                _ => (false, None),
            };
            self.core
                .on_interest_finalize(token, satisfied, data_freshness_ms);
        }
        debug!("removeFace face={}", face);
        Some(removed)
    }

    pub fn add_route(&mut self, prefix: &Name, face: FaceId, cost: u32) -> Result<(), Error> {
        if !self.core.faces.contains(face) {
            return Err(Error::UnknownFace(face));
        }
        self.core.fib.add_or_update_next_hop(prefix, face, cost);
        debug!("addRoute prefix={} face={} cost={}", prefix, face, cost);
        Ok(())
    }

    pub fn remove_route(&mut self, prefix: &Name, face: FaceId) -> bool {
        self.core.fib.remove_next_hop(prefix, face)
    }

    pub fn set_strategy(&mut self, prefix: &Name, strategy_name: &str) -> Result<(), Error> {
        self.strategy_choice.set(prefix, strategy_name)
    }

    pub fn strategy_choice_mut(&mut self) -> &mut StrategyChoice {
        &mut self.strategy_choice
    }

    pub fn network_region_table_mut(&mut self) -> &mut NetworkRegionTable {
        &mut self.core.network_region
    }

    pub fn add_observer(&mut self, observer: Box<dyn PitObserver>) {
        self.core.observers.push(observer);
    }

    pub fn faces(&self) -> &FaceTable {
        &self.core.faces
    }

    pub fn pit(&self) -> &Pit {
        &self.core.pit
    }

    pub fn fib(&self) -> &Fib {
        &self.core.fib
    }

    pub fn content_store(&self) -> &CS {
        &self.core.cs
    }

    pub fn dead_nonce_list(&self) -> &DeadNonceList {
        &self.core.dead_nonce_list
    }

    pub fn counters(&self) -> &ForwarderCounters {
        &self.core.counters
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.core.config
    }

    pub fn start_process_packet(&mut self, face: FaceId, packet: Packet) {
        match packet {
            Packet::Interest(interest) => self.start_process_interest(face, interest),
            Packet::Data(data) => self.start_process_data(face, data),
            Packet::Nack(nack) => self.start_process_nack(face, nack),
        }
    }

    pub fn start_process_interest(&mut self, face: FaceId, interest: Interest) {
        let link = match interest.decode_link() {
            Ok(link) => link,
            Err(e) => {
                debug!("startProcessInterest face={} interest={} {}", face, interest, e);
                return;
            }
        };
        self.on_incoming_interest(face, interest, link)
    }

    pub fn start_process_data(&mut self, face: FaceId, data: Data) {
        self.on_incoming_data(face, data)
    }

    pub fn start_process_nack(&mut self, face: FaceId, nack: Nack) {
        if let Err(e) = nack.interest.decode_link() {
            debug!("startProcessNack face={} nack={} {}", face, nack, e);
            return;
        }
        self.on_incoming_nack(face, nack)
    }

    /// Runs every timer that is due, earliest first.
    pub fn process_timers(&mut self) {
        loop {
            let now = self.core.now();
            let Some((id, event)) = self.core.scheduler.pop_due(now) else {
                break;
            };
            match event {
                TimerEvent::Unsatisfy(token) => {
                    let Some(entry) = self.core.pit.get_mut(token) else {
                        continue;
                    };
                    if entry.unsatisfy_timer != Some(id) {
                        continue;
                    }
                    entry.unsatisfy_timer = None;
                    self.on_interest_unsatisfied(token);
                }
                TimerEvent::Straggler {
                    entry: token,
                    satisfied,
                    data_freshness_ms,
                } => {
                    let Some(entry) = self.core.pit.get_mut(token) else {
                        continue;
                    };
                    if entry.straggler_timer != Some(id) {
                        continue;
                    }
                    entry.straggler_timer = None;
                    self.core
                        .on_interest_finalize(token, satisfied, data_freshness_ms);
                }
            }
        }
    }

    // When `process_timers` next has something to do
    pub fn next_timer_deadline(&mut self) -> Option<Timestamp> {
        self.core.scheduler.next_deadline()
    }

    fn dispatch_to_strategy<F>(&mut self, token: PitToken, f: F)
    where
        F: FnOnce(&mut dyn Strategy, &mut dyn StrategyHost),
    {
        let Some(name) = self.core.pit.get(token).map(|e| e.name().clone()) else {
            return;
        };
        let strategy = self.strategy_choice.find_effective_strategy(&name);
        trace!("dispatch strategy={} name={}", strategy.name(), name);
        f(strategy, &mut self.core)
    }

    fn on_incoming_interest(&mut self, in_face: FaceId, mut interest: Interest, link: Option<Link>) {
        let Some(scope) = self.core.faces.scope(in_face) else {
            warn!("onIncomingInterest face={} interest={} unknown face", in_face, interest);
            return;
        };
        interest.tags.incoming_face_id = Some(in_face);
        self.core.counters.n_in_interests += 1;
        debug!("onIncomingInterest face={} interest={}", in_face, interest);

        if scope == FaceScope::NonLocal && interest.name.is_localhost() {
            debug!(
                "onIncomingInterest face={} interest={} violates /localhost",
                in_face, interest
            );
            return;
        }

        let now = self.core.now();
        if self
            .core
            .dead_nonce_list
            .contains(&interest.name, interest.nonce, now)
        {
            self.core.on_interest_loop(in_face, &interest);
            return;
        }

        let (token, _) = self.core.pit.insert(&interest);
        let Some(entry) = self.core.pit.get(token) else {
            return;
        };
        let duplicate = entry.find_nonce(interest.nonce, in_face);
        let is_pending = !entry.in_records().is_empty();
        if !duplicate.is_empty() {
            trace!(
                "onIncomingInterest interest={} nonce={} seen as {:?}",
                interest,
                interest.nonce,
                duplicate
            );
            self.core.on_interest_loop(in_face, &interest);
            return;
        }

        self.core.cancel_timers(token);

        if !is_pending {
            if let Some(data) = self.core.cs.find(&interest, now) {
                self.core.counters.n_cs_hits += 1;
                self.on_content_store_hit(in_face, token, &interest, data);
                return;
            }
            self.core.counters.n_cs_misses += 1;
        }
        self.on_content_store_miss(in_face, token, interest, link)
    }

    fn on_content_store_miss(
        &mut self,
        in_face: FaceId,
        token: PitToken,
        mut interest: Interest,
        link: Option<Link>,
    ) {
        debug!("onContentStoreMiss interest={}", interest);

        // May pick a delegation, which the in-record has to carry onward
        let fib_entry = self.core.find_next_hops(&mut interest, link.as_ref());

        let now = self.core.now();
        let lifetime = interest.lifetime_or(self.core.config.default_interest_lifetime_ms);
        let Some(entry) = self.core.pit.get_mut(token) else {
            return;
        };
        entry.insert_or_update_in_record(in_face, &interest, now, lifetime);
        let latest_expiry = entry.latest_in_record_expiry();

        if interest.push {
            self.core.cancel_timers(token);
            self.core.arm_push_timer(token);
        } else if let Some(expiry) = latest_expiry {
            self.core.set_unsatisfy_timer(token, expiry);
        }

        self.dispatch_to_strategy(token, |strategy, host| {
            strategy.after_receive_interest(host, in_face, &interest, &fib_entry, token)
        });
    }

    fn on_content_store_hit(
        &mut self,
        in_face: FaceId,
        token: PitToken,
        interest: &Interest,
        mut data: Data,
    ) {
        debug!("onContentStoreHit interest={}", interest);

        data.tags.incoming_face_id = Some(FaceId::CONTENT_STORE);
        self.core
            .notify_before_satisfy(token, FaceId::CONTENT_STORE, &data);
        self.dispatch_to_strategy(token, |strategy, host| {
            strategy.before_satisfy_interest(host, token, FaceId::CONTENT_STORE, &data)
        });

        self.core
            .set_straggler_timer(token, true, data.freshness_period_ms);
        self.core.on_outgoing_data(in_face, &data.without_tags());
    }

    fn on_interest_unsatisfied(&mut self, token: PitToken) {
        if let Some(entry) = self.core.pit.get(token) {
            debug!("onInterestUnsatisfied interest={}", entry.interest());
        }
        self.core.notify_before_expire(token);
        self.dispatch_to_strategy(token, |strategy, host| {
            strategy.before_expire_pending_interest(host, token)
        });
        self.core.on_interest_finalize(token, false, None);
    }

    fn on_incoming_data(&mut self, in_face: FaceId, mut data: Data) {
        let Some(scope) = self.core.faces.scope(in_face) else {
            warn!("onIncomingData face={} data={} unknown face", in_face, data);
            return;
        };
        data.tags.incoming_face_id = Some(in_face);
        self.core.counters.n_in_data += 1;
        debug!("onIncomingData face={} data={}", in_face, data);

        if scope == FaceScope::NonLocal && data.name.is_localhost() {
            debug!("onIncomingData face={} data={} violates /localhost", in_face, data);
            return;
        }

        let matches = self.core.pit.find_all_data_matches(&data);
        if matches.is_empty() {
            self.on_data_unsolicited(in_face, scope, &data);
            return;
        }

        let now = self.core.now();
        let cached = data.without_tags();
        if !data.push {
            self.core.cs.insert(&cached, false, now);
        }

        let mut downstreams = BTreeSet::new();
        for token in matches {
            self.core.cancel_timers(token);
            let Some(entry) = self.core.pit.get(token) else {
                continue;
            };
            debug!("onIncomingData matching={}", entry.interest());
            downstreams.extend(
                entry
                    .in_records()
                    .iter()
                    .filter(|r| !r.is_expired(now))
                    .map(|r| r.face),
            );
            let is_push = entry.is_push();

            self.core
                .insert_dead_nonce_list(token, true, data.freshness_period_ms, Some(in_face));

            if is_push {
                // Stays pending for the Data that follows
                if let Some(record) = self
                    .core
                    .pit
                    .get_mut(token)
                    .and_then(|e| e.out_record_mut(in_face))
                {
                    record.record_received_data();
                }
                self.dispatch_to_strategy(token, |strategy, host| {
                    strategy.before_satisfy_interest(host, token, in_face, &data)
                });
                self.core.arm_push_timer(token);
            } else {
                self.core.notify_before_satisfy(token, in_face, &data);
                self.dispatch_to_strategy(token, |strategy, host| {
                    strategy.before_satisfy_interest(host, token, in_face, &data)
                });
                if let Some(entry) = self.core.pit.get_mut(token) {
                    entry.clear_in_records();
                    entry.delete_out_record(in_face);
                }
                self.core
                    .set_straggler_timer(token, true, data.freshness_period_ms);
            }
        }

        for face in downstreams {
            if face == in_face {
                continue;
            }
            self.core.on_outgoing_data(face, &cached);
        }
    }

    fn on_data_unsolicited(&mut self, in_face: FaceId, scope: FaceScope, data: &Data) {
        self.core.counters.n_unsolicited_data += 1;
        let accept = scope == FaceScope::Local;
        debug!(
            "onDataUnsolicited face={} data={} {}",
            in_face,
            data,
            if accept { "cached" } else { "dropped" }
        );
        if accept {
            let now = self.core.now();
            self.core.cs.insert(&data.without_tags(), true, now);
        }
    }

    fn on_incoming_nack(&mut self, in_face: FaceId, mut nack: Nack) {
        let Some(link_type) = self.core.faces.link_type(in_face) else {
            warn!("onIncomingNack face={} nack={} unknown face", in_face, nack);
            return;
        };
        nack.tags.incoming_face_id = Some(in_face);
        self.core.counters.n_in_nacks += 1;
        debug!("onIncomingNack face={} nack={}", in_face, nack);

        if link_type == LinkType::MultiAccess {
            debug!("onIncomingNack face={} nack={} face is multi-access", in_face, nack);
            return;
        }

        let Some(token) = self.core.pit.find(&nack.interest) else {
            debug!("onIncomingNack face={} nack={} no PIT entry", in_face, nack);
            return;
        };
        let Some(entry) = self.core.pit.get_mut(token) else {
            return;
        };
        let Some(out_record) = entry.out_record_mut(in_face) else {
            debug!("onIncomingNack face={} nack={} no out-record", in_face, nack);
            return;
        };
        let last_nonce = out_record.last_nonce;
        if !out_record.set_incoming_nack(&nack) {
            debug!(
                "onIncomingNack face={} nack={} nonce={} last-sent nonce={}",
                in_face,
                nack,
                nack.nonce(),
                last_nonce
            );
            return;
        }

        let fib_entry = self.core.fib.find_longest_prefix_match(entry.name());
        self.dispatch_to_strategy(token, |strategy, host| {
            strategy.after_receive_nack(host, in_face, &nack, &fib_entry, token)
        });
    }
}

impl<C, CS> Core<C, CS>
where
    C: Clock,
    CS: ContentStore,
{
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn find_next_hops(&self, interest: &mut Interest, link: Option<&Link>) -> FibEntry {
        let Some(link) = link else {
            return self.fib.find_longest_prefix_match(&interest.name);
        };
        if self.network_region.is_in_producer_region(link) {
            return self.fib.find_longest_prefix_match(&interest.name);
        }
        if let Some(delegation) = &interest.selected_delegation {
            return self.fib.find_longest_prefix_match(delegation);
        }
        let Some(first) = link.delegations().first() else {
            return self.fib.find_longest_prefix_match(&interest.name);
        };

        let mut fib_entry = self.fib.find_longest_prefix_match(&first.name);
        // Only a default route with next hops means we are in a consumer region
        let is_default_free_zone = !(fib_entry.prefix().is_empty() && fib_entry.has_next_hops());
        if !is_default_free_zone {
            return fib_entry;
        }

        for delegation in link.delegations() {
            fib_entry = self.fib.find_longest_prefix_match(&delegation.name);
            if fib_entry.has_next_hops() {
                debug!(
                    "findNextHops interest={} selected delegation={}",
                    interest, delegation.name
                );
                interest.selected_delegation = Some(delegation.name.clone());
                break;
            }
        }
        fib_entry
    }

    fn cancel_timers(&mut self, token: PitToken) {
        let Some(entry) = self.pit.get_mut(token) else {
            return;
        };
        for id in [entry.unsatisfy_timer.take(), entry.straggler_timer.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(id);
        }
    }

    // Fires when the last downstream stops waiting
    fn set_unsatisfy_timer(&mut self, token: PitToken, fire_at: Timestamp) {
        let now = self.now();
        let Some(entry) = self.pit.get_mut(token) else {
            return;
        };
        if let Some(old) = entry.unsatisfy_timer.take() {
            self.scheduler.cancel(old);
        }
        let delay = fire_at.remaining_from(now);
        entry.unsatisfy_timer = Some(
            self.scheduler
                .schedule(now, delay, TimerEvent::Unsatisfy(token)),
        );
    }

    // Downstreams of a push entry stay reachable for as long as the entry lives
    fn arm_push_timer(&mut self, token: PitToken) {
        let now = self.now();
        let lifetime = self.config.push_interest_lifetime_ms;
        let deadline = lifetime.map_or(Timestamp::MAX, |ms| now.adding(ms));
        let Some(entry) = self.pit.get_mut(token) else {
            return;
        };
        entry.extend_in_records(deadline);
        if lifetime.is_some() {
            self.set_unsatisfy_timer(token, deadline);
        }
    }

    fn set_straggler_timer(&mut self, token: PitToken, satisfied: bool, data_freshness_ms: Option<u64>) {
        let now = self.now();
        let delay = self.config.straggler_delay_ms;
        let Some(entry) = self.pit.get_mut(token) else {
            return;
        };
        if let Some(old) = entry.straggler_timer.take() {
            self.scheduler.cancel(old);
        }
        let event = TimerEvent::Straggler {
            entry: token,
            satisfied,
            data_freshness_ms,
        };
        entry.straggler_timer = Some(self.scheduler.schedule(now, delay, event));
    }

    fn notify_before_satisfy(&mut self, token: PitToken, in_face: FaceId, data: &Data) {
        let Some(entry) = self.pit.get(token) else {
            return;
        };
        for observer in self.observers.iter_mut() {
            observer.before_satisfy_interest(entry, in_face, data);
        }
    }

    fn notify_before_expire(&mut self, token: PitToken) {
        let Some(entry) = self.pit.get(token) else {
            return;
        };
        for observer in self.observers.iter_mut() {
            observer.before_expire_pending_interest(entry);
        }
    }

    fn send_to_face<F>(&mut self, id: FaceId, send: F) -> Result<(), Error>
    where
        F: FnOnce(&mut dyn Face) -> Result<(), FaceError>,
    {
        let face = self.faces.get_mut(id).ok_or(Error::UnknownFace(id))?;
        send(face).map_err(|_| Error::FaceDisconnected(id))
    }

    // A looping Interest is answered directly, it has no in-record to Nack through
    fn on_interest_loop(&mut self, in_face: FaceId, interest: &Interest) {
        if self.faces.link_type(in_face) == Some(LinkType::MultiAccess) {
            debug!(
                "onInterestLoop face={} interest={} drop on multi-access face",
                in_face, interest
            );
            return;
        }
        debug!(
            "onInterestLoop face={} interest={} send Nack Duplicate",
            in_face, interest
        );

        let mut looped = interest.clone();
        looped.tags = PacketTags::default();
        let nack = Nack::new(looped, NackReason::Duplicate);
        if let Err(e) = self.send_to_face(in_face, |face| face.send_nack(&nack)) {
            warn!("onInterestLoop face={} nack={} {}", in_face, nack, e);
        }
    }

    fn on_outgoing_interest(&mut self, token: PitToken, out_face: FaceId, want_new_nonce: bool) {
        if !out_face.is_valid() || !self.faces.contains(out_face) {
            warn!("onOutgoingInterest face={} invalid face", out_face);
            return;
        }
        let now = self.now();
        let default_lifetime = self.config.default_interest_lifetime_ms;
        let Some(entry) = self.pit.get_mut(token) else {
            return;
        };
        if entry.violates_scope(out_face, &self.faces) {
            debug!(
                "onOutgoingInterest face={} interest={} violates scope",
                out_face,
                entry.interest()
            );
            return;
        }

        // The most recently renewed copy from another downstream, if any
        let chosen = entry
            .in_records()
            .iter()
            .filter(|r| r.face != out_face)
            .fold(None, |best: Option<&InRecord>, r| match best {
                Some(b) if b.last_renewed >= r.last_renewed => Some(b),
                _ => Some(r),
            })
            .or_else(|| entry.in_record(out_face));
        let Some(in_record) = chosen else {
            debug!(
                "onOutgoingInterest face={} interest={} no in-record",
                out_face,
                entry.interest()
            );
            return;
        };

        let mut interest = in_record.interest.clone();
        if want_new_nonce {
            interest.refresh_nonce();
        }
        interest.tags = PacketTags::default();
        let lifetime = interest.lifetime_or(default_lifetime);
        entry.insert_or_update_out_record(out_face, &interest, now, lifetime);

        debug!(
            "onOutgoingInterest face={} interest={} nonce={}",
            out_face, interest, interest.nonce
        );
        match self.send_to_face(out_face, |face| face.send_interest(&interest)) {
            Ok(()) => self.counters.n_out_interests += 1,
            Err(e) => warn!("onOutgoingInterest face={} interest={} {}", out_face, interest, e),
        }
    }

    fn on_interest_reject(&mut self, token: PitToken) {
        let now = self.now();
        let Some(entry) = self.pit.get(token) else {
            return;
        };
        if entry.has_unexpired_out_records(now) {
            error!(
                "onInterestReject interest={} cannot reject forwarded Interest",
                entry.interest()
            );
            return;
        }
        debug!("onInterestReject interest={}", entry.interest());

        self.cancel_timers(token);
        self.set_straggler_timer(token, false, None);
    }

    fn on_interest_finalize(&mut self, token: PitToken, satisfied: bool, data_freshness_ms: Option<u64>) {
        let Some(entry) = self.pit.get(token) else {
            return;
        };
        debug!(
            "onInterestFinalize interest={} {}",
            entry.interest(),
            if satisfied { "satisfied" } else { "unsatisfied" }
        );

        self.insert_dead_nonce_list(token, satisfied, data_freshness_ms, None);
        if satisfied {
            self.counters.n_satisfied_interests += 1;
        } else {
            self.counters.n_unsatisfied_interests += 1;
        }

        self.cancel_timers(token);
        self.pit.erase(token);
    }

    // With `upstream`, only the nonce last sent to that face is recorded,
    //  otherwise the nonce of every out-record
    fn insert_dead_nonce_list(
        &mut self,
        token: PitToken,
        satisfied: bool,
        data_freshness_ms: Option<u64>,
        upstream: Option<FaceId>,
    ) {
        let now = self.now();
        let Some(entry) = self.pit.get(token) else {
            return;
        };
        let needed = !satisfied
            || (entry.interest().must_be_fresh
                && data_freshness_ms.map_or(false, |f| f < self.dead_nonce_list.lifetime_ms()));
        if !needed {
            return;
        }

        match upstream {
            None => {
                for record in entry.out_records() {
                    self.dead_nonce_list
                        .insert(entry.name(), record.last_nonce, now);
                }
            }
            Some(face) => {
                if let Some(record) = entry.out_record(face) {
                    self.dead_nonce_list
                        .insert(entry.name(), record.last_nonce, now);
                }
            }
        }
    }

    fn on_outgoing_data(&mut self, out_face: FaceId, data: &Data) {
        if !out_face.is_valid() {
            warn!("onOutgoingData face={} data={} invalid face", out_face, data);
            return;
        }
        let Some(scope) = self.faces.scope(out_face) else {
            warn!("onOutgoingData face={} data={} unknown face", out_face, data);
            return;
        };
        if scope == FaceScope::NonLocal && data.name.is_localhost() {
            debug!("onOutgoingData face={} data={} violates /localhost", out_face, data);
            return;
        }

        debug!("onOutgoingData face={} data={}", out_face, data);
        match self.send_to_face(out_face, |face| face.send_data(data)) {
            Ok(()) => self.counters.n_out_data += 1,
            Err(e) => warn!("onOutgoingData face={} data={} {}", out_face, data, e),
        }
    }

    fn on_outgoing_nack(&mut self, token: PitToken, out_face: FaceId, reason: NackReason) {
        if !out_face.is_valid() {
            warn!("onOutgoingNack face={} invalid face", out_face);
            return;
        }
        let Some(link_type) = self.faces.link_type(out_face) else {
            warn!("onOutgoingNack face={} unknown face", out_face);
            return;
        };
        let Some(entry) = self.pit.get_mut(token) else {
            return;
        };
        let Some(in_record) = entry.in_record(out_face) else {
            debug!(
                "onOutgoingNack face={} interest={} no in-record",
                out_face,
                entry.interest()
            );
            return;
        };
        if link_type == LinkType::MultiAccess {
            debug!(
                "onOutgoingNack face={} interest={} face is multi-access",
                out_face,
                entry.interest()
            );
            return;
        }

        let mut interest = in_record.interest.clone();
        interest.tags = PacketTags::default();
        let nack = Nack::new(interest, reason);
        entry.delete_in_record(out_face);

        debug!("onOutgoingNack face={} nack={}", out_face, nack);
        match self.send_to_face(out_face, |face| face.send_nack(&nack)) {
            Ok(()) => self.counters.n_out_nacks += 1,
            Err(e) => warn!("onOutgoingNack face={} nack={} {}", out_face, nack, e),
        }
    }
}

impl<C, CS> StrategyHost for Core<C, CS>
where
    C: Clock,
    CS: ContentStore,
{
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn pit_entry(&self, entry: PitToken) -> Option<&Entry> {
        self.pit.get(entry)
    }

    fn can_forward_to(&self, entry: PitToken, face: FaceId) -> bool {
        let now = self.clock.now();
        self.faces.contains(face)
            && self
                .pit
                .get(entry)
                .map_or(false, |e| e.can_forward_to(face, now, &self.faces))
    }

    fn send_interest(&mut self, entry: PitToken, face: FaceId, want_new_nonce: bool) {
        self.on_outgoing_interest(entry, face, want_new_nonce)
    }

    fn send_nack(&mut self, entry: PitToken, face: FaceId, reason: NackReason) {
        self.on_outgoing_nack(entry, face, reason)
    }

    fn reject_pending_interest(&mut self, entry: PitToken) {
        self.on_interest_reject(entry)
    }
}

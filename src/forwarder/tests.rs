use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use super::{Forwarder, ForwarderConfig, PitObserver};
use crate::{
    clock::{Clock, ManualClock},
    face::{testing::RecordingFace, FaceId, FaceScope, LinkType},
    name::Name,
    packet::{Data, Interest, Link, Nack, NackReason, Packet},
    strategy::{BestRouteStrategy, Strategy, StrategyHost},
    tables::{cs::ContentStore, cs::MemoryContentStore, fib::FibEntry, pit::Entry, pit::PitToken},
    timestamp::Timestamp,
};

type Sent = Rc<RefCell<Vec<Packet>>>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn name(s: &str) -> Name {
    s.parse().unwrap()
}

fn forwarder() -> (ManualClock, Forwarder<ManualClock, MemoryContentStore>) {
    init_logger();
    let clock = ManualClock::new(Timestamp::ZERO);
    let fwd = Forwarder::with_config(clock.clone(), ForwarderConfig::default());
    (clock, fwd)
}

fn add_face(
    fwd: &mut Forwarder<ManualClock, MemoryContentStore>,
    scope: FaceScope,
    link_type: LinkType,
) -> (FaceId, Sent) {
    let (face, sent) = RecordingFace::new(scope, link_type);
    (fwd.add_face(Box::new(face)).unwrap(), sent)
}

fn remote_face(fwd: &mut Forwarder<ManualClock, MemoryContentStore>) -> (FaceId, Sent) {
    add_face(fwd, FaceScope::NonLocal, LinkType::PointToPoint)
}

fn interests(sent: &Sent) -> Vec<Interest> {
    sent.borrow()
        .iter()
        .filter_map(|p| match p {
            Packet::Interest(i) => Some(i.clone()),
            _ => None,
        })
        .collect()
}

fn data(sent: &Sent) -> Vec<Data> {
    sent.borrow()
        .iter()
        .filter_map(|p| match p {
            Packet::Data(d) => Some(d.clone()),
            _ => None,
        })
        .collect()
}

fn nacks(sent: &Sent) -> Vec<Nack> {
    sent.borrow()
        .iter()
        .filter_map(|p| match p {
            Packet::Nack(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}

#[derive(Clone, Default)]
struct CountingObserver {
    satisfied: Rc<Cell<u32>>,
    expired: Rc<Cell<u32>>,
}

impl PitObserver for CountingObserver {
    fn before_satisfy_interest(&mut self, _entry: &Entry, _in_face: FaceId, _data: &Data) {
        self.satisfied.set(self.satisfied.get() + 1);
    }

    fn before_expire_pending_interest(&mut self, _entry: &Entry) {
        self.expired.set(self.expired.get() + 1);
    }
}

// Best-route forwarding that also notes which hooks ran
struct RecordingStrategy {
    inner: BestRouteStrategy,
    events: Rc<RefCell<Vec<&'static str>>>,
}

impl Strategy for RecordingStrategy {
    fn name(&self) -> &str {
        "recording"
    }

    fn after_receive_interest(
        &mut self,
        host: &mut dyn StrategyHost,
        in_face: FaceId,
        interest: &Interest,
        fib_entry: &FibEntry,
        entry: PitToken,
    ) {
        self.events.borrow_mut().push("interest");
        self.inner
            .after_receive_interest(host, in_face, interest, fib_entry, entry)
    }

    fn before_satisfy_interest(
        &mut self,
        _host: &mut dyn StrategyHost,
        _entry: PitToken,
        _in_face: FaceId,
        _data: &Data,
    ) {
        self.events.borrow_mut().push("satisfy");
    }

    fn before_expire_pending_interest(&mut self, _host: &mut dyn StrategyHost, _entry: PitToken) {
        self.events.borrow_mut().push("expire");
    }
}

#[test]
fn test_interest_forwarded_to_next_hop() {
    let (_clock, mut fwd) = forwarder();
    let (f1, _sent1) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    let interest = Interest::new(name("/a/b")).with_nonce(1);
    fwd.start_process_interest(f1, interest.clone());

    let forwarded = interests(&sent2);
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].name, name("/a/b"));
    assert_eq!(forwarded[0].nonce, 1);
    assert_eq!(forwarded[0].tags.incoming_face_id, None);

    let token = fwd.pit().find(&interest).unwrap();
    let entry = fwd.pit().get(token).unwrap();
    assert_eq!(entry.in_records().len(), 1);
    assert_eq!(entry.in_records()[0].face, f1);
    assert_eq!(entry.out_records().len(), 1);
    assert_eq!(entry.out_records()[0].face, f2);
    assert!(entry.unsatisfy_timer.is_some());
    assert!(entry.straggler_timer.is_none());

    assert_eq!(fwd.counters().n_in_interests, 1);
    assert_eq!(fwd.counters().n_out_interests, 1);
    assert_eq!(fwd.counters().n_cs_misses, 1);
    assert_eq!(fwd.next_timer_deadline(), Some(Timestamp::from_ms(4000)));
}

#[test]
fn test_unsatisfy_timer_follows_latest_in_record() {
    let (clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);
    let (f2, _) = remote_face(&mut fwd);
    let (f3, _) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    fwd.start_process_interest(f1, Interest::new(name("/a/b")).with_nonce(1));
    clock.advance(1000);
    fwd.start_process_interest(
        f3,
        Interest::new(name("/a/b")).with_nonce(2).with_lifetime(6000),
    );
    assert_eq!(fwd.next_timer_deadline(), Some(Timestamp::from_ms(7000)));
    // Aggregated, not sent again
    assert_eq!(fwd.counters().n_out_interests, 1);
}

#[test]
fn test_data_satisfies_pending_interest() {
    let (clock, mut fwd) = forwarder();
    let observer = CountingObserver::default();
    fwd.add_observer(Box::new(observer.clone()));
    let (f1, sent1) = remote_face(&mut fwd);
    let (f2, _sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    let interest = Interest::new(name("/a/b")).with_nonce(1);
    fwd.start_process_interest(f1, interest.clone());
    fwd.start_process_data(f2, Data::new(name("/a/b"), b"hello"));

    let delivered = data(&sent1);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].content, b"hello");
    assert_eq!(delivered[0].tags.incoming_face_id, None);
    assert_eq!(fwd.counters().n_in_data, 1);
    assert_eq!(fwd.counters().n_out_data, 1);
    assert_eq!(fwd.content_store().len(), 1);
    assert_eq!(observer.satisfied.get(), 1);

    let token = fwd.pit().find(&interest).unwrap();
    let entry = fwd.pit().get(token).unwrap();
    assert!(entry.in_records().is_empty());
    assert!(entry.out_record(f2).is_none());
    assert!(entry.unsatisfy_timer.is_none());
    assert!(entry.straggler_timer.is_some());

    clock.advance(100);
    fwd.process_timers();
    assert!(fwd.pit().is_empty());
    assert_eq!(fwd.counters().n_satisfied_interests, 1);
    assert_eq!(observer.expired.get(), 0);
}

#[test]
fn test_straggler_timer_fires_once() {
    let (clock, mut fwd) = forwarder();
    let (f1, sent1) = remote_face(&mut fwd);
    let (f2, _) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    fwd.start_process_interest(f1, Interest::new(name("/a/b")).with_nonce(1));
    fwd.start_process_data(f2, Data::new(name("/a/b"), b"x"));

    // A straggling copy restarts the delay but reaches nobody
    clock.advance(50);
    fwd.start_process_data(f2, Data::new(name("/a/b"), b"x"));
    assert_eq!(data(&sent1).len(), 1);

    clock.advance(50);
    fwd.process_timers();
    assert_eq!(fwd.pit().len(), 1);

    clock.advance(50);
    fwd.process_timers();
    assert!(fwd.pit().is_empty());

    clock.advance(1000);
    fwd.process_timers();
    assert_eq!(fwd.counters().n_satisfied_interests, 1);
    assert_eq!(fwd.counters().n_unsatisfied_interests, 0);
    assert_eq!(fwd.next_timer_deadline(), None);
}

#[test]
fn test_content_store_hit() {
    let (clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    let (f3, sent3) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    fwd.start_process_interest(f1, Interest::new(name("/a/b")).with_nonce(1));
    fwd.start_process_data(f2, Data::new(name("/a/b"), b"cached").with_freshness_period(10_000));
    clock.advance(100);
    fwd.process_timers();
    assert!(fwd.pit().is_empty());

    fwd.start_process_interest(f3, Interest::new(name("/a/b")).with_nonce(5));
    let delivered = data(&sent3);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].content, b"cached");
    assert_eq!(delivered[0].tags.incoming_face_id, None);
    assert_eq!(interests(&sent2).len(), 1);
    assert_eq!(fwd.counters().n_cs_hits, 1);

    // The entry only lingers for the straggler delay
    assert_eq!(fwd.pit().len(), 1);
    clock.advance(100);
    fwd.process_timers();
    assert!(fwd.pit().is_empty());
    assert_eq!(fwd.counters().n_satisfied_interests, 2);
}

#[test]
fn test_data_sent_once_per_downstream() {
    let (_clock, mut fwd) = forwarder();
    let (f1, sent1) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    let (f3, sent3) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    fwd.start_process_interest(f1, Interest::new(name("/a/b")).with_nonce(1));
    fwd.start_process_interest(f3, Interest::new(name("/a/b")).with_nonce(2));
    fwd.start_process_interest(
        f1,
        Interest::new(name("/a")).with_can_be_prefix(true).with_nonce(3),
    );
    assert_eq!(fwd.pit().len(), 2);
    assert_eq!(interests(&sent2).len(), 2);

    fwd.start_process_data(f2, Data::new(name("/a/b"), b"x"));
    assert_eq!(data(&sent1).len(), 1);
    assert_eq!(data(&sent3).len(), 1);
    assert!(data(&sent2).is_empty());
    assert_eq!(fwd.counters().n_out_data, 2);
}

#[test]
fn test_same_nonce_retransmission_is_nacked() {
    let (_clock, mut fwd) = forwarder();
    let (f1, sent1) = remote_face(&mut fwd);
    let (f2, _) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    let interest = Interest::new(name("/a/b")).with_nonce(7);
    fwd.start_process_interest(f1, interest.clone());
    fwd.start_process_interest(f1, interest.clone());

    let sent = nacks(&sent1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reason, NackReason::Duplicate);
    assert_eq!(sent[0].nonce(), 7);

    let entry = fwd.pit().get(fwd.pit().find(&interest).unwrap()).unwrap();
    assert_eq!(entry.in_records().len(), 1);
    assert_eq!(fwd.counters().n_in_interests, 2);
    assert_eq!(fwd.counters().n_out_interests, 1);
}

#[test]
fn test_dead_nonce_list_catches_loop_after_expiry() {
    let (clock, mut fwd) = forwarder();
    let observer = CountingObserver::default();
    fwd.add_observer(Box::new(observer.clone()));
    let (f1, _) = remote_face(&mut fwd);
    let (f2, _) = remote_face(&mut fwd);
    let (f3, sent3) = remote_face(&mut fwd);
    fwd.add_route(&name("/x"), f2, 10).unwrap();

    fwd.start_process_interest(f1, Interest::new(name("/x")).with_nonce(9));
    clock.advance(4000);
    fwd.process_timers();

    assert!(fwd.pit().is_empty());
    assert_eq!(observer.expired.get(), 1);
    assert_eq!(fwd.counters().n_unsatisfied_interests, 1);
    assert!(fwd
        .dead_nonce_list()
        .contains(&name("/x"), 9, Timestamp::from_ms(4000)));

    // The same Interest coming back is a loop even without a PIT entry
    fwd.start_process_interest(f3, Interest::new(name("/x")).with_nonce(9));
    let sent = nacks(&sent3);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reason, NackReason::Duplicate);
    assert!(fwd.pit().is_empty());
    assert_eq!(fwd.counters().n_out_interests, 1);
}

#[test]
fn test_satisfied_interest_dead_nonce_policy() {
    let (clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);
    let (f2, _) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    // Must-be-fresh with short-lived Data is remembered
    fwd.start_process_interest(
        f1,
        Interest::new(name("/a/fresh")).with_must_be_fresh(true).with_nonce(1),
    );
    fwd.start_process_data(f2, Data::new(name("/a/fresh"), b"x").with_freshness_period(1000));

    // Anything else is not
    fwd.start_process_interest(f1, Interest::new(name("/a/plain")).with_nonce(2));
    fwd.start_process_data(f2, Data::new(name("/a/plain"), b"x").with_freshness_period(1000));

    clock.advance(100);
    fwd.process_timers();
    let now = Timestamp::from_ms(100);
    assert!(fwd.dead_nonce_list().contains(&name("/a/fresh"), 1, now));
    assert!(!fwd.dead_nonce_list().contains(&name("/a/plain"), 2, now));
}

#[test]
fn test_push_interest_receives_multiple_data() {
    let (clock, mut fwd) = forwarder();
    let events = Rc::new(RefCell::new(Vec::new()));
    let recorded = events.clone();
    fwd.strategy_choice_mut().install("recording", move || {
        Box::new(RecordingStrategy {
            inner: BestRouteStrategy::new(),
            events: recorded.clone(),
        })
    });
    fwd.set_strategy(&name("/live"), "recording").unwrap();

    let (f1, sent1) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/live"), f2, 10).unwrap();

    let interest = Interest::new(name("/live/feed"))
        .with_push(true)
        .with_nonce(11)
        .with_lifetime(10_000);
    fwd.start_process_interest(f1, interest.clone());
    assert_eq!(interests(&sent2).len(), 1);

    fwd.start_process_data(f2, Data::new(name("/live/feed"), b"1").with_push(true));
    clock.advance(1000);
    fwd.start_process_data(f2, Data::new(name("/live/feed"), b"2").with_push(true));

    let delivered = data(&sent1);
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].content, b"1");
    assert_eq!(delivered[1].content, b"2");

    let token = fwd.pit().find(&interest).unwrap();
    let entry = fwd.pit().get(token).unwrap();
    assert_eq!(entry.in_records().len(), 1);
    assert_eq!(entry.out_record(f2).unwrap().received_data(), 2);
    assert!(entry.straggler_timer.is_none());
    // Push Data is not cached
    assert!(fwd.content_store().is_empty());
    assert_eq!(*events.borrow(), ["interest", "satisfy", "satisfy"]);

    // Nothing more arrives: the entry goes away a push lifetime after the last Data
    clock.advance(59_999);
    fwd.process_timers();
    assert_eq!(fwd.pit().len(), 1);
    clock.advance(1);
    fwd.process_timers();
    assert!(fwd.pit().is_empty());
    assert_eq!(fwd.counters().n_unsatisfied_interests, 1);
    assert_eq!(events.borrow().last(), Some(&"expire"));
}

#[test]
fn test_push_downstream_outlives_interest_lifetime() {
    let (clock, mut fwd) = forwarder();
    let (f1, sent1) = remote_face(&mut fwd);
    let (f2, _sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/live"), f2, 10).unwrap();

    let interest = Interest::new(name("/live/feed"))
        .with_push(true)
        .with_nonce(21);
    fwd.start_process_interest(f1, interest.clone());
    fwd.start_process_data(f2, Data::new(name("/live/feed"), b"1").with_push(true));

    // Past the default Interest lifetime, well before the push deadline
    clock.advance(5000);
    fwd.process_timers();
    fwd.start_process_data(f2, Data::new(name("/live/feed"), b"2").with_push(true));

    let delivered = data(&sent1);
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[1].content, b"2");

    let token = fwd.pit().find(&interest).unwrap();
    let entry = fwd.pit().get(token).unwrap();
    assert_eq!(entry.out_record(f2).unwrap().received_data(), 2);
    assert_eq!(
        entry.in_record(f1).unwrap().expiry,
        Timestamp::from_ms(5000 + 60_000)
    );
}

#[test]
fn test_push_and_plain_interests_use_separate_entries() {
    let (clock, mut fwd) = forwarder();
    let (f1, sent1) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    let (f3, sent3) = remote_face(&mut fwd);
    fwd.add_route(&name("/live"), f2, 10).unwrap();

    let plain = Interest::new(name("/live/feed")).with_nonce(1);
    let push = Interest::new(name("/live/feed"))
        .with_push(true)
        .with_nonce(2);
    fwd.start_process_interest(f1, plain.clone());
    fwd.start_process_interest(f3, push.clone());
    assert_eq!(fwd.pit().len(), 2);
    assert_eq!(interests(&sent2).len(), 2);

    let push_token = fwd.pit().find(&push).unwrap();
    let push_entry = fwd.pit().get(push_token).unwrap();
    assert!(push_entry.is_push());
    assert!(push_entry.unsatisfy_timer.is_some());
    assert!(fwd.pit().find(&plain).unwrap() != push_token);

    fwd.start_process_data(f2, Data::new(name("/live/feed"), b"1").with_push(true));
    clock.advance(500);
    fwd.process_timers();
    fwd.start_process_data(f2, Data::new(name("/live/feed"), b"2").with_push(true));

    // The plain consumer is done after one Data, the push consumer keeps receiving
    assert_eq!(data(&sent1).len(), 1);
    assert_eq!(data(&sent3).len(), 2);
    assert!(fwd.pit().find(&plain).is_none());
    let push_entry = fwd.pit().get(push_token).unwrap();
    assert_eq!(push_entry.in_records().len(), 1);
    assert!(push_entry.straggler_timer.is_none());
}

// Forwards like best-route, then tries to give up on the Interest anyway
struct RejectAfterForwardStrategy {
    inner: BestRouteStrategy,
}

impl Strategy for RejectAfterForwardStrategy {
    fn name(&self) -> &str {
        "reject-after-forward"
    }

    fn after_receive_interest(
        &mut self,
        host: &mut dyn StrategyHost,
        in_face: FaceId,
        interest: &Interest,
        fib_entry: &FibEntry,
        entry: PitToken,
    ) {
        self.inner
            .after_receive_interest(host, in_face, interest, fib_entry, entry);
        host.reject_pending_interest(entry);
    }
}

#[test]
fn test_reject_refused_while_forwarded() {
    let (clock, mut fwd) = forwarder();
    fwd.strategy_choice_mut()
        .install("reject-after-forward", || {
            Box::new(RejectAfterForwardStrategy {
                inner: BestRouteStrategy::new(),
            })
        });
    fwd.set_strategy(&name("/a"), "reject-after-forward").unwrap();

    let (f1, _sent1) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    let interest = Interest::new(name("/a/b")).with_nonce(5);
    fwd.start_process_interest(f1, interest.clone());
    assert_eq!(interests(&sent2).len(), 1);

    // The live out-record keeps the entry pending with its unsatisfy timer
    let token = fwd.pit().find(&interest).unwrap();
    let entry = fwd.pit().get(token).unwrap();
    assert_eq!(entry.in_records().len(), 1);
    assert!(entry.out_record(f2).is_some());
    assert!(entry.unsatisfy_timer.is_some());
    assert!(entry.straggler_timer.is_none());
    assert_eq!(
        fwd.next_timer_deadline(),
        Some(Timestamp::from_ms(4000))
    );

    clock.advance(4000);
    fwd.process_timers();
    assert!(fwd.pit().is_empty());
    assert_eq!(fwd.counters().n_unsatisfied_interests, 1);
}

#[test]
fn test_nack_with_stale_nonce_is_ignored() {
    let (clock, mut fwd) = forwarder();
    let (f1, sent1) = remote_face(&mut fwd);
    let (f2, _) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    let interest = Interest::new(name("/a/b")).with_nonce(1);
    fwd.start_process_interest(f1, interest.clone());

    let stale = Nack::new(interest.clone().with_nonce(2), NackReason::Congestion);
    fwd.start_process_nack(f2, stale);
    let token = fwd.pit().find(&interest).unwrap();
    let entry = fwd.pit().get(token).unwrap();
    assert_eq!(entry.out_record(f2).unwrap().incoming_nack(), None);
    assert!(nacks(&sent1).is_empty());
    assert_eq!(fwd.counters().n_in_nacks, 1);

    fwd.start_process_nack(f2, Nack::new(interest.clone(), NackReason::NoRoute));
    let sent = nacks(&sent1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reason, NackReason::NoRoute);
    assert_eq!(sent[0].nonce(), 1);
    assert_eq!(fwd.counters().n_out_nacks, 1);
    assert!(fwd.pit().get(token).unwrap().in_records().is_empty());

    clock.advance(4000);
    fwd.process_timers();
    assert!(fwd.pit().is_empty());
}

#[test]
fn test_multi_access_faces() {
    let (_clock, mut fwd) = forwarder();
    let (m, sent_m) = add_face(&mut fwd, FaceScope::NonLocal, LinkType::MultiAccess);
    let (f2, sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();
    fwd.add_route(&name("/b"), m, 10).unwrap();

    // Loops are dropped silently on broadcast media
    let looping = Interest::new(name("/a/1")).with_nonce(3);
    fwd.start_process_interest(m, looping.clone());
    fwd.start_process_interest(m, looping);
    assert!(sent_m.borrow().is_empty());
    assert_eq!(interests(&sent2).len(), 1);

    // Nacks received on a multi-access face are not trusted
    let upstream = Interest::new(name("/b/1")).with_nonce(4);
    fwd.start_process_interest(f2, upstream.clone());
    assert_eq!(interests(&sent_m).len(), 1);
    fwd.start_process_nack(m, Nack::new(upstream.clone(), NackReason::NoRoute));
    let token = fwd.pit().find(&upstream).unwrap();
    assert_eq!(
        fwd.pit().get(token).unwrap().out_record(m).unwrap().incoming_nack(),
        None
    );
    assert!(nacks(&sent2).is_empty());

    // And none are sent there either
    fwd.start_process_interest(m, Interest::new(name("/c/1")).with_nonce(5));
    assert_eq!(sent_m.borrow().len(), 1);
    assert_eq!(fwd.counters().n_out_nacks, 0);
}

#[test]
fn test_no_route_nacks_downstream() {
    let (_clock, mut fwd) = forwarder();
    let (f1, sent1) = remote_face(&mut fwd);

    fwd.start_process_interest(f1, Interest::new(name("/nowhere")).with_nonce(1));
    let sent = nacks(&sent1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reason, NackReason::NoRoute);

    let entry = fwd
        .pit()
        .get(fwd.pit().tokens()[0])
        .unwrap();
    assert!(entry.in_records().is_empty());
    assert!(entry.unsatisfy_timer.is_none());
    assert!(entry.straggler_timer.is_some());
}

#[test]
fn test_malformed_link_is_dropped() {
    let (_clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);

    let mut truncated = Interest::new(name("/a"));
    truncated.link = Some(vec![0xFF]);
    fwd.start_process_interest(f1, truncated);

    let mut empty = Interest::new(name("/a"));
    empty.link = Some(Vec::new());
    fwd.start_process_packet(f1, Packet::Interest(empty));

    assert_eq!(fwd.counters().n_in_interests, 0);
    assert!(fwd.pit().is_empty());
}

#[test]
fn test_unknown_face_is_dropped() {
    let (_clock, mut fwd) = forwarder();
    fwd.start_process_interest(FaceId(999), Interest::new(name("/a")));
    fwd.start_process_data(FaceId::INVALID, Data::new(name("/a"), b"x"));
    assert_eq!(fwd.counters().n_in_interests, 0);
    assert_eq!(fwd.counters().n_in_data, 0);
    assert!(fwd.add_route(&name("/a"), FaceId(999), 1).is_err());
}

#[test]
fn test_link_delegation_in_default_free_zone() {
    let link = Link::new([(1, name("/ucla")), (2, name("/telia"))]);
    let interest = Interest::new(name("/ndn/file")).with_nonce(1).with_link(&link);

    // No default route: the first delegation with a route is picked
    let (_clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/telia"), f2, 10).unwrap();
    fwd.start_process_interest(f1, interest.clone());
    let forwarded = interests(&sent2);
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].selected_delegation, Some(name("/telia")));

    // A default route keeps the top delegation and selects nothing
    let (_clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    let (f3, sent3) = remote_face(&mut fwd);
    fwd.add_route(&Name::new(), f2, 10).unwrap();
    fwd.add_route(&name("/telia"), f3, 10).unwrap();
    fwd.start_process_interest(f1, interest.clone());
    let forwarded = interests(&sent2);
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].selected_delegation, None);
    assert!(sent3.borrow().is_empty());

    // An already selected delegation is followed as is
    let (_clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    let (f3, sent3) = remote_face(&mut fwd);
    fwd.add_route(&Name::new(), f2, 10).unwrap();
    fwd.add_route(&name("/telia"), f3, 10).unwrap();
    fwd.start_process_interest(
        f1,
        interest
            .clone()
            .with_selected_delegation(name("/telia")),
    );
    assert!(sent2.borrow().is_empty());
    assert_eq!(interests(&sent3).len(), 1);
}

#[test]
fn test_link_ignored_in_producer_region() {
    let (_clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    let (f3, sent3) = remote_face(&mut fwd);
    fwd.add_route(&name("/ndn"), f2, 10).unwrap();
    fwd.add_route(&name("/ucla"), f3, 10).unwrap();
    fwd.network_region_table_mut().insert(name("/ucla/cs"));

    let link = Link::new([(1, name("/ucla"))]);
    fwd.start_process_interest(
        f1,
        Interest::new(name("/ndn/file")).with_nonce(1).with_link(&link),
    );
    assert_eq!(interests(&sent2).len(), 1);
    assert!(sent3.borrow().is_empty());
}

#[test]
fn test_localhost_scope() {
    let (_clock, mut fwd) = forwarder();
    let (local, sent_local) = add_face(&mut fwd, FaceScope::Local, LinkType::PointToPoint);
    let (f2, sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/localhost"), f2, 10).unwrap();

    // Never forwarded to a non-local face
    fwd.start_process_interest(local, Interest::new(name("/localhost/x")).with_nonce(1));
    assert!(sent2.borrow().is_empty());
    let sent = nacks(&sent_local);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reason, NackReason::NoRoute);

    // Never accepted from one either
    fwd.start_process_interest(f2, Interest::new(name("/localhost/y")).with_nonce(2));
    assert_eq!(fwd.pit().len(), 1);
    assert_eq!(fwd.counters().n_in_interests, 2);

    fwd.start_process_data(f2, Data::new(name("/localhost/y"), b"x"));
    assert_eq!(fwd.counters().n_unsolicited_data, 0);
    assert!(fwd.content_store().is_empty());
}

#[test]
fn test_unsolicited_data() {
    let (_clock, mut fwd) = forwarder();
    let (local, _) = add_face(&mut fwd, FaceScope::Local, LinkType::PointToPoint);
    let (remote, _) = remote_face(&mut fwd);

    fwd.start_process_data(remote, Data::new(name("/u/1"), b"x"));
    assert!(fwd.content_store().is_empty());

    fwd.start_process_data(local, Data::new(name("/u/2"), b"x"));
    assert_eq!(fwd.content_store().len(), 1);
    assert_eq!(fwd.counters().n_unsolicited_data, 2);
}

#[test]
fn test_remove_face() {
    let (clock, mut fwd) = forwarder();
    let (f1, _) = remote_face(&mut fwd);
    let (f2, sent2) = remote_face(&mut fwd);
    fwd.add_route(&name("/a"), f2, 10).unwrap();

    let interest = Interest::new(name("/a/b")).with_nonce(1);
    fwd.start_process_interest(f1, interest.clone());

    assert!(fwd.remove_face(f1).is_some());
    assert!(fwd.remove_face(f1).is_none());
    let token = fwd.pit().find(&interest).unwrap();
    assert!(fwd.pit().get(token).unwrap().in_records().is_empty());

    // The last record goes with the upstream, and the entry is finalized
    let forwarded = interests(&sent2);
    assert!(fwd.remove_face(f2).is_some());
    assert!(fwd.pit().is_empty());
    assert_eq!(fwd.counters().n_unsatisfied_interests, 1);
    assert!(fwd
        .dead_nonce_list()
        .contains(&name("/a/b"), forwarded[0].nonce, clock.now()));
    assert!(fwd.fib().find_exact(&name("/a")).is_none());
    assert!(fwd.faces().is_empty());
    assert_eq!(fwd.next_timer_deadline(), None);
}

mod best_route;
mod multicast;

pub use best_route::{BestRouteStrategy, BEST_ROUTE_STRATEGY_NAME};
pub use multicast::{MulticastStrategy, MULTICAST_STRATEGY_NAME};

use crate::{
    face::FaceId,
    packet::{Data, Interest, Nack, NackReason},
    tables::{fib::FibEntry, pit::Entry, pit::PitToken},
    timestamp::Timestamp,
};

/// What a strategy can see and do while handling an event.
///
/// Actions go through the forwarder's outgoing pipelines, so every scope and
/// record check still applies to decisions a strategy makes.
pub trait StrategyHost {
    fn now(&self) -> Timestamp;

    fn pit_entry(&self, entry: PitToken) -> Option<&Entry>;

    // False when the face is unknown, already has a live out-record,
    //  is the only downstream, or would break the name's scope
    fn can_forward_to(&self, entry: PitToken, face: FaceId) -> bool;

    fn send_interest(&mut self, entry: PitToken, face: FaceId, want_new_nonce: bool);

    fn send_nack(&mut self, entry: PitToken, face: FaceId, reason: NackReason);

    fn reject_pending_interest(&mut self, entry: PitToken);
}

/// A forwarding policy.
///
/// Only `after_receive_interest` must be provided; the other events are
/// notifications a strategy may ignore.
pub trait Strategy {
    fn name(&self) -> &str;

    fn after_receive_interest(
        &mut self,
        host: &mut dyn StrategyHost,
        in_face: FaceId,
        interest: &Interest,
        fib_entry: &FibEntry,
        entry: PitToken,
    );

    // `in_face` is `FaceId::CONTENT_STORE` when the Data came from the cache
    fn before_satisfy_interest(
        &mut self,
        _host: &mut dyn StrategyHost,
        _entry: PitToken,
        _in_face: FaceId,
        _data: &Data,
    ) {
    }

    fn before_expire_pending_interest(&mut self, _host: &mut dyn StrategyHost, _entry: PitToken) {}

    fn after_receive_nack(
        &mut self,
        _host: &mut dyn StrategyHost,
        _in_face: FaceId,
        _nack: &Nack,
        _fib_entry: &FibEntry,
        _entry: PitToken,
    ) {
    }
}

// Once every upstream that is still expected to answer has Nacked, pass the
//  least severe reason on to all downstreams. Shared by the built-in strategies.
pub(crate) fn nack_downstreams_if_all_nacked(host: &mut dyn StrategyHost, entry: PitToken) {
    let now = host.now();
    let (reason, downstreams) = {
        let Some(e) = host.pit_entry(entry) else {
            return;
        };
        let mut least_severe: Option<NackReason> = None;
        for r in e.out_records() {
            match r.incoming_nack() {
                None if !r.is_expired(now) => return,
                None => {}
                Some(reason) => {
                    least_severe = match least_severe {
                        Some(current) if !reason.is_less_severe(&current) => Some(current),
                        _ => Some(reason),
                    }
                }
            }
        }
        let Some(reason) = least_severe else {
            return;
        };
        let downstreams: Vec<FaceId> = e.in_records().iter().map(|r| r.face).collect();
        (reason, downstreams)
    };

    for face in downstreams {
        host.send_nack(entry, face, reason);
    }
}

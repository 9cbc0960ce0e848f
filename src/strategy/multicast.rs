use log::debug;

use super::{nack_downstreams_if_all_nacked, Strategy, StrategyHost};
use crate::{
    face::FaceId,
    packet::{Interest, Nack, NackReason},
    tables::{fib::FibEntry, pit::PitToken},
};

pub const MULTICAST_STRATEGY_NAME: &str = "multicast";

// Sends the Interest to every next hop that can take it.
#[derive(Default)]
pub struct MulticastStrategy;

impl MulticastStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for MulticastStrategy {
    fn name(&self) -> &str {
        MULTICAST_STRATEGY_NAME
    }

    fn after_receive_interest(
        &mut self,
        host: &mut dyn StrategyHost,
        in_face: FaceId,
        interest: &Interest,
        fib_entry: &FibEntry,
        entry: PitToken,
    ) {
        let eligible: Vec<FaceId> = fib_entry
            .next_hops()
            .iter()
            .map(|h| h.face)
            .filter(|face| host.can_forward_to(entry, *face))
            .collect();

        if eligible.is_empty() {
            let pending = host
                .pit_entry(entry)
                .map_or(false, |e| e.has_unexpired_out_records(host.now()));
            if !pending {
                debug!(
                    "multicast interest={} from={} no eligible next hop",
                    interest.name, in_face
                );
                host.send_nack(entry, in_face, NackReason::NoRoute);
                host.reject_pending_interest(entry);
            }
            return;
        }

        for face in eligible {
            host.send_interest(entry, face, false);
        }
    }

    fn after_receive_nack(
        &mut self,
        host: &mut dyn StrategyHost,
        _in_face: FaceId,
        _nack: &Nack,
        _fib_entry: &FibEntry,
        entry: PitToken,
    ) {
        nack_downstreams_if_all_nacked(host, entry)
    }
}

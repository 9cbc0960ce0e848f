use log::debug;

use super::{nack_downstreams_if_all_nacked, Strategy, StrategyHost};
use crate::{
    face::FaceId,
    packet::{Interest, Nack, NackReason},
    tables::{fib::FibEntry, pit::PitToken},
};

pub const BEST_ROUTE_STRATEGY_NAME: &str = "best-route";

// Forwards to the cheapest next hop that can take the Interest. A consumer
//  retransmission while an upstream is still pending is absorbed, not resent.
#[derive(Default)]
pub struct BestRouteStrategy;

impl BestRouteStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for BestRouteStrategy {
    fn name(&self) -> &str {
        BEST_ROUTE_STRATEGY_NAME
    }

    fn after_receive_interest(
        &mut self,
        host: &mut dyn StrategyHost,
        in_face: FaceId,
        interest: &Interest,
        fib_entry: &FibEntry,
        entry: PitToken,
    ) {
        let now = host.now();
        let pending = match host.pit_entry(entry) {
            Some(e) => e.has_unexpired_out_records(now),
            None => return,
        };
        if pending {
            debug!(
                "best-route interest={} from={} aggregated",
                interest.name, in_face
            );
            return;
        }

        let next_hop = fib_entry
            .next_hops()
            .iter()
            .find(|h| host.can_forward_to(entry, h.face));

        match next_hop {
            Some(hop) => {
                let face = hop.face;
                host.send_interest(entry, face, false);
            }
            None => {
                debug!(
                    "best-route interest={} from={} no eligible next hop",
                    interest.name, in_face
                );
                host.send_nack(entry, in_face, NackReason::NoRoute);
                host.reject_pending_interest(entry);
            }
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

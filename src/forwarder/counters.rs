use serde::Serialize;

// Packet and table event totals since the forwarder was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForwarderCounters {
    pub n_in_interests: u64,
    pub n_out_interests: u64,
    pub n_in_data: u64,
    pub n_out_data: u64,
    pub n_in_nacks: u64,
    pub n_out_nacks: u64,
    pub n_cs_hits: u64,
    pub n_cs_misses: u64,
    pub n_unsolicited_data: u64,
    pub n_satisfied_interests: u64,
    pub n_unsatisfied_interests: u64,
}

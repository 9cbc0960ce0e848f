use serde::{Deserialize, Serialize};

/// Forwarder tunables.
///
/// Every field has a default, so a partial document (or an empty one)
/// deserializes into a usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ForwarderConfig {
    /// How long a (name, nonce) pair stays in the Dead Nonce List.
    pub dead_nonce_lifetime_ms: u64,

    /// Delay between satisfying or rejecting an entry and erasing it.
    pub straggler_delay_ms: u64,

    /// Lifetime assumed for Interests that do not carry one.
    pub default_interest_lifetime_ms: u64,

    /// How long a push entry lives without a refresh or a Data.
    /// `None` keeps it until it is rejected or its faces go away.
    pub push_interest_lifetime_ms: Option<u64>,

    /// Capacity, in packets, of the built-in content store.
    pub cs_capacity: usize,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            dead_nonce_lifetime_ms: 6000,
            straggler_delay_ms: 100,
            default_interest_lifetime_ms: 4000,
            push_interest_lifetime_ms: Some(60_000),
            cs_capacity: 65536,
        }
    }
}

//#![warn(missing_docs)]

pub mod timestamp;

pub mod clock;

pub mod hash;

pub mod tlv;

pub mod name;

pub mod packet;

pub mod face;

pub mod error;

pub mod tables;

pub mod scheduler;

pub mod strategy;

pub mod forwarder;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::Error;
pub use face::{Face, FaceError, FaceId, FaceScope, FaceTable, LinkType};
pub use forwarder::{Forwarder, ForwarderConfig, ForwarderCounters, PitObserver};
pub use name::{Name, NameComponent};
pub use packet::{Data, Interest, Link, Nack, NackReason, Packet};
pub use tables::cs::{ContentStore, MemoryContentStore};
pub use timestamp::Timestamp;

//! Core value types shared across the transit core
//!
//! Validated names, spool positions and the configuration newtypes live here
//! so that every component agrees on their invariants.

pub mod config;
pub mod protocol;
pub mod spool;
pub mod validated;

pub use config::{ByteSize, MaxConnections, duration_serde};
pub use protocol::MessageId;
pub use spool::{SpoolKey, SpoolPosition};
pub use validated::{HostName, PeerName, ValidationError};

//! Attribute Protocol (ATT) implementation
//!
//! The server side of ATT for a constrained peripheral: a fixed attribute
//! table ([`database::AttributeDatabase`]) and a request processor
//! ([`server::AttServer`]) that turns inbound PDUs into bit-exact response
//! PDUs on the L2CAP fixed channel.

pub mod constants;
pub mod database;
pub mod error;
pub mod server;

// Re-export the public API
pub use self::constants::*;
pub use self::database::{
    Attribute, AttributeDatabase, AttributeType, ReadCallback, ReadOutcome, ServiceRange,
};
pub use self::error::AccessError;
pub use self::server::AttServer;

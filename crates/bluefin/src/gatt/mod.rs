//! Generic Attribute Profile layer
//!
//! A runtime schema builder that assembles services and characteristics
//! into the flat ATT attribute table, and the [`GattServer`] facade the
//! link layer talks to.

pub mod server;
pub mod types;

// Re-export the public API
pub use self::server::{Characteristic, GattServer, GattServerBuilder, Service};
pub use self::types::CharacteristicProperties;

//! Generic Access Profile support
//!
//! Device addressing and the advertising-payload records a peripheral
//! broadcasts while discoverable.

pub mod advertising;
pub mod constants;
pub mod types;

// Re-export the public API
pub use self::advertising::fill_advertising_data;
pub use self::types::{AddressKind, DeviceAddress};

//! Bluefin - a Bluetooth Low Energy peripheral stack core
//!
//! This library implements the two halves of a constrained BLE peripheral:
//! the link layer state machine that advertises on channels 37-39 and accepts
//! a central's connection request, and a GATT/ATT server that answers
//! Attribute Protocol requests from a flat attribute table built at startup.
//!
//! The radio is an external collaborator: anything implementing
//! [`link_layer::ScheduledRadio`] can drive the stack by delivering
//! `received`/`timeout` events through [`link_layer::RadioEvents`].

pub mod att;
pub mod error;
pub mod gap;
pub mod gatt;
pub mod link_layer;
pub mod time;
pub mod uuid;

// Re-export common types for convenience
pub use error::Error;
pub use gap::DeviceAddress;
pub use gatt::{Characteristic, GattServer, Service};
pub use link_layer::{LinkLayer, LinkLayerConfig, RadioEvents, ScheduledRadio};
pub use time::DeltaTime;
pub use uuid::Uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_answers_service_discovery() {
        let server = GattServer::builder()
            .service(
                Service::new(Uuid::from_u16(0x1809)).characteristic(Characteristic::new(
                    Uuid::from_u16(0x2A1C),
                    vec![0x00, 0x42],
                )),
            )
            .build()
            .unwrap();

        let mut response = [0u8; 23];
        let len = server.l2cap_input(&[0x10, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x28], &mut response);

        assert_eq!(
            &response[..len],
            &[0x11, 0x06, 0x01, 0x00, 0x03, 0x00, 0x09, 0x18]
        );
    }
}

use crate::gap::constants::*;
use rand::RngCore;
use std::fmt;

/// Whether a device address is administered publicly or chosen at random.
///
/// The kind is not part of the 48-bit value itself; it travels in the TxAdd
/// bit of the advertising PDU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Public,
    Random,
}

/// A 48-bit BLE device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    bytes: [u8; 6],
    kind: AddressKind,
}

impl DeviceAddress {
    pub const fn public(bytes: [u8; 6]) -> Self {
        Self {
            bytes,
            kind: AddressKind::Public,
        }
    }

    pub const fn random(bytes: [u8; 6]) -> Self {
        Self {
            bytes,
            kind: AddressKind::Random,
        }
    }

    /// Generates a fresh random static address: 46 random bits with the two
    /// most significant bits of the most significant octet set.
    pub fn random_static() -> Self {
        let mut bytes = [0u8; 6];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes[5] |= RANDOM_STATIC_ADDRESS_BITS;
        Self::random(bytes)
    }

    /// The address octets in transmission (little-endian) order.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }

    pub const fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn is_random(&self) -> bool {
        self.kind == AddressKind::Random
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

use std::fmt;
use std::str::FromStr;

/// A 128-bit Bluetooth UUID, stored in little-endian byte order.
///
/// SIG-assigned 16-bit UUIDs are promoted onto the Bluetooth base UUID;
/// [`Uuid::as_u16`] recovers the short form when one exists. The attribute
/// database and ATT responses only ever emit the 2-byte or the 16-byte
/// encoding, so no 32-bit form is kept.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Uuid {
    bytes: [u8; 16],
}

/// The Bluetooth base UUID "00000000-0000-1000-8000-00805F9B34FB",
/// little-endian. 16-bit values are inserted at [`SHORT_FORM_OFFSET`].
const BASE_UUID_BYTES: [u8; 16] = [
    0xFB, 0x34, 0x9B, 0x5F, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const SHORT_FORM_OFFSET: usize = 12;

impl Uuid {
    /// Creates a UUID directly from 16 little-endian bytes.
    pub const fn from_bytes_le(bytes: [u8; 16]) -> Self {
        Uuid { bytes }
    }

    /// Creates a UUID from 16 big-endian bytes (the textual order).
    pub fn from_bytes_be(mut bytes: [u8; 16]) -> Self {
        bytes.reverse();
        Uuid { bytes }
    }

    /// Promotes a SIG-assigned 16-bit value onto the base UUID.
    pub fn from_u16(uuid16: u16) -> Self {
        let mut bytes = BASE_UUID_BYTES;
        bytes[SHORT_FORM_OFFSET..].copy_from_slice(&u32::from(uuid16).to_le_bytes());
        Uuid { bytes }
    }

    /// The underlying 16 bytes, little-endian.
    pub const fn as_bytes_le(&self) -> &[u8; 16] {
        &self.bytes
    }

    /// The value occupying the short-form slot, when this UUID is built on
    /// the base UUID at all.
    fn short_form_slot(&self) -> Option<u32> {
        if self.bytes[..SHORT_FORM_OFFSET] != BASE_UUID_BYTES[..SHORT_FORM_OFFSET] {
            return None;
        }

        let mut slot = [0u8; 4];
        slot.copy_from_slice(&self.bytes[SHORT_FORM_OFFSET..]);
        Some(u32::from_le_bytes(slot))
    }

    /// The 16-bit short form, if this UUID has one.
    pub fn as_u16(&self) -> Option<u16> {
        match self.short_form_slot() {
            Some(slot) => u16::try_from(slot).ok(),
            None => None,
        }
    }

    /// True when the UUID cannot be expressed in the 2-byte short form.
    pub fn is_128bit(&self) -> bool {
        self.as_u16().is_none()
    }

    /// The wire encoding used by service declarations and group responses:
    /// 2 bytes for short-form UUIDs, 16 bytes otherwise, little-endian.
    pub fn encoded(&self) -> Vec<u8> {
        match self.as_u16() {
            Some(short) => short.to_le_bytes().to_vec(),
            None => self.bytes.to_vec(),
        }
    }
}

impl From<u16> for Uuid {
    fn from(uuid16: u16) -> Self {
        Uuid::from_u16(uuid16)
    }
}

impl From<[u8; 16]> for Uuid {
    /// Assumes little-endian byte order.
    fn from(bytes: [u8; 16]) -> Self {
        Uuid::from_bytes_le(bytes)
    }
}

impl PartialEq<u16> for Uuid {
    /// A `Uuid` equals a 16-bit code when it is exactly that code promoted
    /// onto the base UUID.
    fn eq(&self, other: &u16) -> bool {
        self.bytes == Uuid::from_u16(*other).bytes
    }
}

impl PartialEq<Uuid> for u16 {
    fn eq(&self, other: &Uuid) -> bool {
        other == self
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut b = self.bytes;
        b.reverse();
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_u16() {
            Some(short) => write!(f, "Uuid(0x{:04X})", short),
            None => fmt::Display::fmt(self, f),
        }
    }
}

/// Failure to parse a UUID from its textual form.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum UuidParseError {
    #[error("invalid UUID length")]
    InvalidLength,
    #[error("invalid hex in UUID")]
    InvalidHex,
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    /// Accepts the 4-digit short form ("2800") and the 32-digit long form,
    /// with or without hyphens ("8C8B4094-0DE2-499F-A28A-4EED5BC73CA9").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();

        match cleaned.len() {
            4 => {
                let mut short = [0u8; 2];
                hex::decode_to_slice(&cleaned, &mut short)
                    .map_err(|_| UuidParseError::InvalidHex)?;
                Ok(Uuid::from_u16(u16::from_be_bytes(short)))
            }
            32 => {
                let mut bytes_be = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut bytes_be)
                    .map_err(|_| UuidParseError::InvalidHex)?;
                Ok(Uuid::from_bytes_be(bytes_be))
            }
            _ => Err(UuidParseError::InvalidLength),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_round_trip() {
        let uuid = Uuid::from_u16(0x2800);
        assert_eq!(uuid.as_u16(), Some(0x2800));
        assert!(!uuid.is_128bit());
        assert_eq!(uuid.encoded(), vec![0x00, 0x28]);
        assert_eq!(uuid, 0x2800u16);
    }

    #[test]
    fn custom_uuid_has_no_short_form() {
        let uuid = Uuid::from_str("8C8B4094-0DE2-499F-A28A-4EED5BC73CA9").unwrap();
        assert_eq!(uuid.as_u16(), None);
        assert!(uuid.is_128bit());
        assert_eq!(uuid.encoded().len(), 16);
        // little-endian storage: first stored byte is the last textual byte
        assert_eq!(uuid.as_bytes_le()[0], 0xA9);
        assert_eq!(uuid.as_bytes_le()[15], 0x8C);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(Uuid::from_str("28"), Err(UuidParseError::InvalidLength));
        assert_eq!(Uuid::from_str("28zz"), Err(UuidParseError::InvalidHex));
    }

    #[test]
    fn display_renders_big_endian() {
        let uuid = Uuid::from_u16(0x180A);
        assert_eq!(
            uuid.to_string(),
            "0000180a-0000-1000-8000-00805f9b34fb"
        );
    }
}

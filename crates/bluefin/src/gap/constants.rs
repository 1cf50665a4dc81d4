//! GAP constants

// AD structure types (Core Specification Supplement, Part A)
pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_SHORTENED_LOCAL_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

// Flags AD record bits
pub const FLAG_LE_LIMITED_DISCOVERABLE: u8 = 0x01;
pub const FLAG_LE_GENERAL_DISCOVERABLE: u8 = 0x02;
pub const FLAG_BR_EDR_NOT_SUPPORTED: u8 = 0x04;

/// "LE General Discoverable Mode | BR/EDR Not Supported"
pub const DEFAULT_FLAGS: u8 = FLAG_LE_GENERAL_DISCOVERABLE | FLAG_BR_EDR_NOT_SUPPORTED;

/// Maximum advertising payload following the advertiser address.
pub const MAX_ADVERTISING_DATA_SIZE: usize = 31;

/// A random static address carries 0b11 in its two most significant bits.
pub const RANDOM_STATIC_ADDRESS_BITS: u8 = 0xC0;

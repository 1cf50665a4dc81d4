//! ATT protocol constants

// ATT opcode values. Only the four request opcodes below are served;
// everything else is answered with an invalid-PDU Error Response.
pub const ATT_ERROR_RSP: u8 = 0x01;
pub const ATT_FIND_INFO_REQ: u8 = 0x04;
pub const ATT_FIND_INFO_RSP: u8 = 0x05;
pub const ATT_READ_BY_TYPE_REQ: u8 = 0x08;
pub const ATT_READ_BY_TYPE_RSP: u8 = 0x09;
pub const ATT_READ_REQ: u8 = 0x0A;
pub const ATT_READ_RSP: u8 = 0x0B;
pub const ATT_READ_BY_GROUP_TYPE_REQ: u8 = 0x10;
pub const ATT_READ_BY_GROUP_TYPE_RSP: u8 = 0x11;

// ATT error codes
pub const ATT_ERROR_INVALID_HANDLE: u8 = 0x01;
pub const ATT_ERROR_READ_NOT_PERMITTED: u8 = 0x02;
pub const ATT_ERROR_INVALID_PDU: u8 = 0x04;
pub const ATT_ERROR_INVALID_OFFSET: u8 = 0x07;
pub const ATT_ERROR_ATTRIBUTE_NOT_FOUND: u8 = 0x0A;
pub const ATT_ERROR_ATTRIBUTE_NOT_LONG: u8 = 0x0B;
pub const ATT_ERROR_UNSUPPORTED_GROUP_TYPE: u8 = 0x10;

// Find Information response formats
pub const ATT_FIND_INFO_FORMAT_16BIT: u8 = 0x01;
pub const ATT_FIND_INFO_FORMAT_128BIT: u8 = 0x02;

/// Every response, including an Error Response, fits the default MTU.
pub const ATT_DEFAULT_MTU: usize = 23;

/// An Error Response PDU is always exactly 5 bytes.
pub const ATT_ERROR_RSP_SIZE: usize = 5;

/// Largest attribute value a single Read-By-Type tuple may carry.
pub const ATT_MAX_TYPE_VALUE_SIZE: usize = 253;

// ATT L2CAP fixed channel ID
pub const ATT_CID: u16 = 0x0004;

// Declaration UUIDs used by the GATT layout
pub const PRIMARY_SERVICE_UUID: u16 = 0x2800;
pub const CHARACTERISTIC_UUID: u16 = 0x2803;

//! Access failures reported by attribute read accessors

use super::constants::*;
use thiserror::Error;

/// Why an attribute read accessor refused the access.
///
/// Each variant maps to its own wire error code; the processor never
/// collapses them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    #[error("Read not permitted")]
    ReadNotPermitted,

    #[error("Invalid value offset")]
    InvalidOffset,

    #[error("Attribute cannot be read past the default MTU")]
    AttributeNotLong,
}

impl AccessError {
    /// The ATT error code sent on the wire for this failure.
    pub fn to_error_code(self) -> u8 {
        match self {
            AccessError::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            AccessError::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            AccessError::AttributeNotLong => ATT_ERROR_ATTRIBUTE_NOT_LONG,
        }
    }
}

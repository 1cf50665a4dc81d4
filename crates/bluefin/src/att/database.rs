//! Flat attribute table backing the ATT server
//!
//! Attributes are fixed once the table is built; handles are the 1-based
//! positions in the table. To keep the table small, an attribute stores only
//! a 16-bit type code. A characteristic value with a 128-bit UUID instead
//! carries the [`AttributeType::Uuid128Indirect`] marker: its full UUID
//! lives in bytes 3..19 of the preceding characteristic declaration, which
//! always reads as 1 properties byte, a 2-byte handle and the 16-byte UUID.

use super::error::AccessError;
use crate::uuid::Uuid;
use std::sync::Arc;

/// Successful outcome of an attribute read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The whole value fit; carries the number of bytes written.
    Complete(usize),
    /// The value was clipped to the provided span.
    Truncated(usize),
}

impl ReadOutcome {
    /// Bytes written into the caller's span.
    pub fn bytes_written(&self) -> usize {
        match self {
            ReadOutcome::Complete(n) | ReadOutcome::Truncated(n) => *n,
        }
    }
}

/// Read accessor: fills the caller-provided span with the attribute value.
pub type ReadCallback =
    Arc<dyn Fn(&mut [u8]) -> Result<ReadOutcome, AccessError> + Send + Sync>;

/// The type of an attribute, as stored in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// A SIG-assigned 16-bit UUID code.
    Uuid16(u16),
    /// A 128-bit UUID, recovered from the preceding characteristic
    /// declaration when it has to appear on the wire.
    Uuid128Indirect,
}

impl AttributeType {
    pub fn is_128bit(&self) -> bool {
        matches!(self, AttributeType::Uuid128Indirect)
    }

    /// The 16-bit code, if this type has one.
    pub fn uuid16(&self) -> Option<u16> {
        match self {
            AttributeType::Uuid16(code) => Some(*code),
            AttributeType::Uuid128Indirect => None,
        }
    }
}

/// One attribute: a type code and a read accessor.
#[derive(Clone)]
pub struct Attribute {
    attribute_type: AttributeType,
    read: ReadCallback,
}

impl Attribute {
    pub fn new(attribute_type: AttributeType, read: ReadCallback) -> Self {
        Self {
            attribute_type,
            read,
        }
    }

    /// An attribute with a fixed value, clipped to the reader's span.
    pub fn with_value(attribute_type: AttributeType, value: Vec<u8>) -> Self {
        Self::new(
            attribute_type,
            Arc::new(move |buf: &mut [u8]| {
                let n = value.len().min(buf.len());
                buf[..n].copy_from_slice(&value[..n]);
                if n < value.len() {
                    Ok(ReadOutcome::Truncated(n))
                } else {
                    Ok(ReadOutcome::Complete(n))
                }
            }),
        )
    }

    /// An attribute that refuses every read.
    pub fn unreadable(attribute_type: AttributeType) -> Self {
        Self::new(
            attribute_type,
            Arc::new(|_buf: &mut [u8]| Err(AccessError::ReadNotPermitted)),
        )
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    /// Reads the attribute value into `buf`.
    pub fn read(&self, buf: &mut [u8]) -> Result<ReadOutcome, AccessError> {
        (self.read)(buf)
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("attribute_type", &self.attribute_type)
            .finish_non_exhaustive()
    }
}

/// The contiguous handle range of one service, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRange {
    pub first_handle: u16,
    pub last_handle: u16,
    pub uuid: Uuid,
}

/// The fixed, index-addressed attribute table plus its service boundaries.
pub struct AttributeDatabase {
    attributes: Vec<Attribute>,
    services: Vec<ServiceRange>,
}

impl AttributeDatabase {
    pub(crate) fn new(attributes: Vec<Attribute>, services: Vec<ServiceRange>) -> Self {
        Self {
            attributes,
            services,
        }
    }

    /// Number of attributes; valid handles are `1..=count()`.
    pub fn count(&self) -> usize {
        self.attributes.len()
    }

    /// The attribute at the 0-based `index`.
    ///
    /// Callers bounds-check against [`count`](Self::count); the request
    /// processor guarantees this before every lookup.
    pub fn at(&self, index: usize) -> &Attribute {
        &self.attributes[index]
    }

    /// Service handle ranges in declaration order.
    pub fn services(&self) -> &[ServiceRange] {
        &self.services
    }
}

//! Error types for the bluefin library

use thiserror::Error;

/// Errors raised while assembling a GATT server from its schema.
///
/// Protocol-level failures never surface here: the ATT processor answers
/// every malformed request with an Error Response PDU instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("A server must contain at least one service")]
    EmptyServer,

    #[error("Service {0} contains no characteristics")]
    EmptyService(crate::uuid::Uuid),

    #[error("Attribute table exceeds the addressable handle range: {0} attributes")]
    TooManyAttributes(usize),

    #[error("Device name must not be empty")]
    EmptyDeviceName,
}

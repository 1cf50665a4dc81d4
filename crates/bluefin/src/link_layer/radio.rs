//! Radio collaborator traits
//!
//! The stack never touches hardware; it programs an abstract scheduled
//! radio and is driven back through [`RadioEvents`]. A driver implements
//! [`ScheduledRadio`] and owns the event pump: after every completed
//! operation it delivers exactly one `received` or `timeout` callback,
//! during which the next operation is scheduled.

use crate::time::DeltaTime;

/// Whether a transmit operation is followed by a listening window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listen {
    Enabled,
    Disabled,
}

/// A radio that can execute one scheduled operation at a time.
///
/// `channel` is the physical channel index 0..=39 (37..=39 advertising).
/// Transmit data is borrowed only for the duration of the call; a driver
/// must copy (or DMA) it before returning.
pub trait ScheduledRadio {
    /// Programs the access address and 24-bit CRC initialization value used
    /// by all following operations.
    fn set_access_address_and_crc_init(&mut self, access_address: u32, crc_init: u32);

    /// Transmits `tx` on `channel` at `when`, then listens for one inbound
    /// PDU unless `listen` is disabled.
    fn schedule_transmit_and_receive(
        &mut self,
        channel: u8,
        tx: &[u8],
        when: DeltaTime,
        listen: Listen,
    );

    /// Opens a receive window of `window_size` starting `window_offset`
    /// from now on `channel`, answering a received PDU with `tx`.
    fn schedule_receive_and_transmit(
        &mut self,
        channel: u8,
        window_offset: DeltaTime,
        window_size: DeltaTime,
        tx: &[u8],
    );
}

/// Callbacks a radio driver delivers after each completed operation.
///
/// For one scheduled operation the driver calls either `received` or
/// `timeout`, never both, in completion order.
pub trait RadioEvents<R: ScheduledRadio> {
    /// One PDU arrived within the listening window.
    fn received(&mut self, radio: &mut R, pdu: &[u8]);

    /// The listening window elapsed without a PDU.
    fn timeout(&mut self, radio: &mut R);
}

//! Link layer state machine
//!
//! Drives a [`ScheduledRadio`] through the advertising cycle on channels
//! 37-39, answers scan requests, and hands the radio over to the central's
//! timing on a valid connect request. After the transition the first
//! data-channel receive window is armed; connection event handling beyond
//! that point is the responsibility of higher layers.

pub mod channel_map;
pub mod radio;
#[cfg(test)]
mod tests;

// Re-export the public API
pub use self::channel_map::ChannelMap;
pub use self::radio::{Listen, RadioEvents, ScheduledRadio};

use crate::gap::constants::MAX_ADVERTISING_DATA_SIZE;
use crate::gap::DeviceAddress;
use crate::gatt::GattServer;
use crate::time::DeltaTime;
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info, warn};

const PDU_HEADER_SIZE: usize = 2;
const ADDRESS_LENGTH: usize = 6;
const ADV_BUFFER_SIZE: usize = PDU_HEADER_SIZE + ADDRESS_LENGTH + MAX_ADVERTISING_DATA_SIZE;

const FIRST_ADVERTISING_CHANNEL: u16 = 37;
const LAST_ADVERTISING_CHANNEL: u16 = 39;
const MAX_ADV_PERTURBATION: u8 = 10;

const ADV_IND_PDU_TYPE: u8 = 0x00;
const SCAN_REQ_PDU_TYPE: u8 = 0x03;
const SCAN_RSP_PDU_TYPE: u8 = 0x04;
const CONNECT_REQ_PDU_TYPE: u8 = 0x05;
const HEADER_TXADD_FLAG: u8 = 0x40;

const SCAN_REQUEST_SIZE: usize = PDU_HEADER_SIZE + 2 * ADDRESS_LENGTH;
const CONNECT_REQUEST_SIZE: usize = PDU_HEADER_SIZE + 34;

const ADVERTISING_ACCESS_ADDRESS: u32 = 0x8E89_BED6;
const ADVERTISING_CRC_INIT: u32 = 0x0055_5555;

/// Largest transmit window offset a connect request may carry.
const MAX_TRANSMIT_WINDOW_OFFSET: DeltaTime = DeltaTime::usec(10_000);

/// Central sleep clock accuracy in ppm, indexed by the SCA field.
const SLEEP_CLOCK_ACCURACY_PPM: [u16; 8] = [500, 250, 150, 100, 75, 50, 30, 20];

/// Link layer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Initial,
    Advertising,
    Connected,
}

/// Construction-time options of the link layer.
#[derive(Debug, Clone)]
pub struct LinkLayerConfig {
    /// Base advertising event interval, perturbed by 0..=10 ms per cycle.
    pub advertising_interval: DeltaTime,
    /// This device's sleep clock accuracy.
    pub sleep_clock_accuracy_ppm: u16,
    /// Own device address.
    pub address: DeviceAddress,
    /// Microseconds per connect-request timing unit. The Bluetooth unit is
    /// 1.25 ms; overriding this is only useful for interoperability with
    /// fixtures that reproduce other stacks' timing.
    pub us_per_unit: u32,
}

impl Default for LinkLayerConfig {
    fn default() -> Self {
        Self {
            advertising_interval: DeltaTime::msec(100),
            sleep_clock_accuracy_ppm: 500,
            address: DeviceAddress::random_static(),
            us_per_unit: 1250,
        }
    }
}

/// The advertising/connection state machine.
pub struct LinkLayer {
    config: LinkLayerConfig,

    adv_buffer: [u8; ADV_BUFFER_SIZE],
    adv_size: usize,
    adv_response_buffer: [u8; ADV_BUFFER_SIZE],
    adv_response_size: usize,

    /// Advertising channel 37..=39; reused as the connection event counter
    /// once connected.
    current_channel: u16,
    adv_perturbation: u8,
    channels: ChannelMap,
    cumulated_sca_ppm: u16,
    transmit_window_offset: DeltaTime,
    transmit_window_size: DeltaTime,
    connection_interval: DeltaTime,
    state: State,
}

impl LinkLayer {
    pub fn new(config: LinkLayerConfig) -> Self {
        Self {
            config,
            adv_buffer: [0; ADV_BUFFER_SIZE],
            adv_size: 0,
            adv_response_buffer: [0; ADV_BUFFER_SIZE],
            adv_response_size: 0,
            current_channel: FIRST_ADVERTISING_CHANNEL,
            adv_perturbation: 0,
            channels: ChannelMap::new(),
            cumulated_sca_ppm: 0,
            transmit_window_offset: DeltaTime::now(),
            transmit_window_size: DeltaTime::now(),
            connection_interval: DeltaTime::now(),
            state: State::Initial,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.config.address
    }

    /// Summed sleep clock accuracy of both link ends, valid once connected.
    pub fn cumulated_sca_ppm(&self) -> u16 {
        self.cumulated_sca_ppm
    }

    /// Starts advertising `server`.
    ///
    /// Fills the advertising and scan-response PDUs, programs the fixed
    /// advertising access address and CRC, and arms the first advertising
    /// slot on channel 37. All further scheduling happens from the
    /// `received`/`timeout` callbacks the radio driver delivers.
    pub fn run<R: ScheduledRadio>(&mut self, radio: &mut R, server: &GattServer) {
        if self.state == State::Initial {
            self.state = State::Advertising;
            self.fill_advertising_buffer(server);
            self.fill_advertising_response_buffer();

            radio.set_access_address_and_crc_init(
                ADVERTISING_ACCESS_ADDRESS,
                ADVERTISING_CRC_INIT,
            );
            radio.schedule_transmit_and_receive(
                self.current_channel as u8,
                &self.adv_buffer[..self.adv_size],
                DeltaTime::now(),
                Listen::Enabled,
            );

            info!("advertising as {}", self.config.address);
        }
    }

    /// A PDU arrived within the listening window of the last operation.
    pub fn received<R: ScheduledRadio>(&mut self, radio: &mut R, pdu: &[u8]) {
        match self.state {
            State::Advertising => {
                if self.is_valid_scan_request(pdu) {
                    debug!("scan request on channel {}", self.current_channel);
                    radio.schedule_transmit_and_receive(
                        self.current_channel as u8,
                        &self.adv_response_buffer[..self.adv_response_size],
                        DeltaTime::now(),
                        Listen::Disabled,
                    );
                } else if self.is_valid_connect_request(pdu) && self.connect(radio, pdu) {
                    // connected; the first receive window is armed
                } else {
                    self.timeout(radio);
                }
            }
            State::Connected => {}
            State::Initial => panic!("radio event delivered before run()"),
        }
    }

    /// The listening window of the last operation elapsed.
    pub fn timeout<R: ScheduledRadio>(&mut self, radio: &mut R) {
        match self.state {
            State::Advertising => {
                self.current_channel = if self.current_channel == LAST_ADVERTISING_CHANNEL {
                    FIRST_ADVERTISING_CHANNEL
                } else {
                    self.current_channel + 1
                };

                let when = if self.current_channel == FIRST_ADVERTISING_CHANNEL {
                    self.next_adv_event()
                } else {
                    DeltaTime::now()
                };

                radio.schedule_transmit_and_receive(
                    self.current_channel as u8,
                    &self.adv_buffer[..self.adv_size],
                    when,
                    Listen::Enabled,
                );
            }
            State::Connected => {}
            State::Initial => panic!("radio event delivered before run()"),
        }
    }

    /// Start of the next advertising event, relative to the current one.
    /// The perturbation steps by 7 mod 11 after each use.
    fn next_adv_event(&mut self) -> DeltaTime {
        let next =
            self.config.advertising_interval + DeltaTime::msec(self.adv_perturbation as u32);
        self.adv_perturbation = (self.adv_perturbation + 7) % (MAX_ADV_PERTURBATION + 1);
        next
    }

    fn fill_advertising_buffer(&mut self, server: &GattServer) {
        self.adv_buffer[0] = ADV_IND_PDU_TYPE;
        if self.config.address.is_random() {
            self.adv_buffer[0] |= HEADER_TXADD_FLAG;
        }

        let payload_start = PDU_HEADER_SIZE + ADDRESS_LENGTH;
        let payload = server.advertising_data(&mut self.adv_buffer[payload_start..]);

        self.adv_buffer[1] = (ADDRESS_LENGTH + payload) as u8;
        self.adv_buffer[2..payload_start].copy_from_slice(self.config.address.as_bytes());
        self.adv_size = PDU_HEADER_SIZE + self.adv_buffer[1] as usize;
    }

    fn fill_advertising_response_buffer(&mut self) {
        self.adv_response_buffer[0] = SCAN_RSP_PDU_TYPE;
        if self.config.address.is_random() {
            self.adv_response_buffer[0] |= HEADER_TXADD_FLAG;
        }

        self.adv_response_buffer[1] = ADDRESS_LENGTH as u8;
        self.adv_response_buffer[2..PDU_HEADER_SIZE + ADDRESS_LENGTH]
            .copy_from_slice(self.config.address.as_bytes());
        self.adv_response_size = PDU_HEADER_SIZE + ADDRESS_LENGTH;
    }

    fn is_valid_scan_request(&self, pdu: &[u8]) -> bool {
        pdu.len() == SCAN_REQUEST_SIZE
            && pdu[1] & 0x3F == (SCAN_REQUEST_SIZE - PDU_HEADER_SIZE) as u8
            && pdu[0] & 0x0F == SCAN_REQ_PDU_TYPE
            && self.addressed_to_us(pdu)
    }

    fn is_valid_connect_request(&self, pdu: &[u8]) -> bool {
        pdu.len() == CONNECT_REQUEST_SIZE
            && pdu[1] & 0x3F == (CONNECT_REQUEST_SIZE - PDU_HEADER_SIZE) as u8
            && pdu[0] & 0x0F == CONNECT_REQ_PDU_TYPE
            && self.addressed_to_us(pdu)
    }

    fn addressed_to_us(&self, pdu: &[u8]) -> bool {
        pdu[8..14] == self.config.address.as_bytes()[..]
    }

    /// Takes a validated connect request into the connected state. Returns
    /// `false`, remaining in advertising, when the channel map or transmit
    /// window parameters are unacceptable.
    fn connect<R: ScheduledRadio>(&mut self, radio: &mut R, pdu: &[u8]) -> bool {
        let mut bitmap = [0u8; 5];
        bitmap.copy_from_slice(&pdu[30..35]);
        let hop = pdu[35] & 0x1F;

        if !self.channels.reset(&bitmap, hop) || !self.parse_transmit_window(pdu) {
            warn!("connect request rejected: hop {}, offset {}", hop, pdu[21]);
            return false;
        }

        self.state = State::Connected;
        self.current_channel = 0;
        self.cumulated_sca_ppm =
            self.central_sleep_clock_accuracy(pdu) + self.config.sleep_clock_accuracy_ppm;

        let access_address = LittleEndian::read_u32(&pdu[14..18]);
        let crc_init = LittleEndian::read_u24(&pdu[18..21]);
        radio.set_access_address_and_crc_init(access_address, crc_init);

        let data_channel = self.channels.data_channel(self.current_channel);
        info!(
            "connected: access address 0x{:08X}, first data channel {}, window {}+{}",
            access_address, data_channel, self.transmit_window_offset, self.transmit_window_size
        );

        radio.schedule_receive_and_transmit(
            data_channel,
            self.transmit_window_offset,
            self.transmit_window_size,
            &self.adv_response_buffer[..self.adv_response_size],
        );

        true
    }

    /// Extracts the transmit window and connection interval. The window
    /// offset must not exceed 10 ms or the connection interval.
    fn parse_transmit_window(&mut self, pdu: &[u8]) -> bool {
        let unit = self.config.us_per_unit;

        self.transmit_window_size = DeltaTime::usec((pdu[20] as u32).saturating_mul(unit));
        self.transmit_window_offset = DeltaTime::usec((pdu[21] as u32).saturating_mul(unit));
        self.connection_interval =
            DeltaTime::usec((LittleEndian::read_u16(&pdu[24..26]) as u32).saturating_mul(unit));

        self.transmit_window_offset <= MAX_TRANSMIT_WINDOW_OFFSET
            && self.transmit_window_offset <= self.connection_interval
    }

    fn central_sleep_clock_accuracy(&self, pdu: &[u8]) -> u16 {
        SLEEP_CLOCK_ACCURACY_PPM[((pdu[35] & 0xC0) >> 6) as usize]
    }
}

impl<R: ScheduledRadio> RadioEvents<R> for LinkLayer {
    fn received(&mut self, radio: &mut R, pdu: &[u8]) {
        LinkLayer::received(self, radio, pdu);
    }

    fn timeout(&mut self, radio: &mut R) {
        LinkLayer::timeout(self, radio);
    }
}

//! Unit tests for the link layer state machine and channel selection

use super::channel_map::ChannelMap;
use super::radio::{Listen, ScheduledRadio};
use super::{LinkLayer, LinkLayerConfig, State};
use crate::gap::DeviceAddress;
use crate::gatt::{Characteristic, GattServer, Service};
use crate::time::DeltaTime;
use crate::uuid::Uuid;

const OWN_ADDRESS: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0xC6];
const FULL_CHANNEL_MAP: [u8; 5] = [0xFF, 0xFF, 0xFF, 0xFF, 0x1F];

/// Records every operation the link layer schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    TransmitAndReceive {
        channel: u8,
        tx: Vec<u8>,
        when: DeltaTime,
        listen: Listen,
    },
    ReceiveAndTransmit {
        channel: u8,
        window_offset: DeltaTime,
        window_size: DeltaTime,
        tx: Vec<u8>,
    },
}

#[derive(Default)]
struct MockRadio {
    access_address: u32,
    crc_init: u32,
    ops: Vec<Op>,
}

impl ScheduledRadio for MockRadio {
    fn set_access_address_and_crc_init(&mut self, access_address: u32, crc_init: u32) {
        self.access_address = access_address;
        self.crc_init = crc_init;
    }

    fn schedule_transmit_and_receive(
        &mut self,
        channel: u8,
        tx: &[u8],
        when: DeltaTime,
        listen: Listen,
    ) {
        self.ops.push(Op::TransmitAndReceive {
            channel,
            tx: tx.to_vec(),
            when,
            listen,
        });
    }

    fn schedule_receive_and_transmit(
        &mut self,
        channel: u8,
        window_offset: DeltaTime,
        window_size: DeltaTime,
        tx: &[u8],
    ) {
        self.ops.push(Op::ReceiveAndTransmit {
            channel,
            window_offset,
            window_size,
            tx: tx.to_vec(),
        });
    }
}

impl MockRadio {
    fn last(&self) -> &Op {
        self.ops.last().expect("nothing scheduled")
    }
}

fn test_config() -> LinkLayerConfig {
    LinkLayerConfig {
        address: DeviceAddress::random(OWN_ADDRESS),
        ..LinkLayerConfig::default()
    }
}

fn test_server() -> GattServer {
    GattServer::builder()
        .service(
            Service::new(Uuid::from_u16(0x1809))
                .characteristic(Characteristic::new(Uuid::from_u16(0x2A1C), vec![0x2A, 0x00])),
        )
        .build()
        .unwrap()
}

/// A link layer that already entered the advertising state.
fn advertising_link_layer() -> (LinkLayer, MockRadio) {
    let server = test_server();
    let mut link_layer = LinkLayer::new(test_config());
    let mut radio = MockRadio::default();
    link_layer.run(&mut radio, &server);
    (link_layer, radio)
}

fn expected_adv_pdu() -> Vec<u8> {
    let mut pdu = vec![0x40, 0x09];
    pdu.extend_from_slice(&OWN_ADDRESS);
    pdu.extend_from_slice(&[0x02, 0x01, 0x06]);
    pdu
}

fn expected_scan_response() -> Vec<u8> {
    let mut pdu = vec![0x44, 0x06];
    pdu.extend_from_slice(&OWN_ADDRESS);
    pdu
}

fn scan_request(target: &[u8; 6]) -> Vec<u8> {
    let mut pdu = vec![0x83, 0x0C];
    pdu.extend_from_slice(&[0xF1; 6]);
    pdu.extend_from_slice(target);
    pdu
}

fn connect_request(
    target: &[u8; 6],
    window_offset_units: u8,
    interval_units: u16,
    bitmap: [u8; 5],
    hop_and_sca: u8,
) -> Vec<u8> {
    let mut pdu = vec![0xC5, 0x22];
    pdu.extend_from_slice(&[0x66; 6]); // initiator address
    pdu.extend_from_slice(target);
    pdu.extend_from_slice(&[0x5A, 0xB3, 0x9A, 0xAF]); // access address
    pdu.extend_from_slice(&[0x11, 0x22, 0x33]); // CRC init
    pdu.push(window_offset_units);
    pdu.extend_from_slice(&[0x00, 0x00]);
    pdu.extend_from_slice(&interval_units.to_le_bytes());
    pdu.extend_from_slice(&[0x00, 0x00]); // latency
    pdu.extend_from_slice(&[0x80, 0x0C]); // supervision timeout
    pdu.extend_from_slice(&bitmap);
    pdu.push(hop_and_sca);
    pdu
}

#[test]
fn run_arms_the_first_advertising_slot() {
    let (link_layer, radio) = advertising_link_layer();

    assert_eq!(link_layer.state(), State::Advertising);
    assert_eq!(radio.access_address, 0x8E89_BED6);
    assert_eq!(radio.crc_init, 0x0055_5555);
    assert_eq!(radio.ops.len(), 1);
    assert_eq!(
        radio.last(),
        &Op::TransmitAndReceive {
            channel: 37,
            tx: expected_adv_pdu(),
            when: DeltaTime::now(),
            listen: Listen::Enabled,
        }
    );
}

#[test]
fn run_is_idempotent_once_advertising() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    link_layer.run(&mut radio, &test_server());
    assert_eq!(radio.ops.len(), 1);
}

#[test]
fn timeouts_cycle_through_the_advertising_channels() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    for (channel, delay) in [
        (38, DeltaTime::now()),
        (39, DeltaTime::now()),
        (37, DeltaTime::msec(100)),
        (38, DeltaTime::now()),
        (39, DeltaTime::now()),
        (37, DeltaTime::msec(107)),
    ] {
        link_layer.timeout(&mut radio);
        assert_eq!(
            radio.last(),
            &Op::TransmitAndReceive {
                channel,
                tx: expected_adv_pdu(),
                when: delay,
                listen: Listen::Enabled,
            }
        );
    }
}

#[test]
fn perturbation_cycles_over_long_advertising_runs() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    let perturbation_cycle = [0u32, 7, 3, 10, 6, 2, 9, 5, 1, 8, 4];
    let mut wraps = 0;

    for i in 0..3000 {
        link_layer.timeout(&mut radio);

        let expected_channel = 37 + ((i + 1) % 3) as u8;
        match radio.last() {
            Op::TransmitAndReceive { channel, when, .. } => {
                assert_eq!(*channel, expected_channel);
                if *channel == 37 {
                    let p = perturbation_cycle[wraps % perturbation_cycle.len()];
                    assert_eq!(*when, DeltaTime::msec(100) + DeltaTime::msec(p));
                    wraps += 1;
                } else {
                    assert!(when.is_now());
                }
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    assert_eq!(wraps, 1000);
}

#[test]
fn scan_request_gets_a_single_scan_response() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    link_layer.received(&mut radio, &scan_request(&OWN_ADDRESS));

    assert_eq!(link_layer.state(), State::Advertising);
    assert_eq!(link_layer.adv_perturbation, 0);
    assert_eq!(radio.ops.len(), 2);
    assert_eq!(
        radio.last(),
        &Op::TransmitAndReceive {
            channel: 37,
            tx: expected_scan_response(),
            when: DeltaTime::now(),
            listen: Listen::Disabled,
        }
    );
}

#[test]
fn scan_request_for_another_device_is_a_miss() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    link_layer.received(&mut radio, &scan_request(&[0xDE; 6]));

    // the miss rolls the machine to the next advertising channel
    assert_eq!(
        radio.last(),
        &Op::TransmitAndReceive {
            channel: 38,
            tx: expected_adv_pdu(),
            when: DeltaTime::now(),
            listen: Listen::Enabled,
        }
    );
}

#[test]
fn garbage_pdus_are_misses() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    link_layer.received(&mut radio, &[0x00]);
    assert_eq!(link_layer.state(), State::Advertising);

    // a connect request with a wrong length field
    let mut request = connect_request(&OWN_ADDRESS, 2, 80, FULL_CHANNEL_MAP, 0x09);
    request[1] = 33;
    link_layer.received(&mut radio, &request);

    assert_eq!(link_layer.state(), State::Advertising);
    match radio.last() {
        Op::TransmitAndReceive { channel: 39, .. } => {}
        other => panic!("unexpected operation {:?}", other),
    }
}

#[test]
fn connect_request_transitions_to_connected() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    // hop 9, SCA index 1 (250 ppm)
    let request = connect_request(&OWN_ADDRESS, 2, 80, FULL_CHANNEL_MAP, 0x09 | (1 << 6));
    link_layer.received(&mut radio, &request);

    assert_eq!(link_layer.state(), State::Connected);
    assert_eq!(radio.access_address, 0xAF9A_B35A);
    assert_eq!(radio.crc_init, 0x0033_2211);
    assert_eq!(link_layer.cumulated_sca_ppm(), 250 + 500);
    assert_eq!(radio.ops.len(), 2);
    assert_eq!(
        radio.last(),
        &Op::ReceiveAndTransmit {
            channel: 9,
            window_offset: DeltaTime::usec(2 * 1250),
            // the window size byte doubles as the last CRC init byte
            window_size: DeltaTime::usec(0x33 * 1250),
            tx: expected_scan_response(),
        }
    );
}

#[test]
fn connected_link_layer_ignores_further_events() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    let request = connect_request(&OWN_ADDRESS, 2, 80, FULL_CHANNEL_MAP, 0x09);
    link_layer.received(&mut radio, &request);
    let scheduled = radio.ops.len();

    link_layer.timeout(&mut radio);
    link_layer.received(&mut radio, &scan_request(&OWN_ADDRESS));

    assert_eq!(link_layer.state(), State::Connected);
    assert_eq!(radio.ops.len(), scheduled);
}

#[test]
fn connect_request_window_offset_limits() {
    // 8 units is exactly the 10 ms limit
    let (mut link_layer, mut radio) = advertising_link_layer();
    let request = connect_request(&OWN_ADDRESS, 8, 80, FULL_CHANNEL_MAP, 0x09);
    link_layer.received(&mut radio, &request);
    assert_eq!(link_layer.state(), State::Connected);

    // 9 units exceeds it; the machine stays advertising and rolls on
    let (mut link_layer, mut radio) = advertising_link_layer();
    let request = connect_request(&OWN_ADDRESS, 9, 80, FULL_CHANNEL_MAP, 0x09);
    link_layer.received(&mut radio, &request);
    assert_eq!(link_layer.state(), State::Advertising);
    match radio.last() {
        Op::TransmitAndReceive { channel: 38, .. } => {}
        other => panic!("unexpected operation {:?}", other),
    }
}

#[test]
fn connect_request_window_offset_beyond_the_interval() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    let request = connect_request(&OWN_ADDRESS, 2, 1, FULL_CHANNEL_MAP, 0x09);
    link_layer.received(&mut radio, &request);

    assert_eq!(link_layer.state(), State::Advertising);
}

#[test]
fn connect_request_with_invalid_hop() {
    for hop in [0x04, 0x11] {
        let (mut link_layer, mut radio) = advertising_link_layer();
        let request = connect_request(&OWN_ADDRESS, 2, 80, FULL_CHANNEL_MAP, hop);
        link_layer.received(&mut radio, &request);
        assert_eq!(link_layer.state(), State::Advertising);
    }
}

#[test]
fn connect_request_with_sparse_channel_map_remaps() {
    let (mut link_layer, mut radio) = advertising_link_layer();

    // only data channels 0 and 1 used; unmapped channel 9 remaps to 9 % 2
    let request = connect_request(&OWN_ADDRESS, 2, 80, [0x03, 0, 0, 0, 0], 0x09);
    link_layer.received(&mut radio, &request);

    assert_eq!(link_layer.state(), State::Connected);
    match radio.last() {
        Op::ReceiveAndTransmit { channel: 1, .. } => {}
        other => panic!("unexpected operation {:?}", other),
    }
}

#[test]
fn connect_timing_unit_is_configurable() {
    let server = test_server();
    let mut link_layer = LinkLayer::new(LinkLayerConfig {
        us_per_unit: 1125,
        ..test_config()
    });
    let mut radio = MockRadio::default();
    link_layer.run(&mut radio, &server);

    let request = connect_request(&OWN_ADDRESS, 8, 80, FULL_CHANNEL_MAP, 0x09);
    link_layer.received(&mut radio, &request);

    assert_eq!(link_layer.state(), State::Connected);
    match radio.last() {
        Op::ReceiveAndTransmit { window_offset, .. } => {
            assert_eq!(*window_offset, DeltaTime::usec(8 * 1125));
        }
        other => panic!("unexpected operation {:?}", other),
    }
}

#[test]
#[should_panic]
fn events_before_run_are_a_bug() {
    let mut link_layer = LinkLayer::new(test_config());
    let mut radio = MockRadio::default();
    link_layer.timeout(&mut radio);
}

#[test]
fn channel_map_reset_validates_its_input() {
    let mut map = ChannelMap::new();

    assert!(!map.reset(&FULL_CHANNEL_MAP, 4));
    assert!(!map.reset(&FULL_CHANNEL_MAP, 17));
    assert!(map.reset(&FULL_CHANNEL_MAP, 5));
    assert!(map.reset(&FULL_CHANNEL_MAP, 16));

    // fewer than two used channels
    assert!(!map.reset(&[0x01, 0, 0, 0, 0], 8));
    assert!(map.reset(&[0x03, 0, 0, 0, 0], 8));

    // bits beyond channel 36 are ignored
    assert!(!map.reset(&[0, 0, 0, 0, 0xE0], 8));
}

#[test]
fn channel_map_failed_reset_keeps_the_previous_state() {
    let mut map = ChannelMap::new();
    assert!(map.reset(&FULL_CHANNEL_MAP, 7));
    assert!(!map.reset(&[0x01, 0, 0, 0, 0], 4));

    assert_eq!(map.data_channel(0), 7);
}

#[test]
fn channel_map_hops_through_a_full_map() {
    let mut map = ChannelMap::new();
    assert!(map.reset(&FULL_CHANNEL_MAP, 7));

    assert_eq!(map.data_channel(0), 7);
    assert_eq!(map.data_channel(1), 14);
    assert_eq!(map.data_channel(2), 21);
    // the sequence wraps after 37 events
    assert_eq!(map.data_channel(36), 0);
}

#[test]
fn channel_map_remaps_unused_channels() {
    let mut map = ChannelMap::new();
    assert!(map.reset(&[0x03, 0, 0, 0, 0], 5));

    // unmapped 5 and 10 are unused: remap by position modulo 2
    assert_eq!(map.data_channel(0), 1);
    assert_eq!(map.data_channel(1), 0);

    // used channels map to themselves
    assert!(map.reset(&[0x23, 0, 0, 0, 0], 5));
    assert_eq!(map.data_channel(0), 5);
}

#[test]
fn channel_map_remaps_into_high_channels() {
    let mut map = ChannelMap::new();
    assert!(map.reset(&[0, 0, 0, 0, 0x1F], 5));

    // channels 32..=36 used; unmapped 5 remaps to position 0
    assert_eq!(map.data_channel(0), 32);
}

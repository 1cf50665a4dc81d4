//! Example demonstrating a simple temperature peripheral
//!
//! This example builds a GATT server with a health-thermometer service and
//! drives the link layer with a simulated radio: an advertising slot times
//! out, a scan request is answered, and a connect request moves the machine
//! into the connected state. A real firmware would replace `SimulatedRadio`
//! with a driver for its radio peripheral.

use bluefin::link_layer::{Listen, ScheduledRadio};
use bluefin::{
    Characteristic, DeltaTime, DeviceAddress, GattServer, LinkLayer, LinkLayerConfig, Service, Uuid,
};
use std::str::FromStr;

/// Prints every operation the link layer schedules instead of touching RF.
struct SimulatedRadio;

impl ScheduledRadio for SimulatedRadio {
    fn set_access_address_and_crc_init(&mut self, access_address: u32, crc_init: u32) {
        println!("radio: access address 0x{access_address:08X}, CRC init 0x{crc_init:06X}");
    }

    fn schedule_transmit_and_receive(
        &mut self,
        channel: u8,
        tx: &[u8],
        when: DeltaTime,
        listen: Listen,
    ) {
        println!(
            "radio: transmit {} bytes on channel {channel} at +{when} (listen: {listen:?})",
            tx.len()
        );
    }

    fn schedule_receive_and_transmit(
        &mut self,
        channel: u8,
        window_offset: DeltaTime,
        window_size: DeltaTime,
        _tx: &[u8],
    ) {
        println!("radio: listen on channel {channel}, window +{window_offset} for {window_size}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let address = DeviceAddress::random_static();

    // Health Thermometer service with a fixed temperature measurement
    let server = GattServer::builder()
        .name("Thermometer")
        .service(
            Service::new(Uuid::from_u16(0x1809)).characteristic(Characteristic::new(
                Uuid::from_str("8C8B4094-0DE2-499F-A28A-4EED5BC73CA9")?,
                vec![0x00, 0x42, 0x01, 0x00, 0x00],
            )),
        )
        .build()?;

    let mut radio = SimulatedRadio;
    let mut link_layer = LinkLayer::new(LinkLayerConfig {
        address,
        ..LinkLayerConfig::default()
    });

    println!("advertising as {address}");
    link_layer.run(&mut radio, &server);

    // nothing heard in the first advertising slot
    link_layer.timeout(&mut radio);

    // a scanner asks for more
    let mut scan_request = vec![0x83, 0x0C];
    scan_request.extend_from_slice(&[0xF1; 6]);
    scan_request.extend_from_slice(address.as_bytes());
    link_layer.received(&mut radio, &scan_request);

    // a central connects: hop 9, all data channels in use
    let mut connect_request = vec![0xC5, 0x22];
    connect_request.extend_from_slice(&[0x66; 6]);
    connect_request.extend_from_slice(address.as_bytes());
    connect_request.extend_from_slice(&[0x5A, 0xB3, 0x9A, 0xAF]); // access address
    connect_request.extend_from_slice(&[0x11, 0x22, 0x33]); // CRC init
    connect_request.push(2); // transmit window offset
    connect_request.extend_from_slice(&[0x00, 0x00]);
    connect_request.extend_from_slice(&80u16.to_le_bytes()); // connection interval
    connect_request.extend_from_slice(&[0x00, 0x00, 0x80, 0x0C]);
    connect_request.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]);
    connect_request.push(0x09);
    link_layer.received(&mut radio, &connect_request);

    println!("state: {:?}", link_layer.state());

    // the central discovers the services over ATT
    let mut response = [0u8; 23];
    let len = server.l2cap_input(&[0x10, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x28], &mut response);
    println!("read-by-group-type response: {:02X?}", &response[..len]);

    Ok(())
}

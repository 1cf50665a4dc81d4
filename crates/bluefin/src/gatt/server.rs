//! GATT server facade and schema builder
//!
//! Services and characteristics are described with plain builder values and
//! flattened into the attribute table once, at startup. The resulting
//! [`GattServer`] answers ATT requests through `l2cap_input` and supplies
//! the advertising payload to the link layer.

use crate::att::{
    AttServer, Attribute, AttributeDatabase, AttributeType, ReadCallback, ServiceRange,
    CHARACTERISTIC_UUID, PRIMARY_SERVICE_UUID,
};
use crate::error::Error;
use crate::gap::advertising::fill_advertising_data;
use crate::gatt::types::CharacteristicProperties;
use crate::uuid::Uuid;
use log::debug;

enum ValueSource {
    Fixed(Vec<u8>),
    Callback(ReadCallback),
    NoReadAccess,
}

/// One characteristic of a service.
///
/// Characteristics are readable by default; writes, notifications and
/// indications are not served, but their property bits may still be
/// declared for clients that inspect the declaration.
pub struct Characteristic {
    uuid: Uuid,
    properties: CharacteristicProperties,
    value: ValueSource,
}

impl Characteristic {
    /// A characteristic with a fixed value.
    pub fn new(uuid: Uuid, value: Vec<u8>) -> Self {
        Self {
            uuid,
            properties: CharacteristicProperties::read_only(),
            value: ValueSource::Fixed(value),
        }
    }

    /// A characteristic whose value is produced by a callback on every read.
    pub fn with_callback(uuid: Uuid, callback: ReadCallback) -> Self {
        Self {
            uuid,
            properties: CharacteristicProperties::read_only(),
            value: ValueSource::Callback(callback),
        }
    }

    /// Overrides the declared properties byte.
    pub fn properties(mut self, properties: CharacteristicProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Refuses every read of the value attribute.
    pub fn no_read_access(mut self) -> Self {
        self.value = ValueSource::NoReadAccess;
        self
    }
}

/// One primary service: a UUID and its characteristics.
pub struct Service {
    uuid: Uuid,
    characteristics: Vec<Characteristic>,
}

impl Service {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            characteristics: Vec::new(),
        }
    }

    pub fn characteristic(mut self, characteristic: Characteristic) -> Self {
        self.characteristics.push(characteristic);
        self
    }
}

/// Builder assembling the attribute table from a service schema.
#[derive(Default)]
pub struct GattServerBuilder {
    name: Option<String>,
    services: Vec<Service>,
}

impl GattServerBuilder {
    /// Sets the discoverable device name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    /// Flattens the schema into the attribute table.
    ///
    /// Layout per service: the `0x2800` declaration, then per
    /// characteristic a `0x2803` declaration immediately followed by the
    /// value attribute. Handles are the 1-based table positions.
    pub fn build(self) -> Result<GattServer, Error> {
        if self.services.is_empty() {
            return Err(Error::EmptyServer);
        }
        if let Some(name) = &self.name {
            if name.is_empty() {
                return Err(Error::EmptyDeviceName);
            }
        }

        let mut attributes: Vec<Attribute> = Vec::new();
        let mut ranges: Vec<ServiceRange> = Vec::new();

        for service in &self.services {
            if service.characteristics.is_empty() {
                return Err(Error::EmptyService(service.uuid));
            }

            let first_handle = attributes.len() as u16 + 1;

            attributes.push(Attribute::with_value(
                AttributeType::Uuid16(PRIMARY_SERVICE_UUID),
                service.uuid.encoded(),
            ));

            for characteristic in &service.characteristics {
                // value attribute follows the declaration directly
                let value_handle = attributes.len() as u16 + 2;

                let mut declaration = vec![characteristic.properties.value()];
                declaration.extend_from_slice(&value_handle.to_le_bytes());
                declaration.extend_from_slice(&characteristic.uuid.encoded());

                attributes.push(Attribute::with_value(
                    AttributeType::Uuid16(CHARACTERISTIC_UUID),
                    declaration,
                ));

                let value_type = match characteristic.uuid.as_u16() {
                    Some(code) => AttributeType::Uuid16(code),
                    None => AttributeType::Uuid128Indirect,
                };
                attributes.push(match &characteristic.value {
                    ValueSource::Fixed(value) => {
                        Attribute::with_value(value_type, value.clone())
                    }
                    ValueSource::Callback(callback) => {
                        Attribute::new(value_type, callback.clone())
                    }
                    ValueSource::NoReadAccess => Attribute::unreadable(value_type),
                });
            }

            ranges.push(ServiceRange {
                first_handle,
                last_handle: attributes.len() as u16,
                uuid: service.uuid,
            });
        }

        if attributes.len() > u16::MAX as usize {
            return Err(Error::TooManyAttributes(attributes.len()));
        }

        debug!(
            "GATT server built: {} services, {} attributes",
            ranges.len(),
            attributes.len()
        );

        Ok(GattServer {
            att: AttServer::new(AttributeDatabase::new(attributes, ranges)),
            name: self.name,
        })
    }
}

/// The composed GATT server the link layer serves.
pub struct GattServer {
    att: AttServer,
    name: Option<String>,
}

impl GattServer {
    pub fn builder() -> GattServerBuilder {
        GattServerBuilder::default()
    }

    /// Processes one ATT PDU received on the L2CAP fixed channel and
    /// returns the length of the response written into `output`.
    pub fn l2cap_input(&self, input: &[u8], output: &mut [u8]) -> usize {
        self.att.process(input, output)
    }

    /// Fills `buffer` with the advertising data records, returning the
    /// number of bytes used (at most 31).
    pub fn advertising_data(&self, buffer: &mut [u8]) -> usize {
        fill_advertising_data(buffer, self.name.as_deref())
    }

    pub fn database(&self) -> &AttributeDatabase {
        self.att.database()
    }
}

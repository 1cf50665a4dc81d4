//! ATT request processor
//!
//! Turns one inbound ATT PDU into exactly one response PDU. Malformed or
//! unanswerable requests produce an Error Response; the processor itself
//! never fails.

use super::constants::*;
use super::database::{AttributeDatabase, ReadOutcome};
use byteorder::{ByteOrder, LittleEndian};
use log::trace;

/// The ATT server: dispatches requests against a fixed attribute table.
pub struct AttServer {
    database: AttributeDatabase,
}

impl AttServer {
    pub fn new(database: AttributeDatabase) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &AttributeDatabase {
        &self.database
    }

    /// Processes one ATT PDU and writes the response into `output`,
    /// returning the response length.
    ///
    /// `input` must not be empty and `output` must hold at least the
    /// default ATT MTU of 23 bytes; violating either is a caller bug.
    pub fn process(&self, input: &[u8], output: &mut [u8]) -> usize {
        assert!(!input.is_empty());
        assert!(output.len() >= ATT_DEFAULT_MTU);

        let opcode = input[0];
        trace!("ATT request, opcode 0x{:02X}, {} bytes", opcode, input.len());

        match opcode {
            ATT_FIND_INFO_REQ => self.handle_find_information_request(input, output),
            ATT_READ_BY_TYPE_REQ => self.handle_read_by_type_request(input, output),
            ATT_READ_REQ => self.handle_read_request(input, output),
            ATT_READ_BY_GROUP_TYPE_REQ => self.handle_read_by_group_type_request(input, output),
            _ => error_response(opcode, ATT_ERROR_INVALID_PDU, 0, output),
        }
    }

    /// Validates a request carrying a handle range: the size must be one of
    /// `accepted`, the starting handle non-zero, no greater than the ending
    /// handle and within the table. On failure the Error Response has
    /// already been written and its length is returned in `Err`.
    fn check_size_and_handle_range(
        &self,
        input: &[u8],
        accepted: &[usize],
        output: &mut [u8],
    ) -> Result<(u16, u16), usize> {
        if !accepted.contains(&input.len()) {
            return Err(error_response(input[0], ATT_ERROR_INVALID_PDU, 0, output));
        }

        let starting = LittleEndian::read_u16(&input[1..3]);
        let ending = LittleEndian::read_u16(&input[3..5]);

        if starting == 0 || starting > ending {
            return Err(error_response(
                input[0],
                ATT_ERROR_INVALID_HANDLE,
                starting,
                output,
            ));
        }

        if starting as usize > self.database.count() {
            return Err(error_response(
                input[0],
                ATT_ERROR_ATTRIBUTE_NOT_FOUND,
                starting,
                output,
            ));
        }

        Ok((starting, ending))
    }

    /// Same rules for a request carrying a single handle.
    fn check_size_and_handle(
        &self,
        input: &[u8],
        accepted_size: usize,
        output: &mut [u8],
    ) -> Result<u16, usize> {
        if input.len() != accepted_size {
            return Err(error_response(input[0], ATT_ERROR_INVALID_PDU, 0, output));
        }

        let handle = LittleEndian::read_u16(&input[1..3]);

        if handle == 0 {
            return Err(error_response(
                input[0],
                ATT_ERROR_INVALID_HANDLE,
                handle,
                output,
            ));
        }

        if handle as usize > self.database.count() {
            return Err(error_response(
                input[0],
                ATT_ERROR_ATTRIBUTE_NOT_FOUND,
                handle,
                output,
            ));
        }

        Ok(handle)
    }

    fn handle_find_information_request(&self, input: &[u8], output: &mut [u8]) -> usize {
        let (starting, ending) =
            match self.check_size_and_handle_range(input, &[5], output) {
                Ok(range) => range,
                Err(len) => return len,
            };

        // The format of the whole response follows from the first requested
        // attribute; attributes of the other width are filtered out below.
        let only_16bit = !self
            .database
            .at(starting as usize - 1)
            .attribute_type()
            .is_128bit();

        output[0] = ATT_FIND_INFO_RSP;
        output[1] = if only_16bit {
            ATT_FIND_INFO_FORMAT_16BIT
        } else {
            ATT_FIND_INFO_FORMAT_128BIT
        };

        let cap = output.len();
        let tuples = self.collect_handle_uuid_tuples(starting, ending, only_16bit, &mut output[2..cap]);

        2 + tuples
    }

    fn collect_handle_uuid_tuples(
        &self,
        starting: u16,
        ending: u16,
        only_16bit: bool,
        out: &mut [u8],
    ) -> usize {
        let tuple_size = if only_16bit { 2 + 2 } else { 2 + 16 };

        let mut pos = 0;
        let last = ending.min(self.database.count() as u16);
        for handle in starting..=last {
            if out.len() - pos < tuple_size {
                break;
            }

            let attr = self.database.at(handle as usize - 1);

            match attr.attribute_type().uuid16() {
                Some(code) if only_16bit => {
                    LittleEndian::write_u16(&mut out[pos..pos + 2], handle);
                    LittleEndian::write_u16(&mut out[pos + 2..pos + 4], code);
                    pos += tuple_size;
                }
                None if !only_16bit => {
                    LittleEndian::write_u16(&mut out[pos..pos + 2], handle);
                    self.write_128bit_uuid(handle, &mut out[pos + 2..pos + 18]);
                    pos += tuple_size;
                }
                _ => {}
            }
        }

        pos
    }

    /// Recovers the 128-bit UUID of a characteristic value attribute from
    /// the characteristic declaration directly in front of it, which reads
    /// as properties (1), value handle (2), UUID (16).
    fn write_128bit_uuid(&self, value_handle: u16, out: &mut [u8]) {
        let declaration = self.database.at(value_handle as usize - 2);
        debug_assert_eq!(
            declaration.attribute_type().uuid16(),
            Some(CHARACTERISTIC_UUID)
        );

        let mut scratch = [0u8; 3 + 16];
        let outcome = declaration.read(&mut scratch);
        debug_assert!(matches!(outcome, Ok(ReadOutcome::Complete(19))));

        out.copy_from_slice(&scratch[3..19]);
    }

    fn handle_read_request(&self, input: &[u8], output: &mut [u8]) -> usize {
        let handle = match self.check_size_and_handle(input, 3, output) {
            Ok(handle) => handle,
            Err(len) => return len,
        };

        let cap = output.len();
        let attr = self.database.at(handle as usize - 1);

        match attr.read(&mut output[1..cap]) {
            Ok(outcome) => {
                output[0] = ATT_READ_RSP;
                1 + outcome.bytes_written()
            }
            Err(err) => error_response(input[0], err.to_error_code(), handle, output),
        }
    }

    fn handle_read_by_type_request(&self, input: &[u8], output: &mut [u8]) -> usize {
        let (starting, ending) =
            match self.check_size_and_handle_range(input, &[5 + 2, 5 + 16], output) {
                Ok(range) => range,
                Err(len) => return len,
            };

        // A 128-bit requested type is syntactically valid but can never
        // match: every attribute type in the table is a 16-bit code.
        let requested = if input.len() == 5 + 2 {
            Some(LittleEndian::read_u16(&input[5..7]))
        } else {
            None
        };

        let cap = output.len();
        let (total, pair_len) = self.collect_attributes_by_type(
            starting,
            ending,
            requested,
            &mut output[2..cap],
        );

        if total == 0 {
            return error_response(input[0], ATT_ERROR_ATTRIBUTE_NOT_FOUND, starting, output);
        }

        output[0] = ATT_READ_BY_TYPE_RSP;
        output[1] = pair_len as u8;
        2 + total
    }

    /// Collects `(handle, value)` tuples for attributes of the requested
    /// type. The first readable match fixes the tuple length; later matches
    /// are included only when their value reads to exactly the same length.
    /// A truncated read participates only when it filled the full 253-byte
    /// attribute value cap.
    fn collect_attributes_by_type(
        &self,
        starting: u16,
        ending: u16,
        requested: Option<u16>,
        out: &mut [u8],
    ) -> (usize, usize) {
        let mut pos = 0;
        let mut value_len: Option<usize> = None;

        let last = ending.min(self.database.count() as u16);
        for handle in starting..=last {
            let attr = self.database.at(handle as usize - 1);

            let matches = match (requested, attr.attribute_type().uuid16()) {
                (Some(requested), Some(code)) => requested == code,
                _ => false,
            };
            if !matches || out.len() - pos < 2 {
                continue;
            }

            let max_data = (out.len() - pos).min(ATT_MAX_TYPE_VALUE_SIZE + 2) - 2;
            let outcome = match attr.read(&mut out[pos + 2..pos + 2 + max_data]) {
                Ok(outcome) => outcome,
                Err(_) => continue,
            };

            let written = outcome.bytes_written();
            let include = matches!(outcome, ReadOutcome::Complete(_))
                || (matches!(outcome, ReadOutcome::Truncated(_))
                    && written == ATT_MAX_TYPE_VALUE_SIZE);

            if include && written == *value_len.get_or_insert(written) {
                LittleEndian::write_u16(&mut out[pos..pos + 2], handle);
                pos += 2 + written;
            }
        }

        (pos, value_len.map_or(0, |len| len + 2))
    }

    fn handle_read_by_group_type_request(&self, input: &[u8], output: &mut [u8]) -> usize {
        let (starting, ending) =
            match self.check_size_and_handle_range(input, &[5 + 2, 5 + 16], output) {
                Ok(range) => range,
                Err(len) => return len,
            };

        // Primary-service is the only grouping type the table defines.
        if input.len() == 5 + 16 || LittleEndian::read_u16(&input[5..7]) != PRIMARY_SERVICE_UUID {
            return error_response(
                input[0],
                ATT_ERROR_UNSUPPORTED_GROUP_TYPE,
                starting,
                output,
            );
        }

        let cap = output.len();
        let mut pos = 2;
        let mut attribute_data_len = 0u8;

        for service in self.database.services() {
            if service.first_handle > ending || service.last_handle < starting {
                continue;
            }

            // The first emitted service decides the shared tuple width.
            let tuple_size = match service.uuid.as_u16() {
                Some(_) => 4 + 2,
                None => 4 + 16,
            };
            if attribute_data_len == 0 {
                attribute_data_len = tuple_size as u8;
            } else if attribute_data_len != tuple_size as u8 {
                continue;
            }

            if cap - pos < tuple_size {
                break;
            }

            LittleEndian::write_u16(&mut output[pos..pos + 2], service.first_handle);
            LittleEndian::write_u16(&mut output[pos + 2..pos + 4], service.last_handle);
            match service.uuid.as_u16() {
                Some(short) => LittleEndian::write_u16(&mut output[pos + 4..pos + 6], short),
                None => output[pos + 4..pos + 20].copy_from_slice(service.uuid.as_bytes_le()),
            }

            pos += tuple_size;
        }

        if pos == 2 {
            return error_response(input[0], ATT_ERROR_ATTRIBUTE_NOT_FOUND, starting, output);
        }

        output[0] = ATT_READ_BY_GROUP_TYPE_RSP;
        output[1] = attribute_data_len;
        pos
    }
}

/// Writes the 5-byte Error Response. A response buffer that cannot even
/// hold that yields an empty response.
fn error_response(request_opcode: u8, error_code: u8, handle: u16, output: &mut [u8]) -> usize {
    if output.len() < ATT_ERROR_RSP_SIZE {
        return 0;
    }

    trace!(
        "ATT error response: opcode 0x{:02X}, handle {}, code 0x{:02X}",
        request_opcode,
        handle,
        error_code
    );

    output[0] = ATT_ERROR_RSP;
    output[1] = request_opcode;
    LittleEndian::write_u16(&mut output[2..4], handle);
    output[4] = error_code;
    ATT_ERROR_RSP_SIZE
}

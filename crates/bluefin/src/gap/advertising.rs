//! Advertising payload assembly
//!
//! Fills the up-to-31-byte data section of an ADV_IND PDU: a flags record
//! announcing general discoverability, then the device name if one is
//! configured and space remains.

use crate::gap::constants::*;

/// Writes the advertising data records into `buffer`, returning the number
/// of bytes used.
///
/// The name record carries the complete-name AD type when the whole name
/// fits and the shortened-name type otherwise. A buffer too small for even
/// the record header drops the name entirely.
pub fn fill_advertising_data(buffer: &mut [u8], name: Option<&str>) -> usize {
    let mut used = 0;

    if buffer.len() >= 3 {
        buffer[0] = 2;
        buffer[1] = AD_TYPE_FLAGS;
        buffer[2] = DEFAULT_FLAGS;
        used = 3;
    }

    if let Some(name) = name {
        let remaining = buffer.len() - used;
        if !name.is_empty() && remaining > 2 {
            let max_name_len = name.len().min(remaining - 2);

            buffer[used] = max_name_len as u8 + 1;
            buffer[used + 1] = if max_name_len == name.len() {
                AD_TYPE_COMPLETE_LOCAL_NAME
            } else {
                AD_TYPE_SHORTENED_LOCAL_NAME
            };
            buffer[used + 2..used + 2 + max_name_len]
                .copy_from_slice(&name.as_bytes()[..max_name_len]);

            used += max_name_len + 2;
        }
    }

    used
}

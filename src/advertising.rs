//! Advertising and scan response payloads.
//!
//! ```text
//! advertising:   02 01 06 | 11 07 <service UUID, 16 bytes LE>
//! scan response: NN 09 <complete local name>
//! ```
//!
//! The parse helpers walk the same length-type-value records and are used
//! to check what we put on air.

use heapless::{String, Vec};

use crate::config::{
    ACOUSTIC_CHAR_UUID, DEVICE_NAME, ENVIRONMENT_CHAR_UUID, GAS_PANEL_CHAR_UUID, SERVICE_UUID,
};

/// Longest legacy advertising / scan response payload.
pub const MAX_ADV_LEN: usize = 31;

const AD_FLAGS: u8 = 0x01;
const AD_UUID128_COMPLETE: u8 = 0x07;
const AD_NAME_SHORT: u8 = 0x08;
const AD_NAME_COMPLETE: u8 = 0x09;

/// LE General Discoverable, BR/EDR not supported.
const FLAGS_GENERAL_NO_BREDR: u8 = 0x06;

pub const SERVICE_UUID_LE: [u8; 16] = uuid128_le(SERVICE_UUID);
pub const GAS_PANEL_UUID_LE: [u8; 16] = uuid128_le(GAS_PANEL_CHAR_UUID);
pub const ENVIRONMENT_UUID_LE: [u8; 16] = uuid128_le(ENVIRONMENT_CHAR_UUID);
pub const ACOUSTIC_UUID_LE: [u8; 16] = uuid128_le(ACOUSTIC_CHAR_UUID);

/// Advertising payload for the sensor service.
pub const ADV_DATA: [u8; 21] = advertising_data(&SERVICE_UUID_LE);

/// Parse a textual 128-bit UUID into over-the-air (little-endian) order.
///
/// Evaluated at compile time for the constants above, so a malformed
/// UUID string fails the build.
pub const fn uuid128_le(uuid: &str) -> [u8; 16] {
    let text = uuid.as_bytes();
    let mut out = [0u8; 16];
    let mut nibbles = 0;
    let mut i = 0;
    while i < text.len() {
        let c = text[i];
        i += 1;
        if c == b'-' {
            continue;
        }
        let v = match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            b'A'..=b'F' => c - b'A' + 10,
            _ => panic!("invalid hex digit in UUID"),
        };
        assert!(nibbles < 32, "UUID has more than 32 hex digits");
        let byte = 15 - nibbles / 2;
        if nibbles % 2 == 0 {
            out[byte] = v << 4;
        } else {
            out[byte] |= v;
        }
        nibbles += 1;
    }
    assert!(nibbles == 32, "UUID has fewer than 32 hex digits");
    out
}

/// Flags plus the complete list of 128-bit service UUIDs (just ours).
pub const fn advertising_data(service_uuid_le: &[u8; 16]) -> [u8; 21] {
    let mut out = [0u8; 21];
    out[0] = 0x02;
    out[1] = AD_FLAGS;
    out[2] = FLAGS_GENERAL_NO_BREDR;
    out[3] = 0x11;
    out[4] = AD_UUID128_COMPLETE;
    let mut i = 0;
    while i < 16 {
        out[5 + i] = service_uuid_le[i];
        i += 1;
    }
    out
}

/// Scan response carrying the device name. Names that do not fit are
/// cut and sent as a shortened name.
pub fn scan_response(name: &str) -> Vec<u8, MAX_ADV_LEN> {
    let max_name = MAX_ADV_LEN - 2;
    let bytes = name.as_bytes();
    let (ad_type, name_bytes) = if bytes.len() > max_name {
        (AD_NAME_SHORT, &bytes[..max_name])
    } else {
        (AD_NAME_COMPLETE, bytes)
    };

    let mut out = Vec::new();
    // Fits: 2 + max_name == MAX_ADV_LEN.
    let _ = out.push(name_bytes.len() as u8 + 1);
    let _ = out.push(ad_type);
    let _ = out.extend_from_slice(name_bytes);
    out
}

/// Scan response for [`DEVICE_NAME`].
pub fn default_scan_response() -> Vec<u8, MAX_ADV_LEN> {
    scan_response(DEVICE_NAME)
}

/// Payload of the first record of type `ad_type`, if any.
pub fn find_ad(data: &[u8], ad_type: u8) -> Option<&[u8]> {
    let mut i = 0;
    while i < data.len() {
        let len = data[i] as usize;
        if len == 0 || i + len >= data.len() {
            break;
        }
        if data[i + 1] == ad_type {
            return Some(&data[i + 2..i + 1 + len]);
        }
        i += len + 1;
    }
    None
}

/// Check if advertising data lists `uuid_le` among its 128-bit service UUIDs.
pub fn contains_service_uuid128(data: &[u8], uuid_le: &[u8; 16]) -> bool {
    [AD_UUID128_COMPLETE, 0x06]
        .iter()
        .filter_map(|&t| find_ad(data, t))
        .any(|uuids| uuids.chunks_exact(16).any(|chunk| chunk == uuid_le))
}

/// Extract complete/shortened local name from advertisement data.
pub fn extract_device_name(data: &[u8]) -> Option<String<32>> {
    let name_bytes = find_ad(data, AD_NAME_COMPLETE).or_else(|| find_ad(data, AD_NAME_SHORT))?;
    let mut name = String::new();
    for &b in name_bytes {
        if name.push(b as char).is_err() {
            break;
        }
    }
    Some(name)
}

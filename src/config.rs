//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use crate::connection::LinkPolicy;

// BLE

/// Complete local name carried in the scan response.
pub const DEVICE_NAME: &str = "RoomMonitor";

/// Primary sensor service UUID.
///
/// The same string literals are repeated in the `gatt_service` attribute
/// macros of `radio::server`, which only accept literals.
pub const SERVICE_UUID: &str = "47617353-656e-736f-7253-766300000000";

/// Gas panel characteristic (5 × f32).
pub const GAS_PANEL_CHAR_UUID: &str = "47617352-6561-6469-6e67-730000000000";

/// Temperature / humidity characteristic (2 × f32).
pub const ENVIRONMENT_CHAR_UUID: &str = "456e7669-726f-6e6d-656e-740000000000";

/// Sound event counter characteristic (u32).
pub const ACOUSTIC_CHAR_UUID: &str = "536f756e-6444-6574-6563-740000000000";

/// What to do when a central connects while another link is live.
pub const LINK_POLICY: LinkPolicy = LinkPolicy::RejectNew;

/// Advertising interval (in 0.625 ms units). 400 = 250 ms.
pub const BLE_ADV_INTERVAL: u32 = 400;

/// Preferred BLE connection interval range (in 1.25 ms units), requested
/// from the central after it connects.
/// Readings change every couple of seconds, so there is no need for a tight interval.
pub const BLE_CONN_INTERVAL_MIN: u16 = 24;
pub const BLE_CONN_INTERVAL_MAX: u16 = 40;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// ATT MTU requested from the SoftDevice.
pub const BLE_ATT_MTU: u16 = 64;

// Orchestration

/// Gas panel polling period (ms).
pub const GAS_POLL_PERIOD_MS: u64 = 2_000;

/// Temperature / humidity polling period (ms).
pub const ENVIRONMENT_POLL_PERIOD_MS: u64 = 2_000;

/// Depth of the single-consumer event queue feeding the orchestrator.
pub const EVENT_QUEUE_DEPTH: usize = 16;

// Gas sensor (Grove multichannel gas sensor, I²C)

/// 7-bit I²C address of the gas sensor.
pub const GAS_SENSOR_ADDR: u8 = 0x04;

/// Channel registers, in wire order: CO, NO2, NH3, CH4, C2H5OH.
pub const GAS_CHANNEL_REGISTERS: [u8; 5] = [0x02, 0x04, 0x06, 0x08, 0x0A];

/// Raw register counts per ppm.
pub const GAS_SCALE: f32 = 100.0;

// DHT11

/// Host start signal: hold the line low for at least 18 ms.
pub const DHT11_START_LOW_MS: u32 = 20;

/// Give up on any single line transition after this long (µs).
pub const DHT11_EDGE_TIMEOUT_US: u32 = 120;

/// High pulses longer than this encode a `1` bit (µs).
pub const DHT11_BIT_THRESHOLD_US: u32 = 40;

// GPIO pin assignments (nRF52840-DK)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom board.
//
//   Sound detector DO → P0.03 (falling edge = sound)
//   DHT11 data        → P0.04 (open drain, external pull-up)
//   I²C SDA           → P0.26
//   I²C SCL           → P0.27

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_are_pinned() {
        assert_eq!(SERVICE_UUID, "47617353-656e-736f-7253-766300000000");
        assert_eq!(GAS_PANEL_CHAR_UUID, "47617352-6561-6469-6e67-730000000000");
        assert_eq!(ENVIRONMENT_CHAR_UUID, "456e7669-726f-6e6d-656e-740000000000");
        assert_eq!(ACOUSTIC_CHAR_UUID, "536f756e-6444-6574-6563-740000000000");
    }

    #[test]
    fn gatt_server_uses_the_same_uuids() {
        let server = include_str!("radio/server.rs");
        for uuid in [
            SERVICE_UUID,
            GAS_PANEL_CHAR_UUID,
            ENVIRONMENT_CHAR_UUID,
            ACOUSTIC_CHAR_UUID,
        ] {
            assert!(
                server.contains(&format!("uuid = \"{}\"", uuid)),
                "radio/server.rs does not declare {}",
                uuid
            );
        }
    }

    #[test]
    fn connection_parameters_are_valid() {
        // Core spec limits: interval 7.5 ms..4 s, latency < 500,
        // supervision timeout 100 ms..32 s.
        assert!((6..=3200).contains(&BLE_CONN_INTERVAL_MIN));
        assert!((BLE_CONN_INTERVAL_MIN..=3200).contains(&BLE_CONN_INTERVAL_MAX));
        assert!(BLE_SLAVE_LATENCY < 500);
        assert!((10..=3200).contains(&BLE_SUP_TIMEOUT));

        // The link must survive a full latency window at the longest interval.
        let timeout_us = u32::from(BLE_SUP_TIMEOUT) * 10_000;
        let window_us =
            (1 + u32::from(BLE_SLAVE_LATENCY)) * u32::from(BLE_CONN_INTERVAL_MAX) * 1_250 * 2;
        assert!(timeout_us > window_us);
    }
}

//! Characteristic wire layouts.
//!
//! ```text
//! Gas panel   (20 bytes): co | no2 | nh3 | ch4 | etoh   each f32 LE
//! Environment  (8 bytes): temperature °C | humidity %   each f32 LE
//! Acoustic     (4 bytes): edge counter                  u32 LE
//! ```
//!
//! Every field is composed into a local buffer first; callers hand the
//! finished buffer to the registry in one call.

use crate::reading::{EnvironmentReading, GasPanelReading, SensorReading, GAS_CHANNEL_COUNT};

/// Gas panel characteristic size in bytes.
pub const GAS_PANEL_LEN: usize = GAS_CHANNEL_COUNT * 4;

/// Environment characteristic size in bytes.
pub const ENVIRONMENT_LEN: usize = 8;

/// Acoustic counter characteristic size in bytes.
pub const ACOUSTIC_LEN: usize = 4;

/// Largest characteristic buffer.
pub const MAX_VALUE_LEN: usize = GAS_PANEL_LEN;

pub fn encode_gas_panel(reading: &GasPanelReading) -> [u8; GAS_PANEL_LEN] {
    let mut out = [0u8; GAS_PANEL_LEN];
    for (chunk, value) in out.chunks_exact_mut(4).zip(reading.channels()) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn encode_environment(reading: &EnvironmentReading) -> [u8; ENVIRONMENT_LEN] {
    let mut out = [0u8; ENVIRONMENT_LEN];
    out[0..4].copy_from_slice(&reading.temperature_c.to_le_bytes());
    out[4..8].copy_from_slice(&reading.humidity_pct.to_le_bytes());
    out
}

pub fn encode_acoustic(counter: u32) -> [u8; ACOUSTIC_LEN] {
    counter.to_le_bytes()
}

impl SensorReading {
    /// Serialise into `buf` using the characteristic's wire layout.
    /// Returns the number of bytes written, or 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        match self {
            SensorReading::GasPanel(r) => copy_into(buf, &encode_gas_panel(r)),
            SensorReading::Environment(r) => copy_into(buf, &encode_environment(r)),
            SensorReading::AcousticEvent(n) => copy_into(buf, &encode_acoustic(*n)),
        }
    }
}

fn copy_into(buf: &mut [u8], bytes: &[u8]) -> usize {
    if buf.len() < bytes.len() {
        return 0;
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    bytes.len()
}

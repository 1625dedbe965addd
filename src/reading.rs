//! Typed sensor readings.
//!
//! Readings are transient: a sensor task produces one, the orchestrator
//! encodes it into the matching characteristic buffer, and it is dropped.

use core::fmt;

use crate::error::ReadError;
use crate::registry::CharId;

/// Value published for a gas channel whose register read failed.
pub const GAS_SENTINEL: f32 = -1.0;

/// Number of channels on the gas panel.
pub const GAS_CHANNEL_COUNT: usize = 5;

/// Gas panel channels, in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GasChannel {
    /// Carbon monoxide.
    Co,
    /// Nitrogen dioxide.
    No2,
    /// Ammonia.
    Nh3,
    /// Methane.
    Ch4,
    /// Ethanol.
    Ethanol,
}

impl GasChannel {
    pub const ALL: [GasChannel; GAS_CHANNEL_COUNT] = [
        GasChannel::Co,
        GasChannel::No2,
        GasChannel::Nh3,
        GasChannel::Ch4,
        GasChannel::Ethanol,
    ];

    /// Position of this channel in the wire layout.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            GasChannel::Co => "CO",
            GasChannel::No2 => "NO2",
            GasChannel::Nh3 => "NH3",
            GasChannel::Ch4 => "CH4",
            GasChannel::Ethanol => "EtOH",
        }
    }
}

impl fmt::Display for GasChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Five gas concentrations in ppm, sentinel-substituted.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasPanelReading {
    pub co: f32,
    pub no2: f32,
    pub nh3: f32,
    pub ch4: f32,
    pub etoh: f32,
}

impl GasPanelReading {
    /// Build from values in wire order.
    pub const fn from_channels(values: [f32; GAS_CHANNEL_COUNT]) -> Self {
        Self {
            co: values[0],
            no2: values[1],
            nh3: values[2],
            ch4: values[3],
            etoh: values[4],
        }
    }

    /// Values in wire order.
    pub const fn channels(&self) -> [f32; GAS_CHANNEL_COUNT] {
        [self.co, self.no2, self.nh3, self.ch4, self.etoh]
    }

    pub fn get(&self, channel: GasChannel) -> f32 {
        self.channels()[channel.index()]
    }
}

/// Raw outcome of one gas panel poll: each channel succeeds or fails
/// independently.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GasSample {
    pub channels: [Result<f32, ReadError>; GAS_CHANNEL_COUNT],
}

impl GasSample {
    /// A sample where every channel failed with `err`.
    pub const fn all_failed(err: ReadError) -> Self {
        Self {
            channels: [Err(err); GAS_CHANNEL_COUNT],
        }
    }

    pub fn failed_channels(&self) -> usize {
        self.channels.iter().filter(|c| c.is_err()).count()
    }

    /// Collapse into a publishable reading, substituting [`GAS_SENTINEL`]
    /// for every failed channel.
    pub fn to_reading(&self) -> GasPanelReading {
        let mut values = [GAS_SENTINEL; GAS_CHANNEL_COUNT];
        for (value, channel) in values.iter_mut().zip(self.channels.iter()) {
            if let Ok(v) = channel {
                *value = *v;
            }
        }
        GasPanelReading::from_channels(values)
    }
}

/// Temperature (°C) and relative humidity (%).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnvironmentReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// One reading from any of the three sources.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorReading {
    GasPanel(GasPanelReading),
    Environment(EnvironmentReading),
    /// Running count of detected sound edges.
    AcousticEvent(u32),
}

impl SensorReading {
    /// Characteristic this reading is published on.
    pub const fn char_id(&self) -> CharId {
        match self {
            SensorReading::GasPanel(_) => CharId::GasPanel,
            SensorReading::Environment(_) => CharId::Environment,
            SensorReading::AcousticEvent(_) => CharId::Acoustic,
        }
    }
}

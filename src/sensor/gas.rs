//! Grove multichannel gas sensor over I²C.
//!
//! Each channel is a 16-bit big-endian register holding ppm × 100:
//!
//! ```text
//! 0x02 CO | 0x04 NO2 | 0x06 NH3 | 0x08 CH4 | 0x0A C2H5OH
//! ```
//!
//! Channels are read independently; one failed register read does not
//! spoil the other four.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};

use crate::config::{GAS_CHANNEL_REGISTERS, GAS_SCALE, GAS_SENSOR_ADDR};
use crate::error::ReadError;
use crate::reading::{GasChannel, GasSample};
use crate::sensor::PolledSource;

pub struct GasPanelSensor<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> GasPanelSensor<I2C> {
    /// Sensor at the default address.
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, GAS_SENSOR_ADDR)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Read one channel in ppm.
    pub fn read_channel(&mut self, channel: GasChannel) -> Result<f32, ReadError> {
        let register = GAS_CHANNEL_REGISTERS[channel.index()];
        let mut raw = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut raw)
            .map_err(|e| map_i2c_error(e.kind()))?;
        Ok(f32::from(u16::from_be_bytes(raw)) / GAS_SCALE)
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> PolledSource for GasPanelSensor<I2C> {
    type Reading = GasSample;

    fn read(&mut self) -> Result<GasSample, ReadError> {
        Ok(GasSample {
            channels: GasChannel::ALL.map(|channel| self.read_channel(channel)),
        })
    }
}

fn map_i2c_error(kind: ErrorKind) -> ReadError {
    match kind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => ReadError::NotReady,
        _ => ReadError::Bus,
    }
}

//! room-monitor: BLE sensor bridge for the nRF52840.
//!
//! This library holds everything that does not touch hardware: the
//! connection manager, the characteristic registry, the orchestrator, the
//! wire layout and the sensor adapters (generic over `embedded-hal`).
//!
//! Usage: `cargo test` on the host.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and is only built with `--features embedded`.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod advertising;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod reading;
pub mod registry;
pub mod sensor;
pub mod wire;

pub use connection::{
    ConnectionManager, DisconnectReason, LinkChange, LinkPolicy, LinkState, Transport,
};
pub use error::{Error, LinkError, NotifyError, ReadError, RegistryError, TransportError};
pub use event::{Event, EventSink, PendingSubscriptions};
pub use orchestrator::{Context, Orchestrator, Step};
pub use reading::{EnvironmentReading, GasChannel, GasPanelReading, GasSample, SensorReading};
pub use registry::{CharId, CharacteristicRegistry};
pub use sensor::{EdgeListener, PolledSource};

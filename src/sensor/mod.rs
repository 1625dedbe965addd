//! Sensor source adapters.
//!
//! Two shapes of source feed the orchestrator:
//!
//! - **Polled** ([`PolledSource`]): the gas panel and the DHT11 are read
//!   once per period by their own task.
//! - **Event-driven** ([`EdgeListener`]): the sound detector calls back on
//!   every edge.
//!
//! The concrete adapters are generic over `embedded-hal` traits, so they
//! run against fakes on the host.

pub mod acoustic;
pub mod dht11;
pub mod gas;

use crate::error::ReadError;

pub use acoustic::EdgeForwarder;
pub use dht11::Dht11;
pub use gas::GasPanelSensor;

/// A sensor that produces one typed reading per call.
pub trait PolledSource {
    type Reading;

    /// Perform one complete read. Must not retry internally.
    fn read(&mut self) -> Result<Self::Reading, ReadError>;
}

/// Capability handed to an edge detector at startup.
///
/// `on_edge` may run in interrupt-adjacent context, so implementations
/// must not block.
pub trait EdgeListener {
    fn on_edge(&self);
}

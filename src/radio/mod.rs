//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **GATT server** - one sensor service with three read + notify
//!    characteristics (gas panel, environment, sound counter).
//! 2. **Transport** - the [`room_monitor::Transport`] implementation the
//!    orchestrator uses to notify, update attribute values and drop links.
//! 3. **Peripheral loop** - advertises, accepts a central, forwards link
//!    and CCCD events into the orchestrator's queue, repeats.

pub mod peripheral;
pub mod server;

pub use server::{GattTransport, Link, Server};

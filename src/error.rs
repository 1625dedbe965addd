//! Unified error types for room-monitor.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

use crate::registry::CharId;

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A characteristic registry contract was violated.
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    /// The radio stack failed underneath us; the pipeline halted.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

/// Programming errors against the characteristic registry.
///
/// None of these are environmental: they mean a caller broke the
/// registry's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// `define` was called twice for the same characteristic.
    #[error("characteristic {0} is already defined")]
    DuplicateId(CharId),

    /// The characteristic was never defined.
    #[error("characteristic {0} is not defined")]
    Undefined(CharId),

    /// Capacity must be between 1 and the registry's maximum buffer size.
    #[error("capacity {requested} for {id} is outside 1..={max}")]
    InvalidCapacity {
        id: CharId,
        requested: usize,
        max: usize,
    },

    /// A zero-length payload was written.
    #[error("empty payload written to {0}")]
    EmptyPayload(CharId),
}

/// Why a notification was not dispatched.
///
/// `NotConnected` and `NotSubscribed` are the normal state of affairs
/// while no central is listening and are never escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyError {
    /// No central is connected.
    #[error("no central connected")]
    NotConnected,

    /// The central has not enabled notifications for this characteristic.
    #[error("notifications not enabled")]
    NotSubscribed,

    /// The radio stack refused the notification.
    #[error("transport rejected notification: {0}")]
    Transport(TransportError),
}

impl From<TransportError> for NotifyError {
    fn from(e: TransportError) -> Self {
        NotifyError::Transport(e)
    }
}

/// Subset of radio stack errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Advertising could not be started.
    #[error("advertising failed")]
    Advertising,

    /// The stack's notification queue is full.
    #[error("notification queue full")]
    QueueFull,

    /// The link disappeared underneath the call.
    #[error("link disconnected")]
    Disconnected,

    /// Value length does not match the attribute.
    #[error("value length {0} does not match attribute")]
    Length(usize),

    /// Raw error code from the stack.
    #[error("stack error {0}")]
    Raw(u32),
}

/// Sensor read failures. Always recoverable; the orchestrator logs them
/// and never returns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    /// The bus transaction failed (NACK, arbitration loss, ...).
    #[error("bus error")]
    Bus,

    /// The device did not answer in time.
    #[error("device timed out")]
    Timeout,

    /// The device answered with a frame that failed validation.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },

    /// The device is not ready (still powering up, not probed).
    #[error("device not ready")]
    NotReady,
}

/// Outcome of a second link arriving while one is already live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The new link was refused; the existing one stays.
    #[error("a central is already connected")]
    AlreadyConnected,
}

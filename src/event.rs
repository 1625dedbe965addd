//! Events funnelled from every execution context into the orchestrator.
//!
//! Sensor tasks, the sound-edge waiter and the radio stack's connection
//! task never touch the registry or the link state themselves; they push
//! an [`Event`] into one bounded queue that only the orchestrator drains.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::connection::DisconnectReason;
use crate::error::{ReadError, TransportError};
use crate::reading::{EnvironmentReading, GasSample};
use crate::registry::CharId;

/// Everything the orchestrator reacts to. `H` is the transport's link handle.
#[derive(Clone, Debug, PartialEq)]
pub enum Event<H> {
    /// A central connected.
    LinkEstablished(H),
    /// A link dropped.
    LinkLost(H, DisconnectReason),
    /// `link` wrote a CCC descriptor.
    Subscription { link: H, id: CharId, enabled: bool },
    /// One gas panel poll finished.
    Gas(Result<GasSample, ReadError>),
    /// One temperature / humidity poll finished.
    Environment(Result<EnvironmentReading, ReadError>),
    /// The sound detector saw an edge.
    AcousticEdge,
    /// The radio stack failed in a way notification cannot survive.
    TransportFault(TransportError),
}

/// Producer side of the orchestrator's queue.
pub trait EventSink {
    type Handle;

    /// Enqueue without waiting. A full queue hands the event back.
    fn try_push(&self, event: Event<Self::Handle>) -> Result<(), Event<Self::Handle>>;
}

const NO_CHANGE: u8 = 0;
const DISABLED: u8 = 1;
const ENABLED: u8 = 2;

/// Latest CCC descriptor state per characteristic, waiting to be queued.
///
/// The radio context records writes here without blocking; a task then
/// moves them into the event queue, waiting for space if it has to.
/// Repeated writes to one descriptor collapse into the last one, so a full
/// queue delays a subscription change but never loses it.
pub struct PendingSubscriptions {
    slots: [AtomicU8; CharId::COUNT],
}

impl PendingSubscriptions {
    pub const fn new() -> Self {
        Self {
            slots: [
                AtomicU8::new(NO_CHANGE),
                AtomicU8::new(NO_CHANGE),
                AtomicU8::new(NO_CHANGE),
            ],
        }
    }

    pub fn record(&self, id: CharId, enabled: bool) {
        let state = if enabled { ENABLED } else { DISABLED };
        self.slots[id.index()].store(state, Ordering::Release);
    }

    /// Take every recorded change, in characteristic order.
    pub fn take(&self) -> impl Iterator<Item = (CharId, bool)> + '_ {
        CharId::ALL.into_iter().filter_map(move |id| {
            match self.slots[id.index()].swap(NO_CHANGE, Ordering::AcqRel) {
                ENABLED => Some((id, true)),
                DISABLED => Some((id, false)),
                _ => None,
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| slot.load(Ordering::Acquire) == NO_CHANGE)
    }
}

impl Default for PendingSubscriptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let pending = PendingSubscriptions::new();
        assert!(pending.is_empty());
        assert_eq!(pending.take().count(), 0);
    }

    #[test]
    fn last_write_per_descriptor_wins() {
        let pending = PendingSubscriptions::new();
        pending.record(CharId::Acoustic, true);
        pending.record(CharId::Acoustic, false);
        pending.record(CharId::Acoustic, true);
        pending.record(CharId::GasPanel, false);

        let taken: heapless::Vec<(CharId, bool), 3> = pending.take().collect();
        assert_eq!(
            taken.as_slice(),
            &[(CharId::GasPanel, false), (CharId::Acoustic, true)]
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn writes_after_take_are_kept() {
        let pending = PendingSubscriptions::new();
        pending.record(CharId::Environment, true);
        assert_eq!(pending.take().count(), 1);

        pending.record(CharId::Environment, false);
        assert!(!pending.is_empty());
        let taken: heapless::Vec<(CharId, bool), 3> = pending.take().collect();
        assert_eq!(taken.as_slice(), &[(CharId::Environment, false)]);
    }
}

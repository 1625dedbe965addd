//! Characteristic registry - one fixed-size value buffer and one
//! subscription flag per published signal.
//!
//! Slots are indexed by [`CharId`], so lookups never depend on the order
//! in which characteristics were declared to the radio stack.
//!
//! Write policy: a write copies at most `capacity` bytes (longer input is
//! silently truncated) and zero-fills whatever the payload did not cover,
//! so the buffer always holds exactly `capacity` bytes and nothing from a
//! previous write survives.

use core::fmt;

use heapless::Vec;

use crate::error::RegistryError;
use crate::wire::{ACOUSTIC_LEN, ENVIRONMENT_LEN, GAS_PANEL_LEN, MAX_VALUE_LEN};

/// Stable identifier for each published characteristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharId {
    /// Five gas concentrations.
    GasPanel,
    /// Temperature and humidity.
    Environment,
    /// Sound edge counter.
    Acoustic,
}

impl CharId {
    pub const COUNT: usize = 3;

    pub const ALL: [CharId; CharId::COUNT] =
        [CharId::GasPanel, CharId::Environment, CharId::Acoustic];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Buffer size mandated by the wire layout.
    pub const fn wire_len(self) -> usize {
        match self {
            CharId::GasPanel => GAS_PANEL_LEN,
            CharId::Environment => ENVIRONMENT_LEN,
            CharId::Acoustic => ACOUSTIC_LEN,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CharId::GasPanel => "gas",
            CharId::Environment => "env",
            CharId::Acoustic => "sound",
        }
    }
}

impl fmt::Display for CharId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Slot {
    value: Vec<u8, MAX_VALUE_LEN>,
    subscribed: bool,
}

/// Owns every characteristic buffer and its subscription flag.
///
/// All mutation goes through `&mut self`; the orchestrator owns the
/// registry, so writers in other execution contexts have to send events
/// rather than touch buffers directly.
pub struct CharacteristicRegistry {
    slots: [Option<Slot>; CharId::COUNT],
}

impl CharacteristicRegistry {
    /// An empty registry with nothing defined.
    pub const fn new() -> Self {
        Self {
            slots: [None, None, None],
        }
    }

    /// A registry with all three characteristics defined at their wire sizes.
    pub fn with_wire_layout() -> Self {
        let mut registry = Self::new();
        for id in CharId::ALL {
            let defined = registry.define(id, id.wire_len());
            // Every wire length is within 1..=MAX_VALUE_LEN and each id
            // appears once in ALL.
            debug_assert_eq!(defined, Ok(()));
        }
        registry
    }

    /// Register `id` with a fixed buffer of `capacity` bytes, zero-initialised.
    pub fn define(&mut self, id: CharId, capacity: usize) -> Result<(), RegistryError> {
        if capacity == 0 || capacity > MAX_VALUE_LEN {
            return Err(RegistryError::InvalidCapacity {
                id,
                requested: capacity,
                max: MAX_VALUE_LEN,
            });
        }
        let slot = &mut self.slots[id.index()];
        if slot.is_some() {
            return Err(RegistryError::DuplicateId(id));
        }
        *slot = Some(Slot::zeroed(capacity));
        Ok(())
    }

    pub fn is_defined(&self, id: CharId) -> bool {
        self.slots[id.index()].is_some()
    }

    pub fn capacity(&self, id: CharId) -> Option<usize> {
        self.slot(id).ok().map(|s| s.value.len())
    }

    /// Current buffer contents; always exactly `capacity` bytes.
    pub fn read(&self, id: CharId) -> Result<&[u8], RegistryError> {
        Ok(self.slot(id)?.value.as_slice())
    }

    /// Replace the buffer contents. Returns how many payload bytes were kept.
    pub fn write(&mut self, id: CharId, bytes: &[u8]) -> Result<usize, RegistryError> {
        if bytes.is_empty() {
            return Err(RegistryError::EmptyPayload(id));
        }
        let slot = self.slot_mut(id)?;
        let capacity = slot.value.len();
        let kept = bytes.len().min(capacity);
        if kept < bytes.len() {
            debug!("{}: truncating {} byte write to {}", id, bytes.len(), capacity);
        }

        slot.value[..kept].copy_from_slice(&bytes[..kept]);
        slot.value[kept..].fill(0);
        Ok(kept)
    }

    /// Record the central's CCC descriptor write.
    pub fn set_subscription(&mut self, id: CharId, enabled: bool) -> Result<(), RegistryError> {
        self.slot_mut(id)?.subscribed = enabled;
        Ok(())
    }

    /// `false` for characteristics that were never defined.
    pub fn is_subscribed(&self, id: CharId) -> bool {
        self.slot(id).map(|s| s.subscribed).unwrap_or(false)
    }

    /// Drop every subscription (the link carrying them is gone).
    pub fn clear_subscriptions(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.subscribed = false;
        }
    }

    fn slot(&self, id: CharId) -> Result<&Slot, RegistryError> {
        self.slots[id.index()]
            .as_ref()
            .ok_or(RegistryError::Undefined(id))
    }

    fn slot_mut(&mut self, id: CharId) -> Result<&mut Slot, RegistryError> {
        self.slots[id.index()]
            .as_mut()
            .ok_or(RegistryError::Undefined(id))
    }
}

impl Default for CharacteristicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Slot {
    fn zeroed(capacity: usize) -> Self {
        let mut value = Vec::new();
        // Capacity is validated against MAX_VALUE_LEN by every caller.
        let _ = value.resize(capacity, 0);
        Self {
            value,
            subscribed: false,
        }
    }
}

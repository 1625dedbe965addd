//! Single-central connection manager.
//!
//! Tracks at most one live link and gates every notification on it:
//!
//! ```text
//!            link established
//!   Idle  ───────────────────────▶  Connected
//!    ▲                                │   │ link established (LinkPolicy)
//!    └──────── link lost ─────────────┘   ▼
//!                                      Connected
//! ```
//!
//! The radio stack is reached through the [`Transport`] trait so the state
//! machine runs unchanged on the host.

use core::fmt;

use crate::error::{LinkError, NotifyError, TransportError};
use crate::registry::{CharId, CharacteristicRegistry};

/// Seam between the connection logic and the radio stack.
pub trait Transport {
    /// Identity of one link. Equality decides whether a link-lost event
    /// refers to the stored connection.
    type Handle: Clone + PartialEq;

    /// Queue a notification. Must not wait for the central.
    fn notify(&mut self, link: &Self::Handle, id: CharId, value: &[u8])
        -> Result<(), TransportError>;

    /// Update the value the stack serves for pull-based reads.
    fn publish(&mut self, id: CharId, value: &[u8]) -> Result<(), TransportError>;

    /// Drop a link this manager will not keep.
    fn release(&mut self, link: Self::Handle);
}

/// What happens when a central connects while another link is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkPolicy {
    /// Keep the existing link, release the newcomer.
    RejectNew,
    /// Release the existing link first, then adopt the newcomer.
    ReplaceOld,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Idle,
    Connected,
}

/// Outcome of an accepted link-established event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkChange {
    /// No link was live; the newcomer is now the connection.
    Adopted,
    /// The stored link was announced again.
    Unchanged,
    /// The previous link was released and the newcomer took its place.
    /// Anything tied to the old link (subscriptions) no longer applies.
    Replaced,
}

/// HCI disconnect reason, as reported by the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisconnectReason {
    /// 0x08
    SupervisionTimeout,
    /// 0x13
    RemoteUserTerminated,
    /// 0x16
    LocalHostTerminated,
    /// The stack did not say.
    Unknown,
    Other(u8),
}

impl DisconnectReason {
    pub const fn from_hci(code: u8) -> Self {
        match code {
            0x08 => DisconnectReason::SupervisionTimeout,
            0x13 => DisconnectReason::RemoteUserTerminated,
            0x16 => DisconnectReason::LocalHostTerminated,
            other => DisconnectReason::Other(other),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::SupervisionTimeout => f.write_str("supervision timeout"),
            DisconnectReason::RemoteUserTerminated => f.write_str("remote terminated"),
            DisconnectReason::LocalHostTerminated => f.write_str("local terminated"),
            DisconnectReason::Unknown => f.write_str("unknown"),
            DisconnectReason::Other(code) => write!(f, "hci {:#04x}", code),
        }
    }
}

/// Owns the (at most one) live link and the transport used to reach it.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    current: Option<T::Handle>,
    policy: LinkPolicy,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, policy: LinkPolicy) -> Self {
        Self {
            transport,
            current: None,
            policy,
        }
    }

    pub fn state(&self) -> LinkState {
        if self.current.is_some() {
            LinkState::Connected
        } else {
            LinkState::Idle
        }
    }

    pub fn is_connected(&self) -> bool {
        self.current.is_some()
    }

    pub fn policy(&self) -> LinkPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Whether `handle` is the stored connection.
    pub fn holds(&self, handle: &T::Handle) -> bool {
        self.current.as_ref() == Some(handle)
    }

    /// A central connected.
    ///
    /// Re-announcing the stored link is a no-op.  Otherwise, with a link
    /// already live, the configured [`LinkPolicy`] picks which handle is
    /// released; the release always happens before the new state is stored.
    pub fn on_link_established(&mut self, handle: T::Handle) -> Result<LinkChange, LinkError> {
        match self.current.take() {
            None => {
                info!("Central connected");
                self.current = Some(handle);
                Ok(LinkChange::Adopted)
            }
            Some(existing) if existing == handle => {
                self.current = Some(existing);
                Ok(LinkChange::Unchanged)
            }
            Some(existing) => match self.policy {
                LinkPolicy::RejectNew => {
                    warn!("Second central refused - already connected");
                    self.current = Some(existing);
                    self.transport.release(handle);
                    Err(LinkError::AlreadyConnected)
                }
                LinkPolicy::ReplaceOld => {
                    warn!("Second central replaces the existing link");
                    self.transport.release(existing);
                    self.current = Some(handle);
                    Ok(LinkChange::Replaced)
                }
            },
        }
    }

    /// A link dropped. Returns `true` if it was the stored connection;
    /// stale or repeated events are ignored.
    pub fn on_link_lost(&mut self, handle: &T::Handle, reason: DisconnectReason) -> bool {
        if self.holds(handle) {
            info!("Central disconnected ({})", reason);
            self.current = None;
            true
        } else {
            debug!("Ignoring disconnect of a link we do not hold ({})", reason);
            false
        }
    }

    /// Push `value` to the central if it is connected and subscribed to `id`.
    ///
    /// At most one transport call per invocation, never retried.
    pub fn notify(
        &mut self,
        registry: &CharacteristicRegistry,
        id: CharId,
        value: &[u8],
    ) -> Result<(), NotifyError> {
        let Some(link) = self.current.as_ref() else {
            return Err(NotifyError::NotConnected);
        };
        if !registry.is_subscribed(id) {
            return Err(NotifyError::NotSubscribed);
        }
        self.transport.notify(link, id, value)?;
        Ok(())
    }

    /// Mirror `value` into the stack's readable attribute.
    pub fn publish(&mut self, id: CharId, value: &[u8]) -> Result<(), TransportError> {
        self.transport.publish(id, value)
    }
}

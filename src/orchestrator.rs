//! The orchestrator: the only reader of the event queue and the only
//! writer of link state, characteristic buffers and subscription flags.
//!
//! Every event runs to completion before the next is taken:
//!
//! ```text
//! Gas / Environment / AcousticEdge
//!     → typed reading → wire bytes (local buffer)
//!     → registry.write → transport.publish → connection.notify
//! ```
//!
//! Notify failures never propagate out of [`Orchestrator::handle`]; they are
//! logged and reported in the returned [`Step`].

use crate::connection::{ConnectionManager, LinkChange, LinkPolicy, LinkState, Transport};
use crate::error::{Error, NotifyError, ReadError};
use crate::event::Event;
use crate::reading::{EnvironmentReading, GasChannel, GasSample, SensorReading};
use crate::registry::{CharId, CharacteristicRegistry};
use crate::wire::MAX_VALUE_LEN;

/// Everything the pipeline mutates, owned in one place.
pub struct Context<T: Transport> {
    pub connection: ConnectionManager<T>,
    pub registry: CharacteristicRegistry,
}

impl<T: Transport> Context<T> {
    /// Fresh context with all three characteristics defined and no link.
    pub fn new(transport: T, policy: LinkPolicy) -> Self {
        Self {
            connection: ConnectionManager::new(transport, policy),
            registry: CharacteristicRegistry::with_wire_layout(),
        }
    }
}

/// What handling one event did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// A characteristic buffer was rewritten; `notify` is the dispatch outcome.
    Published {
        id: CharId,
        notify: Result<(), NotifyError>,
    },
    /// A polled read failed and the buffer was left alone.
    Skipped(ReadError),
    /// Link state after a connect / disconnect event.
    Link(LinkState),
    /// A second central was turned away.
    LinkRefused,
    Subscription { id: CharId, enabled: bool },
    /// Event came from a link we do not hold.
    Ignored,
    /// The orchestrator is halted and dropped the event.
    Halted,
}

pub struct Orchestrator<T: Transport> {
    ctx: Context<T>,
    sound_count: u32,
    halted: bool,
}

impl<T: Transport> Orchestrator<T> {
    pub fn new(ctx: Context<T>) -> Self {
        Self {
            ctx,
            sound_count: 0,
            halted: false,
        }
    }

    /// Start the sound counter somewhere other than zero.
    pub fn with_sound_count(mut self, count: u32) -> Self {
        self.sound_count = count;
        self
    }

    pub fn context(&self) -> &Context<T> {
        &self.ctx
    }

    pub fn sound_count(&self) -> u32 {
        self.sound_count
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Handle one event from the queue.
    ///
    /// `Err` for registry contract violations, which indicate a bug, and
    /// for the transport fault that halts the pipeline.
    pub fn handle(&mut self, event: Event<T::Handle>) -> Result<Step, Error> {
        if self.halted {
            return Ok(Step::Halted);
        }

        match event {
            Event::LinkEstablished(handle) => {
                match self.ctx.connection.on_link_established(handle) {
                    Ok(change) => {
                        // CCC state belongs to the central that wrote it.
                        if change == LinkChange::Replaced {
                            self.ctx.registry.clear_subscriptions();
                        }
                        Ok(Step::Link(self.ctx.connection.state()))
                    }
                    Err(_) => Ok(Step::LinkRefused),
                }
            }
            Event::LinkLost(handle, reason) => {
                if self.ctx.connection.on_link_lost(&handle, reason) {
                    self.ctx.registry.clear_subscriptions();
                    Ok(Step::Link(self.ctx.connection.state()))
                } else {
                    Ok(Step::Ignored)
                }
            }
            Event::Subscription { link, id, enabled } => {
                if !self.ctx.connection.holds(&link) {
                    debug!("Ignoring CCCD write for {} from a link we do not hold", id);
                    return Ok(Step::Ignored);
                }
                self.ctx.registry.set_subscription(id, enabled)?;
                info!("{} notifications {}", id, if enabled { "on" } else { "off" });
                Ok(Step::Subscription { id, enabled })
            }
            Event::Gas(Ok(sample)) => self.on_gas(&sample),
            Event::Gas(Err(e)) => {
                warn!("Gas panel read failed: {}", e);
                self.on_gas(&GasSample::all_failed(e))
            }
            Event::Environment(result) => self.on_environment(result),
            Event::AcousticEdge => self.on_acoustic_edge(),
            Event::TransportFault(e) => {
                self.halted = true;
                Err(Error::Transport(e))
            }
        }
    }

    fn on_gas(&mut self, sample: &GasSample) -> Result<Step, Error> {
        for (channel, result) in GasChannel::ALL.iter().zip(sample.channels.iter()) {
            if let Err(e) = result {
                warn!("{} channel read failed: {}", channel, e);
            }
        }
        let reading = sample.to_reading();
        info!(
            "CO: {} ppm, NO2: {} ppm, NH3: {} ppm, CH4: {} ppm, EtOH: {} ppm",
            reading.co,
            reading.no2,
            reading.nh3,
            reading.ch4,
            reading.etoh
        );
        self.publish(SensorReading::GasPanel(reading))
    }

    fn on_environment(
        &mut self,
        result: Result<EnvironmentReading, ReadError>,
    ) -> Result<Step, Error> {
        match result {
            Ok(reading) => {
                info!(
                    "Temperature: {} C, Humidity: {} %",
                    reading.temperature_c,
                    reading.humidity_pct
                );
                self.publish(SensorReading::Environment(reading))
            }
            Err(e) => {
                warn!("Temperature/humidity read failed: {}", e);
                Ok(Step::Skipped(e))
            }
        }
    }

    fn on_acoustic_edge(&mut self) -> Result<Step, Error> {
        self.sound_count = self.sound_count.wrapping_add(1);
        debug!("Sound event #{}", self.sound_count);
        self.publish(SensorReading::AcousticEvent(self.sound_count))
    }

    fn publish(&mut self, reading: SensorReading) -> Result<Step, Error> {
        let id = reading.char_id();
        let mut buf = [0u8; MAX_VALUE_LEN];
        let len = reading.serialize(&mut buf);

        let Context {
            connection,
            registry,
        } = &mut self.ctx;
        registry.write(id, &buf[..len])?;
        let value = registry.read(id)?;

        if let Err(e) = connection.publish(id, value) {
            warn!("{}: attribute update failed: {}", id, e);
        }

        let notify = connection.notify(registry, id, value);
        match notify {
            Ok(()) => {}
            Err(NotifyError::Transport(e)) => warn!("{}: notify failed: {}", id, e),
            Err(e) => debug!("{}: {}", id, e),
        }
        Ok(Step::Published { id, notify })
    }
}

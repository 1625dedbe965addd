//! Sensor and orchestration tasks.
//!
//! Sensor tasks only read hardware and send the outcome; the orchestrator
//! task is the single consumer of [`EVENTS`].

use defmt::{error, info, warn};
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, TrySendError};
use embassy_time::{Duration, Ticker};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use room_monitor::config::{ENVIRONMENT_POLL_PERIOD_MS, EVENT_QUEUE_DEPTH, GAS_POLL_PERIOD_MS};
use room_monitor::sensor::{Dht11, EdgeForwarder, GasPanelSensor};
use room_monitor::{EdgeListener, Event, EventSink, Orchestrator, PolledSource, Step};

use crate::radio::peripheral::EventSender;
use crate::radio::{GattTransport, Link};

/// The one queue every context feeds and only the orchestrator drains.
pub static EVENTS: Channel<CriticalSectionRawMutex, Event<Link>, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Non-blocking producer handle for contexts that must not wait.
#[derive(Clone, Copy)]
pub struct ChannelSink(pub EventSender);

impl EventSink for ChannelSink {
    type Handle = Link;

    fn try_push(&self, event: Event<Link>) -> Result<(), Event<Link>> {
        self.0.try_send(event).map_err(|TrySendError::Full(e)| e)
    }
}

/// Busy-wait delay for bit-banged protocols; `embassy_time` ticks are too
/// coarse for the DHT11's microsecond pulses.
pub struct CycleDelay;

/// CPU cycles per microsecond at the nRF52840's 64 MHz core clock.
const CYCLES_PER_US: u64 = 64;

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (u64::from(ns) * CYCLES_PER_US / 1_000).max(1);
        cortex_m::asm::delay(cycles.min(u64::from(u32::MAX)) as u32);
    }
}

pub async fn gas_task<I2C: I2c>(mut sensor: GasPanelSensor<I2C>, events: EventSender) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(GAS_POLL_PERIOD_MS));
    loop {
        let sample = sensor.read();
        events.send(Event::Gas(sample)).await;
        ticker.next().await;
    }
}

pub async fn environment_task<P, D>(mut sensor: Dht11<P, D>, events: EventSender) -> !
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    let mut ticker = Ticker::every(Duration::from_millis(ENVIRONMENT_POLL_PERIOD_MS));
    loop {
        // The sensor needs a moment after power-up before its first frame.
        ticker.next().await;
        let reading = sensor.read();
        events.send(Event::Environment(reading)).await;
    }
}

/// Wait for falling edges on the sound detector output (active-low).
pub async fn sound_task(pin: AnyPin, listener: EdgeForwarder<ChannelSink>) -> ! {
    let mut detector = Input::new(pin, Pull::Up);
    info!("Sound detector armed");
    loop {
        detector.wait_for_falling_edge().await;
        listener.on_edge();
    }
}

pub async fn orchestrator_task(
    mut orchestrator: Orchestrator<GattTransport>,
    events: Receiver<'static, CriticalSectionRawMutex, Event<Link>, EVENT_QUEUE_DEPTH>,
) -> ! {
    loop {
        let event = events.receive().await;
        match orchestrator.handle(event) {
            Ok(Step::LinkRefused) => warn!("Refused a second central"),
            Ok(_) => {}
            Err(e) => error!("Orchestrator: {}", e),
        }
    }
}

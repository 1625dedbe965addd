//! Advertise, accept one central, forward its events, repeat.
//!
//! This loop never touches link state or subscription flags itself: it
//! turns what the SoftDevice reports into [`Event`]s for the orchestrator.

use defmt::{error, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_sync::channel::Sender;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::{raw, Softdevice};

use room_monitor::advertising::{default_scan_response, ADV_DATA};
use room_monitor::config::{
    BLE_ADV_INTERVAL, BLE_CONN_INTERVAL_MAX, BLE_CONN_INTERVAL_MIN, BLE_SLAVE_LATENCY,
    BLE_SUP_TIMEOUT, EVENT_QUEUE_DEPTH,
};
use room_monitor::error::TransportError;
use room_monitor::{CharId, DisconnectReason, Event, PendingSubscriptions};

use crate::radio::server::{SensorServiceEvent, Server, ServerEvent};
use crate::radio::Link;

pub type EventSender = Sender<'static, CriticalSectionRawMutex, Event<Link>, EVENT_QUEUE_DEPTH>;

/// Run the peripheral role for the lifetime of the firmware.
///
/// Returns only if advertising fails, after reporting the fault.
pub async fn ble_task(sd: &'static Softdevice, server: &'static Server, events: EventSender) {
    let scan_data = default_scan_response();
    let config = peripheral::Config {
        interval: BLE_ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        info!("Advertising...");
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &scan_data,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Advertising failed: {}", e);
                events
                    .send(Event::TransportFault(TransportError::Advertising))
                    .await;
                return;
            }
        };

        let link = Link::new(conn.clone());
        info!("Central connected on {}", link);
        events.send(Event::LinkEstablished(link.clone())).await;
        request_conn_params(&conn);

        let pending = PendingSubscriptions::new();
        let recorded: Signal<NoopRawMutex, ()> = Signal::new();

        // The closure runs in the SoftDevice event context and cannot wait,
        // so it only records the descriptor state.
        let served = gatt_server::run(&conn, server, |e| match e {
            ServerEvent::Sensor(e) => {
                let (id, enabled) = match e {
                    SensorServiceEvent::GasPanelCccdWrite { notifications } => {
                        (CharId::GasPanel, notifications)
                    }
                    SensorServiceEvent::EnvironmentCccdWrite { notifications } => {
                        (CharId::Environment, notifications)
                    }
                    SensorServiceEvent::AcousticCccdWrite { notifications } => {
                        (CharId::Acoustic, notifications)
                    }
                };
                pending.record(id, enabled);
                recorded.signal(());
            }
        });
        let forwarded = forward_subscriptions(&link, &pending, &recorded, events);

        let disconnected = match select(served, forwarded).await {
            Either::First(reason) => reason,
            Either::Second(never) => match never {},
        };

        info!("Central disconnected: {}", disconnected);
        events
            .send(Event::LinkLost(link, DisconnectReason::Unknown))
            .await;
    }
}

/// Move recorded CCCD writes into the queue, waiting for room.
async fn forward_subscriptions(
    link: &Link,
    pending: &PendingSubscriptions,
    recorded: &Signal<NoopRawMutex, ()>,
    events: EventSender,
) -> ! {
    loop {
        recorded.wait().await;
        for (id, enabled) in pending.take() {
            let event = Event::Subscription {
                link: link.clone(),
                id,
                enabled,
            };
            events.send(event).await;
        }
    }
}

/// Ask the central for the configured connection timing.
fn request_conn_params(conn: &Connection) {
    let params = raw::ble_gap_conn_params_t {
        min_conn_interval: BLE_CONN_INTERVAL_MIN,
        max_conn_interval: BLE_CONN_INTERVAL_MAX,
        slave_latency: BLE_SLAVE_LATENCY,
        conn_sup_timeout: BLE_SUP_TIMEOUT,
    };
    if let Err(e) = conn.set_conn_params(params) {
        warn!("Connection parameter request failed: {}", e);
    }
}

//! GATT server definition and the SoftDevice-backed transport.

use defmt::{debug, Format};
use nrf_softdevice::ble::gatt_server::{NotifyValueError, SetValueError};
use nrf_softdevice::ble::Connection;
use nrf_softdevice::RawError;

use room_monitor::error::TransportError;
use room_monitor::registry::CharId;
use room_monitor::wire::{ACOUSTIC_LEN, ENVIRONMENT_LEN, GAS_PANEL_LEN};
use room_monitor::Transport;

/// Sensor service. The attribute macros only accept literals; the same
/// UUIDs live in `room_monitor::config`.
#[nrf_softdevice::gatt_service(uuid = "47617353-656e-736f-7253-766300000000")]
pub struct SensorService {
    /// co | no2 | nh3 | ch4 | etoh, f32 LE.
    #[characteristic(uuid = "47617352-6561-6469-6e67-730000000000", read, notify)]
    pub gas_panel: [u8; GAS_PANEL_LEN],
    /// temperature | humidity, f32 LE.
    #[characteristic(uuid = "456e7669-726f-6e6d-656e-740000000000", read, notify)]
    pub environment: [u8; ENVIRONMENT_LEN],
    /// Sound edge counter, u32 LE.
    #[characteristic(uuid = "536f756e-6444-6574-6563-740000000000", read, notify)]
    pub acoustic: [u8; ACOUSTIC_LEN],
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub sensor: SensorService,
}

/// A live central link.
///
/// Equality is by connection handle: the orchestrator only needs to know
/// whether a link-lost event is about the link it holds.
#[derive(Clone)]
pub struct Link {
    conn: Connection,
    handle: u16,
}

impl Link {
    pub fn new(conn: Connection) -> Self {
        let handle = conn.handle().unwrap_or(u16::MAX);
        Self { conn, handle }
    }

    pub fn handle(&self) -> u16 {
        self.handle
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Format for Link {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Link({})", self.handle)
    }
}

/// [`Transport`] on top of the SoftDevice GATT server.
pub struct GattTransport {
    server: &'static Server,
}

impl GattTransport {
    pub fn new(server: &'static Server) -> Self {
        Self { server }
    }
}

impl Transport for GattTransport {
    type Handle = Link;

    fn notify(&mut self, link: &Link, id: CharId, value: &[u8]) -> Result<(), TransportError> {
        let service = &self.server.sensor;
        let conn = &link.conn;
        let sent = match id {
            CharId::GasPanel => service.gas_panel_notify(conn, &fixed(value)?),
            CharId::Environment => service.environment_notify(conn, &fixed(value)?),
            CharId::Acoustic => service.acoustic_notify(conn, &fixed(value)?),
        };
        sent.map_err(map_notify_error)
    }

    fn publish(&mut self, id: CharId, value: &[u8]) -> Result<(), TransportError> {
        let service = &self.server.sensor;
        let stored = match id {
            CharId::GasPanel => service.gas_panel_set(&fixed(value)?),
            CharId::Environment => service.environment_set(&fixed(value)?),
            CharId::Acoustic => service.acoustic_set(&fixed(value)?),
        };
        stored.map_err(map_set_error)
    }

    fn release(&mut self, link: Link) {
        debug!("Dropping {}", link);
        // Already gone is as good as dropped.
        let _ = link.conn.disconnect();
    }
}

fn fixed<const N: usize>(value: &[u8]) -> Result<[u8; N], TransportError> {
    value
        .try_into()
        .map_err(|_| TransportError::Length(value.len()))
}

fn map_notify_error(e: NotifyValueError) -> TransportError {
    match e {
        NotifyValueError::Disconnected => TransportError::Disconnected,
        NotifyValueError::Raw(RawError::Resources) => TransportError::QueueFull,
        NotifyValueError::Raw(raw) => TransportError::Raw(raw as u32),
    }
}

fn map_set_error(e: SetValueError) -> TransportError {
    match e {
        SetValueError::Raw(raw) => TransportError::Raw(raw as u32),
    }
}

//! room-monitor firmware entry point (nRF52840 + SoftDevice S140).
//!
//! Brings up the SoftDevice, registers the GATT server and spawns:
//!
//! - `softdevice_task`   - SoftDevice event pump
//! - `ble_task`          - advertising and connection events
//! - `gas_task`          - gas panel poll over I²C
//! - `environment_task`  - DHT11 poll
//! - `sound_task`        - sound detector edges
//! - `orchestrator_task` - single consumer of the event queue

#![no_std]
#![no_main]

mod radio;
mod tasks;

use core::mem;

use defmt::{error, info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Flex, OutputDrive, Pin, Pull};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_time::Timer;
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use room_monitor::config::{BLE_ATT_MTU, DEVICE_NAME, LINK_POLICY};
use room_monitor::sensor::{Dht11, EdgeForwarder, GasPanelSensor};
use room_monitor::{Context, Orchestrator};

use radio::{GattTransport, Server};
use tasks::{ChannelSink, CycleDelay, EVENTS};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice, server: &'static Server) {
    radio::peripheral::ble_task(sd, server, EVENTS.sender()).await;
}

#[embassy_executor::task]
async fn gas_task(sensor: GasPanelSensor<Twim<'static, TWISPI0>>) -> ! {
    tasks::gas_task(sensor, EVENTS.sender()).await
}

#[embassy_executor::task]
async fn environment_task(sensor: Dht11<Flex<'static>, CycleDelay>) -> ! {
    tasks::environment_task(sensor, EVENTS.sender()).await
}

#[embassy_executor::task]
async fn sound_task(pin: AnyPin, listener: EdgeForwarder<ChannelSink>) -> ! {
    tasks::sound_task(pin, listener).await
}

#[embassy_executor::task]
async fn orchestrator_task(orchestrator: Orchestrator<GattTransport>) -> ! {
    tasks::orchestrator_task(orchestrator, EVENTS.receiver()).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("room-monitor starting");

    // The SoftDevice reserves priorities 0, 1 and 4.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);

    let sd = Softdevice::enable(&softdevice_config());

    let server = match Server::new(sd) {
        Ok(server) => server,
        Err(e) => {
            error!("GATT server registration failed, halting: {}", e);
            loop {
                Timer::after_secs(3600).await;
            }
        }
    };
    static SERVER: StaticCell<Server> = StaticCell::new();
    let server: &'static Server = SERVER.init(server);
    let sd: &'static Softdevice = sd;

    unwrap!(spawner.spawn(softdevice_task(sd)));

    let ctx = Context::new(GattTransport::new(server), LINK_POLICY);
    unwrap!(spawner.spawn(orchestrator_task(Orchestrator::new(ctx))));
    unwrap!(spawner.spawn(ble_task(sd, server)));

    // Gas panel on TWIM0: SDA P0.26, SCL P0.27.
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    unwrap!(spawner.spawn(gas_task(GasPanelSensor::new(i2c))));

    // DHT11 on P0.04, open drain with external pull-up.
    let mut dht_pin = Flex::new(p.P0_04);
    dht_pin.set_high();
    dht_pin.set_as_input_output(Pull::None, OutputDrive::Standard0Disconnect1);
    unwrap!(spawner.spawn(environment_task(Dht11::new(dht_pin, CycleDelay))));

    // Sound detector DO on P0.03.
    let listener = EdgeForwarder::new(ChannelSink(EVENTS.sender()));
    unwrap!(spawner.spawn(sound_task(p.P0_03.degrade(), listener)));

    info!("All tasks spawned");
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: BLE_ATT_MTU,
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            // SAFETY: all-zero is "no access" for a security mode struct.
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

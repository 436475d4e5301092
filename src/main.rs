//! Antenna Rotator Firmware: Main Entry Point
//!
//! ```text
//!  ┌──────────────── esp_timer task (800 Hz) ────────────────┐
//!  │  Sampler::tick ─▶ azimuth / elevation AxisController     │
//!  └──────────────────────────┬──────────────────────────────┘
//!                             │ AxisLink (critical section)
//!  ┌────────── tcpsrv (PRO_CPU) ──────────┐   ┌──── main ─────────────┐
//!  │  wait NETWORK_READY ─▶ CommandServer │   │  WifiStation           │
//!  │  poll(2) reactor, up to 16 sessions  │   │  1 Hz status + relink  │
//!  └──────────────────────────────────────┘   └────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use rotator::adapters::hardware;
use rotator::adapters::network::{self, Credentials, WifiStation};
use rotator::config::{MAX_SESSIONS, RotatorConfig};
use rotator::drivers::task_pin::{Core, spawn_on_core};
use rotator::drivers::{hw_init, hw_timer};
use rotator::error::Error;
use rotator::rotator::{AxisLink, LinkedAxis, RotatorController, Sampler};
use rotator::server::CommandServer;

const SERVER_PRIORITY: u8 = 5;
const SERVER_STACK_KB: usize = 8;
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("rotator v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = RotatorConfig::default();
    config.validate().map_err(Error::Config)?;
    match serde_json::to_string(&config) {
        Ok(json) => info!("config: {}", json),
        Err(e) => warn!("config: not serialisable ({})", e),
    }

    // ── 3. Peripherals + sampling ─────────────────────────────
    hw_init::init_peripherals()?;

    let az_link = Arc::new(AxisLink::new());
    let el_link = Arc::new(AxisLink::new());
    let mut sampler = Sampler::new(
        LinkedAxis::new(hardware::azimuth_axis(&config), az_link.clone()),
        LinkedAxis::new(hardware::elevation_axis(&config), el_link.clone()),
    );
    let _sampling = hw_timer::start_sampling(config.sample_period_us(), move || sampler.tick())?;

    let rotator = RotatorController::new(az_link, el_link);

    // ── 4. Command server (waits for the network) ─────────────
    let server_rotator = rotator.clone();
    let port = config.port;
    spawn_on_core(
        Core::Pro,
        SERVER_PRIORITY,
        SERVER_STACK_KB,
        "tcpsrv\0",
        move || {
            let ip = network::wait_network_ready();
            info!("tcpsrv: network up at {}, starting", ip);
            match CommandServer::<_, MAX_SESSIONS>::bind((Ipv4Addr::UNSPECIFIED, port), server_rotator) {
                Ok(mut server) => {
                    if let Err(e) = server.run() {
                        error!("tcpsrv: stopped: {}", e);
                    }
                }
                Err(e) => error!("tcpsrv: {}", e),
            }
        },
    )?;

    // ── 5. Wi-Fi station ──────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let credentials = Credentials::from_build_env()?;
    let mut wifi = WifiStation::new(peripherals.modem, sysloop, Some(nvs), credentials)?;
    if let Err(e) = wifi.connect() {
        warn!("network: initial connect failed ({}), will retry", e);
    }

    info!("system ready");

    // ── 6. Supervisor loop ────────────────────────────────────
    loop {
        std::thread::sleep(STATUS_INTERVAL);
        info!("rotator: {}", rotator.status());
        if let Err(e) = wifi.ensure_connected() {
            warn!("network: reconnect failed: {}", e);
        }
    }
}

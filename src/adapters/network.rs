//! Wi-Fi station adapter and the network-ready signal.
//!
//! The command server must not bind before the station has an address.
//! [`WifiStation::connect`] publishes the address on [`NETWORK_READY`];
//! the bootstrap blocks in [`wait_network_ready`] until it arrives.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` in STA mode.
//! - **all other targets**: a simulated station that is up on loopback.
//!
//! ## Reconnection policy
//!
//! The supervisor loop calls [`WifiStation::ensure_connected`] once per
//! second; a dropped link is re-associated on the spot.

use std::net::Ipv4Addr;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{info, warn};

use crate::error::NetworkError;

// ───────────────────────────────────────────────────────────────
// Network-ready signal
// ───────────────────────────────────────────────────────────────

/// Carries the station address once the interface is up.
pub static NETWORK_READY: Signal<CriticalSectionRawMutex, Ipv4Addr> = Signal::new();

pub fn notify_network_ready(ip: Ipv4Addr) {
    info!("network: ready, ip={}", ip);
    NETWORK_READY.signal(ip);
}

/// Block the calling thread until the network is ready.
pub fn wait_network_ready() -> Ipv4Addr {
    futures_lite::future::block_on(NETWORK_READY.wait())
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

/// Station credentials, baked in at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl Credentials {
    /// Validate and copy.  WPA2 wants 8..=64 bytes; an empty password
    /// selects an open network.
    pub fn new(ssid: &str, password: &str) -> Result<Self, NetworkError> {
        if ssid.is_empty() {
            return Err(NetworkError::NoCredentials);
        }
        if !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(NetworkError::InvalidCredentials);
        }
        if !password.is_empty() && password.len() < 8 {
            return Err(NetworkError::InvalidCredentials);
        }
        Ok(Self {
            ssid: ssid
                .try_into()
                .map_err(|_| NetworkError::InvalidCredentials)?,
            password: password
                .try_into()
                .map_err(|_| NetworkError::InvalidCredentials)?,
        })
    }

    /// From `ROTATOR_WIFI_SSID` / `ROTATOR_WIFI_PASS` at build time.
    pub fn from_build_env() -> Result<Self, NetworkError> {
        let ssid = option_env!("ROTATOR_WIFI_SSID").unwrap_or("");
        let password = option_env!("ROTATOR_WIFI_PASS").unwrap_or("");
        Self::new(ssid, password)
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Station (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct WifiStation {
    wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    credentials: Credentials,
}

#[cfg(target_os = "espidf")]
impl WifiStation {
    pub fn new(
        modem: esp_idf_svc::hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
        credentials: Credentials,
    ) -> Result<Self, NetworkError> {
        use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

        let driver = EspWifi::new(modem, sysloop.clone(), nvs).map_err(|e| {
            warn!("network: wifi driver init failed: {}", e);
            NetworkError::ConnectFailed
        })?;
        let wifi = BlockingWifi::wrap(driver, sysloop).map_err(|e| {
            warn!("network: wifi wrap failed: {}", e);
            NetworkError::ConnectFailed
        })?;
        Ok(Self { wifi, credentials })
    }

    /// Configure, start, associate, and wait for DHCP.  Publishes the
    /// address on [`NETWORK_READY`].
    pub fn connect(&mut self) -> Result<Ipv4Addr, NetworkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.credentials.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self.credentials.ssid.clone(),
            password: self.credentials.password.clone(),
            auth_method,
            ..Default::default()
        });

        let fail = |stage: &str, e: esp_idf_svc::sys::EspError| {
            warn!("network: {} failed: {}", stage, e);
            NetworkError::ConnectFailed
        };
        self.wifi
            .set_configuration(&config)
            .map_err(|e| fail("configure", e))?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|e| fail("start", e))?;
        }
        info!("network: associating with '{}'", self.credentials.ssid);
        self.wifi.connect().map_err(|e| fail("connect", e))?;
        self.wifi.wait_netif_up().map_err(|e| fail("dhcp", e))?;

        let ip = self
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map_err(|e| fail("ip info", e))?
            .ip;
        notify_network_ready(ip);
        Ok(ip)
    }

    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// Re-associate if the link dropped.
    pub fn ensure_connected(&mut self) -> Result<(), NetworkError> {
        if self.is_connected() {
            return Ok(());
        }
        warn!("network: link lost, reconnecting");
        self.connect().map(|_| ())
    }
}

// ───────────────────────────────────────────────────────────────
// Station (simulation)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct WifiStation {
    credentials: Credentials,
    connected: bool,
}

#[cfg(not(target_os = "espidf"))]
impl WifiStation {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            connected: false,
        }
    }

    pub fn connect(&mut self) -> Result<Ipv4Addr, NetworkError> {
        info!("network(sim): associated with '{}'", self.credentials.ssid);
        self.connected = true;
        notify_network_ready(Ipv4Addr::LOCALHOST);
        Ok(Ipv4Addr::LOCALHOST)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Simulate losing the link.
    pub fn sim_drop_link(&mut self) {
        self.connected = false;
    }

    pub fn ensure_connected(&mut self) -> Result<(), NetworkError> {
        if self.connected {
            return Ok(());
        }
        warn!("network(sim): link lost, reconnecting");
        self.connect().map(|_| ())
    }
}

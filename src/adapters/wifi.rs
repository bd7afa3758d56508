//! WiFi station-mode adapter.
//!
//! Joins the access point whose credentials are stored in the "auth" NVS
//! namespace, so the HTTP server is reachable on the LAN.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` driver.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Join policy
//!
//! The caller retries [`WifiAdapter::connect`] at a fixed pace until it
//! succeeds. After a drop, [`WifiAdapter::poll`] makes one re-join attempt
//! per call and stays in [`WifiState::Lost`] until one succeeds.

use log::{error, info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::error::CommsError;

use super::nvs::CRED_NAMESPACE;

pub const SSID_KEY: &str = "wifi_ssid";
pub const PASSWORD_KEY: &str = "wifi_pw";

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), CommsError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(CommsError::InvalidPassword);
    }
    Ok(())
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, CommsError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds.ssid.push_str(ssid).map_err(|()| CommsError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|()| CommsError::InvalidPassword)?;
        Ok(creds)
    }

    /// Read credentials from the "auth" namespace.
    ///
    /// A missing password means an open network.
    pub fn load(store: &impl StoragePort) -> Result<Self, CommsError> {
        let mut ssid_buf = [0u8; 32];
        let ssid_len = store
            .read(CRED_NAMESPACE, SSID_KEY, &mut ssid_buf)
            .map_err(|_| CommsError::NoCredentials)?;
        let ssid = core::str::from_utf8(&ssid_buf[..ssid_len]).map_err(|_| CommsError::InvalidSsid)?;

        let mut pw_buf = [0u8; 64];
        let pw_len = match store.read(CRED_NAMESPACE, PASSWORD_KEY, &mut pw_buf) {
            Ok(n) => n,
            Err(StorageError::NotFound) => 0,
            Err(e) => {
                warn!("WiFi: password read failed ({})", e);
                return Err(CommsError::NoCredentials);
            }
        };
        let password =
            core::str::from_utf8(&pw_buf[..pw_len]).map_err(|_| CommsError::InvalidPassword)?;

        Self::new(ssid, password)
    }

    /// Persist credentials into the "auth" namespace.
    pub fn store(&self, store: &mut impl StoragePort) -> Result<(), StorageError> {
        store.write(CRED_NAMESPACE, SSID_KEY, self.ssid.as_bytes())?;
        store.write(CRED_NAMESPACE, PASSWORD_KEY, self.password.as_bytes())
    }
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Lost,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    credentials: Option<WifiCredentials>,
    attempts: u32,
    #[cfg(target_os = "espidf")]
    driver: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    /// Simulation: remaining joins that should fail.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_joins: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        driver: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    ) -> Self {
        Self {
            state: WifiState::Disconnected,
            credentials: None,
            attempts: 0,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            credentials: None,
            attempts: 0,
            sim_fail_joins: 0,
            sim_link_up: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Join attempts since the last successful connect.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn set_credentials(&mut self, credentials: WifiCredentials) {
        info!("WiFi: credentials set (SSID='{}')", credentials.ssid);
        self.credentials = Some(credentials);
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_link_up()
    }

    /// One join attempt.
    pub fn connect(&mut self) -> Result<(), CommsError> {
        if self.state == WifiState::Connected {
            return Err(CommsError::AlreadyConnected);
        }
        let Some(creds) = self.credentials.clone() else {
            return Err(CommsError::NoCredentials);
        };

        self.attempts = self.attempts.saturating_add(1);
        info!("WiFi: connecting to '{}' (attempt {})", creds.ssid, self.attempts);
        self.state = WifiState::Connecting;

        match self.platform_connect(&creds) {
            Ok(()) => {
                self.state = WifiState::Connected;
                self.attempts = 0;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Disconnected;
                Err(e)
            }
        }
    }

    /// Detect a dropped link and re-join.
    ///
    /// Returns `true` if the link came back during this call.
    pub fn poll(&mut self) -> bool {
        match self.state {
            WifiState::Connected if !self.platform_link_up() => {
                warn!("WiFi: connection lost");
                self.state = WifiState::Lost;
                false
            }
            WifiState::Lost => {
                if self.connect().is_ok() {
                    return true;
                }
                self.state = WifiState::Lost;
                false
            }
            _ => false,
        }
    }

    pub fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, creds: &WifiCredentials) -> Result<(), CommsError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: creds.ssid.as_str().try_into().map_err(|()| CommsError::InvalidSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|()| CommsError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let fail = |e: esp_idf_svc::sys::EspError| {
            error!("WiFi: driver error {}", e);
            CommsError::WifiConnectFailed
        };
        self.driver.set_configuration(&conf).map_err(fail)?;
        if !self.driver.is_started().map_err(fail)? {
            self.driver.start().map_err(fail)?;
        }
        self.driver.connect().map_err(fail)?;
        self.driver.wait_netif_up().map_err(fail)?;

        if let Ok(ip) = self.driver.wifi().sta_netif().get_ip_info() {
            info!("WiFi: IP address {}", ip.ip);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, creds: &WifiCredentials) -> Result<(), CommsError> {
        if self.sim_fail_joins > 0 {
            self.sim_fail_joins -= 1;
            warn!("WiFi(sim): simulated join failure for '{}'", creds.ssid);
            return Err(CommsError::WifiConnectFailed);
        }
        self.sim_link_up = true;
        info!("WiFi(sim): joined '{}'", creds.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi: disconnect error {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link_up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&self) -> bool {
        self.sim_link_up
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    /// Make the next `n` join attempts fail.
    pub fn sim_fail_next_joins(&mut self, n: u32) {
        self.sim_fail_joins = n;
    }

    /// Drop the link without going through `disconnect`.
    pub fn sim_drop_link(&mut self) {
        self.sim_link_up = false;
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] and [`StoragePort`] on top of two blob
//! primitives, `get_blob` and `set_blob`. On ESP-IDF these go to the
//! default NVS partition; on host they hit an in-memory map.
//!
//! ```text
//!   "heatwatch" / "syscfg"     postcard-encoded SystemConfig
//!   "auth"      / "wifi_ssid"  station SSID
//!   "auth"      / "wifi_pw"    station password (absent = open network)
//! ```
//!
//! A stored config that fails [`SystemConfig::validate`] is discarded for
//! defaults. Saving validates first. NVS commits are atomic.

use log::{info, warn};

use crate::app::ports::{ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;
use crate::error::ConfigError;

#[cfg(not(target_os = "espidf"))]
use std::{cell::RefCell, collections::HashMap};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_ERR_NVS_NEW_VERSION_FOUND, ESP_ERR_NVS_NO_FREE_PAGES, ESP_ERR_NVS_NOT_ENOUGH_SPACE,
    ESP_ERR_NVS_NOT_FOUND, ESP_OK, esp_err_t, nvs_close, nvs_commit, nvs_flash_erase,
    nvs_flash_init, nvs_get_blob, nvs_handle_t, nvs_open, nvs_open_mode_t_NVS_READONLY,
    nvs_open_mode_t_NVS_READWRITE, nvs_set_blob,
};

const CONFIG_NAMESPACE: &str = "heatwatch";
const CONFIG_KEY: &str = "syscfg";
pub const CRED_NAMESPACE: &str = "auth";

/// Upper bound on the encoded config blob.
const CONFIG_BLOB_MAX: usize = 128;

/// NVS namespace and key names are at most 15 bytes plus a NUL.
const NVS_NAME_MAX: usize = 15;

// Bindgen exposes these as `u32`; NVS calls return `esp_err_t`.
#[cfg(target_os = "espidf")]
const RC_OK: esp_err_t = ESP_OK as esp_err_t;
#[cfg(target_os = "espidf")]
const RC_NOT_FOUND: esp_err_t = ESP_ERR_NVS_NOT_FOUND as esp_err_t;
#[cfg(target_os = "espidf")]
const RC_NOT_ENOUGH_SPACE: esp_err_t = ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t;

fn c_name(name: &str) -> Result<[u8; NVS_NAME_MAX + 1], StorageError> {
    if name.is_empty() || name.len() > NVS_NAME_MAX || name.as_bytes().contains(&0) {
        return Err(StorageError::IoError);
    }
    let mut out = [0u8; NVS_NAME_MAX + 1];
    out[..name.len()].copy_from_slice(name.as_bytes());
    Ok(out)
}

#[cfg(target_os = "espidf")]
fn storage_error(rc: esp_err_t) -> StorageError {
    match rc {
        RC_NOT_FOUND => StorageError::NotFound,
        RC_NOT_ENOUGH_SPACE => StorageError::Full,
        _ => StorageError::IoError,
    }
}

/// Open namespace, closed on drop.
#[cfg(target_os = "espidf")]
struct Namespace(nvs_handle_t);

#[cfg(target_os = "espidf")]
impl Namespace {
    fn open(name: &str, write: bool) -> Result<Self, StorageError> {
        let name = c_name(name)?;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `name` is NUL-terminated and `handle` is a live local.
        let rc = unsafe { nvs_open(name.as_ptr().cast(), mode, &mut handle) };
        if rc != RC_OK {
            return Err(storage_error(rc));
        }
        Ok(Self(handle))
    }
}

#[cfg(target_os = "espidf")]
impl Drop for Namespace {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful nvs_open.
        unsafe { nvs_close(self.0) };
    }
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blobs: RefCell<HashMap<(String, String), Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// A partition with no free pages or from a newer IDF is erased and
    /// re-initialised. Any other failure is `ConfigError::IoError`.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any NVS access.
            let mut rc = unsafe { nvs_flash_init() };
            if rc == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || rc == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                // SAFETY: as above.
                if unsafe { nvs_flash_erase() } != RC_OK {
                    return Err(ConfigError::IoError);
                }
                rc = unsafe { nvs_flash_init() };
            }
            if rc != RC_OK {
                return Err(ConfigError::IoError);
            }
            info!("NVS: flash ready");
            Ok(Self {})
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NVS(sim): in-memory store");
            Ok(Self::unbacked())
        }
    }

    /// Adapter with nothing behind it; on device every access fails.
    fn unbacked() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            blobs: RefCell::new(HashMap::new()),
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn get_blob(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let ns = Namespace::open(namespace, false)?;
        let key = c_name(key)?;
        let mut len = buf.len();
        // SAFETY: `buf` is writable for `len` bytes; NVS updates `len`.
        let rc = unsafe { nvs_get_blob(ns.0, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut len) };
        if rc != RC_OK {
            return Err(storage_error(rc));
        }
        Ok(len)
    }

    #[cfg(target_os = "espidf")]
    fn set_blob(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let ns = Namespace::open(namespace, true)?;
        let key = c_name(key)?;
        // SAFETY: `data` is readable for `data.len()` bytes.
        let rc = unsafe { nvs_set_blob(ns.0, key.as_ptr().cast(), data.as_ptr().cast(), data.len()) };
        if rc != RC_OK {
            return Err(storage_error(rc));
        }
        // SAFETY: handle is open for writing.
        match unsafe { nvs_commit(ns.0) } {
            RC_OK => Ok(()),
            rc => Err(storage_error(rc)),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn get_blob(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        c_name(namespace)?;
        c_name(key)?;
        let blobs = self.blobs.borrow();
        let data = blobs
            .get(&(namespace.to_owned(), key.to_owned()))
            .ok_or(StorageError::NotFound)?;
        let dst = buf.get_mut(..data.len()).ok_or(StorageError::IoError)?;
        dst.copy_from_slice(data);
        Ok(data.len())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_blob(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        c_name(namespace)?;
        c_name(key)?;
        self.blobs
            .borrow_mut()
            .insert((namespace.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::unbacked())
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; CONFIG_BLOB_MAX];
        let len = match self.get_blob(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("NVS: no stored config, using defaults");
                return Ok(SystemConfig::default());
            }
            Err(e) => {
                warn!("NVS: config read failed ({}), using defaults", e);
                return Ok(SystemConfig::default());
            }
        };

        let stored: SystemConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        info!("NVS: loaded config ({} bytes)", len);
        match stored.validate() {
            Ok(()) => Ok(stored),
            Err(e) => {
                warn!("NVS: stored config rejected ({}), using defaults", e);
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut buf = [0u8; CONFIG_BLOB_MAX];
        let bytes = postcard::to_slice(config, &mut buf).map_err(|_| ConfigError::IoError)?;
        let len = bytes.len();
        self.set_blob(CONFIG_NAMESPACE, CONFIG_KEY, &buf[..len]).map_err(|e| {
            warn!("NVS: config write failed ({})", e);
            ConfigError::IoError
        })?;
        info!("NVS: config saved ({} bytes)", len);
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.get_blob(namespace, key, buf)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.set_blob(namespace, key, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_loads_defaults() {
        let nvs = NvsAdapter::new().unwrap();
        let cfg = nvs.load().unwrap();
        assert_eq!(cfg.frame_interval_ms, 1000);
        assert_eq!(cfg.sensor_id.as_str(), "MLX90640");
    }

    #[test]
    fn config_save_then_load() {
        let nvs = NvsAdapter::new().unwrap();
        let cfg = SystemConfig {
            frame_interval_ms: 250,
            human_delta_c: 4.0,
            ..Default::default()
        };
        nvs.save(&cfg).unwrap();
        let loaded = nvs.load().unwrap();
        assert_eq!(loaded.frame_interval_ms, 250);
        assert_eq!(loaded.human_delta_c, 4.0);
    }

    #[test]
    fn default_config_fits_blob_bound() {
        let mut buf = [0u8; CONFIG_BLOB_MAX];
        assert!(postcard::to_slice(&SystemConfig::default(), &mut buf).is_ok());
    }

    #[test]
    fn save_rejects_invalid_config() {
        let nvs = NvsAdapter::new().unwrap();
        let cfg = SystemConfig {
            min_blob_cells: 0,
            ..Default::default()
        };
        assert!(matches!(nvs.save(&cfg), Err(ConfigError::ValidationFailed(_))));
        assert_eq!(nvs.load().unwrap().min_blob_cells, 5);
    }

    #[test]
    fn invalid_stored_config_falls_back_to_defaults() {
        let mut nvs = NvsAdapter::new().unwrap();
        let bad = SystemConfig {
            frame_interval_ms: 5,
            ..Default::default()
        };
        let bytes = postcard::to_allocvec(&bad).unwrap();
        nvs.write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes).unwrap();
        assert_eq!(nvs.load().unwrap().frame_interval_ms, 1000);
    }

    #[test]
    fn garbage_blob_is_corrupted() {
        let mut nvs = NvsAdapter::new().unwrap();
        nvs.write(CONFIG_NAMESPACE, CONFIG_KEY, &[0xFF; 3]).unwrap();
        assert!(matches!(nvs.load(), Err(ConfigError::Corrupted)));
    }

    #[test]
    fn namespaces_are_separate() {
        let mut nvs = NvsAdapter::new().unwrap();
        nvs.write(CRED_NAMESPACE, "wifi_ssid", b"HomeNet").unwrap();
        let mut buf = [0u8; 32];
        assert_eq!(
            nvs.read(CONFIG_NAMESPACE, "wifi_ssid", &mut buf),
            Err(StorageError::NotFound)
        );
        let len = nvs.read(CRED_NAMESPACE, "wifi_ssid", &mut buf).unwrap();
        assert_eq!(&buf[..len], b"HomeNet");
    }

    #[test]
    fn read_into_short_buffer_fails() {
        let mut nvs = NvsAdapter::new().unwrap();
        nvs.write(CRED_NAMESPACE, "wifi_pw", b"longer than four").unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(
            nvs.read(CRED_NAMESPACE, "wifi_pw", &mut buf),
            Err(StorageError::IoError)
        );
    }

    #[test]
    fn overlong_key_is_rejected() {
        let mut nvs = NvsAdapter::new().unwrap();
        assert_eq!(
            nvs.write(CRED_NAMESPACE, "a_key_of_sixteen", b"x"),
            Err(StorageError::IoError)
        );
    }
}

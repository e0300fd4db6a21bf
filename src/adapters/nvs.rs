//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`], [`OnOffStore`], [`DevicePort`] and the
//! On/Off half of [`AttributePort`] for the terrarium controller.
//!
//! - Config validation: every field is range-checked before persistence.
//! - Namespace isolation: the config blob and the persisted On/Off values
//!   live in separate namespaces.
//! - Factory reset erases the whole partition, then restarts the chip.
//!
//! The simulation backend (host) keeps everything in a shared `HashMap`;
//! clones of the adapter see the same store, as handles to the real
//! partition do.

use log::{info, warn};

use crate::app::ports::{
    AttributePort, ConfigError, ConfigPort, DevicePort, OnOffStore, StorageError,
};
use crate::bridge::{Attribute, EndpointId};
use crate::config::SystemConfig;

#[cfg(not(target_os = "espidf"))]
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "terrarium";
const CONFIG_KEY: &str = "syscfg";
const ONOFF_NAMESPACE: &str = "onoff";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

#[derive(Clone)]
pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    #[cfg(not(target_os = "espidf"))]
    reset_requested: Rc<Cell<bool>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self::empty())
    }

    fn empty() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            store: Rc::new(RefCell::new(HashMap::new())),
            #[cfg(not(target_os = "espidf"))]
            reset_requested: Rc::new(Cell::new(false)),
        }
    }

    /// Persist the On/Off value of `endpoint` so the next cluster init
    /// replays it.
    pub fn store_on_off(&self, endpoint: EndpointId, on: bool) -> Result<(), StorageError> {
        self.write(ONOFF_NAMESPACE, &on_off_key(endpoint), &[u8::from(on)])
    }

    /// Whether a factory reset has been requested (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn reset_requested(&self) -> bool {
        self.reset_requested.get()
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = c_key(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    // ── Raw blob access ───────────────────────────────────────

    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow()
                .get(&Self::composite_key(namespace, key))
                .cloned()
                .ok_or(StorageError::NotFound)
        }

        #[cfg(target_os = "espidf")]
        {
            let key = c_key(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut size: usize = 0;
                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(handle, key.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });
            match result {
                Ok(bytes) => Ok(bytes),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(e) => {
                    warn!("NvsAdapter: read {}::{} failed ({})", namespace, key_str(&key), e);
                    Err(StorageError::IoError)
                }
            }
        }
    }

    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(namespace, key), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = c_key(key);
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                warn!("NvsAdapter: write {}::{} failed ({})", namespace, key_str(&key), e);
                StorageError::IoError
            })
        }
    }
}

fn on_off_key(endpoint: EndpointId) -> String {
    format!("ep{}", endpoint)
}

/// NUL-terminated copy of an NVS name (15 chars max).
#[cfg(target_os = "espidf")]
fn c_key(name: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    let bytes = name.as_bytes();
    let len = bytes.len().min(15);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

#[cfg(target_os = "espidf")]
fn key_str(buf: &[u8; 16]) -> &str {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    core::str::from_utf8(&buf[..end]).unwrap_or("?")
}

// ── ConfigPort ────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        match self.read(CONFIG_NAMESPACE, CONFIG_KEY) {
            Ok(bytes) => {
                let cfg: SystemConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate()?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
            Err(StorageError::IoError) => Err(ConfigError::IoError),
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes)
            .map_err(|_| ConfigError::IoError)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

// ── OnOffStore ────────────────────────────────────────────────

impl OnOffStore for NvsAdapter {
    fn persisted_on_off(&self, endpoint: EndpointId) -> Option<bool> {
        match self.read(ONOFF_NAMESPACE, &on_off_key(endpoint)) {
            Ok(bytes) => bytes.first().map(|b| *b != 0),
            Err(_) => None,
        }
    }
}

// ── AttributePort (On/Off persistence) ──────────────────────

impl AttributePort for NvsAdapter {
    /// Persist On/Off reports; measurements are not stored.
    fn publish(&mut self, endpoint: EndpointId, attribute: Attribute) {
        if let Attribute::OnOff(on) = attribute {
            if let Err(e) = self.store_on_off(endpoint, on) {
                warn!("NvsAdapter: ep{} on_off not persisted ({})", endpoint, e);
            }
        }
    }
}

// ── DevicePort (factory reset) ────────────────────────────────

impl DevicePort for NvsAdapter {
    #[cfg(target_os = "espidf")]
    fn schedule_factory_reset(&mut self) {
        warn!("NvsAdapter: factory reset, erasing NVS and restarting");
        // SAFETY: the dispatcher is the only NVS user at this point.
        let ret = unsafe { nvs_flash_erase() };
        if ret != ESP_OK {
            warn!("NvsAdapter: erase failed ({}), restarting anyway", ret);
        }
        unsafe { esp_restart() };
    }

    #[cfg(not(target_os = "espidf"))]
    fn schedule_factory_reset(&mut self) {
        warn!("NvsAdapter: factory reset (simulation), clearing store");
        self.store.borrow_mut().clear();
        self.reset_requested.set(true);
    }
}

impl Default for NvsAdapter {
    /// Adapter with nothing loaded; the fallback when flash init fails.
    fn default() -> Self {
        Self::empty()
    }
}

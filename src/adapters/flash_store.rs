//! Flash filesystem adapter.
//!
//! Implements [`StoragePort`] with one file per key.
//!
//! - On ESP-IDF: a SPIFFS partition mounted at [`MOUNT_POINT`]; key `k`
//!   lives in `/spiffs/k.txt`. The partition is formatted automatically if
//!   it cannot be mounted (first boot).
//! - On host/test: an in-memory map with fault injection for tests.

use log::info;

use crate::app::ports::{StorageError, StoragePort};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// VFS path the SPIFFS partition is mounted under.
pub const MOUNT_POINT: &str = "/spiffs";

#[cfg(target_os = "espidf")]
const MOUNT_POINT_C: &core::ffi::CStr = c"/spiffs";

/// Open files SPIFFS may hold at once. Only one is ever open at a time.
#[cfg(target_os = "espidf")]
const MAX_OPEN_FILES: usize = 4;

pub struct FlashStore {
    #[cfg(not(target_os = "espidf"))]
    files: HashMap<String, Vec<u8>>,
    #[cfg(not(target_os = "espidf"))]
    read_only: bool,
    #[cfg(not(target_os = "espidf"))]
    appends_left: Option<u32>,
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl FlashStore {
    /// Register the SPIFFS partition with the VFS.
    pub fn mount() -> Result<Self, StorageError> {
        let conf = esp_vfs_spiffs_conf_t {
            base_path: MOUNT_POINT_C.as_ptr(),
            partition_label: core::ptr::null(),
            max_files: MAX_OPEN_FILES,
            format_if_mount_failed: true,
        };
        // SAFETY: called once from the main task before any file access;
        // `conf` outlives the call and the base path is a static C string.
        let ret = unsafe { esp_vfs_spiffs_register(&conf) };
        if ret != ESP_OK {
            warn!("FlashStore: SPIFFS mount failed (rc={})", ret);
            return Err(StorageError::Unavailable);
        }

        let mut total: usize = 0;
        let mut used: usize = 0;
        // SAFETY: the partition was registered above.
        let ret = unsafe { esp_spiffs_info(core::ptr::null(), &mut total, &mut used) };
        if ret == ESP_OK {
            info!("FlashStore: SPIFFS mounted at {} ({}/{} bytes used)", MOUNT_POINT, used, total);
        } else {
            info!("FlashStore: SPIFFS mounted at {}", MOUNT_POINT);
        }
        Ok(Self {})
    }

    /// A store whose every operation fails, used when the partition could
    /// not be mounted. Reads come back `NotFound`, so callers fall back to
    /// their defaults.
    pub fn unmounted() -> Self {
        Self {}
    }

    fn path(key: &str) -> String {
        format!("{}/{}.txt", MOUNT_POINT, key)
    }
}

#[cfg(target_os = "espidf")]
fn map_io(e: &std::io::Error) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound,
        std::io::ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::IoError,
    }
}

#[cfg(target_os = "espidf")]
impl StoragePort for FlashStore {
    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        std::fs::read(Self::path(key)).map_err(|e| map_io(&e))
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        std::fs::write(Self::path(key), data).map_err(|e| {
            warn!("FlashStore: write {} failed ({})", key, e);
            map_io(&e)
        })
    }

    fn append(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        use std::io::Write;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(Self::path(key))
            .map_err(|e| map_io(&e))?;
        file.write_all(data).map_err(|e| {
            warn!("FlashStore: append {} failed ({})", key, e);
            map_io(&e)
        })
    }

    fn exists(&self, key: &str) -> bool {
        std::path::Path::new(&Self::path(key)).exists()
    }

    fn format(&mut self) -> Result<(), StorageError> {
        warn!("FlashStore: formatting SPIFFS partition");
        // SAFETY: no file handles are held across this call.
        let ret = unsafe { esp_spiffs_format(core::ptr::null()) };
        if ret != ESP_OK {
            return Err(StorageError::IoError);
        }
        info!("FlashStore: format complete");
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl Default for FlashStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl FlashStore {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            read_only: false,
            appends_left: None,
        }
    }

    /// Same as [`new`](Self::new); mirrors the device constructor.
    pub fn mount() -> Result<Self, StorageError> {
        info!("FlashStore: simulation backend");
        Ok(Self::new())
    }

    /// Make every subsequent write and append fail with `IoError`.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Let `count` more appends succeed, then fail the rest with `IoError`.
    /// Simulates power loss between the two halves of a log entry.
    pub fn fail_appends_after(&mut self, count: u32) {
        self.appends_left = Some(count);
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(not(target_os = "espidf"))]
impl StoragePort for FlashStore {
    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.files.get(key).cloned().ok_or(StorageError::NotFound)
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::IoError);
        }
        self.files.insert(key.to_owned(), data.to_vec());
        Ok(())
    }

    fn append(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::IoError);
        }
        if let Some(left) = self.appends_left.as_mut() {
            if *left == 0 {
                return Err(StorageError::IoError);
            }
            *left -= 1;
        }
        self.files
            .entry(key.to_owned())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.files.contains_key(key)
    }

    fn format(&mut self) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::IoError);
        }
        info!("FlashStore(sim): erased {} records", self.files.len());
        self.files.clear();
        Ok(())
    }
}

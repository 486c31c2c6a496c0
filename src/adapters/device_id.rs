//! Device identity derived from the ESP32 factory MAC address.
//!
//! The broker client id has the form `soilwatch-xxyyzz-rrrr`: the last
//! three MAC bytes plus a 16-bit random suffix drawn at boot. The random
//! part keeps a rebooted device from colliding with its own stale session
//! still held open by the broker.

use core::fmt::Write;

/// Broker client id, e.g. `soilwatch-efcafe-1a2b`.
pub type ClientIdString = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Hardware RNG (true random once the radio is up).
#[cfg(target_os = "espidf")]
pub fn random_suffix() -> u16 {
    // SAFETY: plain FFI call with no arguments.
    (unsafe { esp_idf_svc::sys::esp_random() }) as u16
}

/// Simulation: sub-second clock bits are random enough for a suffix.
#[cfg(not(target_os = "espidf"))]
pub fn random_suffix() -> u16 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.subsec_nanos() as u16)
}

/// Build the broker client id from the MAC and a random suffix.
pub fn client_id(mac: &MacAddress, suffix: u16) -> ClientIdString {
    let mut id = ClientIdString::new();
    let _ = write!(
        id,
        "soilwatch-{:02x}{:02x}{:02x}-{:04x}",
        mac[3], mac[4], mac[5], suffix
    );
    id
}

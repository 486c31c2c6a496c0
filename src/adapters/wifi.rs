//! WiFi station adapter.
//!
//! Validates the compiled-in credentials and, on ESP-IDF, brings the
//! station interface up before the broker client starts. The connect loop
//! follows the broker's [`RetryPolicy`] and waits through a [`WaitPort`],
//! so it feeds the watchdog and honours a stop request.
//!
//! Once up, the ESP-IDF driver reconnects on its own after a drop; the
//! broker adapter notices the lost session and the sampling loop retries
//! it.

use core::fmt;

use crate::app::ports::{WaitOutcome, WaitPort};
use crate::app::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    Interrupted,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::Interrupted => write!(f, "WiFi connect interrupted"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// Placeholder left in the build when no credentials were supplied.
const PLACEHOLDER: &str = "CHANGE_HERE";

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid == PLACEHOLDER {
        return Err(ConnectivityError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

/// Checked station credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds
            .ssid
            .push_str(ssid)
            .map_err(|_| ConnectivityError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(creds)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Open network (no passphrase).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Call `attempt` until it succeeds, waiting per `retry` in between.
pub fn connect_with_retry<E: fmt::Display>(
    retry: &RetryPolicy,
    waiter: &mut impl WaitPort,
    mut attempt: impl FnMut(u32) -> Result<(), E>,
) -> Result<u32, ConnectivityError> {
    let mut n: u32 = 0;
    loop {
        n = n.saturating_add(1);
        match attempt(n) {
            Ok(()) => return Ok(n),
            Err(e) => {
                let Some(delay) = retry.delay_for(n) else {
                    log::error!("WiFi: attempt {} failed ({}), giving up", n, e);
                    return Err(ConnectivityError::ConnectionFailed);
                };
                log::warn!(
                    "WiFi: attempt {} failed ({}), retrying in {}s",
                    n,
                    e,
                    delay.as_secs()
                );
                if waiter.wait(delay) == WaitOutcome::Interrupted {
                    return Err(ConnectivityError::Interrupted);
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF station bring-up
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn connect_station(
    creds: &WifiCredentials,
    modem: esp_idf_hal::modem::Modem,
    sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
    nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
    retry: &RetryPolicy,
    waiter: &mut impl WaitPort,
) -> anyhow::Result<esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>> {
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

    let config = Configuration::Client(ClientConfiguration {
        ssid: creds
            .ssid()
            .try_into()
            .map_err(|_| ConnectivityError::InvalidSsid)?,
        password: creds
            .password()
            .try_into()
            .map_err(|_| ConnectivityError::InvalidPassword)?,
        auth_method: if creds.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    });

    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), Some(nvs))?, sysloop)?;
    wifi.set_configuration(&config)?;
    wifi.start()?;
    log::info!("WiFi: connecting to '{}'", creds.ssid());

    let attempts = connect_with_retry(retry, waiter, |_| {
        let _ = wifi.disconnect();
        wifi.connect()?;
        wifi.wait_netif_up()
    })?;

    let ip = wifi.wifi().sta_netif().get_ip_info()?;
    log::info!("WiFi: connected after {} attempt(s), IP {}", attempts, ip.ip);
    Ok(wifi)
}

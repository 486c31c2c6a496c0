//! MQTT broker adapter.
//!
//! Implements [`BrokerPort`] for the remote telemetry broker.
//!
//! - On ESP-IDF: wraps `EspMqttClient`. The ESP-IDF client connects and
//!   reconnects on its own in the background; a poll thread watches the
//!   connection events, tracks the session state and forwards received
//!   messages into an [`InboundQueue`].
//! - On host/test: [`SimBroker`], a scripted in-memory broker.
//!
//! ```text
//! ┌─────────────┐ InboundMessage ┌──────────────┐
//! │  mqtt-poll  │──────────────▶│ sampling loop │
//! │  (thread)   │   InboundQueue │ poll_inbound  │
//! └─────────────┘                └──────────────┘
//! ```
//!
//! Subscriptions do not survive a reconnect. Every new session bumps an
//! epoch counter; `is_connected` reports false until `connect` has
//! resubscribed for the current epoch.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;

use crate::app::ports::InboundMessage;
#[cfg(not(target_os = "espidf"))]
use crate::app::ports::{BrokerError, BrokerPort};

/// Inbound messages buffered between two cycles. On overflow the oldest
/// message is evicted, so the latest value per channel always survives.
pub const INBOUND_DEPTH: usize = 8;

// ───────────────────────────────────────────────────────────────
// Inbound queue
// ───────────────────────────────────────────────────────────────

/// Bounded hand-off from the MQTT task to the sampling loop.
pub struct InboundQueue {
    chan: Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_DEPTH>,
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InboundQueue {
    pub const fn new() -> Self {
        Self {
            chan: Channel::new(),
        }
    }

    /// Enqueue without blocking, evicting the oldest message when full.
    /// Returns `false` if a message had to be evicted.
    pub fn push(&self, mut msg: InboundMessage) -> bool {
        let mut evicted = false;
        loop {
            match self.chan.try_send(msg) {
                Ok(()) => return !evicted,
                Err(TrySendError::Full(back)) => {
                    msg = back;
                    if let Ok(old) = self.chan.try_receive() {
                        warn!("MQTT: inbound queue full, evicting message on {}", old.topic);
                        evicted = true;
                    }
                }
            }
        }
    }

    pub fn pop(&self) -> Option<InboundMessage> {
        self.chan.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.chan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chan.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::MqttBroker;

#[cfg(target_os = "espidf")]
mod esp {
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use core::time::Duration;
    use std::sync::Arc;

    use esp_idf_svc::mqtt::client::{
        Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
    };
    use log::{info, warn};

    use super::InboundQueue;
    use crate::app::ports::{BrokerError, BrokerPort, InboundMessage};

    /// How long `connect` waits for the background client to come up.
    /// Stays below the watchdog timeout; the backoff wait that follows a
    /// failed attempt feeds it.
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(8);
    const CONNECT_POLL: Duration = Duration::from_millis(250);

    /// State shared with the poll thread.
    #[derive(Default)]
    struct Session {
        connected: AtomicBool,
        epoch: AtomicU32,
        inbound: InboundQueue,
    }

    pub struct MqttBroker {
        client: EspMqttClient<'static>,
        session: Arc<Session>,
        subscriptions: [String; 2],
        subscribed_epoch: Option<u32>,
    }

    impl MqttBroker {
        /// Start the client and its poll thread. `subscriptions` are the
        /// two threshold channels.
        pub fn start(
            url: &str,
            client_id: &str,
            username: &str,
            password: &str,
            subscriptions: [String; 2],
        ) -> anyhow::Result<Self> {
            let conf = MqttClientConfiguration {
                client_id: Some(client_id),
                username: (!username.is_empty()).then_some(username),
                password: (!password.is_empty()).then_some(password),
                ..Default::default()
            };
            let (client, conn) = EspMqttClient::new(url, &conf)?;
            let session = Arc::new(Session::default());

            let shared = session.clone();
            std::thread::Builder::new()
                .name("mqtt-poll".to_string())
                .stack_size(6144)
                .spawn(move || poll_events(conn, &shared))?;

            info!("MQTT: client '{}' started for {}", client_id, url);
            Ok(Self {
                client,
                session,
                subscriptions,
                subscribed_epoch: None,
            })
        }
    }

    fn poll_events(mut conn: EspMqttConnection, session: &Session) {
        loop {
            let event = match conn.next() {
                Ok(event) => event,
                Err(e) => {
                    warn!("MQTT: connection closed ({:?})", e);
                    session.connected.store(false, Ordering::Release);
                    return;
                }
            };
            match event.payload() {
                EventPayload::Connected(_) => {
                    session.epoch.fetch_add(1, Ordering::AcqRel);
                    session.connected.store(true, Ordering::Release);
                    info!("MQTT: session up");
                }
                EventPayload::Disconnected => {
                    session.connected.store(false, Ordering::Release);
                    warn!("MQTT: session down");
                }
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    details: Details::Complete,
                    ..
                } => {
                    session.inbound.push(InboundMessage::new(topic, data));
                }
                EventPayload::Error(e) => warn!("MQTT: client error ({:?})", e),
                _ => {}
            }
        }
    }

    impl BrokerPort for MqttBroker {
        fn is_connected(&self) -> bool {
            self.session.connected.load(Ordering::Acquire)
                && self.subscribed_epoch == Some(self.session.epoch.load(Ordering::Acquire))
        }

        fn connect(&mut self) -> Result<(), BrokerError> {
            let mut waited = Duration::ZERO;
            while !self.session.connected.load(Ordering::Acquire) {
                if waited >= CONNECT_TIMEOUT {
                    return Err(BrokerError::ConnectFailed(
                        esp_idf_svc::sys::ESP_ERR_TIMEOUT as i32,
                    ));
                }
                std::thread::sleep(CONNECT_POLL);
                waited += CONNECT_POLL;
            }

            let epoch = self.session.epoch.load(Ordering::Acquire);
            for topic in &self.subscriptions {
                if let Err(e) = self.client.subscribe(topic, QoS::AtLeastOnce) {
                    warn!("MQTT: subscribe {} failed ({:?})", topic, e);
                    return Err(BrokerError::SubscribeFailed);
                }
                info!("MQTT: subscribed to {}", topic);
            }
            self.subscribed_epoch = Some(epoch);
            Ok(())
        }

        fn poll_inbound(&mut self) -> Option<InboundMessage> {
            self.session.inbound.pop()
        }

        fn publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError> {
            if !self.session.connected.load(Ordering::Acquire) {
                return Err(BrokerError::NotConnected);
            }
            self.client
                .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes())
                .map(|_| ())
                .map_err(|e| {
                    warn!("MQTT: publish {} failed ({:?})", topic, e);
                    BrokerError::PublishFailed
                })
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation broker
// ───────────────────────────────────────────────────────────────

/// Scripted broker for host builds and tests.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct SimBroker {
    connected: bool,
    failures_left: u32,
    connect_attempts: u32,
    subscriptions: Vec<String>,
    topics: Vec<String>,
    published: Vec<(String, String)>,
    reject_publish_on: Option<String>,
    inbound: InboundQueue,
}

#[cfg(not(target_os = "espidf"))]
impl SimBroker {
    /// A disconnected broker that will subscribe to `subscriptions` on
    /// every successful connect.
    pub fn new(subscriptions: [String; 2]) -> Self {
        Self {
            topics: subscriptions.to_vec(),
            ..Default::default()
        }
    }

    /// Fail the next `n` connect attempts.
    pub fn fail_next_connects(&mut self, n: u32) {
        self.failures_left = n;
    }

    /// Simulate the session dropping.
    pub fn drop_connection(&mut self) {
        self.connected = false;
    }

    /// Reject publishes on `topic` with `PublishFailed`.
    pub fn reject_publish_on(&mut self, topic: impl Into<String>) {
        self.reject_publish_on = Some(topic.into());
    }

    /// Queue a message as if it had arrived from the broker.
    pub fn inject(&self, msg: InboundMessage) -> bool {
        self.inbound.push(msg)
    }

    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }

    /// Every SUBSCRIBE sent, including resubscriptions.
    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }
}

#[cfg(not(target_os = "espidf"))]
impl BrokerPort for SimBroker {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<(), BrokerError> {
        self.connect_attempts += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(BrokerError::ConnectFailed(-1));
        }
        self.connected = true;
        self.subscriptions.extend(self.topics.iter().cloned());
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound.pop()
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError> {
        if !self.connected {
            return Err(BrokerError::NotConnected);
        }
        if self.reject_publish_on.as_deref() == Some(topic) {
            return Err(BrokerError::PublishFailed);
        }
        self.published.push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }
}

//! Link repair for the wireless network and the messaging session.
//!
//! Each link is a two-state machine (down/up) driven only by the operations
//! below. Failures are never fatal: they are logged, reflected in the status
//! snapshot and retried on the next fixed gate. Fixed-interval polling is
//! intentional for a small fleet with human-scale monitoring.

use log::{info, warn};

use crate::config::NodeConfig;
use crate::messaging::MessagingClient;
use crate::platform::Platform;
use crate::status::SystemStatus;
use crate::telemetry::TelemetryPublisher;
use crate::wireless::WirelessLink;

/// Poll interval while waiting for the wireless link to come up.
const WIFI_POLL_INTERVAL_MS: u64 = 500;
/// Gate between wireless link checks.
const WIFI_CHECK_INTERVAL_MS: u64 = 30_000;
/// Gate between messaging session checks. Shorter than the wireless gate;
/// broker sessions drop and recover on a faster timescale than the radio.
const MQTT_CHECK_INTERVAL_MS: u64 = 10_000;

/// Tracks when each link was last checked and repairs them independently.
#[derive(Default)]
pub struct ConnectivityManager {
    last_wifi_check_ms: u64,
    last_mqtt_check_ms: u64,
}

impl ConnectivityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring up the wireless link, blocking up to the configured timeout.
    ///
    /// Idempotent: returns true immediately when already connected, with no
    /// side effect. Otherwise starts one connect attempt and polls the link
    /// until it is up or the timeout elapses. Blocking here is acceptable;
    /// the node has nothing else to do while offline.
    pub fn ensure_wireless_link<W, P>(
        &mut self,
        wireless: &mut W,
        platform: &mut P,
        status: &mut SystemStatus,
        config: &NodeConfig,
    ) -> bool
    where
        W: WirelessLink,
        P: Platform,
    {
        if wireless.is_connected() {
            return true;
        }

        info!("connecting to wireless network {}", config.wifi_ssid);
        wireless.connect(config.wifi_ssid, config.wifi_password);

        let started = platform.uptime_ms();
        while !wireless.is_connected() && platform.uptime_ms() - started < config.wifi_timeout_ms {
            platform.delay_ms(WIFI_POLL_INTERVAL_MS);
        }

        if wireless.is_connected() {
            info!("wireless connected, address {}", wireless.local_address());
            status.wifi_connected = true;
            status.reconnect_attempts = 0;
            true
        } else {
            status.wifi_connected = false;
            status.reconnect_attempts += 1;
            warn!(
                "wireless connection timed out after {} ms (failed attempts: {})",
                config.wifi_timeout_ms, status.reconnect_attempts
            );
            false
        }
    }

    /// One messaging handshake attempt; no internal retry loop, the next
    /// periodic gate retries instead. Emits an `"online"` status as soon as
    /// the session is up.
    pub fn ensure_messaging_session<M, W, P>(
        &mut self,
        messaging: &mut M,
        wireless: &W,
        platform: &P,
        publisher: &TelemetryPublisher,
        status: &mut SystemStatus,
        config: &NodeConfig,
    ) -> bool
    where
        M: MessagingClient,
        W: WirelessLink,
        P: Platform,
    {
        if messaging.is_connected() {
            return true;
        }

        info!("connecting to broker as {}", config.node_id);
        if messaging.connect(config.node_id) {
            info!("messaging session up");
            status.mqtt_connected = true;
            status.reconnect_attempts = 0;
            publisher.publish_status(messaging, wireless, platform, "online");
            true
        } else {
            warn!("broker connection failed, rc={}", messaging.last_error_code());
            status.mqtt_connected = false;
            false
        }
    }

    /// Gate-checked repair of both links.
    ///
    /// Two independent timers rather than one combined gate: the links fail
    /// and recover on different timescales. A gate that fires advances its
    /// timer whether or not the link needed repair; a link that is up is
    /// left alone.
    pub fn periodic_check<W, M, P>(
        &mut self,
        wireless: &mut W,
        messaging: &mut M,
        platform: &mut P,
        publisher: &TelemetryPublisher,
        status: &mut SystemStatus,
        config: &NodeConfig,
    ) where
        W: WirelessLink,
        M: MessagingClient,
        P: Platform,
    {
        let now = platform.uptime_ms();

        if now - self.last_wifi_check_ms > WIFI_CHECK_INTERVAL_MS {
            if !wireless.is_connected() {
                warn!("wireless link down, reconnecting");
                status.wifi_connected = false;
                self.ensure_wireless_link(wireless, platform, status, config);
            }
            self.last_wifi_check_ms = now;
        }

        if now - self.last_mqtt_check_ms > MQTT_CHECK_INTERVAL_MS {
            if !messaging.is_connected() {
                warn!("messaging session down, reconnecting");
                status.mqtt_connected = false;
                self.ensure_messaging_session(messaging, wireless, platform, publisher, status, config);
            }
            self.last_mqtt_check_ms = now;
        }
    }
}

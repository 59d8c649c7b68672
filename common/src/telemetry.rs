//! Message formatting and publishing: data and status payloads, alert flags
//! and the uptime timestamp.

use log::{info, warn};
use serde::Serialize;

use crate::config::NodeConfig;
use crate::messaging::MessagingClient;
use crate::platform::Platform;
use crate::sensor::SensorReading;
use crate::wireless::WirelessLink;

/// Render milliseconds-since-boot as `"{days}T{hh}:{mm}:{ss}Z"`.
///
/// This is relative uptime in a date-like shape, not a calendar timestamp:
/// the node has no real-time clock and the fleet's consumers key on the
/// shape only. Days are unbounded.
pub fn format_uptime(uptime_ms: u64) -> String {
    let seconds = uptime_ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    format!(
        "{}T{:02}:{:02}:{:02}Z",
        days,
        hours % 24,
        minutes % 60,
        seconds % 60
    )
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[derive(Serialize)]
struct DataMessage<'a> {
    esp_id: &'a str,
    temperature: f32,
    humidity: f32,
    timestamp: String,
    uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert: Option<&'static str>,
}

#[derive(Serialize)]
struct StatusMessage<'a> {
    esp_id: &'a str,
    status: &'a str,
    timestamp: String,
    uptime: u64,
    wifi_rssi: i32,
    free_heap: u32,
}

/// Formats and emits data and status messages.
pub struct TelemetryPublisher {
    config: NodeConfig,
}

impl TelemetryPublisher {
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }

    /// Alert flag for a reading; at most one, temperature takes priority.
    fn alert_for(&self, reading: &SensorReading) -> Option<&'static str> {
        if reading.temperature > self.config.temp_alert_threshold {
            Some("high_temperature")
        } else if reading.humidity < self.config.humidity_min
            || reading.humidity > self.config.humidity_max
        {
            Some("humidity_out_of_range")
        } else {
            None
        }
    }

    /// Publish a data message for `reading` to the data topic.
    ///
    /// Invalid readings are refused without touching the transport; the loop
    /// driver reports those as a `"sensor_error"` status instead. Returns
    /// true only when the transport accepted the publish; there is no
    /// in-cycle retry.
    pub fn publish_reading<M, P>(
        &self,
        messaging: &mut M,
        platform: &P,
        reading: &SensorReading,
    ) -> bool
    where
        M: MessagingClient,
        P: Platform,
    {
        if !reading.valid {
            return false;
        }

        let uptime = platform.uptime_ms();
        let message = DataMessage {
            esp_id: self.config.node_id,
            temperature: round2(reading.temperature),
            humidity: round2(reading.humidity),
            timestamp: format_uptime(uptime),
            uptime,
            alert: self.alert_for(reading),
        };

        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("data message serialization failed: {e}");
                return false;
            }
        };

        info!("publishing {payload}");
        if messaging.publish(self.config.data_topic, &payload) {
            true
        } else {
            warn!("data publish failed, rc={}", messaging.last_error_code());
            false
        }
    }

    /// Publish a status message with the given label to the status topic.
    pub fn publish_status<M, W, P>(
        &self,
        messaging: &mut M,
        wireless: &W,
        platform: &P,
        label: &str,
    ) -> bool
    where
        M: MessagingClient,
        W: WirelessLink,
        P: Platform,
    {
        let uptime = platform.uptime_ms();
        let message = StatusMessage {
            esp_id: self.config.node_id,
            status: label,
            timestamp: format_uptime(uptime),
            uptime,
            wifi_rssi: wireless.signal_strength(),
            free_heap: platform.free_heap(),
        };

        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("status message serialization failed: {e}");
                return false;
            }
        };

        messaging.publish(self.config.status_topic, &payload)
    }
}

#[test]
fn test_format_uptime() {
    assert_eq!(format_uptime(0), "0T00:00:00Z");
    assert_eq!(format_uptime(90_061_000), "1T01:01:01Z");
    assert_eq!(format_uptime(25 * 3_600_000), "1T01:00:00Z");
    // Days are unbounded, hours wrap.
    assert_eq!(format_uptime(49 * 3_600_000 + 59_000), "2T01:00:59Z");
}

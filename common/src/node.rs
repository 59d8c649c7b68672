//! The cooperative loop driver: sequences connectivity repair, status
//! refresh, inbound drain, sampling and publication, and owns all of the
//! node's mutable state.

use log::{info, warn};

use crate::config::NodeConfig;
use crate::connectivity::ConnectivityManager;
use crate::messaging::MessagingClient;
use crate::platform::Platform;
use crate::sensor::{SensorDriver, SensorReader, SensorReading};
use crate::status::SystemStatus;
use crate::telemetry::TelemetryPublisher;
use crate::wireless::WirelessLink;

/// Yield between loop iterations; bounds CPU usage and poll latency.
const LOOP_DELAY_MS: u64 = 100;

/// A cluster sensor node: owns the drivers, the derived state and the
/// cooperative loop that ties the components together.
///
/// Within one iteration connectivity repair always precedes sampling, which
/// always precedes publication; no component calls back into an earlier one.
pub struct Node<P, W, M, S> {
    config: NodeConfig,
    platform: P,
    wireless: W,
    messaging: M,
    sensor: S,
    sensor_reader: SensorReader,
    connectivity: ConnectivityManager,
    publisher: TelemetryPublisher,
    status: SystemStatus,
    last_reading: Option<SensorReading>,
    last_publish_ms: u64,
}

impl<P, W, M, S> Node<P, W, M, S>
where
    P: Platform,
    W: WirelessLink,
    M: MessagingClient,
    S: SensorDriver,
{
    pub fn new(config: NodeConfig, platform: P, wireless: W, messaging: M, sensor: S) -> Self {
        let sensor_reader = SensorReader::new(config.sensor_retry_count);
        let publisher = TelemetryPublisher::new(config.clone());

        Self {
            config,
            platform,
            wireless,
            messaging,
            sensor,
            sensor_reader,
            connectivity: ConnectivityManager::new(),
            publisher,
            status: SystemStatus::default(),
            last_reading: None,
            last_publish_ms: 0,
        }
    }

    /// Initial bring-up: banner, then one wireless attempt and, only when
    /// the radio is up, one session attempt. Failures here are not fatal;
    /// the periodic gates repair the links later.
    pub fn bootstrap(&mut self) {
        info!("cluster sensor node {}", self.config.node_id);
        info!("data topic {}", self.config.data_topic);
        info!("firmware version {}", env!("CARGO_PKG_VERSION"));

        if self.connectivity.ensure_wireless_link(
            &mut self.wireless,
            &mut self.platform,
            &mut self.status,
            &self.config,
        ) {
            self.connectivity.ensure_messaging_session(
                &mut self.messaging,
                &self.wireless,
                &self.platform,
                &self.publisher,
                &mut self.status,
                &self.config,
            );
        }
    }

    /// Run the loop forever; the node has no terminal state.
    pub fn run(&mut self) -> ! {
        self.bootstrap();

        loop {
            self.run_cycle();
            self.platform.delay_ms(LOOP_DELAY_MS);
        }
    }

    /// One loop iteration: repair links, refresh the status snapshot, drain
    /// inbound traffic, then sample and publish when the gate has elapsed.
    pub fn run_cycle(&mut self) {
        self.connectivity.periodic_check(
            &mut self.wireless,
            &mut self.messaging,
            &mut self.platform,
            &self.publisher,
            &mut self.status,
            &self.config,
        );

        self.refresh_status();
        self.drain_inbound();

        let now = self.platform.uptime_ms();
        if now - self.last_publish_ms >= self.config.sample_interval_ms {
            self.sampling_cycle(now);
        }
    }

    /// Cheap re-derivation of the snapshot from live link queries.
    fn refresh_status(&mut self) {
        self.status.uptime_ms = self.platform.uptime_ms();
        self.status.wifi_connected = self.wireless.is_connected();
        self.status.mqtt_connected = self.messaging.is_connected();
    }

    /// Drain and log messages received on the session. The node processes
    /// no commands; inbound traffic is diagnostic only.
    fn drain_inbound(&mut self) {
        for message in self.messaging.poll() {
            info!("message on {}: {}", message.topic, message.payload);
        }
    }

    fn sampling_cycle(&mut self, now: u64) {
        let reading = self.sensor_reader.sample(&mut self.sensor, &mut self.platform);

        if reading.valid {
            if self
                .publisher
                .publish_reading(&mut self.messaging, &self.platform, &reading)
            {
                self.last_reading = Some(reading);
                self.status.last_sensor_read_ms = now;
            }
        } else {
            warn!("no valid sensor reading, reporting sensor_error");
            self.publisher.publish_status(
                &mut self.messaging,
                &self.wireless,
                &self.platform,
                "sensor_error",
            );
        }

        // The gate advances even when publishing failed so a broker outage
        // cannot turn into a rapid retry storm.
        self.last_publish_ms = now;
    }

    pub fn status(&self) -> &SystemStatus {
        &self.status
    }

    pub fn last_reading(&self) -> Option<&SensorReading> {
        self.last_reading.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::testing::FakeMessaging;
    use crate::messaging::InboundMessage;
    use crate::platform::testing::FakePlatform;
    use crate::sensor::testing::FakeSensor;
    use crate::wireless::testing::FakeWireless;

    type TestNode = Node<FakePlatform, FakeWireless, FakeMessaging, FakeSensor>;

    fn test_config() -> NodeConfig {
        NodeConfig {
            node_id: "node_test",
            data_topic: "cluster/test",
            status_topic: "cluster/status",
            sample_interval_ms: 60_000,
            sensor_retry_count: 3,
            temp_alert_threshold: 35.0,
            humidity_min: 20.0,
            humidity_max: 80.0,
            wifi_timeout_ms: 15_000,
            ..NodeConfig::default()
        }
    }

    /// Node with both links up and the sampling gate open.
    fn ready_node(sensor: FakeSensor) -> TestNode {
        Node::new(
            test_config(),
            FakePlatform::at(60_000),
            FakeWireless::up(),
            FakeMessaging::connected(),
            sensor,
        )
    }

    #[test]
    fn hot_reading_is_published_with_high_temperature_alert() {
        let mut node = ready_node(FakeSensor::with_script(&[(45.0, 36.0)]));

        node.run_cycle();

        let payloads = node.messaging.published_on("cluster/test");
        assert_eq!(payloads.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&payloads[0]).unwrap();
        assert_eq!(value["temperature"].as_f64().unwrap(), 36.0);
        assert_eq!(value["humidity"].as_f64().unwrap(), 45.0);
        assert_eq!(value["alert"], "high_temperature");

        assert!(node.last_reading().is_some());
        assert_eq!(node.status().last_sensor_read_ms, 60_000);
    }

    #[test]
    fn failed_sensor_reports_sensor_error_and_leaves_data_topic_alone() {
        let mut node = ready_node(FakeSensor::always_nan());

        node.run_cycle();

        assert!(node.messaging.published_on("cluster/test").is_empty());

        let payloads = node.messaging.published_on("cluster/status");
        assert_eq!(payloads.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&payloads[0]).unwrap();
        assert_eq!(value["status"], "sensor_error");

        assert!(node.last_reading().is_none());
        assert_eq!(node.status().last_sensor_read_ms, 0);
        // All retry attempts were spent.
        assert_eq!(node.sensor.reads, 3);
    }

    #[test]
    fn publish_failure_keeps_reading_uncommitted_but_advances_the_gate() {
        let mut node = ready_node(FakeSensor::with_script(&[(50.0, 21.0), (50.0, 21.0)]));
        node.messaging.accept_publish = false;

        node.run_cycle();

        assert!(node.last_reading().is_none());
        assert_eq!(node.status().last_sensor_read_ms, 0);
        assert_eq!(node.messaging.publish_calls, 1);

        // Within the same interval nothing new is attempted.
        node.run_cycle();
        assert_eq!(node.messaging.publish_calls, 1);
    }

    #[test]
    fn sampling_gate_stays_closed_between_intervals() {
        let mut node = ready_node(FakeSensor::with_script(&[(50.0, 21.0), (55.0, 22.0)]));

        node.run_cycle();
        assert_eq!(node.messaging.published_on("cluster/test").len(), 1);

        // 30 s later the gate is still closed.
        node.platform.now_ms = 90_000;
        node.run_cycle();
        assert_eq!(node.messaging.published_on("cluster/test").len(), 1);

        // One full interval later it opens again.
        node.platform.now_ms = 120_000;
        node.run_cycle();
        assert_eq!(node.messaging.published_on("cluster/test").len(), 2);
    }

    #[test]
    fn status_snapshot_tracks_live_links() {
        let mut node = ready_node(FakeSensor::with_script(&[(50.0, 21.0)]));

        node.run_cycle();

        assert!(node.status().wifi_connected);
        assert!(node.status().mqtt_connected);
        assert_eq!(node.status().uptime_ms, 60_000);
    }

    #[test]
    fn inbound_messages_are_drained_every_cycle() {
        let mut node = ready_node(FakeSensor::with_script(&[(50.0, 21.0)]));
        node.messaging.inbound.push(InboundMessage {
            topic: "cluster/test".to_string(),
            payload: "ping".to_string(),
        });

        node.run_cycle();

        assert!(node.messaging.poll().is_empty());
    }

    #[test]
    fn bootstrap_brings_both_links_up_and_announces_online() {
        let mut node = Node::new(
            test_config(),
            FakePlatform::at(0),
            FakeWireless::connects_after(1),
            FakeMessaging::new(),
            FakeSensor::with_script(&[]),
        );

        node.bootstrap();

        assert!(node.wireless.is_connected());
        assert!(node.messaging.is_connected());
        let payloads = node.messaging.published_on("cluster/status");
        assert_eq!(payloads.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&payloads[0]).unwrap();
        assert_eq!(value["status"], "online");
    }

    #[test]
    fn bootstrap_without_radio_skips_the_session_attempt() {
        let mut node = Node::new(
            test_config(),
            FakePlatform::at(0),
            FakeWireless::down(),
            FakeMessaging::new(),
            FakeSensor::with_script(&[]),
        );

        node.bootstrap();

        assert_eq!(node.status().reconnect_attempts, 1);
        assert_eq!(node.messaging.connect_calls, 0);
    }
}

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
use log::warn;

use cluster_node_common::config::NodeConfig;
use cluster_node_common::messaging::{InboundMessage, MessagingClient};

/// How long `connect` waits for the broker handshake to finish.
const CONNECT_WAIT_MS: u64 = 100;
const CONNECT_WAIT_STEPS: u32 = 20;

/// Session state shared with the client's event callback, which runs on the
/// ESP-IDF MQTT task.
#[derive(Default)]
struct SessionState {
    connected: AtomicBool,
    last_error: AtomicI32,
    inbound: Mutex<VecDeque<InboundMessage>>,
}

/// Broker session on the device, backed by the ESP-IDF MQTT client.
///
/// The IDF client reconnects on its own once created, so `connect` builds it
/// at most once and afterwards just reports the session state.
pub struct EspMessaging {
    broker_url: String,
    keep_alive: Duration,
    client: Option<EspMqttClient<'static>>,
    state: Arc<SessionState>,
}

impl EspMessaging {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            broker_url: format!("mqtt://{}:{}", config.broker_host, config.broker_port),
            keep_alive: Duration::from_secs(config.keep_alive_secs as u64),
            client: None,
            state: Arc::new(SessionState::default()),
        }
    }

    fn create_client(&mut self, client_id: &str) -> anyhow::Result<()> {
        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            keep_alive_interval: Some(self.keep_alive),
            ..Default::default()
        };

        let state = self.state.clone();
        let client = EspMqttClient::new_cb(&self.broker_url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    state.connected.store(true, Ordering::Relaxed);
                }
                EventPayload::Disconnected => {
                    state.connected.store(false, Ordering::Relaxed);
                }
                EventPayload::Received { topic, data, .. } => {
                    let message = InboundMessage {
                        topic: topic.unwrap_or("").to_string(),
                        payload: String::from_utf8_lossy(data).into_owned(),
                    };
                    state.inbound.lock().unwrap().push_back(message);
                }
                EventPayload::Error(e) => {
                    warn!("mqtt event error: {e}");
                    state.last_error.store(1, Ordering::Relaxed);
                }
                _ => {}
            }
        })?;

        self.client = Some(client);
        Ok(())
    }
}

impl MessagingClient for EspMessaging {
    fn connect(&mut self, client_id: &str) -> bool {
        if self.client.is_none() {
            if let Err(e) = self.create_client(client_id) {
                warn!("mqtt client creation failed: {e}");
                self.state.last_error.store(-1, Ordering::Relaxed);
                return false;
            }
        }

        // The handshake completes on the MQTT task; give it a bounded window.
        for _ in 0..CONNECT_WAIT_STEPS {
            if self.state.connected.load(Ordering::Relaxed) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(CONNECT_WAIT_MS));
        }

        false
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Relaxed)
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        let Some(client) = self.client.as_mut() else {
            return false;
        };

        match client.publish(topic, QoS::AtMostOnce, false, payload.as_bytes()) {
            Ok(_) => true,
            Err(e) => {
                warn!("mqtt publish failed: {e}");
                self.state.last_error.store(e.code(), Ordering::Relaxed);
                false
            }
        }
    }

    fn poll(&mut self) -> Vec<InboundMessage> {
        self.state.inbound.lock().unwrap().drain(..).collect()
    }

    fn last_error_code(&self) -> i32 {
        self.state.last_error.load(Ordering::Relaxed)
    }
}

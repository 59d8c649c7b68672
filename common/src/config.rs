/// Per-deployment constants, resolved at build time.
///
/// String values come from compile-time environment variables where set and
/// fall back to bench defaults; there is no runtime reconfiguration. Every
/// node of a deployment is flashed with its own `NODE_ID` and topics.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Identifier of this node, carried in every published message.
    pub node_id: &'static str,
    /// Topic for sensor data messages.
    pub data_topic: &'static str,
    /// Topic for status messages.
    pub status_topic: &'static str,
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    pub broker_host: &'static str,
    pub broker_port: u16,
    /// Minimum interval between sampling cycles, in milliseconds.
    pub sample_interval_ms: u64,
    /// Physical read attempts per sampling cycle.
    pub sensor_retry_count: u32,
    /// Temperature above this raises a `high_temperature` alert.
    pub temp_alert_threshold: f32,
    /// Humidity outside `[humidity_min, humidity_max]` raises an alert.
    pub humidity_min: f32,
    pub humidity_max: f32,
    /// Console baud rate on the device build.
    pub serial_baud: u32,
    /// How long one wireless connect attempt may block before giving up.
    pub wifi_timeout_ms: u64,
    /// Keep-alive interval applied to the messaging session, in seconds.
    pub keep_alive_secs: u16,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: option_env!("NODE_ID").unwrap_or("node_unknown"),
            data_topic: option_env!("DATA_TOPIC").unwrap_or("cluster/unknown"),
            status_topic: option_env!("STATUS_TOPIC").unwrap_or("cluster/status"),
            wifi_ssid: option_env!("WIFI_SSID").unwrap_or(""),
            wifi_password: option_env!("WIFI_PASS").unwrap_or(""),
            broker_host: option_env!("MQTT_HOST").unwrap_or("192.168.0.10"),
            broker_port: 1883,
            sample_interval_ms: 60_000,
            sensor_retry_count: 3,
            temp_alert_threshold: 35.0,
            humidity_min: 20.0,
            humidity_max: 80.0,
            serial_baud: 115_200,
            wifi_timeout_ms: 15_000,
            keep_alive_secs: 30,
        }
    }
}

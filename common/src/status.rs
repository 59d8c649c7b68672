/// Link and uptime snapshot, refreshed every loop iteration.
///
/// Owned by the loop driver and passed by reference into each component
/// call; resets to defaults on restart, nothing is persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SystemStatus {
    pub wifi_connected: bool,
    pub mqtt_connected: bool,
    pub uptime_ms: u64,
    /// Uptime at which the last reading was published successfully.
    pub last_sensor_read_ms: u64,
    /// Failed wireless connect attempts since the last successful one.
    pub reconnect_attempts: u32,
}

//! Messaging session seam and a log-only implementation, so the publishing
//! flow can be exercised without a broker.

/// A message drained from the session by [`MessagingClient::poll`].
#[derive(Clone, Debug, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

/// Publish/subscribe session as seen by the core.
pub trait MessagingClient {
    /// One session handshake attempt with the broker.
    fn connect(&mut self, client_id: &str) -> bool;

    fn is_connected(&self) -> bool;

    /// Publish `payload` to `topic`. True only when the transport accepted
    /// the message.
    fn publish(&mut self, topic: &str, payload: &str) -> bool;

    /// Drain messages received since the last call.
    fn poll(&mut self) -> Vec<InboundMessage>;

    /// Transport-specific code of the most recent failure.
    fn last_error_code(&self) -> i32;
}

/// Log-only session: always connects and accepts every publish, writing the
/// payload to the log instead of a broker.
#[derive(Default)]
pub struct LoggerMessaging {
    connected: bool,
}

impl LoggerMessaging {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessagingClient for LoggerMessaging {
    fn connect(&mut self, client_id: &str) -> bool {
        log::debug!("messaging(log): session up for {client_id}");
        self.connected = true;
        true
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        log::info!("messaging(log): {topic} <- {payload}");
        true
    }

    fn poll(&mut self) -> Vec<InboundMessage> {
        Vec::new()
    }

    fn last_error_code(&self) -> i32 {
        0
    }
}

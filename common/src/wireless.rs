//! Wireless link seam. The radio stack itself is out of scope; the core
//! only needs the operations below.

/// Station-mode wireless link as seen by the connectivity manager.
pub trait WirelessLink {
    /// Begin a connection attempt. Completion is observed by polling
    /// [`WirelessLink::is_connected`].
    fn connect(&mut self, ssid: &str, password: &str) -> bool;

    fn is_connected(&self) -> bool;

    /// Received signal strength in dBm.
    fn signal_strength(&self) -> i32;

    /// Address assigned to this station, for logs.
    fn local_address(&self) -> String;
}

/// Link for the host simulator: association succeeds immediately.
#[derive(Default)]
pub struct DummyWireless {
    connected: bool,
}

impl DummyWireless {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WirelessLink for DummyWireless {
    fn connect(&mut self, ssid: &str, _password: &str) -> bool {
        log::debug!("wireless(sim): joining {ssid}");
        self.connected = true;
        true
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn signal_strength(&self) -> i32 {
        -42
    }

    fn local_address(&self) -> String {
        "192.168.0.100".to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;

    use super::WirelessLink;

    /// Scriptable link: a connect attempt succeeds after a configurable
    /// number of status polls, or never.
    pub struct FakeWireless {
        pub connect_calls: u32,
        connected: Cell<bool>,
        /// `None` means attempts never succeed.
        polls_until_up: Option<u32>,
        polls_left: Cell<u32>,
        attempt_pending: Cell<bool>,
    }

    impl FakeWireless {
        /// Already associated.
        pub fn up() -> Self {
            Self {
                connect_calls: 0,
                connected: Cell::new(true),
                polls_until_up: Some(0),
                polls_left: Cell::new(0),
                attempt_pending: Cell::new(false),
            }
        }

        /// Comes up after `polls` status polls of a connect attempt.
        pub fn connects_after(polls: u32) -> Self {
            Self {
                connect_calls: 0,
                connected: Cell::new(false),
                polls_until_up: Some(polls),
                polls_left: Cell::new(0),
                attempt_pending: Cell::new(false),
            }
        }

        /// Never comes up.
        pub fn down() -> Self {
            Self {
                connect_calls: 0,
                connected: Cell::new(false),
                polls_until_up: None,
                polls_left: Cell::new(0),
                attempt_pending: Cell::new(false),
            }
        }
    }

    impl WirelessLink for FakeWireless {
        fn connect(&mut self, _ssid: &str, _password: &str) -> bool {
            self.connect_calls += 1;
            if let Some(polls) = self.polls_until_up {
                self.attempt_pending.set(true);
                self.polls_left.set(polls);
                if polls == 0 {
                    self.connected.set(true);
                }
            }
            true
        }

        fn is_connected(&self) -> bool {
            if !self.connected.get() && self.attempt_pending.get() {
                let left = self.polls_left.get();
                if left == 0 {
                    self.connected.set(true);
                } else {
                    self.polls_left.set(left - 1);
                }
            }
            self.connected.get()
        }

        fn signal_strength(&self) -> i32 {
            -55
        }

        fn local_address(&self) -> String {
            "10.0.0.7".to_string()
        }
    }
}

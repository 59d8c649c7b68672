use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::warn;

use cluster_node_common::wireless::WirelessLink;

/// Station-mode link on the ESP32 radio.
///
/// `connect` only kicks off the association; the core polls `is_connected`
/// for the outcome, so the blocking helpers of `BlockingWifi` are not used
/// here.
pub struct EspWireless {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl EspWireless {
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self { wifi }
    }
}

impl WirelessLink for EspWireless {
    fn connect(&mut self, ssid: &str, password: &str) -> bool {
        let ssid = match ssid.try_into() {
            Ok(ssid) => ssid,
            Err(_) => {
                warn!("wifi ssid too long");
                return false;
            }
        };
        let password = match password.try_into() {
            Ok(password) => password,
            Err(_) => {
                warn!("wifi password too long");
                return false;
            }
        };

        let configuration = Configuration::Client(ClientConfiguration {
            ssid,
            password,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });

        if let Err(e) = self.wifi.set_configuration(&configuration) {
            warn!("wifi set_configuration failed: {e}");
            return false;
        }

        if !self.wifi.is_started().unwrap_or(false) {
            if let Err(e) = self.wifi.start() {
                warn!("wifi start failed: {e}");
                return false;
            }
        }

        match self.wifi.wifi_mut().connect() {
            Ok(()) => true,
            Err(e) => {
                warn!("wifi connect failed: {e}");
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn signal_strength(&self) -> i32 {
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        let rc = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        if rc == esp_idf_svc::sys::ESP_OK {
            ap_info.rssi as i32
        } else {
            0
        }
    }

    fn local_address(&self) -> String {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map(|info| info.ip.to_string())
            .unwrap_or_else(|_| "0.0.0.0".to_string())
    }
}

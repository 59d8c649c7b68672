use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use log::info;

use cluster_node_common::{Node, NodeConfig};

mod dht22;
mod mqtt;
mod platform;
mod wifi;

use dht22::Dht22;
use mqtt::EspMessaging;
use platform::EspPlatform;
use wifi::EspWireless;

/// GPIO the DHT22 data line is wired to.
const DHT_PIN: i32 = 4;

fn main() -> anyhow::Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    EspLogger::initialize_default();

    let config = NodeConfig::default();
    info!("console running at {} baud", config.serial_baud);

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs))?,
        sys_loop,
    )?;

    let wireless = EspWireless::new(wifi);
    let messaging = EspMessaging::new(&config);
    let sensor = Dht22::new(DHT_PIN);

    let mut node = Node::new(config, EspPlatform::new(), wireless, messaging, sensor);

    node.run()
}

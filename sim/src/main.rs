use cluster_node_common::messaging::LoggerMessaging;
use cluster_node_common::platform::HostPlatform;
use cluster_node_common::sensor::DummySensor;
use cluster_node_common::wireless::DummyWireless;
use cluster_node_common::{Node, NodeConfig};

/// Our App struct that holds the simulated node.
///
/// The node runs the same cooperative loop as the device build; the drivers
/// are the in-crate dummies, so published messages show up in the log
/// instead of on a broker. The scripted sensor occasionally produces an
/// implausible reading, which exercises the retry path.
struct App {
    node: Node<HostPlatform, DummyWireless, LoggerMessaging, DummySensor>,
}

impl App {
    /// Create a new App struct.
    ///
    /// Uses an accelerated sampling interval so the console shows a publish
    /// every few seconds instead of every minute.
    fn new() -> anyhow::Result<Self> {
        let config = NodeConfig {
            sample_interval_ms: 5_000,
            ..NodeConfig::default()
        };

        let node = Node::new(
            config,
            HostPlatform::new(),
            DummyWireless::new(),
            LoggerMessaging::new(),
            DummySensor::new()?,
        );

        Ok(Self { node })
    }

    /// Run the node loop; it never returns.
    fn run(&mut self) -> anyhow::Result<()> {
        self.node.run()
    }
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = App::new()?;

    app.run()
}

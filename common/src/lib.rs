//! Core logic for a cluster sensor node: connectivity management, sensor
//! sampling, telemetry publishing and the cooperative loop that drives them.
//!
//! Everything hardware-specific sits behind the traits in [`platform`],
//! [`wireless`], [`messaging`] and [`sensor`], so the same loop runs on the
//! device, in the host simulator and under `cargo test`.

pub mod config;
pub mod connectivity;
pub mod messaging;
pub mod node;
pub mod platform;
pub mod sensor;
pub mod status;
pub mod telemetry;
pub mod wireless;

pub use config::NodeConfig;
pub use node::Node;
pub use sensor::SensorReading;
pub use status::SystemStatus;

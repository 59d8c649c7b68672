//! Sensor sampling: driver seam, validity filtering and bounded retry.

use log::{debug, warn};
use serde::Deserialize;

use crate::platform::Platform;

/// Delay between failed read attempts within one sampling cycle.
const RETRY_DELAY_MS: u64 = 1_000;

/// Physical sensor driver. Reads return NaN on transient failure.
pub trait SensorDriver {
    fn read_humidity(&mut self) -> f32;
    fn read_temperature(&mut self) -> f32;
}

/// One sampling result, superseded by the next. `valid == false` means every
/// attempt failed and the numeric fields carry no meaning.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorReading {
    pub temperature: f32,
    pub humidity: f32,
    pub sampled_at_ms: u64,
    pub valid: bool,
}

/// Sanity bound applied to both measured values.
///
/// The same (−100, 200) window is used for humidity on purpose: the fleet
/// has always filtered both channels through one bound, and narrowing it
/// would change which readings get published.
pub fn is_plausible(value: f32) -> bool {
    !value.is_nan() && value > -100.0 && value < 200.0
}

/// Samples the physical sensor with bounded retry.
pub struct SensorReader {
    retry_count: u32,
}

impl SensorReader {
    pub fn new(retry_count: u32) -> Self {
        Self { retry_count }
    }

    /// Make up to the configured number of physical reads and return the
    /// first reading whose values both pass the plausibility filter.
    ///
    /// Blocks for a fixed delay after each failed attempt; acquisition is
    /// the only pending work while the loop is in a sampling cycle.
    pub fn sample<S, P>(&self, sensor: &mut S, platform: &mut P) -> SensorReading
    where
        S: SensorDriver,
        P: Platform,
    {
        for attempt in 1..=self.retry_count {
            let humidity = sensor.read_humidity();
            let temperature = sensor.read_temperature();

            if is_plausible(humidity) && is_plausible(temperature) {
                debug!("sensor ok: temp={temperature:.2}C humidity={humidity:.2}%");
                return SensorReading {
                    temperature,
                    humidity,
                    sampled_at_ms: platform.uptime_ms(),
                    valid: true,
                };
            }

            warn!("sensor read attempt {attempt}/{} failed", self.retry_count);
            platform.delay_ms(RETRY_DELAY_MS);
        }

        warn!("no valid reading after {} attempts", self.retry_count);
        SensorReading::default()
    }
}

/// Scripted sensor for the host simulator, cycling through readings loaded
/// from an embedded JSON document.
#[derive(Deserialize)]
pub struct DummySensor {
    readings: Vec<DummyReading>,
    #[serde(skip)]
    cursor: usize,
}

#[derive(Deserialize, Clone, Copy)]
struct DummyReading {
    temperature: f32,
    humidity: f32,
}

impl DummySensor {
    pub fn new() -> Result<Self, serde_json::Error> {
        let json_data = std::include_str!("./dummysensor.json");

        serde_json::from_str::<Self>(json_data)
    }

    fn current(&self) -> Option<DummyReading> {
        if self.readings.is_empty() {
            return None;
        }
        Some(self.readings[self.cursor % self.readings.len()])
    }
}

impl SensorDriver for DummySensor {
    fn read_humidity(&mut self) -> f32 {
        self.current().map(|r| r.humidity).unwrap_or(f32::NAN)
    }

    fn read_temperature(&mut self) -> f32 {
        // Temperature is read last within a sampling attempt, so the script
        // advances here.
        let value = self.current().map(|r| r.temperature).unwrap_or(f32::NAN);
        self.cursor += 1;
        value
    }
}

#[test]
fn test_dummy_sensor() {
    let mut sensor = DummySensor::new().unwrap();
    let humidity = sensor.read_humidity();
    let temperature = sensor.read_temperature();

    assert!(is_plausible(humidity));
    assert!(is_plausible(temperature));
}

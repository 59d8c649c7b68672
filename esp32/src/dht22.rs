//! Bit-bang driver for the DHT22 temperature/humidity sensor.

use log::debug;

use cluster_node_common::sensor::SensorDriver;

/// Minimum spacing between protocol transactions. The sensor needs time to
/// settle, so the two channels of one sampling attempt share a single read.
const READ_CACHE_MS: u64 = 2_000;

pub struct Dht22 {
    pin: i32,
    last: Option<CachedReading>,
}

struct CachedReading {
    temperature: f32,
    humidity: f32,
    at_ms: u64,
}

#[derive(Debug)]
pub enum Dht22Error {
    Checksum,
    Timeout,
}

impl Dht22 {
    const DATA_BYTES: usize = 5;

    pub fn new(pin: i32) -> Self {
        Self { pin, last: None }
    }

    fn now_ms() -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u64
    }

    /// Busy-wait until the data line leaves `level`, returning the time
    /// spent in microseconds, or a timeout after `max_wait`.
    fn wait_level(&self, max_wait: i32, level: i32) -> Result<i32, Dht22Error> {
        use esp_idf_svc::sys::*;

        let mut waited = 0;
        unsafe {
            while gpio_get_level(self.pin) == level {
                waited += 1;
                if waited > max_wait {
                    return Err(Dht22Error::Timeout);
                }
                ets_delay_us(1);
            }
        }

        Ok(waited)
    }

    /// One full protocol transaction: wake pulse, handshake, 40 data bits.
    fn transact(&self) -> Result<(f32, f32), Dht22Error> {
        use esp_idf_svc::sys::*;

        let mut data = [0u8; Self::DATA_BYTES];

        unsafe {
            gpio_set_direction(self.pin, GPIO_MODE_DEF_OUTPUT);

            // Hold the line low to wake the sensor, then release it briefly.
            gpio_set_level(self.pin, 0);
            ets_delay_us(3000);
            gpio_set_level(self.pin, 1);
            ets_delay_us(25);

            gpio_set_direction(self.pin, GPIO_MODE_DEF_INPUT);
        }

        // The sensor answers with 80 us low, then 80 us high.
        self.wait_level(85, 0)?;
        self.wait_level(85, 1)?;

        let mut byte = 0;
        let mut bit = 7u8;
        for _ in 0..40 {
            // Each bit starts with >50 us low; the high time encodes 0 or 1.
            self.wait_level(56, 0)?;
            let high = self.wait_level(75, 1)?;

            if high > 40 {
                data[byte] |= 1 << bit;
            }

            if bit == 0 {
                bit = 7;
                byte += 1;
            } else {
                bit -= 1;
            }
        }

        let humidity = (((data[0] as u16) << 8) | data[1] as u16) as f32 / 10.0;

        let raw_temp = (((data[2] & 0x7f) as u16) << 8) | data[3] as u16;
        let mut temperature = raw_temp as f32 / 10.0;
        if data[2] & 0x80 != 0 {
            temperature = -temperature;
        }

        let checksum = data[0]
            .wrapping_add(data[1])
            .wrapping_add(data[2])
            .wrapping_add(data[3]);
        if checksum == data[4] {
            Ok((temperature, humidity))
        } else {
            Err(Dht22Error::Checksum)
        }
    }

    /// Return the measured pair, reusing the last transaction while it is
    /// still within the cache window; the DHT22 cannot be queried back to
    /// back.
    fn read_pair(&mut self) -> Result<(f32, f32), Dht22Error> {
        let now = Self::now_ms();
        if let Some(last) = &self.last {
            if now - last.at_ms < READ_CACHE_MS {
                return Ok((last.temperature, last.humidity));
            }
        }

        let (temperature, humidity) = self.transact()?;
        self.last = Some(CachedReading {
            temperature,
            humidity,
            at_ms: now,
        });

        Ok((temperature, humidity))
    }
}

impl SensorDriver for Dht22 {
    fn read_humidity(&mut self) -> f32 {
        match self.read_pair() {
            Ok((_, humidity)) => humidity,
            Err(e) => {
                debug!("dht22 humidity read failed: {e:?}");
                f32::NAN
            }
        }
    }

    fn read_temperature(&mut self) -> f32 {
        match self.read_pair() {
            Ok((temperature, _)) => temperature,
            Err(e) => {
                debug!("dht22 temperature read failed: {e:?}");
                f32::NAN
            }
        }
    }
}

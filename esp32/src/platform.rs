use cluster_node_common::platform::Platform;

use esp_idf_svc::hal::delay::FreeRtos;

/// ESP-IDF timer and heap services behind the core's platform seam.
pub struct EspPlatform;

impl EspPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for EspPlatform {
    fn uptime_ms(&self) -> u64 {
        // esp_timer counts microseconds since boot.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u64
    }

    fn delay_ms(&mut self, ms: u64) {
        FreeRtos::delay_ms(ms as u32);
    }

    fn free_heap(&self) -> u32 {
        unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
    }
}

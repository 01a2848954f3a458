// Tiga Watch — ESP32-S3 board drivers

pub mod display;
pub mod imu;
pub mod pulse;
pub mod radio;

use tiga::hal::Clock;

/// Milliseconds since boot from the high-resolution ESP timer.
pub struct EspClock;

impl Clock for EspClock {
    fn now_ms(&self) -> u64 {
        unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u64 }
    }
}

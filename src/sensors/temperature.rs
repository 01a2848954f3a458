// Tiga Watch — Temperature Filter
//
// Converts MPU6050 die-temperature counts to °C and keeps the last reading
// that falls inside the plausible skin-temperature band.

use crate::config::*;

#[derive(Debug, Clone)]
pub struct TemperatureFilter {
    last_valid_c: f32,
    last_read_ms: u64,
}

impl TemperatureFilter {
    pub fn new() -> Self {
        Self {
            last_valid_c: DEFAULT_TEMP_C,
            last_read_ms: 0,
        }
    }

    /// Whether enough time has passed for a fresh hardware read.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_read_ms) >= TEMP_READ_INTERVAL_MS
    }

    /// Feed a read attempt (`None` when the read failed).
    pub fn update(&mut self, now_ms: u64, raw: Option<i16>) -> f32 {
        self.last_read_ms = now_ms;
        if let Some(raw) = raw {
            let celsius = to_celsius(raw);
            if (TEMP_MIN_C..=TEMP_MAX_C).contains(&celsius) {
                self.last_valid_c = celsius;
            } else {
                log::debug!("Temperature {:.1} °C out of range, keeping {:.1}", celsius, self.last_valid_c);
            }
        }
        self.last_valid_c
    }

    pub fn celsius(&self) -> f32 {
        self.last_valid_c
    }
}

impl Default for TemperatureFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// MPU6050 datasheet conversion.
pub fn to_celsius(raw: i16) -> f32 {
    f32::from(raw) / TEMP_LSB_PER_DEG + TEMP_OFFSET_C
}

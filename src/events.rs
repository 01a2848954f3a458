// Tiga Watch — System Events & Data Types

use crate::config::{DEFAULT_BPM, DEFAULT_TEMP_C};

// ---------------------------------------------------------------------------
// IMU health
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorHealth {
    /// Connected and returning plausible data.
    #[default]
    Ready,
    /// Connected, but every axis reads back as zero.
    ZeroReadings,
    /// Connection test or the most recent read failed; cleared by the next
    /// successful read.
    Unavailable,
}

impl SensorHealth {
    /// Short status line for the presentation layer.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "IMU ok",
            Self::ZeroReadings => "IMU zero data",
            Self::Unavailable => "IMU unavailable",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

// ---------------------------------------------------------------------------
// Sensor Snapshot (recomputed on every control-loop tick)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    pub heart_rate_bpm: f32,
    pub steps: u32,
    pub temperature_c: f32,
    pub is_stable: bool,
    pub fall_detected: bool,
    /// Mean acceleration magnitude over the motion history (raw LSB).
    pub activity_level: f32,
    pub imu_health: SensorHealth,
    /// Confirmed vibration onsets since boot.
    pub vibrations: u32,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            heart_rate_bpm: DEFAULT_BPM,
            steps: 0,
            temperature_c: DEFAULT_TEMP_C,
            is_stable: true,
            fall_detected: false,
            activity_level: 0.0,
            imu_health: SensorHealth::Ready,
            vibrations: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// UI Events: produced by inputs and the radio, drained by the control loop
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Button 1 pressed.
    Scroll,
    /// Button 2 pressed.
    Select,
    /// Touch sensor level changed (`true` = touched).
    GripChanged(bool),
    /// Confirmed vibration onset.
    VibrationDetected,
    /// Raw payload handed over by the radio receive callback.
    MessageReceived(Vec<u8>),
}

// Tiga Watch — Sensor Acquisition
//
// `SensorHub` owns every analog/I2C sensor and folds one poll of each into a
// `SensorSnapshot`.  Nothing here can fail: hardware errors degrade to the
// last known good value (pulse, temperature) or to zero samples (motion),
// with the IMU's state reported through `SensorHealth`.

pub mod motion;
pub mod pulse;
pub mod temperature;

use embedded_hal::delay::DelayNs;

use crate::events::{SensorHealth, SensorSnapshot};
use crate::hal::{AnalogInput, InertialSensor};

use self::motion::InertialAggregator;
use self::pulse::PulseDetector;

pub struct SensorHub<S, A> {
    motion: InertialAggregator<S>,
    pulse: PulseDetector<A>,
    snapshot: SensorSnapshot,
}

impl<S: InertialSensor, A: AnalogInput> SensorHub<S, A> {
    pub fn new(imu: S, pulse: A, now_ms: u64) -> Self {
        log::info!("Initializing sensors...");
        let mut motion = InertialAggregator::new(imu);
        let health = motion.probe();
        log::info!("All sensors initialized (IMU: {:?})", health);

        Self {
            motion,
            pulse: PulseDetector::new(pulse, now_ms),
            snapshot: SensorSnapshot {
                imu_health: health,
                ..SensorSnapshot::default()
            },
        }
    }

    /// One acquisition pass over every sensor.
    pub fn poll<D: DelayNs>(&mut self, now_ms: u64, delay: &mut D) -> SensorSnapshot {
        let heart_rate_bpm = self.pulse.poll(now_ms);
        let steps = self.motion.poll_steps(now_ms);
        let fall_detected = self.motion.poll_fall(now_ms, delay);
        let is_stable = self.motion.poll_stability();
        let activity_level = self.motion.poll_activity();
        let temperature_c = self.motion.poll_temperature(now_ms);

        self.snapshot = SensorSnapshot {
            heart_rate_bpm,
            steps,
            temperature_c,
            is_stable,
            fall_detected,
            activity_level,
            imu_health: self.motion.health(),
            vibrations: self.snapshot.vibrations,
        };
        self.snapshot
    }

    /// Count one confirmed vibration onset from the digital inputs.
    pub fn record_vibration(&mut self) {
        self.snapshot.vibrations = self.snapshot.vibrations.saturating_add(1);
    }

    /// Most recent snapshot, without touching the hardware.
    pub fn snapshot(&self) -> SensorSnapshot {
        self.snapshot
    }

    pub fn reset_steps(&mut self) {
        self.motion.reset_steps();
        self.snapshot.steps = 0;
    }

    pub fn imu_health(&self) -> SensorHealth {
        self.motion.health()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BPM;
    use crate::sim::{SimClock, SimDelay, SimImu, SimPulse};

    #[test]
    fn snapshot_reflects_all_sensors() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock.clone());
        let imu = SimImu::scripted([[0, 0, 4096]]);
        let pulse = SimPulse::scripted([0]);
        let mut hub = SensorHub::new(imu.clone(), pulse, 0);

        imu.set_temperature(160);
        let snap = hub.poll(1000, &mut delay);
        assert_eq!(snap.heart_rate_bpm, DEFAULT_BPM);
        assert_eq!(snap.steps, 0);
        assert!(snap.is_stable);
        assert!(!snap.fall_detected);
        assert!((snap.temperature_c - 37.0).abs() < 0.01);
        assert!((snap.activity_level - 4096.0 / 50.0).abs() < 0.01);
        assert_eq!(snap.imu_health, SensorHealth::Ready);
        assert_eq!(hub.snapshot(), snap);
    }

    #[test]
    fn disconnected_imu_is_surfaced_but_polling_continues() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock);
        let mut hub = SensorHub::new(SimImu::disconnected(), SimPulse::scripted([0]), 0);

        assert_eq!(hub.imu_health(), SensorHealth::Unavailable);
        let snap = hub.poll(500, &mut delay);
        assert_eq!(snap.imu_health, SensorHealth::Unavailable);
        assert_eq!(snap.heart_rate_bpm, DEFAULT_BPM);
    }

    #[test]
    fn reset_steps_clears_snapshot_count() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock);
        let imu = SimImu::scripted([[0, 0, 4096], [6000, 6000, 13000]]);
        let mut hub = SensorHub::new(imu, SimPulse::scripted([0]), 0);

        assert_eq!(hub.poll(400, &mut delay).steps, 1);
        hub.reset_steps();
        assert_eq!(hub.snapshot().steps, 0);
    }

    #[test]
    fn vibration_count_survives_polls() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock);
        let mut hub = SensorHub::new(SimImu::scripted([[0, 0, 4096]]), SimPulse::scripted([0]), 0);

        hub.record_vibration();
        hub.record_vibration();
        assert_eq!(hub.poll(100, &mut delay).vibrations, 2);
        assert_eq!(hub.poll(200, &mut delay).vibrations, 2);
    }
}

// Tiga Watch — Inertial Sample Aggregator
//
// Owns the IMU and a 50-sample acceleration history.  Step counting,
// fall detection, activity level and stability are derived from raw
// accelerometer counts; the thresholds in `config.rs` assume ±8 g range.

use embedded_hal::delay::DelayNs;

use crate::config::*;
use crate::events::SensorHealth;
use crate::hal::InertialSensor;
use crate::ring::SampleRing;
use crate::sensors::temperature::TemperatureFilter;

// ---------------------------------------------------------------------------
// Acceleration sample
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccelSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl AccelSample {
    pub fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm in raw counts.  Squares are widened first; three
    /// full-scale axes overflow 32-bit integers.
    pub fn magnitude(&self) -> f32 {
        let sq = |v: i16| {
            let v = i64::from(v);
            v * v
        };
        ((sq(self.x) + sq(self.y) + sq(self.z)) as f64).sqrt() as f32
    }
}

impl From<[i16; 3]> for AccelSample {
    fn from([x, y, z]: [i16; 3]) -> Self {
        Self { x, y, z }
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------
pub struct InertialAggregator<S> {
    sensor: S,
    history: SampleRing<AccelSample, MOTION_HISTORY_LEN>,
    health: SensorHealth,

    steps: u32,
    last_step_ms: u64,

    fall_detected: bool,
    last_fall_check_ms: u64,

    temperature: TemperatureFilter,
}

impl<S: InertialSensor> InertialAggregator<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor,
            history: SampleRing::new(),
            health: SensorHealth::Ready,
            steps: 0,
            last_step_ms: 0,
            fall_detected: false,
            last_fall_check_ms: 0,
            temperature: TemperatureFilter::new(),
        }
    }

    /// Start-up connection test.  The firmware keeps running either way;
    /// the outcome is only surfaced through [`Self::health`].
    pub fn probe(&mut self) -> SensorHealth {
        self.health = if !self.sensor.is_connected() {
            log::error!("MPU6050 connection failed!");
            SensorHealth::Unavailable
        } else {
            match self.sensor.read_raw_acceleration() {
                Ok([0, 0, 0]) => {
                    log::warn!("MPU6050 connected but readings are zero");
                    SensorHealth::ZeroReadings
                }
                Ok(_) => {
                    log::info!("MPU6050 connected successfully");
                    SensorHealth::Ready
                }
                Err(e) => {
                    log::error!("MPU6050 probe read failed: {}", e);
                    SensorHealth::Unavailable
                }
            }
        };
        self.health
    }

    /// Probe result, then updated by every read.
    pub fn health(&self) -> SensorHealth {
        self.health
    }

    /// Read one sample; a failed read yields an all-zero sample.
    fn sample(&mut self) -> AccelSample {
        match self.sensor.read_raw_acceleration() {
            Ok([0, 0, 0]) => {
                if self.health == SensorHealth::Unavailable {
                    log::warn!("IMU responding again, readings are zero");
                    self.health = SensorHealth::ZeroReadings;
                }
                AccelSample::default()
            }
            Ok(raw) => {
                if self.health != SensorHealth::Ready {
                    log::info!("IMU readings recovered");
                    self.health = SensorHealth::Ready;
                }
                AccelSample::from(raw)
            }
            Err(e) => {
                if self.health != SensorHealth::Unavailable {
                    log::warn!("IMU read error: {}", e);
                    self.health = SensorHealth::Unavailable;
                }
                AccelSample::default()
            }
        }
    }

    // ---- steps ------------------------------------------------------------

    /// Record the latest sample and return the cumulative step count.
    pub fn poll_steps(&mut self, now_ms: u64) -> u32 {
        let sample = self.sample();
        self.history.push(sample);

        if sample.magnitude() > STEP_THRESHOLD
            && now_ms.saturating_sub(self.last_step_ms) >= MIN_STEP_INTERVAL_MS
        {
            self.steps = self.steps.saturating_add(1);
            self.last_step_ms = now_ms;
        }
        self.steps
    }

    pub fn reset_steps(&mut self) {
        log::info!("Step counter reset ({} steps)", self.steps);
        self.steps = 0;
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    // ---- fall -------------------------------------------------------------

    /// Impact-then-stillness fall check, run at most every
    /// [`FALL_CHECK_INTERVAL_MS`]; calls inside the window return the cached
    /// result.  An impact blocks for [`FALL_CONFIRM_DELAY_MS`] before the
    /// confirmation sample.
    pub fn poll_fall<D: DelayNs>(&mut self, now_ms: u64, delay: &mut D) -> bool {
        if now_ms.saturating_sub(self.last_fall_check_ms) < FALL_CHECK_INTERVAL_MS {
            return self.fall_detected;
        }
        self.last_fall_check_ms = now_ms;

        self.fall_detected = false;
        let impact = self.sample().magnitude();
        if impact > FALL_THRESHOLD {
            delay.delay_ms(FALL_CONFIRM_DELAY_MS);
            let after = self.sample().magnitude();
            if after < STABLE_THRESHOLD {
                log::warn!("Fall detected (impact {:.0}, after {:.0})", impact, after);
                self.fall_detected = true;
            }
        }
        self.fall_detected
    }

    // ---- activity & stability ---------------------------------------------

    /// Mean magnitude over the whole history window, including never-written
    /// (zero) slots.
    pub fn poll_activity(&self) -> f32 {
        let sum: f32 = self.history.slots().iter().map(AccelSample::magnitude).sum();
        sum / self.history.capacity() as f32
    }

    /// Instantaneous stillness check on a fresh sample.
    pub fn poll_stability(&mut self) -> bool {
        self.sample().magnitude() < STABLE_THRESHOLD
    }

    // ---- temperature ------------------------------------------------------

    /// Die temperature in °C, re-read at most once per
    /// [`TEMP_READ_INTERVAL_MS`].
    pub fn poll_temperature(&mut self, now_ms: u64) -> f32 {
        if self.temperature.is_due(now_ms) {
            let raw = match self.sensor.read_raw_temperature() {
                Ok(raw) => Some(raw),
                Err(e) => {
                    log::warn!("IMU temperature read error: {}", e);
                    None
                }
            };
            self.temperature.update(now_ms, raw);
        }
        self.temperature.celsius()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimDelay, SimImu};

    const STILL: [i16; 3] = [0, 0, 4096]; // 1 g on Z
    const STEP: [i16; 3] = [6000, 6000, 13000]; // ~15.5k
    const IMPACT: [i16; 3] = [20000, 15000, 10000]; // ~26.9k
    const FREEFALL: [i16; 3] = [100, 200, 300];

    fn delay() -> SimDelay {
        SimDelay::new(SimClock::new())
    }

    #[test]
    fn magnitude_does_not_overflow_at_full_scale() {
        let s = AccelSample::new(i16::MIN, i16::MIN, i16::MIN);
        let expected = (3.0f64 * 32768.0 * 32768.0).sqrt() as f32;
        assert!((s.magnitude() - expected).abs() < 1.0);
        assert_eq!(AccelSample::from([3, 4, 0]).magnitude(), 5.0);
    }

    #[test]
    fn steps_are_debounced_by_minimum_interval() {
        let imu = SimImu::scripted([STEP, STEP, STILL, STEP, STEP]);
        let mut motion = InertialAggregator::new(imu);

        assert_eq!(motion.poll_steps(300), 1);
        assert_eq!(motion.poll_steps(400), 1); // too soon
        assert_eq!(motion.poll_steps(700), 1); // below threshold
        assert_eq!(motion.poll_steps(800), 2);
        assert_eq!(motion.poll_steps(1099), 2);
    }

    #[test]
    fn no_step_before_first_interval_elapses() {
        let imu = SimImu::scripted([STEP]);
        let mut motion = InertialAggregator::new(imu);
        assert_eq!(motion.poll_steps(100), 0);
    }

    #[test]
    fn reset_then_still_poll_returns_zero() {
        let imu = SimImu::scripted([STEP, STEP, STEP]);
        let mut motion = InertialAggregator::new(imu.clone());
        motion.poll_steps(300);
        motion.poll_steps(700);
        motion.poll_steps(1100);
        assert_eq!(motion.steps(), 3);

        motion.reset_steps();
        imu.push(STILL);
        assert_eq!(motion.poll_steps(1500), 0);
    }

    #[test]
    fn impact_followed_by_stillness_is_a_fall() {
        let imu = SimImu::scripted([STILL, IMPACT, FREEFALL]);
        let mut motion = InertialAggregator::new(imu);
        let mut d = delay();

        assert!(!motion.poll_fall(100, &mut d));
        assert!(motion.poll_fall(150, &mut d));
        // Inside the check window the cached result is returned.
        assert!(motion.poll_fall(170, &mut d));
    }

    #[test]
    fn impact_without_stillness_is_not_a_fall() {
        let imu = SimImu::scripted([STILL, IMPACT, IMPACT]);
        let mut motion = InertialAggregator::new(imu);
        let mut d = delay();

        assert!(!motion.poll_fall(100, &mut d));
        assert!(!motion.poll_fall(150, &mut d));
    }

    #[test]
    fn fall_confirmation_blocks_for_confirm_delay() {
        let clock = SimClock::new();
        let mut d = SimDelay::new(clock.clone());
        let imu = SimImu::scripted([IMPACT, FREEFALL]);
        let mut motion = InertialAggregator::new(imu);

        assert!(motion.poll_fall(50, &mut d));
        assert_eq!(clock.now(), u64::from(FALL_CONFIRM_DELAY_MS));
    }

    #[test]
    fn activity_is_mean_over_full_window() {
        let imu = SimImu::scripted([]);
        let mut motion = InertialAggregator::new(imu.clone());
        assert_eq!(motion.poll_activity(), 0.0);

        // 10 samples of magnitude 5000 in a 50-slot zeroed window.
        for i in 0..10 {
            imu.push([3000, 4000, 0]);
            motion.poll_steps(i * 10);
        }
        assert!((motion.poll_activity() - 1000.0).abs() < 0.01);

        for i in 10..200 {
            imu.push([0, 3000, 4000]);
            motion.poll_steps(i * 10);
        }
        assert!((motion.poll_activity() - 5000.0).abs() < 0.01);
    }

    #[test]
    fn stability_uses_fresh_sample() {
        let imu = SimImu::scripted([STILL, IMPACT]);
        let mut motion = InertialAggregator::new(imu);
        assert!(motion.poll_stability());
        assert!(!motion.poll_stability());
    }

    #[test]
    fn replaying_samples_is_deterministic() {
        let trace: Vec<[i16; 3]> = (0..400)
            .map(|i: i32| {
                let phase = (i % 40) as f32 / 40.0 * std::f32::consts::TAU;
                let z = 4096.0 + 12000.0 * phase.sin();
                [(i * 37 % 2000) as i16, 1500, z as i16]
            })
            .collect();

        let run = || {
            let mut motion = InertialAggregator::new(SimImu::scripted(trace.clone()));
            let mut steps = 0;
            for i in 0..trace.len() as u64 {
                steps = motion.poll_steps(i * 20);
            }
            (steps, motion.poll_activity())
        };

        let first = run();
        let second = run();
        assert!(first.0 > 0);
        assert_eq!(first, second);
    }

    #[test]
    fn probe_reports_health() {
        let mut motion = InertialAggregator::new(SimImu::disconnected());
        assert_eq!(motion.probe(), SensorHealth::Unavailable);

        let mut motion = InertialAggregator::new(SimImu::scripted([[0, 0, 0]]));
        assert_eq!(motion.probe(), SensorHealth::ZeroReadings);

        let mut motion = InertialAggregator::new(SimImu::scripted([STILL]));
        assert_eq!(motion.probe(), SensorHealth::Ready);
    }

    #[test]
    fn read_failure_yields_zero_sample_and_unavailable_health() {
        let imu = SimImu::scripted([STILL]);
        let mut motion = InertialAggregator::new(imu.clone());
        assert_eq!(motion.probe(), SensorHealth::Ready);

        imu.set_failing(true);
        assert!(motion.poll_stability());
        assert_eq!(motion.health(), SensorHealth::Unavailable);

        imu.set_failing(false);
        imu.push(STILL);
        motion.poll_steps(1000);
        assert_eq!(motion.health(), SensorHealth::Ready);
    }

    #[test]
    fn failed_probe_clears_once_reads_succeed() {
        let imu = SimImu::disconnected();
        let mut motion = InertialAggregator::new(imu.clone());
        assert_eq!(motion.probe(), SensorHealth::Unavailable);

        imu.set_failing(false);
        imu.push(STILL);
        motion.poll_steps(100);
        assert_eq!(motion.health(), SensorHealth::Ready);
    }

    #[test]
    fn zero_readings_clear_on_first_real_sample() {
        let imu = SimImu::scripted([[0, 0, 0]]);
        let mut motion = InertialAggregator::new(imu.clone());
        assert_eq!(motion.probe(), SensorHealth::ZeroReadings);

        motion.poll_steps(100);
        assert_eq!(motion.health(), SensorHealth::ZeroReadings);

        imu.push(STILL);
        motion.poll_steps(200);
        assert_eq!(motion.health(), SensorHealth::Ready);
    }

    #[test]
    fn temperature_is_rate_limited_and_validated() {
        let imu = SimImu::scripted([]);
        let mut motion = InertialAggregator::new(imu.clone());

        // (37.0 - 36.53) * 340 ≈ 160
        imu.set_temperature(160);
        assert_eq!(motion.poll_temperature(500), DEFAULT_TEMP_C);
        let t = motion.poll_temperature(1000);
        assert!((t - 37.0).abs() < 0.01);

        // Out of range (~50 °C) is ignored.
        imu.set_temperature(4580);
        assert!((motion.poll_temperature(2000) - t).abs() < f32::EPSILON);
    }
}

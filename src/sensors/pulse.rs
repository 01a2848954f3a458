// Tiga Watch — Analog Pulse Detector
//
// Threshold-crossing beat detector over a short rolling window of raw ADC
// samples.  The returned heart rate is always the last *validated* value;
// implausible beats are discarded without a trace.

use crate::config::*;
use crate::hal::AnalogInput;
use crate::ring::SampleRing;

pub struct PulseDetector<A> {
    input: A,
    samples: SampleRing<f32, PULSE_SAMPLES>,
    last_beat_ms: u64,
    last_valid_bpm: f32,
    beats: u32,
}

impl<A: AnalogInput> PulseDetector<A> {
    /// `start_ms` is the reference the first beat interval is measured from.
    ///
    /// The sample window starts zero-filled, so for the first
    /// [`PULSE_SAMPLES`] polls the threshold sits barely above zero and any
    /// reading can register as a beat (still subject to the minimum gap).
    pub fn new(input: A, start_ms: u64) -> Self {
        Self {
            input,
            samples: SampleRing::new(),
            last_beat_ms: start_ms,
            last_valid_bpm: DEFAULT_BPM,
            beats: 0,
        }
    }

    /// Take one sample and return the current heart rate in BPM.
    pub fn poll(&mut self, now_ms: u64) -> f32 {
        match self.input.read_analog() {
            Ok(raw) => self.process(now_ms, f32::from(raw)),
            Err(e) => log::warn!("Pulse ADC read failed: {}", e),
        }
        self.last_valid_bpm
    }

    fn process(&mut self, now_ms: u64, raw: f32) {
        self.samples.push(raw);
        let threshold = self.mean() + PULSE_THRESHOLD_OFFSET;

        let since_beat = now_ms.saturating_sub(self.last_beat_ms);
        if raw > threshold && since_beat >= MIN_BEAT_INTERVAL_MS {
            self.beats = self.beats.wrapping_add(1);
            let bpm = 60_000.0 / since_beat as f32;
            if (MIN_BPM..=MAX_BPM).contains(&bpm) {
                self.last_valid_bpm = bpm;
            } else {
                log::debug!("Discarding implausible beat: {:.1} BPM", bpm);
            }
            self.last_beat_ms = now_ms;
        }

        // A long silence would otherwise turn the next beat into one bogus
        // low reading.
        if now_ms.saturating_sub(self.last_beat_ms) > PULSE_TIMEOUT_MS {
            self.beats = 0;
            self.last_beat_ms = now_ms;
        }
    }

    fn mean(&self) -> f32 {
        self.samples.slots().iter().sum::<f32>() / self.samples.capacity() as f32
    }

    pub fn bpm(&self) -> f32 {
        self.last_valid_bpm
    }

    /// Beats seen since start-up or the last timeout, valid or not.
    pub fn beat_count(&self) -> u32 {
        self.beats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPulse;

    /// Square pulse: `high` for one 10 ms sample every `period_ms`, else `low`.
    fn spikes(period_ms: u64, until_ms: u64, low: u16, high: u16) -> Vec<(u64, u16)> {
        (0..until_ms)
            .step_by(10)
            .map(|t| (t, if t > 0 && t % period_ms == 0 { high } else { low }))
            .collect()
    }

    fn run(detector: &mut PulseDetector<SimPulse>, source: &SimPulse, trace: &[(u64, u16)]) -> f32 {
        let mut bpm = detector.bpm();
        for &(t, v) in trace {
            source.push(v);
            bpm = detector.poll(t);
        }
        bpm
    }

    #[test]
    fn starts_at_default_rate() {
        let source = SimPulse::scripted([]);
        let mut detector = PulseDetector::new(source, 0);
        assert_eq!(detector.poll(0), DEFAULT_BPM);
    }

    #[test]
    fn cold_start_spike_respects_minimum_gap() {
        let source = SimPulse::scripted([]);
        let mut detector = PulseDetector::new(source.clone(), 0);

        // Zero-filled window, threshold ~100: a spike of 500 at t = 0 is
        // above threshold but too soon after the start reference.
        source.push(500);
        detector.poll(0);
        assert_eq!(detector.beat_count(), 0);

        source.push(500);
        assert_eq!(detector.poll(400), 150.0);
        assert_eq!(detector.beat_count(), 1);

        // Second spike inside 300 ms must not register.
        source.push(500);
        detector.poll(500);
        assert_eq!(detector.beat_count(), 1);
        assert_eq!(detector.bpm(), 150.0);
    }

    #[test]
    fn converges_to_periodic_signal_rate() {
        for period in [400u64, 600, 800, 1000, 1200] {
            let source = SimPulse::scripted([]);
            let mut detector = PulseDetector::new(source.clone(), 0);
            let trace = spikes(period, period * 6 + 5, 200, 1500);

            let bpm = run(&mut detector, &source, &trace);
            let expected = 60_000.0 / period as f32;
            assert!((bpm - expected).abs() < 0.5, "period {} -> {} BPM", period, bpm);
        }
    }

    #[test]
    fn implausible_rates_do_not_change_reading() {
        let source = SimPulse::scripted([]);
        let mut detector = PulseDetector::new(source.clone(), 0);
        run(&mut detector, &source, &spikes(750, 750 * 5 + 5, 200, 1500));
        assert!((detector.bpm() - 80.0).abs() < 0.5);

        // 1590 ms gap → ~37.7 BPM, below MIN_BPM.
        let slow: Vec<(u64, u16)> = (3760..5350u64)
            .step_by(10)
            .map(|t| (t, if t == 5350 - 10 { 1500 } else { 200 }))
            .collect();
        let beats_before = detector.beat_count();
        run(&mut detector, &source, &slow);
        assert_eq!(detector.beat_count(), beats_before + 1);
        assert!((detector.bpm() - 80.0).abs() < 0.5);
    }

    #[test]
    fn long_silence_resets_beat_reference_without_touching_bpm() {
        let source = SimPulse::scripted([]);
        let mut detector = PulseDetector::new(source.clone(), 0);
        run(&mut detector, &source, &spikes(1000, 3005, 200, 1500));
        let bpm = detector.bpm();
        assert!((bpm - 60.0).abs() < 0.5);

        // Flat line well past the timeout.
        for t in (3010..40_000u64).step_by(10) {
            source.push(200);
            assert_eq!(detector.poll(t), bpm);
        }
        assert_eq!(detector.beat_count(), 0);

        // The reference was reset at ~33 s, so a beat at 40 s measures from
        // there: 60000 / ~7000 ms ≈ 8.6 BPM is rejected, reading unchanged.
        source.push(1500);
        assert_eq!(detector.poll(40_000), bpm);
    }

    #[test]
    fn read_errors_keep_last_value() {
        let source = SimPulse::failing();
        let mut detector = PulseDetector::new(source, 0);
        assert_eq!(detector.poll(1000), DEFAULT_BPM);
        assert_eq!(detector.beat_count(), 0);
    }
}

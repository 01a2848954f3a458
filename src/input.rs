// Tiga Watch — Digital Input Manager
//
// Debounced buttons and touch sensor, plus the confirm-by-re-read vibration
// sensor.  Designed to be polled at ~100 Hz from the control loop; there is
// no timer thread, so the debounce clock only advances when `update` runs.

use std::sync::mpsc::Sender;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::config::*;
use crate::events::UiEvent;

/// Read a pin as "active", honouring its polarity.  `None` on a bus/pin error.
fn read_active<P: InputPin>(pin: &mut P, active_low: bool) -> Option<bool> {
    match pin.is_high() {
        Ok(high) => Some(high != active_low),
        Err(e) => {
            log::warn!("Digital read failed: {:?}", e);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Time-based debounce
// ---------------------------------------------------------------------------

/// Elapsed-time debounce filter.
///
/// A raw reading that differs from the stable value is accepted only when at
/// least `settle_ms` has passed since the previous accepted change, so the
/// observable value flips at most once per settle interval.  Readings that
/// toggle faster than that are not queued: whatever is sampled once the
/// interval has elapsed wins.
pub struct Debouncer<P> {
    pin: P,
    active_low: bool,
    settle_ms: u64,
    stable: bool,
    last_change_ms: u64,
}

impl<P: InputPin> Debouncer<P> {
    /// Push-button wired to ground with a pull-up.
    pub fn active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    /// Sensor that drives its output HIGH when triggered (e.g. TTP223).
    pub fn active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            settle_ms: DEBOUNCE_MS,
            stable: false,
            last_change_ms: 0,
        }
    }

    pub fn with_settle_ms(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Sample the pin and return the debounced "active" state.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let Some(reading) = read_active(&mut self.pin, self.active_low) else {
            return self.stable;
        };

        if reading != self.stable && now_ms.saturating_sub(self.last_change_ms) >= self.settle_ms {
            self.stable = reading;
            self.last_change_ms = now_ms;
        }
        self.stable
    }

    /// Last accepted state, without sampling.
    pub fn is_active(&self) -> bool {
        self.stable
    }
}

// ---------------------------------------------------------------------------
// Vibration sensor (SW-420)
// ---------------------------------------------------------------------------

/// Rate-limited vibration detector.  A changed reading is confirmed by a
/// second read after a short blocking pause; only a confirmed rising edge
/// counts as a detection.
pub struct VibrationSensor<P> {
    pin: P,
    last_state: bool,
    last_check_ms: u64,
}

impl<P: InputPin> VibrationSensor<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            last_state: false,
            last_check_ms: 0,
        }
    }

    /// `true` only on the poll that confirms a new vibration onset.
    pub fn poll<D: DelayNs>(&mut self, now_ms: u64, delay: &mut D) -> bool {
        if now_ms.saturating_sub(self.last_check_ms) < VIBRATION_CHECK_INTERVAL_MS {
            return false;
        }
        self.last_check_ms = now_ms;

        let Some(current) = read_active(&mut self.pin, false) else {
            return false;
        };
        if current == self.last_state {
            return false;
        }

        delay.delay_ms(VIBRATION_CONFIRM_DELAY_MS);
        match read_active(&mut self.pin, false) {
            Some(confirmed) if confirmed == current => {
                self.last_state = current;
                current
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Input manager
// ---------------------------------------------------------------------------

/// Owns every digital input and turns debounced edges into [`UiEvent`]s.
pub struct InputManager<P> {
    scroll: Debouncer<P>,
    select: Debouncer<P>,
    grip: Debouncer<P>,
    vibration: VibrationSensor<P>,
    ui_tx: Sender<UiEvent>,

    scroll_down: bool,
    select_down: bool,
    grip_touched: bool,
}

impl<P: InputPin> InputManager<P> {
    pub fn new(button1: P, button2: P, touch: P, vibration: P, ui_tx: Sender<UiEvent>) -> Self {
        Self {
            scroll: Debouncer::active_low(button1),
            select: Debouncer::active_low(button2),
            grip: Debouncer::active_high(touch),
            vibration: VibrationSensor::new(vibration),
            ui_tx,
            scroll_down: false,
            select_down: false,
            grip_touched: false,
        }
    }

    /// Call every ~10 ms from the control loop.
    pub fn update<D: DelayNs>(&mut self, now_ms: u64, delay: &mut D) {
        // ---- buttons: report press edges only ----
        let scroll = self.scroll.poll(now_ms);
        if scroll && !self.scroll_down {
            let _ = self.ui_tx.send(UiEvent::Scroll);
        }
        self.scroll_down = scroll;

        let select = self.select.poll(now_ms);
        if select && !self.select_down {
            let _ = self.ui_tx.send(UiEvent::Select);
        }
        self.select_down = select;

        // ---- touch: report both edges ----
        let grip = self.grip.poll(now_ms);
        if grip != self.grip_touched {
            let _ = self.ui_tx.send(UiEvent::GripChanged(grip));
        }
        self.grip_touched = grip;

        // ---- vibration ----
        if self.vibration.poll(now_ms, delay) {
            log::debug!("Vibration detected at {} ms", now_ms);
            let _ = self.ui_tx.send(UiEvent::VibrationDetected);
        }
    }

    /// Debounced touch level.
    pub fn grip_touched(&self) -> bool {
        self.grip_touched
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::sim::{SimClock, SimDelay, SimPin};

    #[test]
    fn press_is_accepted_once_settle_interval_has_passed() {
        let level = SimPin::new(true); // released, pull-up
        let mut button = Debouncer::active_low(level.clone());

        assert!(!button.poll(10));
        level.set(false);
        // Still inside the first settle window measured from boot.
        assert!(!button.poll(40));
        assert!(button.poll(60));
    }

    #[test]
    fn bounce_burst_produces_single_transition() {
        let pin = SimPin::new(true);
        let mut button = Debouncer::active_low(pin.clone());
        button.poll(100);

        let mut transitions = 0;
        let mut last = button.is_active();
        // Toggle every 2 ms for 40 ms, starting at a time the filter accepts.
        for i in 0..20u64 {
            pin.set(i % 2 == 1);
            let now = 100 + i * 2;
            if button.poll(now) != last {
                transitions += 1;
                last = button.is_active();
            }
        }
        assert_eq!(transitions, 1);
    }

    #[test]
    fn output_changes_at_most_once_per_settle_interval() {
        let pin = SimPin::new(true);
        let mut button = Debouncer::active_low(pin.clone());

        let mut change_times = Vec::new();
        let mut last = button.is_active();
        for now in 0..2000u64 {
            // Pseudo-random bouncing pattern.
            pin.set((now * 7 + now / 3) % 5 < 2);
            if button.poll(now) != last {
                change_times.push(now);
                last = button.is_active();
            }
        }

        assert!(!change_times.is_empty());
        for pair in change_times.windows(2) {
            assert!(pair[1] - pair[0] >= DEBOUNCE_MS, "changes at {:?}", pair);
        }
    }

    #[test]
    fn touch_sensor_is_active_high() {
        let pin = SimPin::new(false);
        let mut touch = Debouncer::active_high(pin.clone()).with_settle_ms(20);
        assert!(!touch.poll(100));
        pin.set(true);
        assert!(touch.poll(120));
    }

    #[test]
    fn vibration_requires_confirmation_read() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock.clone());
        let pin = SimPin::new(false);
        let mut sensor = VibrationSensor::new(pin.clone());

        pin.set(true);
        // Inside the first check window nothing is reported.
        assert!(!sensor.poll(50, &mut delay));
        assert!(sensor.poll(100, &mut delay));
        assert_eq!(clock.now(), VIBRATION_CONFIRM_DELAY_MS as u64);

        // Level unchanged: no further detections.
        assert!(!sensor.poll(200, &mut delay));

        // Falling edge is tracked but not reported.
        pin.set(false);
        assert!(!sensor.poll(300, &mut delay));
        pin.set(true);
        assert!(sensor.poll(400, &mut delay));
    }

    #[test]
    fn vibration_glitch_is_rejected() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock.clone());
        let pin = SimPin::scripted([true, false]);
        let mut sensor = VibrationSensor::new(pin);

        assert!(!sensor.poll(100, &mut delay));
    }

    #[test]
    fn read_error_keeps_stable_value() {
        let pin = SimPin::new(false);
        let mut button = Debouncer::active_low(pin.clone());
        assert!(button.poll(100));

        pin.set(true);
        pin.set_failing(true);
        assert!(button.poll(200));
        assert!(button.poll(300));

        pin.set_failing(false);
        assert!(!button.poll(400));
    }

    #[test]
    fn failed_confirmation_read_reports_nothing() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock.clone());
        let pin = SimPin::new(true);
        let mut sensor = VibrationSensor::new(pin.clone());

        pin.fail_after(1);
        assert!(!sensor.poll(100, &mut delay));
        assert_eq!(clock.now(), VIBRATION_CONFIRM_DELAY_MS as u64);

        // The onset was not accepted, so it is still reported once reads work.
        pin.set_failing(false);
        assert!(sensor.poll(200, &mut delay));

        pin.set_failing(true);
        assert!(!sensor.poll(300, &mut delay));
    }

    #[test]
    fn manager_emits_press_edges_once() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock);
        let (tx, rx) = mpsc::channel();
        let b1 = SimPin::new(true);
        let b2 = SimPin::new(true);
        let touch = SimPin::new(false);
        let vib = SimPin::new(false);
        let mut input = InputManager::new(b1.clone(), b2.clone(), touch.clone(), vib, tx);

        b1.set(false);
        for now in (100..400).step_by(10) {
            input.update(now, &mut delay);
        }
        touch.set(true);
        b2.set(false);
        for now in (400..600).step_by(10) {
            input.update(now, &mut delay);
        }

        let events: Vec<UiEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![UiEvent::Scroll, UiEvent::Select, UiEvent::GripChanged(true)]
        );
        assert!(input.grip_touched());
    }
}

// Tiga Watch — Synthetic Hardware
//
// Stand-ins for the board peripherals so the whole control loop can run on
// a desktop: unit tests script exact sample sequences, the host binary uses
// the waveform generators.  Handles are cheap clones sharing one state, which
// lets a test keep a handle while the component under test owns another.
// Everything is single-threaded (`Rc`), like the firmware loop itself.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin};

use crate::config::ACCEL_LSB_PER_G;
use crate::hal::{AnalogInput, Clock, InertialSensor};

// ---------------------------------------------------------------------------
// Clock & delay
// ---------------------------------------------------------------------------

/// Manually advanced millisecond clock.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now()
    }
}

/// Blocking delay that advances a [`SimClock`] instead of sleeping.
#[derive(Debug, Clone)]
pub struct SimDelay {
    clock: SimClock,
    pending_ns: u64,
}

impl SimDelay {
    pub fn new(clock: SimClock) -> Self {
        Self { clock, pending_ns: 0 }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.pending_ns += u64::from(ns);
        let whole_ms = self.pending_ns / 1_000_000;
        self.pending_ns %= 1_000_000;
        self.clock.advance(whole_ms);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(u64::from(ms));
    }
}

// ---------------------------------------------------------------------------
// Digital pin
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PinState {
    level: bool,
    script: VecDeque<bool>,
    /// Reads that still succeed before the pin starts failing; `None` never fails.
    ok_reads_left: Option<usize>,
}

/// Injected GPIO fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Digital input whose level is set by the test (or replayed from a script).
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    state: Rc<RefCell<PinState>>,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        let pin = Self::default();
        pin.set(high);
        pin
    }

    /// Levels returned by successive reads; the last one then sticks.
    pub fn scripted(levels: impl IntoIterator<Item = bool>) -> Self {
        let pin = Self::default();
        pin.state.borrow_mut().script.extend(levels);
        pin
    }

    pub fn set(&self, high: bool) {
        let mut state = self.state.borrow_mut();
        state.script.clear();
        state.level = high;
    }

    /// Fail every read from now on (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().ok_reads_left = failing.then_some(0);
    }

    /// Let `reads` more reads succeed, then fail the rest.
    pub fn fail_after(&self, reads: usize) {
        self.state.borrow_mut().ok_reads_left = Some(reads);
    }
}

impl ErrorType for SimPin {
    type Error = SimPinError;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut state = self.state.borrow_mut();
        match state.ok_reads_left {
            Some(0) => return Err(SimPinError),
            Some(left) => state.ok_reads_left = Some(left - 1),
            None => {}
        }
        if let Some(level) = state.script.pop_front() {
            state.level = level;
        }
        Ok(state.level)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// ---------------------------------------------------------------------------
// Pulse sensor
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum PulseSource {
    Script { queue: VecDeque<u16>, last: u16 },
    /// One sharp peak of `peak_ms` every `period_ms` over a flat baseline.
    Heartbeat { clock: SimClock, period_ms: u64, peak_ms: u64 },
    Failing,
}

/// Analog pulse input.
#[derive(Debug, Clone)]
pub struct SimPulse {
    source: Rc<RefCell<PulseSource>>,
}

impl SimPulse {
    pub fn scripted(values: impl IntoIterator<Item = u16>) -> Self {
        Self::from_source(PulseSource::Script {
            queue: values.into_iter().collect(),
            last: 0,
        })
    }

    pub fn heartbeat(clock: SimClock, bpm: u32) -> Self {
        Self::from_source(PulseSource::Heartbeat {
            clock,
            period_ms: 60_000 / u64::from(bpm.max(1)),
            peak_ms: 20,
        })
    }

    pub fn failing() -> Self {
        Self::from_source(PulseSource::Failing)
    }

    fn from_source(source: PulseSource) -> Self {
        Self {
            source: Rc::new(RefCell::new(source)),
        }
    }

    /// Queue one more scripted value.
    pub fn push(&self, value: u16) {
        if let PulseSource::Script { queue, .. } = &mut *self.source.borrow_mut() {
            queue.push_back(value);
        }
    }
}

impl AnalogInput for SimPulse {
    fn read_analog(&mut self) -> anyhow::Result<u16> {
        match &mut *self.source.borrow_mut() {
            PulseSource::Script { queue, last } => {
                if let Some(v) = queue.pop_front() {
                    *last = v;
                }
                Ok(*last)
            }
            PulseSource::Heartbeat { clock, period_ms, peak_ms } => {
                let phase = clock.now() % *period_ms;
                Ok(if phase < *peak_ms { 2800 } else { 1900 })
            }
            PulseSource::Failing => anyhow::bail!("simulated ADC fault"),
        }
    }
}

// ---------------------------------------------------------------------------
// IMU
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum MotionSource {
    Script { queue: VecDeque<[i16; 3]>, last: [i16; 3] },
    /// Wrist at rest with a step-like vertical bump every `stride_ms`.
    Walking { clock: SimClock, stride_ms: u64 },
}

#[derive(Debug)]
struct ImuState {
    source: MotionSource,
    connected: bool,
    failing: bool,
    temperature: i16,
}

/// MPU6050 stand-in.
#[derive(Debug, Clone)]
pub struct SimImu {
    state: Rc<RefCell<ImuState>>,
}

impl SimImu {
    pub fn scripted(samples: impl IntoIterator<Item = [i16; 3]>) -> Self {
        Self::from_source(MotionSource::Script {
            queue: samples.into_iter().collect(),
            last: [0, 0, 0],
        })
    }

    pub fn walking(clock: SimClock, stride_ms: u64) -> Self {
        Self::from_source(MotionSource::Walking { clock, stride_ms })
    }

    /// Fails the connection test and every read.
    pub fn disconnected() -> Self {
        let imu = Self::scripted([]);
        {
            let mut state = imu.state.borrow_mut();
            state.connected = false;
            state.failing = true;
        }
        imu
    }

    fn from_source(source: MotionSource) -> Self {
        Self {
            state: Rc::new(RefCell::new(ImuState {
                source,
                connected: true,
                failing: false,
                temperature: 0,
            })),
        }
    }

    pub fn push(&self, sample: [i16; 3]) {
        if let MotionSource::Script { queue, .. } = &mut self.state.borrow_mut().source {
            queue.push_back(sample);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().failing = failing;
    }

    pub fn set_temperature(&self, raw: i16) {
        self.state.borrow_mut().temperature = raw;
    }
}

impl InertialSensor for SimImu {
    fn is_connected(&mut self) -> bool {
        self.state.borrow().connected
    }

    fn read_raw_acceleration(&mut self) -> anyhow::Result<[i16; 3]> {
        let mut state = self.state.borrow_mut();
        if state.failing {
            anyhow::bail!("simulated I2C NACK");
        }
        Ok(match &mut state.source {
            MotionSource::Script { queue, last } => {
                if let Some(s) = queue.pop_front() {
                    *last = s;
                }
                *last
            }
            MotionSource::Walking { clock, stride_ms } => {
                let one_g = ACCEL_LSB_PER_G as i16;
                let phase = clock.now() % *stride_ms;
                if phase < 40 {
                    [1200, 800, one_g * 4]
                } else {
                    [150, -90, one_g]
                }
            }
        })
    }

    fn read_raw_temperature(&mut self) -> anyhow::Result<i16> {
        let state = self.state.borrow();
        if state.failing {
            anyhow::bail!("simulated I2C NACK");
        }
        Ok(state.temperature)
    }
}

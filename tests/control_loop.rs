// End-to-end runs of the control loop against synthetic hardware.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use tiga::app::{App, Board, Screen};
use tiga::config::*;
use tiga::events::{SensorHealth, UiEvent};
use tiga::selftest::MenuState;
use tiga::sim::{SimClock, SimDelay, SimImu, SimPin, SimPulse};

type SimApp = App<SimClock, SimDelay, SimPin, SimImu, SimPulse>;

/// Counts pixels so rendering can be exercised without a panel.
#[derive(Default)]
struct NullDisplay {
    pixels: usize,
}

impl OriginDimensions for NullDisplay {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for NullDisplay {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.pixels += pixels.into_iter().count();
        Ok(())
    }
}

struct Watch {
    clock: SimClock,
    scroll: SimPin,
    select: SimPin,
    touch: SimPin,
    app: SimApp,
    display: NullDisplay,
    frames: usize,
}

impl Watch {
    fn new(imu: SimImu, pulse: SimPulse, clock: SimClock) -> Self {
        let scroll = SimPin::new(true);
        let select = SimPin::new(true);
        let touch = SimPin::new(false);
        let app = App::new(Board {
            clock: clock.clone(),
            delay: SimDelay::new(clock.clone()),
            button1: scroll.clone(),
            button2: select.clone(),
            touch: touch.clone(),
            vibration: SimPin::new(false),
            imu,
            pulse,
        });
        Self {
            clock,
            scroll,
            select,
            touch,
            app,
            display: NullDisplay::default(),
            frames: 0,
        }
    }

    fn walking(bpm: u32, stride_ms: u64) -> Self {
        let clock = SimClock::new();
        let imu = SimImu::walking(clock.clone(), stride_ms);
        imu.set_temperature(160);
        let pulse = SimPulse::heartbeat(clock.clone(), bpm);
        Self::new(imu, pulse, clock)
    }

    fn run(&mut self, ms: u64) {
        let end = self.clock.now() + ms;
        while self.clock.now() < end {
            self.clock.advance(u64::from(UI_POLL_INTERVAL_MS));
            if self.app.tick() {
                self.app.render(&mut self.display).unwrap();
                self.frames += 1;
            }
        }
    }

    fn press(&mut self, select: bool) {
        let pin = if select { self.select.clone() } else { self.scroll.clone() };
        pin.set(false);
        self.run(100);
        pin.set(true);
        self.run(100);
    }
}

#[test]
fn one_minute_of_walking() {
    let mut watch = Watch::walking(72, 550);
    watch.run(60_000);

    let s = watch.app.snapshot();
    // One step per stride, the first stride falls inside the start-up interval.
    assert_eq!(s.steps, 109);
    assert!((71.0..=73.0).contains(&s.heart_rate_bpm), "bpm {}", s.heart_rate_bpm);
    assert!((s.temperature_c - 37.0).abs() < 0.01);
    assert!(!s.fall_detected);
    assert_eq!(s.imu_health, SensorHealth::Ready);

    // Redrawn at least once per second, and something was painted.
    assert!(watch.frames >= 60);
    assert!(watch.display.pixels > 0);
}

#[test]
fn heart_rate_self_test_end_to_end() {
    let mut watch = Watch::walking(72, 550);
    watch.run(2_000);

    watch.press(false); // → chat
    watch.press(false); // → self-test
    assert_eq!(watch.app.screen(), Screen::SelfTest);

    watch.press(true); // Heart Tests
    watch.press(true); // Heart Rate
    watch.press(true); // Start Test
    assert!(watch.app.selftest().is_running());

    watch.run(TEST_DURATION_MS + 500);
    let result = match watch.app.selftest().state() {
        MenuState::Results { result, .. } => result.clone(),
        other => panic!("expected results, got {:?}", other),
    };
    assert_eq!(result.name, "Heart Rate");
    assert!(result.result == "71 BPM" || result.result == "72 BPM", "{}", result.result);
    assert!(result.success);
    assert_eq!(watch.app.selftest().results().len(), 1);

    // Done → test list → Back → categories → Back → dashboard.
    watch.press(true);
    for _ in 0..3 {
        watch.press(false);
    }
    watch.press(true);
    assert!(matches!(watch.app.selftest().state(), MenuState::Categories { selected: 0 }));
    for _ in 0..4 {
        watch.press(false);
    }
    watch.press(true);
    assert_eq!(watch.app.screen(), Screen::Dashboard);
}

#[test]
fn grip_test_measures_hold_through_touch_sensor() {
    let mut watch = Watch::walking(72, 550);
    watch.run(500);
    watch.press(false);
    watch.press(false);

    // Dexterity Tests → Grip Test → Start.
    for _ in 0..3 {
        watch.press(false);
    }
    watch.press(true);
    watch.press(false);
    watch.press(false);
    watch.press(true);
    watch.press(true);
    assert!(watch.app.selftest().is_running());

    watch.run(1_000);
    watch.touch.set(true);
    watch.run(6_000);
    watch.touch.set(false);
    watch.run(TEST_DURATION_MS);

    let result = watch.app.selftest().results().latest().unwrap().clone();
    assert_eq!(result.name, "Grip Test");
    assert!(result.success, "{}", result.result);
    assert!(result.result.ends_with(" s hold"));
}

#[test]
fn missing_imu_degrades_but_keeps_running() {
    let clock = SimClock::new();
    let mut watch = Watch::new(SimImu::disconnected(), SimPulse::heartbeat(clock.clone(), 60), clock);
    watch.run(10_000);

    let s = watch.app.snapshot();
    assert_eq!(s.imu_health, SensorHealth::Unavailable);
    assert_eq!(s.steps, 0);
    assert_eq!(s.temperature_c, DEFAULT_TEMP_C);
    assert!(watch.frames >= 10);
}

#[test]
fn chat_keeps_the_five_newest_messages() {
    let mut watch = Watch::walking(72, 550);
    let radio = watch.app.event_sender();
    for i in 0..7 {
        radio.send(UiEvent::MessageReceived(format!("msg {}", i).into_bytes())).unwrap();
        watch.run(1_000);
    }
    watch.app.send_message("on my way");

    let chat = watch.app.chat();
    assert!(chat.is_connected());
    let texts: Vec<&str> = chat.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["msg 3", "msg 4", "msg 5", "msg 6", "on my way"]);

    watch.press(false);
    assert_eq!(watch.app.screen(), Screen::Chat);
    watch.run(1_000);
}

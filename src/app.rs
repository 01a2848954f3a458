// Tiga Watch — Control Loop
//
// One `App::tick` is one pass of the cooperative main loop: poll the digital
// inputs, poll the sensors, drain the UI event channel, advance the chat
// link and the self-test runner, then decide whether the screen needs
// repainting.  The firmware calls it every `UI_POLL_INTERVAL_MS`; the host
// simulator and the integration tests drive it with synthetic hardware.

use std::sync::mpsc::{self, Receiver, Sender};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::chat::ChatLink;
use crate::config::*;
use crate::events::{SensorSnapshot, UiEvent};
use crate::hal::{AnalogInput, Clock, InertialSensor};
use crate::input::InputManager;
use crate::selftest::{MenuAction, SelfTestRunner};
use crate::sensors::SensorHub;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Chat,
    SelfTest,
}

/// Everything the control loop needs from the board.
pub struct Board<C, D, P, S, A> {
    pub clock: C,
    pub delay: D,
    /// Scroll button (active low).
    pub button1: P,
    /// Select button (active low).
    pub button2: P,
    pub touch: P,
    pub vibration: P,
    pub imu: S,
    pub pulse: A,
}

pub struct App<C, D, P, S, A> {
    clock: C,
    delay: D,
    input: InputManager<P>,
    sensors: SensorHub<S, A>,
    chat: ChatLink,
    selftest: SelfTestRunner,
    screen: Screen,
    snapshot: SensorSnapshot,

    ui_tx: Sender<UiEvent>,
    ui_rx: Receiver<UiEvent>,

    last_redraw_ms: Option<u64>,
}

impl<C, D, P, S, A> App<C, D, P, S, A>
where
    C: Clock,
    D: DelayNs,
    P: InputPin,
    S: InertialSensor,
    A: AnalogInput,
{
    pub fn new(board: Board<C, D, P, S, A>) -> Self {
        let (ui_tx, ui_rx) = mpsc::channel();
        let now = board.clock.now_ms();

        let input = InputManager::new(
            board.button1,
            board.button2,
            board.touch,
            board.vibration,
            ui_tx.clone(),
        );
        let sensors = SensorHub::new(board.imu, board.pulse, now);
        let snapshot = sensors.snapshot();

        Self {
            clock: board.clock,
            delay: board.delay,
            input,
            sensors,
            chat: ChatLink::new(),
            selftest: SelfTestRunner::new(),
            screen: Screen::Dashboard,
            snapshot,
            ui_tx,
            ui_rx,
            last_redraw_ms: None,
        }
    }

    /// Handle for producers outside the loop (e.g. the radio callback).
    pub fn event_sender(&self) -> Sender<UiEvent> {
        self.ui_tx.clone()
    }

    /// One loop iteration.  Returns `true` when the screen should be redrawn.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();

        // 1. Inputs (may block for the vibration confirmation read).
        self.input.update(now, &mut self.delay);

        // 2. Sensors (may block for the fall confirmation read).
        let was_fallen = self.snapshot.fall_detected;
        self.snapshot = self.sensors.poll(now, &mut self.delay);
        if self.snapshot.fall_detected && !was_fallen {
            log::warn!("Fall detected at {} ms", now);
        }

        // 3. Events.
        let mut dirty = false;
        while let Ok(event) = self.ui_rx.try_recv() {
            dirty |= self.handle_event(now, event);
        }

        // 4. Background state machines.
        self.chat.tick(now);
        if self.screen == Screen::SelfTest {
            let action = self.selftest.tick(now, &self.snapshot, self.input.grip_touched());
            dirty |= action != MenuAction::Idle;
        }

        // 5. Redraw decision.
        let stale = self
            .last_redraw_ms
            .map_or(true, |last| now.saturating_sub(last) >= REDRAW_INTERVAL_MS);
        if dirty || stale {
            self.last_redraw_ms = Some(now);
            true
        } else {
            false
        }
    }

    fn handle_event(&mut self, now: u64, event: UiEvent) -> bool {
        match event {
            UiEvent::Scroll => match self.screen {
                Screen::Dashboard => {
                    self.screen = Screen::Chat;
                    true
                }
                Screen::Chat => {
                    self.selftest.open();
                    self.screen = Screen::SelfTest;
                    true
                }
                Screen::SelfTest => self.selftest.on_scroll(now) != MenuAction::Idle,
            },

            UiEvent::Select => match self.screen {
                Screen::Dashboard => {
                    self.sensors.reset_steps();
                    self.snapshot = self.sensors.snapshot();
                    true
                }
                Screen::Chat => {
                    self.screen = Screen::Dashboard;
                    true
                }
                Screen::SelfTest => {
                    let grip = self.input.grip_touched();
                    match self.selftest.on_select(now, &self.snapshot, grip) {
                        MenuAction::Exit => {
                            self.screen = Screen::Dashboard;
                            true
                        }
                        MenuAction::Redraw => true,
                        MenuAction::Idle => false,
                    }
                }
            },

            UiEvent::GripChanged(touched) => {
                log::debug!("Grip {}", if touched { "on" } else { "off" });
                false
            }

            UiEvent::VibrationDetected => {
                self.sensors.record_vibration();
                self.snapshot.vibrations = self.sensors.snapshot().vibrations;
                self.screen == Screen::Dashboard
            }

            UiEvent::MessageReceived(payload) => {
                self.chat.receive(now, &payload);
                true
            }
        }
    }

    /// Record a locally composed chat message.
    pub fn send_message(&mut self, text: &str) {
        let now = self.clock.now_ms();
        self.chat.send(now, text);
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        self.snapshot
    }

    pub fn chat(&self) -> &ChatLink {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatLink {
        &mut self.chat
    }

    pub fn selftest(&self) -> &SelfTestRunner {
        &self.selftest
    }

    pub fn grip_touched(&self) -> bool {
        self.input.grip_touched()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Paint the current screen.
    pub fn render<T>(&self, target: &mut T) -> Result<(), T::Error>
    where
        T: DrawTarget<Color = Rgb565>,
    {
        let now = self.clock.now_ms();
        match self.screen {
            Screen::Dashboard => ui::draw_dashboard(target, &self.snapshot, self.chat.state()),
            Screen::Chat => ui::draw_chat(target, &self.chat, now),
            Screen::SelfTest => ui::draw_selftest(target, &self.selftest, now),
        }
    }
}

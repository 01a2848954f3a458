// Tiga Watch — Self-Test Runner
//
// Menu-driven test suite: pick a category, pick a test, read the
// instructions, run it for a fixed duration, see the result.  Navigation is
// two buttons (Scroll / Select).  Tests sample the same sensor snapshot the
// dashboard shows; every finished or aborted run lands in a bounded results
// log.

use crate::chat::truncate_utf8;
use crate::config::*;
use crate::events::SensorSnapshot;
use crate::ring::BoundedLog;

pub const BACK_LABEL: &str = "Back";
/// Four categories plus "Back".
pub const CATEGORY_MENU_LEN: usize = 5;
/// Three tests plus "Back".
pub const TEST_MENU_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Heart,
    Fitness,
    Stability,
    Dexterity,
}

impl Category {
    pub const ALL: [Category; 4] = [Self::Heart, Self::Fitness, Self::Stability, Self::Dexterity];

    pub fn label(self) -> &'static str {
        match self {
            Self::Heart => "Heart Tests",
            Self::Fitness => "Fitness Tests",
            Self::Stability => "Stability Tests",
            Self::Dexterity => "Dexterity Tests",
        }
    }

    pub fn tests(self) -> [TestKind; 3] {
        use TestKind::*;
        match self {
            Self::Heart => [HeartRate, HeartRateVariability, ContinuousMonitoring],
            Self::Fitness => [StepCounter, ActivityLevel, WalkingTest],
            Self::Stability => [BalanceTest, FallDetection, PostureCheck],
            Self::Dexterity => [ReactionTime, TouchPattern, GripTest],
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    HeartRate,
    HeartRateVariability,
    ContinuousMonitoring,
    StepCounter,
    ActivityLevel,
    WalkingTest,
    BalanceTest,
    FallDetection,
    PostureCheck,
    ReactionTime,
    TouchPattern,
    GripTest,
}

impl TestKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::HeartRate => "Heart Rate",
            Self::HeartRateVariability => "Heart Rate Variability",
            Self::ContinuousMonitoring => "Continuous Monitoring",
            Self::StepCounter => "Step Counter",
            Self::ActivityLevel => "Activity Level",
            Self::WalkingTest => "Walking Test",
            Self::BalanceTest => "Balance Test",
            Self::FallDetection => "Fall Detection",
            Self::PostureCheck => "Posture Check",
            Self::ReactionTime => "Reaction Time",
            Self::TouchPattern => "Touch Pattern",
            Self::GripTest => "Grip Test",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Self::HeartRate => "Place your finger gently on the sensor. Keep still until the test completes.",
            Self::HeartRateVariability => "Place your finger on the sensor. Breathe normally until the test completes.",
            Self::ContinuousMonitoring => "Wear the device normally. Monitoring runs for the whole test.",
            Self::StepCounter => "Walk normally for 30 seconds. Device will count your steps.",
            Self::ActivityLevel => "Perform your normal activities until the test completes.",
            Self::WalkingTest => "Walk at a comfortable pace until the test completes.",
            Self::BalanceTest => "Stand still with feet shoulder-width apart. Hold position for 30 seconds.",
            Self::FallDetection => "System will monitor for sudden movements and potential falls.",
            Self::PostureCheck => "Sit or stand normally. Device will analyze your posture for 30 seconds.",
            Self::ReactionTime => "Touch the sensor as quickly as you can once the test starts.",
            Self::TouchPattern => "Tap the touch sensor repeatedly during the test.",
            Self::GripTest => "Hold the touch sensor continuously as long as you can.",
        }
    }

    pub fn category(self) -> Category {
        Category::ALL
            .into_iter()
            .find(|c| c.tests().contains(&self))
            .unwrap_or(Category::Heart)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub category: &'static str,
    pub name: &'static str,
    /// At most [`TEST_RESULT_TEXT_LEN`] bytes.
    pub result: String,
    /// Only used to colour the result.
    pub success: bool,
    pub timestamp_ms: u64,
}

/// Figures accumulated while a test runs.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    started_ms: u64,
    start_steps: u32,
    last: SensorSnapshot,
    samples: u32,

    bpm_sum: f32,
    bpm_min: f32,
    bpm_max: f32,
    stable_samples: u32,
    steady_samples: u32,
    activity_sum: f32,
    fall_seen: bool,

    touches: u32,
    touch_since_ms: Option<u64>,
    first_touch_ms: Option<u64>,
    longest_hold_ms: u64,
}

impl RunMetrics {
    /// A finger already on the sensor is tracked as a hold, but only a later
    /// touch counts as a touch or as the reaction.
    fn start(now_ms: u64, snapshot: &SensorSnapshot, grip: bool) -> Self {
        Self {
            started_ms: now_ms,
            start_steps: snapshot.steps,
            last: *snapshot,
            samples: 0,
            bpm_sum: 0.0,
            bpm_min: f32::MAX,
            bpm_max: f32::MIN,
            stable_samples: 0,
            steady_samples: 0,
            activity_sum: 0.0,
            fall_seen: false,
            touches: 0,
            touch_since_ms: grip.then_some(now_ms),
            first_touch_ms: None,
            longest_hold_ms: 0,
        }
    }

    fn observe(&mut self, now_ms: u64, snapshot: &SensorSnapshot, grip: bool) {
        self.last = *snapshot;
        self.samples += 1;

        let bpm = snapshot.heart_rate_bpm;
        self.bpm_sum += bpm;
        self.bpm_min = self.bpm_min.min(bpm);
        self.bpm_max = self.bpm_max.max(bpm);
        if snapshot.is_stable {
            self.stable_samples += 1;
        }
        if snapshot.activity_level < STABLE_THRESHOLD {
            self.steady_samples += 1;
        }
        self.activity_sum += snapshot.activity_level;
        self.fall_seen |= snapshot.fall_detected;

        match (grip, self.touch_since_ms) {
            (true, None) => {
                self.touches += 1;
                self.touch_since_ms = Some(now_ms);
                self.first_touch_ms.get_or_insert(now_ms.saturating_sub(self.started_ms));
            }
            (false, Some(since)) => {
                self.longest_hold_ms = self.longest_hold_ms.max(now_ms.saturating_sub(since));
                self.touch_since_ms = None;
            }
            _ => {}
        }
    }

    fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }

    fn steps(&self) -> u32 {
        self.last.steps.saturating_sub(self.start_steps)
    }

    fn percent(&self, count: u32) -> u32 {
        if self.samples == 0 {
            0
        } else {
            count * 100 / self.samples
        }
    }

    /// Result text and pass/fail for `test`, evaluated at `now_ms`.
    fn outcome(&self, test: TestKind, now_ms: u64) -> (String, bool) {
        let bpm = self.last.heart_rate_bpm;
        match test {
            TestKind::HeartRate => (format!("{:.0} BPM", bpm), (60.0..=100.0).contains(&bpm)),
            TestKind::HeartRateVariability => {
                if self.samples == 0 {
                    ("No reading".into(), false)
                } else {
                    (format!("{:.0} BPM spread", self.bpm_max - self.bpm_min), true)
                }
            }
            TestKind::ContinuousMonitoring => {
                let avg = if self.samples == 0 { bpm } else { self.bpm_sum / self.samples as f32 };
                (format!("{:.0} BPM avg", avg), (60.0..=100.0).contains(&avg))
            }
            TestKind::StepCounter => {
                let steps = self.steps();
                (format!("{} steps", steps), steps > 0)
            }
            TestKind::ActivityLevel => {
                let avg = if self.samples == 0 { 0.0 } else { self.activity_sum / self.samples as f32 };
                let g = avg / ACCEL_LSB_PER_G;
                (format!("{:.2} g avg", g), g > 0.0)
            }
            TestKind::WalkingTest => {
                let minutes = self.elapsed_ms(now_ms).max(1) as f32 / 60_000.0;
                let cadence = self.steps() as f32 / minutes;
                (format!("{:.0} steps/min", cadence), self.steps() > 0)
            }
            TestKind::BalanceTest => {
                let pct = self.percent(self.stable_samples);
                (format!("{}% stable", pct), pct >= 80)
            }
            TestKind::FallDetection => {
                if self.fall_seen {
                    ("Fall detected".into(), false)
                } else {
                    ("No falls".into(), true)
                }
            }
            TestKind::PostureCheck => {
                let pct = self.percent(self.steady_samples);
                (format!("{}% steady", pct), pct >= 50)
            }
            TestKind::ReactionTime => match self.first_touch_ms {
                Some(ms) => (format!("{} ms", ms), ms < 1000),
                None => ("No touch".into(), false),
            },
            TestKind::TouchPattern => (format!("{} touches", self.touches), self.touches >= 3),
            TestKind::GripTest => {
                let ongoing = self.touch_since_ms.map_or(0, |since| now_ms.saturating_sub(since));
                let hold = self.longest_hold_ms.max(ongoing);
                (format!("{:.1} s hold", hold as f32 / 1000.0), hold >= 5000)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Menu state machine
// ---------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub enum MenuState {
    /// `selected` ranges over the categories plus "Back".
    Categories { selected: usize },
    /// `selected` ranges over the category's tests plus "Back".
    Tests { category: Category, selected: usize },
    Instructions { test: TestKind },
    Running { test: TestKind, metrics: RunMetrics },
    Results { test: TestKind, result: TestResult },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Nothing visible changed.
    Idle,
    Redraw,
    /// "Back" chosen on the category menu.
    Exit,
}

pub struct SelfTestRunner {
    state: MenuState,
    results: BoundedLog<TestResult, TEST_MAX_RESULTS>,
    last_progress: u8,
}

impl SelfTestRunner {
    pub fn new() -> Self {
        Self {
            state: MenuState::Categories { selected: 0 },
            results: BoundedLog::new(),
            last_progress: 0,
        }
    }

    /// Enter the suite from the top-level menu.
    pub fn open(&mut self) {
        self.state = MenuState::Categories { selected: 0 };
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn results(&self) -> &BoundedLog<TestResult, TEST_MAX_RESULTS> {
        &self.results
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, MenuState::Running { .. })
    }

    /// Progress of the running test, 0-100.
    pub fn progress(&self, now_ms: u64) -> Option<u8> {
        match &self.state {
            MenuState::Running { metrics, .. } => {
                let pct = metrics.elapsed_ms(now_ms) * 100 / TEST_DURATION_MS;
                Some(pct.min(100) as u8)
            }
            _ => None,
        }
    }

    /// Button 1: next item, abort a run, or retry from the results card.
    pub fn on_scroll(&mut self, now_ms: u64) -> MenuAction {
        match &mut self.state {
            MenuState::Categories { selected } => {
                *selected = (*selected + 1) % CATEGORY_MENU_LEN;
                MenuAction::Redraw
            }
            MenuState::Tests { selected, .. } => {
                *selected = (*selected + 1) % TEST_MENU_LEN;
                MenuAction::Redraw
            }
            MenuState::Instructions { .. } => MenuAction::Idle,
            MenuState::Running { test, .. } => {
                log::info!("Test '{}' aborted", test.name());
                self.finish(now_ms, true);
                MenuAction::Redraw
            }
            MenuState::Results { test, .. } => {
                self.state = MenuState::Instructions { test: *test };
                MenuAction::Redraw
            }
        }
    }

    /// Button 2: enter, go back, start a test, or dismiss the results card.
    /// `grip` is the touch level at the moment of the press.
    pub fn on_select(&mut self, now_ms: u64, snapshot: &SensorSnapshot, grip: bool) -> MenuAction {
        match &self.state {
            MenuState::Categories { selected } => match Category::ALL.get(*selected) {
                Some(&category) => {
                    self.state = MenuState::Tests { category, selected: 0 };
                    MenuAction::Redraw
                }
                None => MenuAction::Exit,
            },
            MenuState::Tests { category, selected } => {
                let category = *category;
                self.state = match category.tests().get(*selected) {
                    Some(&test) => MenuState::Instructions { test },
                    None => MenuState::Categories { selected: category.index() },
                };
                MenuAction::Redraw
            }
            MenuState::Instructions { test } => {
                log::info!("Test '{}' started", test.name());
                self.last_progress = 0;
                self.state = MenuState::Running {
                    test: *test,
                    metrics: RunMetrics::start(now_ms, snapshot, grip),
                };
                MenuAction::Redraw
            }
            MenuState::Running { .. } => MenuAction::Idle,
            MenuState::Results { test, .. } => {
                let category = test.category();
                let selected = category.tests().iter().position(|t| t == test).unwrap_or(0);
                self.state = MenuState::Tests { category, selected };
                MenuAction::Redraw
            }
        }
    }

    /// Feed the running test; completes it once the duration has elapsed.
    pub fn tick(&mut self, now_ms: u64, snapshot: &SensorSnapshot, grip: bool) -> MenuAction {
        let MenuState::Running { metrics, .. } = &mut self.state else {
            return MenuAction::Idle;
        };
        metrics.observe(now_ms, snapshot, grip);

        if metrics.elapsed_ms(now_ms) >= TEST_DURATION_MS {
            self.finish(now_ms, false);
            return MenuAction::Redraw;
        }

        let progress = self.progress(now_ms).unwrap_or(0);
        if progress != self.last_progress {
            self.last_progress = progress;
            MenuAction::Redraw
        } else {
            MenuAction::Idle
        }
    }

    fn finish(&mut self, now_ms: u64, aborted: bool) {
        let MenuState::Running { test, metrics } = &self.state else {
            return;
        };
        let test = *test;
        let (text, passed) = metrics.outcome(test, now_ms);

        let result = TestResult {
            category: test.category().label(),
            name: test.name(),
            result: truncate_utf8(&text, TEST_RESULT_TEXT_LEN).to_owned(),
            success: passed && !aborted,
            timestamp_ms: now_ms,
        };
        log::info!(
            "Test '{}' finished: {} ({})",
            result.name,
            result.result,
            if result.success { "pass" } else { "fail" }
        );

        self.results.push(result.clone());
        self.state = MenuState::Results { test, result };
    }
}

impl Default for SelfTestRunner {
    fn default() -> Self {
        Self::new()
    }
}

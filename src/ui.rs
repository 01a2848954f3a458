// Tiga Watch — Screens
//
// Stateless drawing functions for every screen.  Each one repaints the whole
// 320x170 frame into any `embedded-graphics` RGB565 target, so the firmware
// can hand in the ST7789 directly and the tests a plain framebuffer.

use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Alignment, Text};

use crate::chat::{ChatLink, Direction, LinkState};
use crate::config::*;
use crate::events::{SensorHealth, SensorSnapshot};
use crate::selftest::{Category, MenuState, SelfTestRunner, BACK_LABEL};

// ---------------------------------------------------------------------------
// Palette (RGB565 raw values)
// ---------------------------------------------------------------------------
const fn rgb565(raw: u16) -> Rgb565 {
    Rgb565::new((raw >> 11) as u8, ((raw >> 5) & 0x3f) as u8, (raw & 0x1f) as u8)
}

pub const COLOR_BG: Rgb565 = rgb565(0x1082);
pub const COLOR_CARD: Rgb565 = rgb565(0x2104);
pub const COLOR_TEXT: Rgb565 = rgb565(0xFFFF);
pub const COLOR_SUBTEXT: Rgb565 = rgb565(0x8410);
pub const COLOR_ACCENT: Rgb565 = rgb565(0x05FF);
pub const COLOR_SUCCESS: Rgb565 = rgb565(0x0680);
pub const COLOR_WARNING: Rgb565 = rgb565(0xFD00);
pub const COLOR_DANGER: Rgb565 = rgb565(0xE8A5);
const COLOR_LINK_UP: Rgb565 = rgb565(0x07E0);
const COLOR_LINK_DOWN: Rgb565 = rgb565(0xF800);

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------
const HEADER_H: u32 = 32;
const FOOTER_H: u32 = 40;
const HEALTH_BAR_W: u32 = 24;
const PADDING: i32 = 8;
const CARD_RADIUS: u32 = 8;
const MENU_HEADER_H: u32 = 30;
const MENU_ROW_H: i32 = 22;
const CENTER_X: i32 = SCREEN_WIDTH as i32 / 2;
/// Characters per line in the small font, with a margin on both sides.
const SMALL_LINE_CHARS: usize = 48;

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------
fn text<T>(
    target: &mut T,
    s: &str,
    at: Point,
    font: &'static MonoFont<'static>,
    color: Rgb565,
    align: Alignment,
) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    Text::with_alignment(s, at, MonoTextStyle::new(font, color), align).draw(target)?;
    Ok(())
}

fn fill_rect<T>(target: &mut T, x: i32, y: i32, w: u32, h: u32, color: Rgb565) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    Rectangle::new(Point::new(x, y), Size::new(w, h))
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)
}

fn fill_round_rect<T>(
    target: &mut T,
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    radius: u32,
    color: Rgb565,
) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    RoundedRectangle::with_equal_corners(
        Rectangle::new(Point::new(x, y), Size::new(w, h)),
        Size::new(radius, radius),
    )
    .into_styled(PrimitiveStyle::with_fill(color))
    .draw(target)
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in s.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let split = word.char_indices().nth(width).map_or(word.len(), |(i, _)| i);
            lines.push(word[..split].to_owned());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// First `width` characters, with a trailing ".." when cut.
fn ellipsize(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_owned()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(2)).collect();
        out.push_str("..");
        out
    }
}

fn menu_header<T>(target: &mut T, title: &str) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    target.clear(COLOR_BG)?;
    fill_rect(target, 0, 0, SCREEN_WIDTH, MENU_HEADER_H, COLOR_CARD)?;
    text(target, title, Point::new(CENTER_X, 21), &FONT_10X20, COLOR_TEXT, Alignment::Center)
}

fn hint<T>(target: &mut T, s: &str) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    text(
        target,
        s,
        Point::new(CENTER_X, SCREEN_HEIGHT as i32 - 6),
        &FONT_6X10,
        COLOR_SUBTEXT,
        Alignment::Center,
    )
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------
fn health_color(health: SensorHealth) -> Rgb565 {
    match health {
        SensorHealth::Ready => COLOR_SUCCESS,
        SensorHealth::ZeroReadings => COLOR_WARNING,
        SensorHealth::Unavailable => COLOR_DANGER,
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_card<T>(
    target: &mut T,
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    title: &str,
    value: &str,
    color: Rgb565,
) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    fill_round_rect(target, x, y, w, h, CARD_RADIUS, COLOR_CARD)?;
    text(target, title, Point::new(x + PADDING, y + PADDING + 4), &FONT_6X10, COLOR_SUBTEXT, Alignment::Left)?;
    text(target, value, Point::new(x + PADDING, y + h as i32 - 4), &FONT_10X20, color, Alignment::Left)
}

pub fn draw_dashboard<T>(target: &mut T, snapshot: &SensorSnapshot, link: LinkState) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    target.clear(COLOR_BG)?;

    // ---- header ----
    fill_rect(target, 0, 0, SCREEN_WIDTH, HEADER_H, COLOR_CARD)?;
    text(target, "Tiga", Point::new(PADDING, 22), &FONT_10X20, COLOR_TEXT, Alignment::Left)?;
    let link_color = if link == LinkState::Connected { COLOR_SUCCESS } else { COLOR_SUBTEXT };
    text(
        target,
        link.label(),
        Point::new(SCREEN_WIDTH as i32 - PADDING, 20),
        &FONT_6X10,
        link_color,
        Alignment::Right,
    )?;
    if snapshot.vibrations > 0 {
        let vib = format!("Vib {}", snapshot.vibrations);
        text(target, &vib, Point::new(CENTER_X, 20), &FONT_6X10, COLOR_WARNING, Alignment::Center)?;
    }

    // ---- IMU health bar ----
    let body_h = SCREEN_HEIGHT - HEADER_H - FOOTER_H;
    fill_rect(target, 4, HEADER_H as i32 + 10, HEALTH_BAR_W - 8, body_h - 10, health_color(snapshot.imu_health))?;

    // ---- cards ----
    let card_x = HEALTH_BAR_W as i32 + 10;
    let card_y = HEADER_H as i32 + 10;
    let card_w = (SCREEN_WIDTH - card_x as u32 - 20) / 2;
    let card_h = (SCREEN_HEIGHT - HEADER_H - FOOTER_H - 30) / 2;
    let row2_y = card_y + card_h as i32 + 10;
    let col2_x = card_x + card_w as i32 + 5;

    let bpm = format!("{:.0} BPM", snapshot.heart_rate_bpm);
    let steps = snapshot.steps.to_string();
    let (stability, stability_color) = if snapshot.fall_detected {
        ("Fall!", COLOR_DANGER)
    } else if snapshot.is_stable {
        ("Safe", COLOR_SUCCESS)
    } else {
        ("Warning", COLOR_WARNING)
    };
    let temp = format!("{:.1}°C", snapshot.temperature_c);

    draw_card(target, card_x, card_y, card_w - 5, card_h, "Heart Rate", &bpm, COLOR_DANGER)?;
    draw_card(target, col2_x, card_y, card_w - 5, card_h, "Steps", &steps, COLOR_SUCCESS)?;
    draw_card(target, card_x, row2_y, card_w - 5, card_h, "Stability", stability, stability_color)?;
    draw_card(target, col2_x, row2_y, card_w - 5, card_h, "Temperature", &temp, COLOR_ACCENT)?;

    // ---- footer ----
    if !snapshot.imu_health.is_ready() {
        text(
            target,
            snapshot.imu_health.label(),
            Point::new(CENTER_X, SCREEN_HEIGHT as i32 - 22),
            &FONT_6X10,
            health_color(snapshot.imu_health),
            Alignment::Center,
        )?;
    }
    hint(target, "Scroll: Chat   Select: Reset steps")
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------
pub fn draw_chat<T>(target: &mut T, chat: &ChatLink, now_ms: u64) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    menu_header(target, "Chat")?;

    let state = chat.state();
    let status_color = match state {
        LinkState::Connected => COLOR_LINK_UP,
        LinkState::Error => COLOR_LINK_DOWN,
        LinkState::Scanning => COLOR_ACCENT,
    };
    text(target, state.label(), Point::new(CENTER_X, 44), &FONT_6X10, status_color, Alignment::Center)?;

    if chat.messages().is_empty() {
        text(target, "No messages yet", Point::new(CENTER_X, 90), &FONT_6X10, COLOR_SUBTEXT, Alignment::Center)?;
    }

    let mut y = 52;
    for message in chat.recent(CHAT_VISIBLE_MESSAGES) {
        fill_round_rect(target, 10, y, SCREEN_WIDTH - 20, 30, 4, COLOR_CARD)?;
        let (prefix, color) = match message.direction {
            Direction::Incoming => ("", COLOR_TEXT),
            Direction::Outgoing => ("> ", COLOR_ACCENT),
        };
        let line = ellipsize(&format!("{}{}", prefix, message.text), SMALL_LINE_CHARS);
        text(target, &line, Point::new(18, y + 13), &FONT_6X10, color, Alignment::Left)?;
        text(
            target,
            &message.age_label(now_ms),
            Point::new(SCREEN_WIDTH as i32 - 18, y + 25),
            &FONT_6X10,
            COLOR_SUBTEXT,
            Alignment::Right,
        )?;
        y += 34;
    }

    hint(target, "Scroll: Tests   Select: Back")
}

// ---------------------------------------------------------------------------
// Self-test
// ---------------------------------------------------------------------------
fn draw_menu<T>(target: &mut T, title: &str, items: &[&str], selected: usize) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    menu_header(target, title)?;
    for (i, item) in items.iter().enumerate() {
        let y = 38 + i as i32 * MENU_ROW_H;
        let color = if i == selected {
            fill_round_rect(target, 20, y, SCREEN_WIDTH - 40, MENU_ROW_H as u32 - 2, 4, COLOR_ACCENT)?;
            COLOR_BG
        } else {
            COLOR_TEXT
        };
        text(target, item, Point::new(30, y + 14), &FONT_6X10, color, Alignment::Left)?;
    }
    hint(target, "Scroll: Next   Select: Enter")
}

pub fn draw_selftest<T>(target: &mut T, runner: &SelfTestRunner, now_ms: u64) -> Result<(), T::Error>
where
    T: DrawTarget<Color = Rgb565>,
{
    match runner.state() {
        MenuState::Categories { selected } => {
            let mut items: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
            items.push(BACK_LABEL);
            draw_menu(target, "Select Test Category", &items, *selected)
        }

        MenuState::Tests { category, selected } => {
            let mut items: Vec<&str> = category.tests().iter().map(|t| t.name()).collect();
            items.push(BACK_LABEL);
            draw_menu(target, category.label(), &items, *selected)
        }

        MenuState::Instructions { test } => {
            menu_header(target, test.name())?;
            for (i, line) in wrap(test.instructions(), SMALL_LINE_CHARS).iter().enumerate() {
                let y = 52 + i as i32 * 14;
                text(target, line, Point::new(CENTER_X, y), &FONT_6X10, COLOR_TEXT, Alignment::Center)?;
            }
            fill_round_rect(target, 100, 110, 120, 30, 4, COLOR_SUCCESS)?;
            text(target, "Start Test", Point::new(CENTER_X, 129), &FONT_6X10, COLOR_TEXT, Alignment::Center)?;
            hint(target, "Select: Start")
        }

        MenuState::Running { test, .. } => {
            let progress = runner.progress(now_ms).unwrap_or(0);
            menu_header(target, test.name())?;
            fill_rect(target, 40, 80, 240, 20, COLOR_CARD)?;
            let fill_w = (240 - 4) * u32::from(progress) / 100;
            if fill_w > 0 {
                fill_rect(target, 42, 82, fill_w, 16, COLOR_ACCENT)?;
            }
            text(
                target,
                &format!("{}%", progress),
                Point::new(CENTER_X, 126),
                &FONT_10X20,
                COLOR_TEXT,
                Alignment::Center,
            )?;
            hint(target, "Scroll: Abort")
        }

        MenuState::Results { result, .. } => {
            menu_header(target, "Test Complete")?;
            fill_round_rect(target, 20, 40, 280, 80, CARD_RADIUS, COLOR_CARD)?;
            text(target, result.name, Point::new(CENTER_X, 62), &FONT_6X10, COLOR_SUBTEXT, Alignment::Center)?;
            let color = if result.success { COLOR_SUCCESS } else { COLOR_DANGER };
            text(target, &result.result, Point::new(CENTER_X, 98), &FONT_10X20, color, Alignment::Center)?;

            fill_round_rect(target, 40, 132, 100, 26, 4, COLOR_ACCENT)?;
            fill_round_rect(target, 180, 132, 100, 26, 4, COLOR_CARD)?;
            text(target, "Retry", Point::new(90, 149), &FONT_6X10, COLOR_TEXT, Alignment::Center)?;
            text(target, "Done", Point::new(230, 149), &FONT_6X10, COLOR_TEXT, Alignment::Center)
        }
    }
}

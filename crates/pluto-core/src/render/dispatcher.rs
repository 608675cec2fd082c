//! Screen + snapshot to draw commands
//!
//! The btc and profit screens are pure functions of the snapshot. The
//! screensaver ignores telemetry entirely and animates from the frame
//! counter plus a small pseudo-random jitter. The error screen blinks its
//! indicator on every other call, independent of wall time.

use alloc::vec::Vec;

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;

use super::colors::{
    COLOR_GOLD, COLOR_GRAY, COLOR_GREEN, COLOR_RAISED, COLOR_RED, COLOR_STAR_DIM, COLOR_TEXT,
    signed_color,
};
use super::commands::{DrawCommand, FontSize, Label, TextDatum, label};
use super::format::{percent, usd};
use super::layout::{
    BANNER_AREA, FOOTER_AREA, MARGIN, PANEL_AREA, PANEL_CENTER, PANEL_HEIGHT, PANEL_WIDTH,
    PRIMARY_AT, SECONDARY_AT, ScreenLayout, TITLE_AT, WELL_AREA, WELL_RADIUS,
};
use super::sparkline::plot;
use crate::display::DisplayScreen;
use crate::telemetry::{BotMode, TelemetrySnapshot};

/// Commands for one full frame
pub type Frame = Vec<DrawCommand>;

const STAR_COUNT: u32 = 24;
const WORDMARK: &str = "PLUTO";
/// Wordmark box in 10x20 glyphs
const WORDMARK_SIZE: Size = Size::new(50, 20);

/// Inset of the polyline inside the chart well
const CHART_INSET: u32 = 8;

/// Builds draw commands for the active screen
#[derive(Debug, Clone)]
pub struct RenderDispatcher {
    frame: u32,
    error_calls: u32,
    rng: u32,
}

impl Default for RenderDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDispatcher {
    pub const fn new() -> Self {
        Self {
            frame: 0,
            error_calls: 0,
            rng: 0x2545_F491,
        }
    }

    /// Number of frames rendered so far
    pub fn frames(&self) -> u32 {
        self.frame
    }

    pub fn render(&mut self, screen: DisplayScreen, snapshot: &TelemetrySnapshot) -> Frame {
        let layout = ScreenLayout::for_screen(screen);
        let mut frame = Frame::new();

        frame.push(DrawCommand::FillRect {
            area: PANEL_AREA,
            color: layout.background,
        });

        // Nothing to show on the btc screen until the first telemetry lands
        if screen == DisplayScreen::Btc && snapshot.last_update.is_none() {
            splash(&mut frame);
        } else {
            if let Some(title) = layout.title {
                text(&mut frame, title, TITLE_AT, TextDatum::TopLeft, FontSize::Medium, layout.accent);
            }

            match screen {
                DisplayScreen::Btc => self.btc(&mut frame, snapshot),
                DisplayScreen::Profit => self.profit(&mut frame, snapshot),
                DisplayScreen::Screensaver => self.screensaver(&mut frame),
                DisplayScreen::Error => self.error(&mut frame),
            }

            if layout.footer {
                footer(&mut frame, snapshot.mode);
            }
        }

        self.frame = self.frame.wrapping_add(1);
        frame
    }

    fn btc(&self, frame: &mut Frame, snapshot: &TelemetrySnapshot) {
        text(
            frame,
            &usd(snapshot.btc_price, false),
            PRIMARY_AT,
            TextDatum::TopLeft,
            FontSize::Large,
            COLOR_TEXT,
        );

        let change_color = signed_color(snapshot.btc_change_24h);
        let mut change: Label = percent(snapshot.btc_change_24h);
        let _ = change.push_str(" 24h");
        text(frame, &change, SECONDARY_AT, TextDatum::TopLeft, FontSize::Medium, change_color);

        frame.push(DrawCommand::FillRoundRect {
            area: WELL_AREA,
            radius: WELL_RADIUS,
            color: COLOR_RAISED,
        });

        let chart = Rectangle::new(
            WELL_AREA.top_left + Point::new(CHART_INSET as i32, CHART_INSET as i32),
            Size::new(
                WELL_AREA.size.width - 2 * CHART_INSET,
                WELL_AREA.size.height - 2 * CHART_INSET,
            ),
        );
        if let Some(points) = plot(&snapshot.sparkline, chart) {
            for pair in points.windows(2) {
                frame.push(DrawCommand::DrawLine {
                    from: pair[0],
                    to: pair[1],
                    color: change_color,
                    width: 2,
                });
            }
        }
    }

    fn profit(&self, frame: &mut Frame, snapshot: &TelemetrySnapshot) {
        let (banner, banner_color) = if snapshot.connected {
            ("ONLINE", COLOR_GREEN)
        } else {
            ("OFFLINE", COLOR_RED)
        };
        frame.push(DrawCommand::FillRoundRect {
            area: BANNER_AREA,
            radius: 4,
            color: banner_color,
        });
        frame.push(DrawCommand::SetTextColor {
            fg: COLOR_TEXT,
            bg: Some(banner_color),
        });
        frame.push(DrawCommand::DrawText {
            text: label(banner),
            at: BANNER_AREA.center(),
            datum: TextDatum::MiddleCenter,
            size: FontSize::Small,
        });

        text(
            frame,
            &usd(snapshot.profit_usd, true),
            PRIMARY_AT,
            TextDatum::TopLeft,
            FontSize::Large,
            signed_color(snapshot.profit_usd),
        );
        text(frame, "total", SECONDARY_AT, TextDatum::TopLeft, FontSize::Small, COLOR_GRAY);

        frame.push(DrawCommand::FillRoundRect {
            area: WELL_AREA,
            radius: WELL_RADIUS,
            color: COLOR_RAISED,
        });
        let inset = WELL_AREA.top_left + Point::new(12, 12);
        text(frame, "TODAY", inset, TextDatum::TopLeft, FontSize::Small, COLOR_GRAY);
        text(
            frame,
            &usd(snapshot.profit_today, true),
            inset + Point::new(0, 20),
            TextDatum::TopLeft,
            FontSize::Large,
            signed_color(snapshot.profit_today),
        );
    }

    fn screensaver(&mut self, frame: &mut Frame) {
        let width = PANEL_WIDTH as i32;
        let height = PANEL_HEIGHT as i32;
        let tick = self.frame as i32;

        for star in 0..STAR_COUNT {
            // Fixed per-star seed for position and speed
            let seed = hash(star);
            let speed = 1 + (seed % 3) as i32;
            let x = ((seed >> 8) as i32 % width)
                .wrapping_add(tick.wrapping_mul(speed))
                .rem_euclid(width);
            let y = (seed >> 20) as i32 % height;

            let twinkle = self.next_random() % 4 == 0;
            frame.push(DrawCommand::DrawCircle {
                center: Point::new(x, y),
                diameter: if twinkle { 3 } else { 1 },
                color: if twinkle { COLOR_TEXT } else { COLOR_STAR_DIM },
                filled: true,
            });
        }

        let span_x = width - WORDMARK_SIZE.width as i32;
        let span_y = height - WORDMARK_SIZE.height as i32;
        let at = Point::new(
            bounce(tick.wrapping_mul(3), span_x),
            bounce(tick.wrapping_mul(2), span_y),
        );
        text(frame, WORDMARK, at, TextDatum::TopLeft, FontSize::Large, COLOR_GOLD);
    }

    fn error(&mut self, frame: &mut Frame) {
        let lit = self.error_calls % 2 == 0;
        self.error_calls = self.error_calls.wrapping_add(1);

        text(
            frame,
            "CONNECTION LOST",
            PANEL_CENTER - Point::new(0, 24),
            TextDatum::MiddleCenter,
            FontSize::Large,
            COLOR_RED,
        );
        text(
            frame,
            "Reconnecting...",
            PANEL_CENTER + Point::new(0, 8),
            TextDatum::MiddleCenter,
            FontSize::Medium,
            COLOR_GRAY,
        );
        frame.push(DrawCommand::DrawCircle {
            center: PANEL_CENTER + Point::new(0, 52),
            diameter: 16,
            color: COLOR_RED,
            filled: lit,
        });
    }

    /// xorshift32
    fn next_random(&mut self) -> u32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        x
    }
}

fn text(frame: &mut Frame, value: &str, at: Point, datum: TextDatum, size: FontSize, color: Rgb565) {
    frame.push(DrawCommand::SetTextColor {
        fg: color,
        bg: None,
    });
    frame.push(DrawCommand::DrawText {
        text: label(value),
        at,
        datum,
        size,
    });
}

/// Launch screen shown before any telemetry has arrived
fn splash(frame: &mut Frame) {
    text(
        frame,
        WORDMARK,
        PANEL_CENTER - Point::new(0, 40),
        TextDatum::MiddleCenter,
        FontSize::Large,
        COLOR_GOLD,
    );
    text(
        frame,
        "LAUNCHER",
        PANEL_CENTER - Point::new(0, 12),
        TextDatum::MiddleCenter,
        FontSize::Large,
        COLOR_GOLD,
    );
    text(
        frame,
        "Connecting...",
        PANEL_CENTER + Point::new(0, 28),
        TextDatum::MiddleCenter,
        FontSize::Medium,
        COLOR_GRAY,
    );
}

fn footer(frame: &mut Frame, mode: BotMode) {
    let color = match mode {
        BotMode::Live => COLOR_GREEN,
        BotMode::Standby => COLOR_GOLD,
        BotMode::Idle => COLOR_GRAY,
        BotMode::Error => COLOR_RED,
    };

    frame.push(DrawCommand::FillRect {
        area: FOOTER_AREA,
        color: COLOR_RAISED,
    });
    let center_y = FOOTER_AREA.center().y;
    frame.push(DrawCommand::DrawCircle {
        center: Point::new(MARGIN + 4, center_y),
        diameter: 8,
        color,
        filled: true,
    });
    text(
        frame,
        mode.label(),
        Point::new(MARGIN + 16, center_y - 5),
        TextDatum::TopLeft,
        FontSize::Small,
        color,
    );
}

/// Triangle wave over `0..=span`
fn bounce(step: i32, span: i32) -> i32 {
    if span <= 0 {
        return 0;
    }
    let phase = step.rem_euclid(2 * span);
    if phase > span { 2 * span - phase } else { phase }
}

/// Integer hash for stable per-star seeds
fn hash(value: u32) -> u32 {
    let mut x = value.wrapping_mul(0x9E37_79B9) ^ 0x85EB_CA6B;
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x
}

//! Screen rotation rules
//!
//! Evaluated once per scheduler tick. A faulted link overrides everything
//! and holds the error screen until it recovers, then the rotation resumes
//! at btc. Otherwise the first matching rule fires:
//!
//! 1. idle mode and not on the screensaver: go to the screensaver
//! 2. not idle but still on the screensaver: back to btc
//! 3. btc dwell elapsed: profit
//! 4. profit dwell elapsed: btc
//!
//! Every transition restarts the dwell timer.

use embassy_time::{Duration, Instant};
use log::info;

use super::{DisplayScreen, ScreenTimings};
use crate::telemetry::BotMode;

#[derive(Debug, Clone)]
pub struct DisplayStateMachine {
    timings: ScreenTimings,
    screen: DisplayScreen,
    entered_at: Instant,
}

impl DisplayStateMachine {
    pub fn new(timings: ScreenTimings, now: Instant) -> Self {
        Self {
            timings,
            screen: DisplayScreen::Btc,
            entered_at: now,
        }
    }

    /// Apply the rotation rules; returns the new screen on a transition
    pub fn evaluate(
        &mut self,
        mode: BotMode,
        link_faulted: bool,
        now: Instant,
    ) -> Option<DisplayScreen> {
        let next = self.next_screen(mode, link_faulted, now)?;

        info!(
            "Screen {} -> {} after {} ms",
            self.screen.label(),
            next.label(),
            self.elapsed(now).as_millis()
        );
        self.screen = next;
        self.entered_at = now;
        Some(next)
    }

    pub fn screen(&self) -> DisplayScreen {
        self.screen
    }

    pub fn entered_at(&self) -> Instant {
        self.entered_at
    }

    /// Time spent on the current screen
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    fn dwell_elapsed(&self, now: Instant) -> bool {
        self.timings
            .dwell(self.screen)
            .is_some_and(|dwell| self.elapsed(now) >= dwell)
    }

    fn next_screen(&self, mode: BotMode, link_faulted: bool, now: Instant) -> Option<DisplayScreen> {
        if link_faulted {
            return (self.screen != DisplayScreen::Error).then_some(DisplayScreen::Error);
        }
        if self.screen == DisplayScreen::Error {
            return Some(DisplayScreen::Btc);
        }

        let idle = mode == BotMode::Idle;
        match self.screen {
            screen if idle && screen != DisplayScreen::Screensaver => {
                Some(DisplayScreen::Screensaver)
            }
            DisplayScreen::Screensaver if !idle => Some(DisplayScreen::Btc),
            DisplayScreen::Btc if self.dwell_elapsed(now) => Some(DisplayScreen::Profit),
            DisplayScreen::Profit if self.dwell_elapsed(now) => Some(DisplayScreen::Btc),
            _ => None,
        }
    }
}

//! Screen selection
//!
//! The panel shows exactly one [`DisplayScreen`] at a time. Which one is
//! decided by [`DisplayStateMachine`] from the bot mode, link health and
//! how long the current screen has been up.

pub mod state_machine;

use embassy_time::Duration;

pub use state_machine::DisplayStateMachine;

/// Mutually exclusive full-panel screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayScreen {
    /// Price, 24h change and sparkline
    #[default]
    Btc,
    /// Total and today's profit with link banner
    Profit,
    /// Decorative animation while the bot is idle
    Screensaver,
    /// Link lost; shown until the connection recovers
    Error,
}

impl DisplayScreen {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayScreen::Btc => "btc",
            DisplayScreen::Profit => "profit",
            DisplayScreen::Screensaver => "screensaver",
            DisplayScreen::Error => "error",
        }
    }
}

/// Dwell durations per screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenTimings {
    pub btc_dwell: Duration,
    pub profit_dwell: Duration,
    /// Screensaver exit is event driven; this only bounds how often the
    /// idle state is re-checked
    pub screensaver_poll: Duration,
}

impl ScreenTimings {
    /// Dwell for `screen`; `None` for the error screen, which stays up
    /// until recovery
    pub fn dwell(&self, screen: DisplayScreen) -> Option<Duration> {
        match screen {
            DisplayScreen::Btc => Some(self.btc_dwell),
            DisplayScreen::Profit => Some(self.profit_dwell),
            DisplayScreen::Screensaver => Some(self.screensaver_poll),
            DisplayScreen::Error => None,
        }
    }
}

impl Default for ScreenTimings {
    fn default() -> Self {
        Self {
            btc_dwell: Duration::from_millis(8_000),
            profit_dwell: Duration::from_millis(8_000),
            screensaver_poll: Duration::from_millis(15_000),
        }
    }
}

//! Telemetry snapshot value types

use core::fmt;

use embassy_time::Instant;
use heapless::Deque;
use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};

/// Maximum number of price points kept for the sparkline
pub const SPARKLINE_CAPACITY: usize = 20;

/// Trading bot mode as reported by the backend
///
/// Coded as a lowercase string on the wire. Unknown strings decode to
/// [`BotMode::Standby`] instead of failing the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotMode {
    /// Bot connected but not trading (initial state)
    #[default]
    Standby,
    /// Bot actively trading
    Live,
    /// Nothing to show, display should fall back to the screensaver
    Idle,
    /// Backend reported a bot-side failure
    Error,
}

impl BotMode {
    /// Map a wire string onto a mode, falling back to `Standby`
    pub fn from_wire(value: &str) -> Self {
        match value {
            "standby" => Self::Standby,
            "live" => Self::Live,
            "idle" => Self::Idle,
            "error" => Self::Error,
            _ => Self::Standby,
        }
    }

    /// Wire representation of this mode
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Standby => "standby",
            Self::Live => "live",
            Self::Idle => "idle",
            Self::Error => "error",
        }
    }

    /// Upper-case label used on the panel footer
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standby => "STANDBY",
            Self::Live => "LIVE",
            Self::Idle => "IDLE",
            Self::Error => "ERROR",
        }
    }
}

impl<'de> Deserialize<'de> for BotMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModeVisitor;

        impl Visitor<'_> for ModeVisitor {
            type Value = BotMode;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a bot mode string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<BotMode, E> {
                Ok(BotMode::from_wire(value))
            }
        }

        deserializer.deserialize_str(ModeVisitor)
    }
}

/// Bounded, chronologically ordered price history
///
/// Behaves as a ring: pushing into a full sparkline evicts the oldest value.
#[derive(Debug, Clone)]
pub struct Sparkline {
    points: Deque<f32, SPARKLINE_CAPACITY>,
}

impl Sparkline {
    pub const fn new() -> Self {
        Self {
            points: Deque::new(),
        }
    }

    /// Append a value, evicting the oldest one when full
    pub fn push(&mut self, value: f32) {
        if self.points.is_full() {
            self.points.pop_front();
        }
        // Cannot fail: a slot was freed above
        let _ = self.points.push_back(value);
    }

    /// Append every value in order
    pub fn extend_from(&mut self, other: &Sparkline) {
        for value in other.iter() {
            self.push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Values from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.points.iter().copied()
    }

    /// Smallest and largest value, `None` when empty
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.iter();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

impl Default for Sparkline {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Sparkline {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl FromIterator<f32> for Sparkline {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        let mut sparkline = Sparkline::new();
        for value in iter {
            sparkline.push(value);
        }
        sparkline
    }
}

/// Accepts arrays of any length; only the newest values are kept.
/// Non-finite entries are dropped.
impl<'de> Deserialize<'de> for Sparkline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SparklineVisitor;

        impl<'de> Visitor<'de> for SparklineVisitor {
            type Value = Sparkline;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of numbers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Sparkline, A::Error> {
                let mut sparkline = Sparkline::new();
                while let Some(value) = seq.next_element::<f32>()? {
                    if let Some(value) = clamp_finite(value) {
                        sparkline.push(value);
                    }
                }
                Ok(sparkline)
            }
        }

        deserializer.deserialize_seq(SparklineVisitor)
    }
}

/// Clamp a backend value into the finite `f32` range
///
/// NaN carries no information and yields `None`; infinities saturate.
pub fn clamp_finite(value: f32) -> Option<f32> {
    if value.is_nan() {
        None
    } else {
        Some(value.clamp(f32::MIN, f32::MAX))
    }
}

/// Most recently known telemetry, as rendered on the panel
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    /// Spot BTC price in USD
    pub btc_price: f32,
    /// 24h BTC change in percent (signed)
    pub btc_change_24h: f32,
    /// Total portfolio profit in USD (signed)
    pub profit_usd: f32,
    /// Profit since the start of the trading day in USD (signed)
    pub profit_today: f32,
    pub mode: BotMode,
    pub sparkline: Sparkline,
    /// Time of the last applied message, `None` until the first one
    pub last_update: Option<Instant>,
    /// Whether the backend link is currently up
    pub connected: bool,
}

impl TelemetrySnapshot {
    pub const fn new() -> Self {
        Self {
            btc_price: 0.0,
            btc_change_24h: 0.0,
            profit_usd: 0.0,
            profit_today: 0.0,
            mode: BotMode::Standby,
            sparkline: Sparkline::new(),
            last_update: None,
            connected: false,
        }
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

//! Inbound wire messages from the backend
//!
//! Every frame is a JSON object carrying a `type` discriminant. Only
//! `telemetry` frames update the store; `pong` answers the heartbeat and
//! anything else (trade signals, order notifications) is ignored.
//!
//! ```text
//! { "type": "telemetry", "btc_price": 67250.5, "btc_change_24h": -1.2,
//!   "profit_usd": 1520.0, "profit_today": -12.5, "mode": "live",
//!   "sparkline": [67100.0, 67180.5, ...] }
//! ```
//!
//! Unknown fields are ignored and every telemetry field is optional.

use serde::Deserialize;
use thiserror_no_std::Error;

use super::snapshot::{BotMode, Sparkline, clamp_finite};

/// Discriminant of telemetry frames
pub const TELEMETRY_TYPE: &str = "telemetry";

/// Discriminant of heartbeat replies
pub const PONG_TYPE: &str = "pong";

/// Text frame the backend answers with a pong
pub const PING_FRAME: &str = "ping";

/// Errors raised while decoding an inbound payload
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not valid JSON or a field has the wrong shape
    #[error("Malformed payload: {0}")]
    Malformed(serde_json_core::de::Error),
    /// Payload decoded but is not a telemetry message
    #[error("Unexpected message type")]
    UnexpectedType,
}

/// Routing class of an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Telemetry,
    Pong,
    /// Any other discriminant; dropped without error
    Other,
}

#[derive(Deserialize)]
struct Envelope<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct WireTelemetry<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(default)]
    btc_price: Option<f32>,
    #[serde(default)]
    btc_change_24h: Option<f32>,
    #[serde(default)]
    profit_usd: Option<f32>,
    #[serde(default)]
    profit_today: Option<f32>,
    #[serde(default)]
    mode: Option<BotMode>,
    #[serde(default)]
    sparkline: Option<Sparkline>,
}

/// Partial update decoded from a telemetry frame
///
/// `None` means the field was absent (or NaN) and the previous value stays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryUpdate {
    pub btc_price: Option<f32>,
    pub btc_change_24h: Option<f32>,
    pub profit_usd: Option<f32>,
    pub profit_today: Option<f32>,
    pub mode: Option<BotMode>,
    pub sparkline: Option<Sparkline>,
}

/// Read only the `type` discriminant of a frame
pub fn peek_kind(raw: &str) -> Result<MessageKind, DecodeError> {
    let (envelope, _) =
        serde_json_core::from_str::<Envelope<'_>>(raw).map_err(DecodeError::Malformed)?;

    Ok(match envelope.kind {
        TELEMETRY_TYPE => MessageKind::Telemetry,
        PONG_TYPE => MessageKind::Pong,
        _ => MessageKind::Other,
    })
}

/// Decode a full telemetry frame into a partial update
pub fn decode_telemetry(raw: &str) -> Result<TelemetryUpdate, DecodeError> {
    let (wire, _) =
        serde_json_core::from_str::<WireTelemetry<'_>>(raw).map_err(DecodeError::Malformed)?;

    if wire.kind != TELEMETRY_TYPE {
        return Err(DecodeError::UnexpectedType);
    }

    Ok(TelemetryUpdate {
        btc_price: wire.btc_price.and_then(clamp_finite),
        btc_change_24h: wire.btc_change_24h.and_then(clamp_finite),
        profit_usd: wire.profit_usd.and_then(clamp_finite),
        profit_today: wire.profit_today.and_then(clamp_finite),
        mode: wire.mode,
        sparkline: wire.sparkline,
    })
}

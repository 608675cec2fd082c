//! Telemetry model, wire decoding and the snapshot store

pub mod message;
pub mod snapshot;
pub mod store;

pub use message::{
    DecodeError, MessageKind, PING_FRAME, TelemetryUpdate, decode_telemetry, peek_kind,
};
pub use snapshot::{BotMode, SPARKLINE_CAPACITY, Sparkline, TelemetrySnapshot};
pub use store::{SharedTelemetryStore, TelemetryStore};

//! Hardware-independent core library for the Pluto market display
//!
//! This crate owns everything on the device that has state, timing, or
//! failure handling: the latest telemetry snapshot pushed by the backend,
//! connection supervision (reconnect and heartbeat), the screen rotation
//! state machine, and the render dispatcher that turns a screen plus a
//! snapshot into draw commands.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests). The
//! network transport and the panel driver are injected as the [`Transport`]
//! and [`Canvas`] capabilities.
//!
//! [`Transport`]: connection::Transport
//! [`Canvas`]: render::Canvas

#![no_std]

extern crate alloc;

pub mod app_state;
pub mod config;
pub mod connection;
pub mod display;
pub mod render;
pub mod scheduler;
pub mod telemetry;

pub use app_state::AppError;
pub use config::{Config, ConfigError};
pub use connection::{ConnectionState, ConnectionSupervisor, Transport, TransportError};
pub use display::{DisplayScreen, DisplayStateMachine};
pub use render::{Canvas, DrawCommand, RenderDispatcher};
pub use scheduler::{Scheduler, SchedulerSettings, TickOutcome};
pub use telemetry::{BotMode, DecodeError, TelemetrySnapshot, TelemetryStore};

//! Desktop simulator for the Pluto market display.
//!
//! Runs the pluto-core scheduler against an SDL2 window via
//! `embedded-graphics-simulator`. An in-process mock backend plays the
//! server side of the link: it accepts connects, answers `ping` with
//! `pong` and broadcasts telemetry every 5 seconds in the same shape as
//! the real backend.
//!
//! # Key bindings
//!
//! | Key | Action                                   |
//! |-----|------------------------------------------|
//! | I   | Toggle bot mode between live and idle    |
//! | D   | Drop the connection                      |
//! | M   | Send a malformed frame                   |
//! | S   | Silence the backend (heartbeat expiry)   |
//! | Q   | Quit                                     |
//!
//! Set `PLUTO_CONFIG` to a JSON config file to override the defaults.

use std::collections::VecDeque;
use std::fmt::Write;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info, warn};

use pluto_core::config::{Config, WifiConfig};
use pluto_core::connection::{TransportChannels, TransportCommand, TransportEvent};
use pluto_core::render::{GraphicsCanvas, PANEL_HEIGHT, PANEL_WIDTH};
use pluto_core::telemetry::{PING_FRAME, SPARKLINE_CAPACITY};
use pluto_core::{AppError, Scheduler, TransportError};

// ---------------------------------------------------------------------------
// Simulator constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Interval between telemetry broadcasts, matching the backend.
const BROADCAST_INTERVAL: Duration = Duration::from_secs(5);

/// Every third broadcast is followed by a message the display ignores.
const TRADE_SIGNAL_EVERY: u32 = 3;

const CONFIG_ENV: &str = "PLUTO_CONFIG";

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

/// Server side of the link, stepped once per frame.
struct MockBackend {
    started: Instant,
    connected: bool,
    silenced: bool,
    idle: bool,
    last_broadcast: Option<Instant>,
    broadcasts: u32,
    history: VecDeque<f32>,
    profit_usd: f32,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            connected: false,
            silenced: false,
            idle: false,
            last_broadcast: None,
            broadcasts: 0,
            history: VecDeque::with_capacity(SPARKLINE_CAPACITY),
            profit_usd: 1520.0,
        }
    }

    fn send(&self, channels: &TransportChannels, event: TransportEvent) {
        if channels.inbound.try_send(event).is_err() {
            warn!("Inbound queue full, frame dropped");
        }
    }

    fn send_text(&self, channels: &TransportChannels, text: &str) {
        self.send(channels, TransportEvent::Text(text.to_string()));
    }

    /// Handle commands from the display and broadcast when due.
    fn step(&mut self, channels: &TransportChannels) {
        while let Ok(command) = channels.outbound.try_receive() {
            match command {
                TransportCommand::Connect(endpoint) => {
                    info!("Backend: accepting connection to {}", endpoint);
                    self.connected = true;
                    self.silenced = false;
                    self.last_broadcast = None;
                    self.send(channels, TransportEvent::Connected);
                }
                TransportCommand::SendText(text) if text == PING_FRAME => {
                    if self.connected && !self.silenced {
                        self.send_text(channels, r#"{"type":"pong"}"#);
                    }
                }
                TransportCommand::SendText(text) => {
                    info!("Backend: ignoring frame {:?}", text);
                }
                TransportCommand::Close => {
                    info!("Backend: connection closed by display");
                    self.connected = false;
                }
            }
        }

        if !self.connected || self.silenced {
            return;
        }

        let due = self
            .last_broadcast
            .is_none_or(|at| at.elapsed() >= BROADCAST_INTERVAL);
        if due {
            self.broadcast(channels);
        }
    }

    fn broadcast(&mut self, channels: &TransportChannels) {
        let t = self.started.elapsed().as_secs_f64();

        // Slow drift with a faster wobble, like a quiet market
        let price = 67_000.0 + 400.0 * (t / 60.0).sin() + 80.0 * (t / 7.0).cos();
        let change = 2.5 * (t / 300.0).sin();
        let profit_today = 40.0 * (t / 90.0).sin() - 5.0;
        self.profit_usd += (profit_today / 100.0) as f32;

        if self.history.len() == SPARKLINE_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(price as f32);

        let mut sparkline = String::new();
        for (i, value) in self.history.iter().enumerate() {
            if i > 0 {
                sparkline.push(',');
            }
            let _ = write!(sparkline, "{:.2}", value);
        }

        let mode = if self.idle { "idle" } else { "live" };
        let message = format!(
            r#"{{"type":"telemetry","btc_price":{:.2},"btc_change_24h":{:.2},"profit_usd":{:.2},"profit_today":{:.2},"mode":"{}","sparkline":[{}]}}"#,
            price, change, self.profit_usd, profit_today, mode, sparkline
        );
        self.send_text(channels, &message);

        self.broadcasts += 1;
        if self.broadcasts % TRADE_SIGNAL_EVERY == 0 {
            self.send_text(
                channels,
                r#"{"type":"trade_signal","symbol":"BTCUSD","side":"buy","confidence":0.72}"#,
            );
        }
        self.last_broadcast = Some(Instant::now());
    }

    fn toggle_idle(&mut self, channels: &TransportChannels) {
        self.idle = !self.idle;
        info!("Backend: mode {}", if self.idle { "idle" } else { "live" });
        if self.connected && !self.silenced {
            self.broadcast(channels);
        }
    }

    fn drop_connection(&mut self, channels: &TransportChannels) {
        if self.connected {
            info!("Backend: dropping connection");
            self.connected = false;
            self.send(channels, TransportEvent::Disconnected(TransportError::Closed));
        }
    }

    fn send_malformed(&self, channels: &TransportChannels) {
        if self.connected {
            info!("Backend: sending malformed frame");
            self.send_text(channels, r#"{"type":"telemetry","btc_price":"#);
        }
    }

    fn toggle_silence(&mut self) {
        self.silenced = !self.silenced;
        info!(
            "Backend: {}",
            if self.silenced { "silenced" } else { "talking again" }
        );
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn simulator_defaults() -> Config<'static> {
    Config {
        wifi: WifiConfig {
            ssid: "simulator",
            password: "",
        },
        ..Config::default()
    }
}

/// Read the file named by `PLUTO_CONFIG`, if any.
fn read_config_file() -> Option<Vec<u8>> {
    let path = std::env::var(CONFIG_ENV).ok()?;
    match std::fs::read(&path) {
        Ok(bytes) => {
            info!("Loading config from {}", path);
            Some(bytes)
        }
        Err(e) => {
            error!("Cannot read {}: {}", path, e);
            None
        }
    }
}

/// Decode and validate a config file
fn load_config(raw: &[u8]) -> Result<Config<'_>, AppError> {
    let config = Config::parse(raw)?;
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting Pluto simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        PANEL_WIDTH, PANEL_HEIGHT, WINDOW_SCALE
    );
    info!("Keys: I=Idle  D=Drop  M=Malformed  S=Silence  Q=Quit");

    let raw_config = read_config_file();
    let config = match raw_config.as_deref() {
        Some(raw) => load_config(raw).unwrap_or_else(|e| {
            error!("Config rejected, using defaults: {}", e);
            simulator_defaults()
        }),
        None => simulator_defaults(),
    };

    let display = SimulatorDisplay::<Rgb565>::new(Size::new(PANEL_WIDTH, PANEL_HEIGHT));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Pluto Simulator", &output_settings);

    let channels = TransportChannels::new();
    let mut backend = MockBackend::new();
    let mut scheduler = Scheduler::new(
        &config,
        channels.transport(),
        GraphicsCanvas::new(display),
        embassy_time::Instant::now(),
    );
    let tick_yield = Duration::from_millis(scheduler.settings().tick_yield.as_millis());

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    if let Err(e) = scheduler.tick(embassy_time::Instant::now()) {
        error!("Draw error: {:?}", e);
    }
    window.update(scheduler.canvas().target());

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::I => backend.toggle_idle(&channels),
                    Keycode::D => backend.drop_connection(&channels),
                    Keycode::M => backend.send_malformed(&channels),
                    Keycode::S => backend.toggle_silence(),
                    _ => {}
                },

                _ => {}
            }
        }

        // --- Backend ------------------------------------------------------
        backend.step(&channels);

        // --- Scheduler tick -----------------------------------------------
        match scheduler.tick(embassy_time::Instant::now()) {
            Ok(outcome) if outcome.transitioned => {
                let stats = scheduler.supervisor().stats();
                info!(
                    "Screen {:?}, link {:?} (applied={} ignored={} decode_errors={})",
                    outcome.screen,
                    outcome.connection,
                    stats.messages_applied,
                    stats.messages_ignored,
                    stats.decode_errors
                );
            }
            Ok(_) => {}
            Err(e) => error!("Draw error: {:?}", e),
        }

        window.update(scheduler.canvas().target());

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < tick_yield {
            std::thread::sleep(tick_yield - elapsed);
        }
    }

    info!("Simulator exiting");
}

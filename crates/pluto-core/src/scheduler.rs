//! Cooperative main loop
//!
//! One iteration services the connection, re-evaluates the screen and
//! redraws when the render interval has passed or the screen changed.
//! Everything runs on one execution context, so telemetry written while
//! servicing the link is always visible to the render in the same tick.

use embassy_time::{Duration, Instant, Timer};
use log::{debug, error};

use crate::config::{Config, ConfigError};
use crate::connection::{ConnectionState, ConnectionSupervisor, Transport};
use crate::display::{DisplayScreen, DisplayStateMachine};
use crate::render::{Canvas, RenderDispatcher, execute};
use crate::telemetry::TelemetryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Minimum spacing between regular redraws
    pub render_interval: Duration,
    /// Pause between loop iterations
    pub tick_yield: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            render_interval: Duration::from_millis(1_000),
            tick_yield: Duration::from_millis(10),
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub screen: DisplayScreen,
    pub connection: ConnectionState,
    /// The screen changed during this tick
    pub transitioned: bool,
    pub rendered: bool,
}

pub struct Scheduler<T: Transport, C: Canvas> {
    settings: SchedulerSettings,
    store: TelemetryStore,
    supervisor: ConnectionSupervisor<T>,
    display: DisplayStateMachine,
    dispatcher: RenderDispatcher,
    canvas: C,
    last_render: Option<Instant>,
}

impl<T: Transport, C: Canvas> Scheduler<T, C> {
    /// Wire every component from the startup configuration
    ///
    /// An invalid configuration is logged and the display starts on the
    /// error screen. Timings then fall back to the defaults, and the link
    /// is still retried unless the backend address itself is unusable.
    pub fn new(config: &Config<'_>, transport: T, canvas: C, now: Instant) -> Self {
        let defaults = Config::default();
        let validation = config.validate();

        let (timings, endpoint) = match &validation {
            Ok(()) => (config, config.endpoint().ok()),
            Err(ConfigError::MissingWifiSsid | ConfigError::InvalidTiming { .. }) => {
                (&defaults, config.endpoint().ok())
            }
            Err(_) => (&defaults, None),
        };

        let mut supervisor =
            ConnectionSupervisor::new(transport, endpoint, timings.supervisor_settings());
        if let Err(error) = &validation {
            supervisor.report_config_error(error);
        }

        Self {
            settings: timings.scheduler_settings(),
            store: TelemetryStore::new(),
            supervisor,
            display: DisplayStateMachine::new(timings.screen_timings(), now),
            dispatcher: RenderDispatcher::new(),
            canvas,
            last_render: None,
        }
    }

    /// One loop iteration; never blocks
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome, C::Error> {
        self.supervisor.service(now, &mut self.store);

        let mode = self.store.current().mode;
        let transitioned = self
            .display
            .evaluate(mode, self.supervisor.link_faulted(), now)
            .is_some();
        let screen = self.display.screen();

        let due = self
            .last_render
            .is_none_or(|at| now.saturating_duration_since(at) >= self.settings.render_interval);
        let rendered = due || transitioned;

        if rendered {
            let frame = self.dispatcher.render(screen, self.store.current());
            execute(&frame, &mut self.canvas)?;
            self.canvas.flush()?;
            self.last_render = Some(now);
            debug!("Rendered {} ({} commands)", screen.label(), frame.len());
        }

        Ok(TickOutcome {
            screen,
            connection: self.supervisor.state(),
            transitioned,
            rendered,
        })
    }

    /// Run forever on the `embassy-time` clock
    ///
    /// Draw failures are logged and the loop carries on.
    pub async fn run(&mut self)
    where
        C::Error: core::fmt::Debug,
    {
        loop {
            if let Err(err) = self.tick(Instant::now()) {
                error!("Render failed: {:?}", err);
            }
            Timer::after(self.settings.tick_yield).await;
        }
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    pub fn store(&self) -> &TelemetryStore {
        &self.store
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<T> {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut ConnectionSupervisor<T> {
        &mut self.supervisor
    }

    pub fn display(&self) -> &DisplayStateMachine {
        &self.display
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WifiConfig;
    use crate::connection::TransportEvent;
    use crate::connection::supervisor::tests::MockTransport;
    use crate::render::RecordingCanvas;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn config() -> Config<'static> {
        Config {
            wifi: WifiConfig {
                ssid: "pluto",
                password: "secret",
            },
            ..Config::default()
        }
    }

    fn scheduler(config: &Config<'_>) -> Scheduler<MockTransport, RecordingCanvas> {
        Scheduler::new(config, MockTransport::default(), RecordingCanvas::new(), at(0))
    }

    #[test]
    fn test_render_cadence() {
        let mut scheduler = scheduler(&config());

        assert!(scheduler.tick(at(0)).unwrap().rendered);
        assert!(!scheduler.tick(at(10)).unwrap().rendered);
        assert!(!scheduler.tick(at(999)).unwrap().rendered);
        assert!(scheduler.tick(at(1_000)).unwrap().rendered);
        assert_eq!(scheduler.canvas().flushes, 2);
    }

    #[test]
    fn test_splash_until_first_telemetry() {
        let mut scheduler = scheduler(&config());
        scheduler.tick(at(0)).unwrap();
        assert!(scheduler.canvas().texts().any(|text| text == "Connecting..."));

        let transport = scheduler.supervisor_mut().transport_mut();
        transport.push(TransportEvent::Connected);
        transport.push_text(r#"{"type":"telemetry","btc_price":67250.5}"#);
        scheduler.tick(at(10)).unwrap();
        scheduler.canvas_mut().clear();
        scheduler.tick(at(1_010)).unwrap();

        let texts: alloc::vec::Vec<&str> = scheduler.canvas().texts().collect();
        assert!(texts.contains(&"$67,250.50"));
        assert!(!texts.contains(&"Connecting..."));
    }

    #[test]
    fn test_screen_change_forces_render() {
        let mut scheduler = scheduler(&config());
        scheduler.tick(at(0)).unwrap();
        scheduler
            .supervisor_mut()
            .transport_mut()
            .push(TransportEvent::Connected);
        scheduler.tick(at(10)).unwrap();

        scheduler
            .supervisor_mut()
            .transport_mut()
            .push(TransportEvent::Disconnected(crate::TransportError::Closed));
        let outcome = scheduler.tick(at(20)).unwrap();

        assert_eq!(outcome.screen, DisplayScreen::Error);
        assert_eq!(outcome.connection, ConnectionState::Disconnected);
        assert!(outcome.transitioned);
        assert!(outcome.rendered);
        assert!(scheduler.canvas().texts().any(|text| text == "CONNECTION LOST"));
    }

    #[test]
    fn test_invalid_config_starts_on_error_screen() {
        let config = Config::default();
        let mut scheduler = scheduler(&config);

        let outcome = scheduler.tick(at(0)).unwrap();
        assert_eq!(outcome.screen, DisplayScreen::Error);
        // Missing SSID does not stop the link from being tried
        assert_eq!(scheduler.supervisor().transport().connects, 1);
        assert_eq!(scheduler.settings(), SchedulerSettings::default());
    }

    #[test]
    fn test_bad_backend_address_never_connects() {
        let mut config = config();
        config.backend.host = "";
        let mut scheduler = scheduler(&config);

        for ms in (0..20_000).step_by(100) {
            let outcome = scheduler.tick(at(ms)).unwrap();
            assert_eq!(outcome.screen, DisplayScreen::Error);
        }
        assert_eq!(scheduler.supervisor().transport().connects, 0);
        assert!(scheduler.supervisor().stats().connect_attempts > 1);
    }

    #[test]
    fn test_zero_timing_falls_back_to_defaults() {
        let mut config = config();
        config.display.render_interval_ms = 0;
        let scheduler = scheduler(&config);

        assert_eq!(
            scheduler.settings().render_interval,
            Duration::from_millis(1_000)
        );
    }
}

//! Connection supervisor
//!
//! Owns the [`ConnectionState`] machine for the single backend link:
//!
//! ```text
//! Connecting --connected--> Connected --closed/error/heartbeat--> Disconnected
//!     ^                                                              |
//!     +------------------ Backoff <------- (next service pass) ------+
//! ```
//!
//! Failures are never fatal: the link is retried forever. Inbound frames
//! are routed by their `type` discriminant and telemetry is written into the
//! [`TelemetryStore`]. Malformed frames are counted and dropped without
//! touching the connection.

use embassy_time::{Duration, Instant};
use log::{debug, error, info, warn};

use super::backoff::{Backoff, ReconnectPolicy};
use super::heartbeat::{HeartbeatAction, HeartbeatMonitor};
use super::{ConnectionState, Transport, TransportError, TransportEvent};
use crate::config::{ConfigError, Endpoint};
use crate::telemetry::{MessageKind, PING_FRAME, TelemetryStore, peek_kind};

/// Upper bound on transport events handled in one service pass
pub const MAX_EVENTS_PER_TICK: usize = 16;

/// Timing knobs for the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub reconnect: ReconnectPolicy,
    pub connect_timeout: Duration,
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
    pub missed_pong_limit: u8,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            connect_timeout: Duration::from_millis(5_000),
            ping_interval: Duration::from_millis(15_000),
            pong_timeout: Duration::from_millis(3_000),
            missed_pong_limit: 2,
        }
    }
}

/// Counters for link health, exposed for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub messages_applied: u32,
    pub messages_ignored: u32,
    pub decode_errors: u32,
    pub connect_attempts: u32,
    pub disconnects: u32,
    pub heartbeat_expiries: u32,
}

pub struct ConnectionSupervisor<T: Transport> {
    transport: T,
    endpoint: Option<Endpoint>,
    settings: SupervisorSettings,
    state: ConnectionState,
    state_since: Instant,
    /// Set while an attempt is in flight
    attempt_deadline: Option<Instant>,
    retry_at: Instant,
    /// True from the first failure until the next successful connect
    faulted: bool,
    last_error: Option<TransportError>,
    backoff: Backoff,
    heartbeat: HeartbeatMonitor,
    stats: SupervisorStats,
}

impl<T: Transport> ConnectionSupervisor<T> {
    /// Create a supervisor in `Connecting`; the first attempt starts on the
    /// first [`service`](Self::service) call.
    ///
    /// Without an endpoint every attempt fails immediately and is retried
    /// on the backoff schedule.
    pub fn new(transport: T, endpoint: Option<Endpoint>, settings: SupervisorSettings) -> Self {
        Self {
            transport,
            endpoint,
            settings,
            state: ConnectionState::Connecting,
            state_since: Instant::from_ticks(0),
            attempt_deadline: None,
            retry_at: Instant::from_ticks(0),
            faulted: false,
            last_error: None,
            backoff: Backoff::new(settings.reconnect),
            heartbeat: HeartbeatMonitor::new(
                settings.ping_interval,
                settings.pong_timeout,
                settings.missed_pong_limit,
            ),
            stats: SupervisorStats::default(),
        }
    }

    /// Surface a startup configuration problem
    ///
    /// The error screen shows until a connection succeeds; attempts keep
    /// running on the normal schedule.
    pub fn report_config_error(&mut self, error: &ConfigError) {
        error!("Configuration error: {}", error);
        self.faulted = true;
    }

    /// One non-blocking maintenance pass
    pub fn service(&mut self, now: Instant, store: &mut TelemetryStore) {
        match self.state {
            ConnectionState::Connecting if self.attempt_deadline.is_none() => {
                self.begin_attempt(now, store);
            }
            ConnectionState::Disconnected => self.schedule_retry(now),
            ConnectionState::Backoff if now >= self.retry_at => {
                self.begin_attempt(now, store);
            }
            _ => {}
        }

        self.drain_events(now, store);

        match self.state {
            ConnectionState::Connecting => self.check_attempt_timeout(now, store),
            ConnectionState::Connected => self.drive_heartbeat(now, store),
            _ => {}
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// When the current state was entered
    pub fn state_since(&self) -> Instant {
        self.state_since
    }

    /// Whether the display should show the error screen
    pub fn link_faulted(&self) -> bool {
        self.faulted
    }

    pub fn last_error(&self) -> Option<TransportError> {
        self.last_error
    }

    pub fn stats(&self) -> SupervisorStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn transition(&mut self, next: ConnectionState, now: Instant) {
        if self.state != next {
            debug!("Connection {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        self.state_since = now;
    }

    fn begin_attempt(&mut self, now: Instant, store: &mut TelemetryStore) {
        self.stats.connect_attempts = self.stats.connect_attempts.saturating_add(1);
        self.transition(ConnectionState::Connecting, now);

        let Some(endpoint) = self.endpoint.as_ref() else {
            warn!("No usable backend endpoint configured");
            self.enter_disconnected(now, store, TransportError::ConnectFailed);
            return;
        };

        info!("Connecting to {}", endpoint);
        match self.transport.connect(endpoint) {
            Ok(()) => self.attempt_deadline = Some(now + self.settings.connect_timeout),
            Err(error) => self.enter_disconnected(now, store, error),
        }
    }

    fn check_attempt_timeout(&mut self, now: Instant, store: &mut TelemetryStore) {
        if let Some(deadline) = self.attempt_deadline {
            if now >= deadline {
                self.transport.close();
                self.enter_disconnected(now, store, TransportError::ConnectTimeout);
            }
        }
    }

    fn schedule_retry(&mut self, now: Instant) {
        let delay = self.backoff.next_delay();
        self.retry_at = now + delay;
        info!(
            "Reconnecting in {} ms (failures={})",
            delay.as_millis(),
            self.backoff.consecutive_failures()
        );
        self.transition(ConnectionState::Backoff, now);
    }

    fn enter_connected(&mut self, now: Instant, store: &mut TelemetryStore) {
        info!("Backend connected");
        self.transition(ConnectionState::Connected, now);
        self.attempt_deadline = None;
        self.faulted = false;
        self.last_error = None;
        self.backoff.reset();
        self.heartbeat.reset(now);
        store.set_connected(true);
    }

    fn enter_disconnected(&mut self, now: Instant, store: &mut TelemetryStore, error: TransportError) {
        warn!("Backend link down: {}", error);
        self.transition(ConnectionState::Disconnected, now);
        self.attempt_deadline = None;
        self.faulted = true;
        self.last_error = Some(error);
        self.stats.disconnects = self.stats.disconnects.saturating_add(1);
        store.set_connected(false);
    }

    fn drain_events(&mut self, now: Instant, store: &mut TelemetryStore) {
        for _ in 0..MAX_EVENTS_PER_TICK {
            let Some(event) = self.transport.poll() else {
                break;
            };

            match (self.state, event) {
                (ConnectionState::Connecting, TransportEvent::Connected) => {
                    self.enter_connected(now, store);
                }
                (
                    ConnectionState::Connecting | ConnectionState::Connected,
                    TransportEvent::Disconnected(error),
                ) => {
                    self.enter_disconnected(now, store, error);
                }
                (ConnectionState::Connected, TransportEvent::Text(payload)) => {
                    self.heartbeat.on_activity();
                    self.handle_payload(&payload, now, store);
                }
                (ConnectionState::Connected, TransportEvent::Pong) => {
                    self.heartbeat.on_activity();
                }
                (state, event) => {
                    debug!("Dropping stale {:?} while {:?}", event, state);
                }
            }
        }
    }

    fn handle_payload(&mut self, payload: &str, now: Instant, store: &mut TelemetryStore) {
        let result = peek_kind(payload).and_then(|kind| match kind {
            MessageKind::Telemetry => store.apply(payload, now).map(|()| kind),
            _ => Ok(kind),
        });

        match result {
            Ok(MessageKind::Telemetry) => {
                self.stats.messages_applied = self.stats.messages_applied.saturating_add(1);
            }
            Ok(MessageKind::Pong) => {}
            Ok(MessageKind::Other) => {
                self.stats.messages_ignored = self.stats.messages_ignored.saturating_add(1);
                debug!("Ignoring non-telemetry message");
            }
            Err(error) => {
                self.stats.decode_errors = self.stats.decode_errors.saturating_add(1);
                warn!(
                    "Dropping undecodable message ({} so far): {}",
                    self.stats.decode_errors, error
                );
            }
        }
    }

    fn drive_heartbeat(&mut self, now: Instant, store: &mut TelemetryStore) {
        match self.heartbeat.poll(now) {
            HeartbeatAction::Idle => {}
            HeartbeatAction::SendPing => {
                debug!("Heartbeat ping");
                if let Err(error) = self.transport.send_text(PING_FRAME) {
                    self.transport.close();
                    self.enter_disconnected(now, store, error);
                }
            }
            HeartbeatAction::Expired => {
                self.stats.heartbeat_expiries = self.stats.heartbeat_expiries.saturating_add(1);
                self.transport.close();
                self.enter_disconnected(now, store, TransportError::HeartbeatMissed);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::collections::VecDeque;
    use alloc::string::String;
    use alloc::vec::Vec;

    /// Scripted transport: events are queued by the test, sends recorded
    #[derive(Default)]
    pub(crate) struct MockTransport {
        pub(crate) events: VecDeque<TransportEvent>,
        pub(crate) sent: Vec<String>,
        pub(crate) connects: u32,
        pub(crate) closes: u32,
        pub(crate) refuse_connect: bool,
    }

    impl MockTransport {
        pub(crate) fn push(&mut self, event: TransportEvent) {
            self.events.push_back(event);
        }

        pub(crate) fn push_text(&mut self, text: &str) {
            self.events.push_back(TransportEvent::Text(String::from(text)));
        }
    }

    impl Transport for MockTransport {
        fn connect(&mut self, _endpoint: &Endpoint) -> Result<(), TransportError> {
            self.connects += 1;
            if self.refuse_connect {
                Err(TransportError::ConnectFailed)
            } else {
                Ok(())
            }
        }

        fn poll(&mut self) -> Option<TransportEvent> {
            self.events.pop_front()
        }

        fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
            self.sent.push(String::from(text));
            Ok(())
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn endpoint() -> Option<Endpoint> {
        Endpoint::new("pluto.local", 8000, "/ws/telemetry").ok()
    }

    fn connected_supervisor(store: &mut TelemetryStore) -> ConnectionSupervisor<MockTransport> {
        let mut supervisor = ConnectionSupervisor::new(
            MockTransport::default(),
            endpoint(),
            SupervisorSettings::default(),
        );
        supervisor.service(at(0), store);
        supervisor.transport_mut().push(TransportEvent::Connected);
        supervisor.service(at(10), store);
        assert_eq!(supervisor.state(), ConnectionState::Connected);
        supervisor
    }

    #[test]
    fn test_connect_sets_store_flag() {
        let mut store = TelemetryStore::new();
        let supervisor = connected_supervisor(&mut store);

        assert!(store.current().connected);
        assert!(!supervisor.link_faulted());
        assert_eq!(supervisor.transport().connects, 1);
        assert_eq!(supervisor.state_since(), at(10));
    }

    #[test]
    fn test_initial_attempt_is_not_a_fault() {
        let mut store = TelemetryStore::new();
        let mut supervisor = ConnectionSupervisor::new(
            MockTransport::default(),
            endpoint(),
            SupervisorSettings::default(),
        );
        supervisor.service(at(0), &mut store);

        assert_eq!(supervisor.state(), ConnectionState::Connecting);
        assert!(!supervisor.link_faulted());
    }

    #[test]
    fn test_disconnect_backoff_and_retry() {
        let mut store = TelemetryStore::new();
        let mut supervisor = connected_supervisor(&mut store);

        supervisor
            .transport_mut()
            .push(TransportEvent::Disconnected(TransportError::Closed));
        supervisor.service(at(1_000), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert!(supervisor.link_faulted());
        assert!(!store.current().connected);
        assert_eq!(supervisor.last_error(), Some(TransportError::Closed));

        supervisor.service(at(1_010), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Backoff);

        supervisor.service(at(6_009), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Backoff);
        assert_eq!(supervisor.transport().connects, 1);

        supervisor.service(at(6_010), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Connecting);
        assert_eq!(supervisor.transport().connects, 2);
        assert!(supervisor.link_faulted());

        supervisor.transport_mut().push(TransportEvent::Connected);
        supervisor.service(at(6_100), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Connected);
        assert!(!supervisor.link_faulted());
        assert!(store.current().connected);
    }

    #[test]
    fn test_connect_timeout_counts_as_failure() {
        let mut store = TelemetryStore::new();
        let mut supervisor = ConnectionSupervisor::new(
            MockTransport::default(),
            endpoint(),
            SupervisorSettings::default(),
        );
        supervisor.service(at(0), &mut store);
        supervisor.service(at(4_999), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Connecting);

        supervisor.service(at(5_000), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert_eq!(supervisor.last_error(), Some(TransportError::ConnectTimeout));
        assert_eq!(supervisor.transport().closes, 1);
    }

    #[test]
    fn test_refused_connect_retries_forever() {
        let mut store = TelemetryStore::new();
        let transport = MockTransport {
            refuse_connect: true,
            ..MockTransport::default()
        };
        let mut supervisor =
            ConnectionSupervisor::new(transport, endpoint(), SupervisorSettings::default());

        let mut now = 0;
        for _ in 0..50 {
            supervisor.service(at(now), &mut store);
            now += 1_000;
        }

        // One attempt per 5 s backoff window plus the initial one
        assert!(supervisor.transport().connects >= 9);
        assert!(supervisor.link_faulted());
        assert_ne!(supervisor.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_heartbeat_expiry_disconnects() {
        let mut store = TelemetryStore::new();
        let mut supervisor = connected_supervisor(&mut store);

        supervisor.service(at(15_010), &mut store);
        assert_eq!(supervisor.transport().sent, [PING_FRAME]);

        supervisor.service(at(18_010), &mut store);
        supervisor.service(at(30_010), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Connected);

        supervisor.service(at(33_010), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert_eq!(supervisor.last_error(), Some(TransportError::HeartbeatMissed));
        assert_eq!(supervisor.stats().heartbeat_expiries, 1);
        assert!(!store.current().connected);
    }

    #[test]
    fn test_pong_message_keeps_link_alive() {
        let mut store = TelemetryStore::new();
        let mut supervisor = connected_supervisor(&mut store);

        for round in 1..6u64 {
            let ping_at = 10 + round * 15_000;
            supervisor.service(at(ping_at), &mut store);
            supervisor.transport_mut().push_text(r#"{"type":"pong"}"#);
            supervisor.service(at(ping_at + 100), &mut store);
        }

        assert_eq!(supervisor.state(), ConnectionState::Connected);
        assert_eq!(supervisor.transport().sent.len(), 5);
        assert_eq!(supervisor.stats().messages_ignored, 0);
    }

    #[test]
    fn test_malformed_messages_are_counted_only() {
        let mut store = TelemetryStore::new();
        let mut supervisor = connected_supervisor(&mut store);
        let before = store.snapshot();

        supervisor.transport_mut().push_text("{not json");
        supervisor.transport_mut().push_text(r#"{"type":"telemetry","btc_price":"high"}"#);
        supervisor.service(at(100), &mut store);

        assert_eq!(supervisor.stats().decode_errors, 2);
        assert_eq!(supervisor.state(), ConnectionState::Connected);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_routes_telemetry_and_ignores_others() {
        let mut store = TelemetryStore::new();
        let mut supervisor = connected_supervisor(&mut store);

        supervisor
            .transport_mut()
            .push_text(r#"{"type":"trade_signal","symbol":"BTCUSD","side":"buy","btc_price":1.0}"#);
        supervisor
            .transport_mut()
            .push_text(r#"{"type":"telemetry","btc_price":67250.5}"#);
        supervisor.service(at(200), &mut store);

        let stats = supervisor.stats();
        assert_eq!(stats.messages_ignored, 1);
        assert_eq!(stats.messages_applied, 1);
        assert_eq!(store.current().btc_price, 67250.5);
        assert_eq!(store.current().last_update, Some(at(200)));
    }

    #[test]
    fn test_missing_endpoint_faults_and_retries() {
        let mut store = TelemetryStore::new();
        let mut supervisor = ConnectionSupervisor::new(
            MockTransport::default(),
            None,
            SupervisorSettings::default(),
        );
        supervisor.report_config_error(&ConfigError::EmptyHost);
        assert!(supervisor.link_faulted());

        supervisor.service(at(0), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        supervisor.service(at(10), &mut store);
        assert_eq!(supervisor.state(), ConnectionState::Backoff);
        supervisor.service(at(5_010), &mut store);

        assert_eq!(supervisor.stats().connect_attempts, 2);
        assert_eq!(supervisor.transport().connects, 0);
    }
}

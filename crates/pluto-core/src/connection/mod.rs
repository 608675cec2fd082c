//! Backend link: transport capability, heartbeat, backoff and supervision
//!
//! The transport (WiFi + WebSocket client on the device, an in-process
//! mock in the simulator) is reduced to a small polled interface. Instead
//! of registering connect/message/disconnect callbacks, the supervisor
//! drains [`TransportEvent`]s once per scheduler tick, which keeps every
//! store write ordered before the render that reads it.

pub mod backoff;
pub mod heartbeat;
pub mod queue;
pub mod supervisor;

use alloc::string::String;

use thiserror_no_std::Error;

use crate::config::Endpoint;

pub use backoff::{Backoff, ReconnectPolicy};
pub use heartbeat::{HeartbeatAction, HeartbeatMonitor};
pub use queue::{QueuedTransport, TransportChannels, TransportCommand};
pub use supervisor::{ConnectionSupervisor, SupervisorSettings, SupervisorStats};

/// Lifecycle of the single backend connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Attempt in flight, waiting for the transport to report success
    Connecting,
    /// Link up, telemetry flowing
    Connected,
    /// Link lost; the next service pass schedules a retry
    Disconnected,
    /// Waiting out the retry delay
    Backoff,
}

/// Transport-level failures. All of them are recoverable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connect attempt failed")]
    ConnectFailed,
    #[error("Connect attempt timed out")]
    ConnectTimeout,
    #[error("Connection closed by peer")]
    Closed,
    #[error("Heartbeat missed")]
    HeartbeatMissed,
    #[error("Send failed")]
    SendFailed,
    #[error("Transport queue full")]
    QueueFull,
}

/// Something the transport observed since the last poll
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Connection established
    Connected,
    /// Connection dropped or failed
    Disconnected(TransportError),
    /// One inbound text frame
    Text(String),
    /// Protocol-level pong
    Pong,
}

/// Network transport capability consumed by the supervisor
pub trait Transport {
    /// Start a connection attempt. Success is reported later through
    /// [`TransportEvent::Connected`].
    fn connect(&mut self, endpoint: &Endpoint) -> Result<(), TransportError>;

    /// Return the next pending event without blocking
    fn poll(&mut self) -> Option<TransportEvent>;

    /// Send one text frame on the open connection
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Tear down the connection or abort a pending attempt
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn connect(&mut self, endpoint: &Endpoint) -> Result<(), TransportError> {
        (**self).connect(endpoint)
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        (**self).poll()
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        (**self).send_text(text)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

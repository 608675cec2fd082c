//! Channel-backed transport for links driven from another context
//!
//! The real socket lives in a separate task (network stack on the device,
//! backend thread in the simulator). That side pushes [`TransportEvent`]s
//! into `inbound` and executes [`TransportCommand`]s it reads from
//! `outbound`. The supervisor only ever sees the [`Transport`] trait, and
//! the telemetry store is still written from the scheduler loop alone.

use alloc::string::String;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::{Transport, TransportError, TransportEvent};
use crate::config::Endpoint;

/// Depth of each direction of the link queue
pub const TRANSPORT_QUEUE_DEPTH: usize = 16;

/// Request from the supervisor to the task owning the socket
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCommand {
    Connect(Endpoint),
    SendText(String),
    Close,
}

/// Both directions of the link queue
///
/// Typically placed in a `static` so the socket task and the scheduler can
/// share it without lifetimes.
pub struct TransportChannels {
    pub inbound: Channel<CriticalSectionRawMutex, TransportEvent, TRANSPORT_QUEUE_DEPTH>,
    pub outbound: Channel<CriticalSectionRawMutex, TransportCommand, TRANSPORT_QUEUE_DEPTH>,
}

impl TransportChannels {
    pub const fn new() -> Self {
        Self {
            inbound: Channel::new(),
            outbound: Channel::new(),
        }
    }

    /// Scheduler-side handle implementing [`Transport`]
    pub fn transport(&self) -> QueuedTransport<'_> {
        QueuedTransport { channels: self }
    }
}

impl Default for TransportChannels {
    fn default() -> Self {
        Self::new()
    }
}

pub struct QueuedTransport<'a> {
    channels: &'a TransportChannels,
}

impl QueuedTransport<'_> {
    fn command(&self, command: TransportCommand) -> Result<(), TransportError> {
        self.channels
            .outbound
            .try_send(command)
            .map_err(|_| TransportError::QueueFull)
    }
}

impl Transport for QueuedTransport<'_> {
    fn connect(&mut self, endpoint: &Endpoint) -> Result<(), TransportError> {
        self.command(TransportCommand::Connect(endpoint.clone()))
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        self.channels.inbound.try_receive().ok()
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.command(TransportCommand::SendText(String::from(text)))
    }

    fn close(&mut self) {
        if self.command(TransportCommand::Close).is_err() {
            warn!("Transport queue full, close request dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_flow_outbound() {
        let channels = TransportChannels::new();
        let mut transport = channels.transport();
        let endpoint = Endpoint::new("pluto.local", 8000, "/ws/telemetry").unwrap();

        transport.connect(&endpoint).unwrap();
        transport.send_text("ping").unwrap();
        transport.close();

        assert_eq!(
            channels.outbound.try_receive().ok(),
            Some(TransportCommand::Connect(endpoint))
        );
        assert_eq!(
            channels.outbound.try_receive().ok(),
            Some(TransportCommand::SendText(String::from("ping")))
        );
        assert_eq!(
            channels.outbound.try_receive().ok(),
            Some(TransportCommand::Close)
        );
    }

    #[test]
    fn test_events_flow_inbound_in_order() {
        let channels = TransportChannels::new();
        let mut transport = channels.transport();

        channels.inbound.try_send(TransportEvent::Connected).unwrap();
        channels.inbound.try_send(TransportEvent::Pong).unwrap();

        assert_eq!(transport.poll(), Some(TransportEvent::Connected));
        assert_eq!(transport.poll(), Some(TransportEvent::Pong));
        assert_eq!(transport.poll(), None);
    }

    #[test]
    fn test_full_queue_reports_error() {
        let channels = TransportChannels::new();
        let mut transport = channels.transport();

        for _ in 0..TRANSPORT_QUEUE_DEPTH {
            transport.send_text("ping").unwrap();
        }
        assert_eq!(transport.send_text("ping"), Err(TransportError::QueueFull));
    }
}

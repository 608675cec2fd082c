//! Application-wide error type for Pluto

use thiserror_no_std::Error;

use crate::config::ConfigError;
use crate::connection::TransportError;
use crate::telemetry::DecodeError;

/// Any error the core can surface, for callers that want a single type
///
/// None of these are fatal: decode errors drop one message, transport
/// errors drive a reconnect and configuration errors hold the error
/// screen while retrying.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Decode error: {0}")]
    Decode(DecodeError),
    #[error("Transport error: {0}")]
    Transport(TransportError),
    #[error("Configuration error: {0}")]
    Config(ConfigError),
}

impl From<DecodeError> for AppError {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}

impl From<TransportError> for AppError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::telemetry::decode_telemetry;
    use alloc::string::ToString;

    fn load(raw: &[u8]) -> Result<(), AppError> {
        let config = Config::parse(raw)?;
        config.validate()?;
        Ok(())
    }

    #[test]
    fn test_question_mark_converts() {
        let error = load(br#"{"backend":{"port":0}}"#).unwrap_err();
        assert!(matches!(error, AppError::Config(ConfigError::InvalidPort)));
    }

    #[test]
    fn test_display_wraps_inner_message() {
        let error = AppError::from(TransportError::HeartbeatMissed);
        assert_eq!(error.to_string(), "Transport error: Heartbeat missed");

        let error: AppError = decode_telemetry(r#"{"type":"pong"}"#).unwrap_err().into();
        assert_eq!(error.to_string(), "Decode error: Unexpected message type");
    }
}

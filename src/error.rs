//! Crate-wide error type

use std::time::Duration;

use crate::protocol::ProtocolError;
use crate::registry::RegistryError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Socket or other I/O failure
    Io(std::io::Error),
    /// Registry rejected the operation
    Registry(RegistryError),
    /// Malformed frame or handshake
    Protocol(ProtocolError),
    /// Remote side answered the handshake with an error
    Rejected(String),
    /// An operation did not finish in time
    Timeout(Duration),
    /// Peer closed the connection
    ConnectionClosed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Rejected(reason) => write!(f, "Rejected by server: {}", reason),
            Error::Timeout(after) => write!(f, "Timed out after {:?}", after),
            Error::ConnectionClosed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_registry_error() {
        let err: Error = RegistryError::SensorNotFound("s1".into()).into();
        assert!(matches!(err, Error::Registry(ref e) if e.is_not_found()));
        assert_eq!(err.to_string(), "Registry error: Sensor not found: s1");
    }

    #[test]
    fn test_source() {
        use std::error::Error as _;

        let err: Error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert!(err.source().is_some());
        assert!(Error::ConnectionClosed.source().is_none());
    }
}

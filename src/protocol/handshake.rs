//! Connection handshake
//!
//! A connection starts with a single text line that declares its role:
//!
//! ```text
//! Client                                   Server
//!   |                                        |
//!   |------- "PUB <sensor>\n" ------------->|     publisher
//!   |------- "SUB <sensor> [client]\n" ---->|     subscriber
//!   |                                        |
//!   |<------ "OK <id>\n" -------------------|     accepted
//!   |<------ "ERR <reason>\n" --------------|     rejected, connection closes
//!   |                                        |
//!   |          [Binary frames follow]        |
//! ```
//!
//! For `SUB` without a client id the server generates one and returns it in
//! the `OK` line.

use super::error::ProtocolError;

/// Role requested by a connecting peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeRequest {
    /// Push payloads into a sensor
    Publish { sensor: String },
    /// Receive payloads from a sensor
    Subscribe {
        sensor: String,
        client: Option<String>,
    },
}

/// Server answer to a handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeResponse {
    /// Accepted; carries the sensor id (publish) or client id (subscribe)
    Ok(String),
    /// Rejected with a reason
    Err(String),
}

fn valid_id(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(char::is_whitespace)
}

impl HandshakeRequest {
    /// Sensor this request targets
    pub fn sensor(&self) -> &str {
        match self {
            HandshakeRequest::Publish { sensor } => sensor,
            HandshakeRequest::Subscribe { sensor, .. } => sensor,
        }
    }

    /// Parse a request line (without the trailing newline)
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidHandshake(line.to_string());
        let mut parts = line.split_whitespace();

        let verb = parts.next().ok_or_else(invalid)?;
        let sensor = parts.next().filter(|s| valid_id(s)).ok_or_else(invalid)?;

        let request = match verb {
            "PUB" => HandshakeRequest::Publish {
                sensor: sensor.to_string(),
            },
            "SUB" => HandshakeRequest::Subscribe {
                sensor: sensor.to_string(),
                client: parts.next().map(str::to_string),
            },
            _ => return Err(invalid()),
        };

        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(request)
    }

    /// Encode as a request line including the trailing newline
    pub fn to_line(&self) -> String {
        match self {
            HandshakeRequest::Publish { sensor } => format!("PUB {}\n", sensor),
            HandshakeRequest::Subscribe {
                sensor,
                client: Some(client),
            } => format!("SUB {} {}\n", sensor, client),
            HandshakeRequest::Subscribe {
                sensor,
                client: None,
            } => format!("SUB {}\n", sensor),
        }
    }
}

impl HandshakeResponse {
    /// Parse a response line (without the trailing newline)
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        match line.split_once(' ') {
            Some(("OK", id)) if valid_id(id) => Ok(HandshakeResponse::Ok(id.to_string())),
            Some(("ERR", reason)) => Ok(HandshakeResponse::Err(reason.to_string())),
            None if line == "ERR" => Ok(HandshakeResponse::Err(String::new())),
            _ => Err(ProtocolError::InvalidHandshake(line.to_string())),
        }
    }

    /// Encode as a response line including the trailing newline
    pub fn to_line(&self) -> String {
        match self {
            HandshakeResponse::Ok(id) => format!("OK {}\n", id),
            HandshakeResponse::Err(reason) => format!("ERR {}\n", reason.replace('\n', " ")),
        }
    }
}

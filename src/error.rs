//! Error kinds for the terminal
//!
//! Every variant is terminal for the process: nothing is retried.

use std::io;
use thiserror::Error;

/// Fatal conditions raised by the port selector and the terminal loop
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The OS refused to enumerate serial devices
    #[error("Failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    /// The selected device could not be opened
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    /// Reading or writing the open connection failed
    #[error("Failed to {op} serial port: {source}")]
    Serial {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Operator console (stdin/stdout) failed
    #[error("Console I/O failed: {0}")]
    Console(#[from] io::Error),

    /// Operator typed something that is not a valid port index
    #[error("Invalid port selection: {0:?}")]
    Selection(String),
}

impl TerminalError {
    pub(crate) fn serial(op: &'static str, source: impl Into<io::Error>) -> Self {
        Self::Serial {
            op,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TerminalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_carries_underlying_message() {
        let err = TerminalError::Open {
            path: "/dev/ttyACM0".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "Device or resource busy"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/dev/ttyACM0"));
        assert!(msg.contains("Device or resource busy"));
    }

    #[test]
    fn test_serial_error_from_port_error() {
        let err = TerminalError::serial(
            "read",
            serialport::Error::new(serialport::ErrorKind::Io(io::ErrorKind::BrokenPipe), "gone"),
        );
        assert!(err.to_string().starts_with("Failed to read serial port"));
    }
}

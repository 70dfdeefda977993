//! Error types for Bkknet.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result type alias for Bkknet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Bkknet.
#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    // Transport errors
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Identity errors
    #[error("identity error: {0}")]
    Identity(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // General errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Frame decode and validation errors.
///
/// All of these are fatal to the offending datagram, never to the process:
/// the datagram is dropped and the pipeline keeps running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("declared payload length {declared} exceeds available bytes {available}")]
    LengthOverflow { declared: usize, available: usize },

    #[error("checksum mismatch: frame {frame:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { frame: u16, computed: u16 },

    #[error("data length mismatch: header declares {declared}, payload holds {actual}")]
    DataLengthMismatch { declared: usize, actual: usize },
}

/// Transport layer errors.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("bind failed on {addr}: {reason}")]
    BindFailed { addr: SocketAddr, reason: String },

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("socket error: {0}")]
    SocketError(String),

    #[error("datagram too large to send: {size} bytes (max {max})")]
    SendTooLarge { size: usize, max: usize },

    #[error("transport stopped")]
    Stopped,
}

impl Error {
    /// Check if the error is contained to a single datagram.
    ///
    /// Per-datagram failures are logged and dropped; they must never unwind
    /// past the parser or dispatcher into the event loop.
    pub fn is_per_datagram(&self) -> bool {
        matches!(
            self,
            Error::Protocol(_)
                | Error::Transport(
                    TransportError::SendFailed(_) | TransportError::SendTooLarge { .. }
                )
        )
    }
}

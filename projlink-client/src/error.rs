//! Client error types.

use bytes::Bytes;
use projlink_protocol::ProtocolError;
use std::io;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("port not open")]
    NotOpen,

    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("projector returned exception")]
    DeviceException { payload: Bytes },

    #[error("response too short: need {needed} bytes, got {got}")]
    ShortResponse { needed: usize, got: usize },
}

impl ClientError {
    /// Returns whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Io(_) => true,
            ClientError::Protocol(e) => e.is_retryable(),
            _ => false,
        }
    }
}

//! Protocol error types.

use std::fmt;
use thiserror::Error;

/// Part of a frame that was being collected when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSection {
    Header,
    Payload,
    Checksum,
}

impl fmt::Display for FrameSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSection::Header => write!(f, "header"),
            FrameSection::Payload => write!(f, "payload"),
            FrameSection::Checksum => write!(f, "checksum"),
        }
    }
}

/// Protocol-level errors that can occur during framing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("incomplete frame {section}: expected {expected} bytes, received {received}")]
    IncompleteFrame {
        section: FrameSection,
        expected: usize,
        received: usize,
    },

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

impl ProtocolError {
    /// Returns whether retrying the transaction could plausibly succeed.
    ///
    /// Every variant except an oversized payload describes line noise or a
    /// slow device rather than a malformed request.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProtocolError::PayloadTooLarge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::ChecksumMismatch {
            expected: 0x5d,
            actual: 0x00,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x5d"));
        assert!(msg.contains("0x00"));

        let err = ProtocolError::IncompleteFrame {
            section: FrameSection::Payload,
            expected: 8,
            received: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("payload"));
        assert!(msg.contains('8'));
        assert!(msg.contains('3'));

        let err = ProtocolError::PayloadTooLarge {
            size: 70000,
            max: 65535,
        };
        assert!(err.to_string().contains("70000"));
    }

    #[test]
    fn test_retryable() {
        assert!(ProtocolError::ChecksumMismatch {
            expected: 1,
            actual: 2
        }
        .is_retryable());
        assert!(ProtocolError::IncompleteFrame {
            section: FrameSection::Header,
            expected: 5,
            received: 0
        }
        .is_retryable());
        assert!(!ProtocolError::PayloadTooLarge { size: 1, max: 0 }.is_retryable());
    }
}

//! Binary frame format.
//!
//! Frame layout (5 bytes header + payload + 1 byte checksum):
//!
//! ```text
//! +---------+--------+-------------+-----------+----------+
//! | command | magic  | payload_len | payload   | checksum |
//! | 1 byte  | 2 bytes| 2 bytes LE  | len bytes | 1 byte   |
//! +---------+--------+-------------+-----------+----------+
//! ```
//!
//! The magic bytes are always `0x14 0x00` on frames we send. On received
//! frames they are decoded but never validated.

use crate::checksum::checksum;
use crate::error::ProtocolError;
use crate::MAX_PAYLOAD_SIZE;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Fixed sub-header bytes following the command byte.
pub const MAGIC: [u8; 2] = [0x14, 0x00];

/// Size of the fixed frame header in bytes (1+2+2 = 5).
pub const HEADER_SIZE: usize = 5;

/// Size of the trailing checksum in bytes.
pub const TRAILER_SIZE: usize = 1;

/// Bytes every frame carries in addition to its payload.
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + TRAILER_SIZE;

/// Role of a frame, carried as its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// The device rejected the request.
    Exception,
    Acknowledge,
    Response,
    WriteRequest,
    ReadRequest,
    /// A command byte outside the known set, preserved as received.
    Unknown(u8),
}

impl CommandKind {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => CommandKind::Exception,
            0x03 => CommandKind::Acknowledge,
            0x05 => CommandKind::Response,
            0x06 => CommandKind::WriteRequest,
            0x07 => CommandKind::ReadRequest,
            other => CommandKind::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            CommandKind::Exception => 0x00,
            CommandKind::Acknowledge => 0x03,
            CommandKind::Response => 0x05,
            CommandKind::WriteRequest => 0x06,
            CommandKind::ReadRequest => 0x07,
            CommandKind::Unknown(b) => b,
        }
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, CommandKind::Exception)
    }
}

impl From<u8> for CommandKind {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<CommandKind> for u8 {
    fn from(kind: CommandKind) -> Self {
        kind.to_byte()
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Exception => write!(f, "EXCEPTION"),
            CommandKind::Acknowledge => write!(f, "ACK"),
            CommandKind::Response => write!(f, "RESPONSE"),
            CommandKind::WriteRequest => write!(f, "WRITE"),
            CommandKind::ReadRequest => write!(f, "READ"),
            CommandKind::Unknown(b) => write!(f, "UNKNOWN({:#04x})", b),
        }
    }
}

/// Decoded fixed portion of an incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub command: CommandKind,
    /// Sub-header bytes as received.
    pub magic: [u8; 2],
    /// Declared payload length.
    pub payload_len: u16,
}

impl FrameHeader {
    /// Returns whether the sub-header matches what we emit.
    pub fn has_expected_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Declared payload length as a `usize`.
    pub fn payload_len(&self) -> usize {
        self.payload_len as usize
    }
}

/// Decodes the 5-byte header of an incoming frame. Never fails.
pub fn decode_header(buf: &[u8; HEADER_SIZE]) -> FrameHeader {
    FrameHeader {
        command: CommandKind::from_byte(buf[0]),
        magic: [buf[1], buf[2]],
        payload_len: u16::from_le_bytes([buf[3], buf[4]]),
    }
}

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: CommandKind,
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame.
    ///
    /// The payload must not exceed [`MAX_PAYLOAD_SIZE`]; use [`Frame::try_new`]
    /// when the payload comes from outside the program.
    pub fn new(command: CommandKind, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// Creates a new frame, rejecting payloads the length field cannot carry.
    pub fn try_new(command: CommandKind, payload: impl Into<Bytes>) -> Result<Self, ProtocolError> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self { command, payload })
    }

    /// Read request for `reply_len` bytes of `field` in `module`.
    pub fn read_request(module: u8, field: u8, reply_len: u8) -> Self {
        Self::new(
            CommandKind::ReadRequest,
            Bytes::copy_from_slice(&[module, 0x00, 0x00, field, reply_len]),
        )
    }

    /// Write request setting `field` in `module` to `value`.
    pub fn write_request(module: u8, field: u8, value: u8) -> Self {
        Self::new(
            CommandKind::WriteRequest,
            Bytes::copy_from_slice(&[module, field, value, 0x00]),
        )
    }

    /// Length field as little-endian bytes.
    pub fn length_bytes(&self) -> [u8; 2] {
        (self.payload.len() as u16).to_le_bytes()
    }

    /// Checksum of this frame's length and payload.
    pub fn checksum(&self) -> u8 {
        let [lo, hi] = self.length_bytes();
        checksum(lo, hi, &self.payload)
    }

    /// Total size of the encoded frame.
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encodes the frame into bytes.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.encoded_len());

        buf.put_u8(self.command.to_byte());
        buf.put_slice(&MAGIC);
        buf.put_u16_le(self.payload.len() as u16);
        buf.put_slice(&self.payload);
        buf.put_u8(self.checksum());

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_power_on() {
        let frame = Frame::write_request(0x34, 0x11, 0x00);
        let encoded = frame.encode();
        assert_eq!(
            &encoded[..],
            &[0x06, 0x14, 0x00, 0x04, 0x00, 0x34, 0x11, 0x00, 0x00, 0x5d]
        );
    }

    #[test]
    fn test_encode_read_request() {
        let frame = Frame::read_request(0x34, 0x11, 0x00);
        let encoded = frame.encode();
        // 05 00 34 00 00 11 00 + 14 = 0x5e
        assert_eq!(
            &encoded[..],
            &[0x07, 0x14, 0x00, 0x05, 0x00, 0x34, 0x00, 0x00, 0x11, 0x00, 0x5e]
        );
    }

    #[test]
    fn test_encode_empty_payload() {
        let frame = Frame::new(CommandKind::Acknowledge, Bytes::new());
        let encoded = frame.encode();
        assert_eq!(&encoded[..], &[0x03, 0x14, 0x00, 0x00, 0x00, 0x14]);
        assert_eq!(frame.encoded_len(), FRAME_OVERHEAD);
    }

    #[test]
    fn test_length_little_endian() {
        let frame = Frame::new(CommandKind::Response, vec![0u8; 0x0123]);
        let encoded = frame.encode();
        assert_eq!(encoded[3], 0x23);
        assert_eq!(encoded[4], 0x01);
        assert_eq!(encoded.len(), 0x0123 + FRAME_OVERHEAD);
    }

    #[test]
    fn test_command_kind_bytes() {
        let kinds = [
            (CommandKind::Exception, 0),
            (CommandKind::Acknowledge, 3),
            (CommandKind::Response, 5),
            (CommandKind::WriteRequest, 6),
            (CommandKind::ReadRequest, 7),
        ];
        for (kind, byte) in kinds {
            assert_eq!(kind.to_byte(), byte);
            assert_eq!(CommandKind::from_byte(byte), kind);
        }
        assert_eq!(CommandKind::from_byte(0x42), CommandKind::Unknown(0x42));
        assert_eq!(u8::from(CommandKind::Unknown(0x42)), 0x42);
        assert!(CommandKind::Exception.is_exception());
        assert!(!CommandKind::Response.is_exception());
    }

    #[test]
    fn test_command_kind_display() {
        assert_eq!(CommandKind::Response.to_string(), "RESPONSE");
        assert_eq!(CommandKind::Unknown(0x0a).to_string(), "UNKNOWN(0x0a)");
    }

    #[test]
    fn test_decode_header_ignores_magic() {
        let header = decode_header(&[0x05, 0xde, 0xad, 0x02, 0x00]);
        assert_eq!(header.command, CommandKind::Response);
        assert_eq!(header.payload_len, 2);
        assert!(!header.has_expected_magic());

        let header = decode_header(&[0x05, 0x14, 0x00, 0x00, 0x01]);
        assert_eq!(header.payload_len(), 256);
        assert!(header.has_expected_magic());
    }

    #[test]
    fn test_try_new_too_large() {
        let result = Frame::try_new(CommandKind::WriteRequest, vec![0u8; MAX_PAYLOAD_SIZE + 1]);
        assert!(matches!(
            result,
            Err(ProtocolError::PayloadTooLarge { size, max })
                if size == MAX_PAYLOAD_SIZE + 1 && max == MAX_PAYLOAD_SIZE
        ));

        let frame = Frame::try_new(CommandKind::WriteRequest, vec![0u8; MAX_PAYLOAD_SIZE]).unwrap();
        assert_eq!(frame.length_bytes(), [0xff, 0xff]);
    }

    proptest! {
        #[test]
        fn prop_header_roundtrip(
            command in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..4096),
        ) {
            let frame = Frame::new(CommandKind::from_byte(command), payload.clone());
            let encoded = frame.encode();
            let header_bytes: [u8; HEADER_SIZE] = encoded[..HEADER_SIZE].try_into().unwrap();
            let header = decode_header(&header_bytes);

            prop_assert_eq!(header.command, frame.command);
            prop_assert_eq!(header.payload_len(), payload.len());
            prop_assert!(header.has_expected_magic());
            prop_assert_eq!(encoded.len(), payload.len() + FRAME_OVERHEAD);
            prop_assert_eq!(&encoded[HEADER_SIZE..HEADER_SIZE + payload.len()], &payload[..]);
            prop_assert_eq!(encoded[encoded.len() - 1], frame.checksum());
        }
    }
}

//! # projlink-protocol
//!
//! Wire protocol implementation for the projector serial control link.
//!
//! This crate provides:
//! - Frame encoding with little-endian length prefix and trailing checksum
//! - Header decoding for incoming frames
//! - The additive 8-bit checksum used on both directions of the link
//! - Command kinds and protocol constants

pub mod checksum;
pub mod error;
pub mod frame;

pub use checksum::{checksum, verify, Checksum, CHECKSUM_SEED};
pub use error::{FrameSection, ProtocolError};
pub use frame::{
    decode_header, CommandKind, Frame, FrameHeader, FRAME_OVERHEAD, HEADER_SIZE, MAGIC,
    TRAILER_SIZE,
};

/// Maximum frame payload size (the length field is 16 bits wide).
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

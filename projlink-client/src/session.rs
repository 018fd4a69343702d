//! Session management.
//!
//! A [`Session`] exclusively owns at most one open channel and runs strict
//! request/response transactions over it. Reads on the channel may return
//! fewer bytes than asked for, or nothing at all when the line times out;
//! every section of an incoming frame is accumulated across reads until it
//! is complete or the line stays silent for `max_empty_reads` reads in a row.

use crate::channel::{Channel, Connector};
use crate::config::SerialConfig;
use crate::error::ClientError;
use crate::serial::SerialConnector;
use bytes::BytesMut;
use projlink_protocol::{
    decode_header, verify, Frame, FrameSection, ProtocolError, HEADER_SIZE, TRAILER_SIZE,
};

/// A session with a single device.
pub struct Session<C: Connector> {
    connector: C,
    channel: Option<C::Channel>,
    port: Option<String>,
    max_empty_reads: u32,
}

impl Session<SerialConnector> {
    /// Creates a closed session that opens local serial ports.
    pub fn serial() -> Self {
        Self::new(SerialConnector)
    }
}

impl<C: Connector> Session<C> {
    /// Creates a new session (not yet open).
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            channel: None,
            port: None,
            max_empty_reads: SerialConfig::default().max_empty_reads,
        }
    }

    /// Returns whether a channel is open.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Name of the open port.
    pub fn port_name(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Opens `port`, closing any channel that is already open.
    ///
    /// On failure the session is left closed.
    pub fn open(&mut self, port: &str, config: &SerialConfig) -> Result<(), ClientError> {
        self.close();

        let channel = self
            .connector
            .open(port, config)
            .map_err(|source| ClientError::Open {
                port: port.to_string(),
                source,
            })?;

        tracing::debug!("Opened {}", port);
        self.channel = Some(channel);
        self.port = Some(port.to_string());
        self.max_empty_reads = config.max_empty_reads.max(1);
        Ok(())
    }

    /// Closes the channel. Safe to call on a closed session.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            tracing::debug!("Closing {}", self.port.as_deref().unwrap_or("channel"));
            drop(channel);
        }
        self.port = None;
    }

    fn channel_mut(&mut self) -> Result<&mut C::Channel, ClientError> {
        self.channel.as_mut().ok_or(ClientError::NotOpen)
    }

    /// Encodes `frame` and writes it in one call.
    pub fn send(&mut self, frame: &Frame) -> Result<(), ClientError> {
        let channel = self.channel_mut()?;
        let encoded = frame.encode();
        tracing::trace!("-> {} {:02x?}", frame.command, &encoded[..]);
        channel.write_all(&encoded)?;
        Ok(())
    }

    /// Reads one frame and verifies its checksum.
    pub fn receive_frame(&mut self) -> Result<Frame, ClientError> {
        let max_empty_reads = self.max_empty_reads;
        let channel = self.channel_mut()?;

        let mut header_buf = [0u8; HEADER_SIZE];
        read_section(channel, &mut header_buf, FrameSection::Header, max_empty_reads)?;
        let header = decode_header(&header_buf);
        if !header.has_expected_magic() {
            tracing::debug!("Unexpected sub-header {:02x?}", header.magic);
        }

        let mut payload = BytesMut::zeroed(header.payload_len());
        if !payload.is_empty() {
            read_section(channel, &mut payload, FrameSection::Payload, max_empty_reads)?;
        }

        let mut trailer = [0u8; TRAILER_SIZE];
        read_section(channel, &mut trailer, FrameSection::Checksum, max_empty_reads)?;

        verify(&header, &payload, trailer[0])?;

        tracing::trace!("<- {} {:02x?}", header.command, &payload[..]);
        Ok(Frame::new(header.command, payload.freeze()))
    }

    /// Runs one request/response exchange.
    ///
    /// Stale input is discarded before the request goes out. An exception
    /// response is reported as [`ClientError::DeviceException`].
    pub fn transact(&mut self, frame: &Frame) -> Result<Frame, ClientError> {
        self.channel_mut()?.discard_input()?;
        self.send(frame)?;
        let response = self.receive_frame()?;

        tracing::debug!(
            "{} ({} bytes) -> {} ({} bytes)",
            frame.command,
            frame.payload.len(),
            response.command,
            response.payload.len()
        );

        if response.command.is_exception() {
            return Err(ClientError::DeviceException {
                payload: response.payload,
            });
        }
        Ok(response)
    }
}

/// Fills `buf` from `channel`, failing if the line goes quiet first.
fn read_section<R: Channel + ?Sized>(
    channel: &mut R,
    buf: &mut [u8],
    section: FrameSection,
    max_empty_reads: u32,
) -> Result<(), ClientError> {
    let received = read_up_to(channel, buf, max_empty_reads)?;
    if received < buf.len() {
        return Err(ProtocolError::IncompleteFrame {
            section,
            expected: buf.len(),
            received,
        }
        .into());
    }
    Ok(())
}

/// Reads until `buf` is full or `max_empty_reads` consecutive reads return
/// nothing. Returns the number of bytes collected.
fn read_up_to<R: Channel + ?Sized>(
    channel: &mut R,
    buf: &mut [u8],
    max_empty_reads: u32,
) -> std::io::Result<usize> {
    let mut filled = 0;
    let mut empty_reads = 0;

    while filled < buf.len() {
        let n = channel.read(&mut buf[filled..])?;
        if n == 0 {
            empty_reads += 1;
            if empty_reads >= max_empty_reads {
                break;
            }
            continue;
        }
        empty_reads = 0;
        filled += n;
    }

    tracing::trace!("Collected {}/{} bytes", filled, buf.len());
    Ok(filled)
}

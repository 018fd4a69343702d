//! Byte channel abstraction.
//!
//! The session only needs a duplex byte stream whose reads return promptly
//! with whatever is available. A read that times out with nothing buffered
//! must report `Ok(0)` rather than an error.

use crate::config::SerialConfig;
use std::io;

/// A duplex byte channel to a single device.
///
/// Dropping the channel closes it.
pub trait Channel {
    /// Reads up to `buf.len()` bytes, returning `Ok(0)` on a timeout with
    /// no data.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes the whole buffer.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Discards any input the device has sent that has not been read yet.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl<T: Channel + ?Sized> Channel for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write_all(buf)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }
}

/// Acquires channels by name.
pub trait Connector {
    type Channel: Channel;

    fn open(&self, port: &str, config: &SerialConfig) -> io::Result<Self::Channel>;
}

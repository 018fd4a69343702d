//! In-memory channel for exercising sessions without hardware.
//!
//! A [`ScriptedChannel`] replays a queue of read results and records every
//! write and input discard. Clones share state, so a test can keep one
//! handle for inspection while the session owns another.

use crate::channel::{Channel, Connector};
use crate::config::SerialConfig;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// One scripted response to a `read` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStep {
    /// Deliver these bytes; whatever the read buffer cannot hold stays queued.
    Data(Vec<u8>),
    /// Time out with nothing available.
    Empty,
    /// Fail with an I/O error of this kind.
    Error(io::ErrorKind),
}

/// Something the session did to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Discard,
    Write(Vec<u8>),
    Read(usize),
}

#[derive(Debug, Default)]
struct ScriptState {
    stale: Vec<u8>,
    reads: VecDeque<ReadStep>,
    events: Vec<ChannelEvent>,
    fail_write: Option<io::ErrorKind>,
    fail_discard: Option<io::ErrorKind>,
    fail_open: Option<io::ErrorKind>,
    opens: usize,
    live: usize,
}

/// A scripted in-memory channel.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    state: Arc<Mutex<ScriptState>>,
    counted: bool,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a read that delivers `data`.
    pub fn push_data(&self, data: impl Into<Vec<u8>>) -> &Self {
        self.state.lock().reads.push_back(ReadStep::Data(data.into()));
        self
    }

    /// Queues a read that times out empty.
    pub fn push_empty(&self) -> &Self {
        self.state.lock().reads.push_back(ReadStep::Empty);
        self
    }

    /// Queues a read that fails.
    pub fn push_error(&self, kind: io::ErrorKind) -> &Self {
        self.state.lock().reads.push_back(ReadStep::Error(kind));
        self
    }

    /// Queues `data` split into chunks of the given sizes; the remainder
    /// goes out as a final chunk.
    pub fn push_chunked(&self, data: &[u8], sizes: &[usize]) -> &Self {
        let mut rest = data;
        for &size in sizes {
            if rest.is_empty() {
                break;
            }
            if size == 0 {
                self.push_empty();
                continue;
            }
            let (chunk, tail) = rest.split_at(size.min(rest.len()));
            self.push_data(chunk);
            rest = tail;
        }
        if !rest.is_empty() {
            self.push_data(rest);
        }
        self
    }

    /// Bytes that were buffered before the next request; cleared by a discard.
    pub fn set_stale_input(&self, data: impl Into<Vec<u8>>) {
        self.state.lock().stale = data.into();
    }

    pub fn fail_writes(&self, kind: io::ErrorKind) {
        self.state.lock().fail_write = Some(kind);
    }

    pub fn fail_discards(&self, kind: io::ErrorKind) {
        self.state.lock().fail_discard = Some(kind);
    }

    /// Makes the next connector open fail.
    pub fn fail_open(&self, kind: io::ErrorKind) {
        self.state.lock().fail_open = Some(kind);
    }

    pub fn events(&self) -> Vec<ChannelEvent> {
        self.state.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    /// All bytes written, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                ChannelEvent::Write(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Number of queued read steps not yet consumed.
    pub fn pending_reads(&self) -> usize {
        self.state.lock().reads.len()
    }

    /// Number of times a connector opened this channel.
    pub fn open_count(&self) -> usize {
        self.state.lock().opens
    }

    /// Number of opened channels not yet dropped.
    pub fn live_count(&self) -> usize {
        self.state.lock().live
    }
}

impl Clone for ScriptedChannel {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            counted: false,
        }
    }
}

impl Drop for ScriptedChannel {
    fn drop(&mut self) {
        if self.counted {
            self.state.lock().live -= 1;
        }
    }
}

impl Channel for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();

        if !state.stale.is_empty() {
            let n = buf.len().min(state.stale.len());
            buf[..n].copy_from_slice(&state.stale[..n]);
            state.stale.drain(..n);
            state.events.push(ChannelEvent::Read(n));
            return Ok(n);
        }

        let n = match state.reads.pop_front() {
            None | Some(ReadStep::Empty) => 0,
            Some(ReadStep::Error(kind)) => {
                return Err(io::Error::new(kind, "scripted read failure"));
            }
            Some(ReadStep::Data(data)) => {
                let n = buf.len().min(data.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    state.reads.push_front(ReadStep::Data(data[n..].to_vec()));
                }
                n
            }
        };
        state.events.push(ChannelEvent::Read(n));
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        if let Some(kind) = state.fail_write {
            return Err(io::Error::new(kind, "scripted write failure"));
        }
        state.events.push(ChannelEvent::Write(buf.to_vec()));
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        if let Some(kind) = state.fail_discard {
            return Err(io::Error::new(kind, "scripted discard failure"));
        }
        state.stale.clear();
        state.events.push(ChannelEvent::Discard);
        Ok(())
    }
}

/// Connector that hands out handles to one shared [`ScriptedChannel`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    channel: ScriptedChannel,
}

impl ScriptedConnector {
    pub fn new(channel: ScriptedChannel) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &ScriptedChannel {
        &self.channel
    }
}

impl Connector for ScriptedConnector {
    type Channel = ScriptedChannel;

    fn open(&self, _port: &str, _config: &SerialConfig) -> io::Result<ScriptedChannel> {
        let mut state = self.channel.state.lock();
        if let Some(kind) = state.fail_open.take() {
            return Err(io::Error::new(kind, "scripted open failure"));
        }
        state.opens += 1;
        state.live += 1;
        Ok(ScriptedChannel {
            state: self.channel.state.clone(),
            counted: true,
        })
    }
}

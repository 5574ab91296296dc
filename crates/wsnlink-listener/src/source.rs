//! Byte sources the listener can drain.
//!
//! The listener never blocks in a read: it asks [`ByteSource::available`]
//! first and sleeps out its poll interval when the answer is zero. That
//! split is what keeps a halt request honored within a bounded delay, so
//! any transport behind this trait must answer `available` without blocking.

use std::collections::VecDeque;
use std::io;

use crossbeam_channel::{Receiver, Sender};

/// Anything that can hand the listener raw wire bytes.
pub trait ByteSource {
    /// Bytes ready to read right now, without blocking.
    fn available(&mut self) -> usize;

    /// Read the next byte. Only called after `available` reported at least
    /// one byte, so implementations never need to block here either.
    fn read_byte(&mut self) -> io::Result<u8>;
}

/// Replays a captured byte stream from memory.
///
/// Drains front to back, then reports nothing available forever. Used to run
/// wire captures back through the listener offline.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    bytes: VecDeque<u8>,
}

impl ReplaySource {
    /// Create a replay source over a captured byte stream.
    pub fn new(bytes: Vec<u8>) -> Self {
        ReplaySource {
            bytes: bytes.into(),
        }
    }

    /// Bytes not yet replayed.
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl ByteSource for ReplaySource {
    fn available(&mut self) -> usize {
        self.bytes.len()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.bytes
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "replay exhausted"))
    }
}

/// Receives byte chunks from another thread over a channel.
///
/// Whatever owns the physical transport pushes chunks into the sending half
/// as they arrive; the listener drains them here. A disconnected channel is
/// not an error: the source simply reports nothing available until someone
/// halts the listener.
#[derive(Debug)]
pub struct ChannelSource {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
}

impl ChannelSource {
    /// Wrap the receiving half of an existing channel.
    pub fn new(rx: Receiver<Vec<u8>>) -> Self {
        ChannelSource {
            rx,
            pending: VecDeque::new(),
        }
    }

    /// Create an unbounded channel and the source draining it.
    pub fn channel() -> (Sender<Vec<u8>>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self::new(rx))
    }

    fn pump(&mut self) {
        while let Ok(chunk) = self.rx.try_recv() {
            self.pending.extend(chunk);
        }
    }
}

impl ByteSource for ChannelSource {
    fn available(&mut self) -> usize {
        self.pump();
        self.pending.len()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        if self.pending.is_empty() {
            self.pump();
        }
        self.pending
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::WouldBlock, "channel drained"))
    }
}

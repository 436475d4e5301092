//! Per-connection state and the bounded session pool.

use core::fmt;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

use heapless::Vec;
use log::{debug, warn};

use super::protocol;
use crate::config::{LINE_BUF_SIZE, MAX_SESSIONS, OUT_BUF_SIZE};
use crate::ports::RotatorPort;

/// Longest line a session will assemble, excluding the `\n`.
pub const MAX_LINE_LEN: usize = LINE_BUF_SIZE - 1;

// ── Line assembly ────────────────────────────────────────────

/// Output of [`LineBuffer::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// A complete line, terminator stripped.
    Line(&'a [u8]),
    /// The current line outgrew the buffer.  Everything up to and including
    /// its `\n` is dropped.  Reported once per overlong line.
    Overflow,
}

/// Streaming `\n`-delimited line assembler with a fixed capacity of `N`
/// payload bytes.
pub struct LineBuffer<const N: usize> {
    buf: Vec<u8, N>,
    discarding: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            discarding: false,
        }
    }

    /// Feed a chunk of bytes, calling `on_event` for each completed line
    /// or overflow.  Stops at the first error from `on_event`; bytes after
    /// that point are dropped.
    pub fn feed<E>(
        &mut self,
        data: &[u8],
        mut on_event: impl FnMut(LineEvent<'_>) -> Result<(), E>,
    ) -> Result<(), E> {
        for &byte in data {
            if byte == b'\n' {
                if self.discarding {
                    self.discarding = false;
                } else {
                    let res = on_event(LineEvent::Line(&self.buf));
                    self.buf.clear();
                    res?;
                }
                continue;
            }

            if self.discarding {
                continue;
            }

            if self.buf.push(byte).is_err() {
                self.buf.clear();
                self.discarding = true;
                on_event(LineEvent::Overflow)?;
            }
        }
        Ok(())
    }

    /// Bytes of the line assembled so far.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Session ──────────────────────────────────────────────────

/// Why a session was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Orderly shutdown from the peer (zero-byte read).
    PeerClosed,
    ReadFailed(io::ErrorKind),
    WriteFailed(io::ErrorKind),
    /// Replies piled up past [`OUT_BUF_SIZE`] because the peer stopped
    /// reading.
    Backlogged,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => write!(f, "peer closed"),
            Self::ReadFailed(kind) => write!(f, "read failed ({kind})"),
            Self::WriteFailed(kind) => write!(f, "write failed ({kind})"),
            Self::Backlogged => write!(f, "reply backlog full"),
        }
    }
}

/// One accepted connection: line-assembly state plus the replies not yet
/// accepted by the socket.
///
/// The stream is expected to be non-blocking.  Nothing here waits for the
/// peer; a full send buffer leaves bytes in the backlog until the reactor
/// reports the socket writable again.
pub struct Session<S> {
    stream: S,
    peer: SocketAddr,
    line: LineBuffer<MAX_LINE_LEN>,
    backlog: Vec<u8, OUT_BUF_SIZE>,
}

impl<S> Session<S> {
    fn new(stream: S, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            line: LineBuffer::new(),
            backlog: Vec::new(),
        }
    }

    /// Replies are waiting for the socket to become writable.
    pub fn wants_write(&self) -> bool {
        !self.backlog.is_empty()
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn pending(&self) -> usize {
        self.line.pending()
    }
}

impl<S: Read + Write> Session<S> {
    /// Service one read readiness event: read once, answer every complete
    /// line, then push out as much of the backlog as the socket takes.
    ///
    /// `Err` means the session must be released.
    pub fn on_readable<R: RotatorPort + ?Sized>(
        &mut self,
        slot: usize,
        scratch: &mut [u8],
        rotator: &R,
    ) -> Result<(), CloseReason> {
        let n = match self.stream.read(scratch) {
            Ok(0) => return Err(CloseReason::PeerClosed),
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                return Ok(());
            }
            Err(e) => return Err(CloseReason::ReadFailed(e.kind())),
        };

        let stream = &mut self.stream;
        let backlog = &mut self.backlog;
        self.line.feed(&scratch[..n], |event| match event {
            LineEvent::Line(bytes) => {
                let cmd = protocol::parse(bytes);
                if cmd == protocol::Command::Unknown {
                    debug!("tcpsrv: session {} unrecognised line acknowledged", slot);
                }
                let resp = protocol::execute(cmd, rotator);
                enqueue(stream, backlog, resp.as_bytes())
            }
            LineEvent::Overflow => {
                warn!(
                    "tcpsrv: session {} line exceeds {} bytes, discarding",
                    slot, MAX_LINE_LEN
                );
                Ok(())
            }
        })?;

        flush(&mut self.stream, &mut self.backlog)
    }

    /// Service one write readiness event.
    pub fn on_writable(&mut self) -> Result<(), CloseReason> {
        flush(&mut self.stream, &mut self.backlog)
    }
}

/// Append a reply, draining to the socket first if it would not fit.
fn enqueue<S: Write>(
    stream: &mut S,
    backlog: &mut Vec<u8, OUT_BUF_SIZE>,
    bytes: &[u8],
) -> Result<(), CloseReason> {
    if backlog.capacity() - backlog.len() < bytes.len() {
        flush(stream, backlog)?;
    }
    backlog
        .extend_from_slice(bytes)
        .map_err(|()| CloseReason::Backlogged)
}

/// Write until the backlog is empty or the socket would block.
fn flush<S: Write>(stream: &mut S, backlog: &mut Vec<u8, OUT_BUF_SIZE>) -> Result<(), CloseReason> {
    while !backlog.is_empty() {
        match stream.write(backlog.as_slice()) {
            Ok(0) => return Err(CloseReason::WriteFailed(io::ErrorKind::WriteZero)),
            Ok(n) => {
                let rest = backlog.len() - n;
                backlog.copy_within(n.., 0);
                backlog.truncate(rest);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(CloseReason::WriteFailed(e.kind())),
        }
    }
    Ok(())
}

// ── Pool ─────────────────────────────────────────────────────

/// Fixed arena of `N` session slots.  A slot is free when it holds `None`.
/// Capacity never changes after construction.
pub struct SessionPool<S, const N: usize = MAX_SESSIONS> {
    slots: Box<[Option<Session<S>>]>,
}

impl<S, const N: usize> SessionPool<S, N> {
    pub fn new() -> Self {
        Self {
            slots: (0..N).map(|_| None).collect(),
        }
    }

    /// Bind `stream` to the lowest free slot.  Hands the stream back when
    /// the pool is full.
    pub fn acquire(&mut self, stream: S, peer: SocketAddr) -> Result<usize, S> {
        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = Some(Session::new(stream, peer));
                Ok(slot)
            }
            None => Err(stream),
        }
    }

    /// Free a slot, returning its session (and so its stream) to the caller.
    pub fn release(&mut self, slot: usize) -> Option<Session<S>> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Session<S>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Occupied slots, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Session<S>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    pub fn active(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<S, const N: usize> Default for SessionPool<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

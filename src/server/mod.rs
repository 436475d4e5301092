//! Multi-session TCP command server.
//!
//! One thread, one listening socket, a bounded [`SessionPool`], and a
//! `poll(2)` reactor.  Each iteration waits for readiness, accepts at most
//! one connection, then services every ready session.  Session sockets are
//! non-blocking: replies queue in a bounded per-session backlog that is
//! flushed on write readiness, so the loop only ever blocks in the wait.
//!
//! ```text
//!  ┌─────────────────────────────── tcpsrv thread ─────────────────────────┐
//!  │  Poller::wait ──▶ listener ready? ──▶ accept ──▶ SessionPool::acquire  │
//!  │        │                                         (full → close)        │
//!  │        └────────▶ session ready? ──▶ read ──▶ LineBuffer ──▶ protocol  │
//!  │                                        │                  │           │
//!  │                                 EOF / error        RotatorPort        │
//!  │                                        ▼                              │
//!  │                                 SessionPool::release                  │
//!  └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A misbehaving connection only ever costs itself its slot.

pub mod protocol;
pub mod reactor;
pub mod session;

use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::os::fd::AsRawFd;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::{MAX_SESSIONS, READ_BUF_SIZE};
use crate::error::ServerError;
use crate::ports::RotatorPort;

pub use protocol::Command;
pub use reactor::{Poller, Readiness};
pub use session::{CloseReason, LineBuffer, LineEvent, SessionPool};

/// Poller token reserved for the listening socket.
const LISTENER_TOKEN: usize = usize::MAX;

pub struct CommandServer<R, const N: usize = MAX_SESSIONS> {
    listener: TcpListener,
    pool: SessionPool<TcpStream, N>,
    poller: Poller,
    rotator: R,
    scratch: Box<[u8; READ_BUF_SIZE]>,
}

impl<R: RotatorPort, const N: usize> CommandServer<R, N> {
    /// Bind and listen.  Failure here aborts server start-up.
    pub fn bind(addr: impl ToSocketAddrs, rotator: R) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).map_err(|e| ServerError::Bind(e.kind()))?;
        // accept() after a readiness report must never block, e.g. when the
        // peer reset in between.
        listener
            .set_nonblocking(true)
            .map_err(|e| ServerError::Bind(e.kind()))?;

        if let Ok(addr) = listener.local_addr() {
            info!("tcpsrv: listening on {} ({} session slots)", addr, N);
        }

        Ok(Self {
            listener,
            pool: SessionPool::new(),
            poller: Poller::with_capacity(N + 1),
            rotator,
            scratch: Box::new([0; READ_BUF_SIZE]),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn active_sessions(&self) -> usize {
        self.pool.active()
    }

    pub fn rotator(&self) -> &R {
        &self.rotator
    }

    /// Serve forever.  Returns only when the readiness wait fails.
    pub fn run(&mut self) -> Result<(), ServerError> {
        loop {
            self.poll_once(None)?;
        }
    }

    /// One reactor iteration.  Returns the number of ready descriptors
    /// (0 on timeout or signal interruption).
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<usize, ServerError> {
        self.poller.clear();
        self.poller
            .register(self.listener.as_raw_fd(), LISTENER_TOKEN, false);
        for (slot, session) in self.pool.iter() {
            self.poller
                .register(session.stream().as_raw_fd(), slot, session.wants_write());
        }

        let n = match self.poller.wait(timeout) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => {
                error!("tcpsrv: readiness wait failed: {}", e);
                return Err(ServerError::Poll(e.kind()));
            }
        };
        if n == 0 {
            return Ok(0);
        }

        // Listener first.  A fresh session lands in a slot that was free at
        // registration time, so it cannot match a ready token below.
        if self.poller.ready().any(|(token, _)| token == LISTENER_TOKEN) {
            self.accept();
        }

        for (token, ready) in self.poller.ready() {
            if token == LISTENER_TOKEN {
                continue;
            }
            let Some(session) = self.pool.get_mut(token) else {
                continue;
            };
            let mut outcome = Ok(());
            if ready.writable {
                outcome = session.on_writable();
            }
            if outcome.is_ok() && ready.readable {
                outcome = session.on_readable(token, &mut self.scratch[..], &self.rotator);
            }
            if let Err(reason) = outcome {
                if let Some(closed) = self.pool.release(token) {
                    info!(
                        "tcpsrv: session {} ({}) closed: {}",
                        token,
                        closed.peer(),
                        reason
                    );
                }
            }
        }

        Ok(n)
    }

    fn accept(&mut self) {
        let (stream, peer) = match self.listener.accept() {
            Ok(conn) => conn,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                return;
            }
            Err(e) => {
                warn!("tcpsrv: accept failed: {}", e);
                return;
            }
        };

        // Session I/O must never block the reactor.
        if let Err(e) = stream.set_nonblocking(true) {
            warn!("tcpsrv: {}: set_nonblocking failed, dropping: {}", peer, e);
            return;
        }
        if let Err(e) = stream.set_nodelay(true) {
            debug!("tcpsrv: {}: set_nodelay failed: {}", peer, e);
        }

        match self.pool.acquire(stream, peer) {
            Ok(slot) => info!(
                "tcpsrv: session {} accepted from {} ({}/{})",
                slot,
                peer,
                self.pool.active(),
                N
            ),
            Err(stream) => {
                error!("tcpsrv: session pool full, rejecting {}", peer);
                let _ = stream.shutdown(Shutdown::Both);
            }
        }
    }
}

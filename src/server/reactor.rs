//! Readiness multiplexing over raw descriptors with `poll(2)`.
//!
//! The interest list is rebuilt every iteration: register the listener and
//! each live session under a token, wait, then walk [`Poller::ready`].
//! Write interest is only registered while a session has replies queued.

use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Everything that should wake the owner of a read interest.  Hang-ups and
/// errors are reported as readable so the next `read` surfaces them.
const READABLE: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;

/// What a descriptor became ready for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub readable: bool,
    pub writable: bool,
}

pub struct Poller {
    fds: Vec<libc::pollfd>,
    tokens: Vec<usize>,
}

impl Poller {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fds: Vec::with_capacity(capacity),
            tokens: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.fds.clear();
        self.tokens.clear();
    }

    /// Watch `fd` for readability, and for writability too when `writable`
    /// is set, reporting it as `token` when ready.
    pub fn register(&mut self, fd: RawFd, token: usize, writable: bool) {
        let events = if writable {
            libc::POLLIN | libc::POLLOUT
        } else {
            libc::POLLIN
        };
        self.fds.push(libc::pollfd {
            fd,
            events,
            revents: 0,
        });
        self.tokens.push(token);
    }

    /// Block until at least one registered descriptor is ready, or until
    /// `timeout` elapses.  `None` waits indefinitely.
    ///
    /// Returns the number of ready descriptors.  A signal interruption is
    /// returned as `ErrorKind::Interrupted` for the caller to retry.
    pub fn wait(&mut self, timeout: Option<Duration>) -> io::Result<usize> {
        let timeout_ms: libc::c_int = match timeout {
            None => -1,
            Some(d) => d.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
        };

        // SAFETY: `fds` is a live, exclusively borrowed array of exactly
        // `fds.len()` pollfd entries for the duration of the call.
        let ret = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    /// Tokens whose descriptor became ready in the last [`wait`](Self::wait).
    pub fn ready(&self) -> impl Iterator<Item = (usize, Readiness)> + '_ {
        self.fds.iter().zip(&self.tokens).filter_map(|(fd, &token)| {
            let readiness = Readiness {
                readable: fd.revents & READABLE != 0,
                writable: fd.revents & libc::POLLOUT != 0,
            };
            (readiness.readable || readiness.writable).then_some((token, readiness))
        })
    }

    pub fn len(&self) -> usize {
        self.fds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }
}

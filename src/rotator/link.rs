//! Mailbox between the command context and the sampling context.
//!
//! The sampling side owns the [`AxisController`](super::axis::AxisController)
//! outright.  The command side never touches it: it leaves a [`Request`]
//! here and reads back whatever the sampler last published.  Every access
//! is a critical section copying a handful of scalars.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::axis::AxisState;

/// Command waiting to be applied on the next sampling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// `set_target` with the carried value.
    Track(i32),
    Stop,
}

/// Point-in-time view of one axis.  Position and state always come from
/// the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSnapshot {
    pub position: i32,
    pub target: i32,
    pub state: AxisState,
}

#[derive(Clone, Copy)]
struct LinkState {
    target: i32,
    pending: Option<Request>,
    position: i32,
    state: AxisState,
}

pub struct AxisLink {
    inner: Mutex<CriticalSectionRawMutex, Cell<LinkState>>,
}

impl AxisLink {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(LinkState {
                target: 0,
                pending: None,
                position: 0,
                state: AxisState::Stopped,
            })),
        }
    }

    fn update(&self, f: impl FnOnce(&mut LinkState)) {
        self.inner.lock(|cell| {
            let mut s = cell.get();
            f(&mut s);
            cell.set(s);
        });
    }

    // ── command side ──

    /// Queue a new target.  A later request replaces an unapplied one.
    pub fn set_target(&self, value: i32) {
        self.update(|s| {
            s.target = value;
            s.pending = Some(Request::Track(value));
        });
    }

    pub fn stop(&self) {
        self.update(|s| s.pending = Some(Request::Stop));
    }

    /// Last published position.
    pub fn position(&self) -> i32 {
        self.inner.lock(|cell| cell.get().position)
    }

    pub fn snapshot(&self) -> AxisSnapshot {
        self.inner.lock(|cell| {
            let s = cell.get();
            AxisSnapshot {
                position: s.position,
                target: s.target,
                state: s.state,
            }
        })
    }

    // ── sampling side ──

    /// Take the pending request, if any.
    pub fn take_request(&self) -> Option<Request> {
        self.inner.lock(|cell| {
            let mut s = cell.get();
            let req = s.pending.take();
            cell.set(s);
            req
        })
    }

    /// Publish the result of a tick.  Position and state land together.
    pub fn publish(&self, position: i32, state: AxisState) {
        self.update(|s| {
            s.position = position;
            s.state = state;
        });
    }
}

impl Default for AxisLink {
    fn default() -> Self {
        Self::new()
    }
}

//! Per-axis position control with start/stop hysteresis.
//!
//! ```text
//!            set_target()                   error > start
//!  ┌─────────┐ ─────────▶ ┌──────────┐ ───────────────────▶ ┌────────────────┐
//!  │ Stopped │            │ Tracking │                      │ Moving{Inc,Dec}│
//!  └─────────┘ ◀───────── └──────────┘ ◀─────────────────── └────────────────┘
//!               stop()                      error < stop
//! ```
//!
//! Raw samples are summed over one oversampling window; the state machine
//! only runs when a window completes.  The motor starts once the error
//! exceeds `start_threshold` and runs until it drops under the tighter
//! `stop_threshold`.

use embedded_hal::digital::OutputPin;
use log::{debug, warn};

use super::scale::ScaleConverter;
use crate::config::AxisConfig;
use crate::ports::AnalogInput;

/// Control state of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AxisState {
    /// Outputs released; ignores the target until re-armed.
    Stopped = 0,
    /// Holding position inside the dead band.
    Tracking = 1,
    /// Increase output asserted.
    MovingIncrease = 2,
    /// Decrease output asserted.
    MovingDecrease = 3,
}

/// Which motor output, if any, is asserted.  Both at once is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Idle,
    Increase,
    Decrease,
}

pub struct AxisController<A, P> {
    name: &'static str,
    input: A,
    increase: P,
    decrease: P,
    scale: ScaleConverter,
    start_threshold: i32,
    stop_threshold: i32,
    oversampling: u32,

    accumulator: i32,
    sample_count: u32,
    position: i32,
    target: i32,
    state: AxisState,
    drive: Drive,
}

impl<A: AnalogInput, P: OutputPin> AxisController<A, P> {
    /// Wire up an axis.  Both outputs are driven low immediately.
    pub fn new(
        name: &'static str,
        input: A,
        increase: P,
        decrease: P,
        cfg: &AxisConfig,
        oversampling: u32,
    ) -> Self {
        let mut axis = Self {
            name,
            input,
            increase,
            decrease,
            scale: ScaleConverter::from_config(cfg),
            start_threshold: cfg.start_threshold,
            stop_threshold: cfg.stop_threshold,
            oversampling: oversampling.max(1),
            accumulator: 0,
            sample_count: 0,
            position: 0,
            target: 0,
            state: AxisState::Stopped,
            drive: Drive::Idle,
        };
        axis.set_drive(Drive::Idle);
        axis
    }

    /// One sampling tick.  Returns `true` when an oversampling window
    /// completed and the state machine ran.
    pub fn poll(&mut self) -> bool {
        let raw = i32::from(self.input.read_raw());
        self.accumulator = self.accumulator.saturating_add(raw);
        self.sample_count += 1;

        if self.sample_count < self.oversampling {
            return false;
        }

        self.position = self.scale.convert(self.accumulator);
        self.accumulator = 0;
        self.sample_count = 0;

        self.evaluate();
        true
    }

    fn evaluate(&mut self) {
        let pos = self.position;
        let target = self.target;

        let next = match self.state {
            AxisState::Stopped => {
                self.set_drive(Drive::Idle);
                AxisState::Stopped
            }
            AxisState::Tracking => {
                if pos.saturating_sub(self.start_threshold) > target {
                    self.set_drive(Drive::Decrease);
                    AxisState::MovingDecrease
                } else if pos.saturating_add(self.start_threshold) < target {
                    self.set_drive(Drive::Increase);
                    AxisState::MovingIncrease
                } else {
                    // Dead band.  A redirect via set_target may have left
                    // the previous drive asserted.
                    self.set_drive(Drive::Idle);
                    AxisState::Tracking
                }
            }
            AxisState::MovingIncrease => {
                if pos.saturating_add(self.stop_threshold) > target {
                    self.set_drive(Drive::Idle);
                    AxisState::Tracking
                } else {
                    AxisState::MovingIncrease
                }
            }
            AxisState::MovingDecrease => {
                if pos.saturating_sub(self.stop_threshold) < target {
                    self.set_drive(Drive::Idle);
                    AxisState::Tracking
                } else {
                    AxisState::MovingDecrease
                }
            }
        };

        if next != self.state {
            debug!(
                "{}: {:?} -> {:?} (pos={} target={})",
                self.name, self.state, next, pos, target
            );
            self.state = next;
        }
    }

    /// Command a new target and (re-)arm the axis.
    ///
    /// Outputs are left alone; the next completed window decides whether
    /// to keep moving, reverse, or idle.
    pub fn set_target(&mut self, value: i32) {
        self.target = value;
        self.state = AxisState::Tracking;
    }

    /// Release both outputs and disarm until the next `set_target`.
    pub fn stop(&mut self) {
        self.set_drive(Drive::Idle);
        self.state = AxisState::Stopped;
    }

    /// Last completed window, in axis units.
    pub fn current_position(&self) -> i32 {
        self.position
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    pub fn state(&self) -> AxisState {
        self.state
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn set_drive(&mut self, drive: Drive) {
        // Release first so the two outputs never overlap.
        match drive {
            Drive::Idle => {
                write_pin(self.name, &mut self.increase, false);
                write_pin(self.name, &mut self.decrease, false);
            }
            Drive::Increase => {
                write_pin(self.name, &mut self.decrease, false);
                write_pin(self.name, &mut self.increase, true);
            }
            Drive::Decrease => {
                write_pin(self.name, &mut self.increase, false);
                write_pin(self.name, &mut self.decrease, true);
            }
        }
        self.drive = drive;
    }
}

fn write_pin<P: OutputPin>(name: &str, pin: &mut P, high: bool) {
    let res = if high { pin.set_high() } else { pin.set_low() };
    if let Err(e) = res {
        warn!("{}: output write failed: {:?}", name, e);
    }
}

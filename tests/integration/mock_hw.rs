//! Mock hardware for integration tests.
//!
//! A [`Plant`] stands in for one motorised axis: its potentiometer reading
//! moves while a drive output is asserted, and it records whether both
//! outputs were ever high at once.

use core::convert::Infallible;
use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use rotator::config::AxisConfig;
use rotator::ports::AnalogInput;
use rotator::rotator::AxisController;

/// Samples per window in these tests.
pub const K: u32 = 4;

/// Position (0.01°) equals `K * sample` over the whole range.
pub fn linear_axis() -> AxisConfig {
    AxisConfig {
        raw_min: 0,
        raw_max: 40_000,
        out_min: 0,
        out_max: 40_000,
        start_threshold: 100,
        stop_threshold: 50,
    }
}

// ── Shared plant state ────────────────────────────────────────

#[derive(Default)]
struct PlantState {
    sample: Cell<u16>,
    increase: Cell<bool>,
    decrease: Cell<bool>,
    overlap: Cell<bool>,
    writes: Cell<u32>,
}

#[derive(Clone, Default)]
pub struct Plant(Rc<PlantState>);

#[allow(dead_code)]
impl Plant {
    pub fn at(position: i32) -> Self {
        let p = Self::default();
        p.set_position(position);
        p
    }

    pub fn set_position(&self, position: i32) {
        self.0.sample.set((position / K as i32).clamp(0, i32::from(u16::MAX)) as u16);
    }

    /// Position the feedback currently reads, in 0.01°.
    pub fn position(&self) -> i32 {
        i32::from(self.0.sample.get()) * K as i32
    }

    /// Move the axis one step in whichever direction is driven.
    pub fn step(&self, per_tick: u16) {
        let s = self.0.sample.get();
        if self.0.increase.get() {
            self.0.sample.set(s.saturating_add(per_tick));
        } else if self.0.decrease.get() {
            self.0.sample.set(s.saturating_sub(per_tick));
        }
    }

    pub fn increase(&self) -> bool {
        self.0.increase.get()
    }

    pub fn decrease(&self) -> bool {
        self.0.decrease.get()
    }

    pub fn overlap_seen(&self) -> bool {
        self.0.overlap.get()
    }

    pub fn writes(&self) -> u32 {
        self.0.writes.get()
    }

    pub fn input(&self) -> MockInput {
        MockInput(self.clone())
    }

    pub fn pins(&self) -> (MockPin, MockPin) {
        (
            MockPin {
                plant: self.clone(),
                increase: true,
            },
            MockPin {
                plant: self.clone(),
                increase: false,
            },
        )
    }

    pub fn axis(&self, name: &'static str) -> AxisController<MockInput, MockPin> {
        let (inc, dec) = self.pins();
        AxisController::new(name, self.input(), inc, dec, &linear_axis(), K)
    }
}

// ── Input / output mocks ──────────────────────────────────────

pub struct MockInput(Plant);

impl AnalogInput for MockInput {
    fn read_raw(&mut self) -> u16 {
        self.0.0.sample.get()
    }
}

pub struct MockPin {
    plant: Plant,
    increase: bool,
}

impl MockPin {
    fn write(&mut self, level: bool) {
        let s = &self.plant.0;
        if self.increase {
            s.increase.set(level);
        } else {
            s.decrease.set(level);
        }
        s.writes.set(s.writes.get() + 1);
        if s.increase.get() && s.decrease.get() {
            s.overlap.set(true);
        }
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.write(true);
        Ok(())
    }
}

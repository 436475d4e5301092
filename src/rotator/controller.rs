//! Client-facing rotator handle.
//!
//! Translates between float degrees and integer axis units and forwards to
//! the per-axis [`AxisLink`]s.  Nothing here blocks on hardware.

use core::fmt;
use std::sync::Arc;

use super::link::{AxisLink, AxisSnapshot};
use crate::config::UNITS_PER_DEGREE;
use crate::ports::RotatorPort;

/// Degrees to axis units, rounded to nearest.  Out-of-range values
/// saturate at the `i32` bounds and NaN becomes 0; the axis calibration
/// clamps whatever is left.
pub fn degrees_to_units(degrees: f32) -> i32 {
    (degrees * UNITS_PER_DEGREE).round() as i32
}

pub fn units_to_degrees(units: i32) -> f32 {
    units as f32 / UNITS_PER_DEGREE
}

#[derive(Clone)]
pub struct RotatorController {
    azimuth: Arc<AxisLink>,
    elevation: Arc<AxisLink>,
}

impl RotatorController {
    pub fn new(azimuth: Arc<AxisLink>, elevation: Arc<AxisLink>) -> Self {
        Self { azimuth, elevation }
    }

    /// Command both axes, in degrees.  Re-arms a stopped axis.
    pub fn set_position(&self, azimuth: f32, elevation: f32) {
        self.azimuth.set_target(degrees_to_units(azimuth));
        self.elevation.set_target(degrees_to_units(elevation));
    }

    /// Last filtered position of both axes, in degrees.
    pub fn get_position(&self) -> (f32, f32) {
        (
            units_to_degrees(self.azimuth.position()),
            units_to_degrees(self.elevation.position()),
        )
    }

    /// Release both motors until the next `set_position`.
    pub fn stop(&self) {
        self.azimuth.stop();
        self.elevation.stop();
    }

    pub fn status(&self) -> RotatorStatus {
        RotatorStatus {
            azimuth: self.azimuth.snapshot(),
            elevation: self.elevation.snapshot(),
        }
    }
}

impl RotatorPort for RotatorController {
    fn set_position(&self, azimuth: f32, elevation: f32) {
        Self::set_position(self, azimuth, elevation);
    }

    fn get_position(&self) -> (f32, f32) {
        Self::get_position(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotatorStatus {
    pub azimuth: AxisSnapshot,
    pub elevation: AxisSnapshot,
}

impl fmt::Display for RotatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "azi={:.2} ele={:.2} (azi {:?}, ele {:?})",
            units_to_degrees(self.azimuth.position),
            units_to_degrees(self.elevation.position),
            self.azimuth.state,
            self.elevation.state,
        )
    }
}

//! System configuration parameters
//!
//! Compile-time capacities for the command server and the sampling
//! pipeline, plus the per-axis calibration carried in [`RotatorConfig`].
//!
//! Angles inside the firmware are integer hundredths of a degree; raw
//! positions are the sum of [`OVERSAMPLING`] consecutive 12-bit ADC samples.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Command server
// ---------------------------------------------------------------------------

/// TCP port of the line protocol (rotctld default).
pub const SERVER_PORT: u16 = 4533;
/// Session pool capacity.  Connections beyond this are closed on accept.
pub const MAX_SESSIONS: usize = 16;
/// Per-session line assembly buffer, including room for the terminator.
pub const LINE_BUF_SIZE: usize = 1024;
/// Scratch buffer for a single socket read.
pub const READ_BUF_SIZE: usize = 1024;
/// Replies a session may have queued but not yet sent.  A peer that lets
/// this fill up without reading is disconnected.
pub const OUT_BUF_SIZE: usize = 512;

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Raw samples averaged into one filtered position.
pub const OVERSAMPLING: u32 = 16;
/// Filtered position updates per second, per axis.
pub const UPDATE_RATE_HZ: u32 = 50;
/// Azimuth + elevation.
pub const AXIS_COUNT: usize = 2;
/// Fixed-point scale between client degrees and axis units.
pub const UNITS_PER_DEGREE: f32 = 100.0;

/// Largest value a single ADC1 conversion can return (12-bit).
pub const ADC_FULL_SCALE: i32 = 4095;

/// Calibration and hysteresis for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Summed raw reading at the low mechanical stop.
    pub raw_min: i32,
    /// Summed raw reading at the high mechanical stop.
    pub raw_max: i32,
    /// Angle (0.01°) reported at `raw_min`.
    pub out_min: i32,
    /// Angle (0.01°) reported at `raw_max`.
    pub out_max: i32,
    /// Error (0.01°) that starts the motor.
    pub start_threshold: i32,
    /// Error (0.01°) under which a moving motor stops.
    pub stop_threshold: i32,
}

/// Core rotator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatorConfig {
    /// Command server listen port.
    pub port: u16,
    /// Samples per filtered position.
    pub oversampling: u32,
    /// Filtered position updates per second.
    pub update_rate_hz: u32,
    pub azimuth: AxisConfig,
    pub elevation: AxisConfig,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        let os = OVERSAMPLING as i32;
        Self {
            port: SERVER_PORT,
            oversampling: OVERSAMPLING,
            update_rate_hz: UPDATE_RATE_HZ,

            // 0..360° over the potentiometer's usable span
            azimuth: AxisConfig {
                raw_min: 550 * os,
                raw_max: 4010 * os,
                out_min: 0,
                out_max: 36_000,
                start_threshold: 100,
                stop_threshold: 50,
            },

            // 0..180°
            elevation: AxisConfig {
                raw_min: 500 * os,
                raw_max: 4010 * os,
                out_min: 0,
                out_max: 18_000,
                start_threshold: 100,
                stop_threshold: 50,
            },
        }
    }
}

impl RotatorConfig {
    /// Sampling timer period in microseconds.
    pub fn sample_period_us(&self) -> u64 {
        let rate = u64::from(self.update_rate_hz) * u64::from(self.oversampling);
        1_000_000 / rate.max(1)
    }

    /// Reject calibrations the control loop cannot work with.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.oversampling == 0 {
            return Err("oversampling must be non-zero");
        }
        if self.update_rate_hz == 0 {
            return Err("update rate must be non-zero");
        }
        validate_axis(&self.azimuth).map_err(|_| "azimuth calibration invalid")?;
        validate_axis(&self.elevation).map_err(|_| "elevation calibration invalid")?;
        Ok(())
    }
}

fn validate_axis(axis: &AxisConfig) -> Result<(), ()> {
    if axis.raw_min >= axis.raw_max || axis.out_min == axis.out_max {
        return Err(());
    }
    if axis.start_threshold < 0 || axis.stop_threshold < 0 {
        return Err(());
    }
    if axis.stop_threshold > axis.start_threshold {
        return Err(());
    }
    Ok(())
}

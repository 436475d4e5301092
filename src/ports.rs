//! Port traits: the boundary between control logic and the outside world.
//!
//! ```text
//!   ADC adapter ──▶ AnalogInput ──▶ AxisController ──▶ OutputPin ──▶ GPIO
//!                                         ▲
//!   CommandServer ──▶ RotatorPort ────────┘ (via AxisLink)
//! ```
//!
//! Motor outputs use [`embedded_hal::digital::OutputPin`] directly, so any
//! HAL pin driver can be wired to an axis.  Position feedback has no
//! equivalent in `embedded-hal` 1.0 and gets its own trait here.

// ───────────────────────────────────────────────────────────────
// Analog input (driven adapter: hardware → axis)
// ───────────────────────────────────────────────────────────────

/// One analog feedback channel.
///
/// Reads are assumed to always succeed; a platform that can fail must
/// substitute a value (the ESP-IDF adapter returns 0).
pub trait AnalogInput {
    /// Take one raw conversion.
    fn read_raw(&mut self) -> u16;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    fn read_raw(&mut self) -> u16 {
        (**self).read_raw()
    }
}

// ───────────────────────────────────────────────────────────────
// Rotator port (driving adapter: command server → rotator)
// ───────────────────────────────────────────────────────────────

/// What the command server needs from the rotator.
///
/// Both calls touch cached state only and never block on hardware.
pub trait RotatorPort {
    /// Command new targets, in degrees.  Out-of-range values are clamped
    /// by the axis calibration, not here.
    fn set_position(&self, azimuth: f32, elevation: f32);

    /// Last filtered position, in degrees.
    fn get_position(&self) -> (f32, f32);
}

impl<T: RotatorPort + ?Sized> RotatorPort for &T {
    fn set_position(&self, azimuth: f32, elevation: f32) {
        (**self).set_position(azimuth, elevation);
    }

    fn get_position(&self) -> (f32, f32) {
        (**self).get_position()
    }
}

impl<T: RotatorPort + ?Sized> RotatorPort for std::sync::Arc<T> {
    fn set_position(&self, azimuth: f32, elevation: f32) {
        (**self).set_position(azimuth, elevation);
    }

    fn get_position(&self) -> (f32, f32) {
        (**self).get_position()
    }
}

//! GPIO / ADC assignments for the rotator controller board (ESP32).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Motor drive outputs (relay / H-bridge inputs, active HIGH)
// ---------------------------------------------------------------------------

/// Elevation: raise (increasing angle).
pub const ELEVATION_UP_GPIO: i32 = 14;
/// Elevation: lower.
pub const ELEVATION_DOWN_GPIO: i32 = 27;
/// Azimuth: increasing angle on the reference wiring.
pub const AZIMUTH_LEFT_GPIO: i32 = 13;
/// Azimuth: decreasing angle.
pub const AZIMUTH_RIGHT_GPIO: i32 = 12;

/// Every motor output, for one-shot configuration.
pub const MOTOR_OUTPUTS: [i32; 4] = [
    ELEVATION_UP_GPIO,
    ELEVATION_DOWN_GPIO,
    AZIMUTH_LEFT_GPIO,
    AZIMUTH_RIGHT_GPIO,
];

// ---------------------------------------------------------------------------
// Position feedback: potentiometers on ADC1
// ---------------------------------------------------------------------------

/// Elevation potentiometer, ADC1 channel 0 (GPIO 36).
pub const ELEVATION_ADC_CHANNEL: u32 = 0;
/// Azimuth potentiometer, ADC1 channel 3 (GPIO 39).
pub const AZIMUTH_ADC_CHANNEL: u32 = 3;

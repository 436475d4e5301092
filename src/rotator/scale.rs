//! Saturating linear map from summed ADC readings to axis units.

use crate::config::AxisConfig;

/// Maps `[raw_min, raw_max]` onto `[out_min, out_max]`, clamping outside.
///
/// `out_min > out_max` is allowed for axes whose potentiometer is wired
/// backwards.  Interpolation is integer-only and widened to 64 bits, so the
/// endpoints are hit exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleConverter {
    raw_min: i32,
    raw_max: i32,
    out_min: i32,
    out_max: i32,
}

impl ScaleConverter {
    pub const fn new(raw_min: i32, raw_max: i32, out_min: i32, out_max: i32) -> Self {
        Self {
            raw_min,
            raw_max,
            out_min,
            out_max,
        }
    }

    pub const fn from_config(cfg: &AxisConfig) -> Self {
        Self::new(cfg.raw_min, cfg.raw_max, cfg.out_min, cfg.out_max)
    }

    pub fn convert(&self, value: i32) -> i32 {
        // With raw_min >= raw_max every value lands in one of these two
        // branches, so the division below never sees a zero span.
        if value <= self.raw_min {
            return self.out_min;
        }
        if value >= self.raw_max {
            return self.out_max;
        }

        let out_span = i64::from(self.out_max) - i64::from(self.out_min);
        let raw_span = i64::from(self.raw_max) - i64::from(self.raw_min);
        let offset = i64::from(value) - i64::from(self.raw_min);

        (i64::from(self.out_min) + out_span * offset / raw_span) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_below_and_above() {
        let s = ScaleConverter::new(100, 1100, 0, 36_000);
        assert_eq!(s.convert(i32::MIN), 0);
        assert_eq!(s.convert(99), 0);
        assert_eq!(s.convert(100), 0);
        assert_eq!(s.convert(1100), 36_000);
        assert_eq!(s.convert(5000), 36_000);
        assert_eq!(s.convert(i32::MAX), 36_000);
    }

    #[test]
    fn interpolates_linearly() {
        let s = ScaleConverter::new(0, 1000, 0, 18_000);
        assert_eq!(s.convert(500), 9_000);
        assert_eq!(s.convert(250), 4_500);
        assert_eq!(s.convert(1), 18);
    }

    #[test]
    fn inverted_output_range() {
        let s = ScaleConverter::new(0, 1000, 36_000, 0);
        assert_eq!(s.convert(-5), 36_000);
        assert_eq!(s.convert(500), 18_000);
        assert_eq!(s.convert(2000), 0);
    }

    #[test]
    fn default_azimuth_span_does_not_overflow() {
        let cfg = crate::config::RotatorConfig::default();
        let s = ScaleConverter::from_config(&cfg.azimuth);
        // Full-scale oversampled reading sits above raw_max.
        assert_eq!(s.convert(4095 * 16), 36_000);
        assert_eq!(s.convert(cfg.azimuth.raw_max - 1), 35_999);
    }

    #[test]
    fn degenerate_span_never_divides() {
        let s = ScaleConverter::new(500, 500, 0, 100);
        assert_eq!(s.convert(499), 0);
        assert_eq!(s.convert(500), 0);
        assert_eq!(s.convert(501), 100);
    }
}

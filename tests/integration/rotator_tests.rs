//! RotatorController + Sampler against simulated axes.
//!
//! Each test closes the loop: the plant moves while an output is driven,
//! the sampler feeds the new reading back into the axis.

use std::sync::Arc;

use rotator::rotator::{AxisLink, AxisState, LinkedAxis, RotatorController, Sampler};

use super::mock_hw::{K, MockInput, MockPin, Plant};

struct Rig {
    rotator: RotatorController,
    sampler: Sampler<MockInput, MockPin>,
    az: Plant,
    el: Plant,
}

impl Rig {
    fn new(az_pos: i32, el_pos: i32) -> Self {
        let az = Plant::at(az_pos);
        let el = Plant::at(el_pos);
        let az_link = Arc::new(AxisLink::new());
        let el_link = Arc::new(AxisLink::new());
        let sampler = Sampler::new(
            LinkedAxis::new(az.axis("azimuth"), az_link.clone()),
            LinkedAxis::new(el.axis("elevation"), el_link.clone()),
        );
        Self {
            rotator: RotatorController::new(az_link, el_link),
            sampler,
            az,
            el,
        }
    }

    /// Advance `n` sampling ticks, moving each plant by `speed` raw
    /// counts per tick while driven.
    fn run(&mut self, n: u32, speed: u16) {
        for _ in 0..n {
            self.az.step(speed);
            self.el.step(speed);
            self.sampler.tick();
            assert!(!self.az.overlap_seen(), "azimuth outputs overlapped");
            assert!(!self.el.overlap_seen(), "elevation outputs overlapped");
        }
    }

    fn settled(&self) -> bool {
        let s = self.rotator.status();
        s.azimuth.state == AxisState::Tracking
            && s.elevation.state == AxisState::Tracking
            && !self.az.increase()
            && !self.az.decrease()
            && !self.el.increase()
            && !self.el.decrease()
    }
}

#[test]
fn idle_until_first_command() {
    let mut rig = Rig::new(5_000, 2_000);
    rig.run(4 * K, 1);
    let s = rig.rotator.status();
    assert_eq!(s.azimuth.state, AxisState::Stopped);
    assert_eq!(s.elevation.state, AxisState::Stopped);
    assert_eq!(rig.az.position(), 5_000);

    let (az, el) = rig.rotator.get_position();
    assert!((az - 50.0).abs() < 0.01);
    assert!((el - 20.0).abs() < 0.01);
}

#[test]
fn position_lags_until_window_completes() {
    let mut rig = Rig::new(1_000, 1_000);
    rig.run(K, 0);
    rig.az.set_position(3_000);

    rig.run(K - 1, 0);
    let (az, _) = rig.rotator.get_position();
    assert!((az - 10.0).abs() < 0.01, "stale until window completes: {az}");

    rig.run(1, 0);
    let (az, _) = rig.rotator.get_position();
    assert!((az - 30.0).abs() < 0.01);
}

#[test]
fn tracks_to_commanded_position() {
    let mut rig = Rig::new(0, 0);
    rig.run(K, 0);

    rig.rotator.set_position(10.0, 20.0);
    // Acknowledged immediately, but nothing has moved yet.
    let (az, el) = rig.rotator.get_position();
    assert_eq!((az, el), (0.0, 0.0));

    rig.run(K, 1);
    assert!(rig.az.increase());
    assert!(rig.el.increase());
    assert_eq!(rig.rotator.status().azimuth.state, AxisState::MovingIncrease);

    let mut ticks = 0;
    while !rig.settled() && ticks < 10_000 {
        rig.run(1, 1);
        ticks += 1;
    }
    assert!(rig.settled(), "did not settle in {ticks} ticks");

    let (az, el) = rig.rotator.get_position();
    assert!((az - 10.0).abs() <= 1.0, "azimuth {az}");
    assert!((el - 20.0).abs() <= 1.0, "elevation {el}");

    // Settled means settled: no further motion.
    let before = (rig.az.position(), rig.el.position());
    rig.run(10 * K, 1);
    assert_eq!((rig.az.position(), rig.el.position()), before);
}

#[test]
fn decreasing_move_settles_from_above() {
    let mut rig = Rig::new(30_000, 9_000);
    rig.run(K, 0);
    rig.rotator.set_position(250.0, 45.0);

    rig.run(K, 2);
    assert!(rig.az.decrease());
    assert!(rig.el.decrease());

    for _ in 0..20_000 {
        if rig.settled() {
            break;
        }
        rig.run(1, 2);
    }
    assert!(rig.settled());
    let (az, el) = rig.rotator.get_position();
    assert!((az - 250.0).abs() <= 1.0, "azimuth {az}");
    assert!((el - 45.0).abs() <= 1.0, "elevation {el}");
}

#[test]
fn stop_halts_motion_on_next_tick() {
    let mut rig = Rig::new(0, 0);
    rig.rotator.set_position(180.0, 90.0);
    rig.run(2 * K, 1);
    assert!(rig.az.increase());

    rig.rotator.stop();
    rig.run(1, 1);
    assert!(!rig.az.increase() && !rig.az.decrease());
    assert!(!rig.el.increase() && !rig.el.decrease());
    assert_eq!(rig.rotator.status().azimuth.state, AxisState::Stopped);

    let frozen = rig.az.position();
    rig.run(10 * K, 1);
    assert_eq!(rig.az.position(), frozen);

    // A new command re-arms.
    rig.rotator.set_position(180.0, 90.0);
    rig.run(K, 1);
    assert!(rig.az.increase());
}

#[test]
fn redirect_mid_move_reverses_cleanly() {
    let mut rig = Rig::new(10_000, 0);
    rig.rotator.set_position(200.0, 0.0);
    rig.run(8 * K, 2);
    assert!(rig.az.increase());

    rig.rotator.set_position(50.0, 0.0);
    for _ in 0..20_000 {
        if rig.settled() {
            break;
        }
        rig.run(1, 2);
    }
    assert!(rig.settled());
    let (az, _) = rig.rotator.get_position();
    assert!((az - 50.0).abs() <= 1.0, "azimuth {az}");
}

#[test]
fn out_of_range_target_is_clamped_by_calibration() {
    let mut rig = Rig::new(39_000, 0);
    rig.rotator.set_position(1000.0, 0.0);
    // The feedback saturates at out_max and the axis just keeps pushing.
    rig.run(4 * K, 0);
    assert!(rig.az.increase());
    assert_eq!(rig.rotator.status().azimuth.target, 100_000);

    rig.az.set_position(40_000);
    rig.run(2 * K, 0);
    let (az, _) = rig.rotator.get_position();
    assert!((az - 400.0).abs() < 0.01);
}

#[test]
fn sampler_counts_ticks() {
    let mut rig = Rig::new(0, 0);
    rig.run(10, 0);
    assert_eq!(rig.sampler.ticks(), 10);
    assert_eq!(rig.sampler.azimuth().name(), "azimuth");
    assert_eq!(rig.sampler.elevation().name(), "elevation");
}

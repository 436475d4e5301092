//! Property tests for the control core and the line protocol.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use core::convert::Infallible;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use embedded_hal::digital::{ErrorType, OutputPin};
use proptest::prelude::*;
use rotator::config::AxisConfig;
use rotator::ports::AnalogInput;
use rotator::rotator::{AxisController, AxisLink, AxisState, Drive, RotatorController, ScaleConverter};
use rotator::rotator::controller::degrees_to_units;
use rotator::server::protocol::{self, Command, RESPONSE_CAP};
use rotator::server::{LineBuffer, LineEvent};

// ── ScaleConverter ────────────────────────────────────────────

proptest! {
    /// Output never leaves the calibrated range, whatever the input.
    #[test]
    fn scale_output_stays_in_range(
        raw_min in -100_000i32..100_000,
        raw_span in 1i32..100_000,
        out_a in -1_000_000i32..1_000_000,
        out_b in -1_000_000i32..1_000_000,
        value in any::<i32>(),
    ) {
        let s = ScaleConverter::new(raw_min, raw_min + raw_span, out_a, out_b);
        let out = s.convert(value);
        prop_assert!(out >= out_a.min(out_b) && out <= out_a.max(out_b));
    }

    /// A forward calibration is monotonic non-decreasing.
    #[test]
    fn scale_is_monotonic(
        raw_min in -100_000i32..100_000,
        raw_span in 1i32..100_000,
        out_min in -1_000_000i32..1_000_000,
        out_span in 0i32..1_000_000,
        a in any::<i32>(),
        b in any::<i32>(),
    ) {
        let s = ScaleConverter::new(raw_min, raw_min + raw_span, out_min, out_min + out_span);
        let (lo, hi) = (a.min(b), a.max(b));
        prop_assert!(s.convert(lo) <= s.convert(hi));
    }
}

// ── AxisController output exclusivity ────────────────────────

#[derive(Default)]
struct Outputs {
    increase: Cell<bool>,
    decrease: Cell<bool>,
    overlap: Cell<bool>,
}

struct Pin {
    outputs: Rc<Outputs>,
    increase: bool,
}

impl ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

impl Pin {
    fn set(&self, level: bool) {
        let o = &self.outputs;
        if self.increase {
            o.increase.set(level);
        } else {
            o.decrease.set(level);
        }
        if o.increase.get() && o.decrease.get() {
            o.overlap.set(true);
        }
    }
}

struct Input(Rc<Cell<u16>>);

impl AnalogInput for Input {
    fn read_raw(&mut self) -> u16 {
        self.0.get()
    }
}

#[derive(Debug, Clone)]
enum AxisOp {
    Sample(u16),
    Target(i32),
    Stop,
}

fn arb_axis_op() -> impl Strategy<Value = AxisOp> {
    prop_oneof![
        6 => any::<u16>().prop_map(AxisOp::Sample),
        2 => (-10_000i32..50_000).prop_map(AxisOp::Target),
        1 => Just(AxisOp::Stop),
    ]
}

proptest! {
    /// Whatever the feedback does and however often the target changes,
    /// both drive outputs are never asserted together, and the moving
    /// states always agree with the asserted output.
    #[test]
    fn outputs_never_overlap(ops in proptest::collection::vec(arb_axis_op(), 1..400)) {
        let outputs = Rc::new(Outputs::default());
        let sample = Rc::new(Cell::new(0u16));
        let cfg = AxisConfig {
            raw_min: 0,
            raw_max: 65_535 * 4,
            out_min: 0,
            out_max: 36_000,
            start_threshold: 100,
            stop_threshold: 20,
        };
        let mut axis = AxisController::new(
            "prop",
            Input(sample.clone()),
            Pin { outputs: outputs.clone(), increase: true },
            Pin { outputs: outputs.clone(), increase: false },
            &cfg,
            4,
        );

        for op in ops {
            match op {
                AxisOp::Sample(v) => {
                    sample.set(v);
                    axis.poll();
                }
                AxisOp::Target(t) => axis.set_target(t),
                AxisOp::Stop => axis.stop(),
            }

            prop_assert!(!outputs.overlap.get());
            match axis.state() {
                AxisState::Stopped => prop_assert_eq!(axis.drive(), Drive::Idle),
                AxisState::MovingIncrease => prop_assert_eq!(axis.drive(), Drive::Increase),
                AxisState::MovingDecrease => prop_assert_eq!(axis.drive(), Drive::Decrease),
                AxisState::Tracking => {}
            }
            prop_assert_eq!(outputs.increase.get(), axis.drive() == Drive::Increase);
            prop_assert_eq!(outputs.decrease.get(), axis.drive() == Drive::Decrease);
        }
    }
}

// ── LineBuffer chunking ───────────────────────────────────────

fn collect(buf: &mut LineBuffer<32>, data: &[u8], out: &mut Vec<Option<Vec<u8>>>) {
    buf.feed::<()>(data, |ev| {
        out.push(match ev {
            LineEvent::Line(l) => Some(l.to_vec()),
            LineEvent::Overflow => None,
        });
        Ok(())
    })
    .unwrap();
}

proptest! {
    /// How the stream is split into reads never changes what is delivered.
    #[test]
    fn line_buffer_ignores_chunking(
        data in proptest::collection::vec(
            prop_oneof![4 => b'a'..=b'z', 1 => Just(b'\n')],
            0..300,
        ),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..20),
    ) {
        let mut whole = Vec::new();
        collect(&mut LineBuffer::new(), &data, &mut whole);

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(data.len() + 1)).collect();
        points.push(0);
        points.push(data.len());
        points.sort_unstable();

        let mut chunked = Vec::new();
        let mut buf = LineBuffer::new();
        for w in points.windows(2) {
            collect(&mut buf, &data[w[0]..w[1]], &mut chunked);
        }

        prop_assert_eq!(whole, chunked);
    }

    /// Every delivered line fits the buffer.
    #[test]
    fn delivered_lines_fit(data in proptest::collection::vec(any::<u8>(), 0..500)) {
        let mut out = Vec::new();
        collect(&mut LineBuffer::new(), &data, &mut out);
        for line in out.into_iter().flatten() {
            prop_assert!(line.len() <= 32);
            prop_assert!(!line.contains(&b'\n'));
        }
    }
}

// ── Protocol ─────────────────────────────────────────────────

proptest! {
    /// Arbitrary bytes parse without panicking and always get a reply
    /// that fits the response buffer.
    #[test]
    fn any_line_gets_a_reply(line in proptest::collection::vec(any::<u8>(), 0..200)) {
        let az = Arc::new(AxisLink::new());
        let el = Arc::new(AxisLink::new());
        let rotator = RotatorController::new(az, el);

        let cmd = protocol::parse(&line);
        let resp = protocol::execute(cmd, &rotator);
        prop_assert!(!resp.is_empty());
        prop_assert!(resp.len() <= RESPONSE_CAP);
        prop_assert!(resp.ends_with('\n'));
    }

    /// Well-formed `P` lines round-trip to centidegree targets.
    #[test]
    fn set_position_reaches_links(az in -360.0f32..720.0, el in -90.0f32..180.0) {
        let az_link = Arc::new(AxisLink::new());
        let el_link = Arc::new(AxisLink::new());
        let rotator = RotatorController::new(az_link.clone(), el_link.clone());

        let line = format!("P {az:.2} {el:.2}");
        let cmd = protocol::parse(line.as_bytes());
        prop_assert!(matches!(cmd, Command::SetPosition(Some(_))));
        let resp = protocol::execute(cmd, &rotator);
        prop_assert_eq!(resp.as_str(), "RPRT 0\n");

        let expect = |deg: f32| degrees_to_units(format!("{deg:.2}").parse().unwrap());
        prop_assert_eq!(az_link.snapshot().target, expect(az));
        prop_assert_eq!(el_link.snapshot().target, expect(el));
    }

    /// Extreme published positions still render inside the reply buffer.
    #[test]
    fn get_position_fits(az in any::<i32>(), el in any::<i32>()) {
        let az_link = Arc::new(AxisLink::new());
        let el_link = Arc::new(AxisLink::new());
        az_link.publish(az, AxisState::Tracking);
        el_link.publish(el, AxisState::Tracking);
        let rotator = RotatorController::new(az_link, el_link);

        let resp = protocol::execute(Command::GetPosition, &rotator);
        prop_assert_eq!(resp.matches('\n').count(), 2);
    }
}

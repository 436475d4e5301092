//! Body of the periodic sampling context.
//!
//! One [`Sampler::tick`] per timer period.  Each axis applies whatever the
//! command side queued, takes one sample, then publishes the outcome.

use std::sync::Arc;

use embedded_hal::digital::OutputPin;

use super::axis::AxisController;
use super::link::{AxisLink, Request};
use crate::ports::AnalogInput;

/// An axis together with the mailbox it answers to.
pub struct LinkedAxis<A, P> {
    axis: AxisController<A, P>,
    link: Arc<AxisLink>,
}

impl<A: AnalogInput, P: OutputPin> LinkedAxis<A, P> {
    pub fn new(axis: AxisController<A, P>, link: Arc<AxisLink>) -> Self {
        let linked = Self { axis, link };
        linked.publish();
        linked
    }

    pub fn tick(&mut self) {
        match self.link.take_request() {
            Some(Request::Track(target)) => self.axis.set_target(target),
            Some(Request::Stop) => self.axis.stop(),
            None => {}
        }
        self.axis.poll();
        self.publish();
    }

    fn publish(&self) {
        self.link
            .publish(self.axis.current_position(), self.axis.state());
    }

    pub fn axis(&self) -> &AxisController<A, P> {
        &self.axis
    }
}

pub struct Sampler<A, P> {
    azimuth: LinkedAxis<A, P>,
    elevation: LinkedAxis<A, P>,
    ticks: u64,
}

impl<A: AnalogInput, P: OutputPin> Sampler<A, P> {
    pub fn new(azimuth: LinkedAxis<A, P>, elevation: LinkedAxis<A, P>) -> Self {
        Self {
            azimuth,
            elevation,
            ticks: 0,
        }
    }

    /// Poll both axes once.
    pub fn tick(&mut self) {
        self.azimuth.tick();
        self.elevation.tick();
        self.ticks = self.ticks.wrapping_add(1);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn azimuth(&self) -> &AxisController<A, P> {
        self.azimuth.axis()
    }

    pub fn elevation(&self) -> &AxisController<A, P> {
        self.elevation.axis()
    }
}

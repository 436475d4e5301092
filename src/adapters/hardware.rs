//! Hardware adapter: bridges the raw ADC/GPIO primitives to the axis ports.
//!
//! [`AdcChannel`] implements [`AnalogInput`] and [`MotorOutput`] implements
//! `embedded_hal::digital::OutputPin`.  This is the only module that wires
//! physical channels to axes.  On non-espidf targets the underlying
//! primitives are the simulation stubs in [`hw_init`].

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::config::RotatorConfig;
use crate::drivers::hw_init;
use crate::pins;
use crate::ports::AnalogInput;
use crate::rotator::AxisController;

/// One ADC1 channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcChannel {
    channel: u32,
}

impl AdcChannel {
    pub const fn new(channel: u32) -> Self {
        Self { channel }
    }
}

impl AnalogInput for AdcChannel {
    fn read_raw(&mut self) -> u16 {
        hw_init::adc1_read(self.channel)
    }
}

/// One motor drive output, active high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorOutput {
    pin: i32,
}

impl MotorOutput {
    pub const fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for MotorOutput {
    type Error = Infallible;
}

impl OutputPin for MotorOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.pin, true);
        Ok(())
    }
}

pub type HardwareAxis = AxisController<AdcChannel, MotorOutput>;

/// Azimuth axis on the board's fixed wiring.
pub fn azimuth_axis(cfg: &RotatorConfig) -> HardwareAxis {
    AxisController::new(
        "azimuth",
        AdcChannel::new(pins::AZIMUTH_ADC_CHANNEL),
        MotorOutput::new(pins::AZIMUTH_LEFT_GPIO),
        MotorOutput::new(pins::AZIMUTH_RIGHT_GPIO),
        &cfg.azimuth,
        cfg.oversampling,
    )
}

/// Elevation axis on the board's fixed wiring.
pub fn elevation_axis(cfg: &RotatorConfig) -> HardwareAxis {
    AxisController::new(
        "elevation",
        AdcChannel::new(pins::ELEVATION_ADC_CHANNEL),
        MotorOutput::new(pins::ELEVATION_UP_GPIO),
        MotorOutput::new(pins::ELEVATION_DOWN_GPIO),
        &cfg.elevation,
        cfg.oversampling,
    )
}

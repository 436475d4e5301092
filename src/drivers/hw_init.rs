//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit for the two feedback potentiometers and
//! the four motor outputs using raw ESP-IDF sys calls.  Called once from
//! `main()` before the sampling timer starts.
//!
//! The host build keeps ADC readings and output levels in atomics so tests
//! can drive the feedback and observe the motors.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    TimerFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::TimerFailed(rc) => write!(f, "sampling timer setup failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    init_adc()?;
    init_gpio_outputs()?;
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    for &pin in &pins::MOTOR_OUTPUTS {
        gpio_write(pin, false);
    }
    info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static ADC1_HANDLE: core::sync::atomic::AtomicPtr<adc_oneshot_unit_ctx_t> =
    core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());

#[cfg(target_os = "espidf")]
fn init_adc() -> Result<(), HwInitError> {
    use core::sync::atomic::Ordering;

    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    // SAFETY: called once at boot; `handle` is a valid out-pointer.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for channel in [pins::ELEVATION_ADC_CHANNEL, pins::AZIMUTH_ADC_CHANNEL] {
        // SAFETY: `handle` was just returned by adc_oneshot_new_unit.
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    ADC1_HANDLE.store(handle, Ordering::Release);
    info!(
        "hw_init: ADC1 configured (CH{}=elevation, CH{}=azimuth)",
        pins::ELEVATION_ADC_CHANNEL,
        pins::AZIMUTH_ADC_CHANNEL
    );
    Ok(())
}

/// One raw 12-bit conversion.  Read failures (or a read before init)
/// yield 0.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    use core::sync::atomic::Ordering;

    let handle = ADC1_HANDLE.load(Ordering::Acquire);
    if handle.is_null() {
        return 0;
    }
    let mut raw: i32 = 0;
    // SAFETY: the handle is non-null only after init_adc() finished; the
    // sampling timer task is the only reader.
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> u16 {
    use core::sync::atomic::Ordering;

    sim::ADC
        .get(channel as usize)
        .map_or(0, |c| c.load(Ordering::Relaxed))
}

// ── GPIO outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn init_gpio_outputs() -> Result<(), HwInitError> {
    for &pin in &pins::MOTOR_OUTPUTS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: boot-time configuration of a fixed output pin.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        gpio_write(pin, false);
    }

    info!("hw_init: motor outputs configured (all low)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level on a pin configured in init_gpio_outputs().
    // Each pin is written only by the axis that owns it.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    use core::sync::atomic::Ordering;

    if !(0..64).contains(&pin) {
        return;
    }
    let bit = 1u64 << pin;
    if high {
        sim::GPIO.fetch_or(bit, Ordering::Relaxed);
    } else {
        sim::GPIO.fetch_and(!bit, Ordering::Relaxed);
    }
}

// ── Simulation state ──────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU16, AtomicU64};

    /// ADC1 has channels 0..=7 on the ESP32.
    pub static ADC: [AtomicU16; 8] = [const { AtomicU16::new(0) }; 8];
    /// One bit per GPIO number.
    pub static GPIO: AtomicU64 = AtomicU64::new(0);
}

/// Set the value the simulated ADC returns for `channel`.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    if let Some(c) = sim::ADC.get(channel as usize) {
        c.store(raw, core::sync::atomic::Ordering::Relaxed);
    }
}

/// Current simulated level of output `pin`.
#[cfg(not(target_os = "espidf"))]
pub fn sim_gpio_level(pin: i32) -> bool {
    (0..64).contains(&pin)
        && sim::GPIO.load(core::sync::atomic::Ordering::Relaxed) & (1u64 << pin) != 0
}

//! Periodic sampling timer using ESP-IDF's esp_timer API.
//!
//! The tick closure runs in the esp_timer task context (not ISR), so it may
//! take the short critical sections the axis links use.  On simulation
//! targets a dedicated thread sleeps one period between ticks.

use log::info;

use super::hw_init::HwInitError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Handle to a running sampling timer.  Sampling continues until
/// [`stop`](Self::stop); dropping the handle does not stop it.
pub struct SamplingTimer {
    #[cfg(target_os = "espidf")]
    handle: esp_timer_handle_t,
    #[cfg(not(target_os = "espidf"))]
    running: std::sync::Arc<core::sync::atomic::AtomicBool>,
    #[cfg(not(target_os = "espidf"))]
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tick_trampoline<F: FnMut()>(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the leaked Box<F> registered in start_sampling and
    // esp_timer serialises callbacks of one timer on its task.
    let tick = unsafe { &mut *arg.cast::<F>() };
    tick();
}

/// Call `tick` every `period_us` microseconds.
#[cfg(target_os = "espidf")]
pub fn start_sampling<F>(period_us: u64, tick: F) -> Result<SamplingTimer, HwInitError>
where
    F: FnMut() + Send + 'static,
{
    // Lives as long as the timer; never reclaimed.
    let ctx = Box::into_raw(Box::new(tick));

    let args = esp_timer_create_args_t {
        callback: Some(tick_trampoline::<F>),
        arg: ctx.cast(),
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: c"sampler".as_ptr(),
        skip_unhandled_events: true,
    };
    let mut handle: esp_timer_handle_t = core::ptr::null_mut();

    // SAFETY: `args` and `handle` are valid for the calls; `ctx` outlives
    // the timer because it is never freed.
    unsafe {
        let ret = esp_timer_create(&args, &mut handle);
        if ret != ESP_OK as i32 {
            drop(Box::from_raw(ctx));
            return Err(HwInitError::TimerFailed(ret));
        }
        let ret = esp_timer_start_periodic(handle, period_us);
        if ret != ESP_OK as i32 {
            esp_timer_delete(handle);
            drop(Box::from_raw(ctx));
            return Err(HwInitError::TimerFailed(ret));
        }
    }

    info!("hw_timer: sampling every {}us", period_us);
    Ok(SamplingTimer { handle })
}

#[cfg(target_os = "espidf")]
impl SamplingTimer {
    pub fn stop(self) {
        // SAFETY: `handle` came from a successful esp_timer_create.
        unsafe {
            esp_timer_stop(self.handle);
        }
        info!("hw_timer: sampling stopped");
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn start_sampling<F>(period_us: u64, mut tick: F) -> Result<SamplingTimer, HwInitError>
where
    F: FnMut() + Send + 'static,
{
    use core::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    let period = Duration::from_micros(period_us.max(1));

    let thread = std::thread::Builder::new()
        .name("sampler".into())
        .spawn(move || {
            while flag.load(Ordering::Acquire) {
                std::thread::sleep(period);
                tick();
            }
        })
        .map_err(|e| HwInitError::TimerFailed(e.raw_os_error().unwrap_or(-1)))?;

    info!("hw_timer(sim): sampling every {}us", period_us);
    Ok(SamplingTimer {
        running,
        thread: Some(thread),
    })
}

#[cfg(not(target_os = "espidf"))]
impl SamplingTimer {
    /// Stop ticking and wait for the last tick to finish.
    pub fn stop(mut self) {
        self.running
            .store(false, core::sync::atomic::Ordering::Release);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
        info!("hw_timer(sim): sampling stopped");
    }
}

//! Core-pinned thread spawning for the ESP32 dual-core.
//!
//! `esp_pthread_set_cfg()` applies to the *next* `pthread_create()` from the
//! calling thread, so the config→spawn pair must not be interleaved with
//! other thread creation on the same thread.  Off-target the core and
//! priority are ignored.

/// CPU cores of the ESP32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU: Wi-Fi and lwIP run here, and so does the command server.
    Pro = 0,
    /// APP_CPU.
    App = 1,
}

/// Spawn a thread pinned to `core`.  `name` must be NUL-terminated
/// (e.g. `"tcpsrv\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    // SAFETY: plain struct initialisation and a config call that copies
    // `cfg`; `name` is 'static so the pointer stays valid.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = i32::from(priority);
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr().cast();
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(std::io::Error::from_raw_os_error(ret));
        }
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
}

#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}

//! Hardware initialisation, the sampling timer, and thread helpers.

pub mod hw_init;
pub mod hw_timer;
pub mod task_pin;

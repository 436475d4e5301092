//! Two-axis position control.
//!
//! ```text
//!   timer ──▶ Sampler::tick ──▶ LinkedAxis ──▶ AxisController::poll ──▶ GPIO
//!                                  ▲   │
//!                          Request │   │ position + state
//!                                  │   ▼
//!                                AxisLink
//!                                  ▲   │
//!   CommandServer ──▶ RotatorController (degrees ⇄ 0.01°)
//! ```

pub mod axis;
pub mod controller;
pub mod link;
pub mod sampler;
pub mod scale;

pub use axis::{AxisController, AxisState, Drive};
pub use controller::{RotatorController, RotatorStatus};
pub use link::{AxisLink, AxisSnapshot, Request};
pub use sampler::{LinkedAxis, Sampler};
pub use scale::ScaleConverter;

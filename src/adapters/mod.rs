//! Adapters: concrete implementations behind the port traits.
//!
//! | Adapter    | Implements              | Connects to            |
//! |------------|-------------------------|------------------------|
//! | `hardware` | AnalogInput             | ESP32 ADC1 (oneshot)   |
//! |            | OutputPin (embedded-hal)| ESP32 GPIO             |
//! | `network`  | network-ready signal    | ESP-IDF WiFi STA       |

pub mod hardware;
pub mod network;

//! Transparency reporting for the presence monitor.
//!
//! Tracks how much the monitor has processed so users can audit it, without
//! retaining anything that could identify them.

pub mod log;

pub use log::{TransparencyLog, TransparencyStats};

//! Telemetry monitor.
//!
//! A [`Monitor`] owns a link to the controller and runs one background
//! worker that, every iteration:
//! - takes at most one item off the input queue
//! - polls the link for a complete packet and decodes it
//! - pushes decoded payloads onto the output queue
//!
//! Bad frames are logged and dropped; only a port that cannot be opened is
//! reported back to the caller.

pub mod config;
pub mod error;
pub mod monitor;
pub mod queue;
pub mod worker;

#[cfg(test)]
mod scripted;

pub use config::{MonitorConfig, DEFAULT_IDLE_SLEEP, DEFAULT_PORT};
pub use error::{MonitorError, Result};
pub use monitor::{Monitor, StopSignal};
pub use queue::Queue;
pub use worker::{Ingest, Worker};

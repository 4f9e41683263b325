//! Serial telemetry monitor for the OSOD robot controller.
//!
//! # Crate Structure
//!
//! - [`payload`]: Fixed-layout telemetry payloads and their tag registry
//! - [`link`]: Packetized serial link (framing, CRC-8, status codes)
//! - [`monitor`]: Background worker, hand-off queues, monitor lifecycle

/// Re-export payload types.
pub mod payload {
    pub use osod_payload::*;
}

/// Re-export link types.
pub mod link {
    pub use osod_link::*;
}

/// Re-export monitor types.
pub mod monitor {
    pub use osod_monitor::*;
}

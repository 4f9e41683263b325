use std::time::Duration;

use osod_link::{DEFAULT_BAUD, DEFAULT_READ_TIMEOUT};

/// Default serial port.
pub const DEFAULT_PORT: &str = "COM3";

/// Default pause after an iteration that found nothing to do.
pub const DEFAULT_IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Monitor configuration. Fixed once the monitor is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Serial port path or name.
    pub port: String,
    /// Line rate.
    pub baud: u32,
    /// Upper bound on a single blocking read.
    pub read_timeout: Duration,
    /// Sleep after an idle iteration. Zero spins.
    pub idle_sleep: Duration,
}

impl MonitorConfig {
    pub fn new(port: impl Into<String>, baud: u32) -> Self {
        Self {
            port: port.into(),
            baud,
            ..Self::default()
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_idle_sleep(mut self, idle_sleep: Duration) -> Self {
        self.idle_sleep = idle_sleep;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud: DEFAULT_BAUD,
            read_timeout: DEFAULT_READ_TIMEOUT,
            idle_sleep: DEFAULT_IDLE_SLEEP,
        }
    }
}

/// Errors surfaced to the monitor's controller.
///
/// Everything that goes wrong inside the worker loop (bad frames, short
/// payloads, unknown tags) is handled there and never shows up here.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The transport could not be opened.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[from] osod_link::LinkError),

    /// `start()` was called while the worker is running.
    #[error("monitor already running")]
    AlreadyRunning,

    /// The transport was lost with a worker that did not exit cleanly.
    #[error("transport handle lost")]
    TransportLost,

    /// The worker thread could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(std::io::Error),

    /// The worker thread panicked.
    #[error("monitor worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, MonitorError>;

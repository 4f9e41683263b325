/// Errors that can occur on the serial link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The port could not be acquired (missing, busy, or not permitted).
    #[error("port {port} unavailable: {source}")]
    PortUnavailable {
        port: String,
        source: serialport::Error,
    },

    /// The link is not open.
    #[error("link not open")]
    NotOpen,

    /// The packet body exceeds what the packet header can describe.
    #[error("packet payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Packets must carry at least one byte.
    #[error("packet payload is empty")]
    EmptyPayload,

    /// An I/O error occurred on the underlying stream.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;

use crate::kind::PayloadKind;

/// Errors that can occur while decoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The buffer is shorter than the fixed layout of the kind.
    #[error("malformed {kind} payload ({actual} bytes, expected {expected})")]
    Malformed {
        kind: PayloadKind,
        expected: usize,
        actual: usize,
    },

    /// A frame with no tag byte at all.
    #[error("empty frame (missing tag byte)")]
    EmptyFrame,
}

pub type Result<T> = std::result::Result<T, PayloadError>;

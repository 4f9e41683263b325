//! Link status codes.
//!
//! Non-negative codes describe progress; negative codes are frame-level
//! integrity failures.

use std::fmt;

/// A packet is partially received.
pub const CONTINUE: i8 = 3;
/// A complete, verified packet is ready in the receive buffer.
pub const NEW_DATA: i8 = 2;
/// Nothing has been received.
pub const NO_DATA: i8 = 1;
/// The packet CRC did not match.
pub const CRC_ERROR: i8 = -1;
/// The length byte was zero or out of range.
pub const PAYLOAD_ERROR: i8 = -2;
/// The packet was not terminated by the stop byte.
pub const STOP_BYTE_ERROR: i8 = -3;

/// Result of the most recent receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    Continue,
    NewData,
    NoData,
    CrcError,
    PayloadError,
    StopByteError,
    /// A code outside the known set.
    Unknown(i8),
}

impl LinkStatus {
    /// Map a raw code to a status.
    pub fn from_code(code: i8) -> Self {
        match code {
            CONTINUE => Self::Continue,
            NEW_DATA => Self::NewData,
            NO_DATA => Self::NoData,
            CRC_ERROR => Self::CrcError,
            PAYLOAD_ERROR => Self::PayloadError,
            STOP_BYTE_ERROR => Self::StopByteError,
            other => Self::Unknown(other),
        }
    }

    /// The raw code.
    pub fn code(self) -> i8 {
        match self {
            Self::Continue => CONTINUE,
            Self::NewData => NEW_DATA,
            Self::NoData => NO_DATA,
            Self::CrcError => CRC_ERROR,
            Self::PayloadError => PAYLOAD_ERROR,
            Self::StopByteError => STOP_BYTE_ERROR,
            Self::Unknown(code) => code,
        }
    }

    /// True for every negative code, known or not.
    pub fn is_error(self) -> bool {
        self.code() < 0
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Continue => "CONTINUE",
            Self::NewData => "NEW_DATA",
            Self::NoData => "NO_DATA",
            Self::CrcError => "CRC_ERROR",
            Self::PayloadError => "PAYLOAD_ERROR",
            Self::StopByteError => "STOP_BYTE_ERROR",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "UNKNOWN({code})"),
            other => f.write_str(other.name()),
        }
    }
}

//! Payload tags.
//!
//! Every message on the wire starts with a one-byte tag naming its kind.
//! Tags are never reused; a new kind gets a new tag and a registry entry.

use std::fmt;

use serde::Serialize;

/// Tag for [`PayloadKind::IncomingSerialData`].
pub const INCOMING_SERIAL_DATA: u8 = 1;

/// Tag for [`PayloadKind::RequestedState`].
pub const REQUESTED_STATE: u8 = 2;

/// Tag for [`PayloadKind::EstimatedState`].
pub const ESTIMATED_STATE: u8 = 3;

/// Tag for [`PayloadKind::CellStatus`].
pub const CELL_STATUS: u8 = 4;

/// The closed set of message kinds understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum PayloadKind {
    IncomingSerialData = INCOMING_SERIAL_DATA,
    RequestedState = REQUESTED_STATE,
    EstimatedState = ESTIMATED_STATE,
    CellStatus = CELL_STATUS,
}

impl PayloadKind {
    /// All kinds, in tag order.
    pub const ALL: [PayloadKind; 4] = [
        PayloadKind::IncomingSerialData,
        PayloadKind::RequestedState,
        PayloadKind::EstimatedState,
        PayloadKind::CellStatus,
    ];

    /// Look up the kind for a wire tag. Returns `None` for unknown tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            INCOMING_SERIAL_DATA => Some(Self::IncomingSerialData),
            REQUESTED_STATE => Some(Self::RequestedState),
            ESTIMATED_STATE => Some(Self::EstimatedState),
            CELL_STATUS => Some(Self::CellStatus),
            _ => None,
        }
    }

    /// The wire tag of this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Human-readable name, e.g. `EstimatedState`.
    pub fn name(self) -> &'static str {
        match self {
            Self::IncomingSerialData => "IncomingSerialData",
            Self::RequestedState => "RequestedState",
            Self::EstimatedState => "EstimatedState",
            Self::CellStatus => "CellStatus",
        }
    }

    /// Snake-case name, e.g. `estimated_state`. Used for per-kind log files.
    pub fn snake_name(self) -> &'static str {
        match self {
            Self::IncomingSerialData => "incoming_serial_data",
            Self::RequestedState => "requested_state",
            Self::EstimatedState => "estimated_state",
            Self::CellStatus => "cell_status",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for PayloadKind {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_tag(tag).ok_or(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_unique_and_round_trip() {
        for kind in PayloadKind::ALL {
            assert_eq!(PayloadKind::from_tag(kind.tag()), Some(kind));
        }
        let mut tags: Vec<u8> = PayloadKind::ALL.iter().map(|k| k.tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), PayloadKind::ALL.len());
    }

    #[test]
    fn unknown_tags_have_no_kind() {
        assert_eq!(PayloadKind::from_tag(0), None);
        assert_eq!(PayloadKind::from_tag(5), None);
        assert_eq!(PayloadKind::from_tag(0xFF), None);
        assert_eq!(PayloadKind::try_from(42u8), Err(42));
    }

    #[test]
    fn names() {
        assert_eq!(PayloadKind::CellStatus.to_string(), "CellStatus");
        assert_eq!(
            PayloadKind::IncomingSerialData.snake_name(),
            "incoming_serial_data"
        );
    }
}

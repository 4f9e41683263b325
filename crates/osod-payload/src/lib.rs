//! Fixed-layout, tag-prefixed telemetry payloads.
//!
//! Each message is a one-byte tag followed by a fixed-width body:
//! - all integers and floats little-endian (floats are IEEE-754)
//! - booleans are one byte (nonzero decodes as true)
//! - no variable-length fields
//!
//! The set of kinds is closed. Unknown tags decode to `None`.

pub mod error;
pub mod kind;
pub mod payload;
pub mod registry;

pub use error::{PayloadError, Result};
pub use kind::{PayloadKind, CELL_STATUS, ESTIMATED_STATE, INCOMING_SERIAL_DATA, REQUESTED_STATE};
pub use payload::{
    decode, decode_frame, CellStatus, EstimatedState, FieldValue, IncomingSerialData, Payload,
    RequestedState,
};
pub use registry::{descriptor, descriptors, lookup, FieldDescriptor, FieldType, PayloadDescriptor};

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::{PayloadError, Result};
use crate::kind::PayloadKind;
use crate::registry::{
    descriptor, CELL_STATUS_SIZE, ESTIMATED_STATE_SIZE, INCOMING_SERIAL_DATA_SIZE,
    REQUESTED_STATE_SIZE,
};

/// Whether the controller has serial data waiting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IncomingSerialData {
    pub available: bool,
}

/// Velocity setpoint requested of the drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RequestedState {
    pub velocity: f32,
    pub angular_velocity: f32,
}

/// Pose estimate plus time-of-flight ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatedState {
    pub timestamp: u32,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub tof_front: f32,
    pub tof_rear: f32,
    pub tof_left: f32,
    pub tof_right: f32,
}

/// Battery cell voltages and protection flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellStatus {
    pub cell_1_voltage: f32,
    pub cell_2_voltage: f32,
    pub cell_3_voltage: f32,
    pub psu_voltage: f32,
    pub all_ok: bool,
    pub out_of_balance: bool,
    pub low_cell_voltage: bool,
    pub high_cell_voltage: bool,
    pub psu_under_voltage: bool,
}

/// A decoded telemetry message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "fields")]
pub enum Payload {
    IncomingSerialData(IncomingSerialData),
    RequestedState(RequestedState),
    EstimatedState(EstimatedState),
    CellStatus(CellStatus),
}

/// A single field value, as read off the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    U32(u32),
    F32(f32),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::U32(v) => write!(f, "{v}"),
            FieldValue::F32(v) => write!(f, "{v}"),
        }
    }
}

/// Decode a tag and payload body.
///
/// Unknown tags are not an error: they yield `Ok(None)`. Only the first
/// `descriptor(kind).size` bytes are read; anything after is ignored.
pub fn decode(tag: u8, bytes: &[u8]) -> Result<Option<Payload>> {
    match PayloadKind::from_tag(tag) {
        Some(kind) => Payload::decode(kind, bytes).map(Some),
        None => Ok(None),
    }
}

/// Decode a tag-first frame body, as delivered by the link layer.
pub fn decode_frame(frame: &[u8]) -> Result<Option<Payload>> {
    match frame.split_first() {
        Some((&tag, body)) => decode(tag, body),
        None => Err(PayloadError::EmptyFrame),
    }
}

impl Payload {
    /// Decode a payload of a known kind.
    pub fn decode(kind: PayloadKind, bytes: &[u8]) -> Result<Self> {
        let expected = descriptor(kind).size;
        if bytes.len() < expected {
            return Err(PayloadError::Malformed {
                kind,
                expected,
                actual: bytes.len(),
            });
        }

        let mut src = &bytes[..expected];
        let payload = match kind {
            PayloadKind::IncomingSerialData => Payload::IncomingSerialData(IncomingSerialData {
                available: get_bool(&mut src),
            }),
            PayloadKind::RequestedState => Payload::RequestedState(RequestedState {
                velocity: src.get_f32_le(),
                angular_velocity: src.get_f32_le(),
            }),
            PayloadKind::EstimatedState => Payload::EstimatedState(EstimatedState {
                timestamp: src.get_u32_le(),
                x: src.get_f32_le(),
                y: src.get_f32_le(),
                heading: src.get_f32_le(),
                tof_front: src.get_f32_le(),
                tof_rear: src.get_f32_le(),
                tof_left: src.get_f32_le(),
                tof_right: src.get_f32_le(),
            }),
            PayloadKind::CellStatus => Payload::CellStatus(CellStatus {
                cell_1_voltage: src.get_f32_le(),
                cell_2_voltage: src.get_f32_le(),
                cell_3_voltage: src.get_f32_le(),
                psu_voltage: src.get_f32_le(),
                all_ok: get_bool(&mut src),
                out_of_balance: get_bool(&mut src),
                low_cell_voltage: get_bool(&mut src),
                high_cell_voltage: get_bool(&mut src),
                psu_under_voltage: get_bool(&mut src),
            }),
        };
        debug_assert!(src.is_empty());
        Ok(payload)
    }

    /// The kind of this payload.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::IncomingSerialData(_) => PayloadKind::IncomingSerialData,
            Payload::RequestedState(_) => PayloadKind::RequestedState,
            Payload::EstimatedState(_) => PayloadKind::EstimatedState,
            Payload::CellStatus(_) => PayloadKind::CellStatus,
        }
    }

    /// Encoded size of this payload (tag excluded).
    pub fn size(&self) -> usize {
        descriptor(self.kind()).size
    }

    /// Append the encoded payload (no tag) to `dst`.
    ///
    /// Always writes exactly [`Payload::size`] bytes. Booleans are written
    /// as `0x00`/`0x01`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.size());
        match self {
            Payload::IncomingSerialData(p) => {
                dst.put_u8(p.available as u8);
            }
            Payload::RequestedState(p) => {
                dst.put_f32_le(p.velocity);
                dst.put_f32_le(p.angular_velocity);
            }
            Payload::EstimatedState(p) => {
                dst.put_u32_le(p.timestamp);
                dst.put_f32_le(p.x);
                dst.put_f32_le(p.y);
                dst.put_f32_le(p.heading);
                dst.put_f32_le(p.tof_front);
                dst.put_f32_le(p.tof_rear);
                dst.put_f32_le(p.tof_left);
                dst.put_f32_le(p.tof_right);
            }
            Payload::CellStatus(p) => {
                dst.put_f32_le(p.cell_1_voltage);
                dst.put_f32_le(p.cell_2_voltage);
                dst.put_f32_le(p.cell_3_voltage);
                dst.put_f32_le(p.psu_voltage);
                dst.put_u8(p.all_ok as u8);
                dst.put_u8(p.out_of_balance as u8);
                dst.put_u8(p.low_cell_voltage as u8);
                dst.put_u8(p.high_cell_voltage as u8);
                dst.put_u8(p.psu_under_voltage as u8);
            }
        }
    }

    /// Encode into a fresh buffer (no tag).
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Encode as a tag-first frame body.
    pub fn to_frame(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + self.size());
        buf.put_u8(self.kind().tag());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Field names and values in wire order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        use FieldValue::{Bool, F32, U32};

        match self {
            Payload::IncomingSerialData(p) => vec![("available", Bool(p.available))],
            Payload::RequestedState(p) => vec![
                ("velocity", F32(p.velocity)),
                ("angular_velocity", F32(p.angular_velocity)),
            ],
            Payload::EstimatedState(p) => vec![
                ("timestamp", U32(p.timestamp)),
                ("x", F32(p.x)),
                ("y", F32(p.y)),
                ("heading", F32(p.heading)),
                ("tof_front", F32(p.tof_front)),
                ("tof_rear", F32(p.tof_rear)),
                ("tof_left", F32(p.tof_left)),
                ("tof_right", F32(p.tof_right)),
            ],
            Payload::CellStatus(p) => vec![
                ("cell_1_voltage", F32(p.cell_1_voltage)),
                ("cell_2_voltage", F32(p.cell_2_voltage)),
                ("cell_3_voltage", F32(p.cell_3_voltage)),
                ("psu_voltage", F32(p.psu_voltage)),
                ("all_ok", Bool(p.all_ok)),
                ("out_of_balance", Bool(p.out_of_balance)),
                ("low_cell_voltage", Bool(p.low_cell_voltage)),
                ("high_cell_voltage", Bool(p.high_cell_voltage)),
                ("psu_under_voltage", Bool(p.psu_under_voltage)),
            ],
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind())?;
        for (i, (name, value)) in self.fields().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

fn get_bool(src: &mut &[u8]) -> bool {
    src.get_u8() != 0
}

// Compile-time guard that the structs and the registry agree.
const _: () = {
    assert!(INCOMING_SERIAL_DATA_SIZE == 1);
    assert!(REQUESTED_STATE_SIZE == 8);
    assert!(ESTIMATED_STATE_SIZE == 32);
    assert!(CELL_STATUS_SIZE == 21);
};

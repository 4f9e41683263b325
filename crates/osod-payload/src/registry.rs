//! Static layout metadata for every payload kind.
//!
//! The registry is plain `'static` data: built at compile time, never
//! mutated, and shared freely between threads.

use crate::kind::PayloadKind;

/// Wire type of a single payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// One byte, zero is false.
    Bool,
    /// Little-endian `u32`.
    U32,
    /// Little-endian IEEE-754 `f32`.
    F32,
}

impl FieldType {
    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            FieldType::Bool => 1,
            FieldType::U32 | FieldType::F32 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::U32 => "u32",
            FieldType::F32 => "f32",
        }
    }
}

/// A named, typed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn field(name: &'static str, ty: FieldType) -> FieldDescriptor {
    FieldDescriptor { name, ty }
}

/// Fixed layout of one payload kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadDescriptor {
    pub kind: PayloadKind,
    /// Total encoded size in bytes (tag excluded).
    pub size: usize,
    /// Fields in wire order.
    pub fields: &'static [FieldDescriptor],
}

impl PayloadDescriptor {
    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

const fn layout_size(fields: &[FieldDescriptor]) -> usize {
    let mut size = 0;
    let mut i = 0;
    while i < fields.len() {
        size += fields[i].ty.width();
        i += 1;
    }
    size
}

const INCOMING_SERIAL_DATA_FIELDS: &[FieldDescriptor] = &[field("available", FieldType::Bool)];

const REQUESTED_STATE_FIELDS: &[FieldDescriptor] = &[
    field("velocity", FieldType::F32),
    field("angular_velocity", FieldType::F32),
];

const ESTIMATED_STATE_FIELDS: &[FieldDescriptor] = &[
    field("timestamp", FieldType::U32),
    field("x", FieldType::F32),
    field("y", FieldType::F32),
    field("heading", FieldType::F32),
    field("tof_front", FieldType::F32),
    field("tof_rear", FieldType::F32),
    field("tof_left", FieldType::F32),
    field("tof_right", FieldType::F32),
];

const CELL_STATUS_FIELDS: &[FieldDescriptor] = &[
    field("cell_1_voltage", FieldType::F32),
    field("cell_2_voltage", FieldType::F32),
    field("cell_3_voltage", FieldType::F32),
    field("psu_voltage", FieldType::F32),
    field("all_ok", FieldType::Bool),
    field("out_of_balance", FieldType::Bool),
    field("low_cell_voltage", FieldType::Bool),
    field("high_cell_voltage", FieldType::Bool),
    field("psu_under_voltage", FieldType::Bool),
];

/// Encoded size of an `IncomingSerialData` payload.
pub const INCOMING_SERIAL_DATA_SIZE: usize = layout_size(INCOMING_SERIAL_DATA_FIELDS);
/// Encoded size of a `RequestedState` payload.
pub const REQUESTED_STATE_SIZE: usize = layout_size(REQUESTED_STATE_FIELDS);
/// Encoded size of an `EstimatedState` payload.
pub const ESTIMATED_STATE_SIZE: usize = layout_size(ESTIMATED_STATE_FIELDS);
/// Encoded size of a `CellStatus` payload.
pub const CELL_STATUS_SIZE: usize = layout_size(CELL_STATUS_FIELDS);

static REGISTRY: [PayloadDescriptor; 4] = [
    PayloadDescriptor {
        kind: PayloadKind::IncomingSerialData,
        size: INCOMING_SERIAL_DATA_SIZE,
        fields: INCOMING_SERIAL_DATA_FIELDS,
    },
    PayloadDescriptor {
        kind: PayloadKind::RequestedState,
        size: REQUESTED_STATE_SIZE,
        fields: REQUESTED_STATE_FIELDS,
    },
    PayloadDescriptor {
        kind: PayloadKind::EstimatedState,
        size: ESTIMATED_STATE_SIZE,
        fields: ESTIMATED_STATE_FIELDS,
    },
    PayloadDescriptor {
        kind: PayloadKind::CellStatus,
        size: CELL_STATUS_SIZE,
        fields: CELL_STATUS_FIELDS,
    },
];

/// Descriptor for a kind. Every kind is registered.
pub fn descriptor(kind: PayloadKind) -> &'static PayloadDescriptor {
    match kind {
        PayloadKind::IncomingSerialData => &REGISTRY[0],
        PayloadKind::RequestedState => &REGISTRY[1],
        PayloadKind::EstimatedState => &REGISTRY[2],
        PayloadKind::CellStatus => &REGISTRY[3],
    }
}

/// Descriptor for a wire tag, or `None` if the tag is not registered.
pub fn lookup(tag: u8) -> Option<&'static PayloadDescriptor> {
    PayloadKind::from_tag(tag).map(descriptor)
}

/// All registered descriptors, in tag order.
pub fn descriptors() -> &'static [PayloadDescriptor] {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_sizes() {
        assert_eq!(INCOMING_SERIAL_DATA_SIZE, 1);
        assert_eq!(REQUESTED_STATE_SIZE, 8);
        assert_eq!(ESTIMATED_STATE_SIZE, 32);
        assert_eq!(CELL_STATUS_SIZE, 21);
    }

    #[test]
    fn every_kind_maps_to_its_own_descriptor() {
        for kind in PayloadKind::ALL {
            let desc = descriptor(kind);
            assert_eq!(desc.kind, kind);
            assert_eq!(lookup(kind.tag()), Some(desc));
        }
        assert_eq!(descriptors().len(), PayloadKind::ALL.len());
    }

    #[test]
    fn lookup_unknown_tag() {
        assert!(lookup(0).is_none());
        assert!(lookup(200).is_none());
    }

    #[test]
    fn field_names_in_declaration_order() {
        let names: Vec<_> = descriptor(PayloadKind::RequestedState)
            .field_names()
            .collect();
        assert_eq!(names, ["velocity", "angular_velocity"]);

        let cell = descriptor(PayloadKind::CellStatus);
        assert_eq!(cell.fields.first().map(|f| f.name), Some("cell_1_voltage"));
        assert_eq!(cell.fields.last().map(|f| f.name), Some("psu_under_voltage"));
    }
}

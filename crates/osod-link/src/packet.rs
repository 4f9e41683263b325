use bytes::{BufMut, BytesMut};

use crate::crc::crc8;
use crate::error::{LinkError, Result};
use crate::status::LinkStatus;

/// Marks the start of every packet.
pub const START_BYTE: u8 = 0x7E;

/// Marks the end of every packet.
pub const STOP_BYTE: u8 = 0x81;

/// Largest payload a packet can carry.
pub const MAX_PACKET_SIZE: usize = 0xFE;

/// Overhead value meaning "no start bytes were stuffed".
pub const NO_OVERHEAD: u8 = 0xFF;

/// Bytes around the payload: start, id, overhead, length, crc, stop.
pub const PACKET_OVERHEAD: usize = 6;

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬──────┬──────────┬────────┬────────────────────┬──────┬───────┐
/// │ 0x7E  │ id   │ overhead │ length │ payload (stuffed)  │ crc8 │ 0x81  │
/// └───────┴──────┴──────────┴────────┴────────────────────┴──────┴───────┘
/// ```
///
/// Every `0x7E` inside the payload is replaced by the distance to the next
/// one (zero for the last), and `overhead` holds the index of the first, so
/// the start byte never appears inside a packet body.
pub fn encode_packet(packet_id: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.is_empty() {
        return Err(LinkError::EmptyPayload);
    }
    if payload.len() > MAX_PACKET_SIZE {
        return Err(LinkError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PACKET_SIZE,
        });
    }

    let mut body = payload.to_vec();
    let overhead = stuff(&mut body);

    dst.reserve(PACKET_OVERHEAD + body.len());
    dst.put_u8(START_BYTE);
    dst.put_u8(packet_id);
    dst.put_u8(overhead);
    dst.put_u8(body.len() as u8);
    dst.put_slice(&body);
    dst.put_u8(crc8(&body));
    dst.put_u8(STOP_BYTE);
    Ok(())
}

/// Replace start bytes with a chain of forward offsets.
///
/// Returns the overhead byte.
fn stuff(body: &mut [u8]) -> u8 {
    let Some(first) = body.iter().position(|&b| b == START_BYTE) else {
        return NO_OVERHEAD;
    };

    let mut next = body.len();
    for i in (first..body.len()).rev() {
        if body[i] == START_BYTE {
            body[i] = if next == body.len() { 0 } else { (next - i) as u8 };
            next = i;
        }
    }
    first as u8
}

/// Undo [`stuff`]. Never indexes outside `body`.
fn unstuff(body: &mut [u8], overhead: u8) {
    let mut index = overhead as usize;
    while index < body.len() {
        let delta = body[index] as usize;
        body[index] = START_BYTE;
        if delta == 0 {
            break;
        }
        index += delta;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    FindStart,
    FindId,
    FindOverhead,
    FindLength,
    FindPayload,
    FindCrc,
    FindStop,
}

/// Byte-at-a-time packet parser.
///
/// Feed every received byte to [`PacketParser::update`]. It returns `None`
/// while a packet is being collected, `Some(LinkStatus::NewData)` when a
/// verified packet is ready in [`PacketParser::payload`], and a negative
/// status when the packet was rejected. After any terminal status the parser
/// goes back to looking for a start byte.
#[derive(Debug)]
pub struct PacketParser {
    state: ParserState,
    packet_id: u8,
    overhead: u8,
    expected: usize,
    buffer: Vec<u8>,
    payload: Vec<u8>,
}

impl Default for PacketParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::FindStart,
            packet_id: 0,
            overhead: NO_OVERHEAD,
            expected: 0,
            buffer: Vec::with_capacity(MAX_PACKET_SIZE),
            payload: Vec::with_capacity(MAX_PACKET_SIZE),
        }
    }

    /// Advance the state machine by one byte.
    pub fn update(&mut self, byte: u8) -> Option<LinkStatus> {
        use ParserState::*;

        match self.state {
            FindStart => {
                if byte == START_BYTE {
                    self.state = FindId;
                }
                None
            }
            FindId => {
                self.packet_id = byte;
                self.state = FindOverhead;
                None
            }
            FindOverhead => {
                self.overhead = byte;
                self.state = FindLength;
                None
            }
            FindLength => {
                let len = byte as usize;
                if len == 0 || len > MAX_PACKET_SIZE {
                    return Some(self.reject(LinkStatus::PayloadError));
                }
                self.expected = len;
                self.buffer.clear();
                self.state = FindPayload;
                None
            }
            FindPayload => {
                self.buffer.push(byte);
                if self.buffer.len() == self.expected {
                    self.state = FindCrc;
                }
                None
            }
            FindCrc => {
                if crc8(&self.buffer) != byte {
                    return Some(self.reject(LinkStatus::CrcError));
                }
                self.state = FindStop;
                None
            }
            FindStop => {
                if byte != STOP_BYTE {
                    return Some(self.reject(LinkStatus::StopByteError));
                }
                self.state = FindStart;
                self.payload.clear();
                self.payload.extend_from_slice(&self.buffer);
                unstuff(&mut self.payload, self.overhead);
                Some(LinkStatus::NewData)
            }
        }
    }

    fn reject(&mut self, status: LinkStatus) -> LinkStatus {
        self.state = ParserState::FindStart;
        self.buffer.clear();
        status
    }

    /// True while waiting for a start byte (no packet in progress).
    pub fn is_idle(&self) -> bool {
        self.state == ParserState::FindStart
    }

    /// Payload of the most recent verified packet.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Id of the most recent packet header seen.
    pub fn packet_id(&self) -> u8 {
        self.packet_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut PacketParser, wire: &[u8]) -> Vec<LinkStatus> {
        wire.iter().filter_map(|&b| parser.update(b)).collect()
    }

    #[test]
    fn encode_plain_payload() {
        let mut wire = BytesMut::new();
        encode_packet(0, &[0x02, 0x01, 0x03], &mut wire).unwrap();

        assert_eq!(wire.len(), PACKET_OVERHEAD + 3);
        assert_eq!(wire[0], START_BYTE);
        assert_eq!(wire[1], 0);
        assert_eq!(wire[2], NO_OVERHEAD);
        assert_eq!(wire[3], 3);
        assert_eq!(&wire[4..7], &[0x02, 0x01, 0x03]);
        assert_eq!(wire[7], crc8(&[0x02, 0x01, 0x03]));
        assert_eq!(wire[8], STOP_BYTE);
    }

    #[test]
    fn stuffing_removes_start_bytes() {
        let mut body = vec![0x01, START_BYTE, 0x02, START_BYTE, START_BYTE, 0x03];
        let overhead = stuff(&mut body);

        assert_eq!(overhead, 1);
        assert_eq!(body, vec![0x01, 2, 0x02, 1, 0, 0x03]);
        assert!(!body.contains(&START_BYTE));

        unstuff(&mut body, overhead);
        assert_eq!(body, vec![0x01, START_BYTE, 0x02, START_BYTE, START_BYTE, 0x03]);
    }

    #[test]
    fn unstuff_ignores_out_of_range_offsets() {
        let mut body = vec![0x01, 0x02, 0x03];
        unstuff(&mut body, NO_OVERHEAD);
        assert_eq!(body, vec![0x01, 0x02, 0x03]);

        let mut body = vec![0x40, 0x02];
        unstuff(&mut body, 0);
        assert_eq!(body, vec![START_BYTE, 0x02]);
    }

    #[test]
    fn parse_round_trip_with_stuffed_bytes() {
        let payload = [0x03, START_BYTE, 0x10, START_BYTE, 0xFF];
        let mut wire = BytesMut::new();
        encode_packet(7, &payload, &mut wire).unwrap();

        let mut parser = PacketParser::new();
        assert_eq!(feed_all(&mut parser, &wire), vec![LinkStatus::NewData]);
        assert_eq!(parser.payload(), &payload);
        assert_eq!(parser.packet_id(), 7);
        assert!(parser.is_idle());
    }

    #[test]
    fn garbage_before_start_is_skipped() {
        let mut wire = BytesMut::from(&[0x00, 0x13, STOP_BYTE][..]);
        encode_packet(0, b"abc", &mut wire).unwrap();

        let mut parser = PacketParser::new();
        assert_eq!(feed_all(&mut parser, &wire), vec![LinkStatus::NewData]);
        assert_eq!(parser.payload(), b"abc");
    }

    #[test]
    fn crc_mismatch_is_rejected() {
        let mut wire = BytesMut::new();
        encode_packet(0, b"hello", &mut wire).unwrap();
        let crc_index = wire.len() - 2;
        wire[crc_index] ^= 0x01;

        let mut parser = PacketParser::new();
        assert_eq!(feed_all(&mut parser, &wire), vec![LinkStatus::CrcError]);
        assert!(parser.is_idle());
    }

    #[test]
    fn missing_stop_byte_is_rejected() {
        let mut wire = BytesMut::new();
        encode_packet(0, b"hi", &mut wire).unwrap();
        let last = wire.len() - 1;
        wire[last] = 0x00;

        let mut parser = PacketParser::new();
        assert_eq!(
            feed_all(&mut parser, &wire),
            vec![LinkStatus::StopByteError]
        );
    }

    #[test]
    fn zero_length_is_payload_error() {
        let mut parser = PacketParser::new();
        let statuses = feed_all(&mut parser, &[START_BYTE, 0, NO_OVERHEAD, 0]);
        assert_eq!(statuses, vec![LinkStatus::PayloadError]);
        assert!(parser.is_idle());
    }

    #[test]
    fn oversized_length_is_payload_error() {
        let mut parser = PacketParser::new();
        let statuses = feed_all(&mut parser, &[START_BYTE, 0, NO_OVERHEAD, 0xFF]);
        assert_eq!(statuses, vec![LinkStatus::PayloadError]);
    }

    #[test]
    fn recovers_after_error() {
        let mut wire = BytesMut::new();
        encode_packet(0, b"bad", &mut wire).unwrap();
        let crc_index = wire.len() - 2;
        wire[crc_index] ^= 0xFF;
        encode_packet(0, b"good", &mut wire).unwrap();

        let mut parser = PacketParser::new();
        assert_eq!(
            feed_all(&mut parser, &wire),
            vec![LinkStatus::CrcError, LinkStatus::NewData]
        );
        assert_eq!(parser.payload(), b"good");
    }

    #[test]
    fn encode_rejects_bad_lengths() {
        let mut wire = BytesMut::new();
        assert!(matches!(
            encode_packet(0, &[], &mut wire),
            Err(LinkError::EmptyPayload)
        ));
        assert!(matches!(
            encode_packet(0, &[0u8; MAX_PACKET_SIZE + 1], &mut wire),
            Err(LinkError::PayloadTooLarge { .. })
        ));
        assert!(wire.is_empty());

        encode_packet(0, &[START_BYTE; MAX_PACKET_SIZE], &mut wire).unwrap();
        let mut parser = PacketParser::new();
        assert_eq!(feed_all(&mut parser, &wire), vec![LinkStatus::NewData]);
        assert_eq!(parser.payload(), &[START_BYTE; MAX_PACKET_SIZE][..]);
    }
}

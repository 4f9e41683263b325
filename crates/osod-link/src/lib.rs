//! Packetized serial link.
//!
//! Every packet on the wire is framed with:
//! - a start byte (`0x7E`) and a stop byte (`0x81`)
//! - a packet id, a stuffing overhead byte and a one-byte length
//! - a CRC-8 (polynomial `0x9B`) over the stuffed payload
//!
//! Negative [`LinkStatus`] codes report rejected packets; the caller decides
//! what to do with them.

// re-export `serialport` so users see the same error types as the link
pub use serialport;

pub mod crc;
pub mod error;
pub mod packet;
pub mod serial;
pub mod status;
pub mod transport;

pub use error::{LinkError, Result};
pub use packet::{encode_packet, PacketParser, MAX_PACKET_SIZE, START_BYTE, STOP_BYTE};
pub use serial::{LinkStream, SerialLink, DEFAULT_BAUD, DEFAULT_READ_TIMEOUT};
pub use status::LinkStatus;
pub use transport::Transport;

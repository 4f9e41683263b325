use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tracing::{debug, error, info};

use crate::error::{LinkError, Result};
use crate::packet::{encode_packet, PacketParser, MAX_PACKET_SIZE, PACKET_OVERHEAD};
use crate::status::LinkStatus;
use crate::transport::Transport;

/// Default line rate of the controller firmware.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default time a single read may block waiting for bytes.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

const READ_CHUNK_SIZE: usize = 1024;

/// Anything a link can run over: a serial port, or an in-memory stream.
pub trait LinkStream: Read + Write + Send {}

impl<T: Read + Write + Send + ?Sized> LinkStream for T {}

enum Endpoint {
    Serial { baud: u32, read_timeout: Duration },
    Attached(Option<Box<dyn LinkStream>>),
}

/// Packetized link over a serial port.
///
/// Each call to [`Transport::available`] parses bytes already buffered and
/// performs at most one read, so a poll never blocks longer than the read
/// timeout.
pub struct SerialLink {
    name: String,
    endpoint: Endpoint,
    stream: Option<Box<dyn LinkStream>>,
    parser: PacketParser,
    pending: BytesMut,
    status: LinkStatus,
    tx: BytesMut,
}

impl SerialLink {
    /// Create a link for a serial port. Nothing is opened until
    /// [`Transport::open`].
    pub fn new(port: impl Into<String>, baud: u32) -> Self {
        Self::with_read_timeout(port, baud, DEFAULT_READ_TIMEOUT)
    }

    /// Create a link with an explicit per-read timeout.
    pub fn with_read_timeout(port: impl Into<String>, baud: u32, read_timeout: Duration) -> Self {
        Self::from_endpoint(port.into(), Endpoint::Serial { baud, read_timeout })
    }

    /// Run the link over an already-connected stream.
    ///
    /// The stream is attached on the first [`Transport::open`] and dropped
    /// on [`Transport::close`]; it cannot be reopened.
    pub fn from_stream(name: impl Into<String>, stream: Box<dyn LinkStream>) -> Self {
        Self::from_endpoint(name.into(), Endpoint::Attached(Some(stream)))
    }

    fn from_endpoint(name: String, endpoint: Endpoint) -> Self {
        Self {
            name,
            endpoint,
            stream: None,
            parser: PacketParser::new(),
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
            status: LinkStatus::NoData,
            tx: BytesMut::with_capacity(MAX_PACKET_SIZE + PACKET_OVERHEAD),
        }
    }

    /// Id of the most recent packet header.
    pub fn packet_id(&self) -> u8 {
        self.parser.packet_id()
    }

    /// Frame and write one packet (packet id 0).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(LinkError::NotOpen)?;
        self.tx.clear();
        encode_packet(0, payload, &mut self.tx)?;
        stream.write_all(&self.tx)?;
        stream.flush()?;
        Ok(())
    }

    /// Feed buffered bytes to the parser until a packet completes or fails.
    fn drain_pending(&mut self) -> Option<bool> {
        while self.pending.has_remaining() {
            let byte = self.pending.get_u8();
            if let Some(status) = self.parser.update(byte) {
                self.status = status;
                return Some(status == LinkStatus::NewData);
            }
        }
        None
    }

    /// One read from the stream. Timeouts count as zero bytes.
    fn fill(&mut self) -> std::io::Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match stream.read(&mut chunk) {
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(0)
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Transport for SerialLink {
    fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream: Box<dyn LinkStream> = match &mut self.endpoint {
            Endpoint::Serial { baud, read_timeout } => {
                let port = serialport::new(self.name.as_str(), *baud)
                    .timeout(*read_timeout)
                    .open()
                    .map_err(|source| LinkError::PortUnavailable {
                        port: self.name.clone(),
                        source,
                    })?;
                Box::new(port)
            }
            Endpoint::Attached(slot) => slot.take().ok_or_else(|| LinkError::PortUnavailable {
                port: self.name.clone(),
                source: serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    "attached stream already released",
                ),
            })?,
        };

        info!(port = %self.name, "serial link open");
        self.stream = Some(stream);
        self.status = LinkStatus::NoData;
        Ok(())
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            self.pending.clear();
            self.parser = PacketParser::new();
            info!(port = %self.name, "serial link closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn available(&mut self) -> bool {
        if self.stream.is_none() {
            self.status = LinkStatus::NoData;
            return false;
        }

        if let Some(found) = self.drain_pending() {
            return found;
        }

        match self.fill() {
            Ok(0) => {}
            Ok(n) => {
                debug!(port = %self.name, bytes = n, "read");
                if let Some(found) = self.drain_pending() {
                    return found;
                }
            }
            Err(err) => {
                error!(port = %self.name, error = %err, "serial read failed, dropping link");
                self.stream = None;
            }
        }

        self.status = if self.parser.is_idle() {
            LinkStatus::NoData
        } else {
            LinkStatus::Continue
        };
        false
    }

    fn status(&self) -> LinkStatus {
        self.status
    }

    fn receive_buffer(&self) -> &[u8] {
        self.parser.payload()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Bytes written come back out on read.
    #[derive(Clone, Default)]
    struct Loopback {
        bytes: Arc<Mutex<VecDeque<u8>>>,
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let mut bytes = self.bytes.lock().unwrap();
            let n = buf.len().min(bytes.len());
            for slot in buf.iter_mut().take(n) {
                *slot = bytes.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.bytes.lock().unwrap().extend(buf.iter().copied());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Serves `data`, then fails every read as if the device went away.
    struct Unplugged {
        data: Cursor<Vec<u8>>,
    }

    impl Read for Unplugged {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(std::io::Error::from(ErrorKind::BrokenPipe)),
                n => Ok(n),
            }
        }
    }

    impl Write for Unplugged {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn wire(packets: &[&[u8]]) -> Vec<u8> {
        let mut out = BytesMut::new();
        for p in packets {
            encode_packet(0, p, &mut out).unwrap();
        }
        out.to_vec()
    }

    fn cursor_link(bytes: Vec<u8>) -> SerialLink {
        let mut link = SerialLink::from_stream("cursor", Box::new(Cursor::new(bytes)));
        link.open().unwrap();
        link
    }

    #[test]
    fn receives_packets_in_order() {
        let mut link = cursor_link(wire(&[b"\x02one", b"\x03two"]));

        assert!(link.available());
        assert_eq!(link.status(), LinkStatus::NewData);
        assert_eq!(link.receive_buffer(), b"\x02one");

        assert!(link.available());
        assert_eq!(link.receive_buffer(), b"\x03two");

        assert!(!link.available());
        assert_eq!(link.status(), LinkStatus::NoData);
    }

    #[test]
    fn corrupt_packet_sets_negative_status() {
        let mut bytes = wire(&[b"\x02abcdefgh"]);
        let crc_index = bytes.len() - 2;
        bytes[crc_index] ^= 0x55;
        bytes.extend(wire(&[b"\x01\x01"]));

        let mut link = cursor_link(bytes);
        assert!(!link.available());
        assert_eq!(link.status(), LinkStatus::CrcError);
        assert!(link.status().is_error());

        assert!(link.available());
        assert_eq!(link.receive_buffer(), b"\x01\x01");
    }

    #[test]
    fn partial_packet_reports_continue() {
        let bytes = wire(&[b"\x02partial"]);
        let mut link = cursor_link(bytes[..5].to_vec());
        assert!(!link.available());
        assert_eq!(link.status(), LinkStatus::Continue);
    }

    #[test]
    fn send_then_receive_over_loopback() {
        let stream = Loopback::default();
        let mut link = SerialLink::from_stream("loopback", Box::new(stream));
        link.open().unwrap();

        link.send(&[0x04, 0x7E, 0x00, 0x7E]).unwrap();
        assert!(link.available());
        assert_eq!(link.receive_buffer(), &[0x04, 0x7E, 0x00, 0x7E]);
    }

    #[test]
    fn closed_link_is_quiet() {
        let mut link = cursor_link(wire(&[b"\x02x"]));
        link.close();
        link.close();

        assert!(!link.is_open());
        assert!(!link.available());
        assert_eq!(link.status(), LinkStatus::NoData);
        assert!(matches!(link.send(b"x"), Err(LinkError::NotOpen)));
    }

    #[test]
    fn read_failure_closes_link() {
        let stream = Unplugged {
            data: Cursor::new(wire(&[b"\x01\x01"])),
        };
        let mut link = SerialLink::from_stream("unplugged", Box::new(stream));
        link.open().unwrap();

        assert!(link.available());
        assert!(link.is_open());

        assert!(!link.available());
        assert!(!link.is_open());
        assert_eq!(link.status(), LinkStatus::NoData);
    }

    #[test]
    fn attached_stream_cannot_reopen() {
        let mut link = cursor_link(Vec::new());
        link.open().expect("open on an open link is a no-op");
        link.close();

        let err = link.open().unwrap_err();
        assert!(matches!(err, LinkError::PortUnavailable { .. }));
    }

    #[test]
    fn missing_serial_port_is_unavailable() {
        let mut link = SerialLink::new("/dev/osod-does-not-exist", DEFAULT_BAUD);
        let err = link.open().unwrap_err();
        assert!(matches!(err, LinkError::PortUnavailable { ref port, .. } if port == "/dev/osod-does-not-exist"));
        assert!(!link.is_open());
    }
}

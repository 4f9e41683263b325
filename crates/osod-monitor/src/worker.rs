use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use osod_link::{LinkStatus, Transport};
use osod_payload::{decode_frame, Payload, PayloadError, PayloadKind};
use tracing::{debug, error, info, trace, warn};

use crate::queue::Queue;

/// What one incoming poll produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingest {
    /// No complete frame this time.
    Idle,
    /// A payload was decoded and queued.
    Decoded(PayloadKind),
    /// The tag is not registered; nothing was queued.
    Unrecognized(u8),
    /// The frame was too short for its tag; nothing was queued.
    Malformed(PayloadError),
    /// The link rejected the frame; nothing was queued.
    Integrity(LinkStatus),
}

/// The monitor's background loop.
///
/// Owns the transport for as long as it runs. Talks to the rest of the
/// process only through the two queues and the running flag.
pub struct Worker<T> {
    transport: T,
    running: Arc<AtomicBool>,
    input: Queue<Bytes>,
    output: Queue<Payload>,
    idle_sleep: Duration,
}

impl<T: Transport> Worker<T> {
    pub fn new(
        transport: T,
        running: Arc<AtomicBool>,
        input: Queue<Bytes>,
        output: Queue<Payload>,
        idle_sleep: Duration,
    ) -> Self {
        Self {
            transport,
            running,
            input,
            output,
            idle_sleep,
        }
    }

    /// Loop until the running flag clears or the link goes down, then
    /// close the transport and hand it back.
    ///
    /// A lost link clears the running flag, so the owning monitor reports
    /// itself stopped.
    pub fn run(mut self) -> T {
        info!(port = %self.transport.name(), "monitor worker running");

        while self.running.load(Ordering::SeqCst) {
            let drained = self.drain_outgoing();
            let ingest = self.poll_incoming();

            if !self.transport.is_open() {
                error!(port = %self.transport.name(), "link lost, monitor worker exiting");
                self.running.store(false, Ordering::SeqCst);
                break;
            }

            if !drained && ingest == Ingest::Idle && !self.idle_sleep.is_zero() {
                std::thread::sleep(self.idle_sleep);
            }
        }

        self.transport.close();
        info!(port = %self.transport.name(), "monitor worker stopped");
        self.transport
    }

    /// Give up the transport without running.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Take at most one outgoing item off the input queue.
    ///
    /// There is no outgoing protocol yet, so the item is only logged.
    pub fn drain_outgoing(&mut self) -> bool {
        match self.input.try_pop() {
            Some(item) => {
                debug!(bytes = item.len(), "outgoing message drained (not transmitted)");
                true
            }
            None => false,
        }
    }

    /// Poll the transport once and route whatever it produced.
    pub fn poll_incoming(&mut self) -> Ingest {
        let available = self.transport.available();
        let status = self.transport.status();

        if status.is_error() {
            report_integrity_error(self.transport.name(), status);
            return Ingest::Integrity(status);
        }
        if !available {
            return Ingest::Idle;
        }

        match decode_frame(self.transport.receive_buffer()) {
            Ok(Some(payload)) => {
                let kind = payload.kind();
                debug!(kind = %kind, payload = %payload, outcome = "decoded");
                self.output.push(payload);
                Ingest::Decoded(kind)
            }
            Ok(None) => {
                let tag = self.transport.receive_buffer()[0];
                trace!(tag, outcome = "unrecognized", "dropping frame with unknown tag");
                Ingest::Unrecognized(tag)
            }
            Err(err) => {
                let kind = match &err {
                    PayloadError::Malformed { kind, .. } => Some(kind.name()),
                    PayloadError::EmptyFrame => None,
                };
                warn!(kind, error = %err, outcome = "malformed", "dropping malformed frame");
                Ingest::Malformed(err)
            }
        }
    }
}

fn report_integrity_error(port: &str, status: LinkStatus) {
    let code = status.code();
    let outcome = "integrity_error";
    match status {
        LinkStatus::CrcError => warn!(port, code, outcome, "frame dropped: CRC_ERROR"),
        LinkStatus::PayloadError => warn!(port, code, outcome, "frame dropped: PAYLOAD_ERROR"),
        LinkStatus::StopByteError => {
            warn!(port, code, outcome, "frame dropped: STOP_BYTE_ERROR")
        }
        other => warn!(port, code, outcome, "frame dropped: {other}"),
    }
}

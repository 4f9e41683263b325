//! Scripted transport for worker and monitor tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use osod_link::{LinkError, LinkStatus, Result, Transport};

/// One poll result.
#[derive(Debug, Clone)]
pub enum Step {
    Frame(Vec<u8>),
    Status(LinkStatus),
    /// The link fails underneath, as on a device unplug.
    Disconnect,
}

/// Call counters shared with the test body.
#[derive(Debug, Default)]
pub struct Calls {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub polls: AtomicUsize,
}

impl Calls {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

pub struct ScriptedTransport {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<Calls>,
    status: LinkStatus,
    buffer: Vec<u8>,
    poll_delay: Duration,
    refuse_open: bool,
    open: bool,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            calls: Arc::new(Calls::default()),
            status: LinkStatus::NoData,
            buffer: Vec::new(),
            poll_delay: Duration::ZERO,
            refuse_open: false,
            open: false,
        }
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn refusing_open(mut self) -> Self {
        self.refuse_open = true;
        self
    }

    pub fn calls(&self) -> Arc<Calls> {
        Arc::clone(&self.calls)
    }

    /// Handle for appending steps while the transport is owned elsewhere.
    pub fn steps(&self) -> Arc<Mutex<VecDeque<Step>>> {
        Arc::clone(&self.steps)
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self) -> Result<()> {
        if self.refuse_open {
            return Err(LinkError::PortUnavailable {
                port: "scripted".to_string(),
                source: serialport_error(),
            });
        }
        self.calls.opens.fetch_add(1, Ordering::SeqCst);
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn available(&mut self) -> bool {
        self.calls.polls.fetch_add(1, Ordering::SeqCst);
        if !self.poll_delay.is_zero() {
            std::thread::sleep(self.poll_delay);
        }

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Frame(bytes)) => {
                self.buffer = bytes;
                self.status = LinkStatus::NewData;
                true
            }
            Some(Step::Status(status)) => {
                self.status = status;
                false
            }
            Some(Step::Disconnect) => {
                self.open = false;
                self.status = LinkStatus::NoData;
                false
            }
            None => {
                self.status = LinkStatus::NoData;
                false
            }
        }
    }

    fn status(&self) -> LinkStatus {
        self.status
    }

    fn receive_buffer(&self) -> &[u8] {
        &self.buffer
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn serialport_error() -> osod_link::serialport::Error {
    osod_link::serialport::Error::new(osod_link::serialport::ErrorKind::NoDevice, "refused")
}

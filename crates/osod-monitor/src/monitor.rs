use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use osod_link::{SerialLink, Transport};
use osod_payload::Payload;
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::queue::Queue;
use crate::worker::Worker;

/// Clears a monitor's running flag from another thread (e.g. a Ctrl-C
/// handler). The worker exits within one iteration.
#[derive(Debug, Clone)]
pub struct StopSignal {
    running: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn trigger(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Owns a transport and the background worker that drains it.
///
/// Before [`Monitor::start`] and after [`Monitor::stop`] the monitor holds
/// the transport itself; while running, the worker thread owns it and
/// [`Monitor::open`]/[`Monitor::close`] do nothing.
pub struct Monitor<T: Transport + 'static = SerialLink> {
    config: MonitorConfig,
    running: Arc<AtomicBool>,
    input: Queue<Bytes>,
    output: Queue<Payload>,
    transport: Option<T>,
    worker: Option<JoinHandle<Option<T>>>,
}

impl Monitor<SerialLink> {
    /// Monitor a serial port.
    pub fn new(config: MonitorConfig) -> Self {
        let link = SerialLink::with_read_timeout(config.port.clone(), config.baud, config.read_timeout);
        Self::with_transport(config, link)
    }
}

impl<T: Transport + 'static> Monitor<T> {
    /// Monitor an arbitrary transport. The transport should not be open yet.
    pub fn with_transport(config: MonitorConfig, transport: T) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            input: Queue::new(),
            output: Queue::new(),
            transport: Some(transport),
            worker: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Open the held transport. No-op while the worker owns it.
    pub fn open(&mut self) -> Result<()> {
        if let Some(transport) = self.transport.as_mut() {
            transport.open()?;
        }
        Ok(())
    }

    /// Close the held transport. No-op while the worker owns it.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
    }

    /// Open the transport and spawn the worker.
    ///
    /// The port is opened on the calling thread so that an unavailable port
    /// is reported here; the call returns as soon as the worker is spawned.
    /// A failed start leaves the monitor ready for another attempt.
    pub fn start(&mut self) -> Result<()> {
        self.start_on(thread::Builder::new().name("osod-monitor".to_string()))
    }

    fn start_on(&mut self, builder: thread::Builder) -> Result<()> {
        if self.worker.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }
        let mut transport = self.transport.take().ok_or(MonitorError::TransportLost)?;

        if let Err(err) = transport.open() {
            self.transport = Some(transport);
            return Err(err.into());
        }

        self.running.store(true, Ordering::SeqCst);
        let worker = Worker::new(
            transport,
            Arc::clone(&self.running),
            self.input.clone(),
            self.output.clone(),
            self.config.idle_sleep,
        );

        match spawn_worker(builder, worker) {
            Ok(handle) => {
                info!(port = %self.config.port, baud = self.config.baud, "monitor started");
                self.worker = Some(handle);
                Ok(())
            }
            Err((err, transport)) => {
                self.running.store(false, Ordering::SeqCst);
                if let Some(mut transport) = transport {
                    transport.close();
                    self.transport = Some(transport);
                }
                Err(MonitorError::Spawn(err))
            }
        }
    }

    /// Clear the running flag and wait for the worker to close the
    /// transport and exit. Stopping a stopped monitor does nothing.
    pub fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);

        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        self.transport = handle.join().map_err(|_| MonitorError::WorkerPanicked)?;
        info!(port = %self.config.port, "monitor stopped");
        Ok(())
    }

    /// True while a worker is spawned and has not been told to stop.
    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// True once the worker thread has returned (or was never started).
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Handle for stopping the worker from another thread.
    pub fn stop_signal(&self) -> StopSignal {
        StopSignal {
            running: Arc::clone(&self.running),
        }
    }

    /// Queue outgoing data for the worker. Never blocks.
    pub fn send(&self, data: impl Into<Bytes>) {
        let data = data.into();
        debug!(bytes = data.len(), "queued outgoing message");
        self.input.push(data);
    }

    /// Next decoded payload, if one is waiting. Never blocks.
    pub fn receive(&self) -> Option<Payload> {
        self.output.try_pop()
    }

    /// Next decoded payload, waiting at most `timeout`.
    pub fn receive_timeout(&self, timeout: Duration) -> Option<Payload> {
        self.output.pop_timeout(timeout)
    }

    /// Queue of outgoing data (controller → worker).
    pub fn input_queue(&self) -> &Queue<Bytes> {
        &self.input
    }

    /// Queue of decoded payloads (worker → controller).
    pub fn output_queue(&self) -> &Queue<Payload> {
        &self.output
    }
}

/// Spawn the worker thread. If the thread cannot be created, the worker's
/// transport comes back with the error instead of being dropped.
fn spawn_worker<T: Transport + 'static>(
    builder: thread::Builder,
    worker: Worker<T>,
) -> std::result::Result<JoinHandle<Option<T>>, (std::io::Error, Option<T>)> {
    let slot = Arc::new(Mutex::new(Some(worker)));
    let handoff = Arc::clone(&slot);
    let spawned = builder.spawn(move || {
        let worker = handoff.lock().unwrap_or_else(PoisonError::into_inner).take();
        worker.map(Worker::run)
    });

    spawned.map_err(|err| {
        let worker = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        (err, worker.map(Worker::into_transport))
    })
}

impl<T: Transport + 'static> Drop for Monitor<T> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl<T: Transport + 'static> std::fmt::Debug for Monitor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

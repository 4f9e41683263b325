use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use osod_link::Transport;
use osod_monitor::{Monitor, MonitorConfig, MonitorError};
use osod_payload::Payload;
use tracing::{info, warn};

use crate::cmd::MonitorArgs;
use crate::exit::{io_error, link_error, monitor_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_payload, OutputFormat};
use crate::sink::PayloadLog;

const RECEIVE_POLL: Duration = Duration::from_millis(100);
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// How one open-to-close session of the monitor ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    /// Interrupted, or `--count` payloads were handled.
    Finished,
    /// The worker exited on its own because the link went down.
    LinkLost,
}

/// Port reopen policy.
#[derive(Debug, Clone, Copy)]
struct Retry {
    interval: Duration,
    max_attempts: Option<u32>,
}

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let retry = Retry {
        interval: parse_duration(&args.retry_interval)?,
        max_attempts: args.max_attempts,
    };
    let mut log = args
        .log_dir
        .as_ref()
        .map(PayloadLog::create)
        .transpose()
        .map_err(|err| io_error("failed creating log directory", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut monitor = Monitor::new(MonitorConfig::new(&args.port, args.baud));
    let handled = supervise(&mut monitor, &running, retry, args.count, |payload| {
        print_payload(payload, format);
        if let Some(log) = log.as_mut() {
            log.record(payload)
                .map_err(|err| io_error("failed writing payload log", err))?;
        }
        Ok(())
    })?;

    info!(payloads = handled, "monitor finished");
    Ok(SUCCESS)
}

/// Keep the monitor running until interrupted or `count` payloads have been
/// handled, reopening the port whenever the link is lost.
fn supervise<T, F>(
    monitor: &mut Monitor<T>,
    running: &AtomicBool,
    retry: Retry,
    count: Option<usize>,
    mut on_payload: F,
) -> CliResult<usize>
where
    T: Transport + 'static,
    F: FnMut(&Payload) -> CliResult<()>,
{
    let mut handled = 0usize;
    while start_with_retry(monitor, running, retry)? {
        let session = consume(monitor, running, count, &mut handled, &mut on_payload);
        monitor
            .stop()
            .map_err(|err| monitor_error("stop failed", err))?;

        match session? {
            Session::Finished => break,
            Session::LinkLost => {
                warn!(port = %monitor.config().port, "link lost, reopening");
            }
        }
    }
    Ok(handled)
}

/// Start the monitor, retrying while the port is unavailable.
///
/// Returns `Ok(false)` if `running` is cleared before the port opens.
fn start_with_retry<T: Transport + 'static>(
    monitor: &mut Monitor<T>,
    running: &AtomicBool,
    retry: Retry,
) -> CliResult<bool> {
    let mut attempts = 0u32;
    while running.load(Ordering::SeqCst) {
        attempts = attempts.saturating_add(1);
        match monitor.start() {
            Ok(()) => return Ok(true),
            Err(MonitorError::TransportUnavailable(err)) => {
                if retry.max_attempts.is_some_and(|max| attempts >= max) {
                    return Err(link_error("open failed", err));
                }
                warn!(
                    port = %monitor.config().port,
                    attempt = attempts,
                    error = %err,
                    "port unavailable, retrying"
                );
                sleep_while_running(running, retry.interval);
            }
            Err(err) => return Err(monitor_error("start failed", err)),
        }
    }
    Ok(false)
}

/// Hand each decoded payload to `on_payload` until `running` is cleared,
/// `count` payloads have been handled in total, or the worker exits.
fn consume<T, F>(
    monitor: &Monitor<T>,
    running: &AtomicBool,
    count: Option<usize>,
    handled: &mut usize,
    mut on_payload: F,
) -> CliResult<Session>
where
    T: Transport + 'static,
    F: FnMut(&Payload) -> CliResult<()>,
{
    while running.load(Ordering::SeqCst) {
        if count.is_some_and(|count| *handled >= count) {
            break;
        }
        let payload = match monitor.receive_timeout(RECEIVE_POLL) {
            Some(payload) => payload,
            // The worker may have queued one last payload before exiting.
            None if monitor.is_finished() => match monitor.receive() {
                Some(payload) => payload,
                None => return Ok(Session::LinkLost),
            },
            None => continue,
        };
        on_payload(&payload)?;
        *handled = handled.saturating_add(1);
    }
    Ok(Session::Finished)
}

fn sleep_while_running(running: &AtomicBool, total: Duration) {
    let deadline = Instant::now().checked_add(total);
    while running.load(Ordering::SeqCst) {
        let wait = match deadline {
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(left) if !left.is_zero() => left.min(INTERRUPT_POLL),
                _ => break,
            },
            None => INTERRUPT_POLL,
        };
        thread::sleep(wait);
    }
}

/// Parse `<digits>[ms|s]`; a bare number is seconds.
fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input:?}")))?;
    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "" | "s" => Duration::from_secs(value),
        other => {
            return Err(CliError::new(
                USAGE,
                format!("unsupported duration unit {other:?} (use ms or s)"),
            ))
        }
    };

    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

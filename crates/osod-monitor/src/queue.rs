use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Longest single condvar wait; long timeouts are waited out in slices.
const MAX_WAIT_SLICE: Duration = Duration::from_secs(60);

/// Unbounded FIFO shared between threads.
///
/// Clones are handles to the same queue. Any number of threads may push and
/// pop; items come out in the order they went in. `push` never blocks on a
/// consumer.
pub struct Queue<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                items: Mutex::new(VecDeque::new()),
                ready: Condvar::new(),
            }),
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        // No critical section can panic halfway, so a poisoned queue is intact.
        self.shared
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item.
    pub fn push(&self, item: T) {
        self.items().push_back(item);
        self.shared.ready.notify_one();
    }

    /// Remove the oldest item, if any. Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        self.items().pop_front()
    }

    /// Remove the oldest item, waiting up to `timeout` for one to arrive.
    ///
    /// A timeout too large to represent as a deadline waits indefinitely.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut items = self.items();
        if let Some(item) = items.pop_front() {
            return Some(item);
        }

        let deadline = Instant::now().checked_add(timeout);
        loop {
            let wait = match deadline {
                Some(deadline) => {
                    let remaining = deadline.checked_duration_since(Instant::now())?;
                    if remaining.is_zero() {
                        return None;
                    }
                    remaining.min(MAX_WAIT_SLICE)
                }
                None => MAX_WAIT_SLICE,
            };
            items = self
                .shared
                .ready
                .wait_timeout(items, wait)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue").field("len", &self.len()).finish()
    }
}

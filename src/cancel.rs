//! Cooperative cancellation of blocked consumers.
//!
//! A consumer blocked in [`Queue::dequeue_cancellable`] registers its queue with the token for
//! the duration of the call. Cancelling the token wakes every registered queue so the consumer
//! can observe the cancellation on its next wake cycle.
//!
//! The token's own lock and a queue's lock are never held together: a consumer registers before
//! locking its queue and unregisters after unlocking it, while [`CancellationToken::cancel`]
//! releases the token's lock before waking the queues.
//!
//! [`Queue::dequeue_cancellable`]: crate::Queue::dequeue_cancellable

use crate::variant::sync::atomic::{AtomicBool, Ordering};
use crate::variant::sync::{Arc, Mutex};

use std::fmt;
use std::mem;

use tracing::trace;

/// Wakes every consumer blocked on a queue.
pub(crate) trait Wake: Send + Sync {
    /// Name of the queue, for log events.
    fn name(&self) -> &str;

    fn wake(&self);
}

/// A signal asking consumers blocked in [`Queue::dequeue_cancellable`] to give up.
///
/// Clones share the same state. Once cancelled, a token stays cancelled.
///
/// # Examples
///
/// ```
/// use monitor_queue::{CancellationToken, DequeueError, Queue};
/// use std::thread;
///
/// let queue = Queue::<usize>::new();
/// let token = CancellationToken::new();
///
/// let th = {
///     let (q, t) = (queue.clone(), token.clone());
///     thread::spawn(move || q.dequeue_cancellable(&t, None))
/// };
///
/// while queue.waiting() == 0 {
///     thread::yield_now();
/// }
/// token.cancel();
///
/// assert_eq!(th.join().unwrap(), Err(DequeueError::Cancelled));
/// ```
///
/// [`Queue::dequeue_cancellable`]: crate::Queue::dequeue_cancellable
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    cancelled: AtomicBool,
    listeners: Mutex<Listeners>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Box<dyn Wake>)>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                listeners: Mutex::new(Listeners::default()),
            }),
        }
    }

    /// Cancels the token and wakes the consumers currently blocked on it.
    ///
    /// Cancelling an already cancelled token does nothing.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        let entries = mem::take(&mut self.inner.listeners.lock().entries);
        for (_, queue) in &entries {
            trace!(queue = %queue.name(), "cancellation requested");
            queue.wake();
        }
    }

    /// Reports whether [`CancellationToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Registers `queue` to be woken on cancellation until the returned guard is dropped.
    pub(crate) fn register(&self, queue: Box<dyn Wake>) -> Registration<'_> {
        let mut listeners = self.inner.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, queue));

        Registration { token: self, id }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Keeps a queue registered with a [`CancellationToken`].
pub(crate) struct Registration<'a> {
    token: &'a CancellationToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        // The entry is already gone if the token fired.
        let removed = {
            let mut listeners = self.token.inner.listeners.lock();
            listeners
                .entries
                .iter()
                .position(|(id, _)| *id == self.id)
                .map(|pos| listeners.entries.swap_remove(pos))
        };

        // The queue handle is released outside of the token's lock.
        drop(removed);
    }
}

//! Errors reported by the [`Queue`].
//!
//! An empty queue is not an error: [`Queue::try_dequeue`] reports it with `None`.
//!
//! [`Queue`]: crate::Queue
//! [`Queue::try_dequeue`]: crate::Queue::try_dequeue

use std::fmt;

use thiserror::Error;

/// Reasons a bounded blocking removal gave up before an item became available.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum DequeueError {
    /// The deadline passed while the queue was empty.
    #[error("timed out waiting for an item")]
    Timeout,

    /// The [`CancellationToken`] was cancelled while the queue was empty.
    ///
    /// [`CancellationToken`]: crate::CancellationToken
    #[error("cancelled while waiting for an item")]
    Cancelled,
}

/// The node wrapping an item could not be allocated.
///
/// The rejected item is carried back to the caller, who keeps its ownership.
#[derive(Error)]
#[error("failed to allocate a queue node")]
pub struct AllocError<T>(T);

impl<T> AllocError<T> {
    pub(crate) fn new(item: T) -> Self {
        Self(item)
    }

    /// Returns a reference to the rejected item.
    pub fn item(&self) -> &T {
        &self.0
    }

    /// Takes back the rejected item.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for AllocError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocError").finish_non_exhaustive()
    }
}

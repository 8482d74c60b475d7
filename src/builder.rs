//! Configuration of a [`Queue`].
//!
//! [`Queue`]: crate::Queue

use crate::queue::Queue;

/// Name given to queues built without [`Builder::name`].
pub(crate) const DEFAULT_NAME: &str = "queue";

/// Order in which blocked consumers are served.
///
/// Items always leave the queue in the order they were inserted. This only decides which of the
/// blocked consumers receives the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WakeOrder {
    /// Each insertion wakes one blocked consumer, picked by the scheduler. A consumer arriving
    /// while others are blocked may take the item first.
    #[default]
    Unordered,

    /// Blocked consumers are served in the order they started waiting, and new consumers never
    /// overtake them. [`Queue::try_dequeue`] reports an empty queue while consumers are blocked.
    ///
    /// [`Queue::try_dequeue`]: crate::Queue::try_dequeue
    Arrival,
}

/// Builds a [`Queue`] with a custom configuration.
///
/// # Examples
///
/// ```
/// use monitor_queue::{Builder, WakeOrder};
///
/// let queue = Builder::new()
///     .name("jobs")
///     .wake_order(WakeOrder::Arrival)
///     .build::<u64>();
///
/// assert_eq!(queue.name(), "jobs");
/// assert_eq!(queue.wake_order(), WakeOrder::Arrival);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Builder {
    pub(crate) name: Option<String>,
    pub(crate) wake_order: WakeOrder,
}

impl Builder {
    /// Creates a [`Builder`] with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name attached to the queue's log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the [`WakeOrder`] of blocked consumers.
    pub fn wake_order(mut self, wake_order: WakeOrder) -> Self {
        self.wake_order = wake_order;
        self
    }

    /// Creates an empty [`Queue`] with this configuration.
    pub fn build<T>(self) -> Queue<T> {
        Queue::with_builder(self)
    }
}

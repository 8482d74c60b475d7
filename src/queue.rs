//! A thread-safe unbounded FIFO queue with blocking removal.

use crate::builder::{Builder, WakeOrder, DEFAULT_NAME};
use crate::cancel::{CancellationToken, Wake};
use crate::error::{AllocError, DequeueError};
use crate::node::{Node, NodeList};
use crate::variant::sync::{Arc, Condvar, Mutex};

use std::alloc::handle_alloc_error;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

/// A thread-safe unbounded FIFO queue.
///
/// Cloning a [`Queue`] creates a new handle to the same queue. The queue and the items still in
/// it are dropped with the last handle.
#[derive(Debug)]
pub struct Queue<T> {
    inner: Arc<Inner<T>>,
}

/// A point-in-time snapshot of the counters of a [`Queue`], read under a single lock hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    /// Number of items currently queued.
    pub size: usize,

    /// Number of consumers currently suspended in a blocking removal.
    pub waiting: usize,

    /// Number of items removed by [`Queue::dequeue`] and [`Queue::try_dequeue`] and their
    /// variants since the queue was created.
    pub visited: usize,
}

impl<T> Queue<T> {
    /// Creates a new empty [`Queue`] with the default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use monitor_queue::Queue;
    ///
    /// let queue = Queue::<usize>::new();
    /// assert!(queue.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_builder(Builder::default())
    }

    pub(crate) fn with_builder(builder: Builder) -> Self {
        let name = builder
            .name
            .map_or_else(|| DEFAULT_NAME.into(), String::into_boxed_str);
        debug!(queue = %name, wake_order = ?builder.wake_order, "queue created");

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::new()),
                available: Condvar::new(),
                name,
                wake_order: builder.wake_order,
            }),
        }
    }

    /// Returns the name attached to the queue's log events.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the [`WakeOrder`] of blocked consumers.
    pub fn wake_order(&self) -> WakeOrder {
        self.inner.wake_order
    }

    /// Appends an item at the back of the [`Queue`] and wakes a blocked consumer, if any.
    ///
    /// The queue is unbounded: this never blocks on capacity. On allocation failure the
    /// process is aborted through [`handle_alloc_error`]; use [`Queue::try_enqueue`] to handle
    /// it instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use monitor_queue::Queue;
    ///
    /// let queue = Queue::<usize>::new();
    ///
    /// queue.enqueue(1);
    /// queue.enqueue(2);
    /// queue.enqueue(3);
    ///
    /// assert_eq!(queue.len(), 3);
    /// ```
    pub fn enqueue(&self, item: T) {
        if self.try_enqueue(item).is_err() {
            handle_alloc_error(Node::<T>::layout())
        }
    }

    /// Appends an item at the back of the [`Queue`], handing it back if its node cannot be
    /// allocated.
    pub fn try_enqueue(&self, item: T) -> Result<(), AllocError<T>> {
        let node = Node::alloc(item).map_err(|item| {
            warn!(queue = %self.inner.name, "failed to allocate a queue node");
            AllocError::new(item)
        })?;

        self.inner.push(node);
        Ok(())
    }

    /// Removes the item at the front of the [`Queue`], blocking the calling thread until one is
    /// available.
    ///
    /// If no item is ever inserted this never returns. See [`Queue::dequeue_timeout`] and
    /// [`Queue::dequeue_cancellable`] for bounded waits.
    ///
    /// # Examples
    ///
    /// ```
    /// use monitor_queue::Queue;
    /// use std::thread;
    ///
    /// let queue = Queue::<usize>::new();
    ///
    /// let q = queue.clone();
    /// let th = thread::spawn(move || q.dequeue());
    ///
    /// queue.enqueue(7);
    /// assert_eq!(th.join().unwrap(), 7);
    /// ```
    pub fn dequeue(&self) -> T {
        match self.inner.wait_for_item(None, || None::<Infallible>) {
            Ok(item) => item,
            Err(never) => match never {},
        }
    }

    /// Same as [`Queue::dequeue`] but gives up once `timeout` has elapsed.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Result<T, DequeueError> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.dequeue_deadline(deadline),
            None => Ok(self.dequeue()),
        }
    }

    /// Same as [`Queue::dequeue`] but gives up at `deadline`.
    ///
    /// An item that is already available is returned even if the deadline has passed.
    pub fn dequeue_deadline(&self, deadline: Instant) -> Result<T, DequeueError> {
        self.inner
            .wait_for_item(Some(deadline), || give_up(None, Some(deadline)))
    }

    /// Removes the item at the front of the [`Queue`], blocking until one is available, `token`
    /// is cancelled or the optional `deadline` passes.
    ///
    /// An item that is already available is returned even if `token` is cancelled.
    pub fn dequeue_cancellable(
        &self,
        token: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<T, DequeueError>
    where
        T: Send + 'static,
    {
        let _registration = token.register(Box::new(self.clone()));
        self.inner
            .wait_for_item(deadline, || give_up(Some(token), deadline))
    }

    /// Removes the item at the front of the [`Queue`]. Returns `None` if the [`Queue`] is
    /// empty, without blocking.
    ///
    /// With [`WakeOrder::Arrival`], `None` is also returned while consumers are blocked in a
    /// removal, as they are served first.
    ///
    /// # Examples
    ///
    /// ```
    /// use monitor_queue::Queue;
    ///
    /// let queue = Queue::<usize>::new();
    /// assert!(queue.try_dequeue().is_none());
    ///
    /// for i in 0..8 {
    ///   queue.enqueue(i);
    /// }
    ///
    /// for i in 0..8 {
    ///   assert_eq!(Some(i), queue.try_dequeue());
    /// }
    ///
    /// assert!(queue.try_dequeue().is_none());
    /// ```
    pub fn try_dequeue(&self) -> Option<T> {
        self.inner.try_pop()
    }

    /// Removes every queued item and returns them in FIFO order.
    ///
    /// Drained items are not counted by [`Queue::visited`].
    pub fn drain(&self) -> Vec<T> {
        let mut state = self.inner.state.lock();
        let mut items = Vec::with_capacity(state.nodes.len());
        while let Some(item) = state.nodes.pop_front() {
            items.push(item);
        }
        items
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.inner.state.lock().nodes.len()
    }

    /// Returns `true` if no item is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().nodes.is_empty()
    }

    /// Returns the number of consumers currently suspended in a blocking removal.
    pub fn waiting(&self) -> usize {
        self.inner.state.lock().waiting
    }

    /// Returns the number of items removed since the queue was created.
    pub fn visited(&self) -> usize {
        self.inner.state.lock().visited
    }

    /// Returns the size, waiting and visited counters read under a single lock hold.
    pub fn stats(&self) -> Stats {
        let state = self.inner.state.lock();
        Stats {
            size: state.nodes.len(),
            waiting: state.waiting,
            visited: state.visited,
        }
    }
}

impl Queue<()> {
    /// Returns a [`Builder`] to configure a new [`Queue`]. The item type is picked by
    /// [`Builder::build`].
    ///
    /// # Examples
    ///
    /// ```
    /// use monitor_queue::Queue;
    ///
    /// let queue: Queue<String> = Queue::builder().name("logs").build();
    /// assert_eq!(queue.name(), "logs");
    /// ```
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Wake for Queue<T> {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn wake(&self) {
        // Notifying under the lock guarantees a consumer either sees the cancellation before
        // suspending or is already suspended and receives the notification.
        let _state = self.inner.state.lock();
        self.inner.available.notify_all();
    }
}

#[derive(Debug)]
struct Inner<T> {
    /// Storage and counters.
    state: Mutex<State<T>>,

    /// Signaled when an item may be available to a blocked consumer.
    available: Condvar,

    name: Box<str>,

    wake_order: WakeOrder,
}

#[derive(Debug)]
struct State<T> {
    nodes: NodeList<T>,
    waiting: usize,
    visited: usize,

    /// Tickets of the consumers blocked with [`WakeOrder::Arrival`], oldest first.
    tickets: VecDeque<u64>,
    next_ticket: u64,
}

impl<T> State<T> {
    fn new() -> Self {
        Self {
            nodes: NodeList::new(),
            waiting: 0,
            visited: 0,
            tickets: VecDeque::new(),
            next_ticket: 0,
        }
    }

    /// Unlinks the head item and counts it as visited.
    fn remove_head(&mut self) -> Option<T> {
        let item = self.nodes.pop_front()?;
        self.visited += 1;
        Some(item)
    }

    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.tickets.push_back(ticket);
        ticket
    }

    fn release_ticket(&mut self, ticket: u64) {
        if let Some(pos) = self.tickets.iter().position(|t| *t == ticket) {
            let _ = self.tickets.remove(pos);
        }
    }

    /// Reports whether the consumer holding `ticket` may take the head item.
    fn is_turn(&self, wake_order: WakeOrder, ticket: Option<u64>) -> bool {
        match wake_order {
            WakeOrder::Unordered => true,
            WakeOrder::Arrival => self.tickets.front().copied() == ticket,
        }
    }
}

impl<T> Inner<T> {
    fn push(&self, node: Box<Node<T>>) {
        let mut state = self.state.lock();
        state.nodes.push_back(node);

        if state.waiting > 0 {
            match self.wake_order {
                WakeOrder::Unordered => self.available.notify_one(),
                // Only the oldest ticket may take the item, and which thread a single
                // notification reaches is up to the scheduler.
                WakeOrder::Arrival => self.available.notify_all(),
            }
        }
    }

    fn try_pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        if !state.is_turn(self.wake_order, None) {
            return None;
        }
        state.remove_head()
    }

    /// Blocking removal shared by every `dequeue` flavor.
    ///
    /// Each wake cycle first checks whether an item is available to this consumer, then asks
    /// `give_up` whether to stop waiting. Checking the item first means a consumer woken for an
    /// item never leaves it behind. `deadline` only bounds each suspension; `give_up` decides
    /// when it has passed.
    fn wait_for_item<E: fmt::Display>(
        &self,
        deadline: Option<Instant>,
        give_up: impl Fn() -> Option<E>,
    ) -> Result<T, E> {
        let mut state = self.state.lock();
        let mut ticket = None;

        loop {
            if state.is_turn(self.wake_order, ticket) {
                if let Some(item) = state.remove_head() {
                    if let Some(ticket) = ticket {
                        state.release_ticket(ticket);
                        self.pass_turn(&state);
                    }
                    return Ok(item);
                }
            }

            if let Some(err) = give_up() {
                if let Some(ticket) = ticket {
                    state.release_ticket(ticket);
                    self.pass_turn(&state);
                }
                trace!(queue = %self.name, error = %err, "consumer gave up");
                return Err(err);
            }

            if self.wake_order == WakeOrder::Arrival && ticket.is_none() {
                ticket = Some(state.take_ticket());
            }

            state.waiting += 1;
            trace!(queue = %self.name, waiting = state.waiting, "consumer parked");

            state = match deadline {
                Some(deadline) => self.available.wait_until(state, deadline).0,
                None => self.available.wait(state),
            };

            state.waiting -= 1;
            trace!(queue = %self.name, waiting = state.waiting, "consumer woke up");
        }
    }

    /// Wakes the consumers holding a ticket if the oldest one can now take an item.
    fn pass_turn(&self, state: &State<T>) {
        if !state.nodes.is_empty() && !state.tickets.is_empty() {
            self.available.notify_all();
        }
    }
}

/// Reports why a bounded removal should stop waiting: cancellation wins over the deadline.
fn give_up(token: Option<&CancellationToken>, deadline: Option<Instant>) -> Option<DequeueError> {
    if token.is_some_and(CancellationToken::is_cancelled) {
        Some(DequeueError::Cancelled)
    } else if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        Some(DequeueError::Timeout)
    } else {
        None
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let remaining = self.state.lock().nodes.len();
        debug!(queue = %self.name, remaining, "queue dropped");
    }
}

#![deny(
    warnings,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_op_in_unsafe_fn,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    rust_2018_idioms
)]

//! A thread-safe unbounded FIFO queue with blocking, timed and cancellable removal.
//!
//! Every operation runs under a single lock. Consumers blocked in [`Queue::dequeue`] sleep on a
//! condition variable and are woken by [`Queue::enqueue`], one per inserted item. Items leave
//! the queue in the exact order they were inserted, whichever threads insert or remove them.
//!
//! # Examples
//!
//! Single Producer - Single Consumer:
//!
//! ```
//! use monitor_queue::Queue;
//!
//! let queue: Queue<usize> = Queue::new();
//!
//! for i in 1..=5 {
//!     queue.enqueue(i);
//! }
//!
//! for i in 1..=5 {
//!     assert_eq!(i, queue.dequeue());
//! }
//!
//! assert_eq!(queue.len(), 0);
//! assert_eq!(queue.visited(), 5);
//! ```
//!
//! Multi Producer - Multi Consumer, with consumers blocked before anything is inserted:
//!
//! ```
//! use monitor_queue::Queue;
//! use std::thread;
//!
//! const COUNT: usize = 1_000;
//! const CONCURRENCY: usize = 4;
//!
//! let queue: Queue<usize> = Queue::new();
//!
//! let consumers: Vec<_> = (0..CONCURRENCY)
//!     .map(|_| {
//!         let q = queue.clone();
//!         thread::spawn(move || (0..COUNT).map(|_| q.dequeue()).sum::<usize>())
//!     })
//!     .collect();
//!
//! let producers: Vec<_> = (0..CONCURRENCY)
//!     .map(|_| {
//!         let q = queue.clone();
//!         thread::spawn(move || {
//!             for i in 0..COUNT {
//!                 q.enqueue(i);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for th in producers {
//!     th.join().unwrap();
//! }
//!
//! let total: usize = consumers.into_iter().map(|th| th.join().unwrap()).sum();
//!
//! assert_eq!(total, CONCURRENCY * (0..COUNT).sum::<usize>());
//! assert_eq!(queue.waiting(), 0);
//! assert_eq!(queue.visited(), COUNT * CONCURRENCY);
//! ```
//!
//! Bounded waits:
//!
//! ```
//! use monitor_queue::{DequeueError, Queue};
//! use std::time::Duration;
//!
//! let queue: Queue<usize> = Queue::new();
//!
//! assert_eq!(
//!     queue.dequeue_timeout(Duration::from_millis(10)),
//!     Err(DequeueError::Timeout)
//! );
//! assert_eq!(queue.waiting(), 0);
//! ```

mod builder;
mod cancel;
mod error;
mod queue;

pub(crate) mod node;
pub(crate) mod variant;

pub use builder::{Builder, WakeOrder};
pub use cancel::CancellationToken;
pub use error::{AllocError, DequeueError};
pub use queue::{Queue, Stats};

#![cfg(loom)]

use loom::thread;
use monitor_queue::{Builder, CancellationToken, DequeueError, Queue, WakeOrder};

// Loom explores every interleaving of the threads below, including the ones where a producer
// runs between a consumer's emptiness check and its suspension.
//
// Run all tests:
//
// RUSTFLAGS="--cfg loom" cargo test --package monitor-queue --test loom_queue --release
//
// Add `LOOM_MAX_PREEMPTIONS=2` (or =3) to the command above to reduce the test complexity and so
// its duration.

// RUSTFLAGS="--cfg loom" cargo test --package monitor-queue --test loom_queue --release -- test_no_lost_wakeup --exact
#[test]
fn test_no_lost_wakeup() {
    loom::model(|| {
        let queue: Queue<usize> = Queue::new();

        let q1 = queue.clone();
        let th = thread::spawn(move || q1.dequeue());

        queue.enqueue(1);

        assert_eq!(th.join().unwrap(), 1);
        assert_eq!(queue.waiting(), 0);
        assert_eq!(queue.visited(), 1);
        assert!(queue.is_empty());
    });
}

// RUSTFLAGS="--cfg loom" cargo test --package monitor-queue --test loom_queue --release -- test_mpmc --exact
#[test]
fn test_mpmc() {
    loom::model(|| {
        let queue: Queue<usize> = Queue::new();

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let q = queue.clone();
                thread::spawn(move || q.dequeue())
            })
            .collect();

        let q1 = queue.clone();
        let producer = thread::spawn(move || q1.enqueue(1));
        queue.enqueue(2);

        producer.join().unwrap();
        let mut values: Vec<usize> = consumers.into_iter().map(|th| th.join().unwrap()).collect();
        values.sort_unstable();

        assert_eq!(values, vec![1, 2]);
        assert_eq!(queue.waiting(), 0);
        assert_eq!(queue.visited(), 2);
    });
}

// RUSTFLAGS="--cfg loom" cargo test --package monitor-queue --test loom_queue --release -- test_try_dequeue_conservation --exact
#[test]
fn test_try_dequeue_conservation() {
    loom::model(|| {
        let queue: Queue<usize> = Queue::new();

        let q1 = queue.clone();
        let producer = thread::spawn(move || {
            q1.enqueue(1);
            q1.enqueue(2);
        });

        let q2 = queue.clone();
        let consumer = thread::spawn(move || {
            let mut taken = Vec::new();
            for _ in 0..2 {
                taken.extend(q2.try_dequeue());
            }
            taken
        });

        producer.join().unwrap();
        let taken = consumer.join().unwrap();

        // Whatever was taken came out in order.
        assert!(taken.windows(2).all(|w| w[0] < w[1]));

        let stats = queue.stats();
        assert_eq!(stats.size + taken.len(), 2);
        assert_eq!(stats.visited, taken.len());
        assert_eq!(stats.waiting, 0);
    });
}

// RUSTFLAGS="--cfg loom" cargo test --package monitor-queue --test loom_queue --release -- test_arrival_order --exact
#[test]
fn test_arrival_order() {
    loom::model(|| {
        let queue: Queue<usize> = Builder::new().wake_order(WakeOrder::Arrival).build();

        let q1 = queue.clone();
        let consumer = thread::spawn(move || q1.dequeue());

        queue.enqueue(1);
        let own = queue.try_dequeue();
        queue.enqueue(2);

        let taken = consumer.join().unwrap();
        match own {
            // A blocked consumer holds its turn: the first item is its own.
            None => assert_eq!(taken, 1),
            // The consumer arrived after the first item was taken.
            Some(1) => assert_eq!(taken, 2),
            Some(other) => panic!("unexpected item {}", other),
        }
    });
}

// RUSTFLAGS="--cfg loom" cargo test --package monitor-queue --test loom_queue --release -- test_cancellation --exact
#[test]
fn test_cancellation() {
    loom::model(|| {
        let queue: Queue<usize> = Queue::new();
        let token = CancellationToken::new();

        let (q1, t1) = (queue.clone(), token.clone());
        let consumer = thread::spawn(move || q1.dequeue_cancellable(&t1, None));

        token.cancel();

        assert_eq!(consumer.join().unwrap(), Err(DequeueError::Cancelled));
        assert_eq!(queue.waiting(), 0);
    });
}

#![cfg(not(loom))]

use monitor_queue::Queue;
use std::alloc::{GlobalAlloc, Layout, System};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};

type Payload = [u8; 1000];

/// Size of a queue node holding a `Payload`: the item followed by the link to the next node.
const NODE_SIZE: usize = mem::size_of::<Payload>() + mem::size_of::<usize>();

static FAIL_NODES: AtomicBool = AtomicBool::new(false);

/// Refuses node-sized allocations while `FAIL_NODES` is set.
struct FailingAlloc;

unsafe impl GlobalAlloc for FailingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.size() == NODE_SIZE && FAIL_NODES.load(Ordering::SeqCst) {
            return std::ptr::null_mut();
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: FailingAlloc = FailingAlloc;

// cargo test --package monitor-queue --test alloc -- test_try_enqueue_alloc_failure --exact --nocapture
#[test]
fn test_try_enqueue_alloc_failure() {
    let queue: Queue<Payload> = Queue::new();
    queue.enqueue([1; 1000]);

    FAIL_NODES.store(true, Ordering::SeqCst);
    let err = queue.try_enqueue([7; 1000]).unwrap_err();
    FAIL_NODES.store(false, Ordering::SeqCst);

    assert_eq!(err.item()[0], 7);
    assert_eq!(err.to_string(), "failed to allocate a queue node");
    assert_eq!(err.into_inner()[999], 7);

    // The queue is left as it was.
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.visited(), 0);

    assert!(queue.try_enqueue([2; 1000]).is_ok());
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.dequeue()[0], 1);
    assert_eq!(queue.dequeue()[0], 2);
}

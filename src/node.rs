//! Singly-linked storage of the [`Queue`].
//!
//! Each [`Node`] owns exactly one item and a pointer to the next [`Node`], if any. Nodes are
//! appended at the tail and unlinked from the head of a [`NodeList`], which gives the FIFO order.
//! A [`NodeList`] has no synchronization of its own: the [`Queue`] only touches it while holding
//! its lock.
//!
//! [`Queue`]: crate::queue::Queue

use std::alloc::{alloc, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Holds one item of the [`Queue`].
///
/// [`Queue`]: crate::queue::Queue
pub(crate) struct Node<T> {
    /// The item pushed to the [`Queue`].
    ///
    /// [`Queue`]: crate::queue::Queue
    item: T,

    /// A pointer to the next [`Node`] of the [`NodeList`] if any.
    next: Option<NonNull<Node<T>>>,
}

impl<T> Node<T> {
    /// Allocates a new unlinked [`Node`] holding `item`.
    ///
    /// Unlike `Box::new`, an allocation failure does not abort the process: the item is handed
    /// back to the caller instead.
    pub(crate) fn alloc(item: T) -> Result<Box<Self>, T> {
        let layout = Self::layout();

        // SAFETY: a node always holds a pointer so its layout has a non-zero size.
        let ptr = unsafe { alloc(layout) }.cast::<Self>();

        match NonNull::new(ptr) {
            Some(node) => unsafe {
                node.as_ptr().write(Node { item, next: None });
                // SAFETY: the memory comes from the global allocator with the layout of
                // `Node<T>` and has just been initialized.
                Ok(Box::from_raw(node.as_ptr()))
            },
            None => Err(item),
        }
    }

    /// Reports the memory layout of a [`Node`].
    pub(crate) fn layout() -> Layout {
        Layout::new::<Self>()
    }
}

/// An ordered chain of [`Node`], linked from head to tail.
pub(crate) struct NodeList<T> {
    /// The oldest [`Node`], next to be removed.
    head: Option<NonNull<Node<T>>>,

    /// The newest [`Node`], after which the next one is linked.
    tail: Option<NonNull<Node<T>>>,

    /// Number of linked nodes.
    len: usize,

    _owns: PhantomData<Box<Node<T>>>,
}

// The list exclusively owns its nodes and their items, as a `Vec<T>` would.
unsafe impl<T: Send> Send for NodeList<T> {}
unsafe impl<T: Sync> Sync for NodeList<T> {}

impl<T> NodeList<T> {
    pub(crate) const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            _owns: PhantomData,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Links `node` after the current tail.
    pub(crate) fn push_back(&mut self, mut node: Box<Node<T>>) {
        node.next = None;
        let node = NonNull::from(Box::leak(node));

        match self.tail {
            // SAFETY: the tail is a live node owned by this list.
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.head = Some(node),
        }

        self.tail = Some(node);
        self.len += 1;
    }

    /// Unlinks the head node, frees it and returns its item.
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        self.head.map(|head| {
            // SAFETY: the head was leaked from a `Box` in `push_back` and is unlinked below, so
            // ownership goes back to a single `Box`.
            let node = unsafe { Box::from_raw(head.as_ptr()) };

            self.head = node.next;
            if self.head.is_none() {
                self.tail = None;
            }
            self.len -= 1;

            node.item
        })
    }
}

impl<T> Drop for NodeList<T> {
    fn drop(&mut self) {
        while self.pop_front().is_some() {}
    }
}

impl<T> fmt::Debug for NodeList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeList").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn push(list: &mut NodeList<usize>, item: usize) {
        match Node::alloc(item) {
            Ok(node) => list.push_back(node),
            Err(_) => panic!("allocation failed"),
        }
    }

    #[test]
    fn test_fifo() {
        let mut list = NodeList::new();
        assert!(list.is_empty());

        for i in 0..5 {
            push(&mut list, i);
        }
        assert_eq!(list.len(), 5);

        for i in 0..5 {
            assert_eq!(list.pop_front(), Some(i));
        }

        assert!(list.is_empty());
        assert_eq!(list.pop_front(), None);
    }

    #[test]
    fn test_reuse_after_empty() {
        let mut list = NodeList::new();

        push(&mut list, 1);
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_front(), None);

        // The tail must have been reset, otherwise the new node would be linked to a freed one.
        push(&mut list, 2);
        push(&mut list, 3);
        assert_eq!(list.pop_front(), Some(2));
        push(&mut list, 4);
        assert_eq!(list.pop_front(), Some(3));
        assert_eq!(list.pop_front(), Some(4));
        assert!(list.is_empty());
    }

    #[test]
    fn test_drop_releases_items() {
        let item = Rc::new(());
        let mut list = NodeList::new();

        for _ in 0..3 {
            match Node::alloc(Rc::clone(&item)) {
                Ok(node) => list.push_back(node),
                Err(_) => panic!("allocation failed"),
            }
        }
        assert_eq!(Rc::strong_count(&item), 4);

        drop(list);
        assert_eq!(Rc::strong_count(&item), 1);
    }
}

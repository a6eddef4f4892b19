//! Thread-safe FIFO queue with blocking and non-blocking consumers.
//!
//! Each robot owns one of these for its pending destinations.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// A synchronized FIFO queue that can be closed to release blocked consumers.
pub struct TaskQueue<T> {
    inner: Mutex<TaskQueueState<T>>,
    available: Condvar,
}

struct TaskQueueState<T> {
    queue: VecDeque<T>,
    closed: bool,
}

impl<T> TaskQueue<T> {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TaskQueueState {
                queue: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Push an item; returns it back if the queue is closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut guard = self.inner.lock().expect("task queue mutex poisoned");
        if guard.closed {
            return Err(item);
        }
        guard.queue.push_back(item);
        self.available.notify_one();
        Ok(())
    }

    /// Try to pop immediately without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let mut guard = self.inner.lock().expect("task queue mutex poisoned");
        guard.queue.pop_front()
    }

    /// Block until an item is available, or the queue is closed and empty.
    pub fn pop_blocking_or_closed(&self) -> Option<T> {
        let mut guard = self.inner.lock().expect("task queue mutex poisoned");
        loop {
            if let Some(item) = guard.queue.pop_front() {
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            guard = self.available.wait(guard).expect("condvar wait failed");
        }
    }

    /// Close the queue and wake all blocked consumers. Queued items stay poppable.
    pub fn close(&self) {
        let mut guard = self.inner.lock().expect("task queue mutex poisoned");
        guard.closed = true;
        self.available.notify_all();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().expect("task queue mutex poisoned").closed
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().expect("task queue mutex poisoned");
        guard.queue.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> TaskQueue<T> {
    /// Copy of the pending items in FIFO order.
    pub fn snapshot(&self) -> Vec<T> {
        let guard = self.inner.lock().expect("task queue mutex poisoned");
        guard.queue.iter().cloned().collect()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

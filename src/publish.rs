//! Publication primitives shared between the render thread and readers or
//! background workers.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Holds an immutable value that is replaced atomically.
///
/// Readers take an `Arc` snapshot and keep it for as long as they need; a
/// later `publish` never mutates a value a reader already holds.
#[derive(Debug)]
pub struct Published<T> {
    current: RwLock<Arc<T>>,
}

impl<T> Published<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
        }
    }

    pub fn snapshot(&self) -> Arc<T> {
        self.current.read().clone()
    }

    /// Replaces the value and returns the previous one.
    pub fn publish(&self, value: T) -> Arc<T> {
        let next = Arc::new(value);
        std::mem::replace(&mut *self.current.write(), next)
    }
}

/// A value tagged with the request generation that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Tagged<T> {
    pub generation: u64,
    pub value: T,
}

/// Single-writer/single-reader mailbox where the newest result wins.
///
/// The reader calls [`HandoffSlot::request`] whenever its inputs change; a
/// worker deposits results with the generation it was started for. Results
/// for generations older than the latest request, or older than what is
/// already waiting in the slot, are dropped.
#[derive(Debug)]
pub struct HandoffSlot<T> {
    slot: Mutex<Option<Tagged<T>>>,
    latest_request: AtomicU64,
}

impl<T> Default for HandoffSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandoffSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            latest_request: AtomicU64::new(0),
        }
    }

    /// Starts a new request and returns its generation.
    pub fn request(&self) -> u64 {
        self.latest_request.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn latest_request(&self) -> u64 {
        self.latest_request.load(Ordering::Acquire)
    }

    /// Deposits a result. Returns false if it was stale and dropped.
    pub fn offer(&self, generation: u64, value: T) -> bool {
        if generation < self.latest_request() {
            return false;
        }
        let mut slot = self.slot.lock();
        if let Some(existing) = slot.as_ref() {
            if existing.generation > generation {
                return false;
            }
        }
        *slot = Some(Tagged { generation, value });
        true
    }

    /// Takes whatever is waiting, current or not.
    pub fn take(&self) -> Option<Tagged<T>> {
        self.slot.lock().take()
    }

    /// Takes the waiting value only if it answers the latest request; a stale
    /// value is discarded.
    pub fn take_current(&self) -> Option<T> {
        let latest = self.latest_request();
        let tagged = self.slot.lock().take()?;
        if tagged.generation == latest {
            Some(tagged.value)
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}

//! Handle registry for externally owned widgets.
//!
//! Embedded widgets are addressed by small integer handles. The registry is
//! an explicit object owned by whoever mounts the widgets; a handle lives
//! exactly as long as its [`HandleLease`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

struct RegistryInner<T> {
    entries: Mutex<HashMap<u64, Arc<T>>>,
    next_handle: AtomicU64,
}

/// Maps integer handles to shared widget controllers.
pub struct HandleRegistry<T> {
    inner: Arc<RegistryInner<T>>,
}

impl<T> Clone for HandleRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(HashMap::new()),
                next_handle: AtomicU64::new(1),
            }),
        }
    }

    /// Registers `value` and returns the lease owning its handle.
    pub fn register(&self, value: T) -> HandleLease<T> {
        let handle = self.inner.next_handle.fetch_add(1, Ordering::Relaxed);
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(value));
        HandleLease {
            handle,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn get(&self, handle: u64) -> Option<Arc<T>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ownership of one registered handle; dropping it unregisters the value.
pub struct HandleLease<T> {
    handle: u64,
    registry: Weak<RegistryInner<T>>,
}

impl<T> HandleLease<T> {
    pub fn handle(&self) -> u64 {
        self.handle
    }
}

impl<T> Drop for HandleLease<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.handle);
        }
    }
}

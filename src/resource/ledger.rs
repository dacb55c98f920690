//! Per-session resource ledger

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{ResourceAllocator, ResourceHandle};
use crate::error::{PlayerError, Result};

#[derive(Debug, Default)]
struct LedgerInner {
    /// Handles in creation order
    handles: Vec<ResourceHandle>,
    /// Set once `release_all` has run
    released: bool,
}

/// Tracks every handle created during one session so they can be released
/// together at teardown.
///
/// Handles are never released individually. Once [`release_all`] has run
/// the ledger is closed: later registrations free their handle immediately
/// and fail with [`PlayerError::LedgerClosed`].
///
/// [`release_all`]: ResourceLedger::release_all
pub struct ResourceLedger<A> {
    allocator: Arc<A>,
    inner: Mutex<LedgerInner>,
}

impl<A: ResourceAllocator> ResourceLedger<A> {
    pub fn new(allocator: Arc<A>) -> Self {
        Self {
            allocator,
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    /// Allocate a handle for `bytes` and record it
    pub fn register(&self, bytes: Bytes, mime_type: &str) -> Result<ResourceHandle> {
        let mut inner = self.inner.lock();
        let handle = self.allocator.create(bytes, mime_type);
        if inner.released {
            self.allocator.release(&handle);
            return Err(PlayerError::LedgerClosed);
        }
        inner.handles.push(handle.clone());
        tracing::trace!(address = %handle, held = inner.handles.len(), "registered resource");
        Ok(handle)
    }

    /// Release every held handle and close the ledger.
    ///
    /// Returns the number of handles released; zero on an empty or
    /// already-released ledger.
    pub fn release_all(&self) -> usize {
        let handles = {
            let mut inner = self.inner.lock();
            inner.released = true;
            std::mem::take(&mut inner.handles)
        };
        for handle in &handles {
            self.allocator.release(handle);
        }
        if !handles.is_empty() {
            tracing::debug!(count = handles.len(), "released caption resources");
        }
        handles.len()
    }

    /// Number of handles currently held
    pub fn len(&self) -> usize {
        self.inner.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_released(&self) -> bool {
        self.inner.lock().released
    }

    /// Snapshot of held handles in creation order
    pub fn handles(&self) -> Vec<ResourceHandle> {
        self.inner.lock().handles.clone()
    }
}

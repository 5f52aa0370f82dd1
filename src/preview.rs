//! Revocable display references to selected image bytes.
//!
//! A `PreviewHandle` is what the panel renders. It is released when dropped,
//! so replacing a payload frees the previous preview without any extra
//! bookkeeping by the caller. The registry counts live handles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: AtomicU64,
    live: AtomicUsize,
}

/// Allocates preview handles and tracks how many are still alive
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self, bytes: Arc<[u8]>) -> PreviewHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let live = self.inner.live.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(id, live, "preview allocated");
        PreviewHandle {
            id,
            bytes,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Number of handles allocated by this registry that have not been released
    pub fn live_count(&self) -> usize {
        self.inner.live.load(Ordering::Relaxed)
    }
}

pub struct PreviewHandle {
    id: u64,
    bytes: Arc<[u8]>,
    registry: Arc<RegistryInner>,
}

impl PreviewHandle {
    /// Unique per registry; renderers key their decoded image cache on it.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        let live = self.registry.live.fetch_sub(1, Ordering::Relaxed) - 1;
        tracing::trace!(id = self.id, live, "preview released");
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("id", &self.id)
            .field("len", &self.bytes.len())
            .finish()
    }
}

//! In-process object store
//!
//! Blob-URL style allocator: bytes live in a concurrent map keyed by a
//! random id and are addressed as `blob:vod-player/<uuid>`.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::{ResourceAllocator, ResourceHandle};

/// Address prefix for stored objects
pub const BLOB_PREFIX: &str = "blob:vod-player/";

/// A stored object
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub mime_type: String,
}

/// Blob store backing [`ResourceHandle`] addresses
#[derive(Debug, Default)]
pub struct ObjectStore {
    /// Live objects (id -> object)
    objects: DashMap<Uuid, StoredObject>,
    /// Total bytes currently held
    memory_bytes: AtomicUsize,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the address for an object id
    pub fn make_address(id: Uuid) -> String {
        format!("{}{}", BLOB_PREFIX, id)
    }

    fn parse_address(address: &str) -> Option<Uuid> {
        address
            .strip_prefix(BLOB_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
    }

    /// Look up the bytes behind an address
    pub fn resolve(&self, address: &str) -> Option<StoredObject> {
        let id = Self::parse_address(address)?;
        self.objects.get(&id).map(|o| o.clone())
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Bytes currently held
    pub fn memory_bytes(&self) -> usize {
        self.memory_bytes.load(Ordering::Relaxed)
    }
}

impl ResourceAllocator for ObjectStore {
    fn create(&self, bytes: Bytes, mime_type: &str) -> ResourceHandle {
        let id = Uuid::new_v4();
        let size = bytes.len();
        self.objects.insert(
            id,
            StoredObject {
                data: bytes,
                mime_type: mime_type.to_string(),
            },
        );
        self.memory_bytes.fetch_add(size, Ordering::Relaxed);
        ResourceHandle::new(id, Self::make_address(id))
    }

    fn release(&self, handle: &ResourceHandle) {
        if let Some((_, object)) = self.objects.remove(&handle.id()) {
            self.memory_bytes
                .fetch_sub(object.data.len(), Ordering::Relaxed);
        }
    }
}

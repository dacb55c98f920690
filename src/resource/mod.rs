//! Caption resource handles
//!
//! Converted captions are exposed to the engine at a locally-resolvable
//! address. Creating and releasing those addresses goes through a
//! [`ResourceAllocator`], and every handle a session creates is tracked
//! by that session's [`ResourceLedger`] until it is released in bulk.

pub mod ledger;
pub mod store;

pub use ledger::ResourceLedger;
pub use store::ObjectStore;

use bytes::Bytes;
use std::fmt;
use uuid::Uuid;

/// Opaque reference to converted caption bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    id: Uuid,
    address: String,
}

impl ResourceHandle {
    pub fn new(id: Uuid, address: String) -> Self {
        Self { id, address }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Address the engine loads the resource from
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Creates and releases resource handles
pub trait ResourceAllocator: Send + Sync + 'static {
    /// Expose `bytes` at a fresh address
    fn create(&self, bytes: Bytes, mime_type: &str) -> ResourceHandle;

    /// Invalidate the handle's address and free its bytes
    fn release(&self, handle: &ResourceHandle);
}

//! # Document Store
//!
//! Storage collaborator consumed by the gateway. The gateway only sees the
//! [`Store`] and [`Database`] traits; two implementations ship with the
//! crate:
//!
//! - [`MemoryStore`] - databases built programmatically, used in tests
//! - [`DirectoryStore`] - databases are directories of JSON resource files
//!
//! [`SessionStore`] wraps either one and hides databases the acting
//! principal may not access.

pub mod directory;
pub mod errors;
pub mod lease;
pub mod memory;
pub mod node;
pub mod resource;
pub mod session;

use std::sync::Arc;

pub use directory::DirectoryStore;
pub use errors::{StoreError, StoreResult};
pub use lease::{HandleKind, HandleRegistry, Lease, OpenHandles};
pub use memory::MemoryStore;
pub use node::{Node, NodeKey, NodeKind, NodeSpec, Revision, DOCUMENT_ROOT_KEY};
pub use resource::{NodeReadTrx, Resource, ResourceBuilder, ResourceManager, RevisionSpec};
pub use session::SessionStore;

/// Entry point of a document store
pub trait Store: Send + Sync {
    /// Names of all databases, in no particular order
    fn list_databases(&self) -> StoreResult<Vec<String>>;

    /// Open a database handle; fails with `DatabaseNotFound`
    fn open_database(&self, name: &str) -> StoreResult<Box<dyn Database>>;

    /// Registry tracking this store's open handles
    fn handles(&self) -> &Arc<HandleRegistry>;
}

/// An open database; dropping it releases the handle
pub trait Database: Send {
    fn name(&self) -> &str;

    /// Names of all resources, in no particular order
    fn list_resources(&self) -> StoreResult<Vec<String>>;

    /// Open a resource; fails with `ResourceNotFound`
    fn open_resource(&self, name: &str) -> StoreResult<ResourceManager>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn list_databases(&self) -> StoreResult<Vec<String>> {
        (**self).list_databases()
    }

    fn open_database(&self, name: &str) -> StoreResult<Box<dyn Database>> {
        (**self).open_database(name)
    }

    fn handles(&self) -> &Arc<HandleRegistry> {
        (**self).handles()
    }
}

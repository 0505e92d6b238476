//! Handle accounting
//!
//! Every database, resource manager and read transaction handed out by a
//! store holds a [`Lease`]. The lease registers itself on creation and
//! unregisters on drop, so a quiescent registry proves that no request
//! leaked a handle, including on error paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Kind of handle a lease accounts for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Database,
    ResourceManager,
    ReadTransaction,
}

/// Point-in-time count of open handles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenHandles {
    pub databases: usize,
    pub resource_managers: usize,
    pub read_transactions: usize,
}

impl OpenHandles {
    /// True when nothing is open
    pub fn is_empty(&self) -> bool {
        self.databases == 0 && self.resource_managers == 0 && self.read_transactions == 0
    }
}

/// Shared counters of open handles for one store
#[derive(Debug, Default)]
pub struct HandleRegistry {
    databases: AtomicUsize,
    resource_managers: AtomicUsize,
    read_transactions: AtomicUsize,
}

impl HandleRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn counter(&self, kind: HandleKind) -> &AtomicUsize {
        match kind {
            HandleKind::Database => &self.databases,
            HandleKind::ResourceManager => &self.resource_managers,
            HandleKind::ReadTransaction => &self.read_transactions,
        }
    }

    /// Snapshot the current counts
    pub fn snapshot(&self) -> OpenHandles {
        OpenHandles {
            databases: self.databases.load(Ordering::SeqCst),
            resource_managers: self.resource_managers.load(Ordering::SeqCst),
            read_transactions: self.read_transactions.load(Ordering::SeqCst),
        }
    }
}

/// RAII registration of one open handle
#[derive(Debug)]
pub struct Lease {
    registry: Arc<HandleRegistry>,
    kind: HandleKind,
}

impl Lease {
    /// Register a new handle of the given kind
    pub fn acquire(registry: &Arc<HandleRegistry>, kind: HandleKind) -> Self {
        registry.counter(kind).fetch_add(1, Ordering::SeqCst);
        Self {
            registry: Arc::clone(registry),
            kind,
        }
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.registry.counter(self.kind).fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_registers_and_releases() {
        let registry = HandleRegistry::new();
        {
            let _db = Lease::acquire(&registry, HandleKind::Database);
            let _trx = Lease::acquire(&registry, HandleKind::ReadTransaction);
            let open = registry.snapshot();
            assert_eq!(open.databases, 1);
            assert_eq!(open.resource_managers, 0);
            assert_eq!(open.read_transactions, 1);
        }
        assert!(registry.snapshot().is_empty());
    }
}

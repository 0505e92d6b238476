//! # Resources and Read Transactions
//!
//! A resource is an ordered, non-empty list of revisions numbered from 1.
//! A [`ResourceManager`] is the per-request handle on one resource; a
//! [`NodeReadTrx`] is a cursor over one revision of it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::errors::{StoreError, StoreResult};
use super::lease::{HandleKind, HandleRegistry, Lease};
use super::node::{Node, NodeKey, NodeSpec, Revision, DOCUMENT_ROOT_KEY};

/// One committed revision as stored in a resource file
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionSpec {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

/// Immutable revision history of one resource
#[derive(Debug)]
pub struct Resource {
    name: String,
    revisions: Vec<Arc<Revision>>,
}

impl Resource {
    /// Build a resource from its revision history
    ///
    /// Revisions are numbered in the given order starting at 1. Timestamps
    /// must not decrease, otherwise instant lookups would be ambiguous.
    pub fn from_specs(name: impl Into<String>, specs: &[RevisionSpec]) -> StoreResult<Self> {
        let name = name.into();
        if specs.is_empty() {
            return Err(StoreError::InvalidData(format!(
                "resource '{}' has no revisions",
                name
            )));
        }

        let mut revisions: Vec<Arc<Revision>> = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            if let Some(previous) = revisions.last() {
                if spec.timestamp < previous.timestamp() {
                    return Err(StoreError::InvalidData(format!(
                        "resource '{}': revision {} is older than revision {}",
                        name,
                        index + 1,
                        previous.number()
                    )));
                }
            }
            let revision = Revision::build(index as u32 + 1, spec.timestamp, &spec.nodes)?;
            revisions.push(Arc::new(revision));
        }

        Ok(Self { name, revisions })
    }

    pub fn builder(name: impl Into<String>) -> ResourceBuilder {
        ResourceBuilder {
            name: name.into(),
            revisions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn most_recent_revision_number(&self) -> u32 {
        self.revisions.len() as u32
    }

    pub fn revision(&self, number: u32) -> Option<&Arc<Revision>> {
        if number == 0 {
            return None;
        }
        self.revisions.get(number as usize - 1)
    }

    /// Revision in effect at `instant`
    ///
    /// Exact timestamp matches return that revision. An instant before the
    /// first commit yields 0, one after the last commit yields the most
    /// recent revision, and one between two commits yields the nearer one
    /// (the later one on a tie).
    pub fn revision_number_at(&self, instant: DateTime<Utc>) -> u32 {
        let insertion = match self
            .revisions
            .binary_search_by(|rev| rev.timestamp().cmp(&instant))
        {
            Ok(index) => return self.revisions[index].number(),
            Err(index) => index,
        };

        if insertion == 0 {
            return 0;
        }
        if insertion == self.revisions.len() {
            return self.most_recent_revision_number();
        }

        let before = &self.revisions[insertion - 1];
        let after = &self.revisions[insertion];
        if instant - before.timestamp() < after.timestamp() - instant {
            before.number()
        } else {
            after.number()
        }
    }
}

/// Programmatic construction of a resource's history
pub struct ResourceBuilder {
    name: String,
    revisions: Vec<RevisionSpec>,
}

impl ResourceBuilder {
    /// Append a revision committed at `timestamp`
    pub fn commit(mut self, timestamp: DateTime<Utc>, nodes: Vec<NodeSpec>) -> Self {
        self.revisions.push(RevisionSpec { timestamp, nodes });
        self
    }

    pub fn build(self) -> StoreResult<Resource> {
        Resource::from_specs(self.name, &self.revisions)
    }
}

/// Per-request handle on one resource
#[derive(Debug)]
pub struct ResourceManager {
    database: String,
    resource: Arc<Resource>,
    lease: Lease,
}

impl ResourceManager {
    pub(crate) fn open(
        registry: &Arc<HandleRegistry>,
        database: impl Into<String>,
        resource: Arc<Resource>,
    ) -> Self {
        Self {
            database: database.into(),
            resource,
            lease: Lease::acquire(registry, HandleKind::ResourceManager),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn resource_name(&self) -> &str {
        self.resource.name()
    }

    pub fn most_recent_revision_number(&self) -> u32 {
        self.resource.most_recent_revision_number()
    }

    /// See [`Resource::revision_number_at`]
    pub fn revision_number_at(&self, instant: DateTime<Utc>) -> u32 {
        self.resource.revision_number_at(instant)
    }

    /// Fail unless `revision` is a committed revision number
    pub fn check_revision(&self, revision: u32) -> StoreResult<()> {
        match self.resource.revision(revision) {
            Some(_) => Ok(()),
            None => Err(StoreError::RevisionNotFound {
                revision,
                most_recent: self.most_recent_revision_number(),
            }),
        }
    }

    /// Open a read transaction on `revision`, positioned at the document root
    pub fn begin_read(&self, revision: u32) -> StoreResult<NodeReadTrx> {
        let snapshot = self
            .resource
            .revision(revision)
            .ok_or(StoreError::RevisionNotFound {
                revision,
                most_recent: self.most_recent_revision_number(),
            })?;

        Ok(NodeReadTrx {
            revision: Arc::clone(snapshot),
            current: DOCUMENT_ROOT_KEY,
            _lease: Lease::acquire(self.lease.registry(), HandleKind::ReadTransaction),
        })
    }
}

/// Cursor over a single immutable revision
#[derive(Debug)]
pub struct NodeReadTrx {
    revision: Arc<Revision>,
    current: NodeKey,
    _lease: Lease,
}

impl NodeReadTrx {
    pub fn revision_number(&self) -> u32 {
        self.revision.number()
    }

    pub fn revision_timestamp(&self) -> DateTime<Utc> {
        self.revision.timestamp()
    }

    /// Shared snapshot this transaction reads
    pub fn revision(&self) -> &Arc<Revision> {
        &self.revision
    }

    pub fn node_key(&self) -> NodeKey {
        self.current
    }

    pub fn node(&self) -> Option<&Node> {
        self.revision.node(self.current)
    }

    /// Move to `key`; the cursor stays put when the key does not exist
    pub fn move_to(&mut self, key: NodeKey) -> bool {
        if self.revision.contains(key) {
            self.current = key;
            true
        } else {
            false
        }
    }

    pub fn move_to_document_root(&mut self) {
        self.current = DOCUMENT_ROOT_KEY;
    }

    pub fn move_to_first_child(&mut self) -> bool {
        let first = self.node().and_then(|node| node.children.first().copied());
        match first {
            Some(key) => {
                self.current = key;
                true
            }
            None => false,
        }
    }

    pub fn move_to_parent(&mut self) -> bool {
        match self.node().and_then(|node| node.parent) {
            Some(key) => {
                self.current = key;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn three_revisions() -> Resource {
        Resource::builder("doc")
            .commit(at(10), vec![NodeSpec::element(1, "a")])
            .commit(at(12), vec![NodeSpec::element(1, "a").child(NodeSpec::text(2, "x"))])
            .commit(at(14), vec![NodeSpec::element(1, "b")])
            .build()
            .unwrap()
    }

    #[test]
    fn test_exact_timestamp_match() {
        let res = three_revisions();
        assert_eq!(res.revision_number_at(at(10)), 1);
        assert_eq!(res.revision_number_at(at(12)), 2);
        assert_eq!(res.revision_number_at(at(14)), 3);
    }

    #[test]
    fn test_before_first_revision_is_zero() {
        let res = three_revisions();
        assert_eq!(res.revision_number_at(at(9)), 0);
    }

    #[test]
    fn test_after_last_revision_is_most_recent() {
        let res = three_revisions();
        assert_eq!(res.revision_number_at(at(23)), 3);
    }

    #[test]
    fn test_between_revisions_picks_nearest() {
        let res = three_revisions();
        let near_first = at(10) + chrono::Duration::minutes(30);
        let near_second = at(12) - chrono::Duration::minutes(30);
        assert_eq!(res.revision_number_at(near_first), 1);
        assert_eq!(res.revision_number_at(near_second), 2);
        // Equidistant instants resolve to the later revision.
        assert_eq!(res.revision_number_at(at(11)), 2);
    }

    #[test]
    fn test_empty_history_rejected() {
        assert!(Resource::from_specs("empty", &[]).is_err());
    }

    #[test]
    fn test_decreasing_timestamps_rejected() {
        let result = Resource::builder("doc")
            .commit(at(12), vec![])
            .commit(at(10), vec![])
            .build();
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_read_transaction_navigation() {
        let registry = HandleRegistry::new();
        let manager = ResourceManager::open(&registry, "db", Arc::new(three_revisions()));
        let mut trx = manager.begin_read(2).unwrap();

        assert_eq!(trx.node_key(), DOCUMENT_ROOT_KEY);
        assert!(trx.move_to_first_child());
        assert_eq!(trx.node_key(), 1);
        assert!(trx.move_to_first_child());
        assert_eq!(trx.node_key(), 2);
        assert!(!trx.move_to_first_child());
        assert!(trx.move_to_parent());
        assert!(!trx.move_to(42));
        assert_eq!(trx.node_key(), 1);
        trx.move_to_document_root();
        assert_eq!(trx.node_key(), DOCUMENT_ROOT_KEY);

        assert_eq!(registry.snapshot().read_transactions, 1);
        drop(trx);
        drop(manager);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_begin_read_unknown_revision() {
        let registry = HandleRegistry::new();
        let manager = ResourceManager::open(&registry, "db", Arc::new(three_revisions()));
        let err = manager.begin_read(4).unwrap_err();
        assert!(matches!(
            err,
            StoreError::RevisionNotFound {
                revision: 4,
                most_recent: 3
            }
        ));
        assert!(manager.begin_read(0).is_err());
        assert_eq!(registry.snapshot().read_transactions, 0);
    }
}

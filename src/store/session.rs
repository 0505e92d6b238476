//! Per-session view of a store
//!
//! Databases the principal may not read behave exactly like databases that
//! do not exist: they are left out of listings and fail to open with
//! `DatabaseNotFound`.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::Principal;

use super::errors::{StoreError, StoreResult};
use super::lease::HandleRegistry;
use super::{Database, Store};

/// Store filtered by the acting principal
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn Store>,
    principal: Principal,
    id: Uuid,
}

impl SessionStore {
    pub fn new(inner: Arc<dyn Store>, principal: Principal) -> Self {
        Self {
            inner,
            principal,
            id: Uuid::new_v4(),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Identifier used to correlate log events of one session
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Store for SessionStore {
    fn list_databases(&self) -> StoreResult<Vec<String>> {
        let mut names = self.inner.list_databases()?;
        names.retain(|name| self.principal.can_access(name));
        Ok(names)
    }

    fn open_database(&self, name: &str) -> StoreResult<Box<dyn Database>> {
        if !self.principal.can_access(name) {
            return Err(StoreError::DatabaseNotFound(name.to_string()));
        }
        self.inner.open_database(name)
    }

    fn handles(&self) -> &Arc<HandleRegistry> {
        self.inner.handles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NodeSpec, Resource};
    use chrono::Utc;

    fn backing() -> Arc<dyn Store> {
        let store = MemoryStore::new();
        for db in ["books", "payroll"] {
            let resource = Resource::builder("doc")
                .commit(Utc::now(), vec![NodeSpec::element(1, "root")])
                .build()
                .unwrap();
            store.insert_resource(db, resource).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_restricted_session_hides_databases() {
        let session = SessionStore::new(
            backing(),
            Principal::new("alice", Some(vec!["books".to_string()])),
        );
        assert_eq!(session.list_databases().unwrap(), vec!["books"]);
        assert!(session.open_database("books").is_ok());
        assert!(matches!(
            session.open_database("payroll"),
            Err(StoreError::DatabaseNotFound(_))
        ));
    }

    #[test]
    fn test_anonymous_session_sees_everything() {
        let session = SessionStore::new(backing(), Principal::anonymous());
        assert_eq!(session.list_databases().unwrap().len(), 2);
    }
}

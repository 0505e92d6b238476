//! # Query Execution
//!
//! Runs a query on behalf of one session and captures the pretty-printed
//! result as a single payload.

use std::sync::Arc;

use tracing::debug;

use crate::query::{serialize_sequence, Item, NodeRef, Query, QueryContext};
use crate::store::{SessionStore, Store};

use super::errors::{RestError, RestResult};
use super::mode::QueryScope;

pub struct QueryExecutor {
    session: SessionStore,
}

impl QueryExecutor {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Compile and evaluate `text` within `scope`
    ///
    /// In resource scope the context item is the node named by `node_id`,
    /// or the first child of the document root when no node is named.
    pub fn execute(&self, text: &str, scope: &QueryScope) -> RestResult<String> {
        let query = Query::compile(text)?;

        match scope {
            QueryScope::Store => {
                let mut ctx = QueryContext::new(self.session.clone());
                let items = query.evaluate(&mut ctx)?;
                debug!(session = %self.session.id(), items = items.len(), "QUERY_EXECUTED");
                Ok(serialize_sequence(&items, true))
            }
            QueryScope::Resource {
                database,
                resource,
                selector,
                node_id,
            } => {
                let db = self.session.open_database(database)?;
                let manager = db.open_resource(resource)?;
                let revision = selector.resolve_single(&manager)?;
                let mut trx = manager.begin_read(revision)?;

                match node_id {
                    Some(key) => {
                        if !trx.move_to(*key) {
                            return Err(RestError::NotFound(format!(
                                "Node {} does not exist in revision {}",
                                key, revision
                            )));
                        }
                    }
                    None => {
                        // An empty document keeps the root as context.
                        trx.move_to_first_child();
                    }
                }

                debug!(
                    session = %self.session.id(),
                    database = %database,
                    resource = %resource,
                    revision,
                    node = trx.node_key(),
                    "QUERY_CONTEXT_OPENED"
                );

                let item = Item::Node(NodeRef::new(Arc::clone(trx.revision()), trx.node_key()));
                let mut ctx = QueryContext::new(self.session.clone()).with_context_item(item);
                let items = query.evaluate(&mut ctx)?;
                debug!(session = %self.session.id(), items = items.len(), "QUERY_EXECUTED");
                Ok(serialize_sequence(&items, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::rest_api::RevisionSelector;
    use crate::store::{MemoryStore, NodeSpec, Resource};
    use chrono::Utc;

    fn executor() -> (Arc<MemoryStore>, QueryExecutor) {
        let resource = Resource::builder("shelf")
            .commit(
                Utc::now(),
                vec![NodeSpec::element(1, "shelf")
                    .child(NodeSpec::element(2, "book").child(NodeSpec::text(3, "Dune")))],
            )
            .build()
            .unwrap();
        let empty = Resource::builder("empty")
            .commit(Utc::now(), vec![])
            .build()
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        store.insert_resource("library", resource).unwrap();
        store.insert_resource("library", empty).unwrap();
        let session = SessionStore::new(store.clone(), Principal::anonymous());
        (store, QueryExecutor::new(session))
    }

    fn scope(resource: &str, node_id: Option<u64>) -> QueryScope {
        QueryScope::Resource {
            database: "library".to_string(),
            resource: resource.to_string(),
            selector: RevisionSelector::MostRecent,
            node_id,
        }
    }

    #[test]
    fn test_default_context_is_first_child_of_root() {
        let (_, executor) = executor();
        let out = executor.execute("name(.)", &scope("shelf", None)).unwrap();
        assert!(out.contains("<rest:item>shelf</rest:item>"));
    }

    #[test]
    fn test_node_id_sets_context() {
        let (_, executor) = executor();
        let out = executor.execute("string(.)", &scope("shelf", Some(2))).unwrap();
        assert!(out.contains("<rest:item>Dune</rest:item>"));
    }

    #[test]
    fn test_missing_node_is_not_found() {
        let (store, executor) = executor();
        let result = executor.execute(".", &scope("shelf", Some(42)));
        assert!(matches!(result, Err(RestError::NotFound(_))));
        assert!(store.handles().snapshot().is_empty());
    }

    #[test]
    fn test_empty_document_keeps_root_context() {
        let (_, executor) = executor();
        let out = executor.execute("count(*)", &scope("empty", None)).unwrap();
        assert!(out.contains("<rest:item>0</rest:item>"));
    }

    #[test]
    fn test_store_scope_query() {
        let (store, executor) = executor();
        let out = executor
            .execute("doc('library', 'shelf')//book", &QueryScope::Store)
            .unwrap();
        assert!(out.contains("<book rest:id=\"2\">Dune</book>"));
        assert!(store.handles().snapshot().is_empty());
    }

    #[test]
    fn test_malformed_query() {
        let (_, executor) = executor();
        let result = executor.execute("//[", &QueryScope::Store);
        assert!(matches!(result, Err(RestError::InvalidQuery(_))));
    }
}

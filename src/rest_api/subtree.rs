//! # Subtree Serialization
//!
//! Serializes the requested revisions of a resource with node ids, REST
//! annotations, a `rest:sequence` envelope and pretty printing.

use crate::serialize::SerializerBuilder;
use crate::store::{NodeKey, Store};

use super::errors::RestResult;
use super::revisions::RevisionSelector;

pub struct SubtreeSerializer<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> SubtreeSerializer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Serialized bytes of `database/resource` over the selected revisions
    pub fn serialize(
        &self,
        database: &str,
        resource: &str,
        selector: &RevisionSelector,
        start_node: Option<NodeKey>,
    ) -> RestResult<Vec<u8>> {
        let db = self.store.open_database(database)?;
        let manager = db.open_resource(resource)?;
        let revisions = selector.resolve(&manager)?;

        let mut builder = SerializerBuilder::new(&manager)
            .revisions(&revisions)
            .emit_ids()
            .emit_rest()
            .emit_rest_sequence()
            .pretty_print();
        if let Some(key) = start_node {
            builder = builder.start_node_key(key);
        }

        let mut out = Vec::new();
        builder.build().serialize(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_api::RestError;
    use crate::store::{MemoryStore, NodeSpec, Resource};
    use chrono::{TimeZone, Utc};

    fn store() -> MemoryStore {
        let mut builder = Resource::builder("log");
        for n in 1..=3u64 {
            let mut root = NodeSpec::element(1, "log");
            for entry in 1..=n {
                root = root.child(NodeSpec::element(entry + 1, "entry"));
            }
            let at = Utc.with_ymd_and_hms(2024, 5, n as u32, 10, 0, 0).unwrap();
            builder = builder.commit(at, vec![root]);
        }
        let store = MemoryStore::new();
        store.insert_resource("db", builder.build().unwrap()).unwrap();
        store
    }

    fn render(store: &MemoryStore, selector: RevisionSelector, start: Option<NodeKey>) -> RestResult<String> {
        let bytes = SubtreeSerializer::new(store).serialize("db", "log", &selector, start)?;
        Ok(String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_one_item_per_revision() {
        let store = store();
        let out = render(&store, RevisionSelector::NumberRange { start: 1, end: 3 }, None).unwrap();
        assert_eq!(out.matches("<rest:item rest:revision=").count(), 3);
        assert!(out.starts_with("<rest:sequence xmlns:rest=\"https://sirix.io/rest\">\n"));
        assert!(out.contains("<log rest:id=\"1\">"));
    }

    #[test]
    fn test_start_node() {
        let store = store();
        let out = render(&store, RevisionSelector::Number(3), Some(4)).unwrap();
        assert!(out.contains("<entry rest:id=\"4\"/>"));
        assert!(!out.contains("<log"));
    }

    #[test]
    fn test_missing_start_node() {
        let store = store();
        let result = render(&store, RevisionSelector::Number(1), Some(4));
        assert!(matches!(result, Err(RestError::NotFound(_))));
        assert!(store.handles().snapshot().is_empty());
    }
}

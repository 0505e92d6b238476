//! # Resource Listing
//!
//! Lists the databases of a store or the resources of a database:
//!
//! ```text
//! <rest:sequence xmlns:rest="https://sirix.io/rest">
//!   <rest:item database-name="books"/>
//! </rest:sequence>
//! ```

use tracing::debug;

use crate::serialize::{MarkupWriter, REST_NAMESPACE};
use crate::store::Store;

use super::errors::RestResult;

pub const DATABASE_NAME_ATTRIBUTE: &str = "database-name";
pub const RESOURCE_NAME_ATTRIBUTE: &str = "resource-name";

/// Renders store listings
pub struct ResourceLister<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> ResourceLister<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every database visible to the store
    pub fn list_databases(&self) -> RestResult<String> {
        let names = self.store.list_databases()?;
        debug!(count = names.len(), "DATABASES_LISTED");
        Ok(render(DATABASE_NAME_ATTRIBUTE, names))
    }

    /// Every resource of `database`
    pub fn list_resources(&self, database: &str) -> RestResult<String> {
        let db = self.store.open_database(database)?;
        let names = db.list_resources()?;
        debug!(database = %database, count = names.len(), "RESOURCES_LISTED");
        Ok(render(RESOURCE_NAME_ATTRIBUTE, names))
    }
}

fn render(attribute: &str, mut names: Vec<String>) -> String {
    names.sort();

    let mut w = MarkupWriter::new(true);
    w.start_element("rest:sequence", &[("xmlns:rest", REST_NAMESPACE)]);
    for name in &names {
        w.empty_element("rest:item", &[(attribute, name.as_str())]);
    }
    w.end_element("rest:sequence");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_api::RestError;
    use crate::store::{MemoryStore, NodeSpec, Resource};
    use chrono::Utc;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        for (db, resource) in [("books", "b"), ("books", "a"), ("a&b", "x")] {
            let resource = Resource::builder(resource)
                .commit(Utc::now(), vec![NodeSpec::element(1, "root")])
                .build()
                .unwrap();
            store.insert_resource(db, resource).unwrap();
        }
        store
    }

    #[test]
    fn test_list_resources_sorted() {
        let store = store();
        let out = ResourceLister::new(&store).list_resources("books").unwrap();
        assert_eq!(
            out,
            "<rest:sequence xmlns:rest=\"https://sirix.io/rest\">\n  \
             <rest:item resource-name=\"a\"/>\n  \
             <rest:item resource-name=\"b\"/>\n\
             </rest:sequence>\n"
        );
    }

    #[test]
    fn test_list_databases_escapes_names() {
        let store = store();
        let out = ResourceLister::new(&store).list_databases().unwrap();
        assert!(out.contains("<rest:item database-name=\"a&amp;b\"/>"));
        assert!(out.find("a&amp;b").unwrap() < out.find("books").unwrap());
    }

    #[test]
    fn test_missing_database() {
        let store = store();
        let result = ResourceLister::new(&store).list_resources("nope");
        assert!(matches!(result, Err(RestError::NotFound(_))));
        assert!(store.handles().snapshot().is_empty());
    }
}

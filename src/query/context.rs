//! Query items and evaluation context

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::{
    Database, Node, NodeKey, NodeReadTrx, ResourceManager, Revision, SessionStore, Store,
    DOCUMENT_ROOT_KEY,
};

use super::errors::QueryResult;

/// A node of a specific revision
#[derive(Debug, Clone)]
pub struct NodeRef {
    revision: Arc<Revision>,
    key: NodeKey,
}

impl NodeRef {
    pub fn new(revision: Arc<Revision>, key: NodeKey) -> Self {
        Self { revision, key }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn revision(&self) -> &Arc<Revision> {
        &self.revision
    }

    pub fn node(&self) -> Option<&Node> {
        self.revision.node(self.key)
    }

    pub fn string_value(&self) -> String {
        self.revision.string_value(self.key)
    }

    /// Another node of the same revision
    pub(crate) fn with_key(&self, key: NodeKey) -> Self {
        Self {
            revision: Arc::clone(&self.revision),
            key,
        }
    }

    /// Sort key placing nodes of one revision in document order
    pub(crate) fn order(&self) -> (usize, usize) {
        (
            Arc::as_ptr(&self.revision) as usize,
            self.revision.position(self.key),
        )
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.revision, &other.revision) && self.key == other.key
    }
}

/// A value in a result sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(NodeRef),
    Attribute {
        owner: NodeRef,
        name: String,
        value: String,
    },
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl Item {
    pub fn string_value(&self) -> String {
        match self {
            Item::Node(node) => node.string_value(),
            Item::Attribute { value, .. } => value.clone(),
            Item::String(value) => value.clone(),
            Item::Integer(value) => value.to_string(),
            Item::Boolean(value) => value.to_string(),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_) | Item::Attribute { .. })
    }
}

/// Ordered query result
pub type Sequence = Vec<Item>;

struct OpenDocument {
    root: NodeRef,
    _trx: NodeReadTrx,
}

type ResourceKey = (String, String);

/// Evaluation context of one query
///
/// Databases, resource managers and read transactions opened by `doc()` or
/// `collection()` are opened once per context and stay open until the
/// context is dropped. Fields drop in declaration order, so transactions
/// close before their managers and managers before their databases.
pub struct QueryContext {
    session: SessionStore,
    context_item: Option<Item>,
    documents: HashMap<(String, String, u32), OpenDocument>,
    collections: HashMap<String, Vec<NodeRef>>,
    managers: HashMap<ResourceKey, ResourceManager>,
    databases: HashMap<String, Box<dyn Database>>,
}

impl QueryContext {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            context_item: None,
            documents: HashMap::new(),
            collections: HashMap::new(),
            managers: HashMap::new(),
            databases: HashMap::new(),
        }
    }

    /// Set the implicit context item
    pub fn with_context_item(mut self, item: Item) -> Self {
        self.context_item = Some(item);
        self
    }

    pub fn context_item(&self) -> Option<&Item> {
        self.context_item.as_ref()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Document root of `database/resource` at `revision` (most recent when absent)
    pub(crate) fn open_document(
        &mut self,
        database: &str,
        resource: &str,
        revision: Option<u32>,
    ) -> QueryResult<NodeRef> {
        let manager = open_manager(
            &self.session,
            &mut self.databases,
            &mut self.managers,
            database,
            resource,
        )?;
        let revision = revision.unwrap_or_else(|| manager.most_recent_revision_number());

        let key = (database.to_string(), resource.to_string(), revision);
        if let Some(document) = self.documents.get(&key) {
            return Ok(document.root.clone());
        }

        let trx = manager.begin_read(revision)?;
        let root = NodeRef::new(Arc::clone(trx.revision()), DOCUMENT_ROOT_KEY);
        self.documents.insert(
            key,
            OpenDocument {
                root: root.clone(),
                _trx: trx,
            },
        );
        Ok(root)
    }

    /// Document roots of the most recent revision of every resource in `database`
    pub(crate) fn open_collection(&mut self, database: &str) -> QueryResult<Vec<NodeRef>> {
        if let Some(roots) = self.collections.get(database) {
            return Ok(roots.clone());
        }

        let mut names = open_database(&self.session, &mut self.databases, database)?.list_resources()?;
        names.sort();

        let mut roots = Vec::with_capacity(names.len());
        for name in names {
            roots.push(self.open_document(database, &name, None)?);
        }
        self.collections.insert(database.to_string(), roots.clone());
        Ok(roots)
    }
}

fn open_database<'a>(
    session: &SessionStore,
    databases: &'a mut HashMap<String, Box<dyn Database>>,
    name: &str,
) -> QueryResult<&'a dyn Database> {
    let db = match databases.entry(name.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => entry.insert(session.open_database(name)?),
    };
    Ok(&**db)
}

fn open_manager<'a>(
    session: &SessionStore,
    databases: &mut HashMap<String, Box<dyn Database>>,
    managers: &'a mut HashMap<ResourceKey, ResourceManager>,
    database: &str,
    resource: &str,
) -> QueryResult<&'a ResourceManager> {
    match managers.entry((database.to_string(), resource.to_string())) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let manager = open_database(session, databases, database)?.open_resource(resource)?;
            Ok(entry.insert(manager))
        }
    }
}

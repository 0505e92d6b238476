//! # Document Model
//!
//! A revision is an immutable snapshot of a node tree. Node keys are stable
//! across revisions: the same logical node keeps its key for its whole
//! lifetime, so the same key in two revisions denotes the same node.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};

/// Node identifier, unique within a resource
pub type NodeKey = u64;

/// Key of the document root present in every revision
pub const DOCUMENT_ROOT_KEY: NodeKey = 0;

/// Kind-specific node content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        name: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

/// One node of a revision tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub key: NodeKey,
    pub parent: Option<NodeKey>,
    pub kind: NodeKind,
    pub children: Vec<NodeKey>,
}

impl Node {
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    /// Element name, if this is an element
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Element attributes; empty for other kinds
    pub fn attributes(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }
}

/// Declarative description of a node subtree, as stored in resource files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text {
        id: NodeKey,
        text: String,
    },
    Element {
        id: NodeKey,
        name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
}

impl NodeSpec {
    pub fn element(id: NodeKey, name: impl Into<String>) -> Self {
        NodeSpec::Element {
            id,
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(id: NodeKey, text: impl Into<String>) -> Self {
        NodeSpec::Text {
            id,
            text: text.into(),
        }
    }

    /// Add an attribute (no-op on text nodes)
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let NodeSpec::Element { attributes, .. } = &mut self {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Append a child (no-op on text nodes)
    pub fn child(mut self, node: NodeSpec) -> Self {
        if let NodeSpec::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    fn id(&self) -> NodeKey {
        match self {
            NodeSpec::Text { id, .. } | NodeSpec::Element { id, .. } => *id,
        }
    }
}

/// An immutable, numbered snapshot of a resource
#[derive(Debug)]
pub struct Revision {
    number: u32,
    timestamp: DateTime<Utc>,
    nodes: HashMap<NodeKey, Node>,
    /// Preorder position of every node, used for document ordering
    order: HashMap<NodeKey, usize>,
}

impl Revision {
    /// Build a revision from the top-level nodes under the document root
    pub fn build(number: u32, timestamp: DateTime<Utc>, roots: &[NodeSpec]) -> StoreResult<Self> {
        let mut nodes = HashMap::new();
        nodes.insert(
            DOCUMENT_ROOT_KEY,
            Node {
                key: DOCUMENT_ROOT_KEY,
                parent: None,
                kind: NodeKind::Document,
                children: Vec::new(),
            },
        );

        let mut top = Vec::with_capacity(roots.len());
        for spec in roots {
            top.push(insert_spec(&mut nodes, spec, DOCUMENT_ROOT_KEY)?);
        }
        if let Some(root) = nodes.get_mut(&DOCUMENT_ROOT_KEY) {
            root.children = top;
        }

        let mut order = HashMap::with_capacity(nodes.len());
        let mut stack = vec![DOCUMENT_ROOT_KEY];
        while let Some(key) = stack.pop() {
            order.insert(key, order.len());
            if let Some(node) = nodes.get(&key) {
                stack.extend(node.children.iter().rev().copied());
            }
        }

        Ok(Self {
            number,
            timestamp,
            nodes,
            order,
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Preorder position of a node, `usize::MAX` if absent
    pub fn position(&self, key: NodeKey) -> usize {
        self.order.get(&key).copied().unwrap_or(usize::MAX)
    }

    /// Concatenated text of all descendant text nodes
    pub fn string_value(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.collect_text(key, &mut out);
        out
    }

    fn collect_text(&self, key: NodeKey, out: &mut String) {
        if let Some(node) = self.nodes.get(&key) {
            match &node.kind {
                NodeKind::Text(value) => out.push_str(value),
                _ => {
                    for child in &node.children {
                        self.collect_text(*child, out);
                    }
                }
            }
        }
    }

    /// Keys of all descendants of `key` in document order, excluding `key`
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = match self.nodes.get(&key) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(node) = self.nodes.get(&next) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}

fn insert_spec(
    nodes: &mut HashMap<NodeKey, Node>,
    spec: &NodeSpec,
    parent: NodeKey,
) -> StoreResult<NodeKey> {
    let id = spec.id();
    if id == DOCUMENT_ROOT_KEY {
        return Err(StoreError::InvalidData(format!(
            "node id {} is reserved for the document root",
            DOCUMENT_ROOT_KEY
        )));
    }
    if nodes.contains_key(&id) {
        return Err(StoreError::InvalidData(format!("duplicate node id {}", id)));
    }

    match spec {
        NodeSpec::Text { text, .. } => {
            nodes.insert(
                id,
                Node {
                    key: id,
                    parent: Some(parent),
                    kind: NodeKind::Text(text.clone()),
                    children: Vec::new(),
                },
            );
        }
        NodeSpec::Element {
            name,
            attributes,
            children,
            ..
        } => {
            // Reserve the id before descending so children see it as taken.
            nodes.insert(
                id,
                Node {
                    key: id,
                    parent: Some(parent),
                    kind: NodeKind::Element {
                        name: name.clone(),
                        attributes: attributes.clone(),
                    },
                    children: Vec::new(),
                },
            );
            let mut keys = Vec::with_capacity(children.len());
            for child in children {
                keys.push(insert_spec(nodes, child, id)?);
            }
            if let Some(node) = nodes.get_mut(&id) {
                node.children = keys;
            }
        }
    }

    Ok(id)
}

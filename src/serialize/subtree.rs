//! Subtree serializer
//!
//! Serializes the subtree under a start node (the document root by default)
//! for every requested revision of a resource.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::store::{NodeKey, NodeKind, ResourceManager, Revision};

use super::errors::{SerializeError, SerializeResult};
use super::markup::{MarkupWriter, REST_NAMESPACE};

/// Format used for `rest:revisionTimestamp`
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Write the subtree rooted at `key`
///
/// Document nodes contribute only their children. `id_attribute` names the
/// attribute carrying node keys (`None` disables it); `namespace` is
/// declared on elements written at depth zero.
pub fn write_subtree(
    w: &mut MarkupWriter,
    revision: &Revision,
    key: NodeKey,
    id_attribute: Option<&str>,
    namespace: Option<&str>,
) {
    let node = match revision.node(key) {
        Some(node) => node,
        None => return,
    };

    match &node.kind {
        NodeKind::Document => {
            for child in &node.children {
                write_subtree(w, revision, *child, id_attribute, namespace);
            }
        }
        NodeKind::Text(value) => w.text(value),
        NodeKind::Element { name, attributes } => {
            let id = node.key.to_string();
            let mut attrs: Vec<(&str, &str)> = Vec::with_capacity(attributes.len() + 2);
            if w.depth() == 0 {
                if let Some(ns) = namespace {
                    attrs.push(("xmlns:rest", ns));
                }
            }
            if let Some(attr) = id_attribute {
                attrs.push((attr, &id));
            }
            attrs.extend(attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())));

            let only_text = match node.children.as_slice() {
                [single] => match revision.node(*single).map(|child| &child.kind) {
                    Some(NodeKind::Text(text)) => Some(text.as_str()),
                    _ => None,
                },
                _ => None,
            };

            if node.children.is_empty() {
                w.empty_element(name, &attrs);
            } else if let Some(text) = only_text {
                w.text_element(name, &attrs, text);
            } else {
                w.start_element(name, &attrs);
                for child in &node.children {
                    write_subtree(w, revision, *child, id_attribute, namespace);
                }
                w.end_element(name);
            }
        }
    }
}

/// Configures a [`Serializer`]
pub struct SerializerBuilder<'a> {
    manager: &'a ResourceManager,
    revisions: Vec<u32>,
    start_node: Option<NodeKey>,
    emit_ids: bool,
    emit_rest: bool,
    emit_rest_sequence: bool,
    pretty: bool,
}

impl<'a> SerializerBuilder<'a> {
    /// Serializer over the most recent revision with every option off
    pub fn new(manager: &'a ResourceManager) -> Self {
        Self {
            manager,
            revisions: vec![manager.most_recent_revision_number()],
            start_node: None,
            emit_ids: false,
            emit_rest: false,
            emit_rest_sequence: false,
            pretty: false,
        }
    }

    pub fn revisions(mut self, revisions: &[u32]) -> Self {
        self.revisions = revisions.to_vec();
        self
    }

    pub fn start_node_key(mut self, key: NodeKey) -> Self {
        self.start_node = Some(key);
        self
    }

    pub fn emit_ids(mut self) -> Self {
        self.emit_ids = true;
        self
    }

    pub fn emit_rest(mut self) -> Self {
        self.emit_rest = true;
        self
    }

    pub fn emit_rest_sequence(mut self) -> Self {
        self.emit_rest_sequence = true;
        self
    }

    pub fn pretty_print(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn build(self) -> Serializer<'a> {
        Serializer {
            manager: self.manager,
            revisions: self.revisions,
            start_node: self.start_node,
            emit_ids: self.emit_ids,
            emit_rest: self.emit_rest,
            emit_rest_sequence: self.emit_rest_sequence,
            pretty: self.pretty,
        }
    }
}

/// Configured subtree serializer
pub struct Serializer<'a> {
    manager: &'a ResourceManager,
    revisions: Vec<u32>,
    start_node: Option<NodeKey>,
    emit_ids: bool,
    emit_rest: bool,
    emit_rest_sequence: bool,
    pretty: bool,
}

impl Serializer<'_> {
    /// Serialize every configured revision into `out`
    ///
    /// Output is assembled in memory and written in one call, so a failure
    /// never leaves a partial document behind.
    pub fn serialize<W: Write>(&self, out: &mut W) -> SerializeResult<()> {
        let mut w = MarkupWriter::new(self.pretty);
        let id_attribute = match (self.emit_ids, self.emit_rest) {
            (false, _) => None,
            (true, true) => Some("rest:id"),
            (true, false) => Some("id"),
        };
        let namespace = if self.emit_rest && !self.emit_rest_sequence {
            Some(REST_NAMESPACE)
        } else {
            None
        };

        let mut emitted = 0usize;
        let mut bodies = Vec::with_capacity(self.revisions.len());
        for revision in &self.revisions {
            let mut trx = self.manager.begin_read(*revision)?;
            let present = match self.start_node {
                Some(key) => trx.move_to(key),
                None => true,
            };
            if present {
                emitted += 1;
            }
            bodies.push((trx, present));
        }

        if let Some(key) = self.start_node {
            if emitted == 0 {
                return Err(SerializeError::NodeNotFound(key));
            }
        }

        if self.emit_rest_sequence {
            w.start_element("rest:sequence", &[("xmlns:rest", REST_NAMESPACE)]);
        }

        for (trx, present) in &bodies {
            if self.emit_rest_sequence {
                let number = trx.revision_number().to_string();
                let timestamp = format_timestamp(trx.revision_timestamp());
                let attrs = [
                    ("rest:revision", number.as_str()),
                    ("rest:revisionTimestamp", timestamp.as_str()),
                ];
                if *present {
                    w.start_element("rest:item", &attrs);
                    write_subtree(&mut w, trx.revision(), trx.node_key(), id_attribute, namespace);
                    w.end_element("rest:item");
                } else {
                    w.empty_element("rest:item", &attrs);
                }
            } else if *present {
                write_subtree(&mut w, trx.revision(), trx.node_key(), id_attribute, namespace);
            }
        }

        if self.emit_rest_sequence {
            w.end_element("rest:sequence");
        }
        drop(bodies);

        out.write_all(w.finish().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NodeSpec, Resource, Store};
    use chrono::TimeZone;

    fn store() -> MemoryStore {
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();
        let resource = Resource::builder("shelf")
            .commit(t1, vec![NodeSpec::element(1, "shelf")])
            .commit(
                t2,
                vec![NodeSpec::element(1, "shelf")
                    .child(NodeSpec::element(2, "book").attr("isbn", "42").child(NodeSpec::text(3, "Dune")))],
            )
            .build()
            .unwrap();
        let store = MemoryStore::new();
        store.insert_resource("library", resource).unwrap();
        store
    }

    fn render(builder: SerializerBuilder<'_>) -> SerializeResult<String> {
        let mut out = Vec::new();
        builder.build().serialize(&mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_plain_serialization() {
        let store = store();
        let db = store.open_database("library").unwrap();
        let manager = db.open_resource("shelf").unwrap();
        let out = render(SerializerBuilder::new(&manager)).unwrap();
        assert_eq!(out, "<shelf><book isbn=\"42\">Dune</book></shelf>");
    }

    #[test]
    fn test_rest_sequence_over_revisions() {
        let store = store();
        let db = store.open_database("library").unwrap();
        let manager = db.open_resource("shelf").unwrap();
        let out = render(
            SerializerBuilder::new(&manager)
                .revisions(&[1, 2])
                .emit_ids()
                .emit_rest()
                .emit_rest_sequence()
                .pretty_print(),
        )
        .unwrap();

        let expected = "\
<rest:sequence xmlns:rest=\"https://sirix.io/rest\">
  <rest:item rest:revision=\"1\" rest:revisionTimestamp=\"2024-05-01T10:00:00.000Z\">
    <shelf rest:id=\"1\"/>
  </rest:item>
  <rest:item rest:revision=\"2\" rest:revisionTimestamp=\"2024-05-02T10:00:00.000Z\">
    <shelf rest:id=\"1\">
      <book rest:id=\"2\" isbn=\"42\">Dune</book>
    </shelf>
  </rest:item>
</rest:sequence>
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_start_node_missing_in_some_revisions() {
        let store = store();
        let db = store.open_database("library").unwrap();
        let manager = db.open_resource("shelf").unwrap();
        let out = render(
            SerializerBuilder::new(&manager)
                .revisions(&[1, 2])
                .start_node_key(2)
                .emit_rest_sequence(),
        )
        .unwrap();
        assert!(out.contains("<rest:item rest:revision=\"1\" rest:revisionTimestamp=\"2024-05-01T10:00:00.000Z\"/>"));
        assert!(out.contains("<book isbn=\"42\">Dune</book>"));
    }

    #[test]
    fn test_start_node_missing_everywhere() {
        let store = store();
        let db = store.open_database("library").unwrap();
        let manager = db.open_resource("shelf").unwrap();
        let result = render(SerializerBuilder::new(&manager).start_node_key(99));
        assert!(matches!(result, Err(SerializeError::NodeNotFound(99))));
        assert_eq!(store.handles().snapshot().read_transactions, 0);
    }

    #[test]
    fn test_rest_without_sequence_declares_namespace() {
        let store = store();
        let db = store.open_database("library").unwrap();
        let manager = db.open_resource("shelf").unwrap();
        let out = render(SerializerBuilder::new(&manager).revisions(&[1]).emit_ids().emit_rest()).unwrap();
        assert_eq!(out, "<shelf xmlns:rest=\"https://sirix.io/rest\" rest:id=\"1\"/>");
    }
}

//! Result sequence serialization

use crate::serialize::{write_subtree, MarkupWriter, REST_NAMESPACE};
use crate::store::NodeKind;

use super::context::Item;

/// Render a result sequence as a `rest:sequence` envelope
///
/// Each item becomes one `rest:item`. Elements carry `rest:id`, attributes
/// are reported by name and atomic values as text.
pub fn serialize_sequence(items: &[Item], pretty: bool) -> String {
    let mut w = MarkupWriter::new(pretty);
    w.start_element("rest:sequence", &[("xmlns:rest", REST_NAMESPACE)]);

    for item in items {
        match item {
            Item::Node(node) => match node.node().map(|n| &n.kind) {
                Some(NodeKind::Text(text)) => w.text_element("rest:item", &[], text),
                Some(_) => {
                    w.start_element("rest:item", &[]);
                    write_subtree(&mut w, node.revision(), node.key(), Some("rest:id"), None);
                    w.end_element("rest:item");
                }
                None => w.empty_element("rest:item", &[]),
            },
            Item::Attribute { name, value, .. } => {
                w.text_element("rest:item", &[("rest:attribute", name.as_str())], value)
            }
            atomic => w.text_element("rest:item", &[], &atomic.string_value()),
        }
    }

    w.end_element("rest:sequence");
    w.finish()
}

//! # Markup Serialization
//!
//! Renders node subtrees of one or more revisions as markup. The REST
//! annotations (`rest:id`, the `rest:sequence` envelope, per-revision
//! `rest:item`s) live in the namespace [`REST_NAMESPACE`].

pub mod errors;
pub mod markup;
pub mod subtree;

pub use errors::{SerializeError, SerializeResult};
pub use markup::{escape_attribute, escape_text, MarkupWriter, REST_NAMESPACE};
pub use subtree::{write_subtree, Serializer, SerializerBuilder};

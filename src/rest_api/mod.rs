//! # REST Read Gateway
//!
//! HTTP read access to a temporal document store. A request is
//! authenticated, classified into a [`ReadMode`] and served on the bounded
//! [`WorkerPool`] through a session-scoped view of the store.

pub mod errors;
pub mod handler;
pub mod listing;
pub mod mode;
pub mod parser;
pub mod query_executor;
pub mod response;
pub mod revisions;
pub mod server;
pub mod subtree;
pub mod worker;

pub use errors::{RestError, RestResult};
pub use handler::ModeDispatcher;
pub use listing::ResourceLister;
pub use mode::{classify, QueryScope, ReadMode, ReadTarget};
pub use parser::ReadParams;
pub use query_executor::QueryExecutor;
pub use response::{GatewayResponse, XML_CONTENT_TYPE};
pub use revisions::RevisionSelector;
pub use server::{GatewayState, RestServer};
pub use subtree::SubtreeSerializer;
pub use worker::WorkerPool;

//! revgate - a read gateway for temporal, multi-revision document stores
//!
//! Requests name a database, a resource and a set of revisions. The gateway
//! resolves the revisions, reads them through the store's read transactions
//! and answers with XML: serialized subtrees, query results or listings.

pub mod auth;
pub mod cli;
pub mod http_server;
pub mod observability;
pub mod query;
pub mod rest_api;
pub mod serialize;
pub mod store;

//! # Mode Dispatch
//!
//! Serves one classified request against a per-session store. Dispatch is
//! blocking and runs on the worker pool.

use tracing::debug;

use crate::store::SessionStore;

use super::errors::RestResult;
use super::listing::ResourceLister;
use super::mode::ReadMode;
use super::query_executor::QueryExecutor;
use super::response::GatewayResponse;
use super::subtree::SubtreeSerializer;

pub struct ModeDispatcher {
    session: SessionStore,
}

impl ModeDispatcher {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub fn dispatch(&self, mode: &ReadMode) -> RestResult<GatewayResponse> {
        debug!(
            session = %self.session.id(),
            principal = %self.session.principal().name(),
            mode = mode.name(),
            "READ_DISPATCHED"
        );

        let body = match mode {
            ReadMode::ListDatabases => ResourceLister::new(&self.session)
                .list_databases()?
                .into_bytes(),
            ReadMode::ListResources { database } => ResourceLister::new(&self.session)
                .list_resources(database)?
                .into_bytes(),
            ReadMode::Query { query, scope } => QueryExecutor::new(self.session.clone())
                .execute(query, scope)?
                .into_bytes(),
            ReadMode::SerializeSubtree {
                database,
                resource,
                selector,
                node_id,
            } => SubtreeSerializer::new(&self.session).serialize(
                database,
                resource,
                selector,
                *node_id,
            )?,
        };

        Ok(GatewayResponse::xml(body))
    }
}

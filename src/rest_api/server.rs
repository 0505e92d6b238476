//! # REST API HTTP Server
//!
//! Axum routes of the read gateway:
//!
//! - `GET /` - list databases, or run a store-wide query
//! - `GET /:database` - list resources
//! - `GET /:database/:resource` - serialize revisions, or run a query

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Router,
};
use tracing::info;

use crate::auth::Authenticator;
use crate::store::{SessionStore, Store};

use super::errors::RestResult;
use super::handler::ModeDispatcher;
use super::mode::{classify, ReadTarget};
use super::parser::ReadParams;
use super::response::GatewayResponse;
use super::worker::WorkerPool;

/// Immutable state shared by every request
pub struct GatewayState {
    store: Arc<dyn Store>,
    authenticator: Authenticator,
    pool: WorkerPool,
}

impl GatewayState {
    pub fn new(store: Arc<dyn Store>, authenticator: Authenticator, pool: WorkerPool) -> Self {
        Self {
            store,
            authenticator,
            pool,
        }
    }
}

/// Shared state type
type ServerState = Arc<GatewayState>;

/// REST API server
pub struct RestServer {
    state: ServerState,
}

impl RestServer {
    pub fn new(state: GatewayState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Build the Axum router
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(store_handler))
            .route("/:database", get(database_handler))
            .route("/:database/:resource", get(resource_handler))
            .with_state(self.state)
    }
}

/// Authenticate, classify and serve one read on the worker pool
async fn serve(state: ServerState, target: ReadTarget, headers: &HeaderMap) -> RestResult<GatewayResponse> {
    let principal = state.authenticator.authenticate(headers)?;
    let mode = classify(&target)?;
    let session = SessionStore::new(Arc::clone(&state.store), principal);
    let session_id = session.id();
    let dispatcher = ModeDispatcher::new(session);

    let response = state.pool.run(move || dispatcher.dispatch(&mode)).await?;
    info!(
        session = %session_id,
        bytes = response.content_length(),
        "READ_COMPLETED"
    );
    Ok(response)
}

/// `GET /`
async fn store_handler(
    State(state): State<ServerState>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: String,
) -> RestResult<GatewayResponse> {
    let params = ReadParams::parse(&query, &body)?;
    serve(state, ReadTarget::store(params), &headers).await
}

/// `GET /:database`
async fn database_handler(
    State(state): State<ServerState>,
    Path(database): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: String,
) -> RestResult<GatewayResponse> {
    let params = ReadParams::parse(&query, &body)?;
    serve(state, ReadTarget::database(database, params), &headers).await
}

/// `GET /:database/:resource`
async fn resource_handler(
    State(state): State<ServerState>,
    Path((database, resource)): Path<(String, String)>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: String,
) -> RestResult<GatewayResponse> {
    let params = ReadParams::parse(&query, &body)?;
    serve(state, ReadTarget::resource(database, resource, params), &headers).await
}

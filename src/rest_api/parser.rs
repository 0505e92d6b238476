//! # Request Parameter Parser
//!
//! Extracts the read parameters of a request from its query string, with the
//! request body as fallback for the query text.

use std::collections::HashSet;

use crate::store::NodeKey;

use super::errors::{RestError, RestResult};

pub const PARAM_QUERY: &str = "query";
pub const PARAM_NODE_ID: &str = "nodeId";
pub const PARAM_REVISION: &str = "revision";
pub const PARAM_REVISION_TIMESTAMP: &str = "revision-timestamp";
pub const PARAM_START_REVISION: &str = "start-revision";
pub const PARAM_END_REVISION: &str = "end-revision";
pub const PARAM_START_REVISION_TIMESTAMP: &str = "start-revision-timestamp";
pub const PARAM_END_REVISION_TIMESTAMP: &str = "end-revision-timestamp";

/// Parsed read parameters
///
/// Revision parameters stay textual here; they are interpreted by
/// [`RevisionSelector`](super::revisions::RevisionSelector).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadParams {
    pub revision: Option<String>,
    pub revision_timestamp: Option<String>,
    pub start_revision: Option<String>,
    pub end_revision: Option<String>,
    pub start_revision_timestamp: Option<String>,
    pub end_revision_timestamp: Option<String>,

    /// Start node for serialization, context node for queries
    pub node_id: Option<NodeKey>,

    /// Query text
    pub query: Option<String>,
}

impl ReadParams {
    /// Parse query-string parameters in request order; `body` supplies the
    /// query text when the `query` parameter is absent
    ///
    /// A repeated parameter keeps its first value.
    pub fn parse(params: &[(String, String)], body: &str) -> RestResult<Self> {
        let mut result = ReadParams::default();
        let mut seen = HashSet::new();

        for (key, value) in params {
            if !seen.insert(key.as_str()) {
                continue;
            }
            match key.as_str() {
                PARAM_REVISION => result.revision = non_empty(value),
                PARAM_REVISION_TIMESTAMP => result.revision_timestamp = non_empty(value),
                PARAM_START_REVISION => result.start_revision = non_empty(value),
                PARAM_END_REVISION => result.end_revision = non_empty(value),
                PARAM_START_REVISION_TIMESTAMP => {
                    result.start_revision_timestamp = non_empty(value)
                }
                PARAM_END_REVISION_TIMESTAMP => result.end_revision_timestamp = non_empty(value),
                PARAM_NODE_ID => result.node_id = Some(parse_node_id(value)?),
                PARAM_QUERY => result.query = non_empty(value),
                // Unknown parameters are ignored
                _ => {}
            }
        }

        if result.query.is_none() && !seen.contains(PARAM_QUERY) {
            result.query = non_empty(body);
        }

        Ok(result)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_node_id(value: &str) -> RestResult<NodeKey> {
    value.trim().parse::<NodeKey>().map_err(|_| {
        RestError::InvalidQueryParam(format!("{} must be a node key, got '{}'", PARAM_NODE_ID, value))
    })
}

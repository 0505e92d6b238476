//! # Read Mode Classification
//!
//! Every request is classified once, before any store access, into the
//! [`ReadMode`] that serves it.

use crate::store::NodeKey;

use super::errors::RestResult;
use super::parser::ReadParams;
use super::revisions::RevisionSelector;

/// Path segments and parameters of a read request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadTarget {
    pub database: Option<String>,
    pub resource: Option<String>,
    pub params: ReadParams,
}

impl ReadTarget {
    pub fn store(params: ReadParams) -> Self {
        Self {
            database: None,
            resource: None,
            params,
        }
    }

    pub fn database(database: impl Into<String>, params: ReadParams) -> Self {
        Self {
            database: Some(database.into()),
            resource: None,
            params,
        }
    }

    pub fn resource(
        database: impl Into<String>,
        resource: impl Into<String>,
        params: ReadParams,
    ) -> Self {
        Self {
            database: Some(database.into()),
            resource: Some(resource.into()),
            params,
        }
    }
}

/// What a query runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    /// No context item; documents are reached through `doc()`
    Store,
    /// Context item taken from one revision of a resource
    Resource {
        database: String,
        resource: String,
        selector: RevisionSelector,
        node_id: Option<NodeKey>,
    },
}

/// How a request is served
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadMode {
    ListDatabases,
    ListResources {
        database: String,
    },
    Query {
        query: String,
        scope: QueryScope,
    },
    SerializeSubtree {
        database: String,
        resource: String,
        selector: RevisionSelector,
        node_id: Option<NodeKey>,
    },
}

impl ReadMode {
    /// Short name used in log events
    pub fn name(&self) -> &'static str {
        match self {
            ReadMode::ListDatabases => "list_databases",
            ReadMode::ListResources { .. } => "list_resources",
            ReadMode::Query { .. } => "query",
            ReadMode::SerializeSubtree { .. } => "serialize",
        }
    }
}

/// Classify a request
///
/// Fails only when revision parameters are malformed. A database without
/// a resource always lists resources, even when a query is present.
pub fn classify(target: &ReadTarget) -> RestResult<ReadMode> {
    let params = &target.params;

    match (&target.database, &target.resource) {
        (None, _) => Ok(match &params.query {
            Some(query) => ReadMode::Query {
                query: query.clone(),
                scope: QueryScope::Store,
            },
            None => ReadMode::ListDatabases,
        }),
        (Some(database), None) => Ok(ReadMode::ListResources {
            database: database.clone(),
        }),
        (Some(database), Some(resource)) => match &params.query {
            Some(query) => Ok(ReadMode::Query {
                query: query.clone(),
                scope: QueryScope::Resource {
                    database: database.clone(),
                    resource: resource.clone(),
                    selector: RevisionSelector::single_from_params(params)?,
                    node_id: params.node_id,
                },
            }),
            None => Ok(ReadMode::SerializeSubtree {
                database: database.clone(),
                resource: resource.clone(),
                selector: RevisionSelector::from_params(params)?,
                node_id: params.node_id,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_api::RestError;

    fn with_query(query: &str) -> ReadParams {
        ReadParams {
            query: Some(query.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_store_level() {
        assert_eq!(
            classify(&ReadTarget::store(ReadParams::default())).unwrap(),
            ReadMode::ListDatabases
        );
        assert_eq!(
            classify(&ReadTarget::store(with_query("doc('a', 'b')"))).unwrap(),
            ReadMode::Query {
                query: "doc('a', 'b')".to_string(),
                scope: QueryScope::Store,
            }
        );
    }

    #[test]
    fn test_database_level_always_lists() {
        let mode = classify(&ReadTarget::database("books", with_query("//x"))).unwrap();
        assert_eq!(
            mode,
            ReadMode::ListResources {
                database: "books".to_string()
            }
        );
    }

    #[test]
    fn test_resource_level() {
        let params = ReadParams {
            start_revision: Some("1".to_string()),
            end_revision: Some("2".to_string()),
            node_id: Some(4),
            ..Default::default()
        };
        assert_eq!(
            classify(&ReadTarget::resource("books", "shelf", params)).unwrap(),
            ReadMode::SerializeSubtree {
                database: "books".to_string(),
                resource: "shelf".to_string(),
                selector: RevisionSelector::NumberRange { start: 1, end: 2 },
                node_id: Some(4),
            }
        );
    }

    #[test]
    fn test_query_ignores_ranges() {
        let params = ReadParams {
            start_revision: Some("1".to_string()),
            query: Some("count(.)".to_string()),
            ..Default::default()
        };
        let mode = classify(&ReadTarget::resource("books", "shelf", params)).unwrap();
        assert!(matches!(
            mode,
            ReadMode::Query {
                scope: QueryScope::Resource {
                    selector: RevisionSelector::MostRecent,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_revision() {
        let params = ReadParams {
            revision: Some("latest".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            classify(&ReadTarget::resource("books", "shelf", params)),
            Err(RestError::InvalidRevisionSpec(_))
        ));
    }
}

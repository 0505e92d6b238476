//! Gateway Authentication Tests
//!
//! With a JWT secret configured every read needs a bearer token, and the
//! token's `databases` claim limits what the principal can see.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use tower::ServiceExt;

use revgate::auth::{JwtConfig, JwtManager};
use revgate::http_server::{AuthConfig, GatewayConfig, HttpServer};
use revgate::store::{MemoryStore, NodeSpec, Resource, Store};

const SECRET: &str = "integration-test-secret";

fn create_router() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    for db in ["books", "payroll"] {
        let resource = Resource::builder("doc")
            .commit(Utc::now(), vec![NodeSpec::element(1, "root")])
            .build()
            .unwrap();
        store.insert_resource(db, resource).unwrap();
    }

    let config = GatewayConfig {
        auth: AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let router = HttpServer::with_store(config, store.clone()).router();
    (store, router)
}

fn token(databases: Option<Vec<String>>) -> String {
    JwtManager::new(JwtConfig::new(SECRET))
        .issue_token("alice", databases)
        .unwrap()
}

async fn get(router: Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let response = router
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (store, router) = create_router();
    let (status, _) = get(router, "/books/doc", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(store.handles().snapshot().is_empty());
}

#[tokio::test]
async fn test_bad_signature_is_unauthorized() {
    let (_, router) = create_router();
    let forged = JwtManager::new(JwtConfig::new("some-other-secret"))
        .issue_token("mallory", None)
        .unwrap();
    let (status, _) = get(router, "/", Some(&forged)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unrestricted_token_reads_everything() {
    let (_, router) = create_router();
    let (status, body) = get(router, "/", Some(&token(None))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("database-name=\"books\""));
    assert!(body.contains("database-name=\"payroll\""));
}

#[tokio::test]
async fn test_databases_claim_restricts_reads() {
    let (store, router) = create_router();
    let restricted = token(Some(vec!["books".to_string()]));

    let (status, body) = get(router.clone(), "/", Some(&restricted)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("database-name=\"books\""));
    assert!(!body.contains("payroll"));

    let (status, body) = get(router.clone(), "/books/doc", Some(&restricted)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<root rest:id=\"1\"/>"));

    let (status, _) = get(router.clone(), "/payroll/doc", Some(&restricted)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(router, "/?query=doc('payroll','doc')", Some(&restricted)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(store.handles().snapshot().is_empty());
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (_, router) = create_router();
    let (status, _) = get(router, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

//! Observability HTTP Routes
//!
//! `/health` reports liveness together with the load on the read worker
//! pool. It is answered without authentication and without touching the
//! store.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::rest_api::WorkerPool;

/// Worker pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub size: usize,
    pub busy: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub auth_enabled: bool,
    pub workers: WorkerStatus,
}

#[derive(Clone)]
struct HealthState {
    pool: WorkerPool,
    auth_enabled: bool,
}

/// `/health` over the gateway's worker pool
pub fn health_routes(pool: WorkerPool, auth_enabled: bool) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(HealthState { pool, auth_enabled })
}

async fn health_handler(State(state): State<HealthState>) -> Json<HealthResponse> {
    let size = state.pool.size();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        auth_enabled: state.auth_enabled,
        workers: WorkerStatus {
            size,
            busy: size.saturating_sub(state.pool.available()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn health(router: Router) -> serde_json::Value {
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_idle_pool() {
        let json = health(health_routes(WorkerPool::new(3), false)).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["auth_enabled"], false);
        assert_eq!(json["workers"]["size"], 3);
        assert_eq!(json["workers"]["busy"], 0);
    }

    #[tokio::test]
    async fn test_busy_workers_are_reported() {
        let pool = WorkerPool::new(2);
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let job_pool = pool.clone();
        let job = tokio::spawn(async move {
            job_pool
                .run(move || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(())
                })
                .await
        });
        tokio::task::spawn_blocking(move || started_rx.recv().unwrap())
            .await
            .unwrap();

        let json = health(health_routes(pool, true)).await;
        assert_eq!(json["auth_enabled"], true);
        assert_eq!(json["workers"]["busy"], 1);

        release_tx.send(()).unwrap();
        job.await.unwrap().unwrap();
    }
}

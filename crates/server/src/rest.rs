//! REST facade over the search pipeline.
//!
//! - `GET /search?q=..&count=..&force=..` runs the pipeline
//! - `DELETE /cache?q=..` evicts one query, or everything when `q` is absent
//! - `GET /health` reports liveness

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use gleaner_client::{Orchestrator, SearchOutcome};
use gleaner_core::{AppConfig, Error};
use serde::{Deserialize, Serialize};

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct ApiState {
    orchestrator: Orchestrator,
    config: Arc<AppConfig>,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator, config: AppConfig) -> Self {
        Self { orchestrator, config: Arc::new(config) }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    count: Option<String>,
    force: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheQuery {
    q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Pipeline error rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody { error: self.0.to_string(), code: self.0.code().to_string() };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/cache", delete(clear_cache))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve the REST API until Ctrl-C.
pub async fn serve(addr: &str, state: ApiState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::warn!("failed to listen for Ctrl-C, shutting down: {}", e),
    }
}

async fn search(State(state): State<ApiState>, Query(params): Query<SearchQuery>) -> Result<Json<SearchOutcome>, ApiError> {
    let query = params.q.unwrap_or_default();
    if query.is_empty() {
        return Err(Error::InvalidInput("missing required query parameter 'q'".into()).into());
    }

    let requested = params.count.and_then(|c| c.parse::<usize>().ok()).filter(|c| *c > 0);
    let count = state.config.effective_count(requested);
    let force = matches!(params.force.as_deref(), Some("true" | "1"));

    let outcome = state.orchestrator.run(&query, count, force).await?;

    tracing::debug!(result_count = outcome.result_count, from_cache = outcome.from_cache, "search served");

    Ok(Json(outcome))
}

async fn clear_cache(
    State(state): State<ApiState>, Query(params): Query<CacheQuery>,
) -> Result<Json<StatusBody>, ApiError> {
    state.orchestrator.evict(&params.q.unwrap_or_default()).await?;
    Ok(Json(StatusBody { status: "ok".into() }))
}

async fn health() -> Json<StatusBody> {
    Json(StatusBody { status: "ok".into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{orchestrator, page};
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use gleaner_core::canonicalize_query;
    use tower::ServiceExt;
    use wiremock::MockServer;

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(ApiState::new(orchestrator(vec![]).await, AppConfig::default()));
        let (status, body) = call(app, Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_search_success_then_cached() {
        let server = MockServer::start().await;
        let u1 = page(&server, "/u1", "Goroutines...").await;
        let app = router(ApiState::new(orchestrator(vec![u1.clone()]).await, AppConfig::default()));

        let (status, body) = call(app.clone(), Method::GET, "/search?q=golang%20concurrency&count=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], format!("## {u1}\n\nGoroutines..."));
        assert_eq!(body["result_count"], 1);
        assert_eq!(body["from_cache"], false);

        let (_, body) = call(app, Method::GET, "/search?q=golang%20concurrency").await;
        assert_eq!(body["from_cache"], true);
    }

    #[tokio::test]
    async fn test_search_force_param() {
        let server = MockServer::start().await;
        let u1 = page(&server, "/u1", "text").await;
        let orch = orchestrator(vec![u1]).await;
        orch.cache().set(&canonicalize_query("q"), "## cached\n\nold").await.unwrap();
        let app = router(ApiState::new(orch, AppConfig::default()));

        let (_, body) = call(app.clone(), Method::GET, "/search?q=q").await;
        assert_eq!(body["from_cache"], true);

        let (_, body) = call(app, Method::GET, "/search?q=q&force=1").await;
        assert_eq!(body["from_cache"], false);
    }

    #[tokio::test]
    async fn test_search_missing_query() {
        let app = router(ApiState::new(orchestrator(vec![]).await, AppConfig::default()));
        let (status, body) = call(app, Method::GET, "/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_search_pipeline_failure() {
        let app = router(ApiState::new(orchestrator(vec![]).await, AppConfig::default()));
        let (status, body) = call(app, Method::GET, "/search?q=nothing&count=abc").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "NO_RESULTS");
        assert!(body["error"].as_str().unwrap().starts_with("NO_RESULTS"));
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let orch = orchestrator(vec![]).await;
        orch.cache().set(&canonicalize_query("q1"), "## a\n\none").await.unwrap();
        orch.cache().set(&canonicalize_query("q2"), "## b\n\ntwo").await.unwrap();
        let app = router(ApiState::new(orch.clone(), AppConfig::default()));

        let (status, body) = call(app.clone(), Method::DELETE, "/cache?q=q1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(orch.cache().len().await.unwrap(), 1);

        let (status, _) = call(app, Method::DELETE, "/cache").await;
        assert_eq!(status, StatusCode::OK);
        assert!(orch.cache().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let app = router(ApiState::new(orchestrator(vec![]).await, AppConfig::default()));
        let (status, _) = call(app, Method::POST, "/search?q=x").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}

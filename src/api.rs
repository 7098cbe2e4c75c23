//! Unified API router for Learnlog
//!
//! ## Endpoint Map
//!
//! | Prefix               | Module | Description              |
//! |----------------------|--------|--------------------------|
//! | `/health`            | api    | Health probe             |
//! | `/api/v1/tools`      | tools  | Tool definitions         |
//! | `/api/v1/tools/:name`| tools  | Tool invocation          |

use crate::tools::{tools_router, ToolsState};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Learnlog HTTP application
pub fn build_app(tools_state: ToolsState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(tools_router(tools_state))
        .layer(build_cors(cors_origins))
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary::DiaryStore;
    use crate::knowledge::{KnowledgeSystem, MemoryBackend};
    use crate::tools::KnowledgeTools;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn make_app(dir: &TempDir, origins: &[String]) -> Router {
        let tools = KnowledgeTools::new(
            Arc::new(KnowledgeSystem::new(Arc::new(MemoryBackend::new()))),
            Arc::new(DiaryStore::new(dir.path()).unwrap()),
        );
        build_app(
            ToolsState {
                tools: Arc::new(tools),
            },
            origins,
        )
    }

    #[tokio::test]
    async fn test_health_check() {
        let resp = health_check().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_app_serves_health_and_tools() {
        let dir = TempDir::new().unwrap();
        let app = make_app(&dir, &[]);

        let health = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let tools = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/tools")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(tools.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_restricted_origin() {
        let dir = TempDir::new().unwrap();
        let app = make_app(&dir, &["http://localhost:1420".to_string()]);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://localhost:1420")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:1420")
        );
    }

    #[test]
    fn test_build_cors_empty_origins() {
        let _cors = build_cors(&[]);
    }
}

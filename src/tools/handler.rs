//! HTTP handlers for the Tools API
//!
//! Provides 2 REST endpoints:
//! - GET  /api/v1/tools       list tool definitions
//! - POST /api/v1/tools/:name call a tool with a JSON argument body

use super::registry::KnowledgeTools;
use super::types::{ErrorKind, ToolResponse};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

/// Shared state for tool handlers
#[derive(Clone)]
pub struct ToolsState {
    pub tools: Arc<KnowledgeTools>,
}

/// Create the tools router
pub fn tools_router(state: ToolsState) -> Router {
    Router::new()
        .route("/api/v1/tools", get(list_tools))
        .route("/api/v1/tools/:name", post(call_tool))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/v1/tools
async fn list_tools(State(state): State<ToolsState>) -> impl IntoResponse {
    Json(state.tools.definitions())
}

/// POST /api/v1/tools/:name
///
/// An empty body is the same as `null` arguments.
async fn call_tool(
    State(state): State<ToolsState>,
    Path(name): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(args) => args,
            Err(e) => {
                let response = ToolResponse::error(
                    ErrorKind::InvalidArguments,
                    "Request body is not valid JSON",
                    e.to_string(),
                );
                return (StatusCode::BAD_REQUEST, Json(response));
            }
        }
    };

    let response = state.tools.call(&name, args).await;
    (status_for(&response), Json(response))
}

fn status_for(response: &ToolResponse) -> StatusCode {
    match response.error_kind() {
        None => StatusCode::OK,
        Some(ErrorKind::Validation | ErrorKind::InvalidArguments) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::UnknownTool) => StatusCode::NOT_FOUND,
        Some(ErrorKind::Persistence) => StatusCode::BAD_GATEWAY,
        Some(ErrorKind::Diary | ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary::DiaryStore;
    use crate::knowledge::{KnowledgeSystem, MemoryBackend, PersistenceBackend, RestBackend};
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn make_app(backend: Arc<dyn PersistenceBackend>, dir: &TempDir) -> Router {
        let tools = KnowledgeTools::new(
            Arc::new(KnowledgeSystem::new(backend)),
            Arc::new(DiaryStore::new(dir.path()).unwrap()),
        );
        tools_router(ToolsState {
            tools: Arc::new(tools),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_list_tools() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(Arc::new(MemoryBackend::new()), &dir)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/tools")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let names: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"get_takeaway_with_relations"));
        assert!(names.contains(&"update_note"));
    }

    #[tokio::test]
    async fn test_call_create_observation() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(Arc::new(MemoryBackend::new()), &dir)
            .oneshot(post_json(
                "/api/v1/tools/create_observation",
                r#"{"content": "loss plateaued at step 4k", "experiment_id": "lr-sweep"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["observation"]["experiment_id"], "lr-sweep");
        assert!(!json["observation"]["id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_call_empty_body() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(Arc::new(MemoryBackend::new()), &dir)
            .oneshot(post_json("/api/v1/tools/list_resources", ""))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_call_validation_error() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(Arc::new(MemoryBackend::new()), &dir)
            .oneshot(post_json("/api/v1/tools/create_takeaway", r#"{"insight": ""}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "validation");
    }

    #[tokio::test]
    async fn test_call_malformed_body() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(Arc::new(MemoryBackend::new()), &dir)
            .oneshot(post_json("/api/v1/tools/get_resource", "{not json"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["kind"], "invalid_arguments");
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(Arc::new(MemoryBackend::new()), &dir)
            .oneshot(post_json("/api/v1/tools/nope", "{}"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["kind"], "unknown_tool");
    }

    #[tokio::test]
    async fn test_call_backend_unreachable() {
        let dir = TempDir::new().unwrap();
        let backend =
            RestBackend::new("http://127.0.0.1:9", "anon", Duration::from_millis(500)).unwrap();
        let resp = make_app(Arc::new(backend), &dir)
            .oneshot(post_json("/api/v1/tools/list_observations", "{}"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert_eq!(json["kind"], "persistence");
        assert_eq!(json["retryable"], true);
    }
}

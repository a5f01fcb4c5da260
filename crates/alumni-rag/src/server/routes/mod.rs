//! API routes for the alumni RAG server

pub mod alumni;
pub mod conversation;
pub mod embeddings;
pub mod health;
pub mod query;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(info))
        .route("/query", post(query::query_alumni))
        .route("/alumni", post(alumni::add_alumni))
        .route(
            "/conversation/:session_id",
            get(conversation::get_history).delete(conversation::clear_history),
        )
        .route("/update-embeddings", post(embeddings::update_embeddings))
        .route("/health", get(health::health_check))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Alumni RAG API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AI-powered question answering for Alumni Management System",
        "uptime_secs": state.uptime_secs(),
        "endpoints": {
            "query": "POST /query - Ask questions about alumni",
            "add_alumni": "POST /alumni - Add new alumni",
            "conversation_history": "GET /conversation/{session_id} - Get chat history",
            "clear_conversation": "DELETE /conversation/{session_id} - Clear chat history",
            "update_embeddings": "POST /update-embeddings - Force update search index",
            "health": "GET /health - Check service health"
        }
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::RefreshMode;
    use crate::server::RagServer;
    use crate::service::tests::{seeded_service, RecordingLlm};

    async fn app() -> Router {
        let (_, service) =
            seeded_service(Arc::new(RecordingLlm::default()), RefreshMode::Inline).await;
        RagServer::new(Arc::new(service)).router()
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_query_and_history() {
        let app = app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/query",
            Some(json!({"question": "Who works at Google?", "session_id": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["session_id"], "abc");
        assert!(body.get("error").is_none());

        let (status, body) = send(&app, Method::GET, "/conversation/abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["type"], "human");
        assert_eq!(body["messages"][1]["type"], "ai");

        let (_, body) = send(&app, Method::DELETE, "/conversation/abc", None).await;
        assert_eq!(body["message"], "Conversation history cleared for session: abc");
        let (_, body) = send(&app, Method::DELETE, "/conversation/abc", None).await;
        assert_eq!(body["message"], "No conversation found for session: abc");
    }

    #[tokio::test]
    async fn test_query_defaults_session() {
        let app = app().await;
        let (_, body) = send(
            &app,
            Method::POST,
            "/query",
            Some(json!({"question": "Who studied physics?"})),
        )
        .await;
        assert_eq!(body["session_id"], "default");
    }

    #[tokio::test]
    async fn test_query_validation() {
        let app = app().await;

        let (status, body) = send(&app, Method::POST, "/query", Some(json!({"question": ""}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["type"], "validation_error");

        let long = "x".repeat(501);
        let (status, _) = send(&app, Method::POST, "/query", Some(json!({"question": long}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(&app, Method::POST, "/query", Some(json!({"session_id": "x"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["type"], "validation_error");
    }

    #[tokio::test]
    async fn test_add_alumni() {
        let app = app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/alumni",
            Some(json!({
                "name": "Meera Iyer",
                "company": "Quantumleap",
                "graduation_year": 2022,
                "additional_info": {"linkedin": "https://linkedin.com/in/meera"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["alumni_id"].is_string());
        assert_eq!(
            body["message"],
            "Alumni Meera Iyer added successfully and embedded for search"
        );

        let (status, body) = send(
            &app,
            Method::POST,
            "/alumni",
            Some(json!({"name": "Old Timer", "graduation_year": 1949})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["type"], "validation_error");
    }

    #[tokio::test]
    async fn test_health_and_rebuild() {
        let app = app().await;

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "healthy");
        assert_eq!(body["index"], "healthy");
        assert_eq!(body["record_count"], 5);

        let (status, body) = send(&app, Method::POST, "/update-embeddings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Embeddings updated successfully");
    }

    #[tokio::test]
    async fn test_info() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Alumni RAG API");
        assert!(body["endpoints"]["query"].is_string());
    }
}

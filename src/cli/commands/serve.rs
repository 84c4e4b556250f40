//! HTTP API server for frontend integration.
//!
//! Provides REST endpoints for querying courses and corpus statistics.

use crate::agent::Source;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let rag = Arc::new(RagSystem::new(&settings)?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(rag);
    let app = app.layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Corso API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /api/query");
    Output::kv("Courses", "GET  /api/courses");
    Output::kv("Clear Session", "POST /api/session/clear");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(rag: Arc<RagSystem>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .route("/api/session/clear", post(clear_session))
        .with_state(rag)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<Source>,
    session_id: String,
}

#[derive(Serialize)]
struct CoursesResponse {
    total_courses: usize,
    course_titles: Vec<String>,
}

#[derive(Deserialize)]
struct ClearSessionRequest {
    session_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(rag): State<Arc<RagSystem>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    match rag.query(&req.query, req.session_id).await {
        Ok(response) => Json(QueryResponse {
            answer: response.answer.text,
            sources: response.answer.sources,
            session_id: response.session_id,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn courses(State(rag): State<Arc<RagSystem>>) -> impl IntoResponse {
    match rag.analytics() {
        Ok(analytics) => Json(CoursesResponse {
            total_courses: analytics.total_courses,
            course_titles: analytics.course_titles,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn clear_session(
    State(rag): State<Arc<RagSystem>>,
    Json(req): Json<ClearSessionRequest>,
) -> impl IntoResponse {
    rag.clear_session(&req.session_id);
    Json(serde_json::json!({ "success": true }))
}

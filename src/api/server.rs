//! Axum server and handlers.
//!
//! Thin layer over the suggestion engine: handlers translate HTTP into
//! engine calls and map every failure to a well-formed JSON envelope,
//! never a bare 500 body.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::registry::records::JurisdictionFilter;
use crate::suggest::SuggestionEngine;
use crate::types::errors::SuggestResult;
use crate::types::requests::{FeedbackSubmission, SuggestionRequest};
use crate::types::responses::ErrorEnvelope;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SuggestionEngine>,
}

/// Query parameters of `GET /api/suggestions`.
#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub head_id: Option<i64>,
    #[serde(default)]
    pub use_ai: bool,
    pub spouse_id: Option<i64>,
    pub spouse_name: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/suggestions", get(get_suggestions))
        .route("/api/learning/stats", get(get_learning_stats))
        .route("/api/feedback", post(post_feedback))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> SuggestResult<()> {
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "suggestion API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SuggestionQuery>,
) -> Response {
    let mut request = SuggestionRequest::new(query.head_id)
        .with_use_ai(query.use_ai)
        .with_jurisdiction(jurisdiction_from_headers(&headers));
    if let Some(spouse_id) = query.spouse_id {
        request = request.with_spouse_id(spouse_id);
    }
    if let Some(spouse_name) = query.spouse_name {
        request = request.with_spouse_name(spouse_name);
    }

    match state.engine.suggest(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "suggestion request failed");
            error_response(e.to_string())
        }
    }
}

async fn get_learning_stats(State(state): State<AppState>) -> Response {
    match state.engine.statistics().await {
        Ok(stats) => Json(json!({ "success": true, "stats": stats })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "statistics request failed");
            error_response(e.to_string())
        }
    }
}

/// Feedback is recorded best-effort: a store failure is logged and the
/// response still reports success, so it never disturbs the caller's save.
async fn post_feedback(
    State(state): State<AppState>,
    Json(feedback): Json<FeedbackSubmission>,
) -> Response {
    match state.engine.record_feedback(&feedback).await {
        Ok(outcome) => Json(json!({
            "success": true,
            "patterns_updated": outcome.patterns_updated,
            "patterns_created": outcome.patterns_created,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, submission_id = %feedback.submission_id,
                "feedback not recorded");
            Json(json!({ "success": true })).into_response()
        }
    }
}

/// Parses the caller scope from the `x-jurisdiction` header.
///
/// Accepted forms: `area:<code>` and `subarea:<code>`. Absent, empty or
/// unparseable values fall back to the global scope.
fn jurisdiction_from_headers(headers: &HeaderMap) -> JurisdictionFilter {
    let Some(value) = headers.get("x-jurisdiction").and_then(|v| v.to_str().ok()) else {
        return JurisdictionFilter::Global;
    };

    match value.split_once(':') {
        Some(("area", code)) if !code.trim().is_empty() => {
            JurisdictionFilter::Area(code.trim().to_string())
        }
        Some(("subarea", code)) if !code.trim().is_empty() => {
            JurisdictionFilter::SubArea(code.trim().to_string())
        }
        _ => JurisdictionFilter::Global,
    }
}

fn error_response(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope::new(message)),
    )
        .into_response()
}

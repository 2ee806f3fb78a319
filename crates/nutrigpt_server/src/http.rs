//! HTTP API, one route per user action.

use std::sync::Arc;

use axum::debug_handler;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use nutrigpt_client::UserProfile;
use serde::{Deserialize, Serialize};

use crate::cache::PlanFetch;
use crate::chat::ChatMessage;
use crate::error::AppError;
use crate::progress::{NewProgressEntry, ProgressEntry, ProgressSummary, summarize};
use crate::state::AppState;

type ApiError = (StatusCode, String);

#[derive(Debug, Default, Deserialize)]
pub struct PlanQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub entries: Vec<ProgressEntry>,
    pub summary: ProgressSummary,
}

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/profile",
            get(get_profile).put(put_profile).delete(delete_profile),
        )
        .route("/plan", get(get_plan))
        .route("/chat/welcome", get(chat_welcome))
        .route("/chat", post(chat))
        .route("/progress", get(get_progress).post(post_progress))
}

#[debug_handler]
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn require_profile(state: &AppState) -> Result<UserProfile, ApiError> {
    state
        .profiles
        .load()
        .map_err(map_err)?
        .ok_or_else(|| map_err(AppError::NotFound("no profile; complete onboarding first".into())))
}

#[debug_handler]
async fn get_profile(State(state): State<Arc<AppState>>) -> Result<Json<UserProfile>, ApiError> {
    require_profile(&state).map(Json)
}

#[debug_handler]
async fn put_profile(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<UserProfile>,
) -> Result<StatusCode, ApiError> {
    state
        .profiles
        .save(&profile)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_err)
}

#[debug_handler]
async fn delete_profile(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state
        .profiles
        .logout()
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_err)
}

#[debug_handler]
async fn get_plan(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlanQuery>,
) -> Result<Json<PlanFetch>, ApiError> {
    let profile = require_profile(&state)?;
    state
        .plans
        .fetch(&profile, query.force)
        .await
        .map(Json)
        .map_err(|e| map_err(e.into()))
}

#[debug_handler]
async fn chat_welcome(State(state): State<Arc<AppState>>) -> Result<Json<ChatMessage>, ApiError> {
    let profile = require_profile(&state)?;
    Ok(Json(state.chat.welcome(&profile)))
}

#[debug_handler]
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatMessage>, ApiError> {
    let profile = require_profile(&state)?;
    state
        .chat
        .ask(&profile, &req.question)
        .await
        .map(Json)
        .map_err(map_err)
}

#[debug_handler]
async fn get_progress(State(state): State<Arc<AppState>>) -> Result<Json<ProgressView>, ApiError> {
    let profile = require_profile(&state)?;
    let entries = state.progress.entries(&profile).map_err(map_err)?;
    let summary = summarize(&entries, &profile);
    Ok(Json(ProgressView { entries, summary }))
}

#[debug_handler]
async fn post_progress(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewProgressEntry>,
) -> Result<(StatusCode, Json<ProgressEntry>), ApiError> {
    let profile = require_profile(&state)?;
    state
        .progress
        .record(&profile, input)
        .map(|entry| (StatusCode::CREATED, Json(entry)))
        .map_err(map_err)
}

fn map_err(e: AppError) -> ApiError {
    match e {
        AppError::Generation(_) => (
            StatusCode::BAD_GATEWAY,
            format!("{e}; the previous plan was kept, please try again"),
        ),
        AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        AppError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        AppError::Store(_) | AppError::Serialization(_) => {
            tracing::error!(error = %e, "request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::discovery;
use crate::models::job::{JobPosting, SortOption};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Deserialize)]
pub struct MatchQuery {
    #[serde(default)]
    pub sort: SortOption,
}

/// GET /api/v1/sessions/:session_id/jobs/search?query=
pub async fn handle_search(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    state.sessions.get(session_id).await?;
    let jobs = discovery::search(state.upstream.as_ref(), &params.query).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/sessions/:session_id/jobs/match?sort=
pub async fn handle_match(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<MatchQuery>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let jobs = discovery::match_jobs(state.upstream.as_ref(), &ctx, params.sort).await?;
    Ok(Json(jobs))
}

/// PUT /api/v1/sessions/:session_id/jobs/selected
pub async fn handle_select_job(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(job): Json<JobPosting>,
) -> Result<Json<JobPosting>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let mut guard = ctx.lock().await;
    let selected = guard.select_job(job)?.clone();
    Ok(Json(selected))
}

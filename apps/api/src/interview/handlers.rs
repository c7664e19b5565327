use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::flows::{self, ActionOutcome};
use crate::interview::session::{InterviewAction, InterviewView};
use crate::interview::slot::SlotView;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub answer: String,
}

#[derive(Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

/// POST /api/v1/sessions/:session_id/interview
pub async fn handle_start(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let view = flows::start(
        state.upstream.as_ref(),
        &ctx,
        state.config.interview_question_count,
    )
    .await?;
    Ok(Json(view))
}

/// GET /api/v1/sessions/:session_id/interview
pub async fn handle_view(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SlotView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    Ok(Json(flows::view(&ctx).await))
}

/// PUT /api/v1/sessions/:session_id/interview/draft
pub async fn handle_draft(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<InterviewView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    Ok(Json(flows::draft(&ctx, &req.text).await?))
}

/// POST /api/v1/sessions/:session_id/interview/advance
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    act(state, session_id, InterviewAction::Advance { answer: req.answer }).await
}

/// POST /api/v1/sessions/:session_id/interview/skip
pub async fn handle_skip(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ActionOutcome>, AppError> {
    act(state, session_id, InterviewAction::Skip).await
}

/// POST /api/v1/sessions/:session_id/interview/finish
pub async fn handle_finish(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    act(state, session_id, InterviewAction::Finish { answer: req.answer }).await
}

async fn act(
    state: AppState,
    session_id: Uuid,
    action: InterviewAction,
) -> Result<Json<ActionOutcome>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    Ok(Json(flows::act(&ctx, action).await?))
}

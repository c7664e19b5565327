use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::document::PDF_CONTENT_TYPE;
use crate::models::tailoring::TailoredProfile;
use crate::state::AppState;
use crate::tailoring::flows;
use crate::tailoring::pipeline::{GenerationMode, PipelineView};

#[derive(Deserialize)]
pub struct TailoredDocumentQuery {
    /// Pins the request to the tailoring run the caller is looking at.
    pub run: Option<u64>,
}

/// POST /api/v1/sessions/:session_id/tailoring
pub async fn handle_tailor(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<PipelineView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let view = flows::tailor(state.upstream.as_ref(), &ctx).await?;
    Ok(Json(view))
}

/// GET /api/v1/sessions/:session_id/tailoring
pub async fn handle_pipeline_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<PipelineView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let view = ctx.lock().await.pipeline.view();
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:session_id/tailoring
pub async fn handle_abandon(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<PipelineView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    Ok(Json(flows::abandon(&ctx).await))
}

/// GET /api/v1/sessions/:session_id/tailoring/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<TailoredProfile>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    Ok(Json(flows::preview(&ctx).await?))
}

/// POST /api/v1/sessions/:session_id/tailoring/document?run=
pub async fn handle_generate_tailored(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<TailoredDocumentQuery>,
) -> Result<Json<PipelineView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let mode = GenerationMode::Tailored { run: params.run };
    let view = flows::generate(state.upstream.as_ref(), &ctx, mode).await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:session_id/documents
pub async fn handle_generate_plain(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<PipelineView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let view = flows::generate(state.upstream.as_ref(), &ctx, GenerationMode::Plain).await?;
    Ok(Json(view))
}

/// GET /api/v1/sessions/:session_id/documents/current
pub async fn handle_download(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let document = flows::current_document(&ctx).await?;
    let headers = [
        (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name()),
        ),
    ];
    Ok((headers, document.bytes).into_response())
}

/// DELETE /api/v1/sessions/:session_id/documents/current
pub async fn handle_release(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<PipelineView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    Ok(Json(flows::release_document(&ctx).await?))
}

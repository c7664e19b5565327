use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::session::context::SessionView;
use crate::session::flows::{self, ExtractedResume, Resolution};
use crate::state::AppState;
use crate::upstream::ResumeFile;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let (_, ctx) = state.sessions.create().await;
    let view = ctx.lock().await.view();
    (StatusCode::CREATED, Json(view))
}

/// GET /api/v1/sessions/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let view = ctx.lock().await.view();
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:session_id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {session_id} not found")))
    }
}

/// POST /api/v1/sessions/:session_id/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<Resolution>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let resolution = flows::signup(
        state.upstream.as_ref(),
        &ctx,
        &req.name,
        &req.email,
        &req.password,
    )
    .await?;
    Ok(Json(resolution))
}

/// POST /api/v1/sessions/:session_id/login
pub async fn handle_login(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Resolution>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let resolution = flows::login(state.upstream.as_ref(), &ctx, &req.email, &req.password).await?;
    Ok(Json(resolution))
}

/// POST /api/v1/sessions/:session_id/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Resolution>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    Ok(Json(flows::logout(&ctx).await))
}

/// GET /api/v1/sessions/:session_id/profile
pub async fn handle_resolve_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Resolution>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let resolution = flows::resolve_profile(state.upstream.as_ref(), &ctx).await?;
    Ok(Json(resolution))
}

/// PUT /api/v1/sessions/:session_id/profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(profile): Json<Profile>,
) -> Result<Json<Resolution>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let resolution = flows::save_profile(state.upstream.as_ref(), &ctx, profile).await?;
    Ok(Json(resolution))
}

/// POST /api/v1/sessions/:session_id/profile/autofill
pub async fn handle_autofill(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Resolution>, AppError> {
    let ctx = state.sessions.get(session_id).await?;
    let file = read_resume(multipart, state.config.max_upload_bytes).await?;
    let resolution = flows::autofill_profile(state.upstream.as_ref(), &ctx, file).await?;
    Ok(Json(resolution))
}

/// POST /api/v1/sessions/:session_id/resume/upload
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ExtractedResume>, AppError> {
    state.sessions.get(session_id).await?;
    let file = read_resume(multipart, state.config.max_upload_bytes).await?;
    let extracted = flows::upload_resume(state.upstream.as_ref(), file).await?;
    Ok(Json(extracted))
}

/// Reads the `file` part of a multipart upload.
async fn read_resume(mut multipart: Multipart, max_bytes: usize) -> Result<ResumeFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
        if bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "File exceeds the {max_bytes}-byte upload limit"
            )));
        }
        return Ok(ResumeFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation("Missing 'file' field".to_string()))
}

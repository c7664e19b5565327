use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::session::InterviewError;
use crate::session::resolver::ResolverError;
use crate::tailoring::pipeline::PipelineError;
use crate::upstream::UpstreamError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// No credential, or the remote side rejected it. Forces re-authentication.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Authenticated, but the profile is missing or not yet resolved.
    #[error("Profile required")]
    ProfileRequired,

    /// The action is not valid in the current session state.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the same request may succeed if simply repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Upstream(_))
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotFound(msg) => AppError::NotFound(msg),
            UpstreamError::Unauthorized => AppError::Unauthorized,
            UpstreamError::Rejected { detail, .. } => AppError::Validation(detail),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<ResolverError> for AppError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::NotAuthenticated | ResolverError::CredentialExpired => {
                AppError::Unauthorized
            }
            ResolverError::AuthenticationFailed(detail) => AppError::AuthenticationFailed(detail),
            ResolverError::ProfileRequired => AppError::ProfileRequired,
            ResolverError::AuthenticationUnavailable(source) | ResolverError::LookupFailed(source) => {
                AppError::Upstream(source.to_string())
            }
            other => AppError::Conflict(other.to_string()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidJob(msg) => AppError::Validation(msg),
            PipelineError::Failed { step, source } => match source {
                UpstreamError::Unauthorized => AppError::Unauthorized,
                source => AppError::Upstream(format!("{step} failed: {source}")),
            },
            other => AppError::Conflict(other.to_string()),
        }
    }
}

impl From<InterviewError> for AppError {
    fn from(err: InterviewError) -> Self {
        match err {
            InterviewError::NoPrompts => AppError::Validation(err.to_string()),
            InterviewError::EmptyAnswer => AppError::Validation(err.to_string()),
            InterviewError::GenerationFailed(UpstreamError::Unauthorized) => {
                AppError::Unauthorized
            }
            InterviewError::GenerationFailed(source) => {
                AppError::Upstream(format!("question generation failed: {source}"))
            }
            other => AppError::Conflict(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::AuthenticationFailed(msg) => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                msg.clone(),
            ),
            AppError::ProfileRequired => (
                StatusCode::CONFLICT,
                "PROFILE_REQUIRED",
                "Complete your profile first".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "The WorkMate backend could not complete the request".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}

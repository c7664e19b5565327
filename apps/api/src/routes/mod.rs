pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::interview::handlers as interview;
use crate::jobs::handlers as jobs;
use crate::session::handlers as session;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

/// Headroom for multipart boundaries and headers around the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions and identity
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/:session_id",
            get(session::handle_get_session).delete(session::handle_end_session),
        )
        .route(
            "/api/v1/sessions/:session_id/signup",
            post(session::handle_signup),
        )
        .route("/api/v1/sessions/:session_id/login", post(session::handle_login))
        .route(
            "/api/v1/sessions/:session_id/logout",
            post(session::handle_logout),
        )
        .route(
            "/api/v1/sessions/:session_id/profile",
            get(session::handle_resolve_profile).put(session::handle_save_profile),
        )
        .route(
            "/api/v1/sessions/:session_id/profile/autofill",
            post(session::handle_autofill),
        )
        .route(
            "/api/v1/sessions/:session_id/resume/upload",
            post(session::handle_upload_resume),
        )
        // Jobs
        .route(
            "/api/v1/sessions/:session_id/jobs/search",
            get(jobs::handle_search),
        )
        .route(
            "/api/v1/sessions/:session_id/jobs/match",
            get(jobs::handle_match),
        )
        .route(
            "/api/v1/sessions/:session_id/jobs/selected",
            put(jobs::handle_select_job),
        )
        // Tailoring pipeline and documents
        .route(
            "/api/v1/sessions/:session_id/tailoring",
            post(tailoring::handle_tailor)
                .get(tailoring::handle_pipeline_status)
                .delete(tailoring::handle_abandon),
        )
        .route(
            "/api/v1/sessions/:session_id/tailoring/preview",
            get(tailoring::handle_preview),
        )
        .route(
            "/api/v1/sessions/:session_id/tailoring/document",
            post(tailoring::handle_generate_tailored),
        )
        .route(
            "/api/v1/sessions/:session_id/documents",
            post(tailoring::handle_generate_plain),
        )
        .route(
            "/api/v1/sessions/:session_id/documents/current",
            get(tailoring::handle_download).delete(tailoring::handle_release),
        )
        // Interview
        .route(
            "/api/v1/sessions/:session_id/interview",
            post(interview::handle_start).get(interview::handle_view),
        )
        .route(
            "/api/v1/sessions/:session_id/interview/draft",
            put(interview::handle_draft),
        )
        .route(
            "/api/v1/sessions/:session_id/interview/advance",
            post(interview::handle_advance),
        )
        .route(
            "/api/v1/sessions/:session_id/interview/skip",
            post(interview::handle_skip),
        )
        .route(
            "/api/v1/sessions/:session_id/interview/finish",
            post(interview::handle_finish),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

//! SessionContext: everything one user session owns, behind one async mutex.
//!
//! Handlers lock the context, capture a ticket, unlock, await the remote call,
//! then lock again to apply the outcome. The lock is never held across a
//! remote call.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::slot::{InterviewSlot, SlotView};
use crate::models::job::JobPosting;
use crate::session::resolver::{AuthTicket, Credential, Landing, SessionResolver, SessionState};
use crate::tailoring::pipeline::{PipelineView, TailoringPipeline};
use crate::upstream::UpstreamError;

#[derive(Debug)]
pub struct SessionContext {
    pub id: Uuid,
    pub resolver: SessionResolver,
    pub pipeline: TailoringPipeline,
    pub interview: InterviewSlot,
    selected_job: Option<JobPosting>,
    created_at: DateTime<Utc>,
    last_seen: Instant,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub state: SessionState,
    pub authenticated: bool,
    pub profile_lookup_pending: bool,
    pub landing: Landing,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub selected_job: Option<JobPosting>,
    pub pipeline: PipelineView,
    pub interview: SlotView,
}

impl SessionContext {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            resolver: SessionResolver::new(),
            pipeline: TailoringPipeline::new(),
            interview: InterviewSlot::new(),
            selected_job: None,
            created_at: Utc::now(),
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_since(&self) -> Instant {
        self.last_seen
    }

    pub fn selected_job(&self) -> Option<&JobPosting> {
        self.selected_job.as_ref()
    }

    /// Selecting a different job drops the interview built for the old one.
    pub fn select_job(&mut self, job: JobPosting) -> Result<&JobPosting, AppError> {
        self.resolver.credential()?;
        job.ensure_selectable()?;
        let job = job.with_clamped_score();

        if self.selected_job.as_ref() != Some(&job) {
            self.interview.reset();
        }
        info!("Session {} selected '{}' at {}", self.id, job.title, job.company);
        Ok(&*self.selected_job.insert(job))
    }

    /// Starts authentication for a new identity. Everything derived from the
    /// previous identity is dropped with it.
    pub fn begin_login(&mut self, email: &str) -> AuthTicket {
        let ticket = self.resolver.begin_authenticate(email);
        self.drop_user_data();
        ticket
    }

    pub fn logout(&mut self) {
        self.resolver.logout();
        self.drop_user_data();
    }

    /// Reports a remote refusal of `used` as `Unauthorized`, before any ticket
    /// is applied. Only clears the session if `used` is still the stored
    /// credential; a newer login is left alone.
    pub fn observe<T>(
        &mut self,
        used: &Credential,
        outcome: &Result<T, UpstreamError>,
    ) -> Result<(), AppError> {
        if !matches!(outcome, Err(UpstreamError::Unauthorized)) {
            return Ok(());
        }
        if self.resolver.credential().ok() == Some(used) {
            self.resolver.invalidate();
            self.drop_user_data();
        }
        Err(AppError::Unauthorized)
    }

    fn drop_user_data(&mut self) {
        self.pipeline.abandon();
        self.pipeline.release_document();
        self.interview.reset();
        self.selected_job = None;
    }

    pub fn view(&self) -> SessionView {
        let state = self.resolver.state();
        SessionView {
            id: self.id,
            state,
            authenticated: state.is_authenticated(),
            profile_lookup_pending: self.resolver.lookup_pending(),
            landing: state.landing(),
            user_id: self.resolver.user_id().map(str::to_string),
            created_at: self.created_at,
            selected_job: self.selected_job.clone(),
            pipeline: self.pipeline.view(),
            interview: self.interview.view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::sample_job;

    fn logged_in(email: &str) -> (SessionContext, Credential) {
        let mut ctx = SessionContext::new(Uuid::new_v4());
        let ticket = ctx.begin_login(email);
        let credential = ctx
            .resolver
            .complete_authenticate(ticket, Ok(format!("token-for-{email}")))
            .unwrap();
        (ctx, credential)
    }

    #[test]
    fn test_select_job_requires_login() {
        let mut ctx = SessionContext::new(Uuid::new_v4());
        let err = ctx.select_job(sample_job("Rust Engineer")).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert!(ctx.selected_job().is_none());
    }

    #[test]
    fn test_select_job_rejects_blank_title_and_clamps_score() {
        let (mut ctx, _) = logged_in("alice@example.com");
        assert!(matches!(
            ctx.select_job(sample_job("  ")),
            Err(AppError::Validation(_))
        ));

        let mut job = sample_job("Rust Engineer");
        job.match_score = Some(1.7);
        let selected = ctx.select_job(job).unwrap();
        assert_eq!(selected.match_score, Some(1.0));
    }

    #[test]
    fn test_refusal_of_current_credential_clears_session() {
        let (mut ctx, credential) = logged_in("alice@example.com");
        ctx.select_job(sample_job("Rust Engineer")).unwrap();

        let err = ctx
            .observe::<()>(&credential, &Err(UpstreamError::Unauthorized))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(ctx.resolver.state(), SessionState::Anonymous);
        assert!(ctx.selected_job().is_none());
    }

    #[test]
    fn test_refusal_of_old_credential_is_ignored() {
        let (mut ctx, old) = logged_in("alice@example.com");
        let ticket = ctx.begin_login("bob@example.com");
        ctx.resolver
            .complete_authenticate(ticket, Ok("token-for-bob".to_string()))
            .unwrap();

        assert!(ctx
            .observe::<()>(&old, &Err(UpstreamError::Unauthorized))
            .is_err());
        assert_eq!(ctx.resolver.user_id(), Some("bob@example.com"));
    }

    #[test]
    fn test_other_failures_do_not_touch_the_credential() {
        let (mut ctx, credential) = logged_in("alice@example.com");
        ctx.observe::<()>(
            &credential,
            &Err(UpstreamError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
        )
        .unwrap();
        assert!(ctx.resolver.credential().is_ok());
    }

    #[test]
    fn test_view_reports_landing() {
        let (ctx, _) = logged_in("alice@example.com");
        let view = ctx.view();
        assert_eq!(view.state, SessionState::ProfileUnknown);
        assert_eq!(view.landing, Landing::EditProfile);
        assert_eq!(view.user_id.as_deref(), Some("alice@example.com"));
    }
}

use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::interview::questions::question_request;
use crate::interview::session::{InterviewAction, InterviewError, InterviewView, Progress};
use crate::interview::slot::SlotView;
use crate::session::store::SharedContext;
use crate::upstream::JobAssistantApi;

#[derive(Debug, Serialize)]
pub struct ActionOutcome {
    pub progress: Progress,
    pub interview: InterviewView,
}

/// Generates prompts for the selected job and starts a fresh interview.
pub async fn start(
    api: &dyn JobAssistantApi,
    ctx: &SharedContext,
    count: usize,
) -> Result<InterviewView, AppError> {
    let (ticket, credential, request) = {
        let mut guard = ctx.lock().await;
        let credential = guard.resolver.require_profile()?.0.clone();
        let Some(job) = guard.selected_job().cloned() else {
            return Err(InterviewError::NoPrompts.into());
        };
        let ticket = guard.interview.begin(Some(&job))?;
        (ticket, credential, question_request(&job, count))
    };

    info!(
        "Generating {} interview questions for '{}'",
        request.n_questions, request.job_title
    );
    let outcome = api
        .generate_interview_questions(&credential, &request)
        .await;

    let mut guard = ctx.lock().await;
    guard.observe(&credential, &outcome)?;
    let session = guard.interview.complete(ticket, outcome, count)?;
    Ok(session.view())
}

pub async fn view(ctx: &SharedContext) -> SlotView {
    ctx.lock().await.interview.view()
}

pub async fn act(ctx: &SharedContext, action: InterviewAction) -> Result<ActionOutcome, AppError> {
    let mut guard = ctx.lock().await;
    guard.resolver.credential()?;
    let session = guard.interview.session_mut()?;
    let progress = session.apply(action)?;
    if session.is_finished() {
        info!(
            "Interview finished with {} recorded answers",
            session.transcript().len()
        );
    }
    Ok(ActionOutcome {
        progress,
        interview: session.view(),
    })
}

pub async fn draft(ctx: &SharedContext, text: &str) -> Result<InterviewView, AppError> {
    let mut guard = ctx.lock().await;
    guard.resolver.credential()?;
    let session = guard.interview.session_mut()?;
    session.draft(text)?;
    Ok(session.view())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::*;
    use crate::models::job::sample_job;
    use crate::models::profile::sample_profile;
    use crate::session::context::SessionContext;
    use crate::session::flows::login;
    use crate::upstream::fake::{Fault, FakeUpstream};

    fn api(questions: &[&str]) -> FakeUpstream {
        FakeUpstream::new()
            .with_account("alice@example.com", "pw")
            .with_profile("alice@example.com", sample_profile("alice@example.com"))
            .with_questions(questions)
    }

    async fn session(api: &FakeUpstream, with_job: bool) -> SharedContext {
        let ctx = Arc::new(Mutex::new(SessionContext::new(Uuid::new_v4())));
        login(api, &ctx, "alice@example.com", "pw").await.unwrap();
        if with_job {
            ctx.lock()
                .await
                .select_job(sample_job("Rust Engineer"))
                .unwrap();
        }
        ctx
    }

    fn advance(text: &str) -> InterviewAction {
        InterviewAction::Advance {
            answer: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_without_job_fails_fast() {
        let api = api(&["Q1"]);
        let ctx = session(&api, false).await;

        let err = start(&api, &ctx, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!api.calls().contains(&"generate_interview_questions"));
    }

    #[tokio::test]
    async fn test_no_generated_questions_is_no_prompts() {
        let api = api(&[]);
        let ctx = session(&api, true).await;

        let err = start(&api, &ctx, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_generation_failure_is_retryable() {
        let api = api(&["Q1"]);
        let ctx = session(&api, true).await;

        api.fail("generate_interview_questions", Fault::Unavailable);
        let err = start(&api, &ctx, 5).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(view(&ctx).await, SlotView::Failed { .. }));
    }

    #[tokio::test]
    async fn test_expired_credential_during_generation_forces_login() {
        let api = api(&["Q1"]);
        let ctx = session(&api, true).await;

        api.fail("generate_interview_questions", Fault::Expired);
        let err = start(&api, &ctx, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert!(ctx.lock().await.resolver.credential().is_err());
        assert!(matches!(view(&ctx).await, SlotView::NotStarted));
    }

    #[tokio::test]
    async fn test_five_prompt_interview_end_to_end() {
        let api = api(&["1. Q1", "2. Q2", "3. Q3", "4. Q4", "5. Q5"]);
        let ctx = session(&api, true).await;

        let started = start(&api, &ctx, 5).await.unwrap();
        assert_eq!(started.total, 5);
        assert_eq!(started.prompt.as_deref(), Some("Q1"));

        act(&ctx, advance("A1")).await.unwrap();
        act(&ctx, advance("A2")).await.unwrap();
        draft(&ctx, "thinking...").await.unwrap();
        act(&ctx, advance("A3")).await.unwrap();
        act(&ctx, InterviewAction::Skip).await.unwrap();
        let done = act(
            &ctx,
            InterviewAction::Finish {
                answer: "A5".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(done.progress, Progress::Finished);
        let questions: Vec<_> = done
            .interview
            .transcript
            .iter()
            .map(|r| r.question.as_str())
            .collect();
        assert_eq!(questions, vec!["Q1", "Q2", "Q3", "Q5"]);

        let err = act(&ctx, InterviewAction::Skip).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_actions_before_start_conflict() {
        let api = api(&["Q1"]);
        let ctx = session(&api, true).await;
        assert!(matches!(
            act(&ctx, InterviewAction::Skip).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_advance_is_a_validation_error() {
        let api = api(&["Q1", "Q2"]);
        let ctx = session(&api, true).await;
        start(&api, &ctx, 5).await.unwrap();

        assert!(matches!(
            act(&ctx, advance(" ")).await,
            Err(AppError::Validation(_))
        ));
    }
}

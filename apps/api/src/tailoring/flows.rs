//! Session-level tailoring flows: tailor the selected job, generate tailored
//! or plain documents, preview, release and abandon.

use tracing::info;

use crate::errors::AppError;
use crate::models::document::GeneratedDocument;
use crate::models::tailoring::TailoredProfile;
use crate::session::store::SharedContext;
use crate::tailoring::pipeline::{GenerationMode, PipelineError, PipelineView};
use crate::upstream::JobAssistantApi;

/// Tailors the profile to the selected job. Starting a new run supersedes any
/// run still in flight; its late result is discarded.
pub async fn tailor(api: &dyn JobAssistantApi, ctx: &SharedContext) -> Result<PipelineView, AppError> {
    let (ticket, credential, job) = {
        let mut guard = ctx.lock().await;
        let credential = guard.resolver.require_profile()?.0.clone();
        let job = guard
            .selected_job()
            .cloned()
            .ok_or_else(|| AppError::Validation("select a job before tailoring".to_string()))?;
        let ticket = guard.pipeline.begin_tailor(&job)?;
        info!(
            "Tailoring run {} for {} against '{}'",
            guard.pipeline.run(),
            credential.user_id(),
            job.title
        );
        (ticket, credential, job)
    };

    let outcome = api.tailor_resume(&credential, &job).await;

    let mut guard = ctx.lock().await;
    guard.observe(&credential, &outcome)?;
    guard.pipeline.complete_tailor(ticket, outcome)?;
    Ok(guard.pipeline.view())
}

/// Generates a document. `Tailored` needs the current run's tailoring to have
/// completed; `Plain` starts its own run.
pub async fn generate(
    api: &dyn JobAssistantApi,
    ctx: &SharedContext,
    mode: GenerationMode,
) -> Result<PipelineView, AppError> {
    let (ticket, credential, profile, tailored) = {
        let mut guard = ctx.lock().await;
        let (credential, profile) = guard.resolver.require_profile()?;
        let (credential, profile) = (credential.clone(), profile.clone());
        let (ticket, tailored) = guard.pipeline.begin_generate(mode)?;
        (ticket, credential, profile, tailored)
    };

    let outcome = api
        .generate_document(&credential, &profile, tailored.as_ref())
        .await;

    let mut guard = ctx.lock().await;
    guard.observe(&credential, &outcome)?;
    guard.pipeline.complete_generate(ticket, outcome)?;
    Ok(guard.pipeline.view())
}

/// The profile as the tailored document will present it.
pub async fn preview(ctx: &SharedContext) -> Result<TailoredProfile, AppError> {
    let guard = ctx.lock().await;
    let (_, profile) = guard.resolver.require_profile()?;
    let tailored = guard.pipeline.tailored().ok_or(PipelineError::NotTailored)?;
    Ok(tailored.apply_to(profile))
}

pub async fn current_document(ctx: &SharedContext) -> Result<GeneratedDocument, AppError> {
    let guard = ctx.lock().await;
    guard.resolver.credential()?;
    guard
        .pipeline
        .document()
        .cloned()
        .ok_or_else(|| AppError::NotFound("No document has been generated".to_string()))
}

pub async fn release_document(ctx: &SharedContext) -> Result<PipelineView, AppError> {
    let mut guard = ctx.lock().await;
    guard
        .pipeline
        .release_document()
        .ok_or_else(|| AppError::NotFound("No document to release".to_string()))?;
    Ok(guard.pipeline.view())
}

pub async fn abandon(ctx: &SharedContext) -> PipelineView {
    let mut guard = ctx.lock().await;
    guard.pipeline.abandon();
    guard.pipeline.view()
}

//! JobMatchView: search and ranked matching over the remote job service.
//! Postings are read-only here; scores are clamped on receipt.

use tracing::info;

use crate::errors::AppError;
use crate::models::job::{JobPosting, SortOption};
use crate::session::store::SharedContext;
use crate::upstream::JobAssistantApi;

/// Free-text search. A blank query is rejected before any remote call.
pub async fn search(api: &dyn JobAssistantApi, query: &str) -> Result<Vec<JobPosting>, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("search query cannot be empty".to_string()));
    }

    let jobs = clamp_all(api.search_jobs(query).await?);
    info!("Search '{query}' returned {} postings", jobs.len());
    Ok(jobs)
}

/// Postings ranked against the signed-in user. No matches is an empty list.
pub async fn match_jobs(
    api: &dyn JobAssistantApi,
    ctx: &SharedContext,
    sort: SortOption,
) -> Result<Vec<JobPosting>, AppError> {
    let credential = ctx.lock().await.resolver.credential()?.clone();
    let outcome = api.match_jobs(&credential, sort).await;
    ctx.lock().await.observe(&credential, &outcome)?;

    let jobs = clamp_all(outcome?);
    info!(
        "Matched {} postings for {} (sort: {})",
        jobs.len(),
        credential.user_id(),
        sort.as_str()
    );
    Ok(jobs)
}

fn clamp_all(jobs: Vec<JobPosting>) -> Vec<JobPosting> {
    jobs.into_iter().map(JobPosting::with_clamped_score).collect()
}

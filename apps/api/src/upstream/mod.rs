//! Upstream client: the single point of entry for every call to the remote
//! WorkMate backend (auth, profiles, jobs, tailoring, documents, interviews).
//!
//! ARCHITECTURAL RULE: session logic talks to the backend only through
//! [`JobAssistantApi`]. Handlers never build HTTP requests themselves.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::models::job::{JobPosting, SortOption};
use crate::models::profile::Profile;
use crate::models::tailoring::TailoredContent;
use crate::session::resolver::Credential;

pub mod http;

pub use http::HttpUpstream;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The expected-negative outcome (404). Callers decide whether it is an error.
    #[error("not found: {0}")]
    NotFound(String),

    /// The stored credential was refused; the user must log in again.
    #[error("credential rejected")]
    Unauthorized,

    /// A 4xx refusal carrying the backend's detail message.
    #[error("request rejected (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("backend unavailable after {retries} retries")]
    Unavailable { retries: u32 },
}

/// Parameters for interview question generation.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRequest {
    pub job_title: String,
    pub job_description: String,
    pub job_skills: Vec<String>,
    pub n_questions: usize,
}

/// A résumé file forwarded to the backend for text extraction or autofill.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// The remote contracts the session core consumes. Carried in `AppState` as
/// `Arc<dyn JobAssistantApi>` so tests can swap in an in-memory fake.
#[async_trait]
pub trait JobAssistantApi: Send + Sync {
    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), UpstreamError>;

    /// Returns the identity token for a valid email/password pair.
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, UpstreamError>;

    async fn get_profile(&self, credential: &Credential) -> Result<Profile, UpstreamError>;

    async fn update_profile(
        &self,
        credential: &Credential,
        profile: &Profile,
    ) -> Result<(), UpstreamError>;

    async fn create_profile(
        &self,
        credential: &Credential,
        profile: &Profile,
    ) -> Result<(), UpstreamError>;

    async fn search_jobs(&self, query: &str) -> Result<Vec<JobPosting>, UpstreamError>;

    async fn match_jobs(
        &self,
        credential: &Credential,
        sort: SortOption,
    ) -> Result<Vec<JobPosting>, UpstreamError>;

    async fn tailor_resume(
        &self,
        credential: &Credential,
        job: &JobPosting,
    ) -> Result<TailoredContent, UpstreamError>;

    /// Renders a document. `tailored == None` means a plain, non-tailored résumé.
    async fn generate_document(
        &self,
        credential: &Credential,
        profile: &Profile,
        tailored: Option<&TailoredContent>,
    ) -> Result<Bytes, UpstreamError>;

    async fn generate_interview_questions(
        &self,
        credential: &Credential,
        request: &QuestionRequest,
    ) -> Result<Vec<String>, UpstreamError>;

    async fn upload_resume(&self, file: &ResumeFile) -> Result<String, UpstreamError>;

    async fn autofill_profile(
        &self,
        credential: &Credential,
        file: &ResumeFile,
    ) -> Result<(), UpstreamError>;
}

#[cfg(test)]
pub(crate) mod fake;

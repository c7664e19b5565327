//! In-memory [`JobAssistantApi`] used by tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{JobAssistantApi, QuestionRequest, ResumeFile, UpstreamError};
use crate::models::job::{JobPosting, SortOption};
use crate::models::profile::Profile;
use crate::models::tailoring::{TailoredContent, TailoredExperience};
use crate::session::resolver::Credential;

/// Which remote call should fail, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// 503 from the backend.
    Unavailable,
    /// The credential is refused.
    Expired,
    /// The backend never answers.
    Hang,
}

#[derive(Default)]
struct FakeState {
    passwords: HashMap<String, String>,
    profiles: HashMap<String, Profile>,
    faults: HashMap<&'static str, Fault>,
    calls: Vec<&'static str>,
    jobs: Vec<JobPosting>,
    questions: Vec<String>,
}

#[derive(Default)]
pub struct FakeUpstream {
    state: Mutex<FakeState>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.lock()
            .passwords
            .insert(email.to_string(), password.to_string());
        self
    }

    pub fn with_profile(self, email: &str, profile: Profile) -> Self {
        self.lock().profiles.insert(email.to_string(), profile);
        self
    }

    pub fn with_jobs(self, jobs: Vec<JobPosting>) -> Self {
        self.lock().jobs = jobs;
        self
    }

    pub fn with_questions(self, questions: &[&str]) -> Self {
        self.lock().questions = questions.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn fail(&self, call: &'static str, fault: Fault) {
        self.lock().faults.insert(call, fault);
    }

    pub fn heal(&self, call: &'static str) {
        self.lock().faults.remove(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn stored_profile(&self, email: &str) -> Option<Profile> {
        self.lock().profiles.get(email).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    async fn enter(&self, call: &'static str) -> Result<(), UpstreamError> {
        let fault = {
            let mut state = self.lock();
            state.calls.push(call);
            state.faults.get(call).copied()
        };
        match fault {
            None => Ok(()),
            Some(Fault::Unavailable) => Err(UpstreamError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            }),
            Some(Fault::Expired) => Err(UpstreamError::Unauthorized),
            Some(Fault::Hang) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl JobAssistantApi for FakeUpstream {
    async fn signup(&self, _name: &str, email: &str, password: &str) -> Result<(), UpstreamError> {
        self.enter("signup").await?;
        let mut state = self.lock();
        if state.passwords.contains_key(email) {
            return Err(UpstreamError::Rejected {
                status: 400,
                detail: "Email already registered".to_string(),
            });
        }
        state
            .passwords
            .insert(email.to_string(), password.to_string());
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<String, UpstreamError> {
        self.enter("authenticate").await?;
        match self.lock().passwords.get(email) {
            Some(p) if p == password => Ok(format!("token-for-{email}")),
            _ => Err(UpstreamError::Rejected {
                status: 401,
                detail: "Invalid credentials".to_string(),
            }),
        }
    }

    async fn get_profile(&self, credential: &Credential) -> Result<Profile, UpstreamError> {
        self.enter("get_profile").await?;
        self.lock()
            .profiles
            .get(credential.user_id())
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound("Profile not found".to_string()))
    }

    async fn update_profile(
        &self,
        credential: &Credential,
        profile: &Profile,
    ) -> Result<(), UpstreamError> {
        self.enter("update_profile").await?;
        let mut state = self.lock();
        match state.profiles.get_mut(credential.user_id()) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(())
            }
            None => Err(UpstreamError::NotFound("Profile not found".to_string())),
        }
    }

    async fn create_profile(
        &self,
        credential: &Credential,
        profile: &Profile,
    ) -> Result<(), UpstreamError> {
        self.enter("create_profile").await?;
        self.lock()
            .profiles
            .insert(credential.user_id().to_string(), profile.clone());
        Ok(())
    }

    async fn search_jobs(&self, query: &str) -> Result<Vec<JobPosting>, UpstreamError> {
        self.enter("search_jobs").await?;
        let needle = query.to_lowercase();
        Ok(self
            .lock()
            .jobs
            .iter()
            .filter(|j| j.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn match_jobs(
        &self,
        _credential: &Credential,
        _sort: SortOption,
    ) -> Result<Vec<JobPosting>, UpstreamError> {
        self.enter("match_jobs").await?;
        Ok(self.lock().jobs.clone())
    }

    async fn tailor_resume(
        &self,
        credential: &Credential,
        job: &JobPosting,
    ) -> Result<TailoredContent, UpstreamError> {
        self.enter("tailor_resume").await?;
        let profile = self
            .lock()
            .profiles
            .get(credential.user_id())
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound("User profile not found".to_string()))?;
        Ok(TailoredContent {
            job_title: job.title.clone(),
            company: job.company.clone(),
            summary: format!("Candidate for {}", job.title),
            skills: job.skills.clone(),
            experience: profile
                .work
                .iter()
                .map(|w| TailoredExperience {
                    company: w.company.clone(),
                    role: w.title.clone(),
                    bullets: vec![format!("Tailored for {}", job.title)],
                })
                .collect(),
            projects: vec![],
        })
    }

    async fn generate_document(
        &self,
        _credential: &Credential,
        profile: &Profile,
        tailored: Option<&TailoredContent>,
    ) -> Result<Bytes, UpstreamError> {
        self.enter("generate_document").await?;
        let label = match tailored {
            Some(t) => format!("%PDF tailored {} {}", profile.personal_info.name, t.job_title),
            None => format!("%PDF plain {}", profile.personal_info.name),
        };
        Ok(Bytes::from(label))
    }

    async fn generate_interview_questions(
        &self,
        _credential: &Credential,
        request: &QuestionRequest,
    ) -> Result<Vec<String>, UpstreamError> {
        self.enter("generate_interview_questions").await?;
        Ok(self
            .lock()
            .questions
            .iter()
            .take(request.n_questions)
            .cloned()
            .collect())
    }

    async fn upload_resume(&self, file: &ResumeFile) -> Result<String, UpstreamError> {
        self.enter("upload_resume").await?;
        Ok(String::from_utf8_lossy(&file.bytes).into_owned())
    }

    async fn autofill_profile(
        &self,
        credential: &Credential,
        file: &ResumeFile,
    ) -> Result<(), UpstreamError> {
        self.enter("autofill_profile").await?;
        let mut profile = crate::models::profile::sample_profile(credential.user_id());
        profile.skills = String::from_utf8_lossy(&file.bytes)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.lock()
            .profiles
            .insert(credential.user_id().to_string(), profile);
        Ok(())
    }
}

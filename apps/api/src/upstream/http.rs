//! reqwest-backed [`JobAssistantApi`] speaking the WorkMate backend's JSON API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{JobAssistantApi, QuestionRequest, ResumeFile, UpstreamError};
use crate::models::job::{JobPosting, SortOption};
use crate::models::profile::Profile;
use crate::models::tailoring::TailoredContent;
use crate::session::resolver::Credential;

/// Idempotent reads are retried this many times on 429 / 5xx / transport errors.
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Job shape on the wire. Descriptions arrive as `full_desc` and/or
/// `preview_desc`, matched jobs carry a `score`.
#[derive(Debug, Deserialize)]
struct WireJob {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    link: Option<String>,
    description: Option<String>,
    full_desc: Option<String>,
    preview_desc: Option<String>,
    date_posted: Option<String>,
    #[serde(default)]
    skills: Option<serde_json::Value>,
    #[serde(alias = "match_score")]
    score: Option<f64>,
}

impl From<WireJob> for JobPosting {
    fn from(w: WireJob) -> Self {
        // skills is sometimes a bare string rather than a list
        let skills = match w.skills {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => vec![s],
            _ => Vec::new(),
        };
        JobPosting {
            title: w.title.unwrap_or_default(),
            company: w.company.unwrap_or_default(),
            location: w.location,
            description: w
                .full_desc
                .or(w.description)
                .or(w.preview_desc)
                .unwrap_or_default(),
            skills,
            match_score: w.score,
            date_posted: w.date_posted,
            link: w.link,
        }
        .with_clamped_score()
    }
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<WireJob>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TailorResponse {
    #[serde(default)]
    success: bool,
    tailored_resume: Option<TailoredContent>,
}

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    extracted_text: String,
}

#[derive(Debug, Serialize)]
struct WireJobRequest<'a> {
    title: &'a str,
    company: &'a str,
    full_desc: &'a str,
    preview_desc: &'a str,
    skills: &'a [String],
}

/// HTTP client for the WorkMate backend.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder, credential: &Credential) -> RequestBuilder {
        req.bearer_auth(credential.token())
    }

    /// Sends an idempotent request, retrying on 429 and 5xx with exponential backoff.
    async fn send_with_retry(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, UpstreamError> {
        let mut last_error: Option<UpstreamError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 250ms, 500ms
                let delay = Duration::from_millis(250 * (1 << (attempt - 1)));
                warn!(
                    "Upstream attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build().send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(UpstreamError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Upstream returned {}: {}", status, body);
                last_error = Some(UpstreamError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(UpstreamError::Unavailable {
            retries: MAX_RETRIES,
        }))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        build: impl Fn() -> RequestBuilder,
        authed: bool,
    ) -> Result<T, UpstreamError> {
        let response = self.send_with_retry(build).await?;
        let response = check_status(response, authed).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        authed: bool,
    ) -> Result<T, UpstreamError> {
        let response = check_status(req.send().await?, authed).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_bytes(&self, req: RequestBuilder, authed: bool) -> Result<Bytes, UpstreamError> {
        let response = check_status(req.send().await?, authed).await?;
        Ok(response.bytes().await?)
    }

    fn jobs_from(response: JobsResponse) -> Result<Vec<JobPosting>, UpstreamError> {
        // The search endpoint reports scraper failures in-band with a 200.
        if let Some(message) = response.error {
            return Err(UpstreamError::Api {
                status: 200,
                message,
            });
        }
        Ok(response.jobs.into_iter().map(JobPosting::from).collect())
    }
}

/// Maps non-success statuses onto [`UpstreamError`].
///
/// `authed` marks requests that carried the session credential: a 401/403 on
/// those means the credential itself is no longer valid.
async fn check_status(response: Response, authed: bool) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);

    Err(match status {
        StatusCode::NOT_FOUND => UpstreamError::NotFound(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if authed => UpstreamError::Unauthorized,
        s if s.is_client_error() => UpstreamError::Rejected {
            status: s.as_u16(),
            detail,
        },
        s => UpstreamError::Api {
            status: s.as_u16(),
            message: detail,
        },
    })
}

fn file_part(file: &ResumeFile) -> Result<reqwest::multipart::Part, UpstreamError> {
    let part = reqwest::multipart::Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
    match &file.content_type {
        Some(ct) => Ok(part.mime_str(ct)?),
        None => Ok(part),
    }
}

#[async_trait]
impl JobAssistantApi for HttpUpstream {
    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), UpstreamError> {
        let req = self
            .client
            .post(self.url("/signup"))
            .json(&json!({ "name": name, "email": email, "password": password }));
        let _: serde_json::Value = self.send_json(req, false).await?;
        debug!("Registered account for {email}");
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<String, UpstreamError> {
        let req = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = self.send_json(req, false).await?;
        Ok(token.access_token)
    }

    async fn get_profile(&self, credential: &Credential) -> Result<Profile, UpstreamError> {
        self.get_json(
            || self.authed(self.client.get(self.url("/profile/")), credential),
            true,
        )
        .await
    }

    async fn update_profile(
        &self,
        credential: &Credential,
        profile: &Profile,
    ) -> Result<(), UpstreamError> {
        let req = self
            .authed(self.client.put(self.url("/profile/")), credential)
            .json(profile);
        let _: serde_json::Value = self.send_json(req, true).await?;
        Ok(())
    }

    async fn create_profile(
        &self,
        credential: &Credential,
        profile: &Profile,
    ) -> Result<(), UpstreamError> {
        let req = self
            .authed(self.client.post(self.url("/profile/")), credential)
            .json(profile);
        let _: serde_json::Value = self.send_json(req, true).await?;
        Ok(())
    }

    async fn search_jobs(&self, query: &str) -> Result<Vec<JobPosting>, UpstreamError> {
        let response: JobsResponse = self
            .get_json(
                || self.client.get(self.url("/jobs/search")).query(&[("query", query)]),
                false,
            )
            .await?;
        Self::jobs_from(response)
    }

    async fn match_jobs(
        &self,
        credential: &Credential,
        sort: SortOption,
    ) -> Result<Vec<JobPosting>, UpstreamError> {
        let response: JobsResponse = self
            .get_json(
                || {
                    self.authed(self.client.get(self.url("/jobs/match")), credential)
                        .query(&[("email", credential.user_id()), ("sort", sort.as_str())])
                },
                true,
            )
            .await?;
        Self::jobs_from(response)
    }

    async fn tailor_resume(
        &self,
        credential: &Credential,
        job: &JobPosting,
    ) -> Result<TailoredContent, UpstreamError> {
        let body = json!({
            "email": credential.user_id(),
            "job": WireJobRequest {
                title: &job.title,
                company: &job.company,
                full_desc: &job.description,
                preview_desc: &job.description,
                skills: &job.skills,
            },
        });
        let req = self
            .authed(self.client.post(self.url("/tailor/resume")), credential)
            .json(&body);
        let response: TailorResponse = self.send_json(req, true).await?;

        match response.tailored_resume {
            Some(content) if response.success => Ok(content),
            _ => Err(UpstreamError::Api {
                status: 200,
                message: "tailoring service reported no tailored résumé".to_string(),
            }),
        }
    }

    async fn generate_document(
        &self,
        credential: &Credential,
        profile: &Profile,
        tailored: Option<&TailoredContent>,
    ) -> Result<Bytes, UpstreamError> {
        let req = match tailored {
            Some(content) => self
                .authed(self.client.post(self.url("/tailor/generate-pdf")), credential)
                .json(&json!({
                    "email": credential.user_id(),
                    "tailored_data": content,
                    "original_profile": profile,
                })),
            None => self
                .authed(self.client.post(self.url("/generate_resume/")), credential)
                .json(profile),
        };
        self.send_bytes(req, true).await
    }

    async fn generate_interview_questions(
        &self,
        credential: &Credential,
        request: &QuestionRequest,
    ) -> Result<Vec<String>, UpstreamError> {
        let req = self
            .authed(self.client.post(self.url("/interview/generate")), credential)
            .json(&json!({
                "email": credential.user_id(),
                "job_title": request.job_title,
                "job_description": request.job_description,
                "job_skills": request.job_skills,
                "n_questions": request.n_questions,
            }));
        let response: QuestionsResponse = self.send_json(req, true).await?;
        Ok(response.questions)
    }

    async fn upload_resume(&self, file: &ResumeFile) -> Result<String, UpstreamError> {
        let form = reqwest::multipart::Form::new().part("file", file_part(file)?);
        let req = self.client.post(self.url("/resume/upload")).multipart(form);
        let response: UploadResponse = self.send_json(req, false).await?;
        Ok(response.extracted_text)
    }

    async fn autofill_profile(
        &self,
        credential: &Credential,
        file: &ResumeFile,
    ) -> Result<(), UpstreamError> {
        let form = reqwest::multipart::Form::new().part("file", file_part(file)?);
        let req = self
            .authed(self.client.post(self.url("/profile/autofill")), credential)
            .multipart(form);
        let _: serde_json::Value = self.send_json(req, true).await?;
        Ok(())
    }
}

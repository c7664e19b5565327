//! TailoringPipeline: profile + job → tailored content → document.
//!
//! Flow: Idle → Tailoring → Tailored → Generating → DocumentReady, with
//! `Failed { step }` reachable from either remote step.
//!
//! Each `tailor` starts a new run and bumps the run counter; each document
//! request bumps the request counter. Completions carry the counters they were
//! started with and are dropped if either has moved on, so a late result from a
//! superseded or abandoned run can never overwrite newer state.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::document::{DocumentInfo, DocumentSource, GeneratedDocument};
use crate::models::job::JobPosting;
use crate::models::tailoring::TailoredContent;
use crate::upstream::UpstreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Tailoring,
    Generation,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::Tailoring => write!(f, "tailoring"),
            PipelineStep::Generation => write!(f, "generation"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineStage {
    #[default]
    Idle,
    Tailoring,
    Tailored,
    Generating,
    DocumentReady,
    Failed { step: PipelineStep, message: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidJob(String),

    #[error("tailoring is still in flight for this run")]
    TailoringInFlight,

    #[error("document generation requires a completed tailoring run")]
    NotTailored,

    #[error("run {requested} is not the live tailoring run ({live})")]
    WrongRun { requested: u64, live: u64 },

    #[error("{step} failed: {source}")]
    Failed {
        step: PipelineStep,
        #[source]
        source: UpstreamError,
    },

    #[error("stale result discarded")]
    Stale,
}

/// Whether a document request uses the current run's tailored content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Plain,
    /// `run` pins the request to a specific tailoring run when the caller knows it.
    Tailored { run: Option<u64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailorTicket {
    run: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateTicket {
    run: u64,
    request: u64,
}

#[derive(Debug, Serialize)]
pub struct PipelineView {
    pub run: u64,
    #[serde(flatten)]
    pub stage: PipelineStage,
    pub job: Option<JobPosting>,
    pub tailored: Option<TailoredContent>,
    pub document: Option<DocumentInfo>,
}

#[derive(Debug, Default)]
pub struct TailoringPipeline {
    run: u64,
    request: u64,
    stage: PipelineStage,
    job: Option<JobPosting>,
    tailored: Option<TailoredContent>,
    document: Option<GeneratedDocument>,
}

impl TailoringPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage.clone()
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn tailored(&self) -> Option<&TailoredContent> {
        self.tailored.as_ref()
    }

    pub fn document(&self) -> Option<&GeneratedDocument> {
        self.document.as_ref()
    }

    pub fn view(&self) -> PipelineView {
        PipelineView {
            run: self.run,
            stage: self.stage(),
            job: self.job.clone(),
            tailored: self.tailored.clone(),
            document: self.document.as_ref().map(GeneratedDocument::info),
        }
    }

    /// Starts a new run for `job`, superseding any run still in flight.
    pub fn begin_tailor(&mut self, job: &JobPosting) -> Result<TailorTicket, PipelineError> {
        if job.title.trim().is_empty() {
            return Err(PipelineError::InvalidJob(
                "job title cannot be empty".to_string(),
            ));
        }
        if self.stage() == PipelineStage::Tailoring {
            info!("Tailoring run {} superseded", self.run);
        }
        self.run += 1;
        self.job = Some(job.clone());
        self.tailored = None;
        self.stage = PipelineStage::Tailoring;
        Ok(TailorTicket { run: self.run })
    }

    pub fn complete_tailor(
        &mut self,
        ticket: TailorTicket,
        outcome: Result<TailoredContent, UpstreamError>,
    ) -> Result<&TailoredContent, PipelineError> {
        if ticket.run != self.run || self.stage() != PipelineStage::Tailoring {
            debug!("Discarding tailoring result for superseded run {}", ticket.run);
            return Err(PipelineError::Stale);
        }

        match outcome {
            Ok(mut content) => {
                // Content is bound to the run's job, whatever the service echoed back.
                if let Some(job) = &self.job {
                    content.job_title = job.title.clone();
                    content.company = job.company.clone();
                }
                self.stage = PipelineStage::Tailored;
                Ok(&*self.tailored.insert(content))
            }
            Err(source) => {
                self.stage = PipelineStage::Failed {
                    step: PipelineStep::Tailoring,
                    message: source.to_string(),
                };
                Err(PipelineError::Failed {
                    step: PipelineStep::Tailoring,
                    source,
                })
            }
        }
    }

    /// Starts a document request. The current document is released first so a
    /// stale one can never be presented as the result of this request.
    ///
    /// Plain generation starts its own run, which supersedes any tailoring.
    pub fn begin_generate(
        &mut self,
        mode: GenerationMode,
    ) -> Result<(GenerateTicket, Option<TailoredContent>), PipelineError> {
        let tailored = match mode {
            GenerationMode::Tailored { run } => {
                if let Some(requested) = run.filter(|r| *r != self.run) {
                    return Err(PipelineError::WrongRun {
                        requested,
                        live: self.run,
                    });
                }
                if self.stage() == PipelineStage::Tailoring {
                    return Err(PipelineError::TailoringInFlight);
                }
                Some(self.tailored.clone().ok_or(PipelineError::NotTailored)?)
            }
            GenerationMode::Plain => {
                self.run += 1;
                self.job = None;
                self.tailored = None;
                None
            }
        };

        self.release_document();
        self.request += 1;
        self.stage = PipelineStage::Generating;
        Ok((
            GenerateTicket {
                run: self.run,
                request: self.request,
            },
            tailored,
        ))
    }

    pub fn complete_generate(
        &mut self,
        ticket: GenerateTicket,
        outcome: Result<Bytes, UpstreamError>,
    ) -> Result<&GeneratedDocument, PipelineError> {
        if ticket.run != self.run
            || ticket.request != self.request
            || self.stage() != PipelineStage::Generating
        {
            debug!(
                "Discarding document for superseded request {}/{}",
                ticket.run, ticket.request
            );
            return Err(PipelineError::Stale);
        }

        let outcome = outcome.and_then(|bytes| {
            if bytes.is_empty() {
                Err(UpstreamError::Api {
                    status: 200,
                    message: "backend returned an empty document".to_string(),
                })
            } else {
                Ok(bytes)
            }
        });

        match outcome {
            Ok(bytes) => {
                let source = match &self.tailored {
                    Some(t) => DocumentSource::Tailored {
                        job_title: t.job_title.clone(),
                        company: t.company.clone(),
                    },
                    None => DocumentSource::Plain,
                };
                let document = GeneratedDocument::new(bytes, source);
                info!(
                    "Document {} ready ({} bytes, run {})",
                    document.handle,
                    document.bytes.len(),
                    self.run
                );
                self.stage = PipelineStage::DocumentReady;
                Ok(&*self.document.insert(document))
            }
            Err(source) => {
                self.stage = PipelineStage::Failed {
                    step: PipelineStep::Generation,
                    message: source.to_string(),
                };
                Err(PipelineError::Failed {
                    step: PipelineStep::Generation,
                    source,
                })
            }
        }
    }

    /// Releases the current document, returning its handle if there was one.
    pub fn release_document(&mut self) -> Option<Uuid> {
        let released = self.document.take()?;
        info!("Released document {}", released.handle);
        if self.stage() == PipelineStage::DocumentReady {
            self.stage = if self.tailored.is_some() {
                PipelineStage::Tailored
            } else {
                PipelineStage::Idle
            };
        }
        Some(released.handle)
    }

    /// Abandons the live run locally. Remote work is not cancelled; its result
    /// is discarded when it arrives. A finished document stays downloadable.
    pub fn abandon(&mut self) {
        if matches!(
            self.stage(),
            PipelineStage::Tailoring | PipelineStage::Generating
        ) {
            info!("Abandoned pipeline run {}", self.run);
        }
        self.run += 1;
        self.job = None;
        self.tailored = None;
        self.stage = PipelineStage::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::sample_job;

    fn content(summary: &str) -> TailoredContent {
        TailoredContent {
            job_title: String::new(),
            company: String::new(),
            summary: summary.to_string(),
            skills: vec!["Rust".to_string()],
            experience: vec![],
            projects: vec![],
        }
    }

    fn unavailable() -> UpstreamError {
        UpstreamError::Api {
            status: 503,
            message: "down".to_string(),
        }
    }

    #[test]
    fn test_tailor_then_generate_reaches_document_ready() {
        let mut pipeline = TailoringPipeline::new();
        let ticket = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        pipeline.complete_tailor(ticket, Ok(content("s"))).unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Tailored);

        let (ticket, tailored) = pipeline
            .begin_generate(GenerationMode::Tailored { run: None })
            .unwrap();
        assert!(tailored.is_some());
        let doc = pipeline
            .complete_generate(ticket, Ok(Bytes::from_static(b"%PDF")))
            .unwrap();
        assert_eq!(
            doc.source,
            DocumentSource::Tailored {
                job_title: "Rust Engineer".to_string(),
                company: "Globex".to_string()
            }
        );
        assert_eq!(pipeline.stage(), PipelineStage::DocumentReady);
    }

    #[test]
    fn test_tailored_generation_before_tailor_is_rejected() {
        let mut pipeline = TailoringPipeline::new();
        assert!(matches!(
            pipeline.begin_generate(GenerationMode::Tailored { run: None }),
            Err(PipelineError::NotTailored)
        ));

        pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        assert!(matches!(
            pipeline.begin_generate(GenerationMode::Tailored { run: None }),
            Err(PipelineError::TailoringInFlight)
        ));
        assert_eq!(pipeline.stage(), PipelineStage::Tailoring);
    }

    #[test]
    fn test_generation_pinned_to_old_run_is_rejected() {
        let mut pipeline = TailoringPipeline::new();
        let ticket = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        pipeline.complete_tailor(ticket, Ok(content("s"))).unwrap();
        let old_run = pipeline.run();

        pipeline.begin_tailor(&sample_job("Go Engineer")).unwrap();
        let err = pipeline
            .begin_generate(GenerationMode::Tailored { run: Some(old_run) })
            .unwrap_err();
        assert!(matches!(err, PipelineError::WrongRun { .. }));
    }

    #[test]
    fn test_second_tailor_supersedes_first() {
        let mut pipeline = TailoringPipeline::new();
        let first = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        let second = pipeline.begin_tailor(&sample_job("Go Engineer")).unwrap();

        pipeline.complete_tailor(second, Ok(content("second"))).unwrap();
        assert!(matches!(
            pipeline.complete_tailor(first, Ok(content("first"))),
            Err(PipelineError::Stale)
        ));

        let tailored = pipeline.tailored().unwrap();
        assert_eq!(tailored.summary, "second");
        assert_eq!(tailored.job_title, "Go Engineer");
    }

    #[test]
    fn test_late_first_result_arriving_before_second_is_still_dropped() {
        let mut pipeline = TailoringPipeline::new();
        let first = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        let _second = pipeline.begin_tailor(&sample_job("Go Engineer")).unwrap();

        assert!(matches!(
            pipeline.complete_tailor(first, Ok(content("first"))),
            Err(PipelineError::Stale)
        ));
        assert_eq!(pipeline.stage(), PipelineStage::Tailoring);
        assert!(pipeline.tailored().is_none());
    }

    #[test]
    fn test_tailoring_failure_records_step_and_allows_retry() {
        let mut pipeline = TailoringPipeline::new();
        let ticket = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        let err = pipeline.complete_tailor(ticket, Err(unavailable())).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Failed {
                step: PipelineStep::Tailoring,
                ..
            }
        ));
        assert!(matches!(
            pipeline.stage(),
            PipelineStage::Failed {
                step: PipelineStep::Tailoring,
                ..
            }
        ));
        assert!(pipeline.begin_generate(GenerationMode::Tailored { run: None }).is_err());

        let ticket = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        assert!(pipeline.complete_tailor(ticket, Ok(content("s"))).is_ok());
    }

    #[test]
    fn test_new_generation_releases_previous_document_first() {
        let mut pipeline = TailoringPipeline::new();
        let (ticket, _) = pipeline.begin_generate(GenerationMode::Plain).unwrap();
        let first = pipeline
            .complete_generate(ticket, Ok(Bytes::from_static(b"%PDF-1")))
            .unwrap()
            .handle;

        let (ticket, _) = pipeline.begin_generate(GenerationMode::Plain).unwrap();
        assert!(pipeline.document().is_none());
        pipeline.complete_generate(ticket, Err(unavailable())).unwrap_err();
        assert!(pipeline.document().is_none());

        let (ticket, _) = pipeline.begin_generate(GenerationMode::Plain).unwrap();
        let third = pipeline
            .complete_generate(ticket, Ok(Bytes::from_static(b"%PDF-3")))
            .unwrap()
            .handle;
        assert_ne!(first, third);
    }

    #[test]
    fn test_superseded_document_request_is_discarded() {
        let mut pipeline = TailoringPipeline::new();
        let (first, _) = pipeline.begin_generate(GenerationMode::Plain).unwrap();
        let (second, _) = pipeline.begin_generate(GenerationMode::Plain).unwrap();
        assert!(matches!(
            pipeline.complete_generate(first, Ok(Bytes::from_static(b"old"))),
            Err(PipelineError::Stale)
        ));
        pipeline
            .complete_generate(second, Ok(Bytes::from_static(b"new")))
            .unwrap();
        assert_eq!(pipeline.document().unwrap().bytes, Bytes::from_static(b"new"));
    }

    #[test]
    fn test_empty_document_counts_as_generation_failure() {
        let mut pipeline = TailoringPipeline::new();
        let (ticket, _) = pipeline.begin_generate(GenerationMode::Plain).unwrap();
        assert!(pipeline.complete_generate(ticket, Ok(Bytes::new())).is_err());
        assert!(matches!(
            pipeline.stage(),
            PipelineStage::Failed {
                step: PipelineStep::Generation,
                ..
            }
        ));
    }

    #[test]
    fn test_generation_failure_keeps_tailored_content_for_retry() {
        let mut pipeline = TailoringPipeline::new();
        let ticket = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        pipeline.complete_tailor(ticket, Ok(content("s"))).unwrap();

        let (ticket, _) = pipeline
            .begin_generate(GenerationMode::Tailored { run: None })
            .unwrap();
        pipeline.complete_generate(ticket, Err(unavailable())).unwrap_err();

        assert!(pipeline
            .begin_generate(GenerationMode::Tailored { run: None })
            .is_ok());
    }

    #[test]
    fn test_abandon_discards_inflight_result() {
        let mut pipeline = TailoringPipeline::new();
        let ticket = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        pipeline.abandon();
        assert!(matches!(
            pipeline.complete_tailor(ticket, Ok(content("late"))),
            Err(PipelineError::Stale)
        ));
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
        assert!(pipeline.tailored().is_none());
    }

    #[test]
    fn test_release_document_returns_to_tailored() {
        let mut pipeline = TailoringPipeline::new();
        let ticket = pipeline.begin_tailor(&sample_job("Rust Engineer")).unwrap();
        pipeline.complete_tailor(ticket, Ok(content("s"))).unwrap();
        let (ticket, _) = pipeline
            .begin_generate(GenerationMode::Tailored { run: None })
            .unwrap();
        let handle = pipeline
            .complete_generate(ticket, Ok(Bytes::from_static(b"%PDF")))
            .unwrap()
            .handle;

        assert_eq!(pipeline.release_document(), Some(handle));
        assert_eq!(pipeline.release_document(), None);
        assert_eq!(pipeline.stage(), PipelineStage::Tailored);
    }

    #[test]
    fn test_blank_job_title_is_rejected_before_any_state_change() {
        let mut pipeline = TailoringPipeline::new();
        assert!(matches!(
            pipeline.begin_tailor(&sample_job(" ")),
            Err(PipelineError::InvalidJob(_))
        ));
        assert_eq!(pipeline.run(), 0);
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
    }
}

//! The session's interview slot: tracks whether questions are being
//! generated, failed to generate, or are being answered.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::interview::questions::normalize_questions;
use crate::interview::session::{InterviewError, InterviewSession, InterviewView};
use crate::models::job::JobPosting;
use crate::upstream::UpstreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTicket(u64);

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    NotStarted,
    Generating,
    Failed(String),
    Ready(InterviewSession),
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotView {
    NotStarted,
    Generating,
    Failed { message: String, retryable: bool },
    Ready(InterviewView),
}

#[derive(Debug, Default)]
pub struct InterviewSlot {
    generation: u64,
    job: Option<JobPosting>,
    state: SlotState,
}

impl InterviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts question generation for `job`. A newer start supersedes an older
    /// one; a missing job fails fast.
    pub fn begin(&mut self, job: Option<&JobPosting>) -> Result<QuestionTicket, InterviewError> {
        let job = job.ok_or(InterviewError::NoPrompts)?;
        self.generation += 1;
        self.job = Some(job.clone());
        self.state = SlotState::Generating;
        Ok(QuestionTicket(self.generation))
    }

    /// Applies the generator's outcome. Zero usable prompts leaves the slot
    /// unstarted ("no prompts"); a failed call leaves a retryable failure.
    pub fn complete(
        &mut self,
        ticket: QuestionTicket,
        outcome: Result<Vec<String>, UpstreamError>,
        count: usize,
    ) -> Result<&InterviewSession, InterviewError> {
        if ticket.0 != self.generation || !matches!(self.state, SlotState::Generating) {
            debug!("Discarding questions for superseded generation {}", ticket.0);
            return Err(InterviewError::Stale);
        }

        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Interview question generation failed: {e}");
                self.state = SlotState::Failed(e.to_string());
                return Err(InterviewError::GenerationFailed(e));
            }
        };

        let prompts = normalize_questions(raw, count);
        let total = prompts.len();
        self.state = match InterviewSession::start(self.job.as_ref(), prompts) {
            Ok(session) => SlotState::Ready(session),
            Err(e) => {
                self.state = SlotState::NotStarted;
                return Err(e);
            }
        };
        info!("Interview started with {total} prompts");

        let SlotState::Ready(session) = &self.state else {
            return Err(InterviewError::NotStarted);
        };
        Ok(session)
    }

    /// The running interview, if questions are in place.
    pub fn session_mut(&mut self) -> Result<&mut InterviewSession, InterviewError> {
        match &mut self.state {
            SlotState::Ready(session) => Ok(session),
            SlotState::Generating => Err(InterviewError::Generating),
            SlotState::NotStarted | SlotState::Failed(_) => Err(InterviewError::NotStarted),
        }
    }

    /// Drops the interview and any in-flight generation.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.job = None;
        self.state = SlotState::NotStarted;
    }

    pub fn view(&self) -> SlotView {
        match &self.state {
            SlotState::NotStarted => SlotView::NotStarted,
            SlotState::Generating => SlotView::Generating,
            SlotState::Failed(message) => SlotView::Failed {
                message: message.clone(),
                retryable: true,
            },
            SlotState::Ready(session) => SlotView::Ready(session.view()),
        }
    }
}

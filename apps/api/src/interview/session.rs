//! InterviewSession: a fixed, ordered list of prompts answered one at a time.
//!
//! All index/transcript changes go through [`InterviewSession::apply`]; once
//! `finished` is set every further action is refused, so the transcript is
//! frozen in prompt order.

use serde::Serialize;
use thiserror::Error;

use crate::models::job::JobPosting;
use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("no prompts available")]
    NoPrompts,

    #[error("an answer is required to advance")]
    EmptyAnswer,

    #[error("the interview is already finished")]
    Finished,

    #[error("no interview has been started")]
    NotStarted,

    #[error("questions are still being generated")]
    Generating,

    #[error("question generation failed: {0}")]
    GenerationFailed(UpstreamError),

    #[error("stale result discarded")]
    Stale,
}

/// The three mutually exclusive per-prompt actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewAction {
    Advance { answer: String },
    Skip,
    Finish { answer: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
}

/// Where the session is after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Progress {
    Next { index: usize },
    Finished,
}

#[derive(Debug, Serialize)]
pub struct InterviewView {
    pub job_title: String,
    pub total: usize,
    /// Zero-based index of the prompt on screen; absent once finished.
    pub index: Option<usize>,
    pub prompt: Option<String>,
    pub draft: String,
    pub finished: bool,
    pub transcript: Vec<AnswerRecord>,
}

#[derive(Debug, Clone)]
pub struct InterviewSession {
    job: JobPosting,
    prompts: Vec<String>,
    index: usize,
    buffer: String,
    transcript: Vec<AnswerRecord>,
    finished: bool,
}

impl InterviewSession {
    /// Fails fast if there is no job or nothing to ask.
    pub fn start(job: Option<&JobPosting>, prompts: Vec<String>) -> Result<Self, InterviewError> {
        let job = job.ok_or(InterviewError::NoPrompts)?;
        if prompts.is_empty() {
            return Err(InterviewError::NoPrompts);
        }
        Ok(Self {
            job: job.clone(),
            prompts,
            index: 0,
            buffer: String::new(),
            transcript: Vec::new(),
            finished: false,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn transcript(&self) -> &[AnswerRecord] {
        &self.transcript
    }

    pub fn current_prompt(&self) -> Option<&str> {
        if self.finished {
            return None;
        }
        self.prompts.get(self.index).map(String::as_str)
    }

    /// Replaces the in-progress answer buffer.
    pub fn draft(&mut self, text: &str) -> Result<(), InterviewError> {
        if self.finished {
            return Err(InterviewError::Finished);
        }
        self.buffer = text.to_string();
        Ok(())
    }

    /// The single transition function.
    pub fn apply(&mut self, action: InterviewAction) -> Result<Progress, InterviewError> {
        if self.finished {
            return Err(InterviewError::Finished);
        }

        match action {
            InterviewAction::Advance { answer } => {
                if answer.trim().is_empty() {
                    return Err(InterviewError::EmptyAnswer);
                }
                self.record(answer);
                Ok(self.step())
            }
            InterviewAction::Skip => Ok(self.step()),
            InterviewAction::Finish { answer } => {
                if !answer.trim().is_empty() {
                    self.record(answer);
                }
                self.buffer.clear();
                self.finished = true;
                Ok(Progress::Finished)
            }
        }
    }

    fn record(&mut self, answer: String) {
        self.transcript.push(AnswerRecord {
            question: self.prompts[self.index].clone(),
            answer,
        });
    }

    fn step(&mut self) -> Progress {
        self.buffer.clear();
        if self.index + 1 < self.prompts.len() {
            self.index += 1;
            Progress::Next { index: self.index }
        } else {
            self.finished = true;
            Progress::Finished
        }
    }

    pub fn view(&self) -> InterviewView {
        InterviewView {
            job_title: self.job.title.clone(),
            total: self.prompts.len(),
            index: (!self.finished).then_some(self.index),
            prompt: self.current_prompt().map(str::to_string),
            draft: self.buffer.clone(),
            finished: self.finished,
            transcript: self.transcript.clone(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A job posting as supplied by the remote job service. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    /// 0.0 – 1.0, present only on matched postings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_posted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl JobPosting {
    /// A posting is usable for tailoring or interviews once it has a title.
    pub fn ensure_selectable(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("job title cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Clamps an out-of-range match score into [0, 1]; NaN is dropped.
    pub fn with_clamped_score(mut self) -> Self {
        self.match_score = self
            .match_score
            .filter(|s| !s.is_nan())
            .map(|s| s.clamp(0.0, 1.0));
        self
    }
}

/// Ordering requested from the match endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    BestMatch,
    Date,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::BestMatch => "best_match",
            SortOption::Date => "date",
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_job(title: &str) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        company: "Globex".to_string(),
        location: Some("Hamburg".to_string()),
        description: "Own the event pipeline. Rust and Kafka required.".to_string(),
        skills: vec!["Rust".to_string(), "Kafka".to_string()],
        match_score: None,
        date_posted: None,
        link: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_is_not_selectable() {
        let job = sample_job("  ");
        assert!(job.ensure_selectable().is_err());
        assert!(sample_job("Rust Engineer").ensure_selectable().is_ok());
    }

    #[test]
    fn test_match_score_is_clamped() {
        let mut job = sample_job("Rust Engineer");
        job.match_score = Some(1.7);
        assert_eq!(job.clone().with_clamped_score().match_score, Some(1.0));
        job.match_score = Some(-0.2);
        assert_eq!(job.clone().with_clamped_score().match_score, Some(0.0));
        job.match_score = Some(f64::NAN);
        assert_eq!(job.with_clamped_score().match_score, None);
    }

    #[test]
    fn test_sort_option_wire_names() {
        let sort: SortOption = serde_json::from_str("\"best_match\"").unwrap();
        assert_eq!(sort, SortOption::BestMatch);
        assert_eq!(SortOption::Date.as_str(), "date");
    }
}

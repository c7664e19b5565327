//! Tailored résumé content as returned by the remote tailoring service, and the
//! merge that shows what a tailored document will contain.

use serde::{Deserialize, Serialize};

use crate::models::profile::Profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredExperience {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredProject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

/// Profile content rewritten for one specific job posting.
///
/// Field names match the tailoring service's wire format so the value can be
/// handed back verbatim to document generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredContent {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company: String,
    #[serde(rename = "tailored_summary", default)]
    pub summary: String,
    #[serde(rename = "tailored_skills", default)]
    pub skills: Vec<String>,
    #[serde(rename = "tailored_experience", default)]
    pub experience: Vec<TailoredExperience>,
    #[serde(rename = "tailored_projects", default)]
    pub projects: Vec<TailoredProject>,
}

/// A profile with tailored content merged in.
#[derive(Debug, Clone, Serialize)]
pub struct TailoredProfile {
    pub summary: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
}

impl TailoredContent {
    /// Overlays the tailored sections onto `profile`.
    ///
    /// Work entries are matched by company and role, projects by title, both
    /// case-insensitively. Unmatched entries and entries whose tailored bullets
    /// are empty keep their original descriptions. An empty skill list leaves
    /// the original skills in place.
    pub fn apply_to(&self, profile: &Profile) -> TailoredProfile {
        let mut merged = profile.clone();

        if !self.skills.is_empty() {
            merged.skills = self.skills.clone();
        }

        for work in &mut merged.work {
            let tailored = self.experience.iter().find(|t| {
                t.company.eq_ignore_ascii_case(&work.company)
                    && t.role.eq_ignore_ascii_case(&work.title)
            });
            if let Some(t) = tailored.filter(|t| !t.bullets.is_empty()) {
                work.desc = t.bullets.clone();
            }
        }

        for project in &mut merged.projects {
            let tailored = self
                .projects
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(&project.title));
            if let Some(t) = tailored.filter(|t| !t.bullets.is_empty()) {
                project.desc = t.bullets.clone();
            }
        }

        let summary = Some(self.summary.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        TailoredProfile {
            summary,
            profile: merged,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    #[serde(default)]
    pub years: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgpa: Option<String>,
    #[serde(default)]
    pub desc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub dates: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub desc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub title: String,
    #[serde(default)]
    pub desc: Vec<String>,
}

/// The user's structured résumé data as stored by the remote profile service.
///
/// Every list is ordered; the order the user entered things in is the order
/// they are rendered in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub work: Vec<WorkEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
}

impl Profile {
    /// Rejects profiles the remote service would refuse, before any call is made.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.personal_info.name.trim().is_empty() {
            return Err(AppError::Validation(
                "personal_info.name cannot be empty".to_string(),
            ));
        }
        if self.personal_info.email.trim().is_empty() {
            return Err(AppError::Validation(
                "personal_info.email cannot be empty".to_string(),
            ));
        }
        if let Some(i) = self.education.iter().position(|e| e.school.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "education[{i}].school cannot be empty"
            )));
        }
        if let Some(i) = self
            .work
            .iter()
            .position(|w| w.title.trim().is_empty() || w.company.trim().is_empty())
        {
            return Err(AppError::Validation(format!(
                "work[{i}] needs both a title and a company"
            )));
        }
        if let Some(i) = self.projects.iter().position(|p| p.title.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "projects[{i}].title cannot be empty"
            )));
        }
        Ok(())
    }

    /// Trims skills and description lines and drops the empty ones, the way the
    /// profile form submits comma-separated input.
    pub fn normalized(mut self) -> Self {
        self.skills = clean_lines(self.skills);
        for entry in &mut self.education {
            entry.desc = clean_lines(std::mem::take(&mut entry.desc));
        }
        for entry in &mut self.work {
            entry.desc = clean_lines(std::mem::take(&mut entry.desc));
        }
        for entry in &mut self.projects {
            entry.desc = clean_lines(std::mem::take(&mut entry.desc));
        }
        self
    }
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) fn sample_profile(email: &str) -> Profile {
    Profile {
        personal_info: PersonalInfo {
            name: "Alice Example".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            location: "Berlin".to_string(),
            linkedin: None,
            github: Some("github.com/alice".to_string()),
        },
        skills: vec!["Rust".to_string(), "SQL".to_string(), "Kafka".to_string()],
        education: vec![EducationEntry {
            school: "TU Berlin".to_string(),
            degree: "BSc Computer Science".to_string(),
            years: "2015-2018".to_string(),
            cgpa: None,
            desc: vec![],
        }],
        work: vec![WorkEntry {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            dates: "2019-2024".to_string(),
            location: Some("Remote".to_string()),
            desc: vec!["Built the billing service".to_string()],
        }],
        projects: vec![ProjectEntry {
            title: "Ledger".to_string(),
            desc: vec!["Double-entry accounting library".to_string()],
        }],
    }
}

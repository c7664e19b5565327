//! Shaping of generated interview questions.

use crate::models::job::JobPosting;
use crate::upstream::QuestionRequest;

/// Builds the generation request for `job`.
pub fn question_request(job: &JobPosting, count: usize) -> QuestionRequest {
    QuestionRequest {
        job_title: job.title.trim().to_string(),
        job_description: job.description.clone(),
        job_skills: job.skills.clone(),
        n_questions: count,
    }
}

/// Normalises generator output into at most `count` prompts.
///
/// The generator sometimes returns one multi-line blob, sometimes one item per
/// question, usually numbered ("1. ...", "2) ...", "- ..."). Items are split on
/// newlines, list markers stripped, blanks dropped, and the order preserved.
pub fn normalize_questions(raw: Vec<String>, count: usize) -> Vec<String> {
    raw.iter()
        .flat_map(|item| item.lines())
        .map(strip_list_marker)
        .filter(|q| !q.is_empty())
        .take(count)
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim().trim_start_matches(['-', '•', '*']).trim_start();
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        // a marker is a number, a delimiter, then a space ("2PC" and "3.5" are not)
        if let Some(rest) = line[digits..].strip_prefix(['.', ')', ':']) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest.trim();
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::sample_job;

    #[test]
    fn test_numbered_blob_is_split_and_stripped() {
        let raw = vec!["1. What is ownership?\n2) Explain Send vs Sync.\n\n- Why async?".to_string()];
        assert_eq!(
            normalize_questions(raw, 5),
            vec!["What is ownership?", "Explain Send vs Sync.", "Why async?"]
        );
    }

    #[test]
    fn test_output_is_truncated_to_count() {
        let raw: Vec<String> = (1..=8).map(|i| format!("{i}. Question {i}")).collect();
        let questions = normalize_questions(raw, 5);
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[4], "Question 5");
    }

    #[test]
    fn test_blank_output_yields_no_prompts() {
        let raw = vec!["   ".to_string(), "\n\n".to_string(), "3.".to_string()];
        assert!(normalize_questions(raw, 5).is_empty());
    }

    #[test]
    fn test_leading_decimal_is_not_a_marker() {
        let raw = vec![
            "3.5 million users hit your API, how do you scale?".to_string(),
            "2. 10:1 read/write ratio: which cache?".to_string(),
        ];
        assert_eq!(
            normalize_questions(raw, 5),
            vec![
                "3.5 million users hit your API, how do you scale?",
                "10:1 read/write ratio: which cache?"
            ]
        );
    }

    #[test]
    fn test_leading_digits_without_delimiter_are_kept() {
        let raw = vec!["4. 2PC or Paxos for this design?".to_string()];
        assert_eq!(
            normalize_questions(raw, 5),
            vec!["2PC or Paxos for this design?"]
        );
    }

    #[test]
    fn test_unnumbered_questions_pass_through() {
        let raw = vec!["How would you shard a queue?".to_string()];
        assert_eq!(
            normalize_questions(raw, 5),
            vec!["How would you shard a queue?"]
        );
    }

    #[test]
    fn test_question_request_carries_job_fields() {
        let job = sample_job(" Rust Engineer ");
        let request = question_request(&job, 5);
        assert_eq!(request.job_title, "Rust Engineer");
        assert_eq!(request.job_skills, job.skills);
        assert_eq!(request.n_questions, 5);
    }
}

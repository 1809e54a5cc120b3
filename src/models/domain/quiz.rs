use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub policy_id: Option<i64>, // owning policy/document, opaque to the engine
    pub created_by: String,
    pub passing_score: i32, // percentage, 0-100
    pub time_limit_minutes: Option<i32>,
    pub max_attempts: i32,
    pub question_pool_size: Option<usize>,
    pub randomize_questions: bool,
    pub randomize_options: bool,
    pub status: QuizStatus,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub generate_certificate: bool,
    pub allow_partial_credit: bool,
    pub is_active: bool,
    pub sections: Vec<QuizSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum QuizStatus {
    Draft,
    Published,
    Scheduled,
    Archived,
}

/// Sections group questions for presentation. They are embedded on the
/// quiz record rather than stored as their own collection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizSection {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub section_order: i32,
}

impl Quiz {
    pub fn new_draft(title: &str, created_by: &str, passing_score: i32, max_attempts: i32) -> Self {
        Quiz {
            id: 0,
            title: title.to_string(),
            description: None,
            policy_id: None,
            created_by: created_by.to_string(),
            passing_score,
            time_limit_minutes: None,
            max_attempts,
            question_pool_size: None,
            randomize_questions: false,
            randomize_options: false,
            status: QuizStatus::Draft,
            scheduled_start: None,
            scheduled_end: None,
            generate_certificate: false,
            allow_partial_credit: false,
            is_active: true,
            sections: Vec::new(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_draft_defaults() {
        let quiz = Quiz::new_draft("Safety Basics", "user-1", 70, 3);

        assert_eq!(quiz.status, QuizStatus::Draft);
        assert!(quiz.is_active);
        assert_eq!(quiz.passing_score, 70);
        assert_eq!(quiz.max_attempts, 3);
        assert!(quiz.sections.is_empty());
    }

    #[test]
    fn quiz_status_round_trip_serialization() {
        let variants = [
            QuizStatus::Draft,
            QuizStatus::Published,
            QuizStatus::Scheduled,
            QuizStatus::Archived,
        ];

        for variant in variants {
            let json = serde_json::to_string(&variant).expect("variant should serialize");
            let parsed: QuizStatus =
                serde_json::from_str(&json).expect("variant should deserialize");
            assert_eq!(variant, parsed);
        }
    }
}

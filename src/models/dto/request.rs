use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::models::domain::attempt::ResponsePayload;
use crate::models::domain::question::{DifficultyLevel, QuestionBody};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub policy_id: Option<i64>,

    #[validate(range(min = 0, max = 100))]
    pub passing_score: i32,

    #[validate(range(min = 1))]
    pub time_limit_minutes: Option<i32>,

    #[validate(range(min = 1))]
    pub max_attempts: i32,

    pub question_pool_size: Option<usize>,

    #[serde(default)]
    pub randomize_questions: bool,

    #[serde(default)]
    pub randomize_options: bool,

    #[serde(default)]
    pub generate_certificate: bool,

    #[serde(default)]
    pub allow_partial_credit: bool,

    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,

    #[serde(default)]
    pub sections: Vec<SectionInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SectionInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    pub description: Option<String>,

    pub section_order: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,

    pub explanation: Option<String>,

    #[validate(range(min = 0.01))]
    pub points: f64,

    pub section_id: Option<i64>,

    /// Defaults to the quiz-level allow_partial_credit flag when absent.
    pub partial_credit_enabled: Option<bool>,

    #[serde(default)]
    pub negative_marking: bool,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub negative_points: f64,

    #[serde(default)]
    pub difficulty_level: DifficultyLevel,

    pub body: QuestionBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: i64,
    /// None marks the question as skipped.
    pub response: Option<ResponsePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ManualGradeRequest {
    pub question_id: i64,

    #[validate(range(min = 0.0))]
    pub grade: f64,

    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsvImportRequest {
    pub csv: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_quiz_request() -> CreateQuizRequest {
        CreateQuizRequest {
            title: "Safety Basics".to_string(),
            description: None,
            policy_id: None,
            passing_score: 70,
            time_limit_minutes: Some(30),
            max_attempts: 3,
            question_pool_size: None,
            randomize_questions: false,
            randomize_options: false,
            generate_certificate: true,
            allow_partial_credit: false,
            scheduled_start: None,
            scheduled_end: None,
            sections: vec![],
        }
    }

    #[test]
    fn test_valid_create_quiz_request() {
        assert!(valid_quiz_request().validate().is_ok());
    }

    #[test]
    fn test_passing_score_out_of_range() {
        let mut request = valid_quiz_request();
        request.passing_score = 120;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let mut request = valid_quiz_request();
        request.max_attempts = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_question_requires_positive_points() {
        let request = CreateQuestionRequest {
            text: "What is 2 + 2?".to_string(),
            explanation: None,
            points: 0.0,
            section_id: None,
            partial_credit_enabled: None,
            negative_marking: false,
            negative_points: 0.0,
            difficulty_level: DifficultyLevel::Easy,
            body: QuestionBody::TrueFalse {
                correct_value: true,
            },
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_manual_grade_rejects_negative() {
        let request = ManualGradeRequest {
            question_id: 1,
            grade: -1.0,
            feedback: None,
        };
        assert!(request.validate().is_err());
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::question::{MatchPair, QuestionType};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub attempt_number: i32,
    pub status: AttemptStatus,
    /// The question set served for this attempt, fixed at start time.
    pub question_ids: Vec<i64>,
    pub score: f64,
    pub max_score: f64,
    pub percentage: i32,
    pub passed: bool,
    pub requires_manual_review: bool,
    pub answers: Vec<Answer>,
    pub certificate_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Abandoned,
    Expired,
    PendingReview,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "InProgress",
            AttemptStatus::Completed => "Completed",
            AttemptStatus::Abandoned => "Abandoned",
            AttemptStatus::Expired => "Expired",
            AttemptStatus::PendingReview => "PendingReview",
        }
    }

    /// Attempts in these states count toward the max-attempts limit and
    /// form the analytics scoring population.
    pub fn is_scored(&self) -> bool {
        matches!(self, AttemptStatus::Completed | AttemptStatus::PendingReview)
    }
}

/// One graded answer per served question. `question_type` is copied at
/// grading time so analytics stay valid if the question is later edited.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Answer {
    pub question_id: i64,
    pub question_type: QuestionType,
    pub response: Option<ResponsePayload>,
    pub is_correct: bool,
    pub is_partially_correct: bool,
    pub points_earned: f64,
    pub max_points: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_by: Option<String>,
}

impl Answer {
    pub fn was_answered(&self) -> bool {
        self.response.is_some()
    }

    pub fn awaiting_manual_grade(&self) -> bool {
        self.question_type == QuestionType::Essay && self.manual_grade.is_none()
    }
}

/// The raw submitted response, one shape per question type.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind")]
pub enum ResponsePayload {
    Choice { selected: String },
    Boolean { selected: bool },
    MultiChoice { selected: Vec<String> },
    Text { text: String },
    Blanks { values: Vec<String> },
    Matches { pairs: Vec<MatchPair> },
    Sequence { ordered: Vec<String> },
    Rating { value: i32 },
    Point { x: f64, y: f64 },
}

impl fmt::Display for ResponsePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponsePayload::Choice { selected } => write!(f, "{}", selected),
            ResponsePayload::Boolean { selected } => write!(f, "{}", selected),
            ResponsePayload::MultiChoice { selected } => write!(f, "{}", selected.join(", ")),
            ResponsePayload::Text { text } => write!(f, "{}", text),
            ResponsePayload::Blanks { values } => write!(f, "{}", values.join(" | ")),
            ResponsePayload::Matches { pairs } => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|p| format!("{}->{}", p.left, p.right))
                    .collect();
                write!(f, "{}", rendered.join(", "))
            }
            ResponsePayload::Sequence { ordered } => write!(f, "{}", ordered.join(" > ")),
            ResponsePayload::Rating { value } => write!(f, "{}", value),
            ResponsePayload::Point { x, y } => write!(f, "({}, {})", x, y),
        }
    }
}

impl Attempt {
    /// Recompute the derived fields from the answer snapshot. These are
    /// cached projections, never written directly by callers.
    pub fn recompute_totals(&mut self, passing_score: i32) {
        self.score = round2(self.answers.iter().map(|a| a.points_earned).sum());
        self.requires_manual_review = self.answers.iter().any(|a| a.awaiting_manual_grade());
        self.percentage = if self.max_score > 0.0 {
            (((self.score / self.max_score) * 100.0).round() as i32).clamp(0, 100)
        } else {
            0
        };
        self.passed = self.percentage >= passing_score && !self.requires_manual_review;
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_type: QuestionType, points_earned: f64, max_points: f64) -> Answer {
        Answer {
            question_id: 1,
            question_type,
            response: Some(ResponsePayload::Choice {
                selected: "A".to_string(),
            }),
            is_correct: points_earned >= max_points,
            is_partially_correct: false,
            points_earned,
            max_points,
            manual_grade: None,
            manual_feedback: None,
            graded_by: None,
        }
    }

    fn attempt_with(answers: Vec<Answer>, max_score: f64) -> Attempt {
        Attempt {
            id: 1,
            quiz_id: 1,
            user_id: "user-1".to_string(),
            user_name: None,
            user_email: None,
            attempt_number: 1,
            status: AttemptStatus::InProgress,
            question_ids: answers.iter().map(|a| a.question_id).collect(),
            score: 0.0,
            max_score,
            percentage: 0,
            passed: false,
            requires_manual_review: false,
            answers,
            certificate_id: None,
            start_time: Utc::now(),
            end_time: None,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    #[test]
    fn recompute_totals_derives_percentage_and_passed() {
        let mut attempt = attempt_with(
            vec![
                answer(QuestionType::MultipleChoice, 10.0, 10.0),
                answer(QuestionType::ShortAnswer, 5.0, 10.0),
            ],
            20.0,
        );

        attempt.recompute_totals(70);
        assert_eq!(attempt.score, 15.0);
        assert_eq!(attempt.percentage, 75);
        assert!(attempt.passed);

        attempt.recompute_totals(80);
        assert!(!attempt.passed);
    }

    #[test]
    fn negative_score_clamps_percentage_to_zero() {
        let mut attempt = attempt_with(vec![answer(QuestionType::MultipleSelect, -5.0, 10.0)], 10.0);

        attempt.recompute_totals(70);
        assert_eq!(attempt.score, -5.0); // raw score stays unfloored
        assert_eq!(attempt.percentage, 0);
        assert!(!attempt.passed);
    }

    #[test]
    fn pending_essay_blocks_passed() {
        let mut essay = answer(QuestionType::Essay, 0.0, 5.0);
        essay.response = Some(ResponsePayload::Text {
            text: "draft".to_string(),
        });
        let mut attempt = attempt_with(
            vec![answer(QuestionType::MultipleChoice, 5.0, 5.0), essay],
            10.0,
        );

        attempt.recompute_totals(50);
        assert!(attempt.requires_manual_review);
        assert!(!attempt.passed);
        assert_eq!(attempt.percentage, 50);
    }

    #[test]
    fn zero_max_score_yields_zero_percentage() {
        let mut attempt = attempt_with(vec![], 0.0);
        attempt.recompute_totals(70);
        assert_eq!(attempt.percentage, 0);
    }

    #[test]
    fn response_payload_renders_stable_strings() {
        let multi = ResponsePayload::MultiChoice {
            selected: vec!["A".to_string(), "C".to_string()],
        };
        assert_eq!(multi.to_string(), "A, C");

        let matches = ResponsePayload::Matches {
            pairs: vec![MatchPair {
                left: "Oxygen".to_string(),
                right: "O".to_string(),
            }],
        };
        assert_eq!(matches.to_string(), "Oxygen->O");

        let point = ResponsePayload::Point { x: 4.0, y: 2.5 };
        assert_eq!(point.to_string(), "(4, 2.5)");
    }
}

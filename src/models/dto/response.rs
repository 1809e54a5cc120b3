use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::attempt::{Attempt, AttemptStatus};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The attempt as seen by the taker: derived totals without the full
/// graded snapshot.
#[derive(Debug, Serialize)]
pub struct AttemptSummaryDto {
    pub id: i64,
    pub quiz_id: i64,
    pub attempt_number: i32,
    pub status: AttemptStatus,
    pub score: f64,
    pub max_score: f64,
    pub percentage: i32,
    pub passed: bool,
    pub requires_manual_review: bool,
    pub certificate_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&Attempt> for AttemptSummaryDto {
    fn from(attempt: &Attempt) -> Self {
        AttemptSummaryDto {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            attempt_number: attempt.attempt_number,
            status: attempt.status,
            score: attempt.score,
            max_score: attempt.max_score,
            percentage: attempt.percentage,
            passed: attempt.passed,
            requires_manual_review: attempt.requires_manual_review,
            certificate_id: attempt.certificate_id,
            start_time: attempt.start_time,
            end_time: attempt.end_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PagedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
}

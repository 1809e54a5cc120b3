use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::attempt::{Attempt, AttemptStatus};
use crate::models::domain::quiz::{Quiz, QuizStatus};

#[derive(Clone, Debug, Serialize)]
pub struct Eligibility {
    pub can_take: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub attempts_remaining: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_available_date: Option<DateTime<Utc>>,
}

impl Eligibility {
    fn denied(reason: &str) -> Self {
        Eligibility {
            can_take: false,
            reason: Some(reason.to_string()),
            attempts_remaining: 0,
            next_available_date: None,
        }
    }
}

pub struct EligibilityService;

impl EligibilityService {
    /// Decide whether the user may start a new attempt right now. The
    /// first failing rule wins and carries the reason.
    pub fn evaluate(quiz: &Quiz, prior_attempts: &[Attempt], now: DateTime<Utc>) -> Eligibility {
        if !quiz.is_active || quiz.status == QuizStatus::Draft {
            return Eligibility::denied("Quiz is not published");
        }

        if quiz.status == QuizStatus::Archived {
            return Eligibility::denied("Quiz has been archived");
        }

        if let Some(start) = quiz.scheduled_start {
            if start > now {
                return Eligibility {
                    next_available_date: Some(start),
                    ..Eligibility::denied("Quiz is not yet open")
                };
            }
        }

        if let Some(end) = quiz.scheduled_end {
            if end < now {
                return Eligibility::denied("Quiz availability window has closed");
            }
        }

        let completed_count = prior_attempts
            .iter()
            .filter(|a| a.status.is_scored())
            .count() as i32;
        if completed_count >= quiz.max_attempts {
            return Eligibility::denied("Maximum attempts reached");
        }

        // Sole concurrency guard; the store backs it with a partial unique
        // index so two racing starts cannot both land.
        if prior_attempts
            .iter()
            .any(|a| a.status == AttemptStatus::InProgress)
        {
            return Eligibility::denied("An attempt is already in progress");
        }

        Eligibility {
            can_take: true,
            reason: None,
            attempts_remaining: quiz.max_attempts - completed_count,
            next_available_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{published_quiz, test_attempt};
    use chrono::Duration;

    #[test]
    fn published_quiz_with_no_attempts_is_eligible() {
        let quiz = published_quiz(1);
        let result = EligibilityService::evaluate(&quiz, &[], Utc::now());

        assert!(result.can_take);
        assert_eq!(result.attempts_remaining, quiz.max_attempts);
        assert!(result.reason.is_none());
    }

    #[test]
    fn draft_quiz_is_not_eligible() {
        let mut quiz = published_quiz(1);
        quiz.status = QuizStatus::Draft;

        let result = EligibilityService::evaluate(&quiz, &[], Utc::now());
        assert!(!result.can_take);
        assert_eq!(result.reason.as_deref(), Some("Quiz is not published"));
    }

    #[test]
    fn inactive_quiz_is_not_eligible() {
        let mut quiz = published_quiz(1);
        quiz.is_active = false;

        let result = EligibilityService::evaluate(&quiz, &[], Utc::now());
        assert!(!result.can_take);
    }

    #[test]
    fn archived_quiz_is_not_eligible() {
        let mut quiz = published_quiz(1);
        quiz.status = QuizStatus::Archived;

        let result = EligibilityService::evaluate(&quiz, &[], Utc::now());
        assert_eq!(result.reason.as_deref(), Some("Quiz has been archived"));
    }

    #[test]
    fn future_scheduled_start_reports_next_available_date() {
        let now = Utc::now();
        let start = now + Duration::hours(6);
        let mut quiz = published_quiz(1);
        quiz.status = QuizStatus::Scheduled;
        quiz.scheduled_start = Some(start);

        let result = EligibilityService::evaluate(&quiz, &[], now);
        assert!(!result.can_take);
        assert_eq!(result.next_available_date, Some(start));
    }

    #[test]
    fn past_scheduled_end_is_not_eligible() {
        let now = Utc::now();
        let mut quiz = published_quiz(1);
        quiz.scheduled_end = Some(now - Duration::hours(1));

        let result = EligibilityService::evaluate(&quiz, &[], now);
        assert!(!result.can_take);
        assert_eq!(
            result.reason.as_deref(),
            Some("Quiz availability window has closed")
        );
    }

    #[test]
    fn max_attempts_counts_completed_and_pending_review() {
        let mut quiz = published_quiz(1);
        quiz.max_attempts = 2;

        let attempts = vec![
            test_attempt(1, 1, "user-1", AttemptStatus::Completed),
            test_attempt(2, 1, "user-1", AttemptStatus::PendingReview),
        ];

        let result = EligibilityService::evaluate(&quiz, &attempts, Utc::now());
        assert!(!result.can_take);
        assert_eq!(result.attempts_remaining, 0);
        assert_eq!(result.reason.as_deref(), Some("Maximum attempts reached"));
    }

    #[test]
    fn abandoned_attempts_do_not_consume_the_limit() {
        let mut quiz = published_quiz(1);
        quiz.max_attempts = 2;

        let attempts = vec![
            test_attempt(1, 1, "user-1", AttemptStatus::Abandoned),
            test_attempt(2, 1, "user-1", AttemptStatus::Expired),
            test_attempt(3, 1, "user-1", AttemptStatus::Completed),
        ];

        let result = EligibilityService::evaluate(&quiz, &attempts, Utc::now());
        assert!(result.can_take);
        assert_eq!(result.attempts_remaining, 1);
    }

    #[test]
    fn in_progress_attempt_blocks_a_new_start() {
        let quiz = published_quiz(1);
        let attempts = vec![test_attempt(1, 1, "user-1", AttemptStatus::InProgress)];

        let result = EligibilityService::evaluate(&quiz, &attempts, Utc::now());
        assert!(!result.can_take);
        assert_eq!(
            result.reason.as_deref(),
            Some("An attempt is already in progress")
        );
    }
}

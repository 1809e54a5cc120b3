use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::{
    errors::{AppError, AppResult},
    identity::CurrentUser,
    models::domain::attempt::{round2, Attempt, AttemptStatus},
    models::domain::question::Question,
    models::domain::quiz::Quiz,
    models::dto::request::AnswerInput,
    repositories::{AttemptRepository, QuestionRepository, QuizRepository},
    services::certificate_service::CertificateService,
    services::eligibility_service::{Eligibility, EligibilityService},
    services::grading_service::GradingService,
};

pub struct AttemptService {
    quiz_repository: Arc<dyn QuizRepository>,
    question_repository: Arc<dyn QuestionRepository>,
    attempt_repository: Arc<dyn AttemptRepository>,
    certificate_service: Arc<CertificateService>,
}

impl AttemptService {
    pub fn new(
        quiz_repository: Arc<dyn QuizRepository>,
        question_repository: Arc<dyn QuestionRepository>,
        attempt_repository: Arc<dyn AttemptRepository>,
        certificate_service: Arc<CertificateService>,
    ) -> Self {
        Self {
            quiz_repository,
            question_repository,
            attempt_repository,
            certificate_service,
        }
    }

    pub async fn check_eligibility(&self, quiz_id: i64, user_id: &str) -> AppResult<Eligibility> {
        let quiz = self.get_quiz(quiz_id).await?;
        let prior = self
            .attempt_repository
            .find_by_user_and_quiz(user_id, quiz_id)
            .await?;
        Ok(EligibilityService::evaluate(&quiz, &prior, Utc::now()))
    }

    /// Start a new attempt. Re-validates eligibility and fixes the served
    /// question set so submit grades exactly what was handed out.
    pub async fn start_attempt(&self, quiz_id: i64, user: &CurrentUser) -> AppResult<Attempt> {
        let quiz = self.get_quiz(quiz_id).await?;
        let prior = self
            .attempt_repository
            .find_by_user_and_quiz(&user.id, quiz_id)
            .await?;

        let eligibility = EligibilityService::evaluate(&quiz, &prior, Utc::now());
        if !eligibility.can_take {
            return Err(AppError::NotEligible(
                eligibility
                    .reason
                    .unwrap_or_else(|| "Not eligible".to_string()),
            ));
        }

        let questions = self.question_repository.find_by_quiz(quiz_id).await?;
        if questions.is_empty() {
            return Err(AppError::ValidationError(
                "Quiz has no active questions".to_string(),
            ));
        }

        let served = Self::select_questions(&quiz, questions);
        let max_score = round2(served.iter().map(|q| q.points).sum());

        let attempt = Attempt {
            id: 0,
            quiz_id,
            user_id: user.id.clone(),
            user_name: user.display_name.clone(),
            user_email: user.email.clone(),
            attempt_number: prior.len() as i32 + 1,
            status: AttemptStatus::InProgress,
            question_ids: served.iter().map(|q| q.id).collect(),
            score: 0.0,
            max_score,
            percentage: 0,
            passed: false,
            requires_manual_review: false,
            answers: Vec::new(),
            certificate_id: None,
            start_time: Utc::now(),
            end_time: None,
            created_at: None,
            modified_at: None,
        };

        let attempt = self.attempt_repository.create(attempt).await?;
        log::info!(
            "Started attempt {} (#{}) on quiz {} for user {}",
            attempt.id,
            attempt.attempt_number,
            quiz_id,
            user.id
        );
        Ok(attempt)
    }

    fn select_questions(quiz: &Quiz, mut questions: Vec<Question>) -> Vec<Question> {
        if quiz.randomize_questions {
            questions.shuffle(&mut thread_rng());
        }
        if let Some(pool_size) = quiz.question_pool_size {
            if pool_size > 0 && pool_size < questions.len() {
                questions.truncate(pool_size);
            }
        }
        questions
    }

    /// Grade the submitted answers and close the attempt. Served questions
    /// without a submitted response are graded as skipped.
    pub async fn submit_attempt(
        &self,
        attempt_id: i64,
        answers: Vec<AnswerInput>,
    ) -> AppResult<Attempt> {
        let mut attempt = self.get_attempt(attempt_id).await?;
        if attempt.status != AttemptStatus::InProgress {
            return Err(AppError::GradingPrecondition(format!(
                "Attempt '{}' is not in progress",
                attempt_id
            )));
        }

        let quiz = self.get_quiz(attempt.quiz_id).await?;
        let questions = self
            .question_repository
            .find_by_ids(&attempt.question_ids)
            .await?;
        let questions_by_id: HashMap<i64, &Question> =
            questions.iter().map(|q| (q.id, q)).collect();

        let responses: HashMap<i64, _> = answers
            .into_iter()
            .filter_map(|a| a.response.map(|r| (a.question_id, r)))
            .collect();

        let mut graded = Vec::with_capacity(attempt.question_ids.len());
        for question_id in &attempt.question_ids {
            let question = questions_by_id.get(question_id).ok_or_else(|| {
                AppError::NotFound(format!("Question '{}' no longer exists", question_id))
            })?;
            graded.push(GradingService::grade_answer(
                question,
                responses.get(question_id),
            ));
        }

        attempt.answers = graded;
        attempt.end_time = Some(Utc::now());
        attempt.recompute_totals(quiz.passing_score);
        attempt.status = if attempt.requires_manual_review {
            AttemptStatus::PendingReview
        } else {
            AttemptStatus::Completed
        };

        let mut attempt = self.attempt_repository.update(attempt).await?;

        // Aggregate-counter step: skipped answers are not counted.
        for answer in &attempt.answers {
            if answer.was_answered() {
                self.question_repository
                    .record_answer(answer.question_id, answer.is_correct)
                    .await?;
            }
        }

        if attempt.passed && quiz.generate_certificate {
            self.certificate_service
                .issue_for_attempt(&quiz, &mut attempt)
                .await?;
        }

        log::info!(
            "Submitted attempt {}: {}/{} ({}%), status {:?}",
            attempt.id,
            attempt.score,
            attempt.max_score,
            attempt.percentage,
            attempt.status
        );
        Ok(attempt)
    }

    pub async fn abandon_attempt(&self, attempt_id: i64) -> AppResult<Attempt> {
        self.close_without_scoring(attempt_id, AttemptStatus::Abandoned)
            .await
    }

    /// Terminal transition for a timed-out attempt. The engine owns no
    /// timer; the caller decides when the limit has elapsed.
    pub async fn expire_attempt(&self, attempt_id: i64) -> AppResult<Attempt> {
        self.close_without_scoring(attempt_id, AttemptStatus::Expired)
            .await
    }

    async fn close_without_scoring(
        &self,
        attempt_id: i64,
        status: AttemptStatus,
    ) -> AppResult<Attempt> {
        let mut attempt = self.get_attempt(attempt_id).await?;
        if attempt.status != AttemptStatus::InProgress {
            return Err(AppError::GradingPrecondition(format!(
                "Attempt '{}' is not in progress",
                attempt_id
            )));
        }

        attempt.status = status;
        attempt.end_time = Some(Utc::now());
        self.attempt_repository.update(attempt).await
    }

    /// Record a manual grade for an essay answer and re-derive the
    /// attempt's totals from the full snapshot.
    pub async fn record_manual_grade(
        &self,
        attempt_id: i64,
        question_id: i64,
        grade: f64,
        feedback: Option<String>,
        reviewer_id: &str,
    ) -> AppResult<Attempt> {
        let mut attempt = self.get_attempt(attempt_id).await?;
        if !matches!(
            attempt.status,
            AttemptStatus::PendingReview | AttemptStatus::Completed
        ) {
            return Err(AppError::GradingPrecondition(format!(
                "Attempt '{}' is not awaiting review",
                attempt_id
            )));
        }

        let quiz = self.get_quiz(attempt.quiz_id).await?;

        let answer = attempt
            .answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
            .ok_or_else(|| {
                AppError::GradingPrecondition(format!(
                    "Question '{}' is not part of attempt '{}'",
                    question_id, attempt_id
                ))
            })?;

        if grade < 0.0 || grade > answer.max_points {
            return Err(AppError::ValidationError(format!(
                "Grade must be between 0 and {}",
                answer.max_points
            )));
        }

        answer.manual_grade = Some(grade);
        answer.manual_feedback = feedback;
        answer.graded_by = Some(reviewer_id.to_string());
        answer.points_earned = round2(grade);
        answer.is_correct = grade > 0.0;

        attempt.recompute_totals(quiz.passing_score);
        attempt.status = if attempt.requires_manual_review {
            AttemptStatus::PendingReview
        } else {
            AttemptStatus::Completed
        };

        let mut attempt = self.attempt_repository.update(attempt).await?;

        if attempt.passed && quiz.generate_certificate {
            self.certificate_service
                .issue_for_attempt(&quiz, &mut attempt)
                .await?;
        }

        Ok(attempt)
    }

    pub async fn get_attempt(&self, attempt_id: i64) -> AppResult<Attempt> {
        self.attempt_repository
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id)))
    }

    pub async fn list_user_attempts(
        &self,
        user_id: &str,
        quiz_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Attempt>, i64)> {
        self.attempt_repository
            .get_user_attempts(user_id, quiz_id, offset, limit)
            .await
    }

    async fn get_quiz(&self, quiz_id: i64) -> AppResult<Quiz> {
        self.quiz_repository
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::question::QuestionBody;
    use crate::test_utils::fixtures::{published_quiz, question_with_body};

    #[test]
    fn select_questions_honors_pool_size_without_randomization() {
        let mut quiz = published_quiz(1);
        quiz.question_pool_size = Some(2);

        let questions: Vec<Question> = (1..=4)
            .map(|i| {
                let mut q = question_with_body(QuestionBody::TrueFalse {
                    correct_value: true,
                });
                q.id = i;
                q.question_order = i as i32;
                q
            })
            .collect();

        let served = AttemptService::select_questions(&quiz, questions);
        assert_eq!(served.len(), 2);
        assert_eq!(served[0].id, 1);
        assert_eq!(served[1].id, 2);
    }

    #[test]
    fn select_questions_shuffle_keeps_the_full_set() {
        let mut quiz = published_quiz(1);
        quiz.randomize_questions = true;

        let questions: Vec<Question> = (1..=10)
            .map(|i| {
                let mut q = question_with_body(QuestionBody::TrueFalse {
                    correct_value: true,
                });
                q.id = i;
                q
            })
            .collect();

        let mut served_ids: Vec<i64> = AttemptService::select_questions(&quiz, questions)
            .iter()
            .map(|q| q.id)
            .collect();
        served_ids.sort_unstable();
        assert_eq!(served_ids, (1..=10).collect::<Vec<i64>>());
    }
}

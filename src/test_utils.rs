use chrono::Utc;

use crate::models::domain::attempt::{Attempt, AttemptStatus};
use crate::models::domain::question::{DifficultyLevel, Question, QuestionBody};
use crate::models::domain::quiz::{Quiz, QuizStatus};

pub mod fixtures {
    use super::*;

    /// A published, active quiz ready for eligibility checks.
    pub fn published_quiz(id: i64) -> Quiz {
        Quiz {
            id,
            title: "Safety Basics".to_string(),
            description: Some("Annual safety refresher".to_string()),
            policy_id: Some(11),
            created_by: "author-1".to_string(),
            passing_score: 70,
            time_limit_minutes: Some(30),
            max_attempts: 3,
            question_pool_size: None,
            randomize_questions: false,
            randomize_options: false,
            status: QuizStatus::Published,
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

    pub fn question_with_body(body: QuestionBody) -> Question {
        Question {
            id: 1,
            quiz_id: Some(1),
            section_id: None,
            text: "Test question".to_string(),
            explanation: None,
            points: 1.0,
            question_order: 1,
            partial_credit_enabled: false,
            negative_marking: false,
            negative_points: 0.0,
            difficulty_level: DifficultyLevel::Medium,
            times_answered: 0,
            times_correct: 0,
            is_active: true,
            body,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn test_attempt(id: i64, quiz_id: i64, user_id: &str, status: AttemptStatus) -> Attempt {
        Attempt {
            id,
            quiz_id,
            user_id: user_id.to_string(),
            user_name: None,
            user_email: None,
            attempt_number: 1,
            status,
            question_ids: Vec::new(),
            score: 0.0,
            max_score: 0.0,
            percentage: 0,
            passed: false,
            requires_manual_review: false,
            answers: Vec::new(),
            certificate_id: None,
            start_time: Utc::now(),
            end_time: None,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }
}

/// In-memory repository implementations for service-level tests.
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use crate::errors::{AppError, AppResult};
    use crate::models::domain::{Attempt, AttemptStatus, Certificate, Question, Quiz};
    use crate::repositories::{
        AttemptRepository, CertificateRepository, QuestionRepository, QuizRepository,
    };

    pub struct InMemoryQuizRepository {
        quizzes: Arc<RwLock<HashMap<i64, Quiz>>>,
        next_id: AtomicI64,
    }

    impl InMemoryQuizRepository {
        pub fn new() -> Self {
            Self {
                quizzes: Arc::new(RwLock::new(HashMap::new())),
                next_id: AtomicI64::new(1),
            }
        }
    }

    impl Default for InMemoryQuizRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl QuizRepository for InMemoryQuizRepository {
        async fn create(&self, mut quiz: Quiz) -> AppResult<Quiz> {
            quiz.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.quizzes.write().await.insert(quiz.id, quiz.clone());
            Ok(quiz)
        }

        async fn find_by_id(&self, id: i64) -> AppResult<Option<Quiz>> {
            Ok(self.quizzes.read().await.get(&id).cloned())
        }

        async fn list_quizzes(&self, offset: i64, limit: i64) -> AppResult<(Vec<Quiz>, i64)> {
            let quizzes = self.quizzes.read().await;
            let mut items: Vec<_> = quizzes.values().cloned().collect();
            items.sort_by_key(|q| q.id);

            let total = items.len() as i64;
            let start = (offset.max(0) as usize).min(items.len());
            let end = (start + limit.max(0) as usize).min(items.len());
            Ok((items[start..end].to_vec(), total))
        }

        async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
            let mut quizzes = self.quizzes.write().await;
            if !quizzes.contains_key(&quiz.id) {
                return Err(AppError::NotFound(format!(
                    "Quiz with id '{}' not found",
                    quiz.id
                )));
            }
            quizzes.insert(quiz.id, quiz.clone());
            Ok(quiz)
        }
    }

    pub struct InMemoryQuestionRepository {
        questions: Arc<RwLock<HashMap<i64, Question>>>,
        next_id: AtomicI64,
    }

    impl InMemoryQuestionRepository {
        pub fn new() -> Self {
            Self {
                questions: Arc::new(RwLock::new(HashMap::new())),
                next_id: AtomicI64::new(1),
            }
        }
    }

    impl Default for InMemoryQuestionRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl QuestionRepository for InMemoryQuestionRepository {
        async fn create(&self, mut question: Question) -> AppResult<Question> {
            question.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.questions
                .write()
                .await
                .insert(question.id, question.clone());
            Ok(question)
        }

        async fn find_by_id(&self, id: i64) -> AppResult<Option<Question>> {
            Ok(self.questions.read().await.get(&id).cloned())
        }

        async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Question>> {
            let questions = self.questions.read().await;
            Ok(ids
                .iter()
                .filter_map(|id| questions.get(id).cloned())
                .collect())
        }

        async fn find_by_quiz(&self, quiz_id: i64) -> AppResult<Vec<Question>> {
            let questions = self.questions.read().await;
            let mut items: Vec<_> = questions
                .values()
                .filter(|q| q.quiz_id == Some(quiz_id) && q.is_active)
                .cloned()
                .collect();
            items.sort_by_key(|q| q.question_order);
            Ok(items)
        }

        async fn update(&self, question: Question) -> AppResult<Question> {
            let mut questions = self.questions.write().await;
            if !questions.contains_key(&question.id) {
                return Err(AppError::NotFound(format!(
                    "Question with id '{}' not found",
                    question.id
                )));
            }
            questions.insert(question.id, question.clone());
            Ok(question)
        }

        async fn record_answer(&self, question_id: i64, correct: bool) -> AppResult<()> {
            let mut questions = self.questions.write().await;
            if let Some(question) = questions.get_mut(&question_id) {
                question.times_answered += 1;
                if correct {
                    question.times_correct += 1;
                }
            }
            Ok(())
        }
    }

    pub struct InMemoryAttemptRepository {
        attempts: Arc<RwLock<HashMap<i64, Attempt>>>,
        next_id: AtomicI64,
    }

    impl InMemoryAttemptRepository {
        pub fn new() -> Self {
            Self {
                attempts: Arc::new(RwLock::new(HashMap::new())),
                next_id: AtomicI64::new(1),
            }
        }
    }

    impl Default for InMemoryAttemptRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AttemptRepository for InMemoryAttemptRepository {
        async fn create(&self, mut attempt: Attempt) -> AppResult<Attempt> {
            let mut attempts = self.attempts.write().await;

            // Mirrors the partial unique index on (quiz_id, user_id).
            let conflicting = attempts.values().any(|a| {
                a.quiz_id == attempt.quiz_id
                    && a.user_id == attempt.user_id
                    && a.status == AttemptStatus::InProgress
            });
            if attempt.status == AttemptStatus::InProgress && conflicting {
                return Err(AppError::AlreadyExists(
                    "An attempt is already in progress for this quiz".to_string(),
                ));
            }

            attempt.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            attempts.insert(attempt.id, attempt.clone());
            Ok(attempt)
        }

        async fn find_by_id(&self, id: i64) -> AppResult<Option<Attempt>> {
            Ok(self.attempts.read().await.get(&id).cloned())
        }

        async fn find_by_user_and_quiz(
            &self,
            user_id: &str,
            quiz_id: i64,
        ) -> AppResult<Vec<Attempt>> {
            let attempts = self.attempts.read().await;
            let mut items: Vec<_> = attempts
                .values()
                .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
                .cloned()
                .collect();
            items.sort_by_key(|a| a.attempt_number);
            Ok(items)
        }

        async fn find_by_quiz(&self, quiz_id: i64) -> AppResult<Vec<Attempt>> {
            let attempts = self.attempts.read().await;
            let mut items: Vec<_> = attempts
                .values()
                .filter(|a| a.quiz_id == quiz_id)
                .cloned()
                .collect();
            items.sort_by_key(|a| a.id);
            Ok(items)
        }

        async fn get_user_attempts(
            &self,
            user_id: &str,
            quiz_id: Option<i64>,
            offset: i64,
            limit: i64,
        ) -> AppResult<(Vec<Attempt>, i64)> {
            let attempts = self.attempts.read().await;
            let mut items: Vec<_> = attempts
                .values()
                .filter(|a| {
                    a.user_id == user_id && quiz_id.map(|qid| a.quiz_id == qid).unwrap_or(true)
                })
                .cloned()
                .collect();
            items.sort_by(|a, b| b.start_time.cmp(&a.start_time));

            let total = items.len() as i64;
            let start = (offset.max(0) as usize).min(items.len());
            let end = (start + limit.max(0) as usize).min(items.len());
            Ok((items[start..end].to_vec(), total))
        }

        async fn update(&self, attempt: Attempt) -> AppResult<Attempt> {
            let mut attempts = self.attempts.write().await;
            if !attempts.contains_key(&attempt.id) {
                return Err(AppError::NotFound(format!(
                    "Attempt with id '{}' not found",
                    attempt.id
                )));
            }
            attempts.insert(attempt.id, attempt.clone());
            Ok(attempt)
        }
    }

    pub struct InMemoryCertificateRepository {
        certificates: Arc<RwLock<HashMap<i64, Certificate>>>,
        next_id: AtomicI64,
    }

    impl InMemoryCertificateRepository {
        pub fn new() -> Self {
            Self {
                certificates: Arc::new(RwLock::new(HashMap::new())),
                next_id: AtomicI64::new(1),
            }
        }
    }

    impl Default for InMemoryCertificateRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl CertificateRepository for InMemoryCertificateRepository {
        async fn create(&self, mut certificate: Certificate) -> AppResult<Certificate> {
            let mut certificates = self.certificates.write().await;
            if certificates
                .values()
                .any(|c| c.attempt_id == certificate.attempt_id)
            {
                return Err(AppError::AlreadyExists(format!(
                    "Certificate for attempt '{}' already exists",
                    certificate.attempt_id
                )));
            }
            certificate.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            certificates.insert(certificate.id, certificate.clone());
            Ok(certificate)
        }

        async fn find_by_id(&self, id: i64) -> AppResult<Option<Certificate>> {
            Ok(self.certificates.read().await.get(&id).cloned())
        }

        async fn find_by_attempt(&self, attempt_id: i64) -> AppResult<Option<Certificate>> {
            Ok(self
                .certificates
                .read()
                .await
                .values()
                .find(|c| c.attempt_id == attempt_id)
                .cloned())
        }

        async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Certificate>> {
            let certificates = self.certificates.read().await;
            let mut items: Vec<_> = certificates
                .values()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            items.sort_by_key(|c| c.id);
            Ok(items)
        }
    }
}

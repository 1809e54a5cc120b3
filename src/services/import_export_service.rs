use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{AppError, AppResult},
    models::domain::question::Question,
    models::domain::quiz::{Quiz, QuizSection, QuizStatus},
    repositories::{QuestionRepository, QuizRepository},
};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Portable quiz snapshot. Auto-generated identifiers are stripped so the
/// snapshot can be re-imported under a fresh quiz id.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuizSnapshot {
    pub version: u32,
    pub export_date: DateTime<Utc>,
    pub quiz: Quiz,
    pub sections: Vec<QuizSection>,
    pub questions: Vec<Question>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImportOptions {
    /// Attach the imported quiz to a different policy.
    pub policy_id: Option<i64>,
    /// Import as Draft regardless of the exported status.
    #[serde(default)]
    pub force_draft: bool,
}

pub struct ImportExportService {
    quiz_repository: Arc<dyn QuizRepository>,
    question_repository: Arc<dyn QuestionRepository>,
}

impl ImportExportService {
    pub fn new(
        quiz_repository: Arc<dyn QuizRepository>,
        question_repository: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            quiz_repository,
            question_repository,
        }
    }

    pub async fn export_quiz(&self, quiz_id: i64) -> AppResult<QuizSnapshot> {
        let mut quiz = self
            .quiz_repository
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))?;

        let questions = self.question_repository.find_by_quiz(quiz_id).await?;

        // Section ids are quiz-local and referenced by questions, so they
        // survive the export; the store-generated ids do not.
        let sections = std::mem::take(&mut quiz.sections);
        quiz.id = 0;
        quiz.created_at = None;
        quiz.modified_at = None;

        let questions = questions
            .into_iter()
            .map(|mut question| {
                question.id = 0;
                question.quiz_id = None;
                question.times_answered = 0;
                question.times_correct = 0;
                question.created_at = None;
                question.modified_at = None;
                question
            })
            .collect();

        Ok(QuizSnapshot {
            version: SNAPSHOT_VERSION,
            export_date: Utc::now(),
            quiz,
            sections,
            questions,
        })
    }

    pub async fn import_quiz(
        &self,
        snapshot: QuizSnapshot,
        options: ImportOptions,
        created_by: &str,
    ) -> AppResult<Quiz> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(AppError::ValidationError(format!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let mut quiz = snapshot.quiz;
        quiz.id = 0;
        quiz.created_by = created_by.to_string();
        quiz.sections = snapshot.sections;
        if let Some(policy_id) = options.policy_id {
            quiz.policy_id = Some(policy_id);
        }
        if options.force_draft {
            quiz.status = QuizStatus::Draft;
        }
        quiz.created_at = None;
        quiz.modified_at = None;

        let quiz = self.quiz_repository.create(quiz).await?;

        let mut questions = snapshot.questions;
        questions.sort_by_key(|q| q.question_order);
        for mut question in questions {
            question.id = 0;
            question.quiz_id = Some(quiz.id);
            question.times_answered = 0;
            question.times_correct = 0;
            self.question_repository.create(question).await?;
        }

        log::info!("Imported quiz '{}' as id {}", quiz.title, quiz.id);
        Ok(quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::question::QuestionBody;
    use crate::test_utils::fixtures::{published_quiz, question_with_body};
    use crate::test_utils::in_memory::{InMemoryQuestionRepository, InMemoryQuizRepository};

    fn service() -> ImportExportService {
        ImportExportService::new(
            Arc::new(InMemoryQuizRepository::new()),
            Arc::new(InMemoryQuestionRepository::new()),
        )
    }

    #[tokio::test]
    async fn export_strips_generated_identifiers() {
        let service = service();
        let quiz = service
            .quiz_repository
            .create(published_quiz(0))
            .await
            .expect("create quiz");

        let mut question = question_with_body(QuestionBody::TrueFalse {
            correct_value: true,
        });
        question.quiz_id = Some(quiz.id);
        question.times_answered = 12;
        service
            .question_repository
            .create(question)
            .await
            .expect("create question");

        let snapshot = service.export_quiz(quiz.id).await.expect("export");

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.quiz.id, 0);
        assert_eq!(snapshot.questions.len(), 1);
        assert_eq!(snapshot.questions[0].id, 0);
        assert_eq!(snapshot.questions[0].quiz_id, None);
        assert_eq!(snapshot.questions[0].times_answered, 0);
    }

    #[tokio::test]
    async fn import_recreates_quiz_under_fresh_ids() {
        let service = service();
        let quiz = service
            .quiz_repository
            .create(published_quiz(0))
            .await
            .expect("create quiz");
        let mut question = question_with_body(QuestionBody::ShortAnswer {
            accepted: vec!["42".to_string()],
            case_sensitive: false,
        });
        question.quiz_id = Some(quiz.id);
        service
            .question_repository
            .create(question)
            .await
            .expect("create question");

        let snapshot = service.export_quiz(quiz.id).await.expect("export");
        let imported = service
            .import_quiz(
                snapshot,
                ImportOptions {
                    policy_id: Some(99),
                    force_draft: true,
                },
                "importer-1",
            )
            .await
            .expect("import");

        assert_ne!(imported.id, quiz.id);
        assert_eq!(imported.status, QuizStatus::Draft);
        assert_eq!(imported.policy_id, Some(99));
        assert_eq!(imported.created_by, "importer-1");

        let questions = service
            .question_repository
            .find_by_quiz(imported.id)
            .await
            .expect("list imported questions");
        assert_eq!(questions.len(), 1);
    }

    #[tokio::test]
    async fn import_rejects_unknown_snapshot_version() {
        let service = service();
        let snapshot = QuizSnapshot {
            version: 7,
            export_date: Utc::now(),
            quiz: published_quiz(0),
            sections: vec![],
            questions: vec![],
        };

        let result = service
            .import_quiz(snapshot, ImportOptions::default(), "importer-1")
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}

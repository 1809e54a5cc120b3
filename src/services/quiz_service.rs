use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::domain::question::{Question, QuestionBody},
    models::domain::quiz::{Quiz, QuizSection, QuizStatus},
    models::dto::request::{CreateQuestionRequest, CreateQuizRequest},
    repositories::{QuestionRepository, QuizRepository},
};

pub struct QuizService {
    quiz_repository: Arc<dyn QuizRepository>,
    question_repository: Arc<dyn QuestionRepository>,
}

impl QuizService {
    pub fn new(
        quiz_repository: Arc<dyn QuizRepository>,
        question_repository: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            quiz_repository,
            question_repository,
        }
    }

    pub async fn create_quiz(
        &self,
        request: CreateQuizRequest,
        created_by: &str,
    ) -> AppResult<Quiz> {
        request.validate()?;

        let sections = request
            .sections
            .iter()
            .enumerate()
            .map(|(i, section)| QuizSection {
                id: i as i64 + 1,
                title: section.title.clone(),
                description: section.description.clone(),
                section_order: section.section_order,
            })
            .collect();

        let quiz = Quiz {
            id: 0,
            title: request.title,
            description: request.description,
            policy_id: request.policy_id,
            created_by: created_by.to_string(),
            passing_score: request.passing_score,
            time_limit_minutes: request.time_limit_minutes,
            max_attempts: request.max_attempts,
            question_pool_size: request.question_pool_size,
            randomize_questions: request.randomize_questions,
            randomize_options: request.randomize_options,
            status: QuizStatus::Draft,
            scheduled_start: request.scheduled_start,
            scheduled_end: request.scheduled_end,
            generate_certificate: request.generate_certificate,
            allow_partial_credit: request.allow_partial_credit,
            is_active: true,
            sections,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        };

        self.quiz_repository.create(quiz).await
    }

    pub async fn get_quiz(&self, id: i64) -> AppResult<Quiz> {
        self.quiz_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", id)))
    }

    pub async fn list_quizzes(&self, offset: i64, limit: i64) -> AppResult<(Vec<Quiz>, i64)> {
        self.quiz_repository.list_quizzes(offset, limit).await
    }

    /// Publish a quiz. A quiz with zero active questions never reaches
    /// eligibility because this is the only door to Published.
    pub async fn publish_quiz(&self, id: i64) -> AppResult<Quiz> {
        let mut quiz = self.get_quiz(id).await?;

        if quiz.status == QuizStatus::Archived {
            return Err(AppError::ValidationError(
                "An archived quiz cannot be published".to_string(),
            ));
        }

        let questions = self.question_repository.find_by_quiz(id).await?;
        if questions.is_empty() {
            return Err(AppError::ValidationError(
                "Cannot publish a quiz with no active questions".to_string(),
            ));
        }

        quiz.status = match quiz.scheduled_start {
            Some(start) if start > Utc::now() => QuizStatus::Scheduled,
            _ => QuizStatus::Published,
        };
        self.quiz_repository.update(quiz).await
    }

    pub async fn archive_quiz(&self, id: i64) -> AppResult<Quiz> {
        let mut quiz = self.get_quiz(id).await?;
        quiz.status = QuizStatus::Archived;
        self.quiz_repository.update(quiz).await
    }

    pub async fn add_question(
        &self,
        quiz_id: i64,
        request: CreateQuestionRequest,
    ) -> AppResult<Question> {
        request.validate()?;
        let quiz = self.get_quiz(quiz_id).await?;
        validate_body(&request.body)?;

        let existing = self.question_repository.find_by_quiz(quiz_id).await?;

        let question = Question {
            id: 0,
            quiz_id: Some(quiz_id),
            section_id: request.section_id,
            text: request.text,
            explanation: request.explanation,
            points: request.points,
            // Orders stay dense and 1-based within the quiz.
            question_order: existing.len() as i32 + 1,
            partial_credit_enabled: request
                .partial_credit_enabled
                .unwrap_or(quiz.allow_partial_credit),
            negative_marking: request.negative_marking,
            negative_points: request.negative_points,
            difficulty_level: request.difficulty_level,
            times_answered: 0,
            times_correct: 0,
            is_active: true,
            body: request.body,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        };

        self.question_repository.create(question).await
    }

    /// Replace an existing question's content. Order, counters and id are
    /// preserved; only the authored fields change.
    pub async fn update_question(
        &self,
        quiz_id: i64,
        question_id: i64,
        request: CreateQuestionRequest,
    ) -> AppResult<Question> {
        request.validate()?;
        let quiz = self.get_quiz(quiz_id).await?;
        validate_body(&request.body)?;

        let mut question = self
            .question_repository
            .find_by_id(question_id)
            .await?
            .filter(|q| q.quiz_id == Some(quiz_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Question '{}' not found on quiz '{}'",
                    question_id, quiz_id
                ))
            })?;

        question.text = request.text;
        question.explanation = request.explanation;
        question.points = request.points;
        question.section_id = request.section_id;
        question.partial_credit_enabled = request
            .partial_credit_enabled
            .unwrap_or(quiz.allow_partial_credit);
        question.negative_marking = request.negative_marking;
        question.negative_points = request.negative_points;
        question.difficulty_level = request.difficulty_level;
        question.body = request.body;

        self.question_repository.update(question).await
    }

    pub async fn list_questions(&self, quiz_id: i64) -> AppResult<Vec<Question>> {
        self.get_quiz(quiz_id).await?;
        self.question_repository.find_by_quiz(quiz_id).await
    }

    /// Deactivate a question and close the resulting gap in the order.
    pub async fn remove_question(&self, quiz_id: i64, question_id: i64) -> AppResult<()> {
        let mut question = self
            .question_repository
            .find_by_id(question_id)
            .await?
            .filter(|q| q.quiz_id == Some(quiz_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Question '{}' not found on quiz '{}'",
                    question_id, quiz_id
                ))
            })?;

        question.is_active = false;
        self.question_repository.update(question).await?;

        let remaining = self.question_repository.find_by_quiz(quiz_id).await?;
        for (index, mut question) in remaining.into_iter().enumerate() {
            let order = index as i32 + 1;
            if question.question_order != order {
                question.question_order = order;
                self.question_repository.update(question).await?;
            }
        }
        Ok(())
    }
}

fn validate_body(body: &QuestionBody) -> AppResult<()> {
    let fail = |msg: &str| Err(AppError::ValidationError(msg.to_string()));

    match body {
        QuestionBody::MultipleChoice {
            options,
            correct_key,
        } => {
            if options.is_empty() {
                return fail("Multiple choice question needs options");
            }
            if !options.iter().any(|o| &o.key == correct_key) {
                return fail("Correct answer key is not among the options");
            }
        }
        QuestionBody::TrueFalse { .. } => {}
        QuestionBody::MultipleSelect {
            options,
            correct_keys,
        } => {
            if options.is_empty() {
                return fail("Multiple select question needs options");
            }
            if correct_keys.is_empty() {
                return fail("Multiple select question needs at least one correct key");
            }
            if !correct_keys
                .iter()
                .all(|key| options.iter().any(|o| &o.key == key))
            {
                return fail("Correct answer keys must all be among the options");
            }
        }
        QuestionBody::ShortAnswer { accepted, .. } => {
            if accepted.is_empty() {
                return fail("Short answer question needs accepted answers");
            }
        }
        QuestionBody::FillInBlank { blanks, .. } => {
            if blanks.is_empty() {
                return fail("Fill-in-blank question needs blanks");
            }
            if blanks.iter().any(|b| b.accepted.is_empty()) {
                return fail("Every blank needs at least one accepted answer");
            }
        }
        QuestionBody::Matching { pairs } => {
            if pairs.is_empty() {
                return fail("Matching question needs pairs");
            }
        }
        QuestionBody::Ordering { items } => {
            if items.len() < 2 {
                return fail("Ordering question needs at least two items");
            }
        }
        QuestionBody::RatingScale {
            scale_min,
            scale_max,
            correct_rating,
            tolerance,
        } => {
            if scale_max <= scale_min {
                return fail("Rating scale maximum must exceed the minimum");
            }
            if correct_rating < scale_min || correct_rating > scale_max {
                return fail("Correct rating must lie within the scale");
            }
            if *tolerance < 0 {
                return fail("Rating tolerance cannot be negative");
            }
        }
        QuestionBody::Essay { .. } => {}
        QuestionBody::ImageChoice {
            options,
            correct_key,
        } => {
            if options.is_empty() {
                return fail("Image choice question needs options");
            }
            if !options.iter().any(|o| &o.key == correct_key) {
                return fail("Correct answer key is not among the image options");
            }
        }
        QuestionBody::Hotspot { regions, .. } => {
            if regions.is_empty() {
                return fail("Hotspot question needs regions");
            }
            if !regions.iter().any(|r| r.is_correct) {
                return fail("Hotspot question needs at least one correct region");
            }
            if regions.iter().any(|r| r.width <= 0.0 || r.height <= 0.0) {
                return fail("Hotspot regions need a positive width and height");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::question::{AnswerOption, HotspotRegion};

    #[test]
    fn multiple_choice_body_requires_known_correct_key() {
        let body = QuestionBody::MultipleChoice {
            options: vec![AnswerOption {
                key: "A".to_string(),
                text: "Only option".to_string(),
            }],
            correct_key: "B".to_string(),
        };
        assert!(matches!(
            validate_body(&body),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn rating_scale_bounds_are_checked() {
        let body = QuestionBody::RatingScale {
            scale_min: 5,
            scale_max: 5,
            correct_rating: 5,
            tolerance: 0,
        };
        assert!(validate_body(&body).is_err());

        let out_of_range = QuestionBody::RatingScale {
            scale_min: 1,
            scale_max: 5,
            correct_rating: 9,
            tolerance: 0,
        };
        assert!(validate_body(&out_of_range).is_err());
    }

    #[test]
    fn hotspot_requires_a_correct_region() {
        let body = QuestionBody::Hotspot {
            image_url: "https://img.example.com/x.png".to_string(),
            regions: vec![HotspotRegion {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
                is_correct: false,
            }],
        };
        assert!(validate_body(&body).is_err());
    }

    #[test]
    fn well_formed_bodies_pass_validation() {
        assert!(validate_body(&QuestionBody::TrueFalse {
            correct_value: false
        })
        .is_ok());
        assert!(validate_body(&QuestionBody::Ordering {
            items: vec!["a".to_string(), "b".to_string()]
        })
        .is_ok());
        assert!(validate_body(&QuestionBody::ShortAnswer {
            accepted: vec!["42".to_string()],
            case_sensitive: false
        })
        .is_ok());
    }
}

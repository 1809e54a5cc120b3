use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::Question};

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: Question) -> AppResult<Question>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Question>>;
    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Question>>;
    /// Active questions of a quiz, sorted by question_order.
    async fn find_by_quiz(&self, quiz_id: i64) -> AppResult<Vec<Question>>;
    async fn update(&self, question: Question) -> AppResult<Question>;
    /// Explicit aggregate-counter step run after each submission.
    async fn record_answer(&self, question_id: i64, correct: bool) -> AppResult<()>;
}

pub struct MongoQuestionRepository {
    db: Database,
    collection: Collection<Question>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("questions");
        Self {
            db: db.clone(),
            collection,
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for questions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let quiz_order_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "question_order": 1 })
            .options(
                IndexOptions::builder()
                    .name("quiz_order".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(quiz_order_index).await?;

        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn create(&self, mut question: Question) -> AppResult<Question> {
        question.id = self.db.next_id("questions").await?;
        question.created_at = Some(Utc::now());
        question.modified_at = Some(Utc::now());
        self.collection.insert_one(&question).await?;
        Ok(question)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Question>> {
        let question = self.collection.find_one(doc! { "id": id }).await?;
        Ok(question)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Question>> {
        let questions = self
            .collection
            .find(doc! { "id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn find_by_quiz(&self, quiz_id: i64) -> AppResult<Vec<Question>> {
        let questions = self
            .collection
            .find(doc! { "quiz_id": quiz_id, "is_active": true })
            .sort(doc! { "question_order": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn update(&self, mut question: Question) -> AppResult<Question> {
        question.modified_at = Some(Utc::now());
        self.collection
            .replace_one(doc! { "id": question.id }, &question)
            .await?;
        Ok(question)
    }

    async fn record_answer(&self, question_id: i64, correct: bool) -> AppResult<()> {
        let increments = if correct {
            doc! { "times_answered": 1_i64, "times_correct": 1_i64 }
        } else {
            doc! { "times_answered": 1_i64 }
        };

        self.collection
            .update_one(doc! { "id": question_id }, doc! { "$inc": increments })
            .await?;
        Ok(())
    }
}

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::Certificate};

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn create(&self, certificate: Certificate) -> AppResult<Certificate>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Certificate>>;
    async fn find_by_attempt(&self, attempt_id: i64) -> AppResult<Option<Certificate>>;
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Certificate>>;
}

pub struct MongoCertificateRepository {
    db: Database,
    collection: Collection<Certificate>,
}

impl MongoCertificateRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("certificates");
        Self {
            db: db.clone(),
            collection,
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for certificates collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // One certificate per attempt.
        let attempt_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("attempt_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(attempt_index).await?;

        Ok(())
    }
}

#[async_trait]
impl CertificateRepository for MongoCertificateRepository {
    async fn create(&self, mut certificate: Certificate) -> AppResult<Certificate> {
        certificate.id = self.db.next_id("certificates").await?;
        self.collection.insert_one(&certificate).await?;
        Ok(certificate)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Certificate>> {
        let certificate = self.collection.find_one(doc! { "id": id }).await?;
        Ok(certificate)
    }

    async fn find_by_attempt(&self, attempt_id: i64) -> AppResult<Option<Certificate>> {
        let certificate = self
            .collection
            .find_one(doc! { "attempt_id": attempt_id })
            .await?;
        Ok(certificate)
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Certificate>> {
        let certificates = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "issued_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(certificates)
    }
}

use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        MongoAttemptRepository, MongoCertificateRepository, MongoQuestionRepository,
        MongoQuizRepository,
    },
    services::{
        AnalyticsService, AttemptService, CertificateService, CsvImportService,
        ImportExportService, QuizService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub attempt_service: Arc<AttemptService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub certificate_service: Arc<CertificateService>,
    pub import_export_service: Arc<ImportExportService>,
    pub csv_import_service: Arc<CsvImportService>,
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;
        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;
        let attempt_repository = Arc::new(MongoAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;
        let certificate_repository = Arc::new(MongoCertificateRepository::new(&db));
        certificate_repository.ensure_indexes().await?;

        let certificate_service = Arc::new(CertificateService::new(
            certificate_repository,
            attempt_repository.clone(),
            config.certificate_prefix.clone(),
        ));
        let quiz_service = Arc::new(QuizService::new(
            quiz_repository.clone(),
            question_repository.clone(),
        ));
        let attempt_service = Arc::new(AttemptService::new(
            quiz_repository.clone(),
            question_repository.clone(),
            attempt_repository.clone(),
            certificate_service.clone(),
        ));
        let analytics_service = Arc::new(AnalyticsService::new(
            quiz_repository.clone(),
            attempt_repository,
        ));
        let import_export_service = Arc::new(ImportExportService::new(
            quiz_repository,
            question_repository,
        ));
        let csv_import_service = Arc::new(CsvImportService::new(
            quiz_service.clone(),
            config.max_csv_import_rows,
        ));

        Ok(Self {
            quiz_service,
            attempt_service,
            analytics_service,
            certificate_service,
            import_export_service,
            csv_import_service,
            db,
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}

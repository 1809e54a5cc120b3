pub mod analytics_service;
pub mod attempt_service;
pub mod certificate_service;
pub mod csv_import_service;
pub mod eligibility_service;
pub mod grading_service;
pub mod import_export_service;
pub mod quiz_service;

pub use analytics_service::AnalyticsService;
pub use attempt_service::AttemptService;
pub use certificate_service::CertificateService;
pub use csv_import_service::CsvImportService;
pub use eligibility_service::EligibilityService;
pub use grading_service::GradingService;
pub use import_export_service::ImportExportService;
pub use quiz_service::QuizService;

pub mod attempt_repository;
pub mod certificate_repository;
pub mod question_repository;
pub mod quiz_repository;

pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use certificate_repository::{CertificateRepository, MongoCertificateRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};

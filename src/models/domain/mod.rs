pub mod attempt;
pub mod certificate;
pub mod question;
pub mod quiz;

pub use attempt::{Answer, Attempt, AttemptStatus, ResponsePayload};
pub use certificate::Certificate;
pub use question::{Question, QuestionBody, QuestionType};
pub use quiz::{Quiz, QuizSection, QuizStatus};

pub mod analytics_handler;
pub mod attempt_handler;
pub mod quiz_handler;

pub use analytics_handler::quiz_analytics;
pub use attempt_handler::{
    abandon_attempt, check_eligibility, expire_attempt, get_attempt, get_certificate,
    list_my_attempts, manual_grade, start_attempt, submit_attempt,
};
pub use quiz_handler::{
    add_question, archive_quiz, create_quiz, export_quiz, get_quiz, health_check, import_questions_csv,
    import_quiz, list_questions, list_quizzes, publish_quiz, remove_question, update_question,
};

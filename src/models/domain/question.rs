use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Question {
    pub id: i64,
    /// None means the question lives in the reusable bank rather than a quiz.
    pub quiz_id: Option<i64>,
    pub section_id: Option<i64>,
    pub text: String,
    pub explanation: Option<String>,
    pub points: f64,
    pub question_order: i32,
    pub partial_credit_enabled: bool,
    pub negative_marking: bool,
    pub negative_points: f64,
    pub difficulty_level: DifficultyLevel,
    pub times_answered: i64,
    pub times_correct: i64,
    pub is_active: bool,
    pub body: QuestionBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        DifficultyLevel::Medium
    }
}

/// One payload variant per question type. Grading dispatches over this
/// tag exhaustively and never reads another variant's fields.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum QuestionBody {
    MultipleChoice {
        options: Vec<AnswerOption>,
        correct_key: String,
    },
    TrueFalse {
        correct_value: bool,
    },
    MultipleSelect {
        options: Vec<AnswerOption>,
        correct_keys: Vec<String>,
    },
    ShortAnswer {
        accepted: Vec<String>,
        case_sensitive: bool,
    },
    FillInBlank {
        blanks: Vec<BlankSlot>,
        case_sensitive: bool,
    },
    Matching {
        pairs: Vec<MatchPair>,
    },
    Ordering {
        /// Items listed in their correct sequence.
        items: Vec<String>,
    },
    RatingScale {
        scale_min: i32,
        scale_max: i32,
        correct_rating: i32,
        tolerance: i32,
    },
    Essay {
        guidelines: Option<String>,
        min_words: Option<u32>,
    },
    ImageChoice {
        options: Vec<ImageOption>,
        correct_key: String,
    },
    Hotspot {
        image_url: String,
        regions: Vec<HotspotRegion>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    MultipleSelect,
    ShortAnswer,
    FillInBlank,
    Matching,
    Ordering,
    RatingScale,
    Essay,
    ImageChoice,
    Hotspot,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerOption {
    pub key: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlankSlot {
    /// Accepted answers for this positional blank.
    pub accepted: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageOption {
    pub key: String,
    pub image_url: String,
    pub caption: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct HotspotRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub is_correct: bool,
}

impl HotspotRegion {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

impl QuestionBody {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionBody::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionBody::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionBody::MultipleSelect { .. } => QuestionType::MultipleSelect,
            QuestionBody::ShortAnswer { .. } => QuestionType::ShortAnswer,
            QuestionBody::FillInBlank { .. } => QuestionType::FillInBlank,
            QuestionBody::Matching { .. } => QuestionType::Matching,
            QuestionBody::Ordering { .. } => QuestionType::Ordering,
            QuestionBody::RatingScale { .. } => QuestionType::RatingScale,
            QuestionBody::Essay { .. } => QuestionType::Essay,
            QuestionBody::ImageChoice { .. } => QuestionType::ImageChoice,
            QuestionBody::Hotspot { .. } => QuestionType::Hotspot,
        }
    }
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.body.question_type()
    }

    pub fn is_essay(&self) -> bool {
        matches!(self.body, QuestionBody::Essay { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_body_tag_matches_type() {
        let body = QuestionBody::MultipleSelect {
            options: vec![
                AnswerOption {
                    key: "A".to_string(),
                    text: "First".to_string(),
                },
                AnswerOption {
                    key: "B".to_string(),
                    text: "Second".to_string(),
                },
            ],
            correct_keys: vec!["A".to_string()],
        };

        assert_eq!(body.question_type(), QuestionType::MultipleSelect);
    }

    #[test]
    fn question_body_round_trip_serialization() {
        let body = QuestionBody::RatingScale {
            scale_min: 1,
            scale_max: 10,
            correct_rating: 7,
            tolerance: 1,
        };

        let json = serde_json::to_string(&body).expect("body should serialize");
        assert!(json.contains("\"type\":\"RatingScale\""));

        let parsed: QuestionBody = serde_json::from_str(&json).expect("body should deserialize");
        assert_eq!(body, parsed);
    }

    #[test]
    fn question_body_rejects_unknown_tag() {
        let invalid = r#"{"type":"Telepathy"}"#;
        assert!(serde_json::from_str::<QuestionBody>(invalid).is_err());
    }

    #[test]
    fn hotspot_region_containment() {
        let region = HotspotRegion {
            x: 10.0,
            y: 10.0,
            width: 20.0,
            height: 5.0,
            is_correct: true,
        };

        assert!(region.contains(10.0, 10.0));
        assert!(region.contains(30.0, 15.0));
        assert!(!region.contains(9.9, 12.0));
        assert!(!region.contains(15.0, 15.1));
    }
}

use std::sync::Arc;

use serde::Serialize;

use crate::{
    errors::AppResult,
    models::domain::question::{AnswerOption, DifficultyLevel, QuestionBody},
    models::dto::request::CreateQuestionRequest,
    services::quiz_service::QuizService,
};

/// Fixed column layout for bulk question upload:
/// QuestionText, QuestionType, OptionA, OptionB, OptionC, OptionD,
/// CorrectAnswer, Explanation, Points, Difficulty
const EXPECTED_COLUMNS: usize = 10;

#[derive(Clone, Debug, Serialize)]
pub struct CsvRowError {
    pub line: usize,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CsvImportReport {
    pub imported: usize,
    pub errors: Vec<CsvRowError>,
}

pub struct CsvImportService {
    quiz_service: Arc<QuizService>,
    max_rows: usize,
}

impl CsvImportService {
    pub fn new(quiz_service: Arc<QuizService>, max_rows: usize) -> Self {
        Self {
            quiz_service,
            max_rows,
        }
    }

    /// Import questions from CSV. Malformed rows are reported per line and
    /// never abort the batch.
    pub async fn import_questions(&self, quiz_id: i64, csv: &str) -> AppResult<CsvImportReport> {
        // Missing quiz aborts the whole operation, not row by row.
        self.quiz_service.get_quiz(quiz_id).await?;

        let mut report = CsvImportReport {
            imported: 0,
            errors: Vec::new(),
        };

        let records = parse_records(csv);
        let mut data_rows = 0;
        for (line, fields) in records {
            if is_header_row(&fields) {
                continue;
            }

            data_rows += 1;
            if data_rows > self.max_rows {
                report.errors.push(CsvRowError {
                    line,
                    message: format!("Import limit of {} rows exceeded", self.max_rows),
                });
                break;
            }

            let request = match row_to_question(&fields) {
                Ok(request) => request,
                Err(message) => {
                    report.errors.push(CsvRowError { line, message });
                    continue;
                }
            };

            match self.quiz_service.add_question(quiz_id, request).await {
                Ok(_) => report.imported += 1,
                Err(err) => report.errors.push(CsvRowError {
                    line,
                    message: err.to_string(),
                }),
            }
        }

        log::info!(
            "CSV import for quiz {}: {} imported, {} errors",
            quiz_id,
            report.imported,
            report.errors.len()
        );
        Ok(report)
    }
}

fn is_header_row(fields: &[String]) -> bool {
    fields
        .first()
        .is_some_and(|f| f.trim().eq_ignore_ascii_case("QuestionText"))
}

fn row_to_question(fields: &[String]) -> Result<CreateQuestionRequest, String> {
    if fields.len() != EXPECTED_COLUMNS {
        return Err(format!(
            "Expected {} columns, found {}",
            EXPECTED_COLUMNS,
            fields.len()
        ));
    }

    let text = fields[0].trim();
    if text.is_empty() {
        return Err("Question text is empty".to_string());
    }

    let correct = fields[6].trim();
    if correct.is_empty() {
        return Err("Correct answer is empty".to_string());
    }

    let body = match normalize(&fields[1]).as_str() {
        "multiplechoice" => {
            let options: Vec<AnswerOption> = ["A", "B", "C", "D"]
                .iter()
                .zip(&fields[2..6])
                .filter(|(_, text)| !text.trim().is_empty())
                .map(|(key, text)| AnswerOption {
                    key: key.to_string(),
                    text: text.trim().to_string(),
                })
                .collect();
            if options.is_empty() {
                return Err("Multiple choice row has no options".to_string());
            }
            QuestionBody::MultipleChoice {
                options,
                correct_key: correct.to_uppercase(),
            }
        }
        "truefalse" => {
            let correct_value = match normalize(correct).as_str() {
                "true" | "t" => true,
                "false" | "f" => false,
                other => return Err(format!("Unrecognized true/false answer '{}'", other)),
            };
            QuestionBody::TrueFalse { correct_value }
        }
        "shortanswer" => QuestionBody::ShortAnswer {
            accepted: vec![correct.to_string()],
            case_sensitive: false,
        },
        other => return Err(format!("Unsupported question type '{}'", other)),
    };

    let points_field = fields[8].trim();
    let points = if points_field.is_empty() {
        1.0
    } else {
        points_field
            .parse::<f64>()
            .map_err(|_| format!("Invalid points value '{}'", points_field))?
    };
    if points <= 0.0 {
        return Err(format!("Points must be positive, found {}", points));
    }

    let difficulty_level = match normalize(&fields[9]).as_str() {
        "" | "medium" => DifficultyLevel::Medium,
        "easy" => DifficultyLevel::Easy,
        "hard" => DifficultyLevel::Hard,
        other => return Err(format!("Unknown difficulty '{}'", other)),
    };

    let explanation = fields[7].trim();

    Ok(CreateQuestionRequest {
        text: text.to_string(),
        explanation: (!explanation.is_empty()).then(|| explanation.to_string()),
        points,
        section_id: None,
        partial_credit_enabled: None,
        negative_marking: false,
        negative_points: 0.0,
        difficulty_level,
        body,
    })
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .to_lowercase()
}

/// Split CSV text into records, honoring quoted fields with embedded
/// commas, escaped quotes ("") and newlines. Returns each record with the
/// 1-based line it started on.
fn parse_records(input: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            '"' => field.push('"'),
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            '\r' if !in_quotes => {}
            '\n' => {
                line += 1;
                if in_quotes {
                    field.push('\n');
                } else {
                    fields.push(std::mem::take(&mut field));
                    if fields.iter().any(|f| !f.trim().is_empty()) {
                        records.push((record_line, std::mem::take(&mut fields)));
                    } else {
                        fields.clear();
                    }
                    record_line = line;
                }
            }
            _ => field.push(c),
        }
    }

    // Trailing record without a final newline.
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        if fields.iter().any(|f| !f.trim().is_empty()) {
            records.push((record_line, fields));
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_records_splits_plain_rows() {
        let records = parse_records("a,b,c\nd,e,f\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1, vec!["a", "b", "c"]);
        assert_eq!(records[1].0, 2);
    }

    #[test]
    fn parse_records_handles_quoted_commas_and_quotes() {
        let records = parse_records("\"a, with comma\",\"say \"\"hi\"\"\",plain\n");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].1,
            vec!["a, with comma", "say \"hi\"", "plain"]
        );
    }

    #[test]
    fn parse_records_keeps_newlines_inside_quotes() {
        let records = parse_records("\"line one\nline two\",next\nsecond,row\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1[0], "line one\nline two");
        // Record two starts after the embedded newline was consumed.
        assert_eq!(records[1].0, 3);
    }

    #[test]
    fn parse_records_skips_blank_lines() {
        let records = parse_records("a,b\n\n\nc,d\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].0, 4);
    }

    #[test]
    fn row_to_question_builds_multiple_choice() {
        let fields: Vec<String> = vec![
            "What is 2+2?",
            "MultipleChoice",
            "3",
            "4",
            "5",
            "",
            "b",
            "Basic arithmetic",
            "2",
            "easy",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let request = row_to_question(&fields).expect("row should parse");
        assert_eq!(request.points, 2.0);
        assert_eq!(request.difficulty_level, DifficultyLevel::Easy);
        match request.body {
            QuestionBody::MultipleChoice {
                options,
                correct_key,
            } => {
                assert_eq!(options.len(), 3);
                assert_eq!(correct_key, "B");
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn row_to_question_rejects_bad_rows() {
        let short: Vec<String> = vec!["only", "two"].into_iter().map(String::from).collect();
        assert!(row_to_question(&short).is_err());

        let fields: Vec<String> = vec![
            "Is water wet?",
            "TrueFalse",
            "",
            "",
            "",
            "",
            "maybe",
            "",
            "1",
            "easy",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let err = row_to_question(&fields).unwrap_err();
        assert!(err.contains("true/false"));

        let bad_points: Vec<String> = vec![
            "Name the process",
            "ShortAnswer",
            "",
            "",
            "",
            "",
            "osmosis",
            "",
            "lots",
            "",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let err = row_to_question(&bad_points).unwrap_err();
        assert!(err.contains("points"));
    }

    #[test]
    fn header_row_is_detected() {
        let header: Vec<String> = vec![
            "QuestionText",
            "QuestionType",
            "OptionA",
            "OptionB",
            "OptionC",
            "OptionD",
            "CorrectAnswer",
            "Explanation",
            "Points",
            "Difficulty",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert!(is_header_row(&header));
        assert!(!is_header_row(&["What is 2+2?".to_string()]));
    }
}

use std::collections::HashSet;

use crate::models::domain::attempt::{round2, Answer, ResponsePayload};
use crate::models::domain::question::{Question, QuestionBody};

pub struct GradingService;

struct Graded {
    correct: bool,
    partially_correct: bool,
    points: f64,
}

impl Graded {
    fn full(points: f64) -> Self {
        Graded {
            correct: true,
            partially_correct: false,
            points,
        }
    }

    fn wrong() -> Self {
        Graded {
            correct: false,
            partially_correct: false,
            points: 0.0,
        }
    }

    fn partial(points: f64) -> Self {
        Graded {
            correct: false,
            partially_correct: true,
            points,
        }
    }

    fn all_or_nothing(correct: bool, points: f64) -> Self {
        if correct {
            Graded::full(points)
        } else {
            Graded::wrong()
        }
    }
}

impl GradingService {
    /// Grade a single question against the submitted response. Pure and
    /// deterministic: the same (question, response) pair always yields the
    /// same graded answer.
    pub fn grade_answer(question: &Question, response: Option<&ResponsePayload>) -> Answer {
        let mut answer = Answer {
            question_id: question.id,
            question_type: question.question_type(),
            response: response.cloned(),
            is_correct: false,
            is_partially_correct: false,
            points_earned: 0.0,
            max_points: question.points,
            manual_grade: None,
            manual_feedback: None,
            graded_by: None,
        };

        // No response means skipped: zero points, never penalized.
        let Some(response) = response else {
            return answer;
        };

        // Essays wait for a manual grade; a response shape that does not
        // match the question's type grades like a skip.
        if question.is_essay() {
            return answer;
        }
        let Some(graded) = Self::grade_response(question, response) else {
            return answer;
        };

        answer.is_correct = graded.correct;
        answer.is_partially_correct = graded.partially_correct;
        answer.points_earned = if !graded.correct && !graded.partially_correct
            && question.negative_marking
        {
            -question.negative_points
        } else {
            graded.points
        };
        answer.points_earned = round2(answer.points_earned);
        answer
    }

    fn grade_response(question: &Question, response: &ResponsePayload) -> Option<Graded> {
        let points = question.points;
        let partial_enabled = question.partial_credit_enabled;

        let graded = match (&question.body, response) {
            (
                QuestionBody::MultipleChoice { correct_key, .. },
                ResponsePayload::Choice { selected },
            ) => Graded::all_or_nothing(selected == correct_key, points),

            (
                QuestionBody::TrueFalse { correct_value },
                ResponsePayload::Boolean { selected },
            ) => Graded::all_or_nothing(selected == correct_value, points),

            (
                QuestionBody::ImageChoice { correct_key, .. },
                ResponsePayload::Choice { selected },
            ) => Graded::all_or_nothing(selected == correct_key, points),

            (
                QuestionBody::MultipleSelect { correct_keys, .. },
                ResponsePayload::MultiChoice { selected },
            ) => Self::grade_multiple_select(
                correct_keys,
                selected,
                points,
                partial_enabled,
                question.negative_points,
            ),

            (
                QuestionBody::ShortAnswer {
                    accepted,
                    case_sensitive,
                },
                ResponsePayload::Text { text },
            ) => {
                let matched = accepted
                    .iter()
                    .any(|candidate| text_matches(candidate, text, *case_sensitive));
                Graded::all_or_nothing(matched, points)
            }

            (
                QuestionBody::FillInBlank {
                    blanks,
                    case_sensitive,
                },
                ResponsePayload::Blanks { values },
            ) => {
                let total = blanks.len();
                let correct = blanks
                    .iter()
                    .enumerate()
                    .filter(|(i, blank)| {
                        values.get(*i).is_some_and(|value| {
                            blank
                                .accepted
                                .iter()
                                .any(|candidate| text_matches(candidate, value, *case_sensitive))
                        })
                    })
                    .count();
                Self::proportional(correct, total, points, partial_enabled)
            }

            (QuestionBody::Matching { pairs }, ResponsePayload::Matches { pairs: submitted }) => {
                let total = pairs.len();
                let correct = pairs
                    .iter()
                    .filter(|pair| {
                        submitted
                            .iter()
                            .any(|s| s.left == pair.left && s.right == pair.right)
                    })
                    .count();
                Self::proportional(correct, total, points, partial_enabled)
            }

            (QuestionBody::Ordering { items }, ResponsePayload::Sequence { ordered }) => {
                let total = items.len();
                let correct = items
                    .iter()
                    .enumerate()
                    .filter(|(i, item)| ordered.get(*i) == Some(*item))
                    .count();
                Self::proportional(correct, total, points, partial_enabled)
            }

            (
                QuestionBody::RatingScale {
                    scale_min,
                    scale_max,
                    correct_rating,
                    tolerance,
                },
                ResponsePayload::Rating { value },
            ) => {
                let distance = (value - correct_rating).abs();
                let scale_range = scale_max - scale_min;
                if distance <= *tolerance {
                    Graded::full(points)
                } else if partial_enabled && scale_range > 0 && distance < scale_range {
                    // Linear decay toward zero at the far end of the scale.
                    let earned =
                        (scale_range - distance) as f64 / scale_range as f64 * points;
                    Graded::partial(earned)
                } else {
                    Graded::wrong()
                }
            }

            (QuestionBody::Hotspot { regions, .. }, ResponsePayload::Point { x, y }) => {
                let hit = regions
                    .iter()
                    .any(|region| region.is_correct && region.contains(*x, *y));
                Graded::all_or_nothing(hit, points)
            }

            // Essay is handled before dispatch; anything else is a shape
            // mismatch between the question type and the response.
            _ => return None,
        };

        Some(graded)
    }

    fn grade_multiple_select(
        correct_keys: &[String],
        selected: &[String],
        points: f64,
        partial_enabled: bool,
        negative_points: f64,
    ) -> Graded {
        let correct_set: HashSet<&str> = correct_keys.iter().map(String::as_str).collect();
        let selected_set: HashSet<&str> = selected.iter().map(String::as_str).collect();

        if !correct_set.is_empty() && selected_set == correct_set {
            return Graded::full(points);
        }

        let matched = selected_set.intersection(&correct_set).count();
        if !partial_enabled || matched == 0 {
            return Graded::wrong();
        }

        let incorrect_selected = selected_set.difference(&correct_set).count();
        let earned = matched as f64 / correct_set.len() as f64 * points
            - incorrect_selected as f64 * negative_points;
        Graded::partial(earned.max(0.0))
    }

    fn proportional(correct: usize, total: usize, points: f64, partial_enabled: bool) -> Graded {
        if total > 0 && correct == total {
            return Graded::full(points);
        }
        if partial_enabled && correct > 0 {
            return Graded::partial(correct as f64 / total as f64 * points);
        }
        Graded::wrong()
    }
}

fn text_matches(expected: &str, submitted: &str, case_sensitive: bool) -> bool {
    let expected = expected.trim();
    let submitted = submitted.trim();
    if case_sensitive {
        expected == submitted
    } else {
        expected.eq_ignore_ascii_case(submitted)
    }
}

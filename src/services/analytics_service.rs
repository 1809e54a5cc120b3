use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::attempt::Attempt,
    models::domain::question::QuestionType,
    repositories::{AttemptRepository, QuizRepository},
};

pub struct AnalyticsService {
    quiz_repository: Arc<dyn QuizRepository>,
    attempt_repository: Arc<dyn AttemptRepository>,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuizAnalytics {
    pub quiz_id: i64,
    pub total_attempts: usize,
    /// Completed + PendingReview attempts; the scoring population.
    pub scored_attempts: usize,
    pub unique_users: usize,
    pub average_percentage: f64,
    pub median_percentage: i32,
    /// Share of scored attempts that passed, in percent.
    pub pass_rate: f64,
    pub score_distribution: Vec<ScoreBucket>,
    pub question_stats: Vec<QuestionStats>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScoreBucket {
    pub range: String,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuestionStats {
    pub question_id: i64,
    pub question_type: QuestionType,
    pub times_answered: usize,
    pub times_correct: usize,
    /// Share of responses that were fully correct.
    pub difficulty_index: f64,
    /// Simplified (correct - incorrect) / answered proxy, not a true
    /// point-biserial discrimination statistic.
    pub discrimination_index: f64,
    pub common_wrong_answers: Vec<WrongAnswerFrequency>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WrongAnswerFrequency {
    pub response: String,
    pub count: usize,
}

const BUCKET_LABELS: [&str; 5] = ["0-19", "20-39", "40-59", "60-79", "80-100"];

impl AnalyticsService {
    pub fn new(
        quiz_repository: Arc<dyn QuizRepository>,
        attempt_repository: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            quiz_repository,
            attempt_repository,
        }
    }

    pub async fn quiz_analytics(&self, quiz_id: i64) -> AppResult<QuizAnalytics> {
        self.quiz_repository
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))?;

        let attempts = self.attempt_repository.find_by_quiz(quiz_id).await?;
        Ok(Self::aggregate(quiz_id, &attempts))
    }

    /// Fold a quiz's attempts into quiz- and question-level statistics.
    pub fn aggregate(quiz_id: i64, attempts: &[Attempt]) -> QuizAnalytics {
        let scored: Vec<&Attempt> = attempts.iter().filter(|a| a.status.is_scored()).collect();

        let unique_users = attempts
            .iter()
            .map(|a| a.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let mut percentages: Vec<i32> = scored.iter().map(|a| a.percentage).collect();
        percentages.sort_unstable();

        let average_percentage = if percentages.is_empty() {
            0.0
        } else {
            percentages.iter().sum::<i32>() as f64 / percentages.len() as f64
        };

        // Lower-middle element, never an average of the two middles.
        let median_percentage = if percentages.is_empty() {
            0
        } else {
            percentages[percentages.len() / 2]
        };

        let passed_count = scored.iter().filter(|a| a.passed).count();
        let pass_rate = if scored.is_empty() {
            0.0
        } else {
            passed_count as f64 / scored.len() as f64 * 100.0
        };

        let mut bucket_counts = [0usize; 5];
        for p in &percentages {
            let bucket = ((p / 20) as usize).min(4);
            bucket_counts[bucket] += 1;
        }
        let score_distribution = BUCKET_LABELS
            .iter()
            .zip(bucket_counts)
            .map(|(label, count)| ScoreBucket {
                range: label.to_string(),
                count,
            })
            .collect();

        QuizAnalytics {
            quiz_id,
            total_attempts: attempts.len(),
            scored_attempts: scored.len(),
            unique_users,
            average_percentage,
            median_percentage,
            pass_rate,
            score_distribution,
            question_stats: Self::question_stats(&scored),
        }
    }

    fn question_stats(scored: &[&Attempt]) -> Vec<QuestionStats> {
        struct Tally {
            question_type: QuestionType,
            answered: usize,
            correct: usize,
            wrong_answers: HashMap<String, usize>,
        }

        let mut tallies: HashMap<i64, Tally> = HashMap::new();
        for attempt in scored {
            for answer in &attempt.answers {
                // Skipped answers carry no response and do not count.
                let Some(response) = &answer.response else {
                    continue;
                };

                let tally = tallies.entry(answer.question_id).or_insert_with(|| Tally {
                    question_type: answer.question_type,
                    answered: 0,
                    correct: 0,
                    wrong_answers: HashMap::new(),
                });
                tally.answered += 1;
                if answer.is_correct {
                    tally.correct += 1;
                } else {
                    *tally.wrong_answers.entry(response.to_string()).or_insert(0) += 1;
                }
            }
        }

        let mut stats: Vec<QuestionStats> = tallies
            .into_iter()
            .map(|(question_id, tally)| {
                let answered = tally.answered as f64;
                let incorrect = tally.answered - tally.correct;

                let mut wrong: Vec<WrongAnswerFrequency> = tally
                    .wrong_answers
                    .into_iter()
                    .map(|(response, count)| WrongAnswerFrequency { response, count })
                    .collect();
                wrong.sort_by(|a, b| b.count.cmp(&a.count).then(a.response.cmp(&b.response)));
                wrong.truncate(5);

                QuestionStats {
                    question_id,
                    question_type: tally.question_type,
                    times_answered: tally.answered,
                    times_correct: tally.correct,
                    difficulty_index: tally.correct as f64 / answered,
                    discrimination_index: (tally.correct as f64 - incorrect as f64) / answered,
                    common_wrong_answers: wrong,
                }
            })
            .collect();

        stats.sort_by_key(|s| s.question_id);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::attempt::{Answer, AttemptStatus, ResponsePayload};
    use crate::test_utils::fixtures::test_attempt;

    fn scored_attempt(id: i64, user: &str, percentage: i32, passed: bool) -> Attempt {
        let mut attempt = test_attempt(id, 1, user, AttemptStatus::Completed);
        attempt.percentage = percentage;
        attempt.passed = passed;
        attempt
    }

    fn choice_answer(question_id: i64, selected: &str, correct: bool) -> Answer {
        Answer {
            question_id,
            question_type: QuestionType::MultipleChoice,
            response: Some(ResponsePayload::Choice {
                selected: selected.to_string(),
            }),
            is_correct: correct,
            is_partially_correct: false,
            points_earned: if correct { 10.0 } else { 0.0 },
            max_points: 10.0,
            manual_grade: None,
            manual_feedback: None,
            graded_by: None,
        }
    }

    #[test]
    fn median_takes_the_middle_element() {
        let attempts = vec![
            scored_attempt(1, "u1", 40, false),
            scored_attempt(2, "u2", 60, false),
            scored_attempt(3, "u3", 80, true),
        ];

        let analytics = AnalyticsService::aggregate(1, &attempts);
        assert_eq!(analytics.median_percentage, 60);
    }

    #[test]
    fn median_of_even_count_is_upper_middle_not_average() {
        let attempts = vec![
            scored_attempt(1, "u1", 40, false),
            scored_attempt(2, "u2", 60, false),
            scored_attempt(3, "u3", 80, true),
            scored_attempt(4, "u4", 100, true),
        ];

        let analytics = AnalyticsService::aggregate(1, &attempts);
        assert_eq!(analytics.median_percentage, 80);
    }

    #[test]
    fn distribution_buckets_are_fixed_twenty_point_ranges() {
        let attempts = vec![
            scored_attempt(1, "u1", 0, false),
            scored_attempt(2, "u2", 19, false),
            scored_attempt(3, "u3", 20, false),
            scored_attempt(4, "u4", 79, true),
            scored_attempt(5, "u5", 80, true),
            scored_attempt(6, "u6", 100, true),
        ];

        let analytics = AnalyticsService::aggregate(1, &attempts);
        let counts: Vec<usize> = analytics
            .score_distribution
            .iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(counts, vec![2, 1, 0, 1, 2]);
    }

    #[test]
    fn abandoned_attempts_are_excluded_from_scoring_population() {
        let mut abandoned = scored_attempt(3, "u1", 90, true);
        abandoned.status = AttemptStatus::Abandoned;

        let attempts = vec![scored_attempt(1, "u1", 50, false), abandoned];
        let analytics = AnalyticsService::aggregate(1, &attempts);

        assert_eq!(analytics.total_attempts, 2);
        assert_eq!(analytics.scored_attempts, 1);
        assert_eq!(analytics.unique_users, 1);
        assert_eq!(analytics.median_percentage, 50);
    }

    #[test]
    fn question_stats_compute_difficulty_and_discrimination() {
        let mut a1 = scored_attempt(1, "u1", 100, true);
        a1.answers = vec![choice_answer(7, "B", true)];
        let mut a2 = scored_attempt(2, "u2", 0, false);
        a2.answers = vec![choice_answer(7, "A", false)];
        let mut a3 = scored_attempt(3, "u3", 100, true);
        a3.answers = vec![choice_answer(7, "B", true)];
        let mut a4 = scored_attempt(4, "u4", 0, false);
        a4.answers = vec![choice_answer(7, "A", false)];

        let analytics = AnalyticsService::aggregate(1, &[a1, a2, a3, a4]);
        let stats = &analytics.question_stats[0];

        assert_eq!(stats.question_id, 7);
        assert_eq!(stats.times_answered, 4);
        assert_eq!(stats.times_correct, 2);
        assert_eq!(stats.difficulty_index, 0.5);
        assert_eq!(stats.discrimination_index, 0.0);
        assert_eq!(stats.common_wrong_answers.len(), 1);
        assert_eq!(stats.common_wrong_answers[0].response, "A");
        assert_eq!(stats.common_wrong_answers[0].count, 2);
    }

    #[test]
    fn common_wrong_answers_keep_top_five() {
        let mut attempts = Vec::new();
        for (i, wrong) in ["A", "C", "D", "E", "F", "G"].iter().cycle().take(12).enumerate() {
            let mut attempt = scored_attempt(i as i64 + 1, &format!("u{}", i), 0, false);
            attempt.answers = vec![choice_answer(1, wrong, false)];
            attempts.push(attempt);
        }

        let analytics = AnalyticsService::aggregate(1, &attempts);
        let stats = &analytics.question_stats[0];
        assert_eq!(stats.common_wrong_answers.len(), 5);
    }

    #[test]
    fn empty_quiz_yields_zeroed_analytics() {
        let analytics = AnalyticsService::aggregate(1, &[]);
        assert_eq!(analytics.total_attempts, 0);
        assert_eq!(analytics.median_percentage, 0);
        assert_eq!(analytics.pass_rate, 0.0);
        assert!(analytics.question_stats.is_empty());
    }

    #[test]
    fn skipped_answers_do_not_count_as_answered() {
        let mut attempt = scored_attempt(1, "u1", 0, false);
        let mut skipped = choice_answer(5, "A", false);
        skipped.response = None;
        attempt.answers = vec![skipped];

        let analytics = AnalyticsService::aggregate(1, &[attempt]);
        assert!(analytics.question_stats.is_empty());
    }
}

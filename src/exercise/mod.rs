//! Exercise types and answer checking.

mod generator;

pub use generator::ExerciseGenerator;

use crate::error::{CharlaError, Result};
use serde::{Deserialize, Serialize};

/// A request for a new practice exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRequest {
    /// Free-text learning objective used for retrieval.
    pub query: String,
    /// Question type label passed to the prompt (e.g. "comprehension").
    pub question_type: String,
}

impl ExerciseRequest {
    pub fn new(query: &str, question_type: &str) -> Self {
        Self {
            query: query.to_string(),
            question_type: question_type.to_string(),
        }
    }
}

/// One multiple-choice answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Answer text in the target language.
    pub text: String,
    /// Translation for the learner.
    #[serde(rename = "translation")]
    pub translated_text: String,
    pub is_correct: bool,
}

/// The multiple-choice question of a generated exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseQuestion {
    /// Question in the target language.
    #[serde(rename = "question")]
    pub question_text: String,
    /// Translation for the learner.
    #[serde(rename = "question_translation")]
    pub translated_question_text: String,
    /// Exactly four options, exactly one of them correct.
    pub answers: Vec<AnswerOption>,
}

impl ExerciseQuestion {
    /// Number of answer options an exercise must carry.
    pub const ANSWER_COUNT: usize = 4;

    /// Enforce the answers invariant: exactly four options, exactly one
    /// marked correct.
    pub fn validate(&self) -> Result<()> {
        if self.answers.len() != Self::ANSWER_COUNT {
            return Err(CharlaError::Validation(format!(
                "Expected {} answers, got {}",
                Self::ANSWER_COUNT,
                self.answers.len()
            )));
        }

        let correct = self.answers.iter().filter(|a| a.is_correct).count();
        if correct != 1 {
            return Err(CharlaError::Validation(format!(
                "Expected exactly one correct answer, got {}",
                correct
            )));
        }

        Ok(())
    }

    /// The single correct option. Only meaningful after `validate`.
    pub fn correct_answer(&self) -> Option<&AnswerOption> {
        self.answers.iter().find(|a| a.is_correct)
    }
}

/// A generated practice exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseResult {
    /// The newly generated conversation the question is about.
    pub context: String,
    /// The multiple-choice question.
    pub question: ExerciseQuestion,
}

/// Check a learner's free-text answer against the expected one.
///
/// Uses a character-bigram similarity ratio; the threshold comes from
/// configuration (`generation.answer_similarity_threshold`) rather than being
/// baked in here.
pub fn answer_matches(given: &str, expected: &str, threshold: f64) -> bool {
    similarity_ratio(given, expected) >= threshold
}

/// Dice coefficient over character bigrams of the lowercased, trimmed inputs.
///
/// Returns a value in [0, 1]; 1.0 for equal strings.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a == b {
        return 1.0;
    }
    if a.chars().count() < 2 || b.chars().count() < 2 {
        return 0.0;
    }

    let mut bigrams_a: Vec<(char, char)> = bigrams(&a);
    let bigrams_b: Vec<(char, char)> = bigrams(&b);
    let total = bigrams_a.len() + bigrams_b.len();

    let mut shared = 0usize;
    for bigram in &bigrams_b {
        if let Some(pos) = bigrams_a.iter().position(|x| x == bigram) {
            bigrams_a.swap_remove(pos);
            shared += 1;
        }
    }

    (2.0 * shared as f64) / total as f64
}

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answers: Vec<AnswerOption>) -> ExerciseQuestion {
        ExerciseQuestion {
            question_text: "¿Cómo se llama?".to_string(),
            translated_question_text: "What is her name?".to_string(),
            answers,
        }
    }

    fn option(text: &str, is_correct: bool) -> AnswerOption {
        AnswerOption {
            text: text.to_string(),
            translated_text: format!("{} (en)", text),
            is_correct,
        }
    }

    #[test]
    fn test_validate_accepts_four_with_one_correct() {
        let q = question(vec![
            option("Ana", true),
            option("María", false),
            option("Lucía", false),
            option("Sofía", false),
        ]);
        q.validate().unwrap();
        assert_eq!(q.correct_answer().unwrap().text, "Ana");
    }

    #[test]
    fn test_validate_rejects_wrong_count() {
        let q = question(vec![option("Ana", true), option("María", false)]);
        assert!(matches!(q.validate(), Err(CharlaError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_multiple_correct() {
        let q = question(vec![
            option("Ana", true),
            option("María", true),
            option("Lucía", false),
            option("Sofía", false),
        ]);
        assert!(matches!(q.validate(), Err(CharlaError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_none_correct() {
        let q = question(vec![
            option("Ana", false),
            option("María", false),
            option("Lucía", false),
            option("Sofía", false),
        ]);
        assert!(matches!(q.validate(), Err(CharlaError::Validation(_))));
    }

    #[test]
    fn test_similarity_equal_and_case_insensitive() {
        assert!((similarity_ratio("Se llama Ana.", "se llama ana.") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_answer_matches_near_miss_passes() {
        // Dropped punctuation should still clear the default threshold.
        assert!(answer_matches("Se llama Ana", "Se llama Ana.", 0.8));
    }

    #[test]
    fn test_answer_matches_different_answer_fails() {
        assert!(!answer_matches("Tiene veinte años", "Se llama Ana.", 0.8));
    }
}

//! Post-run bonus quiz
//!
//! The session only tracks which bank entries were drawn and how many were
//! answered correctly; question text belongs to the bank.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

const DEFAULT_BANK: &str = include_str!("../../assets/quiz.json");

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct: usize,
}

/// Parse a question bank, dropping entries whose answer index is out of range
pub fn parse_bank(json: &str) -> Result<Vec<Question>, serde_json::Error> {
    let questions: Vec<Question> = serde_json::from_str(json)?;
    Ok(questions
        .into_iter()
        .filter(|q| {
            let ok = q.correct < q.options.len();
            if !ok {
                log::warn!("Skipping quiz question with invalid answer: {}", q.prompt);
            }
            ok
        })
        .collect())
}

/// The question bank shipped with the game
pub fn default_bank() -> Result<Vec<Question>, serde_json::Error> {
    parse_bank(DEFAULT_BANK)
}

/// An in-progress quiz
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    /// Indices into the bank, in asking order
    questions: Vec<usize>,
    answered: usize,
    correct_answers: u32,
    bonus: u64,
}

impl QuizSession {
    /// Draw `count` distinct questions (fewer if the bank is smaller)
    pub fn draw<R: Rng + ?Sized>(
        bank_len: usize,
        count: usize,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        if bank_len == 0 {
            return Err(SessionError::EmptyQuestionBank);
        }
        let mut questions: Vec<usize> = (0..bank_len).collect();
        questions.shuffle(rng);
        questions.truncate(count);
        Ok(Self {
            questions,
            answered: 0,
            correct_answers: 0,
            bonus: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Bonus points earned so far
    pub fn bonus(&self) -> u64 {
        self.bonus
    }

    pub fn is_finished(&self) -> bool {
        self.answered >= self.questions.len()
    }

    pub fn current_question<'b>(&self, bank: &'b [Question]) -> Option<&'b Question> {
        self.questions
            .get(self.answered)
            .and_then(|&index| bank.get(index))
    }

    /// Answer the current question; returns whether it was right
    pub fn answer(
        &mut self,
        bank: &[Question],
        option: usize,
        bonus_per_correct: u64,
    ) -> Result<bool, SessionError> {
        let question = self
            .current_question(bank)
            .ok_or(SessionError::EmptyQuestionBank)?;
        if option >= question.options.len() {
            return Err(SessionError::AnswerOutOfRange {
                index: option,
                options: question.options.len(),
            });
        }
        let correct = option == question.correct;
        if correct {
            self.correct_answers += 1;
            self.bonus += bonus_per_correct;
        }
        self.answered += 1;
        Ok(correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_default_bank_parses() {
        let bank = default_bank().expect("embedded bank");
        assert_eq!(bank.len(), 5);
        assert!(bank.iter().all(|q| q.correct < q.options.len()));
    }

    #[test]
    fn test_invalid_answer_index_is_dropped() {
        let bank = parse_bank(r#"[{ "prompt": "?", "options": ["a"], "correct": 3 }]"#)
            .expect("valid json");
        assert!(bank.is_empty());
    }

    #[test]
    fn test_draw_is_distinct_and_bounded() {
        let mut rng = Pcg32::seed_from_u64(3);
        let quiz = QuizSession::draw(5, 3, &mut rng).expect("non-empty bank");
        assert_eq!(quiz.len(), 3);
        let mut seen = quiz.questions.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 3);

        let small = QuizSession::draw(2, 3, &mut rng).expect("non-empty bank");
        assert_eq!(small.len(), 2);

        assert_eq!(
            QuizSession::draw(0, 3, &mut rng),
            Err(SessionError::EmptyQuestionBank)
        );
    }

    #[test]
    fn test_answers_accumulate_bonus() {
        let bank = default_bank().expect("embedded bank");
        let mut rng = Pcg32::seed_from_u64(11);
        let mut quiz = QuizSession::draw(bank.len(), 3, &mut rng).expect("draw");

        let right = quiz.current_question(&bank).expect("question").correct;
        assert!(quiz.answer(&bank, right, 5).expect("answer"));

        let q = quiz.current_question(&bank).expect("question");
        let wrong = (q.correct + 1) % q.options.len();
        assert!(!quiz.answer(&bank, wrong, 5).expect("answer"));

        assert!(matches!(
            quiz.answer(&bank, 99, 5),
            Err(SessionError::AnswerOutOfRange { index: 99, .. })
        ));

        assert_eq!(quiz.bonus(), 5);
        assert_eq!(quiz.answered(), 2);
        assert!(!quiz.is_finished());
    }
}

//! Error types shared across the crate

use thiserror::Error;

use crate::sim::GamePhase;

/// Failure to load or validate a [`crate::Tuning`] document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure reported by a leaderboard collaborator
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("username is required to submit a score")]
    MissingUsername,
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
}

/// Misuse of a session operation in the wrong phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a player name is required before starting")]
    UsernameRequired,
    #[error("operation requires phase {expected:?}, session is in {actual:?}")]
    WrongPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
    #[error("answer {index} is out of range for a question with {options} options")]
    AnswerOutOfRange { index: usize, options: usize },
    #[error("question bank is empty")]
    EmptyQuestionBank,
}

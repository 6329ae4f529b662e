//! Leaderboard collaborator
//!
//! The simulation never talks to a leaderboard directly: it emits
//! `ScoreFinalized` and the host submits it here. Failures are logged and
//! never block a restart.

use serde::{Deserialize, Serialize};

use crate::error::LeaderboardError;

/// A submitted score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub username: String,
    pub score: u64,
}

/// Score persistence: append a score, read the top N by descending score
pub trait Leaderboard {
    fn submit_score(&mut self, username: &str, score: u64) -> Result<(), LeaderboardError>;

    fn fetch_top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, LeaderboardError>;
}

/// In-memory, append-only leaderboard kept sorted by descending score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLeaderboard {
    entries: Vec<ScoreEntry>,
}

impl MemoryLeaderboard {
    /// LocalStorage key (used only in wasm32)
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "turbo_racer_leaderboard";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Rank (1-indexed) a score would take if submitted now
    pub fn potential_rank(&self, score: u64) -> usize {
        self.insertion_point(score) + 1
    }

    /// Ties keep submission order
    fn insertion_point(&self, score: u64) -> usize {
        self.entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len())
    }

    /// Load the leaderboard from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<MemoryLeaderboard>(&json) {
                    Ok(board) => {
                        log::info!("Loaded {} leaderboard entries", board.len());
                        return board;
                    }
                    Err(err) => log::warn!("Discarding unreadable leaderboard: {err}"),
                }
            }
        }

        log::info!("No leaderboard found, starting fresh");
        Self::new()
    }

    /// Save the leaderboard to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), LeaderboardError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| LeaderboardError::Unavailable("no LocalStorage".into()))?;
        let json = serde_json::to_string(self)
            .map_err(|err| LeaderboardError::Unavailable(err.to_string()))?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| LeaderboardError::Unavailable("LocalStorage write rejected".into()))?;
        log::info!("Leaderboard saved ({} entries)", self.len());
        Ok(())
    }
}

impl Leaderboard for MemoryLeaderboard {
    fn submit_score(&mut self, username: &str, score: u64) -> Result<(), LeaderboardError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LeaderboardError::MissingUsername);
        }
        let pos = self.insertion_point(score);
        self.entries.insert(
            pos,
            ScoreEntry {
                username: username.to_string(),
                score,
            },
        );
        Ok(())
    }

    fn fetch_top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        Ok(self.entries.iter().take(limit).cloned().collect())
    }
}

/// Submit a finalized score, logging instead of failing
///
/// Returns whether the leaderboard accepted it.
pub fn report_score(board: &mut dyn Leaderboard, username: &str, score: u64) -> bool {
    match board.submit_score(username, score) {
        Ok(()) => {
            log::info!("Submitted score {score} for {username}");
            true
        }
        Err(err) => {
            log::warn!("Score {score} not submitted: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offline;

    impl Leaderboard for Offline {
        fn submit_score(&mut self, _: &str, _: u64) -> Result<(), LeaderboardError> {
            Err(LeaderboardError::Unavailable("offline".into()))
        }

        fn fetch_top_scores(&self, _: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
            Err(LeaderboardError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_sorted_descending_and_limited() {
        let mut board = MemoryLeaderboard::new();
        for (name, score) in [("a", 5), ("b", 12), ("c", 7), ("d", 12)] {
            board.submit_score(name, score).expect("valid submission");
        }
        let top = board.fetch_top_scores(3).expect("in-memory fetch");
        let names: Vec<_> = top.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["b", "d", "c"]);
        assert_eq!(board.len(), 4);
        assert_eq!(board.top_score(), Some(12));
    }

    #[test]
    fn test_rejects_missing_username() {
        let mut board = MemoryLeaderboard::new();
        assert!(matches!(
            board.submit_score("  ", 10),
            Err(LeaderboardError::MissingUsername)
        ));
        assert!(board.is_empty());
    }

    #[test]
    fn test_potential_rank() {
        let mut board = MemoryLeaderboard::new();
        assert_eq!(board.potential_rank(1), 1);
        board.submit_score("a", 10).expect("valid");
        board.submit_score("b", 5).expect("valid");
        assert_eq!(board.potential_rank(11), 1);
        assert_eq!(board.potential_rank(10), 2);
        assert_eq!(board.potential_rank(1), 3);
    }

    #[test]
    fn test_report_score_swallows_failures() {
        let mut offline = Offline;
        assert!(!report_score(&mut offline, "rider", 20));

        let mut board = MemoryLeaderboard::new();
        assert!(report_score(&mut board, "rider", 20));
        assert!(!report_score(&mut board, "", 20));
    }
}

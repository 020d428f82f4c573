//! Booth collaborators
//!
//! The session engine talks to these through the traits below:
//! - `gate`: opening hours, daily access token, admin check
//! - `limiter`: per-player submission cap
//! - `store`: in-memory registrations and scoreboard
//! - `stats`: admin dashboard aggregates

pub mod config;
pub mod error;
pub mod gate;
pub mod limiter;
pub mod stats;
pub mod store;

pub use config::BoothConfig;
pub use error::BoothError;
pub use gate::{AccessGate, PageRequest, Route};
pub use limiter::LimitStatus;
pub use stats::AdminStats;
pub use store::{Registration, ScoreBoard, ScoreSubmission};

use crate::leaderboard::LeaderboardEntry;

/// Accepts end-of-session scores
pub trait ScoreSink {
    fn submit(&mut self, submission: ScoreSubmission) -> Result<(), BoothError>;
}

/// Serves the public scoreboard
pub trait LeaderboardQuery {
    /// Best entries by score, one per player
    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, BoothError>;
}

/// Counts submissions per player and per IP
pub trait SubmissionLimiter {
    fn check(&self, email: &str, ip: Option<&str>) -> Result<LimitStatus, BoothError>;
}

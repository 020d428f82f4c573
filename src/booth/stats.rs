//! Admin dashboard aggregates

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::store::{RegistrationRecord, ScoreBoard};
use crate::leaderboard::LeaderboardEntry;

/// Rows created on one UTC day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: u32,
}

/// Everything the admin page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_registrations: u32,
    pub unique_registrations: u32,
    pub total_participations: u32,
    pub unique_players_with_scores: u32,
    pub avg_participations_per_player: f64,
    /// Plays beyond the first, per player
    pub avg_replays: f64,
    pub average_score: f64,
    pub average_max_combo: f64,
    pub average_level: f64,
    pub best_score: u64,
    pub best_combo: u32,
    pub max_level: u32,
    pub last_participation_at: Option<DateTime<Utc>>,
    /// Share of registered players who submitted a score
    pub conversion_rate: f64,
    pub participation_by_day: Vec<DayCount>,
    pub registrations_by_day: Vec<DayCount>,
}

impl AdminStats {
    pub fn collect(board: &ScoreBoard) -> Self {
        Self::from_rows(board.registrations(), board.scores())
    }

    pub fn from_rows(registrations: &[RegistrationRecord], scores: &[LeaderboardEntry]) -> Self {
        let unique_registrations = registrations
            .iter()
            .map(|r| r.email.as_str())
            .collect::<HashSet<_>>()
            .len() as u32;

        let mut per_player: HashMap<&str, u32> = HashMap::new();
        for entry in scores {
            *per_player.entry(entry.email.as_str()).or_default() += 1;
        }
        let unique_players = per_player.len() as u32;
        let total = scores.len() as u32;

        let avg_participations_per_player = ratio(total as f64, unique_players as f64);
        let avg_replays = if unique_players > 0 {
            (avg_participations_per_player - 1.0).max(0.0)
        } else {
            0.0
        };

        let mean = |f: fn(&LeaderboardEntry) -> f64| ratio(scores.iter().map(f).sum(), total as f64);

        Self {
            total_registrations: registrations.len() as u32,
            unique_registrations,
            total_participations: total,
            unique_players_with_scores: unique_players,
            avg_participations_per_player,
            avg_replays,
            average_score: mean(|e| e.score as f64),
            average_max_combo: mean(|e| e.max_combo as f64),
            average_level: mean(|e| e.level as f64),
            best_score: scores.iter().map(|e| e.score).max().unwrap_or(0),
            best_combo: scores.iter().map(|e| e.max_combo).max().unwrap_or(0),
            max_level: scores.iter().map(|e| e.level).max().unwrap_or(0),
            last_participation_at: scores.iter().map(|e| e.created_at).max(),
            conversion_rate: ratio(unique_players as f64, unique_registrations as f64),
            participation_by_day: by_day(scores.iter().map(|e| e.created_at)),
            registrations_by_day: by_day(registrations.iter().map(|r| r.created_at)),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn by_day(timestamps: impl Iterator<Item = DateTime<Utc>>) -> Vec<DayCount> {
    let mut days: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for ts in timestamps {
        *days.entry(ts.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(day, count)| DayCount { day, count })
        .collect()
}

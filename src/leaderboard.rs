//! Scoreboards
//!
//! `LeaderboardEntry` is the stored scoreboard row served to the public
//! board. `RecentRuns` is the per-device top 5, persisted to LocalStorage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::skins::Skin;

/// Stored rows considered when building the public board
pub const LEADERBOARD_WINDOW: usize = 50;
/// Default public board size
pub const LEADERBOARD_SIZE: usize = 10;
/// Runs kept on the device
pub const MAX_RECENT_RUNS: usize = 5;

/// A stored score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub first_name: String,
    pub last_name: String,
    pub pseudo: Option<String>,
    pub score: u64,
    pub max_combo: u32,
    pub level: u32,
    pub email: String,
    #[serde(skip)]
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Pseudo if set, else "First L.", else "Anonyme"
    pub fn display_name(&self) -> String {
        if let Some(pseudo) = self.pseudo.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            return pseudo.to_string();
        }
        let first = self.first_name.trim();
        let initial: String = self
            .last_name
            .trim()
            .chars()
            .take(1)
            .flat_map(char::to_uppercase)
            .collect();
        match (first.is_empty(), initial.is_empty()) {
            (true, true) => "Anonyme".to_string(),
            (false, true) => first.to_string(),
            (true, false) => format!("{initial}."),
            (false, false) => format!("{first} {initial}."),
        }
    }
}

/// Best entries by score, keeping only each player's (email) best
pub fn rank_unique<'a, I>(entries: I, limit: usize) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = &'a LeaderboardEntry>,
{
    let mut sorted: Vec<&LeaderboardEntry> = entries.into_iter().collect();
    // Stable sort: earlier rows win ties
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    let mut seen = std::collections::HashSet::new();
    sorted
        .into_iter()
        .take(LEADERBOARD_WINDOW)
        .filter(|entry| seen.insert(entry.email.clone()))
        .take(limit)
        .cloned()
        .collect()
}

/// A finished run, as remembered on this device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub score: u64,
    pub max_combo: u32,
    pub skin: Skin,
    pub level: u32,
    /// Local "HH:MM" the run ended
    pub time: String,
}

/// Per-device best runs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecentRuns {
    pub entries: Vec<RunRecord>,
}

impl RecentRuns {
    const STORAGE_KEY: &'static str = "booth_catch_runs";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Rank a score would get (1-indexed), None if it would fall off the board
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len())
            + 1;
        (rank <= MAX_RECENT_RUNS).then_some(rank)
    }

    /// Record a run; returns its rank if it stays on the board
    pub fn add(&mut self, run: RunRecord) -> Option<usize> {
        let rank = self.potential_rank(run.score)?;
        self.entries.insert(rank - 1, run);
        self.entries.truncate(MAX_RECENT_RUNS);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Runs remembered on this device; empty when nothing is stored
    pub fn load() -> Self {
        let runs = device_storage::read(Self::STORAGE_KEY)
            .and_then(|json| serde_json::from_str::<RecentRuns>(&json).ok())
            .unwrap_or_default();
        log::info!("{} recent runs on this device", runs.entries.len());
        runs
    }

    pub fn save(&self) {
        match serde_json::to_string(self) {
            Ok(json) if device_storage::write(Self::STORAGE_KEY, &json) => {
                log::info!("Recent runs saved ({} entries)", self.entries.len());
            }
            Ok(_) => log::debug!("No device storage, recent runs not saved"),
            Err(e) => log::warn!("Failed to serialize recent runs: {e}"),
        }
    }
}

/// Browser LocalStorage; absent off the web
#[cfg(target_arch = "wasm32")]
mod device_storage {
    fn local() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    pub fn read(key: &str) -> Option<String> {
        local()?.get_item(key).ok()?
    }

    pub fn write(key: &str, value: &str) -> bool {
        local().is_some_and(|storage| storage.set_item(key, value).is_ok())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod device_storage {
    pub fn read(_key: &str) -> Option<String> {
        None
    }

    pub fn write(_key: &str, _value: &str) -> bool {
        false
    }
}

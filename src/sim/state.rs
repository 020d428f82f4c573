//! Session state and core simulation types
//!
//! Everything that affects scoring lives here. Presentation state (hit
//! effects, commentary) is kept by the session driver.

use serde::{Deserialize, Serialize};

use super::catalog::{Category, ObjectKind};
use crate::consts::*;
use crate::skins::{SessionParams, Skin};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Objects fall, timers run
    Playing,
    /// Frozen by the player
    Paused,
    /// Between levels, waiting for an explicit continue
    LevelTransition,
    /// Session over, final state kept for display
    Ended,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// Full duration survived
    Time,
    /// Focus ran out
    Focus,
}

/// An object falling down a lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingObject {
    pub id: u32,
    pub kind: ObjectKind,
    pub lane: u8,
    /// Session time (elapsed ms) at spawn
    pub spawn_ms: u64,
    pub fall_duration_ms: f32,
    /// Position along the lane, 0-100
    pub progress: f32,
    pub caught: bool,
    pub missed: bool,
}

impl FallingObject {
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn is_resolved(&self) -> bool {
        self.caught || self.missed
    }

    /// Raw (uncapped) progress at the given session time
    pub fn progress_at(&self, elapsed_ms: u64) -> f32 {
        let since_spawn = elapsed_ms.saturating_sub(self.spawn_ms) as f32;
        since_spawn / self.fall_duration_ms * 100.0
    }

    /// True once the exit animation window has passed
    pub fn expired(&self, elapsed_ms: u64) -> bool {
        let end = self.spawn_ms as f32 + self.fall_duration_ms + PRUNE_GRACE_MS as f32;
        elapsed_ms as f32 >= end
    }
}

/// Final result of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub score: u64,
    pub max_combo: u32,
    pub level: u32,
    pub reason: EndReason,
}

/// Something that happened during a tick, tap or spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Spawned { id: u32, lane: u8, kind: ObjectKind },
    Caught { lane: u8, kind: ObjectKind, multiplier: u32, awarded: u64 },
    MalusCaught { lane: u8, kind: ObjectKind },
    Missed { lane: u8, kind: ObjectKind },
    Dodged { lane: u8, kind: ObjectKind },
    LevelComplete { level: u32 },
    GameOver(SessionSummary),
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub skin: Skin,
    /// Difficulty picked on the start screen (1-3)
    pub start_difficulty: f32,
    pub focus: f32,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    /// Time advanced by ticks only (frozen while paused or between levels)
    pub elapsed_ms: u64,
    /// Current level, 1-based
    pub level: u32,
    pub difficulty: f32,
    pub phase: GamePhase,
    pub end_reason: Option<EndReason>,
    /// Live objects, oldest first
    pub objects: Vec<FallingObject>,
    /// Events since the driver last drained them
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    pub fn new(params: &SessionParams) -> Self {
        let start_difficulty = params.difficulty as f32;
        Self {
            skin: params.skin,
            start_difficulty,
            focus: FOCUS_MAX,
            score: 0,
            combo: 0,
            max_combo: 0,
            elapsed_ms: 0,
            level: 1,
            difficulty: start_difficulty,
            phase: GamePhase::Playing,
            end_reason: None,
            objects: Vec::new(),
            events: Vec::new(),
            next_id: 0,
        }
    }

    /// Allocate a new object ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Spawn cadence for the current difficulty and skin
    pub fn spawn_interval_ms(&self) -> f32 {
        let base = BASE_SPAWN_INTERVAL_MS * self.skin.spawn_mod();
        let scaled = base / (1.0 + (self.difficulty - 1.0) * SPAWN_DIFFICULTY_FACTOR);
        scaled.max(MIN_SPAWN_INTERVAL_MS)
    }

    /// Fall time for an object spawned now
    pub fn fall_duration_ms(&self) -> f32 {
        let base = OBJECT_FALL_DURATION_MS / (1.0 + (self.difficulty - 1.0) * FALL_DIFFICULTY_FACTOR);
        base * self.skin.speed_mod()
    }

    /// Step function of elapsed time, plus a step per level cleared
    pub fn recompute_difficulty(&mut self) {
        let steps = (self.elapsed_ms / DIFFICULTY_INCREASE_INTERVAL_MS) as f32;
        let levels = (self.level - 1) as f32;
        self.difficulty = self.start_difficulty + (steps + levels) * DIFFICULTY_STEP;
    }

    /// Whole seconds left in the current level (for the HUD)
    pub fn level_time_remaining_secs(&self) -> u64 {
        let level_start = (self.level as u64 - 1) * LEVEL_DURATION_MS;
        let in_level = self.elapsed_ms.saturating_sub(level_start);
        (LEVEL_DURATION_MS / 1000).saturating_sub(in_level / 1000)
    }

    pub fn add_focus(&mut self, amount: f32) {
        self.focus = (self.focus + amount).clamp(0.0, FOCUS_MAX);
    }

    pub fn remove_focus(&mut self, amount: f32) {
        self.focus = (self.focus - amount).clamp(0.0, FOCUS_MAX);
    }

    /// Reset the streak (miss or malus)
    pub fn break_combo(&mut self) {
        self.combo = 0;
    }

    /// Extend the streak and track the best one
    pub fn extend_combo(&mut self) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.end_reason.map(|reason| SessionSummary {
            score: self.score,
            max_combo: self.max_combo,
            level: self.level,
            reason,
        })
    }

    /// Drain events for the driver
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = GameState::new(&SessionParams::default());
        assert_eq!(state.focus, FOCUS_MAX);
        assert_eq!(state.level, 1);
        assert_eq!(state.difficulty, 1.0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.summary().is_none());
    }

    #[test]
    fn test_spawn_interval_floor() {
        let mut state = GameState::new(&SessionParams::default());
        assert!((state.spawn_interval_ms() - 1400.0).abs() < 0.01);
        state.difficulty = 10.0;
        assert_eq!(state.spawn_interval_ms(), MIN_SPAWN_INTERVAL_MS);
    }

    #[test]
    fn test_fall_duration_uses_skin_speed() {
        let params = SessionParams {
            skin: Skin::Surf,
            difficulty: 1,
        };
        let state = GameState::new(&params);
        assert!((state.fall_duration_ms() - 2600.0 * 1.15).abs() < 0.01);
    }

    #[test]
    fn test_difficulty_steps() {
        let mut state = GameState::new(&SessionParams::default());
        state.elapsed_ms = 7_900;
        state.recompute_difficulty();
        assert_eq!(state.difficulty, 1.0);
        state.elapsed_ms = 16_000;
        state.recompute_difficulty();
        assert_eq!(state.difficulty, 2.0);
        state.level = 2;
        state.recompute_difficulty();
        assert_eq!(state.difficulty, 2.5);
    }

    #[test]
    fn test_focus_clamps() {
        let mut state = GameState::new(&SessionParams::default());
        state.add_focus(50.0);
        assert_eq!(state.focus, FOCUS_MAX);
        state.remove_focus(500.0);
        assert_eq!(state.focus, 0.0);
    }
}

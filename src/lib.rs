//! Booth Catch - a four-lane catch game for event booths
//!
//! Core modules:
//! - `sim`: Deterministic session engine (spawning, falling, catching, scoring)
//! - `feedback`: Hit effects, commentary and end-screen copy
//! - `skins`: Cosmetic skins and session start parameters
//! - `leaderboard`: Per-device recent runs board
//! - `booth`: Server-side collaborators (gate, limiter, scoreboard, stats)
//! - `audio`: Web Audio hit cues (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod booth;
pub mod feedback;
pub mod leaderboard;
pub mod skins;
pub mod sim;

pub use leaderboard::RecentRuns;
pub use skins::{PlayerIdentity, SessionParams, Skin};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation tick (ms)
    pub const TICK_MS: u64 = 100;

    /// Number of lanes (mapped to D, F, J, K)
    pub const LANE_COUNT: usize = 4;
    /// Per-lane tap debounce
    pub const LANE_COOLDOWN_MS: u64 = 150;

    /// Focus gauge
    pub const FOCUS_MAX: f32 = 100.0;
    /// Passive focus loss per second
    pub const FOCUS_DECAY_RATE: f32 = 2.5;

    /// Spawner cadence
    pub const BASE_SPAWN_INTERVAL_MS: f32 = 1400.0;
    pub const MIN_SPAWN_INTERVAL_MS: f32 = 600.0;
    pub const SPAWN_DIFFICULTY_FACTOR: f32 = 0.35;

    /// Time for an object to cross the whole lane at difficulty 1
    pub const OBJECT_FALL_DURATION_MS: f32 = 2600.0;
    pub const FALL_DIFFICULTY_FACTOR: f32 = 0.1;

    /// Difficulty ramps by DIFFICULTY_STEP every interval, and again per level cleared
    pub const DIFFICULTY_INCREASE_INTERVAL_MS: u64 = 8000;
    pub const DIFFICULTY_STEP: f32 = 0.5;

    /// Levels ("weeks")
    pub const LEVEL_DURATION_MS: u64 = 20_000;
    pub const TOTAL_LEVELS: u32 = 5;
    pub const GAME_DURATION_MS: u64 = LEVEL_DURATION_MS * TOTAL_LEVELS as u64;

    /// Catch zone and multiplier bands, in percent of the fall path
    pub const CATCH_ZONE_START: f32 = 75.0;
    pub const CATCH_ZONE_END: f32 = 100.0;
    pub const TRIPLE_ZONE: (f32, f32) = (88.0, 92.0);
    pub const DOUBLE_ZONE: (f32, f32) = (84.0, 96.0);

    /// Combo bonus: +COMBO_BONUS_STEP per COMBO_BONUS_EVERY catches
    pub const COMBO_BONUS_EVERY: u32 = 5;
    pub const COMBO_BONUS_STEP: f32 = 0.2;

    /// Focus adjustments
    pub const MISS_PENALTY: f32 = 12.0;
    pub const ESSENTIAL_MISS_PENALTY: f32 = 20.0;
    pub const MALUS_FOCUS_PENALTY: f32 = 15.0;
    pub const DODGE_REFUND: f32 = 3.0;
    pub const CATCH_FOCUS: f32 = 3.0;
    pub const ESSENTIAL_FOCUS: f32 = 12.0;

    /// Resolved objects stay around this long for their exit animation
    pub const PRUNE_GRACE_MS: u64 = 500;

    /// Presentation timings
    pub const HIT_EFFECT_LIFETIME_MS: u64 = 600;
    pub const COMMENT_COOLDOWN_MS: u64 = 3500;
    pub const COMMENT_DISPLAY_MS: u64 = 2000;

    /// Scores accepted per player (and per IP)
    pub const SUBMISSION_CAP: u32 = 3;
}

//! Deterministic session engine
//!
//! All gameplay logic lives here. Given the same parameters, seed and input
//! timeline, a session plays out identically:
//! - Fixed 100 ms tick, driven by a virtual clock
//! - Seeded RNG only
//! - Objects resolved in spawn order
//! - No DOM, audio or network dependencies

pub mod catalog;
pub mod scoring;
pub mod session;
pub mod state;
pub mod tick;

pub use catalog::{Category, ObjectKind};
pub use scoring::{awarded_points, combo_multiplier, in_catch_zone, zone_multiplier};
pub use session::Session;
pub use state::{EndReason, FallingObject, GameEvent, GamePhase, GameState, SessionSummary};
pub use tick::{TapOutcome, check_end, continue_level, spawn, tap_lane, tick, toggle_pause};

//! Fixed timestep session tick and input handling
//!
//! Core game loop that advances the session deterministically. Every entry
//! point checks the phase first so a stale timer can never mutate a paused,
//! transitioning or finished session.

use rand::Rng;

use super::catalog::{Category, ObjectKind};
use super::scoring::{awarded_points, in_catch_zone, zone_multiplier};
use super::state::{EndReason, FallingObject, GameEvent, GamePhase, GameState};
use crate::consts::*;

/// Result of a lane tap
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapOutcome {
    /// Nothing catchable in the lane (air tap, no penalty)
    Empty,
    /// Positive object caught
    Caught {
        kind: ObjectKind,
        multiplier: u32,
        awarded: u64,
    },
    /// Malus object caught
    Malus { kind: ObjectKind },
}

/// Advance the session by one tick
pub fn tick(state: &mut GameState) {
    if !state.is_running() {
        return;
    }

    state.elapsed_ms += TICK_MS;
    let now = state.elapsed_ms;

    // Advance falling objects and resolve the ones that reached the bottom
    let mut missed = 0u32;
    let mut missed_essential = false;
    let mut dodged = 0u32;
    let mut events = Vec::new();

    for obj in state.objects.iter_mut() {
        if obj.is_resolved() {
            continue;
        }

        let progress = obj.progress_at(now);
        if progress < 100.0 {
            obj.progress = progress;
            continue;
        }

        obj.progress = 100.0;
        obj.missed = true;
        if obj.kind.is_malus() {
            dodged += 1;
            events.push(GameEvent::Dodged {
                lane: obj.lane,
                kind: obj.kind,
            });
        } else {
            missed += 1;
            if obj.category() == Category::Essential {
                missed_essential = true;
            }
            events.push(GameEvent::Missed {
                lane: obj.lane,
                kind: obj.kind,
            });
        }
    }
    state.events.extend(events);

    if missed > 0 {
        let penalty = if missed_essential {
            ESSENTIAL_MISS_PENALTY
        } else {
            MISS_PENALTY
        };
        state.remove_focus(penalty * missed as f32);
        state.break_combo();
    }
    if dodged > 0 {
        state.add_focus(DODGE_REFUND * dodged as f32);
    }

    // Resolved objects linger for their exit animation
    state
        .objects
        .retain(|obj| !obj.is_resolved() || !obj.expired(now));

    // Passive decay
    state.remove_focus(FOCUS_DECAY_RATE * TICK_MS as f32 / 1000.0);

    state.recompute_difficulty();

    if !check_end(state) {
        check_level_transition(state);
    }
}

/// Spawn one object with a random lane and kind
///
/// Returns the new object's ID, or None when the session is not running.
pub fn spawn<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) -> Option<u32> {
    if !state.is_running() {
        return None;
    }

    let lane = rng.random_range(0..LANE_COUNT) as u8;
    let kind = ObjectKind::random(rng);
    let fall_duration_ms = state.fall_duration_ms();
    let id = state.next_entity_id();

    state.objects.push(FallingObject {
        id,
        kind,
        lane,
        spawn_ms: state.elapsed_ms,
        fall_duration_ms,
        progress: 0.0,
        caught: false,
        missed: false,
    });
    state.events.push(GameEvent::Spawned { id, lane, kind });

    Some(id)
}

/// Tap a lane: catch the first unresolved object sitting in the catch zone
pub fn tap_lane(state: &mut GameState, lane: u8) -> TapOutcome {
    if !state.is_running() || lane as usize >= LANE_COUNT {
        return TapOutcome::Empty;
    }

    let Some(obj) = state
        .objects
        .iter_mut()
        .find(|o| !o.is_resolved() && o.lane == lane && in_catch_zone(o.progress))
    else {
        return TapOutcome::Empty;
    };

    obj.caught = true;
    let kind = obj.kind;
    let multiplier = zone_multiplier(obj.progress);

    let outcome = if kind.is_malus() {
        state.score = state.score.saturating_sub(kind.points().unsigned_abs() as u64);
        state.break_combo();
        state.remove_focus(MALUS_FOCUS_PENALTY);
        state.events.push(GameEvent::MalusCaught { lane, kind });
        TapOutcome::Malus { kind }
    } else {
        let awarded = awarded_points(kind.points(), state.combo, multiplier);
        state.score += awarded;
        state.extend_combo();
        if kind.category() == Category::Essential {
            state.add_focus(ESSENTIAL_FOCUS);
        } else {
            state.add_focus(CATCH_FOCUS);
        }
        state.events.push(GameEvent::Caught {
            lane,
            kind,
            multiplier,
            awarded,
        });
        TapOutcome::Caught {
            kind,
            multiplier,
            awarded,
        }
    };

    check_end(state);
    outcome
}

/// Resume after a level transition
pub fn continue_level(state: &mut GameState) -> bool {
    if state.phase != GamePhase::LevelTransition {
        return false;
    }
    state.level += 1;
    state.phase = GamePhase::Playing;
    state.recompute_difficulty();
    log::info!("Level {} started (difficulty {:.1})", state.level, state.difficulty);
    true
}

/// Toggle pause; returns true when the session is now paused
pub fn toggle_pause(state: &mut GameState) -> bool {
    state.phase = match state.phase {
        GamePhase::Playing => GamePhase::Paused,
        GamePhase::Paused => GamePhase::Playing,
        other => other,
    };
    state.phase == GamePhase::Paused
}

/// End the session if time or focus ran out; returns true when ended
pub fn check_end(state: &mut GameState) -> bool {
    if state.phase == GamePhase::Ended {
        return true;
    }

    let reason = if state.elapsed_ms >= GAME_DURATION_MS {
        EndReason::Time
    } else if state.focus <= 0.0 {
        EndReason::Focus
    } else {
        return false;
    };

    state.phase = GamePhase::Ended;
    state.end_reason = Some(reason);
    if let Some(summary) = state.summary() {
        log::info!(
            "Session over ({:?}): score {}, max combo {}, level {}",
            reason,
            summary.score,
            summary.max_combo,
            summary.level
        );
        state.events.push(GameEvent::GameOver(summary));
    }
    true
}

/// Freeze between levels once the current one has run its course
fn check_level_transition(state: &mut GameState) {
    let level_should_be = (state.elapsed_ms / LEVEL_DURATION_MS) as u32 + 1;
    if level_should_be > state.level && state.level < TOTAL_LEVELS {
        state.objects.clear();
        state.phase = GamePhase::LevelTransition;
        state.events.push(GameEvent::LevelComplete { level: state.level });
        log::debug!("Level {} complete at {}ms", state.level, state.elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skins::SessionParams;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DECAY: f32 = FOCUS_DECAY_RATE * TICK_MS as f32 / 1000.0;

    fn new_state() -> GameState {
        GameState::new(&SessionParams::default())
    }

    /// Push an object already at the given progress
    fn place(state: &mut GameState, kind: ObjectKind, lane: u8, progress: f32) -> u32 {
        let id = state.next_entity_id();
        let fall = 1000.0;
        let travelled = (progress / 100.0 * fall) as u64;
        state.objects.push(FallingObject {
            id,
            kind,
            lane,
            spawn_ms: state.elapsed_ms.saturating_sub(travelled),
            fall_duration_ms: fall,
            progress,
            caught: false,
            missed: false,
        });
        id
    }

    fn advance(state: &mut GameState, ticks: u32) {
        for _ in 0..ticks {
            tick(state);
        }
    }

    #[test]
    fn test_tap_multiplier_bands() {
        for (progress, expected) in [(90.0, 3), (85.0, 2), (78.0, 1)] {
            let mut state = new_state();
            place(&mut state, ObjectKind::Cours, 0, progress);
            let outcome = tap_lane(&mut state, 0);
            assert_eq!(
                outcome,
                TapOutcome::Caught {
                    kind: ObjectKind::Cours,
                    multiplier: expected,
                    awarded: 10 * expected as u64,
                }
            );
        }
    }

    #[test]
    fn test_tap_outside_zone_is_noop() {
        let mut state = new_state();
        place(&mut state, ObjectKind::Cours, 1, 50.0);
        assert_eq!(tap_lane(&mut state, 1), TapOutcome::Empty);
        assert_eq!(state.score, 0);
        assert_eq!(state.focus, FOCUS_MAX);
        assert!(!state.objects[0].caught);

        // Empty lane
        assert_eq!(tap_lane(&mut state, 3), TapOutcome::Empty);
        // Out of range lane
        assert_eq!(tap_lane(&mut state, 9), TapOutcome::Empty);
    }

    #[test]
    fn test_tap_skips_objects_not_yet_in_zone() {
        let mut state = new_state();
        place(&mut state, ObjectKind::Cours, 2, 40.0);
        let target = place(&mut state, ObjectKind::Exam, 2, 80.0);
        let outcome = tap_lane(&mut state, 2);
        assert!(matches!(outcome, TapOutcome::Caught { kind: ObjectKind::Exam, .. }));
        assert!(state.objects.iter().any(|o| o.id == target && o.caught));
    }

    #[test]
    fn test_combo_bonus_applied() {
        let mut state = new_state();
        state.combo = 12;
        place(&mut state, ObjectKind::Cours, 0, 78.0);
        let outcome = tap_lane(&mut state, 0);
        assert_eq!(
            outcome,
            TapOutcome::Caught {
                kind: ObjectKind::Cours,
                multiplier: 1,
                awarded: 14,
            }
        );
        assert_eq!(state.combo, 13);
        assert_eq!(state.max_combo, 13);
    }

    #[test]
    fn test_malus_catch() {
        let mut state = new_state();
        state.score = 12;
        state.combo = 7;
        place(&mut state, ObjectKind::Virus, 3, 90.0);
        let outcome = tap_lane(&mut state, 3);
        assert_eq!(outcome, TapOutcome::Malus { kind: ObjectKind::Virus });
        assert_eq!(state.score, 0);
        assert_eq!(state.combo, 0);
        assert_eq!(state.focus, FOCUS_MAX - MALUS_FOCUS_PENALTY);
    }

    #[test]
    fn test_focus_gain_on_catch() {
        let mut state = new_state();
        state.focus = 50.0;
        place(&mut state, ObjectKind::Cafe, 0, 80.0);
        tap_lane(&mut state, 0);
        assert_eq!(state.focus, 62.0);

        place(&mut state, ObjectKind::Pizza, 1, 80.0);
        tap_lane(&mut state, 1);
        assert_eq!(state.focus, 65.0);

        state.focus = 99.0;
        place(&mut state, ObjectKind::Sommeil, 2, 80.0);
        tap_lane(&mut state, 2);
        assert_eq!(state.focus, FOCUS_MAX);
    }

    #[test]
    fn test_missed_essential_penalty() {
        let mut state = new_state();
        state.elapsed_ms = 5_000;
        state.combo = 4;
        place(&mut state, ObjectKind::Cafe, 0, 95.0);
        tick(&mut state);
        assert!((state.focus - (FOCUS_MAX - 20.0 - DECAY)).abs() < 1e-4);
        assert_eq!(state.combo, 0);
        assert!(state.objects[0].missed);
    }

    #[test]
    fn test_missed_regular_penalty() {
        let mut state = new_state();
        state.elapsed_ms = 5_000;
        place(&mut state, ObjectKind::Sms, 1, 95.0);
        tick(&mut state);
        assert!((state.focus - (FOCUS_MAX - 12.0 - DECAY)).abs() < 1e-4);
    }

    #[test]
    fn test_simultaneous_misses_multiply() {
        let mut state = new_state();
        state.elapsed_ms = 5_000;
        place(&mut state, ObjectKind::Sms, 0, 95.0);
        place(&mut state, ObjectKind::Cafe, 1, 95.0);
        tick(&mut state);
        // Any essential in the batch raises the per-miss penalty
        assert!((state.focus - (FOCUS_MAX - 40.0 - DECAY)).abs() < 1e-4);
    }

    #[test]
    fn test_dodged_malus_refunds_focus() {
        let mut state = new_state();
        state.elapsed_ms = 5_000;
        state.focus = 50.0;
        state.combo = 3;
        place(&mut state, ObjectKind::Bug, 0, 95.0);
        tick(&mut state);
        assert!((state.focus - (53.0 - DECAY)).abs() < 1e-4);
        assert_eq!(state.combo, 3);
        assert!(state
            .take_events()
            .contains(&GameEvent::Dodged { lane: 0, kind: ObjectKind::Bug }));
    }

    #[test]
    fn test_resolved_objects_pruned_after_grace() {
        let mut state = new_state();
        state.elapsed_ms = 5_000;
        place(&mut state, ObjectKind::Bug, 0, 95.0);
        tick(&mut state);
        assert_eq!(state.objects.len(), 1);
        advance(&mut state, 5);
        assert!(state.objects.is_empty());
    }

    #[test]
    fn test_spawn_uses_difficulty() {
        let mut state = new_state();
        let mut rng = Pcg32::seed_from_u64(7);
        let id = spawn(&mut state, &mut rng).expect("running session spawns");
        let obj = &state.objects[0];
        assert_eq!(obj.id, id);
        assert!((obj.lane as usize) < LANE_COUNT);
        assert_eq!(obj.fall_duration_ms, OBJECT_FALL_DURATION_MS);

        state.difficulty = 3.0;
        spawn(&mut state, &mut rng);
        assert!((state.objects[1].fall_duration_ms - 2600.0 / 1.2).abs() < 0.01);
    }

    #[test]
    fn test_level_transition_and_continue() {
        let mut state = new_state();
        advance(&mut state, 199);
        assert_eq!(state.phase, GamePhase::Playing);
        place(&mut state, ObjectKind::Cours, 0, 10.0);
        tick(&mut state);
        assert_eq!(state.elapsed_ms, LEVEL_DURATION_MS);
        assert_eq!(state.phase, GamePhase::LevelTransition);
        assert!(state.objects.is_empty());

        // Frozen until continued
        advance(&mut state, 10);
        assert_eq!(state.elapsed_ms, LEVEL_DURATION_MS);
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(spawn(&mut state, &mut rng).is_none());

        assert!(continue_level(&mut state));
        assert_eq!(state.level, 2);
        assert_eq!(state.phase, GamePhase::Playing);
        // 20s elapsed = 2 ramp steps, plus one level cleared
        assert_eq!(state.difficulty, 1.0 + 3.0 * DIFFICULTY_STEP);
    }

    #[test]
    fn test_session_ends_on_time() {
        let mut state = new_state();
        let mut guard = 0;
        while state.phase != GamePhase::Ended && guard < 10_000 {
            if state.phase == GamePhase::LevelTransition {
                continue_level(&mut state);
            }
            state.focus = FOCUS_MAX;
            tick(&mut state);
            guard += 1;
        }
        assert_eq!(state.end_reason, Some(EndReason::Time));
        assert_eq!(state.elapsed_ms, GAME_DURATION_MS);
        assert_eq!(state.level, TOTAL_LEVELS);

        // No more ticking
        tick(&mut state);
        assert_eq!(state.elapsed_ms, GAME_DURATION_MS);
    }

    #[test]
    fn test_session_ends_on_focus() {
        let mut state = new_state();
        state.elapsed_ms = 5_000;
        state.focus = 10.0;
        place(&mut state, ObjectKind::Stage, 0, 95.0);
        tick(&mut state);
        assert_eq!(state.focus, 0.0);
        assert_eq!(state.phase, GamePhase::Ended);
        assert_eq!(state.end_reason, Some(EndReason::Focus));
        let over = state
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver(_)))
            .count();
        assert_eq!(over, 1);
    }

    #[test]
    fn test_malus_can_end_session() {
        let mut state = new_state();
        state.focus = 10.0;
        place(&mut state, ObjectKind::Spam, 0, 80.0);
        tap_lane(&mut state, 0);
        assert_eq!(state.end_reason, Some(EndReason::Focus));
        // Further taps are ignored
        place(&mut state, ObjectKind::Cours, 1, 80.0);
        assert_eq!(tap_lane(&mut state, 1), TapOutcome::Empty);
    }

    #[test]
    fn test_pause_blocks_everything() {
        let mut state = new_state();
        place(&mut state, ObjectKind::Cours, 0, 90.0);
        assert!(toggle_pause(&mut state));
        tick(&mut state);
        assert_eq!(state.elapsed_ms, 0);
        assert_eq!(tap_lane(&mut state, 0), TapOutcome::Empty);
        assert!(!toggle_pause(&mut state));
        assert!(matches!(tap_lane(&mut state, 0), TapOutcome::Caught { .. }));
    }

    #[test]
    fn test_determinism() {
        let run = |seed: u64| {
            let mut state = new_state();
            let mut rng = Pcg32::seed_from_u64(seed);
            for i in 0..150 {
                if i % 14 == 0 {
                    spawn(&mut state, &mut rng);
                }
                tap_lane(&mut state, (i % 4) as u8);
                tick(&mut state);
            }
            (state.score, state.combo, state.objects.len(), state.focus)
        };
        assert_eq!(run(99), run(99));
    }
}

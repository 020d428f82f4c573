//! Session driver
//!
//! Owns a `GameState` and drives it from a virtual clock: a fixed tick timer,
//! a spawn timer whose period follows difficulty, per-lane tap cooldowns and
//! the feedback queues. The browser front end and the native demo both go
//! through this type.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::catalog::Category;
use super::scoring::{in_catch_zone, zone_multiplier};
use super::state::{GameEvent, GamePhase, GameState, SessionSummary};
use super::tick::{self, TapOutcome};
use crate::booth::{ScoreSink, ScoreSubmission};
use crate::consts::*;
use crate::feedback::{Comment, Commentary, HitEffect, HitEffects, HitKind, Topic};
use crate::skins::{PlayerIdentity, SessionParams};

/// Commentary draws from its own stream so flavor text never shifts gameplay
const FLAVOR_SEED_SALT: u64 = 0x706f_756c_7065;

/// A running game session
#[derive(Debug, Clone)]
pub struct Session {
    state: GameState,
    rng: Pcg32,
    flavor_rng: Pcg32,
    clock_ms: u64,
    next_tick_ms: Option<u64>,
    next_spawn_ms: Option<u64>,
    spawn_interval_ms: u64,
    lane_cooldowns: [Option<u64>; LANE_COUNT],
    effects: HitEffects,
    fresh_effects: Vec<HitEffect>,
    commentary: Commentary,
    submitted: bool,
    /// Let the driver tap lanes on its own (demo mode)
    pub autoplay: bool,
}

impl Session {
    pub fn new(params: &SessionParams, seed: u64) -> Self {
        let state = GameState::new(params);
        let spawn_interval_ms = state.spawn_interval_ms() as u64;
        let mut session = Self {
            state,
            rng: Pcg32::seed_from_u64(seed),
            flavor_rng: Pcg32::seed_from_u64(seed ^ FLAVOR_SEED_SALT),
            clock_ms: 0,
            next_tick_ms: None,
            next_spawn_ms: None,
            spawn_interval_ms,
            lane_cooldowns: [None; LANE_COUNT],
            effects: HitEffects::default(),
            fresh_effects: Vec::new(),
            commentary: Commentary::default(),
            submitted: false,
            autoplay: false,
        };
        session.arm_timers();
        session
            .commentary
            .say(Topic::Start, 0, &mut session.flavor_rng);
        log::info!(
            "Session started: skin {}, difficulty {}, seed {}",
            params.skin.as_str(),
            params.difficulty,
            seed
        );
        session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Driver clock (keeps running while paused)
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.state.summary()
    }

    pub fn effects(&self) -> &[HitEffect] {
        self.effects.active()
    }

    /// Effects created since the last call (for sound cues)
    pub fn take_new_effects(&mut self) -> Vec<HitEffect> {
        std::mem::take(&mut self.fresh_effects)
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.commentary.current(self.clock_ms)
    }

    /// Move the clock forward, firing due timers in order
    ///
    /// Tick fires before spawn when both are due at the same instant.
    pub fn advance(&mut self, ms: u64) {
        let target = self.clock_ms + ms;

        while self.state.is_running() {
            let (Some(next_tick), Some(next_spawn)) = (self.next_tick_ms, self.next_spawn_ms) else {
                self.arm_timers();
                continue;
            };

            let due = next_tick.min(next_spawn);
            if due > target {
                break;
            }
            self.clock_ms = due;

            if next_tick <= next_spawn {
                self.next_tick_ms = Some(next_tick + TICK_MS);
                tick::tick(&mut self.state);
                self.process_events();
                self.follow_spawn_interval();
                if self.autoplay {
                    self.autoplay_step();
                }
            } else {
                self.next_spawn_ms = Some(next_spawn + self.spawn_interval_ms);
                tick::spawn(&mut self.state, &mut self.rng);
                self.process_events();
            }
        }

        if !self.state.is_running() {
            self.disarm_timers();
        }
        self.clock_ms = target;
        self.effects.expire(self.clock_ms);
    }

    /// Tap a lane, honoring the per-lane cooldown
    pub fn tap(&mut self, lane: u8) -> TapOutcome {
        let index = lane as usize;
        if index >= LANE_COUNT || !self.state.is_running() {
            return TapOutcome::Empty;
        }
        if let Some(last) = self.lane_cooldowns[index] {
            if self.clock_ms.saturating_sub(last) < LANE_COOLDOWN_MS {
                return TapOutcome::Empty;
            }
        }
        self.lane_cooldowns[index] = Some(self.clock_ms);

        let outcome = tick::tap_lane(&mut self.state, lane);
        self.process_events();
        outcome
    }

    /// Flip pause; returns true when now paused
    pub fn toggle_pause(&mut self) -> bool {
        let paused = tick::toggle_pause(&mut self.state);
        if paused {
            self.disarm_timers();
        } else if self.state.is_running() {
            self.arm_timers();
        }
        paused
    }

    /// Start the next level after a transition
    pub fn continue_level(&mut self) -> bool {
        if !tick::continue_level(&mut self.state) {
            return false;
        }
        self.effects.clear();
        self.spawn_interval_ms = self.state.spawn_interval_ms() as u64;
        self.arm_timers();
        true
    }

    /// Submit the final score once; returns true if this call submitted
    ///
    /// Sink failures are logged and dropped.
    pub fn finish<S: ScoreSink + ?Sized>(&mut self, sink: &mut S, player: &PlayerIdentity) -> bool {
        if self.submitted {
            return false;
        }
        let Some(summary) = self.state.summary() else {
            return false;
        };
        self.submitted = true;

        let submission =
            ScoreSubmission::for_player(player, summary.score, summary.max_combo, summary.level);
        match sink.submit(submission) {
            Ok(()) => log::info!("Score {} submitted", summary.score),
            Err(e) => log::debug!("Score submission dropped: {e}"),
        }
        true
    }

    fn arm_timers(&mut self) {
        self.next_tick_ms = Some(self.clock_ms + TICK_MS);
        self.next_spawn_ms = Some(self.clock_ms + self.spawn_interval_ms);
    }

    fn disarm_timers(&mut self) {
        self.next_tick_ms = None;
        self.next_spawn_ms = None;
    }

    /// Restart the spawn timer when difficulty changed its period
    fn follow_spawn_interval(&mut self) {
        let interval = self.state.spawn_interval_ms() as u64;
        if interval != self.spawn_interval_ms && self.state.is_running() {
            log::debug!("Spawn interval {} -> {}ms", self.spawn_interval_ms, interval);
            self.spawn_interval_ms = interval;
            self.next_spawn_ms = Some(self.clock_ms + interval);
        }
    }

    /// Turn engine events into hit effects and commentary
    fn process_events(&mut self) {
        let now = self.clock_ms;
        for event in self.state.take_events() {
            let (effect, topic) = match event {
                GameEvent::Caught {
                    lane,
                    kind,
                    multiplier,
                    ..
                } => {
                    let hit = if multiplier >= 2 { HitKind::Perfect } else { HitKind::Good };
                    // First applicable topic wins; the cooldown drops the rest
                    let topic = if kind.category() == Category::Essential {
                        Some(Topic::Essential)
                    } else if multiplier == 3 {
                        Some(Topic::Bonus3x)
                    } else if multiplier == 2 {
                        Some(Topic::Bonus2x)
                    } else if self.state.combo % COMBO_BONUS_EVERY == 0 {
                        Some(Topic::Streak)
                    } else {
                        None
                    };
                    (Some((lane, hit, multiplier)), topic)
                }
                GameEvent::MalusCaught { lane, .. } => (Some((lane, HitKind::Malus, 1)), Some(Topic::Malus)),
                GameEvent::Missed { lane, .. } => (Some((lane, HitKind::Miss, 1)), Some(Topic::Drop)),
                GameEvent::Dodged { .. } => (None, Some(Topic::Dodge)),
                GameEvent::LevelComplete { .. } => {
                    self.effects.clear();
                    (None, None)
                }
                GameEvent::Spawned { .. } | GameEvent::GameOver(_) => (None, None),
            };

            if let Some((lane, kind, multiplier)) = effect {
                let created = self.effects.push(lane, kind, multiplier, now);
                self.fresh_effects.push(created);
            }
            if let Some(topic) = topic {
                self.commentary.say(topic, now, &mut self.flavor_rng);
            }
        }
    }

    /// Tap lanes whose first catchable object is worth tapping now
    fn autoplay_step(&mut self) {
        let next_elapsed = self.state.elapsed_ms + TICK_MS;
        let mut lanes = [false; LANE_COUNT];

        for (lane, wanted) in lanes.iter_mut().enumerate() {
            let first = self
                .state
                .objects
                .iter()
                .find(|o| !o.is_resolved() && o.lane as usize == lane && in_catch_zone(o.progress));
            if let Some(obj) = first {
                let best_now = zone_multiplier(obj.progress) == 3;
                let overshoots = obj.progress_at(next_elapsed) > TRIPLE_ZONE.1;
                *wanted = !obj.kind.is_malus() && (best_now || overshoots);
            }
        }

        for (lane, wanted) in lanes.into_iter().enumerate() {
            if wanted {
                self.tap(lane as u8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booth::BoothError;
    use crate::sim::catalog::ObjectKind;
    use crate::sim::state::{EndReason, FallingObject};
    use crate::skins::Skin;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingSink {
        received: Vec<ScoreSubmission>,
        fail: bool,
    }

    impl ScoreSink for RecordingSink {
        fn submit(&mut self, submission: ScoreSubmission) -> Result<(), BoothError> {
            self.received.push(submission);
            if self.fail { Err(BoothError::Storage) } else { Ok(()) }
        }
    }

    fn player() -> PlayerIdentity {
        PlayerIdentity {
            first_name: "Zoé".into(),
            last_name: "Dupont".into(),
            email: "zoe@x.be".into(),
            pseudo: "Zen Poulpe 42".into(),
        }
    }

    fn place(session: &mut Session, kind: ObjectKind, lane: u8, progress: f32) {
        let id = session.state.next_entity_id();
        session.state.objects.push(FallingObject {
            id,
            kind,
            lane,
            spawn_ms: session.state.elapsed_ms,
            fall_duration_ms: 1_000_000.0,
            progress,
            caught: false,
            missed: false,
        });
    }

    /// Drive a session to its end, continuing through level transitions
    fn play_out(session: &mut Session) {
        for _ in 0..1_000 {
            match session.phase() {
                GamePhase::Ended => return,
                GamePhase::LevelTransition => {
                    session.continue_level();
                }
                _ => session.advance(1_000),
            }
        }
    }

    #[test]
    fn test_start_comment() {
        let session = Session::new(&SessionParams::default(), 1);
        assert_eq!(session.comment().map(|c| c.topic), Some(Topic::Start));
    }

    #[test]
    fn test_tick_then_spawn_on_shared_instant() {
        let mut session = Session::new(&SessionParams::default(), 7);
        session.advance(1_300);
        assert_eq!(session.state().elapsed_ms, 1_300);
        assert!(session.state().objects.is_empty());

        // Both timers due at 1400; tick runs first so the spawn sees elapsed 1400
        session.advance(100);
        assert_eq!(session.state().objects.len(), 1);
        assert_eq!(session.state().objects[0].spawn_ms, 1_400);
    }

    #[test]
    fn test_spawn_timer_follows_difficulty() {
        let mut session = Session::new(&SessionParams::default(), 3);
        session.advance(8_000);
        assert_eq!(session.state().difficulty, 1.5);
        assert_eq!(session.spawn_interval_ms, 1_191);
        assert_eq!(session.next_spawn_ms, Some(8_000 + 1_191));
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut session = Session::new(&SessionParams::default(), 1);
        session.advance(500);
        assert!(session.toggle_pause());
        session.advance(5_000);
        assert_eq!(session.state().elapsed_ms, 500);
        assert_eq!(session.clock_ms(), 5_500);

        assert!(!session.toggle_pause());
        session.advance(100);
        assert_eq!(session.state().elapsed_ms, 600);
    }

    #[test]
    fn test_lane_cooldown() {
        let mut session = Session::new(&SessionParams::default(), 1);
        place(&mut session, ObjectKind::Cours, 0, 90.0);
        place(&mut session, ObjectKind::Cours, 0, 90.0);

        assert!(matches!(session.tap(0), TapOutcome::Caught { multiplier: 3, .. }));
        assert_eq!(session.tap(0), TapOutcome::Empty);

        session.clock_ms += LANE_COOLDOWN_MS;
        assert!(matches!(session.tap(0), TapOutcome::Caught { .. }));
        assert_eq!(session.state().combo, 2);
    }

    #[test]
    fn test_tap_feedback() {
        let mut session = Session::new(&SessionParams::default(), 1);
        place(&mut session, ObjectKind::Cours, 1, 78.0);
        place(&mut session, ObjectKind::Bug, 2, 90.0);
        session.tap(1);
        session.tap(2);

        let kinds: Vec<HitKind> = session.take_new_effects().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![HitKind::Good, HitKind::Malus]);
        assert!(session.take_new_effects().is_empty());
        assert_eq!(session.effects().len(), 2);

        session.advance(HIT_EFFECT_LIFETIME_MS);
        assert!(session.effects().is_empty());
    }

    #[test]
    fn test_zone_bonus_comment_beats_streak() {
        let mut session = Session::new(&SessionParams::default(), 1);
        session.clock_ms = COMMENT_COOLDOWN_MS;
        session.state.combo = 4;
        place(&mut session, ObjectKind::Cours, 0, 90.0);

        session.tap(0);
        assert_eq!(session.state().combo, 5);
        assert_eq!(session.comment().map(|c| c.topic), Some(Topic::Bonus3x));

        // A plain catch landing on the streak still gets the streak line
        let mut session = Session::new(&SessionParams::default(), 1);
        session.clock_ms = COMMENT_COOLDOWN_MS;
        session.state.combo = 9;
        place(&mut session, ObjectKind::Cours, 1, 78.0);
        session.tap(1);
        assert_eq!(session.comment().map(|c| c.topic), Some(Topic::Streak));
    }

    #[test]
    fn test_level_transition_rearms_timers() {
        let mut session = Session::new(&SessionParams::default(), 5);
        // Keep the lanes empty so misses cannot end the run early
        while session.phase() == GamePhase::Playing {
            session.state.objects.clear();
            session.advance(TICK_MS);
        }
        session.advance(5_000);
        assert_eq!(session.phase(), GamePhase::LevelTransition);
        assert_eq!(session.state().elapsed_ms, LEVEL_DURATION_MS);
        assert!(session.next_tick_ms.is_none());

        assert!(session.continue_level());
        assert_eq!(session.state().level, 2);
        session.advance(100);
        assert_eq!(session.state().elapsed_ms, LEVEL_DURATION_MS + 100);
    }

    #[test]
    fn test_submission_is_one_shot() {
        let mut session = Session::new(&SessionParams::default(), 11);
        let mut sink = RecordingSink::default();
        assert!(!session.finish(&mut sink, &player()));

        session.autoplay = true;
        play_out(&mut session);
        assert_eq!(session.phase(), GamePhase::Ended);

        assert!(session.finish(&mut sink, &player()));
        assert!(!session.finish(&mut sink, &player()));
        assert_eq!(sink.received.len(), 1);
        assert_eq!(sink.received[0].email, "zoe@x.be");
        assert_eq!(Some(sink.received[0].score), session.summary().map(|s| s.score));
    }

    #[test]
    fn test_failed_submission_not_retried() {
        let mut session = Session::new(&SessionParams::default(), 2);
        session.state.focus = 0.0;
        session.advance(100);
        assert_eq!(session.summary().map(|s| s.reason), Some(EndReason::Focus));

        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        assert!(session.finish(&mut sink, &player()));
        assert!(!session.finish(&mut sink, &player()));
        assert_eq!(sink.received.len(), 1);
    }

    #[test]
    fn test_autoplay_scores() {
        let params = SessionParams {
            skin: Skin::Travail,
            difficulty: 1,
        };
        let mut session = Session::new(&params, 99);
        session.autoplay = true;
        play_out(&mut session);

        let summary = session.summary().expect("session should end");
        assert!(summary.score > 0);
        assert!(summary.max_combo > 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut session = Session::new(&SessionParams::default(), seed);
            session.autoplay = true;
            play_out(&mut session);
            session.summary()
        };
        assert_eq!(run(42), run(42));
    }

    proptest! {
        #[test]
        fn prop_focus_and_time_stay_bounded(
            seed in any::<u64>(),
            ops in prop::collection::vec((0u8..6, 100u64..700), 1..200),
        ) {
            let mut session = Session::new(&SessionParams::default(), seed);
            for (op, ms) in ops {
                match op {
                    0..=3 => { session.tap(op); }
                    4 => session.advance(ms),
                    _ => {
                        if !session.continue_level() {
                            session.toggle_pause();
                        }
                    }
                }
                let state = session.state();
                prop_assert!((0.0..=FOCUS_MAX).contains(&state.focus));
                prop_assert!(state.elapsed_ms <= GAME_DURATION_MS);
            }
        }
    }
}

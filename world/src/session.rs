//! Score, lives, level and timers of a play session.

use std::time::Duration;

use maze_chase_core::{Outcome, PlayState, SessionRecord, SessionSnapshot};
use thiserror::Error;
use tracing::error;

use crate::config::GameConfig;

/// Breach of the progress guarantees a session must uphold between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The score went down.
    #[error("score decreased from {before} to {after}")]
    ScoreDecreased {
        /// Score before the tick.
        before: u64,
        /// Score after the tick.
        after: u64,
    },
    /// Lives were granted outside a restart.
    #[error("lives increased from {before} to {after}")]
    LivesIncreased {
        /// Lives before the tick.
        before: u32,
        /// Lives after the tick.
        after: u32,
    },
    /// The level went down.
    #[error("level decreased from {before} to {after}")]
    LevelDecreased {
        /// Level before the tick.
        before: u32,
        /// Level after the tick.
        after: u32,
    },
}

/// Counters captured before a tick so the result can be checked afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    score: u64,
    lives: u32,
    level: u32,
}

/// Mutable progress of a play session. Persists across level loads.
#[derive(Clone, Debug)]
pub(crate) struct Session {
    pub(crate) score: u64,
    pub(crate) lives: u32,
    pub(crate) level: u32,
    pub(crate) power_remaining: Duration,
    pub(crate) capture_multiplier: u32,
    pub(crate) level_time_remaining: Option<Duration>,
    pub(crate) state: PlayState,
    pub(crate) player_speed: f32,
    pub(crate) ghost_speed: f32,
}

impl Session {
    pub(crate) fn new(config: &GameConfig) -> Self {
        Self {
            score: 0,
            lives: config.starting_lives,
            level: 1,
            power_remaining: Duration::ZERO,
            capture_multiplier: 1,
            level_time_remaining: config.level_time_limit(),
            state: PlayState::Playing,
            player_speed: config.player_speed,
            ghost_speed: config.ghost_speed,
        }
    }

    pub(crate) fn power_active(&self) -> bool {
        !self.power_remaining.is_zero()
    }

    pub(crate) fn award(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Starts or re-arms the frightened window.
    pub(crate) fn arm_power(&mut self, duration: Duration) {
        self.power_remaining = duration;
    }

    pub(crate) fn clear_power(&mut self) {
        self.power_remaining = Duration::ZERO;
        self.capture_multiplier = 1;
    }

    /// Counts the frightened window down, returning `true` on the tick it expires.
    pub(crate) fn tick_power(&mut self, dt: Duration) -> bool {
        if !self.power_active() {
            return false;
        }
        self.power_remaining = self.power_remaining.saturating_sub(dt);
        if self.power_remaining.is_zero() {
            self.capture_multiplier = 1;
            return true;
        }
        false
    }

    /// Points for the next capture; doubles the multiplier for the one after.
    pub(crate) fn capture_points(&mut self, base: u64) -> u64 {
        let points = base.saturating_mul(u64::from(self.capture_multiplier));
        self.capture_multiplier = self.capture_multiplier.saturating_mul(2);
        points
    }

    /// Removes one life and returns how many are left.
    pub(crate) fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    /// Counts the level timer down, returning `true` on the tick it expires.
    ///
    /// An expired timer is immediately re-armed with the configured limit.
    pub(crate) fn tick_level_timer(&mut self, dt: Duration, limit: Option<Duration>) -> bool {
        let Some(remaining) = self.level_time_remaining else {
            return false;
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.level_time_remaining = limit;
            return true;
        }
        self.level_time_remaining = Some(remaining);
        false
    }

    /// Moves to the next level, raising both speeds up to the configured cap.
    pub(crate) fn advance_level(&mut self, config: &GameConfig) {
        self.level = self.level.saturating_add(1);
        self.clear_power();
        self.level_time_remaining = config.level_time_limit();
        self.player_speed = (self.player_speed + config.speed_increment).min(config.speed_cap);
        self.ghost_speed = (self.ghost_speed + config.speed_increment).min(config.speed_cap);
    }

    pub(crate) fn record(&self, outcome: Outcome, ticks: u64) -> SessionRecord {
        SessionRecord {
            score: self.score,
            level: self.level,
            outcome,
            ticks,
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            score: self.score,
            lives: self.lives,
            level: self.level,
            power_remaining: self.power_remaining,
            capture_multiplier: self.capture_multiplier,
            level_time_remaining: self.level_time_remaining,
            state: self.state,
        }
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            score: self.score,
            lives: self.lives,
            level: self.level,
        }
    }

    /// Compares the counters against a checkpoint taken earlier in the tick.
    pub(crate) fn verify(&self, before: Checkpoint) -> Result<(), InvariantViolation> {
        if self.score < before.score {
            return Err(InvariantViolation::ScoreDecreased {
                before: before.score,
                after: self.score,
            });
        }
        if self.lives > before.lives {
            return Err(InvariantViolation::LivesIncreased {
                before: before.lives,
                after: self.lives,
            });
        }
        if self.level < before.level {
            return Err(InvariantViolation::LevelDecreased {
                before: before.level,
                after: self.level,
            });
        }
        Ok(())
    }

    /// Verifies the counters, panicking in debug builds and restoring the
    /// checkpointed values otherwise.
    pub(crate) fn enforce(&mut self, before: Checkpoint) {
        let Err(violation) = self.verify(before) else {
            return;
        };

        if cfg!(debug_assertions) {
            panic!("session invariant violated: {violation}");
        }

        error!(%violation, "session invariant violated; restoring previous counters");
        self.score = self.score.max(before.score);
        self.lives = self.lives.min(before.lives);
        self.level = self.level.max(before.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(&GameConfig::default())
    }

    #[test]
    fn new_session_starts_on_level_one() {
        let session = session();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.lives, 3);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.capture_multiplier, 1);
        assert_eq!(snapshot.power_remaining, Duration::ZERO);
        assert_eq!(snapshot.state, PlayState::Playing);
    }

    #[test]
    fn capture_points_double_until_power_expires() {
        let mut session = session();
        session.arm_power(Duration::from_millis(100));

        assert_eq!(session.capture_points(200), 200);
        assert_eq!(session.capture_points(200), 400);
        assert_eq!(session.capture_multiplier, 4);

        assert!(!session.tick_power(Duration::from_millis(60)));
        assert!(session.tick_power(Duration::from_millis(60)));
        assert!(!session.tick_power(Duration::from_millis(60)));
        assert_eq!(session.capture_multiplier, 1);
        assert_eq!(session.capture_points(200), 200);
    }

    #[test]
    fn advancing_levels_caps_speeds() {
        let config = GameConfig::default();
        let mut session = Session::new(&config);
        for _ in 0..20 {
            session.advance_level(&config);
        }
        assert_eq!(session.level, 21);
        assert_eq!(session.player_speed, config.speed_cap);
        assert_eq!(session.ghost_speed, config.speed_cap);
    }

    #[test]
    fn level_timer_rearms_on_expiry() {
        let limit = Some(Duration::from_secs(2));
        let mut session = session();
        session.level_time_remaining = limit;

        assert!(!session.tick_level_timer(Duration::from_secs(1), limit));
        assert!(session.tick_level_timer(Duration::from_secs(1), limit));
        assert_eq!(session.level_time_remaining, limit);
    }

    #[test]
    fn verify_reports_decreasing_score() {
        let mut session = session();
        session.award(50);
        let before = session.checkpoint();
        session.score = 10;
        assert_eq!(
            session.verify(before),
            Err(InvariantViolation::ScoreDecreased {
                before: 50,
                after: 10
            })
        );
    }

    #[test]
    fn verify_accepts_lost_lives_and_new_levels() {
        let config = GameConfig::default();
        let mut session = Session::new(&config);
        let before = session.checkpoint();
        let _ = session.lose_life();
        session.advance_level(&config);
        session.award(10);
        assert_eq!(session.verify(before), Ok(()));
    }
}

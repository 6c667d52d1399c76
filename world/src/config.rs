//! Tunable rules of the simulation.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Numeric rules applied by the world while simulating a session.
///
/// Speeds are expressed in world units per second and are scaled by the tick
/// duration, so the configured values hold for any tick rate. The defaults
/// match the classic arcade pacing at 60 ticks per second.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of a maze tile in world units.
    pub tile_size: f32,
    /// Lives granted at the start of a session.
    pub starting_lives: u32,
    /// Player speed on level one.
    pub player_speed: f32,
    /// Ghost speed on level one.
    pub ghost_speed: f32,
    /// Speed added to the player and the ghosts on every cleared level.
    pub speed_increment: f32,
    /// Upper bound for both speeds.
    pub speed_cap: f32,
    /// Length of the frightened window in milliseconds.
    pub power_duration_ms: u64,
    /// Points awarded for a regular pellet.
    pub pellet_score: u64,
    /// Points awarded for a power pellet.
    pub power_pellet_score: u64,
    /// Points awarded for the first capture of a frightened window.
    pub capture_base_score: u64,
    /// Distance from a tile centre within which queued headings may be committed.
    pub turn_tolerance: f32,
    /// Speed multiplier applied to frightened ghosts.
    pub frightened_speed_factor: f32,
    /// Speed multiplier applied to ghosts returning to their spawn.
    pub returning_speed_factor: f32,
    /// Optional per-level countdown in milliseconds; expiry costs a life.
    pub level_time_limit_ms: Option<u64>,
    /// Optional final level; clearing it wins the session.
    pub max_level: Option<u32>,
}

impl GameConfig {
    /// Length of the frightened window.
    #[must_use]
    pub const fn power_duration(&self) -> Duration {
        Duration::from_millis(self.power_duration_ms)
    }

    /// Per-level countdown, when enabled.
    #[must_use]
    pub fn level_time_limit(&self) -> Option<Duration> {
        self.level_time_limit_ms.map(Duration::from_millis)
    }

    /// Checks that the rules describe a playable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tile_size > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "tile_size",
                value: self.tile_size,
            });
        }
        for (field, value) in [
            ("player_speed", self.player_speed),
            ("ghost_speed", self.ghost_speed),
            ("speed_cap", self.speed_cap),
            ("frightened_speed_factor", self.frightened_speed_factor),
            ("returning_speed_factor", self.returning_speed_factor),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        if self.max_level == Some(0) {
            return Err(ConfigError::ZeroMaxLevel);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            starting_lives: 3,
            player_speed: 320.0,
            ghost_speed: 240.0,
            speed_increment: 30.0,
            speed_cap: 480.0,
            power_duration_ms: 10_000,
            pellet_score: 10,
            power_pellet_score: 50,
            capture_base_score: 200,
            turn_tolerance: 4.0,
            frightened_speed_factor: 1.0,
            returning_speed_factor: 2.0,
            level_time_limit_ms: None,
            max_level: None,
        }
    }
}

/// Reasons a [`GameConfig`] may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A size, speed or factor was zero, negative or not a number.
    #[error("`{field}` must be positive (received {value})")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// The session would start without lives.
    #[error("`starting_lives` must be at least one")]
    NoLives,
    /// The session could never be played.
    #[error("`max_level` must be at least one when set")]
    ZeroMaxLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_tile_size() {
        let config = GameConfig {
            tile_size: 0.0,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "tile_size",
                value: 0.0
            })
        );
    }

    #[test]
    fn rejects_sessions_without_lives() {
        let config = GameConfig {
            starting_lives: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoLives));
    }
}

//! File-based configuration for the command-line adapter.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use maze_chase_system_ghost_ai::Config as GhostConfig;
use maze_chase_system_scheduler::Config as SchedulerConfig;
use maze_chase_world::{GameConfig, CLASSIC_LAYOUT};
use serde::Deserialize;

/// Every tunable the CLI forwards to the world and the systems.
///
/// Each table is optional; missing keys keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    /// Rules of the simulation.
    pub(crate) game: GameConfig,
    /// Ghost behaviour tuning.
    pub(crate) ghosts: GhostConfig,
    /// Tick rate and backlog limits.
    pub(crate) scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Reads the TOML file at `path`, or returns the defaults when absent.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Reads map rows from a text file, one row per line, or falls back to the
/// built-in classic layout.
pub(crate) fn load_map(path: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(CLASSIC_LAYOUT.iter().map(|row| (*row).to_owned()).collect());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read map file {}", path.display()))?;
    Ok(text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

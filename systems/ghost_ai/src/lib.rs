#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized ghost behaviour that proposes headings at junctions and walls.

use std::collections::BTreeSet;

use maze_chase_core::{
    Command, EntityId, Event, GhostId, GhostMode, GhostSnapshot, GhostView, Heading, Rect,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{trace, warn};

/// Tuning knobs for ghost re-evaluation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Probability that a ghost reconsiders its heading on an otherwise uneventful tick.
    pub turn_chance: f64,
    /// How far ahead of a ghost the wall probe looks, in world units.
    pub probe_distance: f32,
    /// Seed of the random stream, so sessions replay identically.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            turn_chance: 0.02,
            probe_distance: 8.0,
            seed: 0x6d61_7a65_6368_6173,
        }
    }
}

/// Pure system that reacts to world events and emits ghost steering commands.
#[derive(Debug)]
pub struct GhostAi {
    turn_chance: f64,
    probe_distance: f32,
    rng: ChaCha8Rng,
    blocked: BTreeSet<GhostId>,
}

impl GhostAi {
    /// Creates the system with its own seeded random stream.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let turn_chance = if (0.0..=1.0).contains(&config.turn_chance) {
            config.turn_chance
        } else {
            warn!(
                turn_chance = config.turn_chance,
                "turn chance outside [0, 1]; random turns disabled"
            );
            0.0
        };

        Self {
            turn_chance,
            probe_distance: config.probe_distance.max(0.0),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            blocked: BTreeSet::new(),
        }
    }

    /// Consumes world events and the ghost view to emit steering commands.
    ///
    /// `is_wall` reports whether a box overlaps a wall, treating everything
    /// beyond the grid as solid. Returning ghosts are left to the world.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        ghost_view: &GhostView,
        is_wall: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(Rect) -> bool,
    {
        for event in events {
            match event {
                Event::EntityBlocked {
                    entity: EntityId::Ghost(ghost),
                } => {
                    let _ = self.blocked.insert(*ghost);
                }
                Event::EntitiesReset | Event::SessionRestarted => self.blocked.clear(),
                _ => {}
            }
        }

        for ghost in ghost_view.iter() {
            let was_blocked = self.blocked.remove(&ghost.id);
            if ghost.mode == GhostMode::Returning {
                continue;
            }
            if ghost.desired.is_some() && !was_blocked {
                continue;
            }
            if !self.should_reconsider(ghost, was_blocked, &is_wall) {
                continue;
            }

            let candidates = candidate_headings(ghost, ghost_view.tile_size(), &is_wall);
            let Some(&heading) = candidates.choose(&mut self.rng) else {
                continue;
            };
            if ghost.heading == Some(heading) && ghost.desired.is_none() {
                continue;
            }

            trace!(ghost = ?ghost.id, ?heading, "ghost steered");
            out.push(Command::SteerGhost {
                ghost: ghost.id,
                heading,
            });
        }
    }

    fn should_reconsider<F>(
        &mut self,
        ghost: &GhostSnapshot,
        was_blocked: bool,
        is_wall: &F,
    ) -> bool
    where
        F: Fn(Rect) -> bool,
    {
        let Some(heading) = ghost.heading else {
            return true;
        };
        if was_blocked || is_wall(ghost.bounds.shifted(heading, self.probe_distance)) {
            return true;
        }
        self.turn_chance > 0.0 && self.rng.gen_bool(self.turn_chance)
    }
}

impl Default for GhostAi {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Open headings out of the ghost's tile, without the reversal unless it is
/// the only way out.
fn candidate_headings<F>(ghost: &GhostSnapshot, tile_size: f32, is_wall: &F) -> Vec<Heading>
where
    F: Fn(Rect) -> bool,
{
    let open: Vec<Heading> = Heading::ALL
        .into_iter()
        .filter(|heading| {
            let (dx, dy) = heading.delta();
            let column = i64::from(ghost.cell.column()) + dx;
            let row = i64::from(ghost.cell.row()) + dy;
            let neighbour = Rect::new(
                column as f32 * tile_size,
                row as f32 * tile_size,
                tile_size,
                tile_size,
            );
            !is_wall(neighbour)
        })
        .collect();

    let Some(reverse) = ghost.heading.map(Heading::reverse) else {
        return open;
    };
    let forward: Vec<Heading> = open
        .iter()
        .copied()
        .filter(|heading| *heading != reverse)
        .collect();
    if forward.is_empty() {
        open
    } else {
        forward
    }
}

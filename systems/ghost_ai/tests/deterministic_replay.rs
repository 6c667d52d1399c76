use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use maze_chase_core::{CellCoord, Command, EntityId, Event, GhostId, GhostMode, Heading};
use maze_chase_system_ghost_ai::{Config, GhostAi};
use maze_chase_world::{self as world, query, GameConfig, World, CLASSIC_LAYOUT};

const FRAME: Duration = Duration::from_micros(16_667);

#[test]
fn deterministic_replay_produces_identical_sessions() {
    let first = replay(7, 1_200);
    let second = replay(7, 1_200);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(
        first
            .events
            .iter()
            .any(|event| matches!(event, EventRecord::HeadingCommitted { entity: EntityId::Ghost(_), .. })),
        "ghosts never moved"
    );
}

#[test]
fn different_seeds_diverge() {
    let first = replay(1, 600);
    let second = replay(2, 600);

    assert_ne!(first.fingerprint(), second.fingerprint());
}

fn replay(seed: u64, ticks: usize) -> ReplayOutcome {
    let mut world =
        World::from_layout(&CLASSIC_LAYOUT[..], GameConfig::default()).expect("classic layout");
    let mut ghosts = GhostAi::new(&Config {
        seed,
        ..Config::default()
    });
    let mut log = Vec::new();
    let mut events = Vec::new();

    for tick in 0..ticks {
        let mut commands = Vec::new();
        ghosts.handle(
            &events,
            &query::ghost_view(&world),
            query::wall_probe(&world),
            &mut commands,
        );
        if tick % 90 == 0 {
            commands.push(Command::RequestHeading {
                heading: Heading::ALL[(tick / 90) % Heading::ALL.len()],
            });
        }
        commands.push(Command::Tick { dt: FRAME });

        events.clear();
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        log.extend(events.iter().map(EventRecord::from));
    }

    let ghosts = query::ghost_view(&world)
        .into_vec()
        .into_iter()
        .map(|ghost| GhostState {
            id: ghost.id,
            cell: ghost.cell,
            heading: ghost.heading,
            mode: ghost.mode,
        })
        .collect();

    ReplayOutcome {
        ghosts,
        score: query::session(&world).score,
        events: log,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    ghosts: Vec<GhostState>,
    score: u64,
    events: Vec<EventRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GhostState {
    id: GhostId,
    cell: CellCoord,
    heading: Option<Heading>,
    mode: GhostMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum EventRecord {
    HeadingCommitted { entity: EntityId, heading: Heading },
    EntityBlocked { entity: EntityId },
    CollectibleConsumed { cell: CellCoord, points: u64 },
    LifeLost { lives_remaining: u32 },
    Other(String),
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        match event {
            Event::HeadingCommitted { entity, heading } => Self::HeadingCommitted {
                entity: *entity,
                heading: *heading,
            },
            Event::EntityBlocked { entity } => Self::EntityBlocked { entity: *entity },
            Event::CollectibleConsumed { cell, points, .. } => Self::CollectibleConsumed {
                cell: *cell,
                points: *points,
            },
            Event::LifeLost {
                lives_remaining, ..
            } => Self::LifeLost {
                lives_remaining: *lives_remaining,
            },
            other => Self::Other(format!("{other:?}")),
        }
    }
}

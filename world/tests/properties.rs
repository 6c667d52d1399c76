use std::time::Duration;

use maze_chase_core::{Command, EntityId, Event, GhostId, Heading, SessionSnapshot};
use maze_chase_world::{self as world, query, EdgePolicy, GameConfig, World, CLASSIC_LAYOUT};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FRAME: Duration = Duration::from_micros(16_667);
const GHOSTS: [GhostId; 4] = [GhostId::Red, GhostId::Pink, GhostId::Blue, GhostId::Orange];

#[derive(Clone, Copy, Debug)]
struct Progress {
    session: SessionSnapshot,
    remaining: usize,
}

impl Progress {
    fn of(world: &World) -> Self {
        Self {
            session: query::session(world),
            remaining: query::maze(world).collectibles_remaining(),
        }
    }
}

/// Drives the classic maze with random player and ghost requests.
fn random_session(seed: u64, ticks: usize, mut check: impl FnMut(Progress, &World, &[Event])) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut world =
        World::from_layout(&CLASSIC_LAYOUT[..], GameConfig::default()).expect("classic layout");

    for _ in 0..ticks {
        let mut events = Vec::new();
        if rng.gen_bool(0.1) {
            let heading = *Heading::ALL.choose(&mut rng).expect("headings");
            world::apply(&mut world, Command::RequestHeading { heading }, &mut events);
        }
        for ghost in GHOSTS {
            if rng.gen_bool(0.05) {
                let heading = *Heading::ALL.choose(&mut rng).expect("headings");
                world::apply(&mut world, Command::SteerGhost { ghost, heading }, &mut events);
            }
        }

        let before = Progress::of(&world);
        events.clear();
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut events);
        check(before, &world, &events);

        if query::session(&world).state.is_terminal() {
            break;
        }
    }
}

#[test]
fn entities_never_overlap_walls() {
    for seed in 0..4 {
        random_session(seed, 3_000, |_, world, _| {
            let maze = query::maze(world);
            for entity in query::snapshot(world).entities {
                let edges = match entity.id {
                    EntityId::Player => EdgePolicy::Tunnel,
                    EntityId::Ghost(_) => EdgePolicy::Solid,
                };
                assert!(
                    !maze.is_wall_at(entity.bounds, edges),
                    "{:?} overlaps a wall at {:?}",
                    entity.id,
                    entity.bounds
                );
            }
        });
    }
}

#[test]
fn score_never_decreases_and_lives_never_grow() {
    for seed in 10..14 {
        random_session(seed, 3_000, |before, world, _| {
            let after = query::session(world);
            assert!(after.score >= before.session.score);
            assert!(after.lives <= before.session.lives);
            assert!(after.level >= before.session.level);
        });
    }
}

#[test]
fn each_consumption_removes_exactly_one_collectible() {
    for seed in 20..24 {
        random_session(seed, 3_000, |before, world, events| {
            let remaining = query::maze(world).collectibles_remaining();
            if events
                .iter()
                .any(|event| matches!(event, Event::LevelCleared { .. }))
            {
                assert_eq!(remaining, query::maze(world).collectibles_total());
                return;
            }

            let consumed = events
                .iter()
                .filter(|event| matches!(event, Event::CollectibleConsumed { .. }))
                .count();
            assert_eq!(remaining + consumed, before.remaining);

            let points: u64 = events
                .iter()
                .map(|event| match event {
                    Event::CollectibleConsumed { points, .. }
                    | Event::GhostCaptured { points, .. } => *points,
                    _ => 0,
                })
                .sum();
            assert_eq!(query::session(world).score, before.session.score + points);
        });
    }
}

use std::time::Duration;

use maze_chase_core::{Command, EntityId, Event, GhostId, Heading, Rect};
use maze_chase_system_ghost_ai::{Config, GhostAi};
use maze_chase_world::{self as world, query, GameConfig, World, CLASSIC_LAYOUT};

const FRAME: Duration = Duration::from_micros(16_667);

fn open_headings(world: &World, ghost: GhostId) -> Vec<Heading> {
    let view = query::ghost_view(world);
    let snapshot = view
        .iter()
        .find(|snapshot| snapshot.id == ghost)
        .copied()
        .expect("ghost present");
    let probe = query::wall_probe(world);
    let tile = view.tile_size();
    Heading::ALL
        .into_iter()
        .filter(|heading| {
            let (dx, dy) = heading.delta();
            let neighbour = Rect::new(
                (i64::from(snapshot.cell.column()) + dx) as f32 * tile,
                (i64::from(snapshot.cell.row()) + dy) as f32 * tile,
                tile,
                tile,
            );
            !probe(neighbour)
        })
        .collect()
}

#[test]
fn new_headings_never_reverse_unless_trapped() {
    for seed in 0..3 {
        let mut world =
            World::from_layout(&CLASSIC_LAYOUT[..], GameConfig::default()).expect("classic layout");
        let mut ghosts = GhostAi::new(&Config {
            seed,
            turn_chance: 0.2,
            ..Config::default()
        });
        let mut events = Vec::new();
        let mut steered = 0;

        for _ in 0..2_000 {
            let view = query::ghost_view(&world);
            let mut commands = Vec::new();
            ghosts.handle(&events, &view, query::wall_probe(&world), &mut commands);

            for command in &commands {
                let Command::SteerGhost { ghost, heading } = *command else {
                    panic!("unexpected command {command:?}");
                };
                steered += 1;
                let current = view
                    .iter()
                    .find(|snapshot| snapshot.id == ghost)
                    .and_then(|snapshot| snapshot.heading);
                if current.map(Heading::reverse) == Some(heading) {
                    let open = open_headings(&world, ghost);
                    assert_eq!(
                        open,
                        vec![heading],
                        "{ghost:?} reversed with other exits available"
                    );
                }
            }

            events.clear();
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
            world::apply(&mut world, Command::Tick { dt: FRAME }, &mut events);
            if query::session(&world).state.is_terminal() {
                break;
            }
        }

        assert!(steered > 4, "seed {seed} produced no steering");
    }
}

#[test]
fn blocked_ghost_is_redirected() {
    let mut world = World::from_layout(&["XXXXXXX", "XP  r-X", "XXXX XX", "XXXXXXX"], GameConfig::default())
        .expect("valid world");
    let mut ghosts = GhostAi::new(&Config {
        turn_chance: 0.0,
        ..Config::default()
    });
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SteerGhost {
            ghost: GhostId::Red,
            heading: Heading::Right,
        },
        &mut events,
    );

    let mut redirected = false;
    for _ in 0..60 {
        let mut commands = Vec::new();
        ghosts.handle(
            &events,
            &query::ghost_view(&world),
            query::wall_probe(&world),
            &mut commands,
        );
        redirected |= commands.iter().any(|command| {
            matches!(
                command,
                Command::SteerGhost {
                    ghost: GhostId::Red,
                    heading: Heading::Left | Heading::Down
                }
            )
        });

        events.clear();
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut events);
        assert!(!events.contains(&Event::EntityBlocked {
            entity: EntityId::Ghost(GhostId::Red)
        }) || redirected);
    }

    assert!(redirected);
}

//! Frame driver that wires the world, the ghost system and the scheduler.

use std::time::Duration;

use maze_chase_core::{Command, EntityId, Event, Heading, SessionRecord};
use maze_chase_rendering::{FrameControl, FrameInput};
use maze_chase_system_ghost_ai::GhostAi;
use maze_chase_system_scheduler::{InputQueue, RunState, TickScheduler};
use maze_chase_world::{self as world, query, EdgePolicy, World};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Owns a running session and advances it once per presented frame.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    ghosts: GhostAi,
    scheduler: TickScheduler,
    inputs: InputQueue,
    autopilot: Option<Autopilot>,
    events: Vec<Event>,
    commands: Vec<Command>,
    record: Option<SessionRecord>,
}

impl Simulation {
    pub(crate) fn new(
        world: World,
        ghosts: GhostAi,
        scheduler: TickScheduler,
        inputs: InputQueue,
        autopilot: Option<Autopilot>,
    ) -> Self {
        Self {
            world,
            ghosts,
            scheduler,
            inputs,
            autopilot,
            events: Vec::new(),
            commands: Vec::new(),
            record: None,
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn record(&self) -> Option<SessionRecord> {
        self.record
    }

    pub(crate) fn paused(&self) -> bool {
        self.scheduler.state() == RunState::Paused
    }

    /// Applies the input gathered for this frame and runs the ticks that
    /// `elapsed` is worth.
    ///
    /// Returns [`FrameControl::Exit`] once the session has ended.
    pub(crate) fn frame(&mut self, elapsed: Duration, input: FrameInput) -> FrameControl {
        let queued = self.inputs.drain();
        if input.restart {
            self.restart();
        }
        if queued.toggle_pause != input.toggle_pause {
            self.scheduler.toggle_pause();
        }

        let heading = input.heading.or(queued.heading).or_else(|| {
            self.autopilot
                .as_mut()
                .and_then(|autopilot| autopilot.choose(&self.world, &self.events))
        });
        if let Some(heading) = heading {
            world::apply(
                &mut self.world,
                Command::RequestHeading { heading },
                &mut self.events,
            );
        }

        for _ in 0..self.scheduler.advance(elapsed) {
            self.step();
        }

        if self.record.is_some() {
            FrameControl::Exit
        } else {
            FrameControl::Continue
        }
    }

    /// Runs one fixed tick: ghost decisions first, then the world.
    fn step(&mut self) {
        self.commands.clear();
        let view = query::ghost_view(&self.world);
        self.ghosts.handle(
            &self.events,
            &view,
            query::wall_probe(&self.world),
            &mut self.commands,
        );

        self.events.clear();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        world::apply(
            &mut self.world,
            Command::Tick {
                dt: self.scheduler.tick_duration(),
            },
            &mut self.events,
        );

        for event in &self.events {
            if let Event::SessionEnded { record } = event {
                debug!(ticks = record.ticks, "session record captured; scheduler stopped");
                self.record = Some(*record);
                self.scheduler.stop();
            }
        }
    }

    fn restart(&mut self) {
        self.events.clear();
        world::apply(&mut self.world, Command::Restart, &mut self.events);
        self.scheduler.restart();
        self.record = None;
    }
}

/// Picks a random open heading whenever the player stands still or runs
/// into a wall.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: ChaCha8Rng,
}

impl Autopilot {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn choose(&mut self, world: &World, events: &[Event]) -> Option<Heading> {
        let player = query::player(world);
        let blocked = events.iter().any(|event| {
            matches!(
                event,
                Event::EntityBlocked {
                    entity: EntityId::Player
                }
            )
        });
        if player.heading.is_some() && !blocked {
            return None;
        }

        let maze = query::maze(world);
        let cell = maze.cell_at(player.bounds.center())?;
        let open: Vec<Heading> = Heading::ALL
            .into_iter()
            .filter(|heading| {
                let (dx, dy) = heading.delta();
                !maze.is_wall_tile(
                    i64::from(cell.column()) + dx,
                    i64::from(cell.row()) + dy,
                    EdgePolicy::Tunnel,
                )
            })
            .collect();
        let heading = open.choose(&mut self.rng).copied()?;
        debug!(?heading, "autopilot steered");
        Some(heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_core::{Outcome, PlayState};
    use maze_chase_system_scheduler::{input_channel, Config as SchedulerConfig, InputSender};
    use maze_chase_world::GameConfig;

    const SECOND: Duration = Duration::from_secs(1);

    fn simulation(rows: &[&str]) -> (Simulation, InputSender) {
        let config = GameConfig {
            player_speed: 32.0,
            ghost_speed: 32.0,
            speed_cap: 64.0,
            max_level: Some(1),
            ..GameConfig::default()
        };
        let world = World::from_layout(rows, config).expect("valid world");
        let scheduler = TickScheduler::new(&SchedulerConfig {
            tick_rate_hz: 1,
            max_ticks_per_advance: 5,
        });
        let (sender, inputs) = input_channel();
        let simulation = Simulation::new(world, GhostAi::default(), scheduler, inputs, None);
        (simulation, sender)
    }

    #[test]
    fn queued_heading_drives_the_player_to_a_win() {
        let (mut simulation, sender) = simulation(&["XXXX", "X PX", "XXXX"]);
        assert!(sender.send_key("ArrowLeft"));

        assert_eq!(
            simulation.frame(SECOND, FrameInput::default()),
            FrameControl::Continue
        );
        assert_eq!(query::session(simulation.world()).score, 10);

        assert_eq!(
            simulation.frame(SECOND, FrameInput::default()),
            FrameControl::Exit
        );
        let record = simulation.record().expect("session record");
        assert_eq!(record.outcome, Outcome::Won);
        assert_eq!(record.score, 10);
        assert_eq!(query::session(simulation.world()).state, PlayState::Won);
    }

    #[test]
    fn pause_holds_the_session() {
        let (mut simulation, sender) = simulation(&["XXXX", "X PX", "XXXX"]);
        assert!(sender.send_key("ArrowLeft"));
        assert!(sender.send_key("Space"));

        let _ = simulation.frame(SECOND, FrameInput::default());
        assert!(simulation.paused());
        assert_eq!(query::tick_index(simulation.world()), 0);

        let _ = simulation.frame(
            SECOND,
            FrameInput {
                toggle_pause: true,
                ..FrameInput::default()
            },
        );
        assert!(!simulation.paused());
        assert_eq!(query::session(simulation.world()).score, 10);
    }

    #[test]
    fn restart_clears_the_finished_session() {
        let (mut simulation, sender) = simulation(&["XXXX", "X PX", "XXXX"]);
        assert!(sender.send_key("ArrowLeft"));
        let _ = simulation.frame(SECOND, FrameInput::default());
        let _ = simulation.frame(SECOND, FrameInput::default());
        assert!(simulation.record().is_some());

        let control = simulation.frame(
            Duration::ZERO,
            FrameInput {
                restart: true,
                ..FrameInput::default()
            },
        );

        assert_eq!(control, FrameControl::Continue);
        assert!(simulation.record().is_none());
        let session = query::session(simulation.world());
        assert_eq!(session.score, 0);
        assert_eq!(session.state, PlayState::Playing);
        assert_eq!(query::maze(simulation.world()).collectibles_remaining(), 1);
    }

    #[test]
    fn autopilot_moves_a_resting_player() {
        let (mut simulation, _sender) = simulation(&["XXXXX", "XP--X", "XX XX", "XXXXX"]);
        simulation.autopilot = Some(Autopilot::new(3));

        let _ = simulation.frame(SECOND, FrameInput::default());

        assert_eq!(query::player(simulation.world()).heading, Some(Heading::Right));
    }
}

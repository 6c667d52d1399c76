#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Maze Chase.

mod actor;
mod config;
mod layouts;
mod maze;
mod motion;
mod navigation;
mod session;

use std::time::Duration;

use maze_chase_core::{
    CellCoord, CollectibleKind, Command, EntityId, Event, GhostId, GhostMode, LifeLossCause,
    Outcome, PlayState, WELCOME_BANNER,
};
use thiserror::Error;
use tracing::{debug, info};

pub use config::{ConfigError, GameConfig};
pub use layouts::CLASSIC_LAYOUT;
pub use maze::{Cell, EdgePolicy, MapFormatError, Maze, COLLISION_EPSILON};
pub use session::InvariantViolation;

use actor::Actor;
use motion::Motion;
use navigation::NavigationField;
use session::Session;

/// Reasons a world cannot be created.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WorldError {
    /// The map failed validation.
    #[error("invalid map: {0}")]
    Map(#[from] MapFormatError),
    /// The rules failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Spawn tile of a ghost and the distance field leading back to it.
#[derive(Clone, Debug)]
struct Home {
    cell: CellCoord,
    field: NavigationField,
}

impl Home {
    fn new(maze: &Maze, cell: CellCoord) -> Self {
        let mut field = NavigationField::default();
        field.rebuild_with(maze.columns(), maze.rows(), cell, |coord| {
            maze.cell(coord).map_or(true, Cell::is_wall)
        });
        Self { cell, field }
    }
}

/// Represents the authoritative Maze Chase world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    maze: Maze,
    player: Actor,
    ghosts: Vec<Actor>,
    homes: Vec<Home>,
    session: Session,
    tick_index: u64,
}

impl World {
    /// Creates a world around an already validated maze.
    pub fn new(maze: Maze, config: GameConfig) -> Result<Self, WorldError> {
        config.validate()?;

        let size = maze.tile_size();
        let player = Actor::player(maze.tile_origin(maze.player_spawn()), size);
        let ghosts = maze
            .ghost_spawns()
            .iter()
            .map(|(id, cell)| Actor::ghost(*id, maze.tile_origin(*cell), size))
            .collect();
        let homes = maze
            .ghost_spawns()
            .iter()
            .map(|(_, cell)| Home::new(&maze, *cell))
            .collect();

        Ok(Self {
            banner: WELCOME_BANNER,
            session: Session::new(&config),
            config,
            maze,
            player,
            ghosts,
            homes,
            tick_index: 0,
        })
    }

    /// Parses the map rows with the configured tile size and creates a world.
    pub fn from_layout<S>(rows: &[S], config: GameConfig) -> Result<Self, WorldError>
    where
        S: AsRef<str>,
    {
        config.validate()?;
        let maze = Maze::load(rows, config.tile_size)?;
        Self::new(maze, config)
    }

    fn ghost_mut(&mut self, ghost: GhostId) -> Option<&mut Actor> {
        self.ghosts
            .iter_mut()
            .find(|actor| actor.ghost_id() == Some(ghost))
    }

    fn set_state(&mut self, state: PlayState, out_events: &mut Vec<Event>) {
        if self.session.state == state {
            return;
        }
        debug!(from = ?self.session.state, to = ?state, "play state changed");
        self.session.state = state;
        out_events.push(Event::PlayStateChanged { state });
    }

    fn reset_entities(&mut self, out_events: &mut Vec<Event>) {
        self.player.reset();
        for ghost in &mut self.ghosts {
            ghost.reset();
        }
        out_events.push(Event::EntitiesReset);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.session.state.is_terminal() {
            return;
        }

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        let checkpoint = self.session.checkpoint();
        self.run_tick(dt, out_events);
        self.session.enforce(checkpoint);
    }

    fn run_tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.session.state.is_transient() {
            self.set_state(PlayState::Playing, out_events);
            return;
        }

        if self.maze.collectibles_remaining() == 0 {
            self.clear_level(out_events);
            return;
        }

        if self.session.tick_power(dt) {
            self.end_power_mode(out_events);
        }

        self.move_entities(dt, out_events);
        self.collect(out_events);

        if self.resolve_contacts(out_events) {
            return;
        }

        if self
            .session
            .tick_level_timer(dt, self.config.level_time_limit())
        {
            self.lose_life(LifeLossCause::TimeExpired, out_events);
        }
    }

    fn clear_level(&mut self, out_events: &mut Vec<Event>) {
        let cleared = self.session.level;
        if self.config.max_level.is_some_and(|last| cleared >= last) {
            info!(level = cleared, score = self.session.score, "final level cleared");
            self.finish(Outcome::Won, out_events);
            return;
        }

        if self.session.power_active() {
            out_events.push(Event::PowerModeEnded);
        }
        self.session.advance_level(&self.config);
        self.maze = self.maze.reloaded();
        self.reset_entities(out_events);
        info!(
            level = self.session.level,
            score = self.session.score,
            player_speed = self.session.player_speed,
            ghost_speed = self.session.ghost_speed,
            "level cleared"
        );
        out_events.push(Event::LevelCleared {
            level: self.session.level,
        });
        self.set_state(PlayState::LevelClear, out_events);
    }

    fn start_power_mode(&mut self, out_events: &mut Vec<Event>) {
        let duration = self.config.power_duration();
        self.session.arm_power(duration);
        for ghost in &mut self.ghosts {
            if ghost.mode() != Some(GhostMode::Returning) {
                ghost.set_mode(GhostMode::Frightened);
            }
        }
        debug!(?duration, "power mode started");
        out_events.push(Event::PowerModeStarted { duration });
    }

    fn end_power_mode(&mut self, out_events: &mut Vec<Event>) {
        for ghost in &mut self.ghosts {
            if ghost.mode() == Some(GhostMode::Frightened) {
                ghost.set_mode(GhostMode::Normal);
            }
        }
        debug!("power mode ended");
        out_events.push(Event::PowerModeEnded);
    }

    fn move_entities(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let dt = dt.as_secs_f32();
        let tolerance = self.config.turn_tolerance;

        let motion = motion::advance(
            &mut self.player,
            &self.maze,
            self.session.player_speed,
            dt,
            tolerance,
            EdgePolicy::Tunnel,
        );
        report_motion(EntityId::Player, motion, out_events);
        if motion.wrapped {
            out_events.push(Event::PlayerWrapped);
        }

        for (ghost, home) in self.ghosts.iter_mut().zip(&self.homes) {
            let Some(id) = ghost.ghost_id() else {
                continue;
            };
            let mode = ghost.mode().unwrap_or(GhostMode::Normal);
            let speed = match mode {
                GhostMode::Normal => self.session.ghost_speed,
                GhostMode::Frightened => {
                    self.session.ghost_speed * self.config.frightened_speed_factor
                }
                GhostMode::Returning => {
                    self.session.ghost_speed * self.config.returning_speed_factor
                }
            };

            if mode == GhostMode::Returning {
                steer_home(ghost, home, &self.maze);
            }

            let motion =
                motion::advance(ghost, &self.maze, speed, dt, tolerance, EdgePolicy::Solid);
            report_motion(EntityId::Ghost(id), motion, out_events);

            let reach = tolerance.max(speed * dt * 0.5);
            if mode == GhostMode::Returning
                && occupied_cell(&self.maze, ghost) == home.cell
                && motion::aligned_position(ghost, &self.maze, reach).is_some()
            {
                ghost.reset();
                debug!(ghost = ?id, "ghost returned home");
                out_events.push(Event::GhostReturned { ghost: id });
            }
        }
    }

    fn collect(&mut self, out_events: &mut Vec<Event>) {
        let bounds = self.player.bounds();
        for cell in self.maze.collectibles_touching(&bounds) {
            let Some(kind) = self.maze.consume(cell) else {
                continue;
            };
            let points = match kind {
                CollectibleKind::Pellet => self.config.pellet_score,
                CollectibleKind::PowerPellet => self.config.power_pellet_score,
            };
            self.session.award(points);
            out_events.push(Event::CollectibleConsumed { cell, kind, points });

            if kind == CollectibleKind::PowerPellet {
                self.start_power_mode(out_events);
            }
        }
    }

    /// Resolves player-ghost overlaps in identity order.
    ///
    /// Returns `true` when a life was lost, which ends the tick.
    fn resolve_contacts(&mut self, out_events: &mut Vec<Event>) -> bool {
        let player = self.player.bounds();
        for index in 0..self.ghosts.len() {
            let Some(ghost) = self.ghosts.get_mut(index) else {
                continue;
            };
            if !ghost.bounds().overlaps(&player) {
                continue;
            }

            match ghost.mode() {
                Some(GhostMode::Frightened) => {
                    ghost.set_mode(GhostMode::Returning);
                    ghost.desired = None;
                    let Some(id) = ghost.ghost_id() else {
                        continue;
                    };
                    let points = self.session.capture_points(self.config.capture_base_score);
                    self.session.award(points);
                    debug!(ghost = ?id, points, "ghost captured");
                    out_events.push(Event::GhostCaptured { ghost: id, points });
                }
                Some(GhostMode::Normal) => {
                    self.lose_life(LifeLossCause::GhostContact, out_events);
                    return true;
                }
                Some(GhostMode::Returning) | None => {}
            }
        }
        false
    }

    fn lose_life(&mut self, cause: LifeLossCause, out_events: &mut Vec<Event>) {
        let lives_remaining = self.session.lose_life();
        info!(lives_remaining, ?cause, "life lost");
        out_events.push(Event::LifeLost {
            lives_remaining,
            cause,
        });

        if lives_remaining == 0 {
            self.finish(Outcome::GameOver, out_events);
            return;
        }

        if self.session.power_active() {
            out_events.push(Event::PowerModeEnded);
        }
        self.session.clear_power();
        self.reset_entities(out_events);
        self.set_state(PlayState::LifeLost, out_events);
    }

    fn finish(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        let state = match outcome {
            Outcome::GameOver => PlayState::GameOver,
            Outcome::Won => PlayState::Won,
        };
        self.set_state(state, out_events);
        let record = self.session.record(outcome, self.tick_index);
        info!(
            score = record.score,
            level = record.level,
            ?outcome,
            "session ended"
        );
        out_events.push(Event::SessionEnded { record });
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        self.session = Session::new(&self.config);
        self.maze = self.maze.reloaded();
        self.player.reset();
        for ghost in &mut self.ghosts {
            ghost.reset();
        }
        self.tick_index = 0;
        info!("session restarted");
        out_events.push(Event::SessionRestarted);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RequestHeading { heading } => {
            world.player.desired = Some(heading);
        }
        Command::SteerGhost { ghost, heading } => {
            if let Some(actor) = world.ghost_mut(ghost) {
                if actor.mode() != Some(GhostMode::Returning) {
                    actor.desired = Some(heading);
                }
            }
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::Restart => world.restart(out_events),
    }
}

fn report_motion(entity: EntityId, motion: Motion, out_events: &mut Vec<Event>) {
    if let Some(heading) = motion.committed {
        out_events.push(Event::HeadingCommitted { entity, heading });
    }
    if motion.blocked {
        out_events.push(Event::EntityBlocked { entity });
    }
}

/// Queues the heading that leads a returning ghost one tile closer to home.
fn steer_home(ghost: &mut Actor, home: &Home, maze: &Maze) {
    let cell = occupied_cell(maze, ghost);
    match home.field.descend(cell) {
        Some(heading) if ghost.heading != Some(heading) => ghost.desired = Some(heading),
        _ => ghost.desired = None,
    }
}

/// Tile containing the centre of the actor, clamped into the grid.
fn occupied_cell(maze: &Maze, actor: &Actor) -> CellCoord {
    let center = actor.bounds().center();
    let tile = maze.tile_size();
    let column = (center.x / tile).floor().clamp(0.0, maze.columns().saturating_sub(1) as f32);
    let row = (center.y / tile).floor().clamp(0.0, maze.rows().saturating_sub(1) as f32);
    CellCoord::new(column as u32, row as u32)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use maze_chase_core::{
        EntitySnapshot, GhostMode, GhostSnapshot, GhostView, Rect, SessionSnapshot, WorldSnapshot,
    };

    use super::{occupied_cell, EdgePolicy, Maze, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the maze and its live collectibles.
    #[must_use]
    pub fn maze(world: &World) -> &Maze {
        &world.maze
    }

    /// Number of ticks simulated since the session started.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures the session counters.
    #[must_use]
    pub fn session(world: &World) -> SessionSnapshot {
        world.session.snapshot()
    }

    /// Captures the player's position and heading.
    #[must_use]
    pub fn player(world: &World) -> EntitySnapshot {
        world.player.snapshot()
    }

    /// Captures everything a renderer needs to draw a frame.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        let entities = std::iter::once(&world.player)
            .chain(world.ghosts.iter())
            .map(|actor| actor.snapshot())
            .collect();

        WorldSnapshot {
            columns: world.maze.columns(),
            rows: world.maze.rows(),
            tile_size: world.maze.tile_size(),
            walls: world.maze.walls().collect(),
            collectibles: world.maze.collectibles().collect(),
            entities,
            session: world.session.snapshot(),
        }
    }

    /// Captures a read-only view of the ghosts roaming the maze.
    #[must_use]
    pub fn ghost_view(world: &World) -> GhostView {
        let snapshots = world
            .ghosts
            .iter()
            .filter_map(|actor| {
                Some(GhostSnapshot {
                    id: actor.ghost_id()?,
                    bounds: actor.bounds(),
                    cell: occupied_cell(&world.maze, actor),
                    heading: actor.heading,
                    desired: actor.desired,
                    mode: actor.mode().unwrap_or(GhostMode::Normal),
                })
            })
            .collect();
        GhostView::from_snapshots(world.maze.tile_size(), snapshots)
    }

    /// Wall test used by ghost behaviour, treating everything off-grid as wall.
    pub fn wall_probe(world: &World) -> impl Fn(Rect) -> bool + '_ {
        move |rect| world.maze.is_wall_at(rect, EdgePolicy::Solid)
    }
}

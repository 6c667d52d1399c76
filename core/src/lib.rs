#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Chase engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Chase.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Queues the heading the player wants to take at the next opportunity.
    RequestHeading {
        /// Heading requested by the input source.
        heading: Heading,
    },
    /// Queues the heading a ghost wants to take at the next opportunity.
    SteerGhost {
        /// Identity of the ghost being steered.
        ghost: GhostId,
        /// Heading chosen by the ghost behaviour system.
        heading: Heading,
    },
    /// Advances the simulation by one fixed tick of the provided duration.
    Tick {
        /// Duration of simulated time covered by the tick.
        dt: Duration,
    },
    /// Discards all progress and starts a fresh session on level one.
    Restart,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a queued heading became the entity's current heading.
    HeadingCommitted {
        /// Entity that turned.
        entity: EntityId,
        /// Heading that is now active.
        heading: Heading,
    },
    /// Reports that an entity ran into a wall during the tick.
    EntityBlocked {
        /// Entity whose movement was obstructed.
        entity: EntityId,
    },
    /// Reports that the player left one side of the tunnel and reappeared on the other.
    PlayerWrapped,
    /// Confirms that the player consumed a collectible.
    CollectibleConsumed {
        /// Tile that held the collectible.
        cell: CellCoord,
        /// Kind of collectible that was consumed.
        kind: CollectibleKind,
        /// Points awarded for the collectible.
        points: u64,
    },
    /// Announces that ghosts became frightened.
    PowerModeStarted {
        /// Length of the frightened window.
        duration: Duration,
    },
    /// Announces that the frightened window elapsed.
    PowerModeEnded,
    /// Confirms that the player captured a frightened ghost.
    GhostCaptured {
        /// Ghost that was captured.
        ghost: GhostId,
        /// Points awarded for the capture.
        points: u64,
    },
    /// Reports that a returning ghost reached its spawn tile and recovered.
    GhostReturned {
        /// Ghost that recovered.
        ghost: GhostId,
    },
    /// Reports that the player lost a life.
    LifeLost {
        /// Lives left after the loss.
        lives_remaining: u32,
        /// What caused the loss.
        cause: LifeLossCause,
    },
    /// Confirms that every entity was moved back to its spawn.
    EntitiesReset,
    /// Announces that the maze was cleared and the next level loaded.
    LevelCleared {
        /// Level that is now active.
        level: u32,
    },
    /// Announces a change of the session's play state.
    PlayStateChanged {
        /// State that became active.
        state: PlayState,
    },
    /// Final record emitted once the session terminates.
    SessionEnded {
        /// Score, level and outcome of the finished session.
        record: SessionRecord,
    },
    /// Confirms that a restart discarded all previous progress.
    SessionRestarted,
}

/// Reasons the player may lose a life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeLossCause {
    /// The player touched a ghost in its normal mode.
    GhostContact,
    /// The per-level countdown ran out.
    TimeExpired,
}

/// Cardinal headings available to moving entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Heading {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Heading {
    /// Every heading in a stable order.
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Down, Heading::Left, Heading::Right];

    /// Heading pointing the opposite way.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit step along the heading expressed as `(columns, rows)`.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// Identity of a ghost, one per map symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GhostId {
    /// Ghost spawned from the `r` symbol.
    Red,
    /// Ghost spawned from the `p` symbol.
    Pink,
    /// Ghost spawned from the `b` symbol.
    Blue,
    /// Ghost spawned from the `o` symbol.
    Orange,
}

impl GhostId {
    /// Resolves the ghost identity encoded by a map symbol.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'r' => Some(Self::Red),
            'p' => Some(Self::Pink),
            'b' => Some(Self::Blue),
            'o' => Some(Self::Orange),
            _ => None,
        }
    }

    /// Map symbol that spawns this ghost.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Red => 'r',
            Self::Pink => 'p',
            Self::Blue => 'b',
            Self::Orange => 'o',
        }
    }
}

/// Identifies any moving entity in the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityId {
    /// The player-controlled character.
    Player,
    /// One of the ghosts.
    Ghost(GhostId),
}

/// Behavioural mode of a ghost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostMode {
    /// Roams the maze and costs the player a life on contact.
    Normal,
    /// Vulnerable to capture while power mode is active.
    Frightened,
    /// Captured; heads back to its spawn and cannot be captured again.
    Returning,
}

/// Kinds of collectibles scattered through the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    /// Regular pellet.
    Pellet,
    /// Pellet that frightens the ghosts.
    PowerPellet,
}

/// Location of a single maze tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Continuous position expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate, growing to the right.
    pub x: f32,
    /// Vertical coordinate, growing downward.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the point displaced along `heading` by `distance` world units.
    #[must_use]
    pub fn offset(self, heading: Heading, distance: f32) -> Self {
        let (dx, dy) = heading.delta();
        Self {
            x: self.x + dx as f32 * distance,
            y: self.y + dy as f32 * distance,
        }
    }
}

/// Axis-aligned box expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal size.
    pub width: f32,
    /// Vertical size.
    pub height: f32,
}

impl Rect {
    /// Creates a new box.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a box anchored at `origin` with the provided size.
    #[must_use]
    pub const fn at(origin: Point, width: f32, height: f32) -> Self {
        Self::new(origin.x, origin.y, width, height)
    }

    /// Top-left corner of the box.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Reports whether two boxes overlap. Touching edges do not count.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Returns the box displaced along `heading` by `distance` world units.
    #[must_use]
    pub fn shifted(self, heading: Heading, distance: f32) -> Self {
        let origin = self.origin().offset(heading, distance);
        Self::at(origin, self.width, self.height)
    }
}

/// Phase of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayState {
    /// Regular simulation.
    Playing,
    /// The maze was cleared; the next level was loaded this tick.
    LevelClear,
    /// The player lost a life and every entity went back to its spawn.
    LifeLost,
    /// No lives are left.
    GameOver,
    /// The final configured level was cleared.
    Won,
}

impl PlayState {
    /// Reports whether the session has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Won)
    }

    /// Reports whether the state only lasts for a single tick.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::LevelClear | Self::LifeLost)
    }
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The player ran out of lives.
    GameOver,
    /// The player cleared the final configured level.
    Won,
}

/// Final result handed to external persistence once a session terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Score reached by the player.
    pub score: u64,
    /// Level that was active when the session ended.
    pub level: u32,
    /// How the session ended.
    pub outcome: Outcome,
    /// Number of ticks simulated during the session.
    pub ticks: u64,
}

/// Discrete input events accepted from adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    /// Request to head up.
    MoveUp,
    /// Request to head down.
    MoveDown,
    /// Request to head left.
    MoveLeft,
    /// Request to head right.
    MoveRight,
    /// Request to pause or resume the simulation.
    TogglePause,
}

impl InputEvent {
    /// Heading requested by the event, if it is a movement event.
    #[must_use]
    pub const fn heading(self) -> Option<Heading> {
        match self {
            Self::MoveUp => Some(Heading::Up),
            Self::MoveDown => Some(Heading::Down),
            Self::MoveLeft => Some(Heading::Left),
            Self::MoveRight => Some(Heading::Right),
            Self::TogglePause => None,
        }
    }
}

impl FromStr for InputEvent {
    type Err = InputError;

    /// Parses a raw key name as reported by keyboard-driven adapters.
    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key.trim() {
            "ArrowUp" | "KeyW" => Ok(Self::MoveUp),
            "ArrowDown" | "KeyS" => Ok(Self::MoveDown),
            "ArrowLeft" | "KeyA" => Ok(Self::MoveLeft),
            "ArrowRight" | "KeyD" => Ok(Self::MoveRight),
            "Space" | "KeyP" | "Escape" => Ok(Self::TogglePause),
            other => Err(InputError::Unrecognized(other.to_owned())),
        }
    }
}

/// Errors raised while decoding raw input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputError {
    /// The key does not map to any input event.
    #[error("unrecognized input `{0}`")]
    Unrecognized(String),
}

/// Immutable representation of a moving entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identity of the entity.
    pub id: EntityId,
    /// Box currently occupied by the entity.
    pub bounds: Rect,
    /// Heading the entity is travelling along, if any.
    pub heading: Option<Heading>,
    /// Mode of the entity when it is a ghost.
    pub mode: Option<GhostMode>,
}

/// Immutable representation of a live collectible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollectibleSnapshot {
    /// Tile holding the collectible.
    pub cell: CellCoord,
    /// Kind of collectible.
    pub kind: CollectibleKind,
    /// Box the player must overlap to consume it.
    pub bounds: Rect,
}

/// Counters describing the progress of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current score.
    pub score: u64,
    /// Lives left.
    pub lives: u32,
    /// Active level, starting at one.
    pub level: u32,
    /// Time left in the frightened window; zero when inactive.
    pub power_remaining: Duration,
    /// Multiplier applied to the next ghost capture.
    pub capture_multiplier: u32,
    /// Time left before the level countdown expires, when enabled.
    pub level_time_remaining: Option<Duration>,
    /// Phase of the session.
    pub state: PlayState,
}

/// Read-only snapshot sufficient to draw a complete frame.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldSnapshot {
    /// Number of tile columns in the maze.
    pub columns: u32,
    /// Number of tile rows in the maze.
    pub rows: u32,
    /// Side length of a tile in world units.
    pub tile_size: f32,
    /// Tiles occupied by walls in row-major order.
    pub walls: Vec<CellCoord>,
    /// Collectibles that are still alive.
    pub collectibles: Vec<CollectibleSnapshot>,
    /// Player followed by the ghosts in identity order.
    pub entities: Vec<EntitySnapshot>,
    /// Session counters.
    pub session: SessionSnapshot,
}

/// Immutable representation of a single ghost's state used by behaviour systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostSnapshot {
    /// Identity of the ghost.
    pub id: GhostId,
    /// Box currently occupied by the ghost.
    pub bounds: Rect,
    /// Tile containing the centre of the ghost.
    pub cell: CellCoord,
    /// Heading the ghost is travelling along, if any.
    pub heading: Option<Heading>,
    /// Heading queued for the next tile centre, if any.
    pub desired: Option<Heading>,
    /// Behavioural mode of the ghost.
    pub mode: GhostMode,
}

/// Read-only snapshot describing all ghosts within the maze.
#[derive(Clone, Debug, Default)]
pub struct GhostView {
    tile_size: f32,
    snapshots: Vec<GhostSnapshot>,
}

impl GhostView {
    /// Creates a new ghost view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(tile_size: f32, mut snapshots: Vec<GhostSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self {
            tile_size,
            snapshots,
        }
    }

    /// Side length of a maze tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Iterator over the captured ghost snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &GhostSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<GhostSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::{GhostId, Heading, InputError, InputEvent, Outcome, Point, Rect, SessionRecord};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn session_record_round_trips_through_bincode() {
        assert_round_trip(&SessionRecord {
            score: 12_340,
            level: 3,
            outcome: Outcome::GameOver,
            ticks: 7_200,
        });
    }

    #[test]
    fn reverse_is_an_involution() {
        for heading in Heading::ALL {
            assert_ne!(heading.reverse(), heading);
            assert_eq!(heading.reverse().reverse(), heading);
        }
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let left = Rect::new(0.0, 0.0, 32.0, 32.0);
        let right = Rect::new(32.0, 0.0, 32.0, 32.0);
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&right.shifted(Heading::Left, 0.5)));
    }

    #[test]
    fn offset_follows_screen_axes() {
        let origin = Point::new(10.0, 10.0);
        assert_eq!(origin.offset(Heading::Up, 4.0), Point::new(10.0, 6.0));
        assert_eq!(origin.offset(Heading::Right, 4.0), Point::new(14.0, 10.0));
    }

    #[test]
    fn ghost_symbols_round_trip() {
        for ghost in [GhostId::Red, GhostId::Pink, GhostId::Blue, GhostId::Orange] {
            assert_eq!(GhostId::from_symbol(ghost.symbol()), Some(ghost));
        }
        assert_eq!(GhostId::from_symbol('X'), None);
    }

    #[test]
    fn raw_keys_parse_into_input_events() {
        assert_eq!("ArrowUp".parse(), Ok(InputEvent::MoveUp));
        assert_eq!("KeyD".parse(), Ok(InputEvent::MoveRight));
        assert_eq!("Space".parse(), Ok(InputEvent::TogglePause));
        assert_eq!(
            "KeyQ".parse::<InputEvent>(),
            Err(InputError::Unrecognized("KeyQ".to_owned()))
        );
        assert_eq!(InputEvent::TogglePause.heading(), None);
    }
}

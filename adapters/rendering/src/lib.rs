#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Maze Chase adapters.

use std::time::Duration;

use anyhow::Result as AnyResult;
use glam::Vec2;
use maze_chase_core::{
    CollectibleKind, EntityId, EntitySnapshot, GhostId, GhostMode, Heading, PlayState, Rect,
    WorldSnapshot,
};
use thiserror::Error;

/// Frightened ghosts start flashing once this little power time is left.
pub const FLASH_THRESHOLD: Duration = Duration::from_secs(2);

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Colors used for every kind of sprite.
pub mod palette {
    use super::Color;

    /// Background.
    pub const BACKGROUND: Color = Color::from_rgb_u8(0, 0, 0);
    /// Maze walls.
    pub const WALL: Color = Color::from_rgb_u8(33, 33, 222);
    /// Regular pellets.
    pub const PELLET: Color = Color::from_rgb_u8(255, 184, 151);
    /// Power pellets.
    pub const POWER_PELLET: Color = Color::from_rgb_u8(255, 255, 255);
    /// The player.
    pub const PLAYER: Color = Color::from_rgb_u8(255, 255, 0);
    /// Red ghost.
    pub const RED_GHOST: Color = Color::from_rgb_u8(255, 0, 0);
    /// Pink ghost.
    pub const PINK_GHOST: Color = Color::from_rgb_u8(255, 184, 255);
    /// Blue ghost.
    pub const BLUE_GHOST: Color = Color::from_rgb_u8(0, 255, 255);
    /// Orange ghost.
    pub const ORANGE_GHOST: Color = Color::from_rgb_u8(255, 184, 82);
    /// Frightened ghosts.
    pub const FRIGHTENED: Color = Color::from_rgb_u8(33, 33, 255);
    /// Ghosts heading back to their spawn.
    pub const RETURNING: Color = Color::from_rgb_u8(160, 160, 160);
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Heading requested on this frame, if any.
    pub heading: Option<Heading>,
    /// Whether the adapter detected a pause toggle on this frame.
    pub toggle_pause: bool,
    /// Whether the adapter detected a restart request on this frame.
    pub restart: bool,
}

/// Tells the backend whether to keep presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameControl {
    /// Present another frame.
    Continue,
    /// Stop the backend and return.
    Exit,
}

/// Describes a square tile grid that can be rendered by adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when `tile_length` is not positive.
    pub fn new(columns: u32, rows: u32, tile_length: f32) -> Result<Self, RenderingError> {
        if !(tile_length > 0.0) {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
        })
    }

    /// Tile containing the world-space position, if it lies on the grid.
    #[must_use]
    pub fn tile_at(&self, position: Vec2) -> Option<(u32, u32)> {
        let tile = (position / self.tile_length).floor();
        if tile.x < 0.0 || tile.y < 0.0 {
            return None;
        }
        let (column, row) = (tile.x as u32, tile.y as u32);
        (column < self.columns && row < self.rows).then_some((column, row))
    }
}

/// What a sprite depicts; text frames draw one glyph per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    /// Wall tile.
    Wall,
    /// Regular pellet.
    Pellet,
    /// Power pellet.
    PowerPellet,
    /// The player, facing its heading.
    Player(Option<Heading>),
    /// A ghost in the given mode.
    Ghost(GhostId, GhostMode),
}

impl SpriteKind {
    /// Character used when the sprite is drawn into a text frame.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Pellet => '.',
            Self::PowerPellet => '*',
            Self::Player(Some(Heading::Up)) => 'v',
            Self::Player(Some(Heading::Down)) => '^',
            Self::Player(Some(Heading::Left)) => '>',
            Self::Player(Some(Heading::Right)) => '<',
            Self::Player(None) => '@',
            Self::Ghost(_, GhostMode::Frightened) => 'w',
            Self::Ghost(_, GhostMode::Returning) => '"',
            Self::Ghost(GhostId::Red, GhostMode::Normal) => 'R',
            Self::Ghost(GhostId::Pink, GhostMode::Normal) => 'K',
            Self::Ghost(GhostId::Blue, GhostMode::Normal) => 'B',
            Self::Ghost(GhostId::Orange, GhostMode::Normal) => 'O',
        }
    }
}

/// Axis-aligned sprite positioned in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// What the sprite depicts.
    pub kind: SpriteKind,
    /// Top-left corner.
    pub position: Vec2,
    /// Width and height.
    pub size: Vec2,
    /// Fill color.
    pub color: Color,
}

impl Sprite {
    fn from_rect(kind: SpriteKind, rect: Rect, color: Color) -> Self {
        Self {
            kind,
            position: Vec2::new(rect.x, rect.y),
            size: Vec2::new(rect.width, rect.height),
            color,
        }
    }

    /// Centre of the sprite.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }
}

/// Counters drawn above the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hud {
    /// Current score.
    pub score: u64,
    /// Lives left.
    pub lives: u32,
    /// Active level.
    pub level: u32,
    /// Whole seconds of power mode left, rounded up; `None` when inactive.
    pub power_seconds: Option<u64>,
    /// Phase of the session.
    pub state: PlayState,
}

impl Hud {
    /// Text lines shown by the heads-up display.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("SCORE: {}", self.score),
            format!("LIVES: {}", self.lives),
            format!("LEVEL: {}", self.level),
        ];
        if let Some(seconds) = self.power_seconds {
            lines.push(format!("POWER: {seconds}"));
        }
        match self.state {
            PlayState::Playing => {}
            PlayState::LevelClear => lines.push("LEVEL CLEAR".to_owned()),
            PlayState::LifeLost => lines.push("READY!".to_owned()),
            PlayState::GameOver => lines.push("GAME OVER".to_owned()),
            PlayState::Won => lines.push("YOU WIN".to_owned()),
        }
        lines
    }
}

/// Scene description combining the tile grid, the maze and its inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the play area.
    pub tile_grid: TileGridPresentation,
    /// Wall tiles.
    pub walls: Vec<Sprite>,
    /// Collectibles still alive.
    pub collectibles: Vec<Sprite>,
    /// Player followed by the ghosts in identity order.
    pub entities: Vec<Sprite>,
    /// Counters drawn above the maze.
    pub hud: Hud,
    /// Whether the driver is holding the simulation.
    pub paused: bool,
}

impl Scene {
    /// Builds a scene from a world snapshot.
    pub fn from_snapshot(snapshot: &WorldSnapshot) -> Result<Self, RenderingError> {
        let tile_grid =
            TileGridPresentation::new(snapshot.columns, snapshot.rows, snapshot.tile_size)?;
        let tile = snapshot.tile_size;
        let walls = snapshot
            .walls
            .iter()
            .map(|cell| Sprite {
                kind: SpriteKind::Wall,
                position: Vec2::new(cell.column() as f32, cell.row() as f32) * tile,
                size: Vec2::splat(tile),
                color: palette::WALL,
            })
            .collect();

        let mut scene = Self {
            tile_grid,
            walls,
            collectibles: Vec::new(),
            entities: Vec::new(),
            hud: hud(snapshot),
            paused: false,
        };
        scene.refresh(snapshot);
        Ok(scene)
    }

    /// Replaces the moving parts of the scene with a newer snapshot.
    ///
    /// Walls never change within a session and are kept as they are.
    pub fn refresh(&mut self, snapshot: &WorldSnapshot) {
        self.collectibles = snapshot
            .collectibles
            .iter()
            .map(|collectible| match collectible.kind {
                CollectibleKind::Pellet => {
                    Sprite::from_rect(SpriteKind::Pellet, collectible.bounds, palette::PELLET)
                }
                CollectibleKind::PowerPellet => Sprite::from_rect(
                    SpriteKind::PowerPellet,
                    collectible.bounds,
                    palette::POWER_PELLET,
                ),
            })
            .collect();

        let flashing = !snapshot.session.power_remaining.is_zero()
            && snapshot.session.power_remaining <= FLASH_THRESHOLD;
        self.entities = snapshot
            .entities
            .iter()
            .map(|entity| entity_sprite(entity, flashing))
            .collect();
        self.hud = hud(snapshot);
    }

    /// Draws the scene as text: the HUD followed by one line per tile row.
    ///
    /// Entities are placed on the tile containing their centre; entities in
    /// the tunnel beyond the grid are not drawn.
    #[must_use]
    pub fn to_text(&self) -> String {
        let columns = self.tile_grid.columns as usize;
        let rows = self.tile_grid.rows as usize;
        let mut canvas = vec![' '; columns * rows];

        let layers = self
            .walls
            .iter()
            .chain(&self.collectibles)
            .chain(self.entities.iter().rev());
        for sprite in layers {
            if let Some((column, row)) = self.tile_grid.tile_at(sprite.center()) {
                canvas[row as usize * columns + column as usize] = sprite.kind.glyph();
            }
        }

        let mut text = self.hud.lines().join("  ");
        if self.paused {
            text.push_str("  PAUSED");
        }
        text.push('\n');
        for row in canvas.chunks(columns.max(1)) {
            text.extend(row);
            text.push('\n');
        }
        text
    }
}

fn hud(snapshot: &WorldSnapshot) -> Hud {
    let power = snapshot.session.power_remaining;
    Hud {
        score: snapshot.session.score,
        lives: snapshot.session.lives,
        level: snapshot.session.level,
        power_seconds: (!power.is_zero()).then(|| power.as_millis().div_ceil(1_000) as u64),
        state: snapshot.session.state,
    }
}

fn entity_sprite(entity: &EntitySnapshot, flashing: bool) -> Sprite {
    match entity.id {
        EntityId::Player => Sprite::from_rect(
            SpriteKind::Player(entity.heading),
            entity.bounds,
            palette::PLAYER,
        ),
        EntityId::Ghost(ghost) => {
            let mode = entity.mode.unwrap_or(GhostMode::Normal);
            let color = match mode {
                GhostMode::Normal => ghost_color(ghost),
                GhostMode::Frightened if flashing => palette::FRIGHTENED.lighten(0.8),
                GhostMode::Frightened => palette::FRIGHTENED,
                GhostMode::Returning => palette::RETURNING,
            };
            Sprite::from_rect(SpriteKind::Ghost(ghost, mode), entity.bounds, color)
        }
    }
}

/// Body color of a ghost in normal mode.
#[must_use]
pub const fn ghost_color(ghost: GhostId) -> Color {
    match ghost {
        GhostId::Red => palette::RED_GHOST,
        GhostId::Pink => palette::PINK_GHOST,
        GhostId::Blue => palette::BLUE_GHOST,
        GhostId::Orange => palette::ORANGE_GHOST,
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Maze Chase scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, may mutate the scene before it
    /// is rendered, and decides whether another frame follows.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum RenderingError {
    /// Tiles must have a positive size to be drawn.
    #[error("tile_length must be positive (received {tile_length})")]
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_grid_rejects_non_positive_tiles() {
        assert_eq!(
            TileGridPresentation::new(3, 3, 0.0),
            Err(RenderingError::InvalidTileLength { tile_length: 0.0 })
        );
    }

    #[test]
    fn tile_at_rejects_positions_outside_the_grid() {
        let grid = TileGridPresentation::new(3, 2, 32.0).expect("valid grid");
        assert_eq!(grid.tile_at(Vec2::new(40.0, 40.0)), Some((1, 1)));
        assert_eq!(grid.tile_at(Vec2::new(-1.0, 10.0)), None);
        assert_eq!(grid.tile_at(Vec2::new(96.0, 10.0)), None);
    }

    #[test]
    fn lighten_moves_towards_white() {
        let color = Color::new(0.0, 0.5, 1.0, 0.25).lighten(0.5);
        assert_eq!(color, Color::new(0.5, 0.75, 1.0, 0.25));
    }

    #[test]
    fn hud_rounds_power_up_and_names_the_state() {
        let hud = Hud {
            score: 120,
            lives: 2,
            level: 3,
            power_seconds: Some(4),
            state: PlayState::GameOver,
        };
        assert_eq!(
            hud.lines(),
            vec!["SCORE: 120", "LIVES: 2", "LEVEL: 3", "POWER: 4", "GAME OVER"]
        );
    }
}

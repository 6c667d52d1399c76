//! Tile grid parsed from a character map, plus the collectibles it seeds.

use maze_chase_core::{CellCoord, CollectibleKind, CollectibleSnapshot, GhostId, Point, Rect};
use thiserror::Error;

/// Penetration below this depth is not treated as a collision.
///
/// Positions accumulate floating point error while entities travel; without
/// the allowance an entity resting flush against a wall would read as
/// overlapping it.
pub const COLLISION_EPSILON: f32 = 1.0e-3;

const PELLET_INSET: f32 = 10.0 / 32.0;
const PELLET_SIZE: f32 = 12.0 / 32.0;
const POWER_PELLET_INSET: f32 = 4.0 / 32.0;
const POWER_PELLET_SIZE: f32 = 24.0 / 32.0;

/// Occupant of a single maze tile as declared by the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Impassable tile.
    Wall,
    /// Open floor without a collectible.
    Empty,
    /// Open floor seeded with a regular pellet.
    Pellet,
    /// Open floor seeded with a power pellet.
    PowerPellet,
    /// Open floor where the player starts.
    PlayerSpawn,
    /// Open floor where the tagged ghost starts.
    GhostSpawn(GhostId),
}

impl Cell {
    /// Decodes a map symbol.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'X' => Some(Self::Wall),
            ' ' => Some(Self::Pellet),
            'O' => Some(Self::PowerPellet),
            '-' => Some(Self::Empty),
            'P' => Some(Self::PlayerSpawn),
            other => match GhostId::from_symbol(other) {
                Some(ghost) => Some(Self::GhostSpawn(ghost)),
                None => None,
            },
        }
    }

    /// Reports whether the tile blocks movement.
    #[must_use]
    pub const fn is_wall(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// Reasons a map may be rejected at load time.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum MapFormatError {
    /// The map contained no rows or only empty rows.
    #[error("map contains no tiles")]
    Empty,
    /// A row differs in length from the first row.
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        found: usize,
    },
    /// A character does not map to any tile kind.
    #[error("unknown symbol {symbol:?} at column {column}, row {row}")]
    UnknownSymbol {
        /// Offending character.
        symbol: char,
        /// Column of the character.
        column: usize,
        /// Row of the character.
        row: usize,
    },
    /// No player spawn was declared.
    #[error("map has no player spawn")]
    MissingPlayerSpawn,
    /// More than one player spawn was declared.
    #[error("second player spawn at column {column}, row {row}")]
    DuplicatePlayerSpawn {
        /// Column of the repeated spawn.
        column: usize,
        /// Row of the repeated spawn.
        row: usize,
    },
    /// The same ghost identity was declared twice.
    #[error("ghost {ghost:?} spawns more than once")]
    DuplicateGhostSpawn {
        /// Ghost whose symbol repeats.
        ghost: GhostId,
    },
    /// The tile size cannot scale the grid into world units.
    #[error("tile size must be positive (received {0})")]
    InvalidTileSize(f32),
}

/// How tiles outside the grid are treated by wall queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgePolicy {
    /// Everything outside the grid is a wall.
    Solid,
    /// Outside the grid is open only alongside tunnel rows, whose first and
    /// last tiles are both open.
    Tunnel,
}

#[derive(Clone, Copy, Debug)]
struct Collectible {
    cell: CellCoord,
    kind: CollectibleKind,
    bounds: Rect,
    alive: bool,
}

/// Validated maze layout together with its live collectibles.
#[derive(Clone, Debug)]
pub struct Maze {
    columns: u32,
    rows: u32,
    tile_size: f32,
    cells: Vec<Cell>,
    player_spawn: CellCoord,
    ghost_spawns: Vec<(GhostId, CellCoord)>,
    collectibles: Vec<Collectible>,
    remaining: usize,
}

impl Maze {
    /// Parses a character grid into a maze scaled by `tile_size`.
    pub fn load<S>(rows: &[S], tile_size: f32) -> Result<Self, MapFormatError>
    where
        S: AsRef<str>,
    {
        if !(tile_size > 0.0) {
            return Err(MapFormatError::InvalidTileSize(tile_size));
        }

        let expected = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if expected == 0 {
            return Err(MapFormatError::Empty);
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        let mut player_spawn = None;
        let mut ghost_spawns: Vec<(GhostId, CellCoord)> = Vec::new();

        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != expected {
                return Err(MapFormatError::RaggedRow {
                    row: row_index,
                    expected,
                    found,
                });
            }

            for (column_index, symbol) in row.chars().enumerate() {
                let cell = Cell::from_symbol(symbol).ok_or(MapFormatError::UnknownSymbol {
                    symbol,
                    column: column_index,
                    row: row_index,
                })?;
                let coord = CellCoord::new(column_index as u32, row_index as u32);

                match cell {
                    Cell::PlayerSpawn => {
                        if player_spawn.replace(coord).is_some() {
                            return Err(MapFormatError::DuplicatePlayerSpawn {
                                column: column_index,
                                row: row_index,
                            });
                        }
                    }
                    Cell::GhostSpawn(ghost) => {
                        if ghost_spawns.iter().any(|(known, _)| *known == ghost) {
                            return Err(MapFormatError::DuplicateGhostSpawn { ghost });
                        }
                        ghost_spawns.push((ghost, coord));
                    }
                    _ => {}
                }

                cells.push(cell);
            }
        }

        let player_spawn = player_spawn.ok_or(MapFormatError::MissingPlayerSpawn)?;
        ghost_spawns.sort_by_key(|(ghost, _)| *ghost);

        let mut maze = Self {
            columns: expected as u32,
            rows: rows.len() as u32,
            tile_size,
            cells,
            player_spawn,
            ghost_spawns,
            collectibles: Vec::new(),
            remaining: 0,
        };
        maze.collectibles = maze.seed_collectibles();
        maze.remaining = maze.collectibles.len();
        Ok(maze)
    }

    /// Returns a fresh copy of the maze with every collectible restored.
    #[must_use]
    pub fn reloaded(&self) -> Self {
        let mut maze = self.clone();
        for collectible in &mut maze.collectibles {
            collectible.alive = true;
        }
        maze.remaining = maze.collectibles.len();
        maze
    }

    fn seed_collectibles(&self) -> Vec<Collectible> {
        self.tiles()
            .filter_map(|(coord, cell)| {
                let (kind, inset, size) = match cell {
                    Cell::Pellet => (CollectibleKind::Pellet, PELLET_INSET, PELLET_SIZE),
                    Cell::PowerPellet => (
                        CollectibleKind::PowerPellet,
                        POWER_PELLET_INSET,
                        POWER_PELLET_SIZE,
                    ),
                    _ => return None,
                };
                let origin = self.tile_origin(coord);
                let bounds = Rect::new(
                    origin.x + inset * self.tile_size,
                    origin.y + inset * self.tile_size,
                    size * self.tile_size,
                    size * self.tile_size,
                );
                Some(Collectible {
                    cell: coord,
                    kind,
                    bounds,
                    alive: true,
                })
            })
            .collect()
    }

    fn tiles(&self) -> impl Iterator<Item = (CellCoord, Cell)> + '_ {
        let columns = self.columns as usize;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let coord = CellCoord::new((index % columns) as u32, (index / columns) as u32);
            (coord, *cell)
        })
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Playfield width in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_size
    }

    /// Occupant declared for the tile, if it lies within the grid.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<Cell> {
        if coord.column() >= self.columns || coord.row() >= self.rows {
            return None;
        }
        let index = coord.row() as usize * self.columns as usize + coord.column() as usize;
        self.cells.get(index).copied()
    }

    /// Tile where the player starts.
    #[must_use]
    pub const fn player_spawn(&self) -> CellCoord {
        self.player_spawn
    }

    /// Ghost spawn tiles in identity order.
    #[must_use]
    pub fn ghost_spawns(&self) -> &[(GhostId, CellCoord)] {
        &self.ghost_spawns
    }

    /// Top-left corner of a tile in world units.
    #[must_use]
    pub fn tile_origin(&self, coord: CellCoord) -> Point {
        Point::new(
            coord.column() as f32 * self.tile_size,
            coord.row() as f32 * self.tile_size,
        )
    }

    /// Tile that contains the point, if it lies within the grid.
    #[must_use]
    pub fn cell_at(&self, point: Point) -> Option<CellCoord> {
        let column = (point.x / self.tile_size).floor();
        let row = (point.y / self.tile_size).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        let coord = CellCoord::new(column as u32, row as u32);
        self.cell(coord).map(|_| coord)
    }

    /// Tiles occupied by walls in row-major order.
    pub fn walls(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.tiles()
            .filter(|(_, cell)| cell.is_wall())
            .map(|(coord, _)| coord)
    }

    /// Reports whether the row is open on both edges of the grid.
    #[must_use]
    pub fn is_tunnel_row(&self, row: u32) -> bool {
        let last = self.columns.saturating_sub(1);
        [0, last].into_iter().all(|column| {
            self.cell(CellCoord::new(column, row))
                .map_or(false, |cell| !cell.is_wall())
        })
    }

    /// Reports whether the tile at signed grid coordinates blocks movement.
    #[must_use]
    pub fn is_wall_tile(&self, column: i64, row: i64, edges: EdgePolicy) -> bool {
        if row < 0 || row >= i64::from(self.rows) {
            return true;
        }
        if column < 0 || column >= i64::from(self.columns) {
            return match edges {
                EdgePolicy::Solid => true,
                EdgePolicy::Tunnel => !self.is_tunnel_row(row as u32),
            };
        }
        self.cell(CellCoord::new(column as u32, row as u32))
            .map_or(true, Cell::is_wall)
    }

    /// Reports whether the box overlaps any wall tile.
    ///
    /// Continuous coordinates are converted to the range of tile indices the
    /// box covers and each tile is looked up in the grid, which matches an
    /// exact rectangle test because walls always fill whole tiles.
    #[must_use]
    pub fn is_wall_at(&self, rect: Rect, edges: EdgePolicy) -> bool {
        let tile = self.tile_size;
        let first_column = ((rect.x + COLLISION_EPSILON) / tile).floor() as i64;
        let last_column = ((rect.x + rect.width - COLLISION_EPSILON) / tile).ceil() as i64 - 1;
        let first_row = ((rect.y + COLLISION_EPSILON) / tile).floor() as i64;
        let last_row = ((rect.y + rect.height - COLLISION_EPSILON) / tile).ceil() as i64 - 1;

        (first_row..=last_row).any(|row| {
            (first_column..=last_column).any(|column| self.is_wall_tile(column, row, edges))
        })
    }

    /// Number of pellets and power pellets still alive.
    #[must_use]
    pub const fn collectibles_remaining(&self) -> usize {
        self.remaining
    }

    /// Total number of collectibles seeded by the layout.
    #[must_use]
    pub fn collectibles_total(&self) -> usize {
        self.collectibles.len()
    }

    /// Snapshots of the collectibles that are still alive.
    pub fn collectibles(&self) -> impl Iterator<Item = CollectibleSnapshot> + '_ {
        self.collectibles
            .iter()
            .filter(|collectible| collectible.alive)
            .map(|collectible| CollectibleSnapshot {
                cell: collectible.cell,
                kind: collectible.kind,
                bounds: collectible.bounds,
            })
    }

    /// Tiles of live collectibles whose boxes overlap `rect`.
    #[must_use]
    pub fn collectibles_touching(&self, rect: &Rect) -> Vec<CellCoord> {
        self.collectibles
            .iter()
            .filter(|collectible| collectible.alive && collectible.bounds.overlaps(rect))
            .map(|collectible| collectible.cell)
            .collect()
    }

    /// Removes the live collectible on `cell`, returning its kind.
    ///
    /// Returns `None` when the tile holds no collectible or it was already
    /// consumed, so a collectible can never be counted twice.
    pub fn consume(&mut self, cell: CellCoord) -> Option<CollectibleKind> {
        let collectible = self
            .collectibles
            .iter_mut()
            .find(|collectible| collectible.cell == cell && collectible.alive)?;
        collectible.alive = false;
        self.remaining -= 1;
        Some(collectible.kind)
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Concrete tile surface and level layouts for the chase simulation.

mod navigation;

use chase_core::{CellCoord, GridSurface};
use glam::Vec2;
use thiserror::Error;

pub use navigation::DistanceField;

/// Side length of a tile used when no explicit length is configured.
pub const DEFAULT_TILE_LENGTH: f32 = 1.0;

/// Built-in level used by adapters when no layout file is supplied.
pub const DEFAULT_LAYOUT: &str = "\
####################
#P.......#.........#
#.######.#.######..#
#.#....#...#....#..#
#.#.E..#####..E.#..#
#.#....#...#....#..#
#.###.##.#.##.###..#
#........#.........#
#####.#######.######
#..................#
####################
";

const ROAD: char = '.';
const BLOCKED: char = '#';
const PLAYER_SPAWN: char = 'P';
const ENEMY_SPAWN: char = 'E';

/// Reasons a textual layout cannot be turned into a [`Level`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LayoutError {
    /// The layout has no non-empty rows.
    #[error("layout contains no rows")]
    Empty,
    /// A row is wider or narrower than the first row.
    #[error("row {row} has {found} cells but the first row has {expected}")]
    RaggedRow {
        /// Zero-based text row that broke the rectangle.
        row: usize,
        /// Width established by the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// The layout uses a glyph outside the supported legend.
    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// Character that could not be interpreted.
        glyph: char,
        /// Zero-based text row of the glyph.
        row: usize,
        /// Zero-based text column of the glyph.
        column: usize,
    },
    /// No player spawn glyph was found.
    #[error("layout does not mark a player spawn")]
    MissingPlayerSpawn,
    /// More than one player spawn glyph was found.
    #[error("layout marks more than one player spawn")]
    DuplicatePlayerSpawn,
    /// The layout is too large to address with integer cells.
    #[error("layout of {columns}x{rows} cells exceeds the supported size")]
    TooLarge {
        /// Number of columns in the layout.
        columns: usize,
        /// Number of rows in the layout.
        rows: usize,
    },
    /// The requested tile length is zero, negative or not finite.
    #[error("tile length must be positive and finite, got {0}")]
    InvalidTileLength(f32),
}

/// Dense passability grid anchored at a world-space origin.
///
/// Cells outside `[0, width) x [0, height)` are reported as impassable, so the
/// level border never needs explicit walls to keep agents inside.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSurface {
    width: u32,
    height: u32,
    tile_length: f32,
    origin: Vec2,
    passable: Vec<bool>,
}

impl TileSurface {
    /// Creates a fully passable surface with its origin at world zero.
    #[must_use]
    pub fn new(width: u32, height: u32, tile_length: f32) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            tile_length,
            origin: Vec2::ZERO,
            passable: vec![true; capacity],
        }
    }

    /// Moves the world-space position of the lower-left corner of cell `(0, 0)`.
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Marks a cell as passable or blocked. Cells outside the grid are ignored.
    pub fn set_passable(&mut self, cell: CellCoord, passable: bool) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.passable.get_mut(index) {
                *slot = passable;
            }
        }
    }

    /// Blocks every cell in the inclusive rectangle spanned by two corners.
    pub fn block_rect(&mut self, from: CellCoord, to: CellCoord) {
        for y in from.y().min(to.y())..=from.y().max(to.y()) {
            for x in from.x().min(to.x())..=from.x().max(to.x()) {
                self.set_passable(CellCoord::new(x, y), false);
            }
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// World-space position of the grid's lower-left corner.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Reports whether the cell lies within the grid bounds.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Iterator over every passable cell in row-major order.
    pub fn passable_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let width = i32::try_from(self.width).unwrap_or(0);
        let height = i32::try_from(self.height).unwrap_or(0);
        (0..height)
            .flat_map(move |y| (0..width).map(move |x| CellCoord::new(x, y)))
            .filter(|cell| self.is_passable(*cell))
    }

    /// Builds the step-distance field from `seed` across this surface.
    #[must_use]
    pub fn distance_field(&self, seed: CellCoord) -> DistanceField {
        let mut field = DistanceField::default();
        field.rebuild_with(self.width, self.height, &[seed], |cell| {
            !self.is_passable(cell)
        });
        field
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.x()).ok()?;
        let row = u32::try_from(cell.y()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(column).ok()?;
        let row = usize::try_from(row).ok()?;
        Some(row * width + column)
    }
}

impl GridSurface for TileSurface {
    fn is_passable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.passable.get(index).copied())
            .unwrap_or(false)
    }

    fn world_to_cell(&self, position: Vec2) -> CellCoord {
        let local = (position - self.origin) / self.tile_length;
        CellCoord::new(local.x.floor() as i32, local.y.floor() as i32)
    }

    fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.origin
            + Vec2::new(
                (cell.x() as f32 + 0.5) * self.tile_length,
                (cell.y() as f32 + 0.5) * self.tile_length,
            )
    }
}

/// Parsed level: the drivable surface plus the spawn points marked on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    surface: TileSurface,
    player_spawn: CellCoord,
    enemy_spawns: Vec<CellCoord>,
}

impl Level {
    /// Parses an ASCII layout.
    ///
    /// Legend: `.` road, `#` blocked, `P` player spawn, `E` enemy spawn. Spawn
    /// cells are passable. Blank lines are skipped and the first text row is
    /// the top of the level, so cell `y` grows upward.
    pub fn parse(layout: &str, tile_length: f32) -> Result<Self, LayoutError> {
        if !tile_length.is_finite() || tile_length <= 0.0 {
            return Err(LayoutError::InvalidTileLength(tile_length));
        }

        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };
        let columns = first.chars().count();

        let (Ok(width), Ok(height)) = (u32::try_from(columns), u32::try_from(rows.len())) else {
            return Err(LayoutError::TooLarge {
                columns,
                rows: rows.len(),
            });
        };
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(LayoutError::TooLarge {
                columns,
                rows: rows.len(),
            });
        }

        let mut surface = TileSurface::new(width, height, tile_length);
        let mut player_spawn = None;
        let mut enemy_spawns = Vec::new();

        for (row_index, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != columns {
                return Err(LayoutError::RaggedRow {
                    row: row_index,
                    expected: columns,
                    found,
                });
            }

            let y = (rows.len() - 1 - row_index) as i32;
            for (column, glyph) in row.chars().enumerate() {
                let cell = CellCoord::new(column as i32, y);
                match glyph {
                    ROAD => {}
                    BLOCKED => surface.set_passable(cell, false),
                    PLAYER_SPAWN => {
                        if player_spawn.replace(cell).is_some() {
                            return Err(LayoutError::DuplicatePlayerSpawn);
                        }
                    }
                    ENEMY_SPAWN => enemy_spawns.push(cell),
                    _ => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph,
                            row: row_index,
                            column,
                        })
                    }
                }
            }
        }

        let player_spawn = player_spawn.ok_or(LayoutError::MissingPlayerSpawn)?;

        Ok(Self {
            surface,
            player_spawn,
            enemy_spawns,
        })
    }

    /// Surface agents drive on.
    #[must_use]
    pub fn surface(&self) -> &TileSurface {
        &self.surface
    }

    /// Cell marked as the player's spawn.
    #[must_use]
    pub fn player_spawn(&self) -> CellCoord {
        self.player_spawn
    }

    /// Cells marked as enemy spawns, in reading order.
    #[must_use]
    pub fn enemy_spawns(&self) -> &[CellCoord] {
        &self.enemy_spawns
    }

    /// World-space center of the player's spawn cell.
    #[must_use]
    pub fn player_spawn_position(&self) -> Vec2 {
        self.surface.cell_center(self.player_spawn)
    }

    /// World-space centers of the enemy spawn cells.
    pub fn enemy_spawn_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.enemy_spawns
            .iter()
            .map(|cell| self.surface.cell_center(*cell))
    }
}

//! Tile grid components

use std::fmt;

use glam::Vec2;
use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Integer tile address, column first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    pub col: u32,
    pub row: u32,
}

impl GridCoord {
    #[must_use]
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Neighbouring coordinate, or `None` when it would leave the grid
    #[must_use]
    pub fn offset(self, dcol: i32, drow: i32, size: GridSize) -> Option<Self> {
        let col = self.col.checked_add_signed(dcol)?;
        let row = self.row.checked_add_signed(drow)?;
        let next = Self::new(col, row);
        size.contains(next).then_some(next)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Grid dimensions in tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl GridSize {
    #[must_use]
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// Number of tiles
    #[must_use]
    pub const fn area(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Check if a coordinate is inside the grid
    #[must_use]
    pub const fn contains(&self, coord: GridCoord) -> bool {
        coord.col < self.cols && coord.row < self.rows
    }

    /// Row-major index of a coordinate
    #[must_use]
    pub const fn index_of(&self, coord: GridCoord) -> Option<usize> {
        if self.contains(coord) {
            Some(coord.row as usize * self.cols as usize + coord.col as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Component on a grid map node: the tile entities in row-major order
#[derive(Debug, Clone)]
pub struct GridMap {
    size: GridSize,
    tile_size: Vec2,
    tiles: Vec<Entity>,
}

impl GridMap {
    pub(crate) fn new(size: GridSize, tile_size: Vec2, tiles: Vec<Entity>) -> Self {
        debug_assert_eq!(tiles.len(), size.area());
        Self {
            size,
            tile_size,
            tiles,
        }
    }

    /// Grid dimensions
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Size of one tile in scene units
    #[must_use]
    pub const fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    /// Tile entity at a coordinate
    #[must_use]
    pub fn tile(&self, coord: GridCoord) -> Option<Entity> {
        self.size.index_of(coord).and_then(|i| self.tiles.get(i).copied())
    }

    /// Position of a tile relative to the grid origin
    #[must_use]
    pub fn tile_origin(&self, coord: GridCoord) -> Vec2 {
        Vec2::new(coord.col as f32, coord.row as f32) * self.tile_size
    }

    /// Coordinate of the tile containing a point relative to the grid origin
    #[must_use]
    pub fn coord_at(&self, local: Vec2) -> Option<GridCoord> {
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let cell = local / self.tile_size;
        let coord = GridCoord::new(cell.x as u32, cell.y as u32);
        self.size.contains(coord).then_some(coord)
    }

    /// Size of the whole grid in scene units
    #[must_use]
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.size.cols as f32, self.size.rows as f32) * self.tile_size
    }

    pub(crate) fn entities(&self) -> &[Entity] {
        &self.tiles
    }
}

/// Component on a tile node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// The grid this tile belongs to
    pub grid: Entity,
    /// Address within the grid
    pub coord: GridCoord,
    /// Advisory flag for game logic; the scene never enforces it
    pub collisionable: bool,
}

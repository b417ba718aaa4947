//! 2D tile grid for the world.

use eco_core::{CoverKind, Direction, OrganismId, TileCoord, WorldConfig, WorldPos};
use serde::{Deserialize, Serialize};

/// One grid cell: its cover and the organisms standing on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub coord: TileCoord,
    /// `None` until terrain generation reaches this tile
    pub cover: Option<CoverKind>,
    /// Non-owning references into the simulation's organism table
    pub occupants: Vec<OrganismId>,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            cover: None,
            occupants: Vec::new(),
        }
    }

    pub fn is_covered(&self) -> bool {
        self.cover.is_some()
    }

    pub fn contains(&self, id: OrganismId) -> bool {
        self.occupants.contains(&id)
    }

    pub fn add_occupant(&mut self, id: OrganismId) {
        self.occupants.push(id);
    }

    /// Remove `id` from the occupant list. Returns `false` if it was not there.
    pub fn remove_occupant(&mut self, id: OrganismId) -> bool {
        match self.occupants.iter().position(|&o| o == id) {
            Some(index) => {
                self.occupants.remove(index);
                true
            }
            None => false,
        }
    }
}

/// A bounded (non-wrapping) grid of tiles with a fixed cell size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub cell_size: f64,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: usize, height: usize, cell_size: f64) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for j in 0..height {
            for i in 0..width {
                tiles.push(Tile::new(TileCoord::new(i as i32, j as i32)));
            }
        }
        Self {
            width,
            height,
            cell_size,
            tiles,
        }
    }

    /// Create an uncovered grid from world configuration
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.width, config.height, config.cell_size)
    }

    /// World-space extent as `(width, height)`
    pub fn bounds(&self) -> (f64, f64) {
        (
            self.width as f64 * self.cell_size,
            self.height as f64 * self.cell_size,
        )
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.i >= 0
            && coord.j >= 0
            && (coord.i as usize) < self.width
            && (coord.j as usize) < self.height
    }

    /// Dense index of an in-bounds tile
    pub fn index_of(&self, coord: TileCoord) -> Option<usize> {
        if self.contains(coord) {
            Some(coord.j as usize * self.width + coord.i as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index_of(coord).map(|index| &self.tiles[index])
    }

    pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index_of(coord).map(move |index| &mut self.tiles[index])
    }

    pub fn tile_at(&self, i: i32, j: i32) -> Option<&Tile> {
        self.tile(TileCoord::new(i, j))
    }

    pub fn tile_at_mut(&mut self, i: i32, j: i32) -> Option<&mut Tile> {
        self.tile_mut(TileCoord::new(i, j))
    }

    pub fn cover_at(&self, coord: TileCoord) -> Option<CoverKind> {
        self.tile(coord).and_then(|tile| tile.cover)
    }

    /// Tile coordinates containing a world-space point
    pub fn world_to_tile_coords(&self, x: f64, y: f64) -> TileCoord {
        TileCoord::new(
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// World-space position of a tile's top-left corner
    pub fn tile_to_world(&self, coord: TileCoord) -> WorldPos {
        WorldPos::new(
            coord.i as f64 * self.cell_size,
            coord.j as f64 * self.cell_size,
        )
    }

    pub fn tile_at_world_coords(&self, x: f64, y: f64) -> Option<&Tile> {
        self.tile(self.world_to_tile_coords(x, y))
    }

    /// In-bounds 8-connected neighbours of a tile
    pub fn neighbors(&self, coord: TileCoord) -> Vec<TileCoord> {
        Direction::all()
            .iter()
            .map(|d| {
                let (di, dj) = d.to_delta();
                coord.add(di, dj)
            })
            .filter(|c| self.contains(*c))
            .collect()
    }

    /// Every tile whose `i` or `j` sits on the grid edge, each listed once
    pub fn border_coords(&self) -> Vec<TileCoord> {
        self.coords()
            .filter(|c| {
                c.i == 0
                    || c.j == 0
                    || c.i as usize == self.width - 1
                    || c.j as usize == self.height - 1
            })
            .collect()
    }

    /// All coordinates, column by column (`i` outer, `j` inner)
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let height = self.height;
        (0..self.width)
            .flat_map(move |i| (0..height).map(move |j| TileCoord::new(i as i32, j as i32)))
    }

    /// Iterator over all tiles in storage order
    pub fn iter(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile> + '_ {
        self.tiles.iter_mut()
    }

    pub fn is_fully_covered(&self) -> bool {
        self.tiles.iter().all(Tile::is_covered)
    }
}

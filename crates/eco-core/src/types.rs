//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an organism instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrganismId(pub u64);

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out organism identifiers in increasing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> OrganismId {
        let id = OrganismId(self.next);
        self.next += 1;
        id
    }
}

/// Integer tile coordinates `(i, j)`: `i` is the column, `j` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub i: i32,
    pub j: i32,
}

impl TileCoord {
    pub fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    pub fn add(&self, di: i32, dj: i32) -> Self {
        Self {
            i: self.i + di,
            j: self.j + dj,
        }
    }

    /// Chebyshev distance, i.e. the number of king moves between two tiles.
    pub fn chebyshev_distance(&self, other: &TileCoord) -> i32 {
        (self.i - other.i).abs().max((self.j - other.j).abs())
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// Continuous position in world (pixel) space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
}

impl WorldPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position
    pub fn distance(&self, other: &WorldPos) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Sign of `v` as -1, 0 or 1. Unlike `f64::signum`, zero maps to zero.
pub fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Direction to one of the eight neighbouring tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    pub fn all() -> [Direction; 8] {
        [
            Direction::NorthWest,
            Direction::West,
            Direction::SouthWest,
            Direction::North,
            Direction::South,
            Direction::NorthEast,
            Direction::East,
            Direction::SouthEast,
        ]
    }
}

/// Terrain category of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverKind {
    Soil,
    Water,
    Rock,
}

impl fmt::Display for CoverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoverKind::Soil => "SOIL",
            CoverKind::Water => "WATER",
            CoverKind::Rock => "ROCK",
        };
        f.write_str(name)
    }
}

/// Organism archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpeciesKind {
    Plant,
    Deer,
    Wolf,
}

impl SpeciesKind {
    pub fn all() -> [SpeciesKind; 3] {
        [SpeciesKind::Plant, SpeciesKind::Deer, SpeciesKind::Wolf]
    }
}

impl fmt::Display for SpeciesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpeciesKind::Plant => "PLANT",
            SpeciesKind::Deer => "DEER",
            SpeciesKind::Wolf => "WOLF",
        };
        f.write_str(name)
    }
}

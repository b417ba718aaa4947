//! Procedural cover assignment.
//!
//! Covers are laid down by a randomized flood fill. Every border tile is seeded with the
//! border cover (water by default) and spreads from there; each neighbour either copies
//! its parent's cover with the parent's clumping probability `n` or rolls a fresh cover
//! and keeps spreading itself. Tiles the border pass never reached are filled afterwards.

use crate::grid::Grid;
use eco_core::{CoverKind, CoverType, Direction, EcosystemConfig, RandomSource, TileCoord};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A tile whose spread is in progress, with the neighbour offsets it has yet to try.
struct Frame {
    coord: TileCoord,
    remaining: Vec<(i32, i32)>,
}

#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    covers: Vec<CoverType>,
    border_cover: CoverKind,
}

impl TerrainGenerator {
    pub fn new(config: &EcosystemConfig) -> Self {
        Self {
            covers: config.covers.clone(),
            border_cover: config.world.border_cover,
        }
    }

    /// Assign a cover to every tile of an uncovered grid.
    pub fn generate(&self, grid: &mut Grid, random: &mut dyn RandomSource) {
        let mut visited = vec![false; grid.len()];

        let mut border = grid.border_coords();
        while !border.is_empty() {
            let coord = border.remove(random.index(border.len()));
            self.cover_and_fill(grid, &mut visited, coord, self.border_cover, random);
        }

        let mut interior_seeds = 0usize;
        let coords: Vec<TileCoord> = grid.coords().collect();
        for coord in coords {
            if grid.cover_at(coord).is_none() {
                interior_seeds += 1;
                self.spread(grid, &mut visited, coord, random);
            }
        }

        let mut counts: BTreeMap<CoverKind, usize> = BTreeMap::new();
        for tile in grid.iter() {
            if let Some(cover) = tile.cover {
                *counts.entry(cover).or_insert(0) += 1;
            }
        }
        debug!(interior_seeds, "Interior sweep finished");
        info!(
            width = grid.width,
            height = grid.height,
            covers = ?counts,
            "Terrain generated"
        );
    }

    fn cover_and_fill(
        &self,
        grid: &mut Grid,
        visited: &mut [bool],
        coord: TileCoord,
        cover: CoverKind,
        random: &mut dyn RandomSource,
    ) {
        if let Some(index) = grid.index_of(coord) {
            visited[index] = true;
        }
        if let Some(tile) = grid.tile_mut(coord) {
            tile.cover = Some(cover);
        }
        self.spread(grid, visited, coord, random);
    }

    /// Spread from `start` depth-first, visiting each tile's neighbours in random order.
    fn spread(
        &self,
        grid: &mut Grid,
        visited: &mut [bool],
        start: TileCoord,
        random: &mut dyn RandomSource,
    ) {
        let mut stack = vec![self.open(grid, start, random)];

        while let Some(top) = stack.len().checked_sub(1) {
            if stack[top].remaining.is_empty() {
                stack.pop();
                continue;
            }

            let pick = random.index(stack[top].remaining.len());
            let (di, dj) = stack[top].remaining.remove(pick);
            let here = stack[top].coord;
            let next = here.add(di, dj);

            let Some(index) = grid.index_of(next) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;

            if grid.cover_at(next).is_some() {
                continue;
            }

            let parent = grid.cover_at(here);
            let clumping = parent.and_then(|kind| self.cover(kind)).map_or(0.0, |c| c.n);
            if random.chance(clumping) {
                if let Some(tile) = grid.tile_mut(next) {
                    tile.cover = parent;
                }
            } else {
                stack.push(self.open(grid, next, random));
            }
        }
    }

    /// Roll a cover for `coord` if it has none yet and start a frame for it.
    fn open(&self, grid: &mut Grid, coord: TileCoord, random: &mut dyn RandomSource) -> Frame {
        if let Some(tile) = grid.tile_mut(coord) {
            if tile.cover.is_none() {
                tile.cover = self.roll_cover(random);
            }
        }
        Frame {
            coord,
            remaining: Direction::all().iter().map(Direction::to_delta).collect(),
        }
    }

    /// First registry entry whose `p` roll succeeds. The terminal entry has `p = 1.0`.
    fn roll_cover(&self, random: &mut dyn RandomSource) -> Option<CoverKind> {
        for cover in &self.covers {
            if random.chance(cover.p) {
                return Some(cover.kind);
            }
        }
        self.covers.last().map(|c| c.kind)
    }

    fn cover(&self, kind: CoverKind) -> Option<&CoverType> {
        self.covers.iter().find(|c| c.kind == kind)
    }
}

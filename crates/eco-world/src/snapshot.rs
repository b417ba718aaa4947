//! Read-only view of a simulation for rendering and export.

use crate::calendar::Calendar;
use crate::grid::Grid;
use crate::organism::{Organism, Status};
use eco_core::{CoverKind, EcosystemConfig, OrganismId, SpeciesKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganismView {
    pub id: OrganismId,
    pub species: SpeciesKind,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
    pub status: Status,
}

impl From<&Organism> for OrganismView {
    fn from(organism: &Organism) -> Self {
        Self {
            id: organism.id,
            species: organism.kind(),
            x: organism.position.x,
            y: organism.position.y,
            size: organism.size,
            color: organism.species.color.clone(),
            status: organism.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileView {
    pub i: i32,
    pub j: i32,
    pub cover: Option<CoverKind>,
    pub color: Option<String>,
    pub occupants: usize,
}

/// Everything a renderer needs for one frame: tiles coloured by cover and living
/// organisms coloured by species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub calendar: Calendar,
    pub clock: String,
    pub round: u64,
    pub width: usize,
    pub height: usize,
    pub cell_size: f64,
    pub populations: BTreeMap<SpeciesKind, usize>,
    pub organisms: Vec<OrganismView>,
    pub tiles: Vec<TileView>,
}

impl Snapshot {
    pub fn capture<'a, I>(
        grid: &Grid,
        organisms: I,
        calendar: Calendar,
        round: u64,
        config: &EcosystemConfig,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Organism>,
    {
        let organisms: Vec<OrganismView> = organisms
            .into_iter()
            .filter(|o| o.is_alive())
            .map(OrganismView::from)
            .collect();

        let mut populations: BTreeMap<SpeciesKind, usize> =
            config.species.iter().map(|s| (s.kind, 0)).collect();
        for view in &organisms {
            *populations.entry(view.species).or_insert(0) += 1;
        }

        let tiles = grid
            .iter()
            .map(|tile| TileView {
                i: tile.coord.i,
                j: tile.coord.j,
                cover: tile.cover,
                color: tile.cover.map(|kind| config.cover_color(kind).to_string()),
                occupants: tile.occupants.len(),
            })
            .collect();

        Self {
            calendar,
            clock: calendar.to_string(),
            round,
            width: grid.width,
            height: grid.height,
            cell_size: grid.cell_size,
            populations,
            organisms,
            tiles,
        }
    }

    pub fn to_json(&self) -> eco_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

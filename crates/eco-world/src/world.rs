//! Grid occupancy and the organism table.
//!
//! Tiles list their occupants by [`OrganismId`] and organisms record the coordinate of
//! the tile they stand on, so a move or a death is plain index bookkeeping on both
//! sides. Anything that finds the two sides disagreeing is recorded as an invariant
//! violation and surfaced by the simulation at the end of the tick.

use crate::grid::Grid;
use crate::organism::Organism;
use crate::pending::PendingChanges;
use eco_core::{Error, OrganismId, Result, WorldPos};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, error};

#[derive(Debug)]
pub struct World {
    grid: Grid,
    organisms: HashMap<OrganismId, Organism>,
    pub(crate) pending: PendingChanges,
    violations: Vec<String>,
}

impl World {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            organisms: HashMap::new(),
            pending: PendingChanges::new(),
            violations: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.organisms.get(&id)
    }

    pub fn organism_mut(&mut self, id: OrganismId) -> Option<&mut Organism> {
        self.organisms.get_mut(&id)
    }

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    /// Add an organism that is already listed on its tile.
    pub(crate) fn insert(&mut self, organism: Organism) {
        self.organisms.insert(organism.id, organism);
    }

    /// Add an organism and list it on the tile under its position.
    pub fn place(&mut self, mut organism: Organism) -> Result<OrganismId> {
        let coord = self
            .grid
            .world_to_tile_coords(organism.position.x, organism.position.y);
        let tile = self.grid.tile_mut(coord).ok_or_else(|| {
            Error::OutOfBounds(format!(
                "organism {} at ({}, {}) is outside the grid",
                organism.id, organism.position.x, organism.position.y
            ))
        })?;
        tile.add_occupant(organism.id);
        organism.tile = Some(coord);

        let id = organism.id;
        self.organisms.insert(id, organism);
        Ok(id)
    }

    pub(crate) fn remove(&mut self, id: OrganismId) -> Option<Organism> {
        self.organisms.remove(&id)
    }

    /// Organisms around `id` matching `predicate(me, other)`, nearest first.
    ///
    /// The organism's own tile is searched first; only when nothing there matches are
    /// the eight neighbouring tiles searched instead. An organism never matches itself.
    /// Equally distant matches keep their scan order.
    pub fn nearby_organisms<F>(&self, id: OrganismId, predicate: F) -> Vec<OrganismId>
    where
        F: Fn(&Organism, &Organism) -> bool,
    {
        let Some(me) = self.organisms.get(&id) else {
            return Vec::new();
        };
        let Some(coord) = me.tile else {
            return Vec::new();
        };

        let matching = |occupants: &[OrganismId]| {
            occupants
                .iter()
                .filter_map(|other| self.organisms.get(other))
                .filter(|other| other.id != id && predicate(me, other))
                .collect::<Vec<_>>()
        };

        let mut found = self
            .grid
            .tile(coord)
            .map(|tile| matching(&tile.occupants))
            .unwrap_or_default();

        if found.is_empty() {
            for neighbour in self.grid.neighbors(coord) {
                if let Some(tile) = self.grid.tile(neighbour) {
                    found.extend(matching(&tile.occupants));
                }
            }
        }

        found.sort_by(|a, b| {
            me.distance_to(a)
                .partial_cmp(&me.distance_to(b))
                .unwrap_or(Ordering::Equal)
        });
        found.into_iter().map(|o| o.id).collect()
    }

    pub fn nearby_prey(&self, id: OrganismId) -> Vec<OrganismId> {
        match self.organisms.get(&id) {
            Some(me) if me.species.prey.is_some() => self
                .nearby_organisms(id, |me, other| other.is_alive() && me.preys_on(other)),
            _ => Vec::new(),
        }
    }

    pub fn nearby_predators(&self, id: OrganismId) -> Vec<OrganismId> {
        match self.organisms.get(&id) {
            Some(me) if me.species.predators.is_some() => self
                .nearby_organisms(id, |me, other| other.is_alive() && me.is_hunted_by(other)),
            _ => Vec::new(),
        }
    }

    /// Kill an organism. Leaves its tile immediately; leaves the active collection when
    /// the tick's pending deaths are drained. Returns `false` if it was already dead.
    pub fn die(&mut self, id: OrganismId) -> bool {
        if !self.organisms.contains_key(&id) {
            self.violation(format!("cannot kill unknown organism {}", id));
            return false;
        }
        let Some(organism) = self.organisms.get_mut(&id) else {
            return false;
        };
        if !organism.mark_dead() {
            return false;
        }
        let tile = organism.tile.take();
        let species = organism.kind();

        self.pending.schedule_death(id);

        let removed = tile
            .and_then(|coord| self.grid.tile_mut(coord))
            .map_or(false, |t| t.remove_occupant(id));
        if !removed {
            self.violation(format!(
                "organism {} was not listed on its tile {:?} when it died",
                id, tile
            ));
        }

        debug!(
            event = "organism_death",
            organism_id = %id,
            species = %species,
            "Organism died"
        );
        true
    }

    /// Move an organism to `destination` if it lies inside the world on a tile its
    /// species can stand on. Returns whether the move happened.
    pub fn try_move(&mut self, id: OrganismId, destination: WorldPos) -> bool {
        let (width, height) = self.grid.bounds();
        if !(destination.x >= 0.0
            && destination.x < width
            && destination.y >= 0.0
            && destination.y < height)
        {
            return false;
        }

        let coord = self
            .grid
            .world_to_tile_coords(destination.x, destination.y);
        let cover = self.grid.cover_at(coord);

        let Some(organism) = self.organisms.get(&id) else {
            return false;
        };
        if !organism.is_alive() || !organism.can_move(cover) {
            return false;
        }

        let current = organism.tile;
        if current != Some(coord) {
            let removed = current
                .and_then(|c| self.grid.tile_mut(c))
                .map_or(false, |t| t.remove_occupant(id));
            if !removed {
                self.violation(format!(
                    "organism {} was not listed on its tile {:?} when it moved",
                    id, current
                ));
                return false;
            }
            if let Some(tile) = self.grid.tile_mut(coord) {
                tile.add_occupant(id);
            }
        }

        if let Some(organism) = self.organisms.get_mut(&id) {
            organism.position = destination;
            organism.tile = Some(coord);
        }
        true
    }

    fn violation(&mut self, message: String) {
        error!(event = "invariant_violation", "{}", message);
        self.violations.push(message);
    }

    pub(crate) fn record_violation(&mut self, message: String) {
        self.violation(message);
    }

    pub(crate) fn take_violations(&mut self) -> Vec<String> {
        std::mem::take(&mut self.violations)
    }

    /// Every way tiles and organisms currently disagree about occupancy.
    pub fn consistency_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for organism in self.organisms.values() {
            let listed = organism
                .tile
                .and_then(|coord| self.grid.tile(coord))
                .map_or(false, |tile| tile.contains(organism.id));
            if organism.is_alive() != listed {
                errors.push(format!(
                    "organism {} ({:?}) listed on its tile: {}",
                    organism.id, organism.status, listed
                ));
            }
        }

        for tile in self.grid.iter() {
            for id in &tile.occupants {
                match self.organisms.get(id) {
                    Some(o) if o.tile == Some(tile.coord) => {}
                    _ => errors.push(format!(
                        "tile {} lists {} which does not point back at it",
                        tile.coord, id
                    )),
                }
            }
        }

        errors
    }
}

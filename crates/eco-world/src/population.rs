//! Initial population seeding.

use crate::grid::Grid;
use crate::organism::Organism;
use eco_core::{EcosystemConfig, IdAllocator, RandomSource, SpeciesKind, SpeciesProfile, WorldPos};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Seeds organisms onto a covered grid according to each species' habitat and abundance.
#[derive(Debug, Clone)]
pub struct PopulationGenerator {
    species: Vec<Arc<SpeciesProfile>>,
}

impl PopulationGenerator {
    pub fn new(config: &EcosystemConfig) -> Self {
        Self {
            species: config.species.iter().cloned().map(Arc::new).collect(),
        }
    }

    pub fn species(&self) -> &[Arc<SpeciesProfile>] {
        &self.species
    }

    /// Shared profile for a species kind, if registered.
    pub fn profile(&self, kind: SpeciesKind) -> Option<Arc<SpeciesProfile>> {
        self.species.iter().find(|s| s.kind == kind).cloned()
    }

    /// Populate every tile and return the new organisms, already listed on their tiles.
    ///
    /// A tile picks one species among those whose habitat matches and whose abundance
    /// roll succeeds, then keeps adding members while fecundity rolls succeed. The
    /// litter size is unbounded; long litters simply become geometrically unlikely.
    pub fn generate(
        &self,
        grid: &mut Grid,
        random: &mut dyn RandomSource,
        ids: &mut IdAllocator,
        now: u64,
    ) -> Vec<Organism> {
        let mut organisms = Vec::new();
        let cell = grid.cell_size;
        let coords: Vec<_> = grid.coords().collect();

        for coord in coords {
            let Some(cover) = grid.cover_at(coord) else {
                warn!(tile = %coord, "Skipping uncovered tile while seeding population");
                continue;
            };

            let viable: Vec<&Arc<SpeciesProfile>> = self
                .species
                .iter()
                .filter(|s| s.inhabits(cover) && random.chance(s.abundance))
                .collect();
            if viable.is_empty() {
                continue;
            }

            let species = viable[random.index(viable.len())];
            let origin = grid.tile_to_world(coord);

            while random.chance(species.fecundity) {
                let position = WorldPos::new(
                    origin.x + (random.uniform() * cell).floor(),
                    origin.y + (random.uniform() * cell).floor(),
                );
                let mut organism =
                    Organism::spawn(ids.allocate(), Arc::clone(species), position, now, random);
                organism.tile = Some(coord);
                if let Some(tile) = grid.tile_mut(coord) {
                    tile.add_occupant(organism.id);
                }
                organisms.push(organism);
            }
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for organism in &organisms {
            *counts.entry(organism.kind().to_string()).or_insert(0) += 1;
        }
        info!(total = organisms.len(), species = ?counts, "Population seeded");

        organisms
    }
}

//! Simulation engine for running an ecosystem.

use crate::behavior::{self, TickContext};
use crate::calendar::Calendar;
use crate::grid::{Grid, Tile};
use crate::organism::Organism;
use crate::population::PopulationGenerator;
use crate::snapshot::Snapshot;
use crate::terrain::TerrainGenerator;
use crate::world::World;
use eco_core::{
    ChaChaSource, EcosystemConfig, Error, IdAllocator, OrganismId, RandomSource, Result,
    SpeciesKind, TileCoord, WorldPos,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// What one tick changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Tick counter after the tick
    pub round: u64,
    pub births: usize,
    pub deaths: usize,
    pub population: usize,
}

/// Totals over a [`Simulation::run`] call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub ticks: u64,
    pub births: usize,
    pub deaths: usize,
    /// Ticks that completed with invariant violations
    pub failed_ticks: u64,
    pub population: usize,
}

pub struct Simulation {
    config: Arc<EcosystemConfig>,
    terrain: TerrainGenerator,
    population: PopulationGenerator,
    world: World,
    /// Organisms updated each tick, in update order
    active: Vec<OrganismId>,
    random: Box<dyn RandomSource>,
    ids: IdAllocator,
    round: u64,
    calendar: Calendar,
}

impl Simulation {
    /// Generate terrain and population from `config`, seeded from `config.seed` when set.
    pub fn new(config: Arc<EcosystemConfig>) -> Result<Self> {
        let random = Box::new(ChaChaSource::from_seed_option(config.seed));
        Self::with_random(config, random)
    }

    pub fn with_random(config: Arc<EcosystemConfig>, random: Box<dyn RandomSource>) -> Result<Self> {
        let grid = Grid::from_config(&config.world);
        let mut sim = Self::from_grid(config, grid, random)?;
        sim.generate();
        Ok(sim)
    }

    /// Wrap an existing grid without seeding any organisms.
    pub fn from_grid(
        config: Arc<EcosystemConfig>,
        grid: Grid,
        random: Box<dyn RandomSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            terrain: TerrainGenerator::new(&config),
            population: PopulationGenerator::new(&config),
            world: World::new(grid),
            active: Vec::new(),
            random,
            ids: IdAllocator::new(),
            round: 0,
            calendar: Calendar::at(0),
            config,
        })
    }

    fn generate(&mut self) {
        let grid = self.world.grid_mut();
        self.terrain.generate(grid, &mut *self.random);
        let organisms = self
            .population
            .generate(grid, &mut *self.random, &mut self.ids, self.round);

        self.active = organisms.iter().map(|o| o.id).collect();
        for organism in organisms {
            self.world.insert(organism);
        }
    }

    /// Advance the world by one tick.
    ///
    /// Every active organism is updated in collection order, then the deaths and births
    /// recorded during the pass are committed. Invariant violations detected along the
    /// way are returned as an error once the tick has completed.
    pub fn tick(&mut self) -> Result<TickSummary> {
        self.calendar = Calendar::at(self.round);
        self.round += 1;

        let ctx = TickContext {
            calendar: self.calendar,
            behavior: &self.config.behavior,
            breeding: &self.config.breeding,
        };
        let order = self.active.clone();
        for id in order {
            behavior::update(&mut self.world, id, &ctx, &mut *self.random, &mut self.ids);
        }

        let (births, deaths) = self.world.pending.take();

        let dead: HashSet<OrganismId> = deaths.iter().copied().collect();
        let before = self.active.len();
        self.active.retain(|id| !dead.contains(id));
        if before - self.active.len() != dead.len() {
            self.world.record_violation(format!(
                "{} pending deaths but {} organisms left the active collection",
                dead.len(),
                before - self.active.len()
            ));
        }
        for id in &deaths {
            if self.world.remove(*id).is_none() {
                self.world
                    .record_violation(format!("pending death {} has no organism", id));
            }
        }

        let mut born = 0;
        for organism in births {
            match self.world.place(organism) {
                Ok(id) => {
                    self.active.push(id);
                    born += 1;
                    debug!(
                        event = "birth_committed",
                        organism_id = %id,
                        tick = self.round,
                        "Newborn placed"
                    );
                }
                Err(e) => self.world.record_violation(e.to_string()),
            }
        }

        let violations = self.world.take_violations();
        if !violations.is_empty() {
            error!(
                tick = self.round,
                count = violations.len(),
                "Tick completed with invariant violations"
            );
            return Err(Error::InvariantViolation(violations.join("; ")));
        }

        Ok(TickSummary {
            round: self.round,
            births: born,
            deaths: deaths.len(),
            population: self.active.len(),
        })
    }

    /// Run `ticks` ticks, logging a population summary every `report_every` ticks.
    /// Ticks with invariant violations are counted and the run continues.
    #[instrument(skip(self), fields(start = self.round))]
    pub fn run(&mut self, ticks: u64, report_every: u64) -> RunReport {
        let mut report = RunReport::default();

        for _ in 0..ticks {
            match self.tick() {
                Ok(summary) => {
                    report.births += summary.births;
                    report.deaths += summary.deaths;
                }
                Err(e) => {
                    report.failed_ticks += 1;
                    warn!(tick = self.round, error = %e, "Tick failed");
                }
            }
            report.ticks += 1;

            if report_every > 0 && self.round % report_every == 0 {
                info!(
                    event = "population_report",
                    tick = self.round,
                    clock = %self.calendar,
                    population = ?self.population_counts(),
                    "Population report"
                );
            }
        }

        report.population = self.active.len();
        report
    }

    /// Regenerate terrain and population and restart the clock.
    pub fn reset(&mut self) {
        self.world = World::new(Grid::from_config(&self.config.world));
        self.active.clear();
        self.ids = IdAllocator::new();
        self.round = 0;
        self.calendar = Calendar::at(0);
        self.generate();
        info!(population = self.active.len(), "Simulation reset");
    }

    /// Move the clock to `round` without updating anyone.
    pub fn set_clock(&mut self, round: u64) {
        self.round = round;
        self.calendar = Calendar::at(round);
    }

    /// Add a new organism of `kind` at a world position, born now.
    pub fn introduce(&mut self, kind: SpeciesKind, position: WorldPos) -> Result<OrganismId> {
        let species = self
            .population
            .profile(kind)
            .ok_or_else(|| Error::NotFound(format!("species {} is not registered", kind)))?;
        let organism = Organism::spawn(
            self.ids.allocate(),
            species,
            position,
            self.round,
            &mut *self.random,
        );
        let id = self.world.place(organism)?;
        self.active.push(id);
        Ok(id)
    }

    pub fn config(&self) -> &EcosystemConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        self.world.grid()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Calendar as computed at the start of the last tick
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.world.organism(id)
    }

    /// Active organisms in update order
    pub fn organisms(&self) -> impl Iterator<Item = &Organism> + '_ {
        self.active.iter().filter_map(|id| self.world.organism(*id))
    }

    pub fn organisms_of(&self, kind: SpeciesKind) -> impl Iterator<Item = &Organism> + '_ {
        self.organisms().filter(move |o| o.kind() == kind)
    }

    pub fn population(&self) -> usize {
        self.active.len()
    }

    /// Living organisms per registered species, zero counts included.
    pub fn population_counts(&self) -> BTreeMap<SpeciesKind, usize> {
        let mut counts: BTreeMap<SpeciesKind, usize> =
            self.population.species().iter().map(|s| (s.kind, 0)).collect();
        for organism in self.organisms().filter(|o| o.is_alive()) {
            *counts.entry(organism.kind()).or_insert(0) += 1;
        }
        counts
    }

    pub fn tile_at(&self, i: i32, j: i32) -> Option<&Tile> {
        self.world.grid().tile_at(i, j)
    }

    pub fn tile_at_world_coords(&self, x: f64, y: f64) -> Option<&Tile> {
        self.world.grid().tile_at_world_coords(x, y)
    }

    pub fn world_to_tile_coords(&self, x: f64, y: f64) -> TileCoord {
        self.world.grid().world_to_tile_coords(x, y)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.world.grid(),
            self.organisms(),
            self.calendar,
            self.round,
            &self.config,
        )
    }

    /// Occupancy bookkeeping check over the whole world.
    pub fn check_consistency(&self) -> Result<()> {
        let errors = self.world.consistency_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvariantViolation(errors.join("; ")))
        }
    }
}

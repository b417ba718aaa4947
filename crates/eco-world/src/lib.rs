//! World simulation engine.
//!
//! This module implements the tile grid, its terrain generator, and the predator-prey
//! ecosystem that lives on it.

pub mod behavior;
pub mod calendar;
pub mod grid;
pub mod organism;
pub mod pending;
pub mod population;
pub mod simulation;
pub mod snapshot;
pub mod terrain;
pub mod world;

pub use calendar::{Calendar, Season};
pub use grid::{Grid, Tile};
pub use organism::{Organism, Status};
pub use pending::PendingChanges;
pub use population::PopulationGenerator;
pub use simulation::{RunReport, Simulation, TickSummary};
pub use snapshot::{OrganismView, Snapshot, TileView};
pub use terrain::TerrainGenerator;
pub use world::World;

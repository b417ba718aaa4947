//! Configuration types for the simulation.
//!
//! The cover-type and species registries live here as plain data. They are loaded once,
//! validated, and then shared read-only (usually behind an `Arc`) by the grid, the
//! generators and the simulation.

use crate::error::{Error, Result};
use crate::types::{CoverKind, SpeciesKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Simulated time: one tick is ten seconds.
pub const TICKS_PER_MINUTE: u64 = 6;
pub const MINUTES_PER_HOUR: u64 = 60;
pub const HOURS_PER_DAY: u64 = 24;
pub const DAYS_PER_MONTH: u64 = 30;
pub const MONTHS_PER_SEASON: u64 = 3;
pub const SEASONS_PER_YEAR: u64 = 4;
pub const MONTHS_PER_YEAR: u64 = 12;
pub const DAYS_PER_YEAR: u64 = DAYS_PER_MONTH * MONTHS_PER_YEAR;

pub const TICKS_PER_HOUR: u64 = TICKS_PER_MINUTE * MINUTES_PER_HOUR;
pub const TICKS_PER_DAY: u64 = TICKS_PER_HOUR * HOURS_PER_DAY;
pub const TICKS_PER_YEAR: u64 = TICKS_PER_DAY * DAYS_PER_YEAR;

/// A terrain category and how it is distributed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverType {
    pub kind: CoverKind,
    /// Probability of this cover being picked when a tile rolls a fresh cover
    pub p: f64,
    /// Probability of this cover spreading to an uncovered neighbour ("clumpiness")
    pub n: f64,
    /// Display colour
    pub color: String,
}

impl CoverType {
    pub fn new(kind: CoverKind, p: f64, n: f64, color: &str) -> Self {
        Self {
            kind,
            p,
            n,
            color: color.to_string(),
        }
    }
}

/// Static description of an organism archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub kind: SpeciesKind,
    /// Cover types this species may occupy and traverse
    pub habitat: Vec<CoverKind>,
    #[serde(default)]
    pub prey: Option<Vec<SpeciesKind>>,
    #[serde(default)]
    pub predators: Option<Vec<SpeciesKind>>,
    /// Movement speed in world units
    pub speed: f64,
    /// Base (full) health
    pub health: f64,
    /// Probability of producing one more offspring
    pub fecundity: f64,
    /// Per-tile probability of being eligible to spawn
    pub abundance: f64,
    /// Lifespan in years
    pub lifespan: f64,
    /// Upper bound of the size roll; sizes fall in `1..=size`
    pub size: u32,
    /// Ticks without food before the organism turns hungry. `None` for species that never hunt.
    #[serde(default)]
    pub hunger_threshold_ticks: Option<u64>,
    pub color: String,
}

impl SpeciesProfile {
    pub fn inhabits(&self, cover: CoverKind) -> bool {
        self.habitat.contains(&cover)
    }

    pub fn preys_on(&self, kind: SpeciesKind) -> bool {
        self.prey.as_ref().map_or(false, |prey| prey.contains(&kind))
    }

    pub fn is_hunted_by(&self, kind: SpeciesKind) -> bool {
        self.predators
            .as_ref()
            .map_or(false, |predators| predators.contains(&kind))
    }

    /// Health lost every tick. Hardier species (higher base health) decay slower.
    pub fn health_decay_per_tick(&self) -> f64 {
        1.0 / (self.health * 24.0 * 60.0 * 60.0 * 60.0)
    }
}

/// World dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Width of the world grid in tiles
    pub width: usize,
    /// Height of the world grid in tiles
    pub height: usize,
    /// Side of one tile in world units
    pub cell_size: f64,
    /// Cover used to seed the flood fill from every border tile
    pub border_cover: CoverKind,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 30,
            height: 20,
            cell_size: 10.0,
            border_cover: CoverKind::Water,
        }
    }
}

/// What thirsty and hungry organisms do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeprivationPolicy {
    /// Stay put until the need passes
    Idle,
    /// Walk to water when thirsty, hunt when hungry
    Forage,
}

/// Per-tick behaviour constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// First hour of the day (0-23) that counts as night. Animals sleep through the
    /// night; equal start and end hours leave the window empty and nobody sleeps.
    pub night_start_hour: u64,
    /// First hour of the day that is no longer night
    pub night_end_hour: u64,
    /// Ticks without a drink before an organism turns thirsty
    pub thirst_threshold_ticks: u64,
    /// Per-tick death chance once health has gone negative
    pub starvation_death_chance: f64,
    /// Per-tick death chance once older than the species lifespan
    pub old_age_death_chance: f64,
    /// Size a plant loses each tick it is being eaten
    pub plant_bite: f64,
    /// Prey approach step is `speed / prey_step_divisor`
    pub prey_step_divisor: f64,
    pub deprivation: DeprivationPolicy,
    /// Tile radius searched for water when foraging
    pub water_search_radius: i32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            night_start_hour: 0,
            night_end_hour: 0,
            thirst_threshold_ticks: TICKS_PER_HOUR * 5 / 2,
            starvation_death_chance: 0.05,
            old_age_death_chance: 0.01,
            plant_bite: 1.0 / (60.0 * 60.0 * 60.0),
            prey_step_divisor: 10.0,
            deprivation: DeprivationPolicy::Forage,
            water_search_radius: 2,
        }
    }
}

/// Offspring produced during the simulation (as opposed to initial seeding)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingConfig {
    pub enabled: bool,
    /// Minimum ticks between two litters of the same parent
    pub interval_ticks: u64,
}

impl Default for BreedingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ticks: TICKS_PER_YEAR,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcosystemConfig {
    pub world: WorldConfig,
    /// Ordered cover registry; the last entry must have `p == 1.0`
    pub covers: Vec<CoverType>,
    pub species: Vec<SpeciesProfile>,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub breeding: BreedingConfig,
    /// Seed for the default random source; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            covers: default_covers(),
            species: default_species(),
            behavior: BehaviorConfig::default(),
            breeding: BreedingConfig::default(),
            seed: None,
        }
    }
}

pub fn default_covers() -> Vec<CoverType> {
    vec![
        CoverType::new(CoverKind::Soil, 0.70, 0.25, "#deb887"),
        CoverType::new(CoverKind::Water, 0.05, 0.95, "#0000ff"),
        CoverType::new(CoverKind::Rock, 1.0, 0.25, "#808080"),
    ]
}

pub fn default_species() -> Vec<SpeciesProfile> {
    vec![
        SpeciesProfile {
            kind: SpeciesKind::Plant,
            habitat: vec![CoverKind::Soil],
            prey: None,
            predators: None,
            speed: 0.0,
            health: 10.0,
            fecundity: 0.65,
            abundance: 0.85,
            lifespan: 2.0,
            size: 4,
            hunger_threshold_ticks: None,
            color: "#008000".to_string(),
        },
        SpeciesProfile {
            kind: SpeciesKind::Deer,
            habitat: vec![CoverKind::Soil],
            prey: Some(vec![SpeciesKind::Plant]),
            predators: Some(vec![SpeciesKind::Wolf]),
            speed: 10.0,
            health: 30.0,
            fecundity: 0.25,
            abundance: 0.15,
            lifespan: 8.0,
            size: 3,
            hunger_threshold_ticks: None,
            color: "#806000".to_string(),
        },
        SpeciesProfile {
            kind: SpeciesKind::Wolf,
            habitat: vec![CoverKind::Soil, CoverKind::Rock],
            prey: Some(vec![SpeciesKind::Deer]),
            predators: None,
            speed: 8.0,
            health: 15.0,
            fecundity: 0.5,
            abundance: 0.05,
            lifespan: 6.0,
            size: 1,
            hunger_threshold_ticks: Some(TICKS_PER_HOUR * 48),
            color: "#800000".to_string(),
        },
    ]
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

impl EcosystemConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: EcosystemConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn cover(&self, kind: CoverKind) -> Option<&CoverType> {
        self.covers.iter().find(|c| c.kind == kind)
    }

    pub fn species_profile(&self, kind: SpeciesKind) -> Option<&SpeciesProfile> {
        self.species.iter().find(|s| s.kind == kind)
    }

    pub fn cover_color(&self, kind: CoverKind) -> &str {
        self.cover(kind).map_or("black", |c| c.color.as_str())
    }

    /// Check the registry invariants the generators rely on.
    pub fn validate(&self) -> Result<()> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.world.width, self.world.height
            )));
        }
        if !(self.world.cell_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "cell size must be positive, got {}",
                self.world.cell_size
            )));
        }

        let last = self
            .covers
            .last()
            .ok_or_else(|| Error::InvalidConfig("cover registry is empty".to_string()))?;
        if last.p != 1.0 {
            return Err(Error::InvalidConfig(format!(
                "last cover type ({}) must have p = 1.0, got {}",
                last.kind, last.p
            )));
        }

        let mut seen_covers = HashSet::new();
        for cover in &self.covers {
            if !seen_covers.insert(cover.kind) {
                return Err(Error::InvalidConfig(format!(
                    "cover {} registered twice",
                    cover.kind
                )));
            }
            check_probability(&format!("{}.p", cover.kind), cover.p)?;
            check_probability(&format!("{}.n", cover.kind), cover.n)?;
        }
        if !seen_covers.contains(&self.world.border_cover) {
            return Err(Error::InvalidConfig(format!(
                "border cover {} is not registered",
                self.world.border_cover
            )));
        }

        let registered: HashSet<SpeciesKind> = self.species.iter().map(|s| s.kind).collect();
        if registered.len() != self.species.len() {
            return Err(Error::InvalidConfig(
                "species registered more than once".to_string(),
            ));
        }

        for species in &self.species {
            check_probability(&format!("{}.fecundity", species.kind), species.fecundity)?;
            check_probability(&format!("{}.abundance", species.kind), species.abundance)?;
            if species.size == 0 {
                return Err(Error::InvalidConfig(format!(
                    "{} size range must include at least 1",
                    species.kind
                )));
            }
            if !(species.health > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} base health must be positive",
                    species.kind
                )));
            }
            if let Some(cover) = species.habitat.iter().find(|c| !seen_covers.contains(c)) {
                return Err(Error::InvalidConfig(format!(
                    "{} habitat names unregistered cover {}",
                    species.kind, cover
                )));
            }
            let related = species
                .prey
                .iter()
                .flatten()
                .chain(species.predators.iter().flatten());
            for kind in related {
                if !registered.contains(kind) {
                    return Err(Error::InvalidConfig(format!(
                        "{} refers to unregistered species {}",
                        species.kind, kind
                    )));
                }
            }
        }

        check_probability("starvation_death_chance", self.behavior.starvation_death_chance)?;
        check_probability("old_age_death_chance", self.behavior.old_age_death_chance)?;
        if self.behavior.night_start_hour >= HOURS_PER_DAY
            || self.behavior.night_end_hour >= HOURS_PER_DAY
        {
            return Err(Error::InvalidConfig(
                "night window hours must be within 0..24".to_string(),
            ));
        }
        if !(self.behavior.prey_step_divisor > 0.0) {
            return Err(Error::InvalidConfig(
                "prey step divisor must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

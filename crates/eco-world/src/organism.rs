//! Organism state and management.

use crate::calendar::Calendar;
use eco_core::{
    BehaviorConfig, CoverKind, OrganismId, RandomSource, SpeciesKind, SpeciesProfile, TileCoord,
    WorldPos, TICKS_PER_YEAR,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Life status, recomputed every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Alive,
    Sleep,
    Thirsty,
    Hungry,
    Dead,
}

/// An organism in the simulation
#[derive(Debug, Clone)]
pub struct Organism {
    pub id: OrganismId,
    pub species: Arc<SpeciesProfile>,
    pub position: WorldPos,
    pub size: f64,
    pub health: f64,
    /// Current movement speed; zeroed on death
    pub speed: f64,
    pub status: Status,
    pub birth_tick: u64,
    pub last_drink_tick: u64,
    pub last_food_tick: u64,
    pub last_litter_tick: u64,
    /// Tile whose occupant list holds this organism. `None` once dead.
    pub tile: Option<TileCoord>,
}

impl Organism {
    /// Create an organism of `species` at `position`, rolling its size from the species range.
    pub fn spawn(
        id: OrganismId,
        species: Arc<SpeciesProfile>,
        position: WorldPos,
        now: u64,
        random: &mut dyn RandomSource,
    ) -> Self {
        let size = (random.uniform() * species.size as f64).floor() + 1.0;
        Self {
            id,
            position,
            size,
            health: species.health,
            speed: species.speed,
            status: Status::Alive,
            birth_tick: now,
            last_drink_tick: now,
            last_food_tick: now,
            last_litter_tick: now,
            tile: None,
            species,
        }
    }

    pub fn kind(&self) -> SpeciesKind {
        self.species.kind
    }

    pub fn is_alive(&self) -> bool {
        self.status != Status::Dead
    }

    pub fn distance_to(&self, other: &Organism) -> f64 {
        self.position.distance(&other.position)
    }

    pub fn age_years(&self, now: u64) -> f64 {
        now.saturating_sub(self.birth_tick) as f64 / TICKS_PER_YEAR as f64
    }

    pub fn is_past_lifespan(&self, now: u64) -> bool {
        self.age_years(now) > self.species.lifespan
    }

    pub fn preys_on(&self, other: &Organism) -> bool {
        self.species.preys_on(other.kind())
    }

    pub fn is_hunted_by(&self, other: &Organism) -> bool {
        self.species.is_hunted_by(other.kind())
    }

    /// Whether this species can stand on a tile with the given cover.
    pub fn can_move(&self, cover: Option<CoverKind>) -> bool {
        cover.map_or(false, |c| self.species.inhabits(c))
    }

    /// Status for this tick, in order of urgency: sleep, thirst, hunger.
    pub fn next_status(&self, calendar: &Calendar, behavior: &BehaviorConfig) -> Status {
        if !self.is_alive() {
            return Status::Dead;
        }

        let now = calendar.tick;
        if is_night(calendar.hour_of_day(), behavior) {
            Status::Sleep
        } else if now.saturating_sub(self.last_drink_tick) > behavior.thirst_threshold_ticks {
            Status::Thirsty
        } else if self
            .species
            .hunger_threshold_ticks
            .map_or(false, |limit| now.saturating_sub(self.last_food_tick) > limit)
        {
            Status::Hungry
        } else {
            Status::Alive
        }
    }

    pub fn decay_health(&mut self) {
        self.health -= self.species.health_decay_per_tick();
    }

    pub fn restore_health(&mut self) {
        self.health = self.species.health;
    }

    /// Mark dead. Returns `false` if the organism was already dead.
    pub(crate) fn mark_dead(&mut self) -> bool {
        if self.status == Status::Dead {
            return false;
        }
        self.status = Status::Dead;
        self.speed = 0.0;
        true
    }
}

/// Night wraps around midnight when the window starts later than it ends.
pub fn is_night(hour_of_day: u64, behavior: &BehaviorConfig) -> bool {
    let (start, end) = (behavior.night_start_hour, behavior.night_end_hour);
    if start <= end {
        hour_of_day >= start && hour_of_day < end
    } else {
        hour_of_day >= start || hour_of_day < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::{EcosystemConfig, FixedSource, TICKS_PER_HOUR};

    fn profile(kind: SpeciesKind) -> Arc<SpeciesProfile> {
        Arc::new(
            EcosystemConfig::default()
                .species_profile(kind)
                .cloned()
                .unwrap(),
        )
    }

    fn organism(kind: SpeciesKind, now: u64) -> Organism {
        Organism::spawn(
            OrganismId(1),
            profile(kind),
            WorldPos::new(15.0, 15.0),
            now,
            &mut FixedSource(0.5),
        )
    }

    #[test]
    fn test_organism_creation() {
        let deer = organism(SpeciesKind::Deer, 100);
        assert_eq!(deer.kind(), SpeciesKind::Deer);
        assert_eq!(deer.health, 30.0);
        assert_eq!(deer.speed, 10.0);
        assert_eq!(deer.status, Status::Alive);
        assert_eq!(deer.birth_tick, 100);
        // floor(0.5 * 3) + 1
        assert_eq!(deer.size, 2.0);
    }

    #[test]
    fn test_size_roll_range() {
        let low = Organism::spawn(
            OrganismId(1),
            profile(SpeciesKind::Plant),
            WorldPos::default(),
            0,
            &mut FixedSource(0.0),
        );
        let high = Organism::spawn(
            OrganismId(2),
            profile(SpeciesKind::Plant),
            WorldPos::default(),
            0,
            &mut FixedSource(0.999),
        );
        assert_eq!(low.size, 1.0);
        assert_eq!(high.size, 4.0);
    }

    fn nocturnal() -> BehaviorConfig {
        BehaviorConfig {
            night_start_hour: 21,
            night_end_hour: 6,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_priority() {
        let behavior = nocturnal();
        let wolf = organism(SpeciesKind::Wolf, 0);

        // midnight
        assert_eq!(wolf.next_status(&Calendar::at(0), &behavior), Status::Sleep);

        // 10:00, freshly watered and fed
        let morning = 10 * TICKS_PER_HOUR;
        let mut fresh = wolf.clone();
        fresh.last_drink_tick = morning;
        fresh.last_food_tick = morning;
        assert_eq!(fresh.next_status(&Calendar::at(morning), &behavior), Status::Alive);

        // thirst outranks hunger
        let mut parched = fresh.clone();
        parched.last_drink_tick = 0;
        parched.last_food_tick = 0;
        assert_eq!(parched.next_status(&Calendar::at(morning), &behavior), Status::Thirsty);

        // two days and change without food, but watered
        let later = 3 * 24 * TICKS_PER_HOUR + 10 * TICKS_PER_HOUR;
        let mut starving = wolf.clone();
        starving.last_drink_tick = later;
        assert_eq!(starving.next_status(&Calendar::at(later), &behavior), Status::Hungry);
    }

    #[test]
    fn test_only_hunting_species_get_hungry() {
        let behavior = BehaviorConfig::default();
        let later = 3 * 24 * TICKS_PER_HOUR + 10 * TICKS_PER_HOUR;
        let mut deer = organism(SpeciesKind::Deer, 0);
        deer.last_drink_tick = later;
        assert_eq!(deer.next_status(&Calendar::at(later), &behavior), Status::Alive);
    }

    #[test]
    fn test_night_window() {
        let behavior = nocturnal();
        assert!(is_night(21, &behavior));
        assert!(is_night(23, &behavior));
        assert!(is_night(0, &behavior));
        assert!(is_night(5, &behavior));
        assert!(!is_night(6, &behavior));
        assert!(!is_night(20, &behavior));

        let daytime_nap = BehaviorConfig {
            night_start_hour: 12,
            night_end_hour: 14,
            ..Default::default()
        };
        assert!(is_night(13, &daytime_nap));
        assert!(!is_night(14, &daytime_nap));
    }

    #[test]
    fn test_default_window_never_sleeps() {
        let behavior = BehaviorConfig::default();
        assert!((0..24).all(|hour| !is_night(hour, &behavior)));

        let wolf = organism(SpeciesKind::Wolf, 0);
        assert_eq!(wolf.next_status(&Calendar::at(0), &behavior), Status::Alive);
    }

    #[test]
    fn test_mark_dead_is_idempotent() {
        let mut deer = organism(SpeciesKind::Deer, 0);
        assert!(deer.mark_dead());
        assert!(!deer.mark_dead());
        assert_eq!(deer.status, Status::Dead);
        assert_eq!(deer.speed, 0.0);
        assert_eq!(deer.next_status(&Calendar::at(0), &BehaviorConfig::default()), Status::Dead);
    }

    #[test]
    fn test_habitat_and_relations() {
        let deer = organism(SpeciesKind::Deer, 0);
        let wolf = organism(SpeciesKind::Wolf, 0);
        let plant = organism(SpeciesKind::Plant, 0);

        assert!(deer.can_move(Some(CoverKind::Soil)));
        assert!(!deer.can_move(Some(CoverKind::Rock)));
        assert!(!deer.can_move(None));
        assert!(wolf.can_move(Some(CoverKind::Rock)));

        assert!(wolf.preys_on(&deer));
        assert!(deer.preys_on(&plant));
        assert!(deer.is_hunted_by(&wolf));
        assert!(!wolf.is_hunted_by(&deer));
    }

    #[test]
    fn test_aging() {
        let wolf = organism(SpeciesKind::Wolf, 0);
        assert!(!wolf.is_past_lifespan(6 * TICKS_PER_YEAR));
        assert!(wolf.is_past_lifespan(6 * TICKS_PER_YEAR + 1));
    }

    #[test]
    fn test_health_decay() {
        let mut plant = organism(SpeciesKind::Plant, 0);
        plant.decay_health();
        assert!(plant.health < 10.0);
        plant.restore_health();
        assert_eq!(plant.health, 10.0);
    }
}

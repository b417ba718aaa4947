//! Per-tick organism behaviour.
//!
//! Species differ only in data except for plants, which are inert: they are eaten but
//! never age, move or breed. Animals recompute their status, lose a little health, may
//! die of starvation or old age, and then take at most one of these actions, in order:
//! flee a predator within reach, sleep, look for water, or hunt.

use crate::calendar::Calendar;
use crate::organism::{Organism, Status};
use crate::world::World;
use eco_core::{
    sign, BehaviorConfig, BreedingConfig, CoverKind, DeprivationPolicy, IdAllocator, OrganismId,
    RandomSource, SpeciesKind, TileCoord, WorldPos,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Everything an organism may read about the tick it is updated in
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub calendar: Calendar,
    pub behavior: &'a BehaviorConfig,
    pub breeding: &'a BreedingConfig,
}

impl TickContext<'_> {
    pub fn now(&self) -> u64 {
        self.calendar.tick
    }
}

/// Advance one organism by one tick. Dead organisms are left untouched.
pub fn update(
    world: &mut World,
    id: OrganismId,
    ctx: &TickContext<'_>,
    random: &mut dyn RandomSource,
    ids: &mut IdAllocator,
) {
    let Some(organism) = world.organism(id) else {
        return;
    };
    if !organism.is_alive() {
        return;
    }

    match organism.kind() {
        SpeciesKind::Plant => {}
        SpeciesKind::Deer | SpeciesKind::Wolf => update_animal(world, id, ctx, random, ids),
    }
}

fn update_animal(
    world: &mut World,
    id: OrganismId,
    ctx: &TickContext<'_>,
    random: &mut dyn RandomSource,
    ids: &mut IdAllocator,
) {
    let behavior = ctx.behavior;
    let now = ctx.now();

    let Some(organism) = world.organism_mut(id) else {
        return;
    };
    organism.status = organism.next_status(&ctx.calendar, behavior);
    organism.decay_health();
    let status = organism.status;
    let starving = organism.health < 0.0;
    let elderly = organism.is_past_lifespan(now);

    if starving && random.chance(behavior.starvation_death_chance) {
        world.die(id);
        return;
    }
    if elderly && random.chance(behavior.old_age_death_chance) {
        world.die(id);
        return;
    }

    if ctx.breeding.enabled && status == Status::Alive {
        breed(world, id, now, ctx.breeding, random, ids);
    }

    let destination = match flee(world, id) {
        Some(escape) => Some(escape),
        None => match (status, behavior.deprivation) {
            (Status::Sleep, _) | (Status::Dead, _) => None,
            (Status::Thirsty, DeprivationPolicy::Idle)
            | (Status::Hungry, DeprivationPolicy::Idle) => None,
            (Status::Thirsty, DeprivationPolicy::Forage) => seek_water(world, id, now, behavior),
            (Status::Hungry, DeprivationPolicy::Forage) | (Status::Alive, _) => {
                hunt(world, id, now, behavior)
            }
        },
    };

    if let Some(destination) = destination {
        let moved = world.try_move(id, destination);
        trace!(organism_id = %id, moved, "Proposed move");
    }
}

/// One unit away from the nearest predator along each axis, if it is within reach.
fn flee(world: &World, id: OrganismId) -> Option<WorldPos> {
    let predators = world.nearby_predators(id);
    let me = world.organism(id)?;
    let nearest = world.organism(*predators.first()?)?;

    if me.distance_to(nearest) < me.speed {
        Some(WorldPos::new(
            me.position.x + sign(me.position.x - nearest.position.x),
            me.position.y + sign(me.position.y - nearest.position.y),
        ))
    } else {
        None
    }
}

/// Eat the nearest prey when standing on it, otherwise propose a step towards it.
fn hunt(world: &mut World, id: OrganismId, now: u64, behavior: &BehaviorConfig) -> Option<WorldPos> {
    let prey = world.nearby_prey(id);
    let target = *prey.first()?;

    let me = world.organism(id)?;
    let quarry = world.organism(target)?;
    if me.distance_to(quarry) == 0.0 {
        eat(world, id, target, now, behavior);
        return None;
    }

    let step = me.speed / behavior.prey_step_divisor;
    Some(WorldPos::new(
        me.position.x + sign(quarry.position.x - me.position.x) * step,
        me.position.y + sign(quarry.position.y - me.position.y) * step,
    ))
}

fn eat(world: &mut World, eater: OrganismId, target: OrganismId, now: u64, behavior: &BehaviorConfig) {
    let finished = match world.organism_mut(target) {
        Some(plant) if plant.kind() == SpeciesKind::Plant => {
            plant.size -= behavior.plant_bite;
            plant.size <= 0.0
        }
        Some(_) => true,
        None => false,
    };
    if finished {
        world.die(target);
    }

    if let Some(organism) = world.organism_mut(eater) {
        organism.restore_health();
        organism.last_food_tick = now;
        debug!(
            event = "feeding",
            organism_id = %eater,
            target = %target,
            killed = finished,
            "Organism fed"
        );
    }
}

/// Drink when next to water, otherwise step one unit towards the closest water in range.
fn seek_water(
    world: &mut World,
    id: OrganismId,
    now: u64,
    behavior: &BehaviorConfig,
) -> Option<WorldPos> {
    let (here, position) = {
        let me = world.organism(id)?;
        (me.tile?, me.position)
    };

    let grid = world.grid();
    let is_water = |coord: TileCoord| grid.cover_at(coord) == Some(CoverKind::Water);

    if is_water(here) || grid.neighbors(here).into_iter().any(is_water) {
        if let Some(me) = world.organism_mut(id) {
            me.last_drink_tick = now;
        }
        trace!(organism_id = %id, "Organism drank");
        return None;
    }

    let radius = behavior.water_search_radius;
    let mut closest: Option<(i32, TileCoord)> = None;
    for dj in -radius..=radius {
        for di in -radius..=radius {
            let coord = here.add(di, dj);
            if !is_water(coord) {
                continue;
            }
            let distance = here.chebyshev_distance(&coord);
            if closest.map_or(true, |(best, _)| distance < best) {
                closest = Some((distance, coord));
            }
        }
    }

    let (_, water) = closest?;
    let corner = grid.tile_to_world(water);
    let centre = WorldPos::new(
        corner.x + grid.cell_size / 2.0,
        corner.y + grid.cell_size / 2.0,
    );
    Some(WorldPos::new(
        position.x + sign(centre.x - position.x),
        position.y + sign(centre.y - position.y),
    ))
}

/// Roll for a single offspring once the breeding interval has passed. The newborn is
/// queued and only joins its tile and the active collection when births are committed.
fn breed(
    world: &mut World,
    id: OrganismId,
    now: u64,
    breeding: &BreedingConfig,
    random: &mut dyn RandomSource,
    ids: &mut IdAllocator,
) {
    let Some(parent) = world.organism(id) else {
        return;
    };
    if now.saturating_sub(parent.last_litter_tick) < breeding.interval_ticks {
        return;
    }
    if !random.chance(parent.species.fecundity) {
        return;
    }

    let species = Arc::clone(&parent.species);
    let position = parent.position;
    let child = Organism::spawn(ids.allocate(), species, position, now, random);

    if let Some(parent) = world.organism_mut(id) {
        parent.last_litter_tick = now;
    }
    debug!(
        event = "organism_birth",
        parent_id = %id,
        organism_id = %child.id,
        species = %child.kind(),
        "Offspring conceived"
    );
    world.pending.schedule_birth(child);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use eco_core::{EcosystemConfig, FixedSource, SequenceSource, TICKS_PER_HOUR};

    const NOON: u64 = 12 * TICKS_PER_HOUR;

    struct Fixture {
        world: World,
        config: EcosystemConfig,
        ids: IdAllocator,
    }

    impl Fixture {
        fn new(width: usize, height: usize) -> Self {
            let mut grid = Grid::new(width, height, 10.0);
            for tile in grid.iter_mut() {
                tile.cover = Some(CoverKind::Soil);
            }
            let mut config = EcosystemConfig::default();
            config.breeding.enabled = false;
            Self {
                world: World::new(grid),
                config,
                ids: IdAllocator::new(),
            }
        }

        fn set_cover(&mut self, i: i32, j: i32, cover: CoverKind) {
            if let Some(tile) = self.world.grid_mut().tile_at_mut(i, j) {
                tile.cover = Some(cover);
            }
        }

        fn add(&mut self, kind: SpeciesKind, x: f64, y: f64) -> OrganismId {
            let species = Arc::new(self.config.species_profile(kind).cloned().unwrap());
            let organism = Organism::spawn(
                self.ids.allocate(),
                species,
                WorldPos::new(x, y),
                NOON,
                &mut FixedSource(0.5),
            );
            self.world.place(organism).unwrap()
        }

        fn step(&mut self, id: OrganismId, tick: u64, random: &mut dyn RandomSource) {
            let ctx = TickContext {
                calendar: Calendar::at(tick),
                behavior: &self.config.behavior,
                breeding: &self.config.breeding,
            };
            update(&mut self.world, id, &ctx, random, &mut self.ids);
        }

        fn organism(&self, id: OrganismId) -> &Organism {
            self.world.organism(id).unwrap()
        }
    }

    #[test]
    fn test_plants_are_inert() {
        let mut fx = Fixture::new(3, 3);
        let plant = fx.add(SpeciesKind::Plant, 15.0, 15.0);
        fx.world.organism_mut(plant).unwrap().health = -1.0;

        fx.step(plant, NOON, &mut FixedSource(0.0));
        let organism = fx.organism(plant);
        assert_eq!(organism.health, -1.0);
        assert_eq!(organism.status, Status::Alive);
    }

    #[test]
    fn test_negative_health_dies_on_low_roll() {
        let mut fx = Fixture::new(3, 3);
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);
        fx.world.organism_mut(deer).unwrap().health = -1.0;

        fx.step(deer, NOON, &mut FixedSource(0.0));
        assert_eq!(fx.organism(deer).status, Status::Dead);
        assert_eq!(fx.world.pending().deaths(), &[deer]);
    }

    #[test]
    fn test_negative_health_survives_high_roll() {
        let mut fx = Fixture::new(3, 3);
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);
        fx.world.organism_mut(deer).unwrap().health = -1.0;

        fx.step(deer, NOON, &mut FixedSource(0.5));
        assert!(fx.organism(deer).is_alive());
    }

    #[test]
    fn test_old_age_death() {
        let mut fx = Fixture::new(3, 3);
        let wolf = fx.add(SpeciesKind::Wolf, 15.0, 15.0);
        let ancient = NOON + 7 * eco_core::TICKS_PER_YEAR;
        fx.world.organism_mut(wolf).unwrap().last_drink_tick = ancient;
        fx.world.organism_mut(wolf).unwrap().last_food_tick = ancient;

        fx.step(wolf, ancient, &mut FixedSource(0.005));
        assert_eq!(fx.organism(wolf).status, Status::Dead);
    }

    #[test]
    fn test_dead_organisms_do_nothing() {
        let mut fx = Fixture::new(3, 3);
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);
        fx.world.die(deer);
        let health = fx.organism(deer).health;

        fx.step(deer, NOON, &mut FixedSource(0.0));
        assert_eq!(fx.organism(deer).health, health);
        assert_eq!(fx.world.pending().deaths().len(), 1);
    }

    #[test]
    fn test_wolf_eats_colocated_deer() {
        let mut fx = Fixture::new(3, 3);
        let wolf = fx.add(SpeciesKind::Wolf, 15.0, 15.0);
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);
        fx.world.organism_mut(wolf).unwrap().health = 3.0;

        fx.step(wolf, NOON, &mut FixedSource(0.99));
        assert_eq!(fx.organism(deer).status, Status::Dead);
        assert_eq!(fx.organism(wolf).health, 15.0);
        assert_eq!(fx.organism(wolf).last_food_tick, NOON);
    }

    #[test]
    fn test_grazing_shrinks_plant() {
        let mut fx = Fixture::new(3, 3);
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);
        let plant = fx.add(SpeciesKind::Plant, 15.0, 15.0);
        let before = fx.organism(plant).size;

        fx.step(deer, NOON, &mut FixedSource(0.99));
        let after = fx.organism(plant).size;
        assert!(after < before);
        assert!(fx.organism(plant).is_alive());

        fx.world.organism_mut(plant).unwrap().size = fx.config.behavior.plant_bite / 2.0;
        fx.step(deer, NOON + 1, &mut FixedSource(0.99));
        assert_eq!(fx.organism(plant).status, Status::Dead);
    }

    #[test]
    fn test_step_towards_prey() {
        let mut fx = Fixture::new(3, 3);
        let deer = fx.add(SpeciesKind::Deer, 12.0, 12.0);
        fx.add(SpeciesKind::Plant, 18.0, 11.0);

        fx.step(deer, NOON, &mut FixedSource(0.99));
        // speed 10 / divisor 10
        assert_eq!(fx.organism(deer).position, WorldPos::new(13.0, 11.0));
    }

    #[test]
    fn test_flee_from_predator_in_range() {
        let mut fx = Fixture::new(3, 3);
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);
        fx.add(SpeciesKind::Wolf, 18.0, 11.0);
        fx.add(SpeciesKind::Plant, 19.0, 19.0);

        fx.step(deer, NOON, &mut FixedSource(0.99));
        assert_eq!(fx.organism(deer).position, WorldPos::new(14.0, 16.0));
    }

    #[test]
    fn test_flee_range_follows_current_speed() {
        let mut fx = Fixture::new(3, 3);
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);
        fx.add(SpeciesKind::Wolf, 18.0, 11.0);
        fx.world.organism_mut(deer).unwrap().speed = 4.0;

        // the wolf is 5 away: inside the species speed but beyond the deer's own
        fx.step(deer, NOON, &mut FixedSource(0.99));
        assert_eq!(fx.organism(deer).position, WorldPos::new(15.0, 15.0));
    }

    #[test]
    fn test_distant_predator_is_ignored() {
        let mut fx = Fixture::new(4, 3);
        let deer = fx.add(SpeciesKind::Deer, 12.0, 15.0);
        fx.add(SpeciesKind::Wolf, 29.0, 15.0);
        fx.add(SpeciesKind::Plant, 1.0, 15.0);

        fx.step(deer, NOON, &mut FixedSource(0.99));
        // the plant on the neighbouring tile draws the deer west
        assert_eq!(fx.organism(deer).position, WorldPos::new(11.0, 15.0));
    }

    #[test]
    fn test_sleeping_organisms_stay_put() {
        let mut fx = Fixture::new(3, 3);
        fx.config.behavior.night_start_hour = 21;
        fx.config.behavior.night_end_hour = 6;
        let deer = fx.add(SpeciesKind::Deer, 12.0, 12.0);
        fx.add(SpeciesKind::Plant, 18.0, 18.0);
        fx.world.organism_mut(deer).unwrap().last_drink_tick = 0;

        fx.step(deer, 23 * TICKS_PER_HOUR, &mut FixedSource(0.99));
        assert_eq!(fx.organism(deer).status, Status::Sleep);
        assert_eq!(fx.organism(deer).position, WorldPos::new(12.0, 12.0));
    }

    #[test]
    fn test_thirsty_idle_policy_stays_put() {
        let mut fx = Fixture::new(3, 3);
        fx.config.behavior.deprivation = DeprivationPolicy::Idle;
        let deer = fx.add(SpeciesKind::Deer, 12.0, 12.0);
        fx.add(SpeciesKind::Plant, 18.0, 18.0);

        let later = NOON + 2 * TICKS_PER_HOUR + 901;
        fx.step(deer, later, &mut FixedSource(0.99));
        assert_eq!(fx.organism(deer).status, Status::Thirsty);
        assert_eq!(fx.organism(deer).position, WorldPos::new(12.0, 12.0));
    }

    #[test]
    fn test_thirsty_next_to_water_drinks() {
        let mut fx = Fixture::new(3, 3);
        fx.set_cover(0, 1, CoverKind::Water);
        let deer = fx.add(SpeciesKind::Deer, 12.0, 12.0);

        let later = NOON + 1000;
        fx.step(deer, later, &mut FixedSource(0.99));
        assert_eq!(fx.organism(deer).status, Status::Thirsty);
        assert_eq!(fx.organism(deer).last_drink_tick, later);
        assert_eq!(fx.organism(deer).position, WorldPos::new(12.0, 12.0));
    }

    #[test]
    fn test_thirsty_walks_towards_water() {
        let mut fx = Fixture::new(5, 3);
        fx.set_cover(4, 1, CoverKind::Water);
        let deer = fx.add(SpeciesKind::Deer, 22.0, 15.0);
        fx.add(SpeciesKind::Plant, 12.0, 15.0);

        fx.step(deer, NOON + 1000, &mut FixedSource(0.99));
        assert_eq!(fx.organism(deer).position, WorldPos::new(23.0, 15.0));
        assert_eq!(fx.organism(deer).last_drink_tick, NOON);
    }

    #[test]
    fn test_hungry_wolf_hunts() {
        let mut fx = Fixture::new(3, 3);
        let wolf = fx.add(SpeciesKind::Wolf, 12.0, 12.0);
        fx.add(SpeciesKind::Deer, 18.0, 12.0);

        let later = NOON + 2 * eco_core::TICKS_PER_DAY + 1;
        fx.world.organism_mut(wolf).unwrap().last_drink_tick = later;
        fx.step(wolf, later, &mut FixedSource(0.99));
        assert_eq!(fx.organism(wolf).status, Status::Hungry);
        let position = fx.organism(wolf).position;
        assert!((position.x - 12.8).abs() < 1e-9);
        assert_eq!(position.y, 12.0);
    }

    #[test]
    fn test_breeding_queues_offspring() {
        let mut fx = Fixture::new(3, 3);
        fx.config.breeding.enabled = true;
        fx.config.breeding.interval_ticks = 10;
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);

        // fecundity roll passes, size roll, then every later roll is high
        let mut random = SequenceSource::new(vec![0.1, 0.5, 0.99, 0.99, 0.99]);
        fx.step(deer, NOON + 10, &mut random);

        let births = fx.world.pending().births();
        assert_eq!(births.len(), 1);
        assert_eq!(births[0].kind(), SpeciesKind::Deer);
        assert_eq!(births[0].position, WorldPos::new(15.0, 15.0));
        assert_eq!(births[0].tile, None);
        assert_eq!(fx.organism(deer).last_litter_tick, NOON + 10);
        assert_eq!(fx.world.grid().tile_at(1, 1).unwrap().occupants, vec![deer]);
    }

    #[test]
    fn test_breeding_waits_for_interval() {
        let mut fx = Fixture::new(3, 3);
        fx.config.breeding.enabled = true;
        fx.config.breeding.interval_ticks = 10;
        let deer = fx.add(SpeciesKind::Deer, 15.0, 15.0);

        fx.step(deer, NOON + 5, &mut FixedSource(0.0));
        assert!(fx.world.pending().births().is_empty());
    }
}

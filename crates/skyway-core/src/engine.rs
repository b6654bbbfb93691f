//! Simulation engine - main entry point for running the simulation

use std::io::{Read, Write};

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use skyway_logic::grid::{Scenery, SceneryKind, TileRegion};
use skyway_logic::pathfinding::DEFAULT_CACHE_CAPACITY;
use skyway_logic::stats::{validate_stats, AttackPosture};
use skyway_logic::{
    turn_rng, Actor, ActorBody, ActorCategory, ActorRef, BuildingInfo, BuildingRef, Grid,
    Mission, MissionEnv, MissionFailure, Pathfinder, StatsTable, TilePosition, WorldEvent,
    WorldSnapshot,
};

use crate::components::*;
use crate::persistence::{self, SaveError};

/// Construction parameters for a `SimulationEngine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Mixed with the tick and the actor handle to seed each actor's turn.
    pub seed: u64,
    /// Paths kept by the shared cache (0 disables caching).
    pub path_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            path_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// A world event stamped with the tick it fired on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub tick: u64,
    pub event: WorldEvent,
}

/// Everything needed to place a new actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSpawn {
    pub name: Name,
    pub category: ActorCategory,
    /// Ignored when `docked_in` is set; the actor starts at the dock.
    pub tile: TilePosition,
    pub speed: f32,
    pub docked_in: Option<BuildingRef>,
    pub home: Option<BuildingRef>,
    pub posture: AttackPosture,
    /// Newly hired or transferred; the first arrival is announced.
    pub first_arrival_pending: bool,
}

impl ActorSpawn {
    pub fn new(
        callsign: impl Into<String>,
        category: ActorCategory,
        tile: TilePosition,
        speed: f32,
    ) -> Self {
        Self {
            name: Name::new(callsign),
            category,
            tile,
            speed,
            docked_in: None,
            home: None,
            posture: AttackPosture::default(),
            first_arrival_pending: false,
        }
    }

    pub fn docked_in(mut self, building: BuildingRef) -> Self {
        self.docked_in = Some(building);
        self
    }

    pub fn with_home(mut self, building: BuildingRef) -> Self {
        self.home = Some(building);
        self
    }

    pub fn with_posture(mut self, posture: AttackPosture) -> Self {
        self.posture = posture;
        self
    }

    pub fn newly_hired(mut self) -> Self {
        self.first_arrival_pending = true;
        self
    }
}

/// Bad handle or coordinate passed to the engine API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    NoSuchActor(ActorRef),
    NoSuchBuilding(BuildingRef),
    OutOfBounds(TilePosition),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NoSuchActor(id) => write!(f, "no such actor: {:?}", id),
            EngineError::NoSuchBuilding(id) => write!(f, "no such building: {:?}", id),
            EngineError::OutOfBounds(tile) => write!(f, "tile {:?} is outside the grid", tile),
        }
    }
}

impl std::error::Error for EngineError {}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world containing all actors and buildings
    pub world: World,
    grid: Grid,
    stats: StatsTable,
    pathfinder: Pathfinder,
    config: EngineConfig,
    /// Ticks simulated so far
    tick: u64,
    /// Events not yet drained
    events: Vec<LoggedEvent>,
}

impl SimulationEngine {
    pub fn new(grid: Grid, stats: StatsTable, config: EngineConfig) -> Self {
        for problem in validate_stats(&stats) {
            log::warn!("stats table: {}", problem);
        }
        Self {
            world: World::new(),
            grid,
            stats,
            pathfinder: Pathfinder::with_capacity(config.path_cache_capacity),
            config,
            tick: 0,
            events: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn stats(&self) -> &StatsTable {
        &self.stats
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    /// Ticks simulated since the world was created.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn actor_count(&self) -> usize {
        self.world.query::<&Actor>().iter().count()
    }

    pub fn building_count(&self) -> usize {
        self.world.query::<&Building>().iter().count()
    }

    /// Live actor handles in update order.
    pub fn actor_refs(&self) -> Vec<ActorRef> {
        let mut ids: Vec<ActorRef> = self
            .world
            .query::<&Actor>()
            .iter()
            .map(|(entity, _)| actor_ref(entity))
            .collect();
        ids.sort();
        ids
    }

    pub fn actor(&self, id: ActorRef) -> Option<hecs::Ref<'_, Actor>> {
        let entity = self.resolve_actor(id).ok()?;
        self.world.get::<&Actor>(entity).ok()
    }

    pub fn name(&self, id: ActorRef) -> Option<String> {
        let entity = self.resolve_actor(id).ok()?;
        self.world
            .get::<&Name>(entity)
            .ok()
            .map(|name| name.display_name())
    }

    pub fn building(&self, id: BuildingRef) -> Option<BuildingInfo> {
        let entity = self.resolve_building(id).ok()?;
        self.world.get::<&Building>(entity).ok().map(|b| b.0.clone())
    }

    /// Reference view over every live building and actor.
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new();
        for (entity, building) in self.world.query::<&Building>().iter() {
            snapshot.insert_building(building_ref(entity), building.0.clone());
        }
        for (entity, (actor, disabled)) in self
            .world
            .query::<(&Actor, Option<&Disabled>)>()
            .iter()
        {
            let mut seen = actor.body.snapshot();
            seen.alive = disabled.is_none();
            snapshot.insert_actor(actor_ref(entity), seen);
        }
        snapshot
    }

    // ========================================================================
    // BUILDINGS
    // ========================================================================

    /// Place a building and stamp its landing pads into the grid.
    pub fn spawn_building(&mut self, info: BuildingInfo) -> BuildingRef {
        let entity = self.world.spawn((Building(info.clone()),));
        let id = building_ref(entity);

        let mut touched = None;
        for &pad in &info.pads {
            let scenery = Scenery::owned_by(SceneryKind::LandingPad, id);
            if !self.grid.set_scenery(pad, Some(scenery)) {
                log::warn!("{}: pad {:?} is outside the grid", info.name, pad);
                continue;
            }
            touched = Some(grow(touched, pad));
        }
        if let Some(region) = touched {
            self.pathfinder.invalidate(&region);
        }

        log::debug!("spawned building {} as {:?}", info.name, id);
        id
    }

    /// Remove a building, clear its pads and release anyone docked in it.
    /// Missions aimed at it finish on their next check.
    pub fn destroy_building(&mut self, id: BuildingRef) -> Result<(), EngineError> {
        let entity = self.resolve_building(id)?;

        let mut touched = None;
        for tile in self.grid.tiles_owned_by(id) {
            self.grid.set_scenery(tile, None);
            touched = Some(grow(touched, tile));
        }
        let dropped = touched.map_or(0, |region| self.pathfinder.invalidate(&region));

        let mut released = Vec::new();
        for (_, actor) in self.world.query_mut::<&mut Actor>() {
            if actor.body.docked_in == Some(id) {
                actor.body.docked_in = None;
                released.push((actor.body.tile(), actor.body.category));
            }
        }
        for &(tile, category) in &released {
            self.grid.add_occupant(tile, category);
        }

        self.world
            .despawn(entity)
            .map_err(|_| EngineError::NoSuchBuilding(id))?;
        log::debug!(
            "destroyed {:?}: {} actors released, {} cached paths dropped",
            id,
            released.len(),
            dropped
        );
        Ok(())
    }

    // ========================================================================
    // ACTORS
    // ========================================================================

    pub fn spawn_actor(&mut self, spawn: ActorSpawn) -> Result<ActorRef, EngineError> {
        let tile = match spawn.docked_in {
            Some(building) => {
                let entity = self.resolve_building(building)?;
                let info = self
                    .world
                    .get::<&Building>(entity)
                    .map_err(|_| EngineError::NoSuchBuilding(building))?;
                info.0.dock_tile(spawn.category)
            }
            None => spawn.tile,
        };
        if !self.grid.in_bounds(tile) {
            return Err(EngineError::OutOfBounds(tile));
        }
        if let Some(home) = spawn.home {
            self.resolve_building(home)?;
        }

        let entity = self.world.reserve_entity();
        let id = actor_ref(entity);
        let mut body = ActorBody::new(id, spawn.category, tile, spawn.speed);
        body.docked_in = spawn.docked_in;
        body.home = spawn.home;
        body.posture = spawn.posture;
        body.first_arrival_pending = spawn.first_arrival_pending;
        let occupied = body.occupied_tile();

        self.world
            .insert(entity, (Actor::new(body), spawn.name))
            .map_err(|_| EngineError::NoSuchActor(id))?;
        if let Some(cell) = occupied {
            self.grid.add_occupant(cell, spawn.category);
        }

        log::debug!("spawned {:?} {:?} at {:?}", spawn.category, id, tile);
        Ok(id)
    }

    /// Cancel and flush the actor's missions, then remove it.
    pub fn despawn_actor(&mut self, id: ActorRef) -> Result<(), EngineError> {
        let snapshot = self.snapshot();
        let (occupied, category) = self.drive(id, &snapshot, |actor, env| {
            actor.missions.cancel_all(MissionFailure::InvalidReference);
            actor.pop_finished_missions(env);
            (actor.body.occupied_tile(), actor.body.category)
        })?;
        if let Some(cell) = occupied {
            self.grid.remove_occupant(cell, category);
        }

        let entity = self.resolve_actor(id)?;
        self.world
            .despawn(entity)
            .map_err(|_| EngineError::NoSuchActor(id))?;
        log::debug!("despawned {:?}", id);
        Ok(())
    }

    /// Take an actor out of action. It stays where it is and other actors'
    /// pursuits of it finish.
    pub fn disable_actor(&mut self, id: ActorRef) -> Result<(), EngineError> {
        let entity = self.resolve_actor(id)?;
        self.world
            .insert_one(entity, Disabled)
            .map_err(|_| EngineError::NoSuchActor(id))?;
        log::debug!("disabled {:?}", id);
        Ok(())
    }

    pub fn add_mission(
        &mut self,
        id: ActorRef,
        mission: Mission,
        to_back: bool,
    ) -> Result<(), EngineError> {
        let snapshot = self.snapshot();
        self.drive(id, &snapshot, |actor, env| {
            actor.add_mission(mission, to_back, env)
        })
    }

    pub fn set_mission(&mut self, id: ActorRef, mission: Mission) -> Result<(), EngineError> {
        let snapshot = self.snapshot();
        self.drive(id, &snapshot, |actor, env| actor.set_mission(mission, env))
    }

    pub fn pop_finished_missions(&mut self, id: ActorRef) -> Result<(), EngineError> {
        let snapshot = self.snapshot();
        self.drive(id, &snapshot, |actor, env| actor.pop_finished_missions(env))
    }

    // ========================================================================
    // TERRAIN
    // ========================================================================

    /// Change one cell's scenery and drop cached paths near it.
    pub fn set_scenery(
        &mut self,
        tile: TilePosition,
        scenery: Option<Scenery>,
    ) -> Result<(), EngineError> {
        if !self.grid.set_scenery(tile, scenery) {
            return Err(EngineError::OutOfBounds(tile));
        }
        let dropped = self.pathfinder.invalidate(&TileRegion::around(tile, 1));
        log::debug!(
            "scenery at {:?} now {:?}; {} cached paths dropped",
            tile,
            scenery.map(|s| s.kind),
            dropped
        );
        Ok(())
    }

    /// Fill a region with one kind of scenery.
    pub fn fill_scenery(&mut self, region: TileRegion, scenery: Option<Scenery>) {
        self.grid.fill(region, scenery);
        let margin = TileRegion::new(region.min.offset(-1, -1, -1), region.max.offset(1, 1, 1));
        let dropped = self.pathfinder.invalidate(&margin);
        log::debug!("filled {:?}; {} cached paths dropped", region, dropped);
    }

    // ========================================================================
    // SIMULATION
    // ========================================================================

    /// Advance the simulation by `ticks`. Actors move in handle order, each
    /// seeing the positions earlier actors reached this step.
    pub fn update(&mut self, ticks: u32) {
        if ticks == 0 {
            return;
        }
        self.tick += u64::from(ticks);

        let mut snapshot = self.snapshot();
        let mut order: Vec<ActorRef> = self
            .world
            .query::<(&Actor, Option<&Disabled>)>()
            .iter()
            .filter(|(_, (_, disabled))| disabled.is_none())
            .map(|(entity, _)| actor_ref(entity))
            .collect();
        order.sort();

        for id in order {
            let stepped = self.drive(id, &snapshot, |actor, env| {
                actor.update(ticks, env);
                actor.body.snapshot()
            });
            match stepped {
                Ok(seen) => snapshot.insert_actor(id, seen),
                Err(err) => log::warn!("tick {}: {}", self.tick, err),
            }
        }
    }

    /// Take every event logged since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<LoggedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run `run` against one actor with a fresh mission environment, then
    /// sync the grid's occupancy index and log whatever fired.
    fn drive<R>(
        &mut self,
        id: ActorRef,
        snapshot: &WorldSnapshot,
        run: impl FnOnce(&mut Actor, &mut MissionEnv<'_>) -> R,
    ) -> Result<R, EngineError> {
        let entity = self.resolve_actor(id)?;
        let mut rng = turn_rng(self.config.seed, self.tick, id);
        let mut fired = Vec::new();

        let (result, category, before, after) = {
            let actor = self
                .world
                .query_one_mut::<&mut Actor>(entity)
                .map_err(|_| EngineError::NoSuchActor(id))?;
            let before = actor.body.occupied_tile();
            let mut env = MissionEnv {
                grid: &self.grid,
                pathfinder: &mut self.pathfinder,
                world: snapshot,
                stats: &self.stats,
                rng: &mut rng,
                events: &mut fired,
            };
            let result = run(actor, &mut env);
            (result, actor.body.category, before, actor.body.occupied_tile())
        };

        if before != after {
            if let Some(tile) = before {
                self.grid.remove_occupant(tile, category);
            }
            if let Some(tile) = after {
                self.grid.add_occupant(tile, category);
            }
        }

        let tick = self.tick;
        self.events
            .extend(fired.into_iter().map(|event| LoggedEvent { tick, event }));
        Ok(result)
    }

    fn resolve_actor(&self, id: ActorRef) -> Result<Entity, EngineError> {
        actor_entity(id)
            .filter(|&entity| self.world.get::<&Actor>(entity).is_ok())
            .ok_or(EngineError::NoSuchActor(id))
    }

    fn resolve_building(&self, id: BuildingRef) -> Result<Entity, EngineError> {
        building_entity(id)
            .filter(|&entity| self.world.get::<&Building>(entity).is_ok())
            .ok_or(EngineError::NoSuchBuilding(id))
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Save simulation state to a writer. The path cache is not saved.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_simulation(
            writer,
            &self.world,
            self.tick,
            self.config,
            &self.stats,
            &self.grid,
            &self.events,
        )?;
        log::info!("saved tick {} ({} actors)", self.tick, self.actor_count());
        Ok(())
    }

    /// Replace this engine's state with a saved one. Entities keep their
    /// saved handles, so references held by missions stay valid.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = persistence::load_simulation(reader)?;

        self.world = loaded.world;
        self.tick = loaded.tick;
        self.config = loaded.config;
        self.stats = loaded.stats;
        self.grid = loaded.grid;
        self.events = loaded.pending_events;
        self.pathfinder = Pathfinder::with_capacity(self.config.path_cache_capacity);

        log::info!(
            "loaded tick {} ({} actors, {} buildings)",
            self.tick,
            self.actor_count(),
            self.building_count()
        );
        Ok(())
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(Grid::new(0, 0, 0), StatsTable::default(), EngineConfig::default())
    }
}

/// Bounding region of everything touched so far, plus a one-cell margin
/// for neighbours whose footing depends on the changed cell.
fn grow(region: Option<TileRegion>, tile: TilePosition) -> TileRegion {
    let around = TileRegion::around(tile, 1);
    match region {
        Some(region) => region.union(&around),
        None => around,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(x: i32, y: i32, z: i32) -> TilePosition {
        TilePosition::new(x, y, z)
    }

    fn corridor_engine() -> SimulationEngine {
        let mut grid = Grid::new(8, 3, 3);
        grid.fill(
            TileRegion::new(t(0, 0, 0), t(7, 2, 0)),
            Some(Scenery::new(SceneryKind::Road)),
        );
        SimulationEngine::new(grid, StatsTable::default(), EngineConfig::default())
    }

    #[test]
    fn test_engine_creation() {
        let engine = SimulationEngine::default();
        assert_eq!(engine.actor_count(), 0);
        assert_eq!(engine.building_count(), 0);
        assert_eq!(engine.tick(), 0);
    }

    #[test]
    fn test_spawn_actor_tracks_occupancy() {
        let mut engine = corridor_engine();
        let id = engine
            .spawn_actor(ActorSpawn::new("Wren", ActorCategory::GroundAgent, t(2, 1, 0), 1.0))
            .unwrap();
        assert_eq!(engine.grid().agents_at(t(2, 1, 0)), 1);
        assert_eq!(engine.name(id).as_deref(), Some("Wren"));
        assert_eq!(engine.actor(id).unwrap().body.id, id);

        engine.despawn_actor(id).unwrap();
        assert_eq!(engine.grid().agents_at(t(2, 1, 0)), 0);
        assert_eq!(engine.actor_count(), 0);
        assert_eq!(engine.despawn_actor(id), Err(EngineError::NoSuchActor(id)));
    }

    #[test]
    fn test_spawn_outside_grid_is_refused() {
        let mut engine = corridor_engine();
        let spawn = ActorSpawn::new("Stray", ActorCategory::GroundAgent, t(20, 0, 0), 1.0);
        assert_eq!(
            engine.spawn_actor(spawn),
            Err(EngineError::OutOfBounds(t(20, 0, 0)))
        );
        assert_eq!(engine.actor_count(), 0);
    }

    #[test]
    fn test_unknown_handles_are_reported() {
        let mut engine = corridor_engine();
        let ghost = ActorRef(u64::MAX);
        assert_eq!(
            engine.add_mission(ghost, Mission::snooze(1), false),
            Err(EngineError::NoSuchActor(ghost))
        );
        let nowhere = BuildingRef(u64::MAX);
        assert_eq!(
            engine.destroy_building(nowhere),
            Err(EngineError::NoSuchBuilding(nowhere))
        );
        assert_eq!(
            engine.set_scenery(t(-1, 0, 0), None),
            Err(EngineError::OutOfBounds(t(-1, 0, 0)))
        );
    }

    #[test]
    fn test_pads_stamped_and_cleared_with_building() {
        let mut grid = Grid::new(6, 3, 6);
        grid.fill(
            TileRegion::new(t(0, 0, 0), t(5, 2, 0)),
            Some(Scenery::new(SceneryKind::Road)),
        );
        let mut engine = SimulationEngine::new(grid, StatsTable::default(), EngineConfig::default());
        let port = engine.spawn_building(
            BuildingInfo::new("port", t(3, 1, 0)).with_pads(vec![t(3, 0, 1)]),
        );
        assert_eq!(
            engine.grid().scenery(t(3, 0, 1)),
            Some(&Scenery::owned_by(SceneryKind::LandingPad, port))
        );

        let vehicle = engine
            .spawn_actor(
                ActorSpawn::new("Gull", ActorCategory::FlyingVehicle, t(0, 0, 0), 1.0)
                    .docked_in(port),
            )
            .unwrap();
        assert_eq!(engine.actor(vehicle).unwrap().body.tile(), t(3, 0, 1));
        assert_eq!(engine.grid().vehicles_at(t(3, 0, 1)), 0);

        engine.destroy_building(port).unwrap();
        assert_eq!(engine.grid().scenery(t(3, 0, 1)), None);
        assert_eq!(engine.building(port), None);
        assert_eq!(engine.actor(vehicle).unwrap().body.docked_in, None);
        assert_eq!(engine.grid().vehicles_at(t(3, 0, 1)), 1);
    }

    #[test]
    fn test_scenery_change_invalidates_cached_paths() {
        let mut engine = corridor_engine();
        let id = engine
            .spawn_actor(ActorSpawn::new("Wren", ActorCategory::GroundAgent, t(0, 0, 0), 1.0))
            .unwrap();
        engine
            .add_mission(id, Mission::goto_location(t(7, 0, 0)), false)
            .unwrap();
        assert_eq!(engine.pathfinder().cache_size(), 1);
        let revision = engine.grid().revision();

        engine
            .set_scenery(t(4, 0, 0), Some(Scenery::new(SceneryKind::Wall)))
            .unwrap();
        assert_eq!(engine.pathfinder().cache_size(), 0);
        assert_eq!(engine.grid().revision(), revision + 1);
    }

    #[test]
    fn test_events_stamped_with_firing_tick() {
        let mut engine = corridor_engine();
        let tower = engine.spawn_building(BuildingInfo::new("tower", t(5, 0, 0)));
        let id = engine
            .spawn_actor(
                ActorSpawn::new("Wren", ActorCategory::GroundAgent, t(0, 0, 0), 1.0).newly_hired(),
            )
            .unwrap();
        engine
            .add_mission(id, Mission::goto_building(tower, false), false)
            .unwrap();

        engine.update(4);
        assert!(engine.drain_events().is_empty());
        engine.update(1);
        assert_eq!(
            engine.drain_events(),
            vec![
                LoggedEvent {
                    tick: 5,
                    event: WorldEvent::Arrived {
                        actor: id,
                        building: tower
                    }
                },
                LoggedEvent {
                    tick: 5,
                    event: WorldEvent::FirstArrival {
                        actor: id,
                        building: tower
                    }
                },
            ]
        );
        assert!(engine.drain_events().is_empty());
        assert_eq!(engine.grid().agents_at(t(5, 0, 0)), 0);
    }

    #[test]
    fn test_zero_tick_update_is_a_no_op() {
        let mut engine = corridor_engine();
        let id = engine
            .spawn_actor(ActorSpawn::new("Wren", ActorCategory::GroundAgent, t(0, 0, 0), 1.0))
            .unwrap();
        engine
            .add_mission(id, Mission::goto_location(t(7, 0, 0)), false)
            .unwrap();
        engine.update(0);
        assert_eq!(engine.tick(), 0);
        assert_eq!(engine.actor(id).unwrap().body.position, t(0, 0, 0).center());
    }

    #[test]
    fn test_disabled_target_ends_pursuit() {
        let mut engine = corridor_engine();
        let hunter = engine
            .spawn_actor(ActorSpawn::new("Hawk", ActorCategory::GroundAgent, t(0, 0, 0), 1.0))
            .unwrap();
        let quarry = engine
            .spawn_actor(ActorSpawn::new("Hare", ActorCategory::GroundAgent, t(7, 2, 0), 0.0))
            .unwrap();
        engine
            .add_mission(hunter, Mission::follow_target(quarry), false)
            .unwrap();
        engine.update(2);
        assert_eq!(engine.actor(hunter).unwrap().missions.len(), 1);

        engine.disable_actor(quarry).unwrap();
        engine.update(10);
        assert!(engine.actor(hunter).unwrap().missions.is_empty());
        assert!(engine.drain_events().iter().any(|logged| matches!(
            logged.event,
            WorldEvent::TargetLost { actor, target } if actor == hunter && target == quarry
        )));
    }
}

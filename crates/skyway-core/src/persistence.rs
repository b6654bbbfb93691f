//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for a compact binary snapshot of the whole simulation.
//! Entities are written with their generational handles and respawned at
//! exactly those handles on load, so `ActorRef`/`BuildingRef` values held
//! inside missions resolve to the same entities afterwards.

use std::collections::HashSet;
use std::io::{Read, Write};

use hecs::{Entity, EntityBuilder, World};
use serde::{Deserialize, Serialize};
use skyway_logic::{Actor, Grid, StatsTable};

use crate::components::*;
use crate::engine::{EngineConfig, LoggedEvent};

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub tick: u64,
    pub config: EngineConfig,
    pub stats: StatsTable,
    /// Scenery and occupancy counts
    pub grid: Grid,
    pub buildings: Vec<SavedBuilding>,
    pub actors: Vec<SavedActor>,
    /// Events logged but not yet drained
    pub pending_events: Vec<LoggedEvent>,
}

#[derive(Serialize, Deserialize)]
pub struct SavedBuilding {
    /// `Entity::to_bits` of the building
    pub handle: u64,
    pub building: Building,
}

#[derive(Serialize, Deserialize)]
pub struct SavedActor {
    /// `Entity::to_bits` of the actor
    pub handle: u64,
    pub name: Option<Name>,
    pub actor: Actor,
    pub disabled: bool,
}

/// Extract buildings and actors, each list in handle order.
fn serialize_entities(world: &World) -> (Vec<SavedBuilding>, Vec<SavedActor>) {
    let mut buildings: Vec<SavedBuilding> = world
        .query::<&Building>()
        .iter()
        .map(|(entity, building)| SavedBuilding {
            handle: entity.to_bits().get(),
            building: building.clone(),
        })
        .collect();
    buildings.sort_by_key(|b| b.handle);

    let mut actors: Vec<SavedActor> = world
        .query::<(&Actor, Option<&Name>, Option<&Disabled>)>()
        .iter()
        .map(|(entity, (actor, name, disabled))| SavedActor {
            handle: entity.to_bits().get(),
            name: name.cloned(),
            actor: actor.clone(),
            disabled: disabled.is_some(),
        })
        .collect();
    actors.sort_by_key(|a| a.handle);

    (buildings, actors)
}

/// Handle for a saved entity, refusing bit patterns hecs never issues and
/// slots already taken by an earlier entry.
fn claim(handle: u64, taken: &mut HashSet<u32>) -> Result<Entity, SaveError> {
    let entity = Entity::from_bits(handle).ok_or(SaveError::EntityCollision(handle))?;
    if !taken.insert(entity.id()) {
        return Err(SaveError::EntityCollision(handle));
    }
    Ok(entity)
}

/// Rebuild a world from saved entities at their original handles
fn deserialize_entities(
    world: &mut World,
    buildings: Vec<SavedBuilding>,
    actors: Vec<SavedActor>,
) -> Result<(), SaveError> {
    let mut taken = HashSet::new();

    for saved in buildings {
        let entity = claim(saved.handle, &mut taken)?;
        world.spawn_at(entity, (saved.building,));
    }

    for saved in actors {
        let entity = claim(saved.handle, &mut taken)?;
        if saved.actor.body.id.0 != saved.handle {
            return Err(SaveError::EntityCollision(saved.handle));
        }
        let mut builder = EntityBuilder::new();
        builder.add(saved.actor);
        if let Some(name) = saved.name {
            builder.add(name);
        }
        if saved.disabled {
            builder.add(Disabled);
        }
        world.spawn_at(entity, builder.build());
    }

    Ok(())
}

/// Save the complete simulation to a writer
pub fn save_simulation<W: Write>(
    writer: W,
    world: &World,
    tick: u64,
    config: EngineConfig,
    stats: &StatsTable,
    grid: &Grid,
    pending_events: &[LoggedEvent],
) -> Result<(), SaveError> {
    let (buildings, actors) = serialize_entities(world);

    let save_data = SaveData {
        version: SAVE_VERSION,
        tick,
        config,
        stats: stats.clone(),
        grid: grid.clone(),
        buildings,
        actors,
        pending_events: pending_events.to_vec(),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a simulation from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<LoadedSimulation, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    deserialize_entities(&mut world, save_data.buildings, save_data.actors)?;

    Ok(LoadedSimulation {
        world,
        tick: save_data.tick,
        config: save_data.config,
        stats: save_data.stats,
        grid: save_data.grid,
        pending_events: save_data.pending_events,
    })
}

/// Result of loading a simulation
pub struct LoadedSimulation {
    pub world: World,
    pub tick: u64,
    pub config: EngineConfig,
    pub stats: StatsTable,
    pub grid: Grid,
    pub pending_events: Vec<LoggedEvent>,
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
    /// Saved handle is malformed or reuses another entity's slot.
    EntityCollision(u64),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SaveError::EntityCollision(handle) => {
                write!(f, "Saved entity handle {:#x} collides or is invalid", handle)
            }
        }
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ActorSpawn, SimulationEngine};
    use skyway_logic::grid::{Scenery, SceneryKind, TileRegion};
    use skyway_logic::{ActorCategory, Mission, TilePosition};

    fn t(x: i32, y: i32, z: i32) -> TilePosition {
        TilePosition::new(x, y, z)
    }

    fn populated() -> SimulationEngine {
        let mut grid = Grid::new(8, 3, 1);
        grid.fill(
            TileRegion::new(t(0, 0, 0), t(7, 2, 0)),
            Some(Scenery::new(SceneryKind::Road)),
        );
        let mut engine = SimulationEngine::new(grid, StatsTable::default(), EngineConfig::default());
        let a = engine
            .spawn_actor(ActorSpawn::new("Wren", ActorCategory::GroundAgent, t(0, 0, 0), 0.5))
            .unwrap();
        let b = engine
            .spawn_actor(ActorSpawn::new("Finch", ActorCategory::GroundAgent, t(0, 2, 0), 0.5))
            .unwrap();
        engine
            .add_mission(a, Mission::goto_location(t(7, 0, 0)), false)
            .unwrap();
        engine.add_mission(b, Mission::follow_target(a), false).unwrap();
        engine
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut engine = populated();
        engine.update(3);

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");

        let mut loaded = SimulationEngine::default();
        loaded.load(&save_buffer[..]).expect("Load failed");

        assert_eq!(loaded.tick(), 3);
        assert_eq!(loaded.actor_refs(), engine.actor_refs());
        for id in engine.actor_refs() {
            let original = engine.actor(id).unwrap();
            let restored = loaded.actor(id).unwrap();
            assert_eq!(restored.body, original.body);
            assert_eq!(restored.missions, original.missions);
            assert_eq!(loaded.name(id), engine.name(id));
        }
        assert_eq!(loaded.pathfinder().cache_size(), 0);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let engine = populated();
        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).unwrap();

        let mut data: SaveData = bincode::deserialize(&save_buffer).unwrap();
        data.version = SAVE_VERSION + 1;
        let tampered = bincode::serialize(&data).unwrap();

        let err = SimulationEngine::default().load(&tampered[..]).unwrap_err();
        assert!(matches!(
            err,
            SaveError::VersionMismatch { expected: SAVE_VERSION, .. }
        ));
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let engine = populated();
        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).unwrap();

        let mut data: SaveData = bincode::deserialize(&save_buffer).unwrap();
        let first = &data.actors[0];
        let copy = SavedActor {
            handle: first.handle,
            name: first.name.clone(),
            actor: first.actor.clone(),
            disabled: false,
        };
        data.actors.push(copy);
        let tampered = bincode::serialize(&data).unwrap();

        let err = SimulationEngine::default().load(&tampered[..]).unwrap_err();
        assert!(matches!(err, SaveError::EntityCollision(_)));
    }

    #[test]
    fn test_truncated_save_is_a_bincode_error() {
        let engine = populated();
        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).unwrap();
        save_buffer.truncate(save_buffer.len() / 2);

        let err = SimulationEngine::default().load(&save_buffer[..]).unwrap_err();
        assert!(matches!(err, SaveError::Bincode(_)));
    }
}

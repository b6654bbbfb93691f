//! Cross-entity references and the read-only view missions resolve them through.
//!
//! Buildings and actors are never referenced directly. Missions hold opaque
//! handles (`BuildingRef`, `ActorRef`) and look them up through a
//! `WorldView` on every check, so a target that disappeared simply resolves
//! to `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::{TilePosition, WorldPosition};

/// Opaque handle to an actor. The engine backs it with a generational index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorRef(pub u64);

/// Opaque handle to a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingRef(pub u64);

/// Actor category; selects the traversal policy and the stats row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActorCategory {
    /// Field agent on foot; walks on scenery, climbs through junctions.
    GroundAgent,
    /// Vehicle that flies between pads within an altitude band.
    FlyingVehicle,
}

impl ActorCategory {
    pub fn is_flying(self) -> bool {
        matches!(self, Self::FlyingVehicle)
    }
}

/// What the engine knows about a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingInfo {
    pub name: String,
    /// Ground-level entrance agents walk to.
    pub entry: TilePosition,
    /// Landing pads vehicles dock at.
    pub pads: Vec<TilePosition>,
}

impl BuildingInfo {
    pub fn new(name: impl Into<String>, entry: TilePosition) -> Self {
        Self {
            name: name.into(),
            entry,
            pads: Vec::new(),
        }
    }

    pub fn with_pads(mut self, pads: Vec<TilePosition>) -> Self {
        self.pads = pads;
        self
    }

    pub fn has_pad(&self, tile: TilePosition) -> bool {
        self.pads.contains(&tile)
    }

    /// Pad closest to `from`, ties broken by pad order.
    pub fn nearest_pad(&self, from: TilePosition) -> Option<TilePosition> {
        self.pads
            .iter()
            .copied()
            .min_by_key(|pad| pad.manhattan(from))
    }

    /// Cell an actor of this category occupies while docked here.
    pub fn dock_tile(&self, category: ActorCategory) -> TilePosition {
        match category {
            ActorCategory::GroundAgent => self.entry,
            ActorCategory::FlyingVehicle => self.pads.first().copied().unwrap_or(self.entry),
        }
    }
}

/// Point-in-time facts about an actor, as seen by other actors' missions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub position: WorldPosition,
    pub category: ActorCategory,
    pub alive: bool,
    pub docked_in: Option<BuildingRef>,
}

impl ActorSnapshot {
    pub fn tile(&self) -> TilePosition {
        self.position.tile()
    }
}

/// Reference resolution consumed by missions.
pub trait WorldView {
    fn building(&self, id: BuildingRef) -> Option<&BuildingInfo>;

    fn actor(&self, id: ActorRef) -> Option<ActorSnapshot>;

    /// Every live building, in ascending handle order.
    fn building_refs(&self) -> Vec<BuildingRef>;
}

/// Closest building by entry distance, ties broken by handle order.
pub fn nearest_building(
    view: &dyn WorldView,
    from: TilePosition,
    exclude: Option<BuildingRef>,
) -> Option<BuildingRef> {
    view.building_refs()
        .into_iter()
        .filter(|b| Some(*b) != exclude)
        .filter_map(|b| view.building(b).map(|info| (info.entry.manhattan(from), b)))
        .min()
        .map(|(_, b)| b)
}

/// Ordered in-memory `WorldView`. The engine rebuilds one per tick; tests
/// build them by hand.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    buildings: BTreeMap<BuildingRef, BuildingInfo>,
    actors: BTreeMap<ActorRef, ActorSnapshot>,
}

impl WorldSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_building(&mut self, id: BuildingRef, info: BuildingInfo) {
        self.buildings.insert(id, info);
    }

    pub fn remove_building(&mut self, id: BuildingRef) -> Option<BuildingInfo> {
        self.buildings.remove(&id)
    }

    pub fn insert_actor(&mut self, id: ActorRef, snapshot: ActorSnapshot) {
        self.actors.insert(id, snapshot);
    }

    pub fn remove_actor(&mut self, id: ActorRef) -> Option<ActorSnapshot> {
        self.actors.remove(&id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }
}

impl WorldView for WorldSnapshot {
    fn building(&self, id: BuildingRef) -> Option<&BuildingInfo> {
        self.buildings.get(&id)
    }

    fn actor(&self, id: ActorRef) -> Option<ActorSnapshot> {
        self.actors.get(&id).copied()
    }

    fn building_refs(&self) -> Vec<BuildingRef> {
        self.buildings.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_building_excludes_and_breaks_ties_by_handle() {
        let mut world = WorldSnapshot::new();
        world.insert_building(BuildingRef(2), BuildingInfo::new("east", TilePosition::new(3, 0, 0)));
        world.insert_building(BuildingRef(1), BuildingInfo::new("west", TilePosition::new(-3, 0, 0)));
        world.insert_building(BuildingRef(5), BuildingInfo::new("far", TilePosition::new(9, 0, 0)));
        let origin = TilePosition::new(0, 0, 0);
        assert_eq!(nearest_building(&world, origin, None), Some(BuildingRef(1)));
        assert_eq!(
            nearest_building(&world, origin, Some(BuildingRef(1))),
            Some(BuildingRef(2))
        );
    }

    #[test]
    fn test_missing_references_resolve_to_none() {
        let world = WorldSnapshot::new();
        assert!(world.building(BuildingRef(1)).is_none());
        assert!(world.actor(ActorRef(1)).is_none());
        assert_eq!(nearest_building(&world, TilePosition::default(), None), None);
    }

    #[test]
    fn test_dock_tile_by_category() {
        let info = BuildingInfo::new("hq", TilePosition::new(1, 1, 0))
            .with_pads(vec![TilePosition::new(2, 2, 3)]);
        assert_eq!(info.dock_tile(ActorCategory::GroundAgent), TilePosition::new(1, 1, 0));
        assert_eq!(info.dock_tile(ActorCategory::FlyingVehicle), TilePosition::new(2, 2, 3));
        assert!(info.has_pad(TilePosition::new(2, 2, 3)));
    }
}

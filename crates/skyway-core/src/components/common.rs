//! Components shared by actors and buildings, and the mapping between
//! hecs entities and the opaque handles missions hold.

use hecs::Entity;
use serde::{Deserialize, Serialize};
use skyway_logic::{ActorRef, BuildingInfo, BuildingRef};

/// Display name for an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub callsign: String,
    pub faction: Option<String>,
}

impl Name {
    pub fn new(callsign: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            faction: None,
        }
    }

    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.faction = Some(faction.into());
        self
    }

    pub fn display_name(&self) -> String {
        match &self.faction {
            Some(faction) => format!("{} [{}]", self.callsign, faction),
            None => self.callsign.clone(),
        }
    }
}

/// A building placed in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building(pub BuildingInfo);

/// Marks an actor that is out of action. It keeps its cell but no longer
/// updates, and resolves as not alive for other actors' missions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disabled;

// ============================================================================
// HANDLES
// ============================================================================

pub fn actor_ref(entity: Entity) -> ActorRef {
    ActorRef(entity.to_bits().get())
}

pub fn building_ref(entity: Entity) -> BuildingRef {
    BuildingRef(entity.to_bits().get())
}

/// Entity behind a handle. `None` for bit patterns hecs never hands out.
pub fn actor_entity(id: ActorRef) -> Option<Entity> {
    Entity::from_bits(id.0)
}

pub fn building_entity(id: BuildingRef) -> Option<Entity> {
    Entity::from_bits(id.0)
}

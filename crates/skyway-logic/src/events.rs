//! Notifications emitted to the surrounding game-event bus.
//!
//! Fire-and-forget: missions push them into the tick's outbox and never
//! wait for acknowledgement.

use serde::{Deserialize, Serialize};

use crate::error::MissionFailure;
use crate::grid::TilePosition;
use crate::world::{ActorRef, BuildingRef};

/// What an order was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Tile(TilePosition),
    Building(BuildingRef),
    Actor(ActorRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Actor docked at the building it was sent to.
    Arrived { actor: ActorRef, building: BuildingRef },
    /// First arrival after being hired or transferred. Fires once.
    FirstArrival { actor: ActorRef, building: BuildingRef },
    Investigated { actor: ActorRef, building: BuildingRef },
    InfiltrationStarted { actor: ActorRef, building: BuildingRef },
    Departed { actor: ActorRef, building: BuildingRef },
    Landed { actor: ActorRef, building: BuildingRef },
    Teleported { actor: ActorRef, building: BuildingRef },
    UnableToReach {
        actor: ActorRef,
        target: Target,
        reason: MissionFailure,
    },
    TargetLost { actor: ActorRef, target: ActorRef },
    PickupTimedOut { actor: ActorRef, building: BuildingRef },
    Crashed { actor: ActorRef, tile: TilePosition },
}

impl WorldEvent {
    /// Actor the event is about.
    pub fn actor(&self) -> ActorRef {
        match self {
            WorldEvent::Arrived { actor, .. }
            | WorldEvent::FirstArrival { actor, .. }
            | WorldEvent::Investigated { actor, .. }
            | WorldEvent::InfiltrationStarted { actor, .. }
            | WorldEvent::Departed { actor, .. }
            | WorldEvent::Landed { actor, .. }
            | WorldEvent::Teleported { actor, .. }
            | WorldEvent::UnableToReach { actor, .. }
            | WorldEvent::TargetLost { actor, .. }
            | WorldEvent::PickupTimedOut { actor, .. }
            | WorldEvent::Crashed { actor, .. } => *actor,
        }
    }

    /// Whether the event reports a failed order.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            WorldEvent::UnableToReach { .. }
                | WorldEvent::TargetLost { .. }
                | WorldEvent::PickupTimedOut { .. }
        )
    }
}

use serde::{Deserialize, Serialize};

use super::{Plan, Transition};
use crate::actor::{ActorBody, MissionEnv};
use crate::error::MissionFailure;
use crate::events::WorldEvent;
use crate::world::{BuildingRef, WorldView};

/// Wait inside a building for transport after hailing it.
///
/// Ends when the actor is no longer docked there (picked up), the building
/// disappears, or the hail runs out after `hail` ticks, in which case the
/// actor makes its own way. If `max_wait` comes first the wait is cancelled
/// with a timeout so the queue moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwaitPickup {
    pub building: BuildingRef,
    pub waited: u32,
    pub hail: u32,
    pub max_wait: u32,
}

impl AwaitPickup {
    pub fn new(building: BuildingRef, hail: u32, max_wait: u32) -> Self {
        Self {
            building,
            waited: 0,
            hail,
            max_wait,
        }
    }

    fn hail_over(&self) -> bool {
        self.hail < self.max_wait && self.waited >= self.hail
    }

    pub(super) fn start(
        &mut self,
        plan: &mut Plan,
        _actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if env.world.building(self.building).is_none() {
            plan.cancel(MissionFailure::InvalidReference);
        }
        Transition::Continue
    }

    pub(super) fn update(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
        ticks: u32,
    ) {
        self.waited = self.waited.saturating_add(ticks);
        if self.hail_over() || self.waited < self.max_wait {
            return;
        }
        log::warn!(
            "{:?} gave up waiting for pickup at {:?} after {} ticks",
            actor.id,
            self.building,
            self.waited
        );
        plan.cancel(MissionFailure::Timeout);
        env.emit(WorldEvent::PickupTimedOut {
            actor: actor.id,
            building: self.building,
        });
    }

    pub(super) fn is_finished(&self, actor: &ActorBody, world: &dyn WorldView) -> bool {
        self.hail_over()
            || world.building(self.building).is_none()
            || actor.docked_in != Some(self.building)
    }
}

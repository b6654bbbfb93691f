//! Vehicle transitions between pads and the air.

use serde::{Deserialize, Serialize};

use super::{depart, follow_path, give_up, walk, Destination, Plan, Step, Transition};
use crate::actor::{ActorBody, MissionEnv};
use crate::error::MissionFailure;
use crate::events::{Target, WorldEvent};
use crate::pathfinding::Path;
use crate::world::{BuildingRef, WorldView};

// ============================================================================
// TAKE OFF
// ============================================================================

/// Leave the current building. Vehicles climb to the hover cell above the
/// pad they were docked on; agents just step out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeOff {
    pub from: Option<BuildingRef>,
    pub lifted: bool,
}

impl TakeOff {
    pub(super) fn start(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if self.lifted || plan.path.is_some() {
            return Transition::Continue;
        }
        if self.from.is_none() {
            self.from = actor.docked_in;
        }
        let Some(building) = self.from else {
            // Already airborne.
            self.lifted = true;
            return Transition::Continue;
        };
        if !actor.category.is_flying() {
            depart(actor, env);
            self.lifted = true;
            return Transition::Continue;
        }

        let world = env.world;
        let Some(info) = world.building(building) else {
            plan.cancel(MissionFailure::InvalidReference);
            return Transition::Continue;
        };
        let here = actor.tile();
        let pad = if info.has_pad(here) {
            here
        } else if info.has_pad(here.below()) {
            here.below()
        } else {
            log::warn!("{:?} cannot take off away from the pads of {:?}", actor.id, building);
            plan.cancel(MissionFailure::IllegalMove);
            return Transition::Continue;
        };

        depart(actor, env);
        let hover = pad.above();
        if here == hover {
            self.lifted = true;
            return Transition::Continue;
        }
        match env.find_path(actor, hover) {
            Some(path) => plan.path = Some(path),
            None => give_up(
                plan,
                actor,
                env,
                Target::Tile(hover),
                MissionFailure::PlanningFailure,
            ),
        }
        Transition::Continue
    }

    pub(super) fn next_destination(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Destination {
        if let Some(next) = walk(plan, actor, env) {
            return next;
        }
        if plan.consumed() {
            self.lifted = true;
        }
        Destination::Idle
    }
}

// ============================================================================
// LAND
// ============================================================================

/// Descend onto a pad of the target building and dock there. Only starts
/// from the pad itself, the hover cell above it, or a cell next to that
/// hover cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Land {
    pub target: BuildingRef,
    pub landed: bool,
}

impl Land {
    pub fn new(target: BuildingRef) -> Self {
        Self {
            target,
            landed: false,
        }
    }

    pub(super) fn start(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if self.landed || plan.path.is_some() {
            return Transition::Continue;
        }
        if !actor.category.is_flying() {
            plan.cancel(MissionFailure::IllegalMove);
            return Transition::Continue;
        }
        let world = env.world;
        let Some(info) = world.building(self.target) else {
            plan.cancel(MissionFailure::InvalidReference);
            return Transition::Continue;
        };
        if actor.docked_in == Some(self.target) {
            self.landed = true;
            return Transition::Continue;
        }

        let here = actor.tile();
        let pad = info
            .pads
            .iter()
            .copied()
            .filter(|pad| {
                let hover = pad.above();
                here == *pad || here == hover || (here.z == hover.z && here.manhattan(hover) == 1)
            })
            .min_by_key(|pad| pad.manhattan(here));
        let Some(pad) = pad else {
            log::warn!("{:?} is not above a pad of {:?}", actor.id, self.target);
            give_up(
                plan,
                actor,
                env,
                Target::Building(self.target),
                MissionFailure::IllegalMove,
            );
            return Transition::Continue;
        };

        if here == pad {
            self.touch_down(actor, env);
            return Transition::Continue;
        }
        match env.find_path(actor, pad) {
            Some(path) => plan.path = Some(path),
            None => give_up(
                plan,
                actor,
                env,
                Target::Building(self.target),
                MissionFailure::PlanningFailure,
            ),
        }
        Transition::Continue
    }

    pub(super) fn next_destination(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Destination {
        if self.landed {
            return Destination::Idle;
        }
        if let Some(next) = walk(plan, actor, env) {
            return next;
        }
        if !plan.consumed() {
            return Destination::Idle;
        }
        let world = env.world;
        let on_pad = world
            .building(self.target)
            .is_some_and(|info| info.has_pad(actor.tile()));
        if on_pad {
            self.touch_down(actor, env);
        } else {
            plan.cancel(MissionFailure::IllegalMove);
        }
        Destination::Idle
    }

    pub(super) fn is_finished(&self, world: &dyn WorldView) -> bool {
        self.landed || world.building(self.target).is_none()
    }

    fn touch_down(&mut self, actor: &mut ActorBody, env: &mut MissionEnv<'_>) {
        actor.docked_in = Some(self.target);
        self.landed = true;
        env.emit(WorldEvent::Landed {
            actor: actor.id,
            building: self.target,
        });
    }
}

// ============================================================================
// CRASH
// ============================================================================

/// Fall straight down, ignoring traversal rules, until there is scenery
/// below or the ground level is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crash {
    pub crashed: bool,
}

impl Crash {
    pub(super) fn start(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if self.crashed || plan.path.is_some() {
            return Transition::Continue;
        }
        if !actor.category.is_flying() {
            plan.cancel(MissionFailure::IllegalMove);
            return Transition::Continue;
        }
        depart(actor, env);

        let mut at = actor.tile();
        let mut fall = vec![at];
        while at.z > 0 && env.grid.scenery(at.below()).is_none() {
            at = at.below();
            fall.push(at);
        }
        plan.path = Some(Path::new(fall));
        Transition::Continue
    }

    pub(super) fn next_destination(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Destination {
        if self.crashed {
            return Destination::Idle;
        }
        let Some(path) = plan.path.as_mut() else {
            return Destination::Idle;
        };
        match follow_path(path, actor, env, false) {
            Step::Toward(tile) => Destination::Forced(tile.center()),
            Step::Consumed | Step::Refused { .. } => {
                self.crashed = true;
                env.emit(WorldEvent::Crashed {
                    actor: actor.id,
                    tile: actor.tile(),
                });
                Destination::Idle
            }
        }
    }
}

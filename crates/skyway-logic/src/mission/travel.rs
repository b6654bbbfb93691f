//! Trips to a tile or a building, and instant relocation.

use serde::{Deserialize, Serialize};

use super::{depart, give_up, needs_take_off, walk, Destination, Mission, Plan, Transition, Visit};
use crate::actor::{ActorBody, MissionEnv};
use crate::error::MissionFailure;
use crate::events::{Target, WorldEvent};
use crate::grid::TilePosition;
use crate::world::{nearest_building, ActorCategory, BuildingInfo, BuildingRef, WorldView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GotoLocation {
    pub target: TilePosition,
}

impl GotoLocation {
    pub(super) fn start(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if plan.path.is_some() {
            return Transition::Continue;
        }
        if needs_take_off(actor) {
            return Transition::Push(Mission::take_off());
        }
        match env.find_path(actor, self.target) {
            Some(path) => {
                depart(actor, env);
                plan.path = Some(path);
            }
            None => give_up(
                plan,
                actor,
                env,
                Target::Tile(self.target),
                MissionFailure::PlanningFailure,
            ),
        }
        Transition::Continue
    }
}

// ============================================================================
// BUILDING TRIPS
// ============================================================================

/// Shared state of GotoBuilding, InvestigateBuilding and Infiltrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingTrip {
    pub target: BuildingRef,
    pub allow_alt_transport: bool,
    /// Pickup already requested on this trip.
    pub hailed: bool,
    /// Degraded re-route after another trip failed; never falls back again.
    pub fallback: bool,
    /// A landing was already attempted from the hover tile.
    pub landing: bool,
    pub arrived: bool,
}

impl BuildingTrip {
    pub fn new(target: BuildingRef, allow_alt_transport: bool) -> Self {
        Self {
            target,
            allow_alt_transport,
            hailed: false,
            fallback: false,
            landing: false,
            arrived: false,
        }
    }

    pub(super) fn start(
        &mut self,
        visit: Visit,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if self.arrived {
            return Transition::Continue;
        }
        let world = env.world;
        let Some(info) = world.building(self.target) else {
            give_up(
                plan,
                actor,
                env,
                Target::Building(self.target),
                MissionFailure::InvalidReference,
            );
            return Transition::Continue;
        };

        if actor.docked_in == Some(self.target)
            || (actor.docked_in.is_none() && at_building(info, actor))
        {
            self.arrive(visit, actor, env);
            return Transition::Continue;
        }

        if self.landing {
            // Came back from a Land prerequisite without docking.
            give_up(
                plan,
                actor,
                env,
                Target::Building(self.target),
                MissionFailure::PlanningFailure,
            );
            return Transition::Continue;
        }

        let table = env.stats;
        let stats = table.get(actor.category);
        if stats.teleport_ready(actor.teleport_charge) {
            return Transition::Push(Mission::teleport(self.target));
        }
        if let Some(current) = actor.docked_in {
            if actor.category.is_flying() {
                return Transition::Push(Mission::take_off());
            }
            if self.allow_alt_transport && !self.hailed {
                self.hailed = true;
                return Transition::Push(Mission::await_pickup(
                    current,
                    stats.pickup_hail_ticks,
                    stats.pickup_max_wait,
                ));
            }
        }

        let planned = approach_tile(info, actor.category, actor.tile())
            .and_then(|approach| env.find_path(actor, approach));
        match planned {
            Some(path) => {
                depart(actor, env);
                plan.path = Some(path);
                Transition::Continue
            }
            None => {
                give_up(
                    plan,
                    actor,
                    env,
                    Target::Building(self.target),
                    MissionFailure::PlanningFailure,
                );
                if self.fallback {
                    return Transition::Continue;
                }
                match nearest_building(world, actor.tile(), Some(self.target)) {
                    Some(alternative) => {
                        log::debug!(
                            "{:?} falling back to {:?} after failing to reach {:?}",
                            actor.id,
                            alternative,
                            self.target
                        );
                        Transition::Push(Mission::fallback_goto(alternative))
                    }
                    None => Transition::Continue,
                }
            }
        }
    }

    pub(super) fn next_destination(
        &mut self,
        visit: Visit,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Destination {
        if self.arrived {
            return Destination::Idle;
        }
        let world = env.world;
        let Some(info) = world.building(self.target) else {
            give_up(
                plan,
                actor,
                env,
                Target::Building(self.target),
                MissionFailure::InvalidReference,
            );
            return Destination::Idle;
        };
        if let Some(next) = walk(plan, actor, env) {
            return next;
        }
        if !plan.consumed() {
            return Destination::Idle;
        }

        if actor.category.is_flying() {
            self.landing = true;
            return Destination::Prerequisite(Mission::land(self.target));
        }
        if at_building(info, actor) {
            self.arrive(visit, actor, env);
            Destination::Idle
        } else {
            // Stale path ended somewhere else.
            plan.path = None;
            Destination::Prerequisite(Mission::restart_next())
        }
    }

    pub(super) fn is_finished(&self, world: &dyn WorldView) -> bool {
        self.arrived || world.building(self.target).is_none()
    }

    fn arrive(&mut self, visit: Visit, actor: &mut ActorBody, env: &mut MissionEnv<'_>) {
        actor.docked_in = Some(self.target);
        self.arrived = true;
        let (id, building) = (actor.id, self.target);
        env.emit(match visit {
            Visit::Goto => WorldEvent::Arrived { actor: id, building },
            Visit::Investigate => WorldEvent::Investigated { actor: id, building },
            Visit::Infiltrate => WorldEvent::InfiltrationStarted { actor: id, building },
        });
        if std::mem::take(&mut actor.first_arrival_pending) {
            env.emit(WorldEvent::FirstArrival { actor: id, building });
        }
    }
}

/// Standing where this category enters the building, undocked.
fn at_building(info: &BuildingInfo, actor: &ActorBody) -> bool {
    match actor.category {
        ActorCategory::GroundAgent => actor.tile() == info.entry,
        ActorCategory::FlyingVehicle => info.has_pad(actor.tile()),
    }
}

/// Tile a trip paths to: the entry on foot, the hover cell above the
/// nearest pad in the air.
fn approach_tile(
    info: &BuildingInfo,
    category: ActorCategory,
    from: TilePosition,
) -> Option<TilePosition> {
    match category {
        ActorCategory::GroundAgent => Some(info.entry),
        ActorCategory::FlyingVehicle => info.nearest_pad(from).map(TilePosition::above),
    }
}

// ============================================================================
// TELEPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teleport {
    pub target: BuildingRef,
    pub done: bool,
}

impl Teleport {
    pub fn new(target: BuildingRef) -> Self {
        Self {
            target,
            done: false,
        }
    }

    /// Relocate straight into the building and spend the accrued charge.
    pub(super) fn start(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if self.done {
            return Transition::Continue;
        }
        let world = env.world;
        let Some(info) = world.building(self.target) else {
            give_up(
                plan,
                actor,
                env,
                Target::Building(self.target),
                MissionFailure::InvalidReference,
            );
            return Transition::Continue;
        };
        actor.place_at(info.dock_tile(actor.category));
        actor.docked_in = Some(self.target);
        actor.teleport_charge = 0;
        self.done = true;
        env.emit(WorldEvent::Teleported {
            actor: actor.id,
            building: self.target,
        });
        Transition::Continue
    }

    pub(super) fn is_finished(&self, world: &dyn WorldView) -> bool {
        self.done || world.building(self.target).is_none()
    }
}

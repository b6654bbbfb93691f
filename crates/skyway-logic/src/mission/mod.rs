//! Per-actor task state machine.
//!
//! A `Mission` is a tagged variant over task kinds. Each lifecycle call is an
//! explicit `match` on the kind, invoked by the queue in this order:
//!
//! 1. `start`: when the mission becomes front (again). May return
//!    `Transition::Push` to run a prerequisite first; the mission is then
//!    dormant and `start`s again once the prerequisite is popped.
//! 2. `update`: once per tick while front; advances timers.
//! 3. `is_finished`: pure predicate.
//! 4. `next_destination`: asked by the movement executor whenever the actor
//!    reached its previous goal.
//!
//! A cancelled mission is inert: every call is a no-op, it never yields a
//! waypoint and always reports finished.

mod flight;
mod patrol;
mod pursuit;
mod travel;
mod waiting;

use serde::{Deserialize, Serialize};

pub use flight::{Crash, Land, TakeOff};
pub use patrol::Patrol;
pub use pursuit::Pursuit;
pub use travel::{BuildingTrip, GotoLocation, Teleport};
pub use waiting::AwaitPickup;

use crate::actor::{ActorBody, MissionEnv};
use crate::error::{Blocked, MissionFailure};
use crate::events::{Target, WorldEvent};
use crate::grid::{TilePosition, TileRegion, WorldPosition};
use crate::pathfinding::Path;
use crate::traversal::TraversalPolicy;
use crate::world::{ActorRef, BuildingRef, WorldView};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MissionKind {
    GotoLocation(GotoLocation),
    GotoBuilding(BuildingTrip),
    InvestigateBuilding(BuildingTrip),
    Infiltrate(BuildingTrip),
    AttackTarget(Pursuit),
    FollowTarget(Pursuit),
    Patrol(Patrol),
    TakeOff(TakeOff),
    Land(Land),
    Crash(Crash),
    Snooze { ticks_remaining: u32 },
    /// Control marker: finishes at once so the mission below restarts.
    RestartNext { done: bool },
    Teleport(Teleport),
    AwaitPickup(AwaitPickup),
}

/// State every mission carries regardless of kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// `None` until planned (or after the plan was discarded).
    pub path: Option<Path>,
    pub cancelled: bool,
    pub failure: Option<MissionFailure>,
}

impl Plan {
    pub fn cancel(&mut self, reason: MissionFailure) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.failure = Some(reason);
        self.path = None;
    }

    /// A path exists and every step of it has been handed out.
    pub fn consumed(&self) -> bool {
        self.path.as_ref().is_some_and(Path::is_empty)
    }
}

/// Result of `start`/`update`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Continue,
    /// Run this mission first; the current one defers until it is popped.
    Push(Mission),
}

/// Result of `next_destination`.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// Next goal; the leg is checked against the traversal policy.
    Waypoint(WorldPosition),
    /// Next goal that ignores traversal rules (falling).
    Forced(WorldPosition),
    /// Push this mission to the front and ask again.
    Prerequisite(Mission),
    /// Nothing to move toward; the actor stays put.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    kind: MissionKind,
    plan: Plan,
}

// ============================================================================
// FACTORIES
// ============================================================================

impl Mission {
    pub fn new(kind: MissionKind) -> Self {
        Self {
            kind,
            plan: Plan::default(),
        }
    }

    pub fn goto_location(target: TilePosition) -> Self {
        Self::new(MissionKind::GotoLocation(GotoLocation { target }))
    }

    pub fn goto_building(target: BuildingRef, allow_alt_transport: bool) -> Self {
        Self::new(MissionKind::GotoBuilding(BuildingTrip::new(
            target,
            allow_alt_transport,
        )))
    }

    /// Degraded re-route issued when a trip cannot be planned.
    pub(crate) fn fallback_goto(target: BuildingRef) -> Self {
        let mut trip = BuildingTrip::new(target, false);
        trip.fallback = true;
        Self::new(MissionKind::GotoBuilding(trip))
    }

    pub fn investigate_building(target: BuildingRef) -> Self {
        Self::new(MissionKind::InvestigateBuilding(BuildingTrip::new(
            target, false,
        )))
    }

    pub fn infiltrate(target: BuildingRef) -> Self {
        Self::new(MissionKind::Infiltrate(BuildingTrip::new(target, false)))
    }

    pub fn attack_target(target: ActorRef) -> Self {
        Self::new(MissionKind::AttackTarget(Pursuit::new(target)))
    }

    pub fn follow_target(target: ActorRef) -> Self {
        Self::new(MissionKind::FollowTarget(Pursuit::new(target)))
    }

    pub fn patrol(legs: u32) -> Self {
        Self::new(MissionKind::Patrol(Patrol::new(legs)))
    }

    pub fn take_off() -> Self {
        Self::new(MissionKind::TakeOff(TakeOff::default()))
    }

    pub fn land(target: BuildingRef) -> Self {
        Self::new(MissionKind::Land(Land::new(target)))
    }

    pub fn crash() -> Self {
        Self::new(MissionKind::Crash(Crash::default()))
    }

    pub fn snooze(ticks: u32) -> Self {
        Self::new(MissionKind::Snooze {
            ticks_remaining: ticks,
        })
    }

    pub fn restart_next() -> Self {
        Self::new(MissionKind::RestartNext { done: false })
    }

    pub fn teleport(target: BuildingRef) -> Self {
        Self::new(MissionKind::Teleport(Teleport::new(target)))
    }

    pub fn await_pickup(building: BuildingRef, hail: u32, max_wait: u32) -> Self {
        Self::new(MissionKind::AwaitPickup(AwaitPickup::new(
            building, hail, max_wait,
        )))
    }
}

// ============================================================================
// LIFECYCLE
// ============================================================================

impl Mission {
    pub fn kind(&self) -> &MissionKind {
        &self.kind
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn path(&self) -> Option<&Path> {
        self.plan.path.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.plan.cancelled
    }

    pub fn failure(&self) -> Option<MissionFailure> {
        self.plan.failure
    }

    /// Cooperative cancellation; takes effect at the next lifecycle call.
    pub fn cancel(&mut self, reason: MissionFailure) {
        log::debug!("{} cancelled: {}", self.name(), reason);
        self.plan.cancel(reason);
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            MissionKind::GotoLocation(_) => "GotoLocation",
            MissionKind::GotoBuilding(_) => "GotoBuilding",
            MissionKind::InvestigateBuilding(_) => "InvestigateBuilding",
            MissionKind::Infiltrate(_) => "Infiltrate",
            MissionKind::AttackTarget(_) => "AttackTarget",
            MissionKind::FollowTarget(_) => "FollowTarget",
            MissionKind::Patrol(_) => "Patrol",
            MissionKind::TakeOff(_) => "TakeOff",
            MissionKind::Land(_) => "Land",
            MissionKind::Crash(_) => "Crash",
            MissionKind::Snooze { .. } => "Snooze",
            MissionKind::RestartNext { .. } => "RestartNext",
            MissionKind::Teleport(_) => "Teleport",
            MissionKind::AwaitPickup(_) => "AwaitPickup",
        }
    }

    pub fn start(&mut self, actor: &mut ActorBody, env: &mut MissionEnv<'_>) -> Transition {
        if self.plan.cancelled {
            return Transition::Continue;
        }
        let Mission { kind, plan } = self;
        let transition = match kind {
            MissionKind::GotoLocation(m) => m.start(plan, actor, env),
            MissionKind::GotoBuilding(trip) => trip.start(Visit::Goto, plan, actor, env),
            MissionKind::InvestigateBuilding(trip) => {
                trip.start(Visit::Investigate, plan, actor, env)
            }
            MissionKind::Infiltrate(trip) => trip.start(Visit::Infiltrate, plan, actor, env),
            MissionKind::AttackTarget(p) | MissionKind::FollowTarget(p) => {
                p.start(plan, actor, env)
            }
            MissionKind::Patrol(m) => m.start(plan, actor, env),
            MissionKind::TakeOff(m) => m.start(plan, actor, env),
            MissionKind::Land(m) => m.start(plan, actor, env),
            MissionKind::Crash(m) => m.start(plan, actor, env),
            MissionKind::Snooze { .. } => Transition::Continue,
            MissionKind::RestartNext { done } => {
                *done = true;
                Transition::Continue
            }
            MissionKind::Teleport(m) => m.start(plan, actor, env),
            MissionKind::AwaitPickup(m) => m.start(plan, actor, env),
        };
        if self.plan.cancelled {
            log::debug!(
                "{:?} {} cancelled on start: {:?}",
                actor.id,
                self.name(),
                self.plan.failure
            );
        }
        transition
    }

    /// Advance timers by `ticks`. Zero ticks never changes anything.
    pub fn update(
        &mut self,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
        ticks: u32,
    ) -> Transition {
        if self.plan.cancelled || ticks == 0 {
            return Transition::Continue;
        }
        let Mission { kind, plan } = self;
        match kind {
            MissionKind::Snooze { ticks_remaining } => {
                *ticks_remaining = ticks_remaining.saturating_sub(ticks);
            }
            MissionKind::AwaitPickup(m) => m.update(plan, actor, env, ticks),
            _ => {}
        }
        Transition::Continue
    }

    pub fn is_finished(&self, actor: &ActorBody, world: &dyn WorldView) -> bool {
        if self.plan.cancelled {
            return true;
        }
        match &self.kind {
            MissionKind::GotoLocation(_) => self.plan.consumed() && actor.at_goal(),
            MissionKind::GotoBuilding(trip)
            | MissionKind::InvestigateBuilding(trip)
            | MissionKind::Infiltrate(trip) => trip.is_finished(world),
            MissionKind::AttackTarget(p) | MissionKind::FollowTarget(p) => p.is_finished(world),
            MissionKind::Patrol(m) => m.is_finished(actor),
            MissionKind::TakeOff(m) => m.lifted,
            MissionKind::Land(m) => m.is_finished(world),
            MissionKind::Crash(m) => m.crashed,
            MissionKind::Snooze { ticks_remaining } => *ticks_remaining == 0,
            MissionKind::RestartNext { done } => *done,
            MissionKind::Teleport(m) => m.is_finished(world),
            MissionKind::AwaitPickup(m) => m.is_finished(actor, world),
        }
    }

    pub fn next_destination(
        &mut self,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Destination {
        if self.plan.cancelled {
            return Destination::Idle;
        }
        let Mission { kind, plan } = self;
        match kind {
            MissionKind::GotoLocation(_) => walk(plan, actor, env).unwrap_or(Destination::Idle),
            MissionKind::GotoBuilding(trip) => {
                trip.next_destination(Visit::Goto, plan, actor, env)
            }
            MissionKind::InvestigateBuilding(trip) => {
                trip.next_destination(Visit::Investigate, plan, actor, env)
            }
            MissionKind::Infiltrate(trip) => {
                trip.next_destination(Visit::Infiltrate, plan, actor, env)
            }
            MissionKind::AttackTarget(p) => p.next_destination(Stance::Attack, plan, actor, env),
            MissionKind::FollowTarget(p) => p.next_destination(Stance::Follow, plan, actor, env),
            MissionKind::Patrol(m) => m.next_destination(plan, actor, env),
            MissionKind::TakeOff(m) => m.next_destination(plan, actor, env),
            MissionKind::Land(m) => m.next_destination(plan, actor, env),
            MissionKind::Crash(m) => m.next_destination(plan, actor, env),
            MissionKind::Snooze { .. }
            | MissionKind::RestartNext { .. }
            | MissionKind::Teleport(_)
            | MissionKind::AwaitPickup(_) => Destination::Idle,
        }
    }

    /// Called as the mission is popped. Reports targets that vanished
    /// without the mission noticing.
    pub(crate) fn retire(&mut self, actor: &ActorBody, env: &mut MissionEnv<'_>) {
        if self.plan.cancelled {
            return;
        }
        let world = env.world;
        match &self.kind {
            MissionKind::AttackTarget(p) | MissionKind::FollowTarget(p) => {
                if !world.actor(p.target).is_some_and(|t| t.alive) {
                    self.plan.failure = Some(MissionFailure::InvalidReference);
                    env.emit(WorldEvent::TargetLost {
                        actor: actor.id,
                        target: p.target,
                    });
                }
            }
            MissionKind::GotoBuilding(trip)
            | MissionKind::InvestigateBuilding(trip)
            | MissionKind::Infiltrate(trip) => {
                if !trip.arrived && world.building(trip.target).is_none() {
                    self.plan.failure = Some(MissionFailure::InvalidReference);
                    env.emit(WorldEvent::UnableToReach {
                        actor: actor.id,
                        target: Target::Building(trip.target),
                        reason: MissionFailure::InvalidReference,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Which notice a building trip emits on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    Goto,
    Investigate,
    Infiltrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stance {
    Attack,
    Follow,
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

pub(crate) enum Step {
    Toward(TilePosition),
    Consumed,
    Refused { at: TilePosition, reason: Blocked },
}

/// Pop the next leg off `path`.
///
/// Entries equal to the actor's tile are dropped first. A straight run of
/// steps in the same direction is collapsed into one leg; when `checked`,
/// every step of the run must still be accepted by the policy, and a refused
/// first step is reported instead of consumed.
pub(crate) fn follow_path(
    path: &mut Path,
    actor: &ActorBody,
    env: &MissionEnv<'_>,
    checked: bool,
) -> Step {
    let here = actor.tile();
    while path.front() == Some(here) {
        path.pop_front();
    }
    let Some(next) = path.front() else {
        return Step::Consumed;
    };

    let policy = env.policy(actor.category);
    if checked {
        if let Err(reason) = policy.can_enter(env.grid, here, next) {
            return Step::Refused { at: next, reason };
        }
    }
    path.pop_front();

    let direction = here.step_toward(next);
    let mut end = next;
    while let Some(after) = path.front() {
        if end.step_toward(after) != direction {
            break;
        }
        if checked && policy.can_enter(env.grid, end, after).is_err() {
            break;
        }
        end = after;
        path.pop_front();
    }
    Step::Toward(end)
}

/// Next waypoint along the plan's path, or `None` when there is nothing
/// left to walk. A step that became impassable discards the plan and asks
/// the mission to restart, dropping cached paths through the refused tile.
pub(crate) fn walk(
    plan: &mut Plan,
    actor: &ActorBody,
    env: &mut MissionEnv<'_>,
) -> Option<Destination> {
    let path = plan.path.as_mut()?;
    match follow_path(path, actor, env, true) {
        Step::Toward(tile) => Some(Destination::Waypoint(tile.center())),
        Step::Consumed => None,
        Step::Refused { at, reason } => {
            log::debug!(
                "{:?} path refused at ({}, {}, {}): {}; replanning",
                actor.id,
                at.x,
                at.y,
                at.z,
                reason
            );
            plan.path = None;
            env.pathfinder.invalidate(&TileRegion::single(at));
            Some(Destination::Prerequisite(Mission::restart_next()))
        }
    }
}

/// Cancel and tell the event bus why.
pub(crate) fn give_up(
    plan: &mut Plan,
    actor: &ActorBody,
    env: &mut MissionEnv<'_>,
    target: Target,
    reason: MissionFailure,
) {
    plan.cancel(reason);
    env.emit(WorldEvent::UnableToReach {
        actor: actor.id,
        target,
        reason,
    });
}

/// Leave the current building, if any.
pub(crate) fn depart(actor: &mut ActorBody, env: &mut MissionEnv<'_>) {
    if let Some(building) = actor.docked_in.take() {
        env.emit(WorldEvent::Departed {
            actor: actor.id,
            building,
        });
    }
}

/// Flying actors must take off before going anywhere.
pub(crate) fn needs_take_off(actor: &ActorBody) -> bool {
    actor.docked_in.is_some() && actor.category.is_flying()
}

#[cfg(test)]
mod tests;

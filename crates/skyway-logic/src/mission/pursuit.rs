//! Chasing another actor: AttackTarget and FollowTarget.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{depart, give_up, needs_take_off, walk, Destination, Mission, Plan, Stance, Transition};
use crate::actor::{ActorBody, MissionEnv};
use crate::error::MissionFailure;
use crate::events::{Target, WorldEvent};
use crate::grid::TilePosition;
use crate::traversal::TraversalPolicy;
use crate::world::{ActorRef, ActorSnapshot, WorldView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pursuit {
    pub target: ActorRef,
    /// Target tile the current path was planned toward.
    pub planned_for: Option<TilePosition>,
}

impl Pursuit {
    pub fn new(target: ActorRef) -> Self {
        Self {
            target,
            planned_for: None,
        }
    }

    pub(super) fn start(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if self.resolve(plan, actor, env).is_none() {
            return Transition::Continue;
        }
        if needs_take_off(actor) {
            return Transition::Push(Mission::take_off());
        }
        depart(actor, env);
        Transition::Continue
    }

    pub(super) fn next_destination(
        &mut self,
        stance: Stance,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Destination {
        let Some(target) = self.resolve(plan, actor, env) else {
            return Destination::Idle;
        };

        let table = env.stats;
        let stats = table.get(actor.category);
        let preferred = match stance {
            Stance::Attack => stats.preferred_distance(actor.posture),
            Stance::Follow => stats.follow_distance,
        };

        if actor.position.distance(&target.position) <= preferred {
            plan.path = None;
            self.planned_for = None;
            return match stance {
                Stance::Follow => Destination::Idle,
                Stance::Attack => maneuver(actor, env, &target, preferred, stats.maneuver_samples),
            };
        }

        let target_tile = target.tile();
        let has_steps = plan.path.as_ref().is_some_and(|p| !p.is_empty());
        if self.planned_for != Some(target_tile) || !has_steps {
            match env.find_path_near(actor, target_tile, 1) {
                Some(path) => {
                    plan.path = Some(path);
                    self.planned_for = Some(target_tile);
                }
                None => {
                    give_up(
                        plan,
                        actor,
                        env,
                        Target::Actor(self.target),
                        MissionFailure::PlanningFailure,
                    );
                    return Destination::Idle;
                }
            }
        }
        walk(plan, actor, env).unwrap_or(Destination::Idle)
    }

    pub(super) fn is_finished(&self, world: &dyn WorldView) -> bool {
        !world.actor(self.target).is_some_and(|t| t.alive)
    }

    /// Live target, or cancel and report it lost.
    fn resolve(
        &self,
        plan: &mut Plan,
        actor: &ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Option<ActorSnapshot> {
        match env.world.actor(self.target) {
            Some(snapshot) if snapshot.alive => Some(snapshot),
            _ => {
                plan.cancel(MissionFailure::InvalidReference);
                env.emit(WorldEvent::TargetLost {
                    actor: actor.id,
                    target: self.target,
                });
                None
            }
        }
    }
}

/// Sample random neighbouring cells and keep the legal one whose distance
/// to the target is closest to `preferred`. Earlier samples win ties.
fn maneuver(
    actor: &ActorBody,
    env: &mut MissionEnv<'_>,
    target: &ActorSnapshot,
    preferred: f32,
    samples: u32,
) -> Destination {
    let here = actor.tile();
    let options = here.neighbors();
    let policy = env.policy(actor.category);

    let mut best: Option<(f32, TilePosition)> = None;
    for _ in 0..samples {
        let candidate = options[env.rng.gen_range(0..options.len())];
        if policy.can_enter(env.grid, here, candidate).is_err() {
            continue;
        }
        let miss = (candidate.center().distance(&target.position) - preferred).abs();
        if best.map_or(true, |(closest, _)| miss < closest) {
            best = Some((miss, candidate));
        }
    }

    match best {
        Some((_, tile)) => Destination::Waypoint(tile.center()),
        None => Destination::Idle,
    }
}

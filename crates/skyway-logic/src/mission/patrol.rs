use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{depart, needs_take_off, walk, Destination, Mission, Plan, Transition};
use crate::actor::{ActorBody, MissionEnv};
use crate::grid::TilePosition;
use crate::traversal::{CategoryPolicy, TraversalPolicy};

/// Walk to random reachable points, one leg at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patrol {
    pub remaining_legs: u32,
    /// Destination of the leg in progress.
    pub leg_goal: Option<TilePosition>,
}

impl Patrol {
    pub fn new(legs: u32) -> Self {
        Self {
            remaining_legs: legs,
            leg_goal: None,
        }
    }

    pub(super) fn start(
        &mut self,
        plan: &mut Plan,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) -> Transition {
        if needs_take_off(actor) {
            return Transition::Push(Mission::take_off());
        }
        depart(actor, env);

        if plan.path.is_none() {
            // Resume a leg whose plan was discarded.
            if let Some(goal) = self.leg_goal {
                plan.path = env.find_path(actor, goal);
                if plan.path.is_none() {
                    self.leg_goal = None;
                }
            }
        }
        if self.leg_goal.is_none() && self.remaining_legs > 0 {
            self.plan_leg(plan, actor, env);
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
        self.leg_goal = None;
        while self.remaining_legs > 0 {
            if self.plan_leg(plan, actor, env) {
                return walk(plan, actor, env).unwrap_or(Destination::Idle);
            }
        }
        Destination::Idle
    }

    pub(super) fn is_finished(&self, actor: &ActorBody) -> bool {
        self.remaining_legs == 0 && self.leg_goal.is_none() && actor.at_goal()
    }

    /// Spend one leg on a random reachable destination. A leg whose samples
    /// all fail is still spent, so the patrol always terminates.
    fn plan_leg(&mut self, plan: &mut Plan, actor: &ActorBody, env: &mut MissionEnv<'_>) -> bool {
        self.remaining_legs = self.remaining_legs.saturating_sub(1);

        let attempts = env.stats.get(actor.category).patrol_sample_attempts;
        let policy = env.policy(actor.category);
        let size = env.grid.size();
        let (z_min, z_max) = match policy {
            CategoryPolicy::Flying(flying) => {
                (flying.band.min.max(0), flying.band.max.min(size.z - 1))
            }
            CategoryPolicy::Ground(_) => (0, size.z - 1),
        };
        if size.x <= 0 || size.y <= 0 || z_min > z_max {
            return false;
        }

        let here = actor.tile();
        for _ in 0..attempts {
            let tile = TilePosition::new(
                env.rng.gen_range(0..size.x),
                env.rng.gen_range(0..size.y),
                env.rng.gen_range(z_min..=z_max),
            );
            if tile == here || !policy.can_stand(env.grid, tile) {
                continue;
            }
            if let Some(path) = env.find_path(actor, tile) {
                plan.path = Some(path);
                self.leg_goal = Some(tile);
                return true;
            }
        }
        log::debug!(
            "{:?} patrol leg skipped after {} samples ({} left)",
            actor.id,
            attempts,
            self.remaining_legs
        );
        false
    }
}

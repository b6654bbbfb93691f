//! Per-tick movement executor.
//!
//! Algorithm, once per actor per tick:
//! 1. Accrue teleport readiness and let the front mission update its timers
//! 2. Budget = speed × category speed scale × elapsed ticks
//! 3. At goal: ask the mission chain for the next goal (flushing finished
//!    missions first); no goal means idle
//! 4. Close the remaining distance if the budget covers it (snap to goal),
//!    otherwise move exactly the budget along the straight line
//! 5. Repeat 3–4 while budget remains and goals keep coming
//!
//! There is no carried-over fraction: each leg re-derives the remaining
//! distance from positions, so the outcome depends only on position and
//! elapsed ticks.

use crate::actor::{ActorBody, MissionEnv};
use crate::error::{Blocked, MoveError};
use crate::grid::{Grid, TilePosition};
use crate::queue::{Goal, MissionQueue};
use crate::traversal::TraversalPolicy;

/// Upper bound on goals consumed in one tick.
const MAX_LEGS_PER_TICK: u32 = 64;

/// Slack, in tiles, under which the remaining distance counts as covered.
/// Absorbs f32 residue from stepping a leg in budget-sized increments.
pub const ARRIVAL_EPSILON: f32 = 1e-4;

/// What one tick did to an actor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    /// Distance covered, in tiles.
    pub travelled: f32,
    /// New goals accepted.
    pub legs: u32,
    /// Leg refused by the defensive policy check.
    pub refused: Option<MoveError>,
}

impl TickOutcome {
    pub fn moved(&self) -> bool {
        self.travelled > 0.0
    }
}

/// Run one tick of `ticks` for an actor and its queue.
pub fn advance(
    actor: &mut ActorBody,
    queue: &mut MissionQueue,
    env: &mut MissionEnv<'_>,
    ticks: u32,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    if ticks == 0 {
        return outcome;
    }

    let table = env.stats;
    let stats = table.get(actor.category);
    if stats.can_teleport {
        actor.teleport_charge = actor
            .teleport_charge
            .saturating_add(ticks)
            .min(stats.teleport_ready_ticks);
    }
    let mut budget = actor.speed * stats.speed_scale * ticks as f32;

    queue.update(ticks, actor, env);

    for _ in 0..MAX_LEGS_PER_TICK {
        if actor.at_goal() {
            let Some(goal) = queue.next_goal(actor, env) else {
                break;
            };
            if let Err(err) = accept_goal(actor, goal, env) {
                outcome.refused = Some(err);
                break;
            }
            outcome.legs += 1;
        }

        if budget <= 0.0 {
            break;
        }

        let delta = actor.goal - actor.position;
        let remaining = delta.length();
        if remaining <= budget + ARRIVAL_EPSILON {
            actor.position = actor.goal;
            budget = (budget - remaining).max(0.0);
            outcome.travelled += remaining;
        } else {
            actor.position = actor.position + delta.normalize() * budget;
            outcome.travelled += budget;
            budget = 0.0;
        }
    }

    outcome
}

/// Install `goal` as the actor's next leg. A checked leg the policy
/// refuses is logged and the actor keeps its current goal.
pub fn accept_goal(
    actor: &mut ActorBody,
    goal: Goal,
    env: &MissionEnv<'_>,
) -> Result<(), MoveError> {
    if goal.checked {
        let policy = env.policy(actor.category);
        if let Err(err) = check_leg(env.grid, &policy, actor.tile(), goal.position.tile()) {
            log::error!("{:?}: {}", actor.id, err);
            return Err(err);
        }
    }
    actor.goal = goal.position;
    Ok(())
}

/// A leg must run along one axis and every unit step on it must be
/// accepted by the policy.
pub fn check_leg<P: TraversalPolicy + ?Sized>(
    grid: &Grid,
    policy: &P,
    from: TilePosition,
    to: TilePosition,
) -> Result<(), MoveError> {
    if from == to {
        return Ok(());
    }
    if from.changed_axes(to) > 1 {
        return Err(MoveError::IllegalMove {
            from,
            to,
            reason: Blocked::NotAdjacent,
        });
    }
    let (dx, dy, dz) = from.step_toward(to);
    let mut at = from;
    while at != to {
        let next = at.offset(dx, dy, dz);
        policy
            .can_enter(grid, at, next)
            .map_err(|reason| MoveError::IllegalMove {
                from: at,
                to: next,
                reason,
            })?;
        at = next;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::grid::{Scenery, SceneryKind, TileRegion};
    use crate::pathfinding::Pathfinder;
    use crate::stats::StatsTable;
    use crate::traversal::GroundPolicy;
    use crate::world::{ActorCategory, ActorRef, WorldSnapshot};

    fn t(x: i32, y: i32, z: i32) -> TilePosition {
        TilePosition::new(x, y, z)
    }

    fn corridor() -> Grid {
        let mut grid = Grid::new(6, 1, 1);
        grid.fill(
            TileRegion::new(t(0, 0, 0), t(5, 0, 0)),
            Some(Scenery::new(SceneryKind::Road)),
        );
        grid
    }

    #[test]
    fn test_straight_leg_is_legal() {
        let grid = corridor();
        assert!(check_leg(&grid, &GroundPolicy::default(), t(0, 0, 0), t(5, 0, 0)).is_ok());
        assert!(check_leg(&grid, &GroundPolicy::default(), t(3, 0, 0), t(3, 0, 0)).is_ok());
    }

    #[test]
    fn test_leg_reports_first_refused_step() {
        let mut grid = corridor();
        grid.set_scenery(t(3, 0, 0), Some(Scenery::new(SceneryKind::Wall)));
        let err = check_leg(&grid, &GroundPolicy::default(), t(0, 0, 0), t(5, 0, 0)).unwrap_err();
        assert_eq!(
            err,
            MoveError::IllegalMove {
                from: t(2, 0, 0),
                to: t(3, 0, 0),
                reason: Blocked::BlockingScenery,
            }
        );
    }

    #[test]
    fn test_diagonal_leg_refused() {
        let grid = Grid::new(3, 3, 1);
        let err = check_leg(&grid, &GroundPolicy::default(), t(0, 0, 0), t(1, 1, 0)).unwrap_err();
        assert!(matches!(
            err,
            MoveError::IllegalMove {
                reason: Blocked::NotAdjacent,
                ..
            }
        ));
    }

    #[test]
    fn test_refused_goal_leaves_actor_in_place() {
        let mut grid = corridor();
        grid.set_scenery(t(3, 0, 0), Some(Scenery::new(SceneryKind::Wall)));
        let mut pathfinder = Pathfinder::new();
        let world = WorldSnapshot::new();
        let stats = StatsTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = Vec::new();
        let env = MissionEnv {
            grid: &grid,
            pathfinder: &mut pathfinder,
            world: &world,
            stats: &stats,
            rng: &mut rng,
            events: &mut events,
        };

        let mut actor = ActorBody::new(ActorRef(1), ActorCategory::GroundAgent, t(0, 0, 0), 1.0);
        let through_wall = Goal {
            position: t(5, 0, 0).center(),
            checked: true,
        };
        let err = accept_goal(&mut actor, through_wall, &env).unwrap_err();
        assert!(matches!(
            err,
            MoveError::IllegalMove {
                reason: Blocked::BlockingScenery,
                ..
            }
        ));
        assert_eq!(actor.goal, t(0, 0, 0).center());
        assert!(actor.at_goal());

        // Falling legs skip the policy.
        let forced = Goal {
            position: t(5, 0, 0).center(),
            checked: false,
        };
        assert!(accept_goal(&mut actor, forced, &env).is_ok());
        assert_eq!(actor.goal, t(5, 0, 0).center());
    }
}

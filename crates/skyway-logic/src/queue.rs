//! Ordered per-actor mission list. The front mission is the only active one.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::actor::{ActorBody, MissionEnv};
use crate::error::MissionFailure;
use crate::grid::WorldPosition;
use crate::mission::{Destination, Mission, Transition};

/// Longest chain of prerequisites one `start` may push.
const MAX_PUSH_DEPTH: usize = 8;

/// Finished missions popped per flush.
const MAX_POPS: usize = 64;

/// Destination queries per goal request before the actor idles.
const MAX_GOAL_ATTEMPTS: usize = 16;

/// Goal handed to the movement executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Goal {
    pub position: WorldPosition,
    /// Whether the leg must be accepted by the traversal policy.
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionQueue {
    missions: VecDeque<Mission>,
}

impl MissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn front(&self) -> Option<&Mission> {
        self.missions.front()
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mission> {
        self.missions.iter()
    }

    /// Push-back queues behind the current mission; push-front (or any push
    /// onto an empty queue) interrupts and starts immediately.
    pub fn add(
        &mut self,
        mission: Mission,
        to_back: bool,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
    ) {
        if to_back && !self.missions.is_empty() {
            self.missions.push_back(mission);
        } else {
            self.push_front_and_start(mission, actor, env, 0);
        }
    }

    /// Replace everything with `mission` and start it.
    pub fn set(&mut self, mission: Mission, actor: &mut ActorBody, env: &mut MissionEnv<'_>) {
        self.missions.clear();
        self.push_front_and_start(mission, actor, env, 0);
    }

    /// Cancel every queued mission; they pop on the next flush.
    pub fn cancel_all(&mut self, reason: MissionFailure) {
        for mission in &mut self.missions {
            mission.cancel(reason);
        }
    }

    pub fn clear(&mut self) {
        self.missions.clear();
    }

    /// Pop finished missions from the front, starting each newly exposed one.
    pub fn pop_finished(&mut self, actor: &mut ActorBody, env: &mut MissionEnv<'_>) {
        for _ in 0..MAX_POPS {
            let Some(front) = self.missions.front() else {
                return;
            };
            if !front.is_finished(actor, env.world) {
                return;
            }
            if let Some(mut done) = self.missions.pop_front() {
                done.retire(actor, env);
                log::trace!("{:?} finished {}", actor.id, done.name());
            }
            self.start_front(actor, env, 0);
        }
        log::warn!("{:?} mission flush did not settle", actor.id);
    }

    /// Per-tick update of the front mission only.
    pub fn update(&mut self, ticks: u32, actor: &mut ActorBody, env: &mut MissionEnv<'_>) {
        let Some(front) = self.missions.front_mut() else {
            return;
        };
        if let Transition::Push(next) = front.update(actor, env, ticks) {
            self.push_front_and_start(next, actor, env, 0);
        }
    }

    /// Next goal from the mission chain, flushing finished missions and
    /// inserting prerequisites along the way. `None` means idle this tick.
    pub fn next_goal(&mut self, actor: &mut ActorBody, env: &mut MissionEnv<'_>) -> Option<Goal> {
        for _ in 0..MAX_GOAL_ATTEMPTS {
            self.pop_finished(actor, env);
            let front = self.missions.front_mut()?;
            match front.next_destination(actor, env) {
                Destination::Waypoint(position) => {
                    return Some(Goal {
                        position,
                        checked: true,
                    })
                }
                Destination::Forced(position) => {
                    return Some(Goal {
                        position,
                        checked: false,
                    })
                }
                Destination::Prerequisite(mission) => {
                    self.push_front_and_start(mission, actor, env, 0);
                }
                Destination::Idle => {
                    if !front.is_finished(actor, env.world) {
                        return None;
                    }
                }
            }
        }
        log::debug!("{:?} found no goal after {} attempts", actor.id, MAX_GOAL_ATTEMPTS);
        None
    }

    fn push_front_and_start(
        &mut self,
        mission: Mission,
        actor: &mut ActorBody,
        env: &mut MissionEnv<'_>,
        depth: usize,
    ) {
        self.missions.push_front(mission);
        self.start_front(actor, env, depth);
    }

    fn start_front(&mut self, actor: &mut ActorBody, env: &mut MissionEnv<'_>, depth: usize) {
        let Some(front) = self.missions.front_mut() else {
            return;
        };
        if let Transition::Push(next) = front.start(actor, env) {
            if depth >= MAX_PUSH_DEPTH {
                log::warn!(
                    "{:?} dropped {} prerequisite: chain too deep",
                    actor.id,
                    next.name()
                );
                return;
            }
            self.push_front_and_start(next, actor, env, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::grid::{Grid, Scenery, SceneryKind, TilePosition, TileRegion};
    use crate::pathfinding::Pathfinder;
    use crate::stats::StatsTable;
    use crate::world::{ActorCategory, ActorRef, WorldSnapshot};

    fn t(x: i32, y: i32, z: i32) -> TilePosition {
        TilePosition::new(x, y, z)
    }

    fn strip() -> Grid {
        let mut grid = Grid::new(6, 1, 1);
        grid.fill(
            TileRegion::new(t(0, 0, 0), t(5, 0, 0)),
            Some(Scenery::new(SceneryKind::Road)),
        );
        grid
    }

    #[test]
    fn test_restart_marker_restarts_exposed_mission() {
        let grid = strip();
        let mut pathfinder = Pathfinder::new();
        let world = WorldSnapshot::new();
        let stats = StatsTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = Vec::new();
        let mut env = MissionEnv {
            grid: &grid,
            pathfinder: &mut pathfinder,
            world: &world,
            stats: &stats,
            rng: &mut rng,
            events: &mut events,
        };
        let mut actor = ActorBody::new(ActorRef(1), ActorCategory::GroundAgent, t(0, 0, 0), 1.0);
        let mut queue = MissionQueue::new();

        queue.add(Mission::goto_location(t(4, 0, 0)), false, &mut actor, &mut env);
        queue.add(Mission::snooze(3), true, &mut actor, &mut env);
        assert_eq!(queue.len(), 2);
        assert!(queue.front().is_some_and(|m| m.path().is_some()));

        queue.add(Mission::restart_next(), false, &mut actor, &mut env);
        assert_eq!(queue.len(), 3);
        queue.pop_finished(&mut actor, &mut env);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.front().map(Mission::name), Some("GotoLocation"));

        let goal = queue.next_goal(&mut actor, &mut env);
        assert_eq!(
            goal,
            Some(Goal {
                position: t(4, 0, 0).center(),
                checked: true,
            })
        );
    }

    #[test]
    fn test_cancel_all_flushes_queue() {
        let grid = strip();
        let mut pathfinder = Pathfinder::new();
        let world = WorldSnapshot::new();
        let stats = StatsTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = Vec::new();
        let mut env = MissionEnv {
            grid: &grid,
            pathfinder: &mut pathfinder,
            world: &world,
            stats: &stats,
            rng: &mut rng,
            events: &mut events,
        };
        let mut actor = ActorBody::new(ActorRef(1), ActorCategory::GroundAgent, t(0, 0, 0), 1.0);
        let mut queue = MissionQueue::new();
        queue.add(Mission::snooze(5), false, &mut actor, &mut env);
        queue.add(Mission::snooze(5), true, &mut actor, &mut env);

        queue.cancel_all(MissionFailure::InvalidReference);
        queue.pop_finished(&mut actor, &mut env);
        assert!(queue.is_empty());
        assert_eq!(queue.next_goal(&mut actor, &mut env), None);
    }
}

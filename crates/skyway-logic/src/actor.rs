//! Actor state and the shared collaborators a mission runs against.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::events::WorldEvent;
use crate::grid::{Grid, TilePosition, WorldPosition};
use crate::movement::{self, TickOutcome};
use crate::pathfinding::{Path, Pathfinder};
use crate::queue::MissionQueue;
use crate::mission::Mission;
use crate::stats::{AttackPosture, CategoryStats, StatsTable};
use crate::traversal::CategoryPolicy;
use crate::world::{ActorCategory, ActorRef, ActorSnapshot, BuildingRef, WorldView};

/// Everything about an actor except its mission queue.
///
/// `position` is authoritative; the grid's occupancy counts are derived
/// from it (and from `docked_in`) by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorBody {
    pub id: ActorRef,
    pub category: ActorCategory,
    pub position: WorldPosition,
    pub goal: WorldPosition,
    /// Tiles per tick before category scaling.
    pub speed: f32,
    pub docked_in: Option<BuildingRef>,
    pub home: Option<BuildingRef>,
    pub posture: AttackPosture,
    /// Accrued teleport readiness, in ticks.
    pub teleport_charge: u32,
    /// Set on hire/transfer; cleared by the first arrival.
    pub first_arrival_pending: bool,
}

impl ActorBody {
    /// Actor standing at the center of `tile`.
    pub fn new(id: ActorRef, category: ActorCategory, tile: TilePosition, speed: f32) -> Self {
        let position = tile.center();
        Self {
            id,
            category,
            position,
            goal: position,
            speed,
            docked_in: None,
            home: None,
            posture: AttackPosture::default(),
            teleport_charge: 0,
            first_arrival_pending: false,
        }
    }

    pub fn tile(&self) -> TilePosition {
        self.position.tile()
    }

    pub fn at_goal(&self) -> bool {
        self.position == self.goal
    }

    /// Jump to the center of `tile` and stop there.
    pub fn place_at(&mut self, tile: TilePosition) {
        self.position = tile.center();
        self.goal = self.position;
    }

    /// Grid cell this actor should be counted in; `None` while docked.
    pub fn occupied_tile(&self) -> Option<TilePosition> {
        match self.docked_in {
            Some(_) => None,
            None => Some(self.tile()),
        }
    }

    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            position: self.position,
            category: self.category,
            alive: true,
            docked_in: self.docked_in,
        }
    }
}

/// Shared collaborators for one actor's turn.
pub struct MissionEnv<'a> {
    pub grid: &'a Grid,
    pub pathfinder: &'a mut Pathfinder,
    pub world: &'a dyn WorldView,
    pub stats: &'a StatsTable,
    pub rng: &'a mut StdRng,
    pub events: &'a mut Vec<WorldEvent>,
}

impl MissionEnv<'_> {
    pub fn stats_for(&self, category: ActorCategory) -> &CategoryStats {
        self.stats.get(category)
    }

    pub fn policy(&self, category: ActorCategory) -> CategoryPolicy {
        self.stats.policy(category)
    }

    pub fn emit(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    /// Cached search from the actor's tile to `goal` under its category's policy.
    pub fn find_path(&mut self, actor: &ActorBody, goal: TilePosition) -> Option<Path> {
        let policy = self.stats.policy(actor.category);
        let budget = self.stats.get(actor.category).max_path_expansions;
        self.pathfinder
            .find_path(self.grid, actor.tile(), goal, &policy, budget)
    }

    /// Uncached search to any standable tile within `within` of `goal`.
    pub fn find_path_near(
        &mut self,
        actor: &ActorBody,
        goal: TilePosition,
        within: u32,
    ) -> Option<Path> {
        let policy = self.stats.policy(actor.category);
        let budget = self.stats.get(actor.category).max_path_expansions;
        self.pathfinder
            .find_path_near(self.grid, actor.tile(), goal, within, &policy, budget)
    }
}

/// An actor together with its mission queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub body: ActorBody,
    pub missions: MissionQueue,
}

impl Actor {
    pub fn new(body: ActorBody) -> Self {
        Self {
            body,
            missions: MissionQueue::new(),
        }
    }

    /// Queue a mission. Push-front interrupts the current one and starts
    /// immediately; push-back waits its turn.
    pub fn add_mission(&mut self, mission: Mission, to_back: bool, env: &mut MissionEnv<'_>) {
        self.missions.add(mission, to_back, &mut self.body, env);
    }

    /// Drop every mission and start `mission` in their place.
    pub fn set_mission(&mut self, mission: Mission, env: &mut MissionEnv<'_>) {
        self.missions.set(mission, &mut self.body, env);
    }

    pub fn pop_finished_missions(&mut self, env: &mut MissionEnv<'_>) {
        self.missions.pop_finished(&mut self.body, env);
    }

    /// Run one simulation step of `ticks` for this actor.
    pub fn update(&mut self, ticks: u32, env: &mut MissionEnv<'_>) -> TickOutcome {
        movement::advance(&mut self.body, &mut self.missions, env, ticks)
    }
}

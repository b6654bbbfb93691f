use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;
use crate::grid::{Grid, Scenery, SceneryKind};
use crate::pathfinding::Pathfinder;
use crate::stats::StatsTable;
use crate::world::{ActorCategory, ActorSnapshot, BuildingInfo, WorldSnapshot};

fn t(x: i32, y: i32, z: i32) -> TilePosition {
    TilePosition::new(x, y, z)
}

const A: BuildingRef = BuildingRef(1);
const B: BuildingRef = BuildingRef(2);

struct Fixture {
    grid: Grid,
    pathfinder: Pathfinder,
    world: WorldSnapshot,
    stats: StatsTable,
    rng: StdRng,
    events: Vec<WorldEvent>,
}

impl Fixture {
    /// 8x3 road slab at z = 0 with open air above. Building A's entry is
    /// at the west end, B's at x = 5.
    fn new() -> Self {
        let mut grid = Grid::new(8, 3, 3);
        grid.fill(
            TileRegion::new(t(0, 0, 0), t(7, 2, 0)),
            Some(Scenery::new(SceneryKind::Road)),
        );
        let mut world = WorldSnapshot::new();
        world.insert_building(A, BuildingInfo::new("depot", t(0, 0, 0)));
        world.insert_building(B, BuildingInfo::new("tower", t(5, 0, 0)));
        Self {
            grid,
            pathfinder: Pathfinder::new(),
            world,
            stats: StatsTable::default(),
            rng: StdRng::seed_from_u64(7),
            events: Vec::new(),
        }
    }

    fn env(&mut self) -> MissionEnv<'_> {
        MissionEnv {
            grid: &self.grid,
            pathfinder: &mut self.pathfinder,
            world: &self.world,
            stats: &self.stats,
            rng: &mut self.rng,
            events: &mut self.events,
        }
    }

    fn wall_off_column(&mut self, x: i32) {
        self.grid.fill(
            TileRegion::new(t(x, 0, 0), t(x, 2, 0)),
            Some(Scenery::new(SceneryKind::Wall)),
        );
    }
}

fn agent(tile: TilePosition) -> ActorBody {
    ActorBody::new(ActorRef(10), ActorCategory::GroundAgent, tile, 1.0)
}

fn vehicle(tile: TilePosition) -> ActorBody {
    ActorBody::new(ActorRef(20), ActorCategory::FlyingVehicle, tile, 1.0)
}

#[test]
fn test_cancelled_mission_is_inert() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(0, 0, 0));
    let mut mission = Mission::goto_location(t(5, 0, 0));
    mission.cancel(MissionFailure::Timeout);

    let mut env = fx.env();
    assert_eq!(mission.start(&mut actor, &mut env), Transition::Continue);
    assert_eq!(mission.next_destination(&mut actor, &mut env), Destination::Idle);
    assert!(mission.is_finished(&actor, env.world));
    assert!(mission.path().is_none());
    assert_eq!(mission.failure(), Some(MissionFailure::Timeout));
}

#[test]
fn test_snooze_ignores_zero_ticks() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(0, 0, 0));
    let mut mission = Mission::snooze(3);
    let mut env = fx.env();
    mission.start(&mut actor, &mut env);
    for _ in 0..5 {
        mission.update(&mut actor, &mut env, 0);
    }
    assert_eq!(mission.kind(), &MissionKind::Snooze { ticks_remaining: 3 });
    assert!(!mission.is_finished(&actor, env.world));

    mission.update(&mut actor, &mut env, 2);
    assert!(!mission.is_finished(&actor, env.world));
    mission.update(&mut actor, &mut env, 5);
    assert!(mission.is_finished(&actor, env.world));
}

#[test]
fn test_goto_location_collapses_straight_run() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(0, 0, 0));
    let mut mission = Mission::goto_location(t(5, 0, 0));
    let mut env = fx.env();

    mission.start(&mut actor, &mut env);
    assert_eq!(mission.path().map(Path::len), Some(6));
    assert_eq!(
        mission.next_destination(&mut actor, &mut env),
        Destination::Waypoint(t(5, 0, 0).center())
    );
    actor.goal = t(5, 0, 0).center();
    assert!(!mission.is_finished(&actor, env.world));

    actor.place_at(t(5, 0, 0));
    assert_eq!(mission.next_destination(&mut actor, &mut env), Destination::Idle);
    assert!(mission.is_finished(&actor, env.world));
}

#[test]
fn test_refused_step_discards_plan_and_restarts() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(0, 0, 0));
    let mut mission = Mission::goto_location(t(5, 0, 0));
    {
        let mut env = fx.env();
        mission.start(&mut actor, &mut env);
    }
    assert_eq!(fx.pathfinder.cache_size(), 1);

    fx.grid.set_scenery(t(1, 0, 0), Some(Scenery::new(SceneryKind::Wall)));
    let mut env = fx.env();
    let next = mission.next_destination(&mut actor, &mut env);
    assert!(matches!(
        next,
        Destination::Prerequisite(ref m) if matches!(m.kind(), MissionKind::RestartNext { .. })
    ));
    assert!(mission.path().is_none());
    assert!(!mission.is_cancelled());
    drop(env);
    assert_eq!(fx.pathfinder.cache_size(), 0);
}

#[test]
fn test_unreachable_location_reports_and_cancels() {
    let mut fx = Fixture::new();
    fx.wall_off_column(3);
    let mut actor = agent(t(0, 0, 0));
    let mut mission = Mission::goto_location(t(5, 0, 0));
    {
        let mut env = fx.env();
        mission.start(&mut actor, &mut env);
        assert!(mission.is_finished(&actor, env.world));
    }
    assert_eq!(mission.failure(), Some(MissionFailure::PlanningFailure));
    assert_eq!(
        fx.events,
        vec![WorldEvent::UnableToReach {
            actor: actor.id,
            target: Target::Tile(t(5, 0, 0)),
            reason: MissionFailure::PlanningFailure,
        }]
    );
}

#[test]
fn test_blocked_trip_falls_back_without_moving() {
    let mut fx = Fixture::new();
    fx.wall_off_column(3);
    let mut actor = agent(t(0, 0, 0));
    actor.docked_in = Some(A);
    let mut mission = Mission::goto_building(B, false);

    let mut env = fx.env();
    let transition = mission.start(&mut actor, &mut env);
    drop(env);

    assert!(mission.is_cancelled());
    assert_eq!(mission.failure(), Some(MissionFailure::PlanningFailure));
    match transition {
        Transition::Push(fallback) => match fallback.kind() {
            MissionKind::GotoBuilding(trip) => {
                assert_eq!(trip.target, A);
                assert!(trip.fallback);
            }
            other => panic!("unexpected fallback {:?}", other),
        },
        Transition::Continue => panic!("expected a fallback trip"),
    }
    assert_eq!(actor.tile(), t(0, 0, 0));
    assert_eq!(actor.docked_in, Some(A));
    assert!(fx.events.iter().any(|e| matches!(
        e,
        WorldEvent::UnableToReach {
            target: Target::Building(B),
            ..
        }
    )));
}

#[test]
fn test_trip_departs_and_arrives_once() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(0, 0, 0));
    actor.docked_in = Some(A);
    actor.first_arrival_pending = true;
    let mut mission = Mission::goto_building(B, false);

    let mut env = fx.env();
    assert_eq!(mission.start(&mut actor, &mut env), Transition::Continue);
    assert_eq!(actor.docked_in, None);
    assert_eq!(
        mission.next_destination(&mut actor, &mut env),
        Destination::Waypoint(t(5, 0, 0).center())
    );
    actor.place_at(t(5, 0, 0));
    assert_eq!(mission.next_destination(&mut actor, &mut env), Destination::Idle);
    assert!(mission.is_finished(&actor, env.world));
    // Restarting an arrived trip is a no-op.
    mission.start(&mut actor, &mut env);
    drop(env);

    assert_eq!(actor.docked_in, Some(B));
    assert!(!actor.first_arrival_pending);
    assert_eq!(
        fx.events,
        vec![
            WorldEvent::Departed {
                actor: actor.id,
                building: A
            },
            WorldEvent::Arrived {
                actor: actor.id,
                building: B
            },
            WorldEvent::FirstArrival {
                actor: actor.id,
                building: B
            },
        ]
    );
}

#[test]
fn test_investigate_emits_its_own_notice() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(5, 0, 0));
    let mut mission = Mission::investigate_building(B);
    let mut env = fx.env();
    mission.start(&mut actor, &mut env);
    drop(env);
    assert_eq!(
        fx.events,
        vec![WorldEvent::Investigated {
            actor: actor.id,
            building: B
        }]
    );
}

#[test]
fn test_ready_teleport_short_circuits_trip() {
    let mut fx = Fixture::new();
    fx.stats.ground.can_teleport = true;
    fx.stats.ground.teleport_ready_ticks = 10;
    let mut actor = agent(t(0, 0, 0));
    actor.teleport_charge = 10;
    let mut mission = Mission::goto_building(B, false);

    let mut env = fx.env();
    let Transition::Push(mut teleport) = mission.start(&mut actor, &mut env) else {
        panic!("expected teleport prerequisite");
    };
    assert!(matches!(teleport.kind(), MissionKind::Teleport(_)));
    teleport.start(&mut actor, &mut env);
    assert!(teleport.is_finished(&actor, env.world));
    assert_eq!(actor.tile(), t(5, 0, 0));
    assert_eq!(actor.docked_in, Some(B));
    assert_eq!(actor.teleport_charge, 0);

    // The restarted trip reports the arrival.
    mission.start(&mut actor, &mut env);
    assert!(mission.is_finished(&actor, env.world));
    drop(env);
    assert!(fx
        .events
        .contains(&WorldEvent::Arrived { actor: actor.id, building: B }));
}

#[test]
fn test_docked_vehicle_takes_off_first() {
    let mut fx = Fixture::new();
    let mut actor = vehicle(t(0, 0, 1));
    actor.docked_in = Some(A);
    let mut mission = Mission::goto_location(t(6, 2, 2));
    let mut env = fx.env();
    let transition = mission.start(&mut actor, &mut env);
    assert!(matches!(
        transition,
        Transition::Push(ref m) if matches!(m.kind(), MissionKind::TakeOff(_))
    ));
    assert!(mission.path().is_none());
}

#[test]
fn test_docked_agent_hails_pickup_once() {
    let mut fx = Fixture::new();
    fx.stats.ground.pickup_hail_ticks = 5;
    fx.stats.ground.pickup_max_wait = 3;
    let mut actor = agent(t(0, 0, 0));
    actor.docked_in = Some(A);
    let mut mission = Mission::goto_building(B, true);

    let mut env = fx.env();
    let Transition::Push(mut pickup) = mission.start(&mut actor, &mut env) else {
        panic!("expected pickup prerequisite");
    };
    pickup.start(&mut actor, &mut env);
    pickup.update(&mut actor, &mut env, 2);
    assert!(!pickup.is_finished(&actor, env.world));
    pickup.update(&mut actor, &mut env, 1);
    assert!(pickup.is_finished(&actor, env.world));
    assert_eq!(pickup.failure(), Some(MissionFailure::Timeout));

    // Second start walks instead of hailing again.
    assert_eq!(mission.start(&mut actor, &mut env), Transition::Continue);
    assert!(mission.path().is_some());
    drop(env);
    assert!(fx.events.contains(&WorldEvent::PickupTimedOut {
        actor: actor.id,
        building: A
    }));
}

#[test]
fn test_pickup_hail_ends_without_failure() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(0, 0, 0));
    actor.docked_in = Some(A);
    let mut pickup = Mission::await_pickup(A, 2, 20);

    let mut env = fx.env();
    pickup.start(&mut actor, &mut env);
    pickup.update(&mut actor, &mut env, 1);
    assert!(!pickup.is_finished(&actor, env.world));
    pickup.update(&mut actor, &mut env, 1);
    assert!(pickup.is_finished(&actor, env.world));
    assert_eq!(pickup.failure(), None);
    drop(env);
    assert!(fx.events.is_empty());
}

#[test]
fn test_attack_on_missing_target_finishes() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(0, 0, 0));
    let mut mission = Mission::attack_target(ActorRef(99));
    let mut env = fx.env();
    mission.start(&mut actor, &mut env);
    assert!(mission.is_finished(&actor, env.world));
    assert_eq!(mission.next_destination(&mut actor, &mut env), Destination::Idle);
    drop(env);
    assert_eq!(
        fx.events,
        vec![WorldEvent::TargetLost {
            actor: actor.id,
            target: ActorRef(99)
        }]
    );
}

#[test]
fn test_attack_maneuvers_inside_preferred_distance() {
    let mut fx = Fixture::new();
    let target = ActorRef(30);
    fx.world.insert_actor(
        target,
        ActorSnapshot {
            position: t(3, 1, 0).center(),
            category: ActorCategory::GroundAgent,
            alive: true,
            docked_in: None,
        },
    );
    let mut actor = agent(t(1, 1, 0));
    let mut mission = Mission::attack_target(target);
    let mut env = fx.env();
    mission.start(&mut actor, &mut env);

    // Two tiles away, inside the default stand-off of four.
    match mission.next_destination(&mut actor, &mut env) {
        Destination::Waypoint(goal) => {
            assert_eq!(goal.tile().manhattan(actor.tile()), 1);
            assert_eq!(goal.tile().z, 0);
        }
        other => panic!("expected a maneuver, got {:?}", other),
    }
    assert!(mission.path().is_none());
}

#[test]
fn test_follow_plans_toward_far_target() {
    let mut fx = Fixture::new();
    let target = ActorRef(30);
    fx.world.insert_actor(
        target,
        ActorSnapshot {
            position: t(7, 0, 0).center(),
            category: ActorCategory::GroundAgent,
            alive: true,
            docked_in: None,
        },
    );
    let mut actor = agent(t(0, 0, 0));
    let mut mission = Mission::follow_target(target);
    let mut env = fx.env();
    mission.start(&mut actor, &mut env);
    assert_eq!(
        mission.next_destination(&mut actor, &mut env),
        Destination::Waypoint(t(6, 0, 0).center())
    );
    assert!(!mission.is_finished(&actor, env.world));
}

#[test]
fn test_land_requires_nearby_pad() {
    let mut fx = Fixture::new();
    fx.world.insert_building(
        BuildingRef(3),
        BuildingInfo::new("port", t(6, 2, 0)).with_pads(vec![t(6, 2, 1)]),
    );
    let mut far = vehicle(t(0, 0, 2));
    let mut refused = Mission::land(BuildingRef(3));
    let mut env = fx.env();
    refused.start(&mut far, &mut env);
    assert_eq!(refused.failure(), Some(MissionFailure::IllegalMove));

    let mut hovering = vehicle(t(6, 2, 2));
    let mut landing = Mission::land(BuildingRef(3));
    landing.start(&mut hovering, &mut env);
    assert_eq!(
        landing.next_destination(&mut hovering, &mut env),
        Destination::Waypoint(t(6, 2, 1).center())
    );
    hovering.place_at(t(6, 2, 1));
    assert_eq!(landing.next_destination(&mut hovering, &mut env), Destination::Idle);
    assert!(landing.is_finished(&hovering, env.world));
    assert_eq!(hovering.docked_in, Some(BuildingRef(3)));
}

#[test]
fn test_crash_falls_to_scenery() {
    let mut fx = Fixture::new();
    let mut actor = vehicle(t(2, 1, 2));
    let mut mission = Mission::crash();
    let mut env = fx.env();
    mission.start(&mut actor, &mut env);
    assert_eq!(
        mission.next_destination(&mut actor, &mut env),
        Destination::Forced(t(2, 1, 1).center())
    );
    actor.place_at(t(2, 1, 1));
    assert_eq!(mission.next_destination(&mut actor, &mut env), Destination::Idle);
    assert!(mission.is_finished(&actor, env.world));
    drop(env);
    assert_eq!(
        fx.events,
        vec![WorldEvent::Crashed {
            actor: actor.id,
            tile: t(2, 1, 1)
        }]
    );
}

#[test]
fn test_patrol_spends_legs() {
    let mut fx = Fixture::new();
    fx.grid = Grid::new(8, 3, 1);
    fx.grid.fill(
        TileRegion::new(t(0, 0, 0), t(7, 2, 0)),
        Some(Scenery::new(SceneryKind::Road)),
    );
    let mut actor = agent(t(0, 0, 0));

    let mut env = fx.env();
    let idle = Mission::patrol(0);
    assert!(idle.is_finished(&actor, env.world));

    let mut mission = Mission::patrol(2);
    mission.start(&mut actor, &mut env);
    match mission.kind() {
        MissionKind::Patrol(patrol) => {
            assert_eq!(patrol.remaining_legs, 1);
            assert!(patrol.leg_goal.is_some());
        }
        other => panic!("unexpected kind {:?}", other),
    }
    assert!(mission.path().is_some());
    assert!(!mission.is_finished(&actor, env.world));
}

#[test]
fn test_retire_reports_vanished_building() {
    let mut fx = Fixture::new();
    let mut actor = agent(t(0, 0, 0));
    let mut mission = Mission::goto_building(B, false);
    {
        let mut env = fx.env();
        mission.start(&mut actor, &mut env);
    }
    fx.world.remove_building(B);
    fx.events.clear();

    let mut env = fx.env();
    assert!(mission.is_finished(&actor, env.world));
    mission.retire(&actor, &mut env);
    drop(env);
    assert_eq!(mission.failure(), Some(MissionFailure::InvalidReference));
    assert_eq!(fx.events.len(), 1);
}

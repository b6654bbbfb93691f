//! Pure navigation and mission logic for Skyway.
//!
//! This crate contains the actor navigation core independent of any ECS,
//! storage, or runtime. Functions take plain data and a `MissionEnv` of
//! borrowed collaborators, so everything here is unit-testable without a
//! running simulation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`actor`] | Actor body, mission environment, actor-level entry points |
//! | [`error`] | Mission failures, traversal refusals, executor errors |
//! | [`events`] | Fire-and-forget notifications for the game-event bus |
//! | [`grid`] | 3-D tile grid, coordinates, scenery, occupancy index |
//! | [`mission`] | Mission state machine (tagged variant over task kinds) |
//! | [`movement`] | Per-tick movement executor and defensive leg check |
//! | [`pathfinding`] | A* search with a bounded `(category, start, goal)` cache |
//! | [`queue`] | Per-actor mission queue: push-front, push-back, flush |
//! | [`stats`] | Per-category speed/ability table and its validation |
//! | [`traversal`] | Traversal policies for ground agents and flying vehicles |
//! | [`world`] | Opaque entity handles and the reference-resolving view |

pub mod actor;
pub mod error;
pub mod events;
pub mod grid;
pub mod mission;
pub mod movement;
pub mod pathfinding;
pub mod queue;
pub mod stats;
pub mod traversal;
pub mod world;

pub use actor::{Actor, ActorBody, MissionEnv};
pub use error::{Blocked, MissionFailure, MoveError};
pub use events::{Target, WorldEvent};
pub use grid::{Grid, Scenery, SceneryKind, TilePosition, TileRegion, WorldPosition};
pub use mission::{Destination, Mission, MissionKind, Transition};
pub use pathfinding::{Path, Pathfinder};
pub use queue::MissionQueue;
pub use stats::{CategoryStats, StatsTable};
pub use world::{ActorCategory, ActorRef, BuildingInfo, BuildingRef, WorldSnapshot, WorldView};

/// Seeded generator for one actor's turn. Depends only on the world seed,
/// the tick and the actor, never on draws made by other actors.
pub fn turn_rng(seed: u64, tick: u64, actor: ActorRef) -> rand::rngs::StdRng {
    use rand::SeedableRng;
    let mixed = seed
        ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ actor.0.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    rand::rngs::StdRng::seed_from_u64(mixed)
}

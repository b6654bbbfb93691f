//! Skyway Core - simulation container for the navigation engine
//!
//! Holds the actors and buildings of one world in a `hecs` registry and
//! drives them in fixed ticks through `skyway-logic`.
//!
//! # Architecture
//!
//! - **Entities**: actors and buildings; their generational handles back
//!   every `ActorRef`/`BuildingRef` a mission holds
//! - **Components**: `skyway_logic::Actor` (body plus mission queue), `Name`,
//!   `Building`, `Disabled`
//! - **Engine**: owns the grid, the shared path cache and the event log, and
//!   rebuilds the reference snapshot missions resolve handles through
//!
//! # Example
//!
//! ```rust,no_run
//! use skyway_core::prelude::*;
//! use skyway_logic::{ActorCategory, BuildingInfo, Grid, Mission, StatsTable, TilePosition};
//!
//! let mut engine = SimulationEngine::new(Grid::new(32, 32, 8), StatsTable::default(), EngineConfig::default());
//! let depot = engine.spawn_building(BuildingInfo::new("depot", TilePosition::new(4, 4, 0)));
//! let agent = engine
//!     .spawn_actor(ActorSpawn::new("Wren", ActorCategory::GroundAgent, TilePosition::new(0, 0, 0), 1.0))
//!     .unwrap();
//! engine.add_mission(agent, Mission::goto_building(depot, false), false).unwrap();
//!
//! loop {
//!     engine.update(1);
//!     for logged in engine.drain_events() {
//!         println!("{}: {:?}", logged.tick, logged.event);
//!     }
//! }
//! ```

pub mod components;
pub mod engine;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{ActorSpawn, EngineConfig, EngineError, LoggedEvent, SimulationEngine};
    pub use crate::persistence::SaveError;
}

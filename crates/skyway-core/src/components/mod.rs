//! Component definitions for the ECS registry.
//!
//! Actors carry `skyway_logic::Actor` (body plus mission queue) and a
//! `Name`; buildings carry `Building`. Behaviour lives in the engine and
//! the logic crate.

mod common;

pub use common::*;

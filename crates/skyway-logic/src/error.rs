//! Failure kinds recovered inside the engine.
//!
//! None of these escape a tick. A mission records its `MissionFailure` when
//! cancelled and the reason rides along on the notification it emits.

use serde::{Deserialize, Serialize};

use crate::grid::TilePosition;

/// Why a mission was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionFailure {
    /// No path within the expansion budget.
    PlanningFailure,
    /// The target building or actor no longer exists.
    InvalidReference,
    /// A step was refused by the traversal policy or failed a precondition
    /// (e.g. taking off away from any pad).
    IllegalMove,
    /// Waited past the maximum duration.
    Timeout,
}

impl std::fmt::Display for MissionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionFailure::PlanningFailure => write!(f, "no path within search budget"),
            MissionFailure::InvalidReference => write!(f, "target no longer exists"),
            MissionFailure::IllegalMove => write!(f, "move refused"),
            MissionFailure::Timeout => write!(f, "timed out"),
        }
    }
}

impl std::error::Error for MissionFailure {}

/// Why a traversal policy refused a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Blocked {
    OutOfBounds,
    /// More than one axis changed, or a jump longer than one cell.
    NotAdjacent,
    /// Nothing to stand on at one of the endpoints.
    NoFooting,
    /// Vertical move without a junction above.
    SolidFloor,
    /// Another vehicle holds the destination cell.
    Occupied,
    BlockingScenery,
    OutsideAltitudeBand,
}

impl std::fmt::Display for Blocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Blocked::OutOfBounds => "out of bounds",
            Blocked::NotAdjacent => "cells are not adjacent",
            Blocked::NoFooting => "no footing",
            Blocked::SolidFloor => "solid floor without vertical access",
            Blocked::Occupied => "cell occupied",
            Blocked::BlockingScenery => "blocked by scenery",
            Blocked::OutsideAltitudeBand => "outside altitude band",
        };
        f.write_str(text)
    }
}

impl std::error::Error for Blocked {}

/// Defensive executor check: a leg the policy would never have offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    IllegalMove {
        from: TilePosition,
        to: TilePosition,
        reason: Blocked,
    },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveError::IllegalMove { from, to, reason } => write!(
                f,
                "illegal move ({}, {}, {}) -> ({}, {}, {}): {}",
                from.x, from.y, from.z, to.x, to.y, to.z, reason
            ),
        }
    }
}

impl std::error::Error for MoveError {}

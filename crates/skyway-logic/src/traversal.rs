//! Per-category movement rules between adjacent tiles.
//!
//! A policy answers "may an actor of this kind step from A to B, and what
//! does it cost". Policies are pure reads of the grid at call time, so the
//! answer changes when the grid does.
//!
//! Rules shared by every category:
//! - exactly one axis changes, by exactly one cell
//! - both endpoints are in bounds
//!
//! Costs are integer thousandths of a step so the search stays exact.

use crate::error::Blocked;
use crate::grid::{Grid, TilePosition};
use crate::stats::AltitudeBand;
use crate::world::ActorCategory;

/// Search cost in thousandths of a step.
pub type Cost = u32;

/// Cost of one ordinary step.
pub const STEP_COST: Cost = 1000;

/// Discount for stepping into the preferred level/altitude.
pub const PREFERRED_BAND_BONUS: Cost = 100;

/// Cheapest possible step; the heuristic scales by this so it never overestimates.
pub const MIN_STEP_COST: Cost = STEP_COST - PREFERRED_BAND_BONUS;

pub trait TraversalPolicy {
    /// Category whose path cache entries this policy produces.
    fn category(&self) -> ActorCategory;

    /// Whether an actor of this kind can occupy `tile` at all.
    fn can_stand(&self, grid: &Grid, tile: TilePosition) -> bool;

    fn can_enter(&self, grid: &Grid, from: TilePosition, to: TilePosition) -> Result<Cost, Blocked>;

    /// Cost of the step, or `None` if it is refused.
    fn cost(&self, grid: &Grid, from: TilePosition, to: TilePosition) -> Option<Cost> {
        self.can_enter(grid, from, to).ok()
    }

    /// Lower bound on the cost from `from` to `goal`.
    fn heuristic(&self, from: TilePosition, goal: TilePosition) -> Cost {
        from.manhattan(goal).saturating_mul(MIN_STEP_COST)
    }
}

fn check_step(grid: &Grid, from: TilePosition, to: TilePosition) -> Result<(), Blocked> {
    if !grid.in_bounds(from) || !grid.in_bounds(to) {
        return Err(Blocked::OutOfBounds);
    }
    if from.manhattan(to) != 1 {
        return Err(Blocked::NotAdjacent);
    }
    Ok(())
}

fn biased(to_level: i32, preferred: Option<i32>) -> Cost {
    if preferred == Some(to_level) {
        STEP_COST - PREFERRED_BAND_BONUS
    } else {
        STEP_COST
    }
}

// ============================================================================
// GROUND AGENTS
// ============================================================================

/// Agents walk on any non-wall scenery and change level only through a
/// junction: the upper cell of a vertical step must be vertical access,
/// otherwise the move would phase through a solid floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroundPolicy {
    pub preferred_level: Option<i32>,
}

impl TraversalPolicy for GroundPolicy {
    fn category(&self) -> ActorCategory {
        ActorCategory::GroundAgent
    }

    fn can_stand(&self, grid: &Grid, tile: TilePosition) -> bool {
        grid.scenery_kind(tile).is_some_and(|k| k.is_walkable())
    }

    fn can_enter(&self, grid: &Grid, from: TilePosition, to: TilePosition) -> Result<Cost, Blocked> {
        check_step(grid, from, to)?;

        if !self.can_stand(grid, from) {
            return Err(Blocked::NoFooting);
        }
        match grid.scenery_kind(to) {
            None => return Err(Blocked::NoFooting),
            Some(kind) if !kind.is_walkable() => return Err(Blocked::BlockingScenery),
            Some(_) => {}
        }

        if from.z != to.z {
            let upper = if to.z > from.z { to } else { from };
            if !grid.scenery_kind(upper).is_some_and(|k| k.is_vertical_access()) {
                return Err(Blocked::SolidFloor);
            }
        }

        Ok(biased(to.z, self.preferred_level))
    }
}

// ============================================================================
// FLYING VEHICLES
// ============================================================================

/// Vehicles fly through empty cells. Scenery blocks them except landing
/// pads; a cell holding another vehicle is refused. Horizontal flight must
/// stay inside the altitude band; climbing and descending are not limited
/// by it so vehicles can reach low pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlyingPolicy {
    pub band: AltitudeBand,
}

impl TraversalPolicy for FlyingPolicy {
    fn category(&self) -> ActorCategory {
        ActorCategory::FlyingVehicle
    }

    fn can_stand(&self, grid: &Grid, tile: TilePosition) -> bool {
        grid.in_bounds(tile)
            && grid
                .scenery_kind(tile)
                .map_or(true, |k| k.admits_flyers())
    }

    fn can_enter(&self, grid: &Grid, from: TilePosition, to: TilePosition) -> Result<Cost, Blocked> {
        check_step(grid, from, to)?;

        let into_pad = match grid.scenery_kind(to) {
            None => false,
            Some(kind) if kind.admits_flyers() => true,
            Some(_) => return Err(Blocked::BlockingScenery),
        };

        if grid.vehicles_at(to) > 0 {
            return Err(Blocked::Occupied);
        }

        if from.z == to.z && !into_pad && !self.band.contains(to.z) {
            return Err(Blocked::OutsideAltitudeBand);
        }

        Ok(biased(to.z, self.band.preferred))
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Closed set of policies, one per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryPolicy {
    Ground(GroundPolicy),
    Flying(FlyingPolicy),
}

impl TraversalPolicy for CategoryPolicy {
    fn category(&self) -> ActorCategory {
        match self {
            Self::Ground(p) => p.category(),
            Self::Flying(p) => p.category(),
        }
    }

    fn can_stand(&self, grid: &Grid, tile: TilePosition) -> bool {
        match self {
            Self::Ground(p) => p.can_stand(grid, tile),
            Self::Flying(p) => p.can_stand(grid, tile),
        }
    }

    fn can_enter(&self, grid: &Grid, from: TilePosition, to: TilePosition) -> Result<Cost, Blocked> {
        match self {
            Self::Ground(p) => p.can_enter(grid, from, to),
            Self::Flying(p) => p.can_enter(grid, from, to),
        }
    }
}

//! Three-dimensional tile grid: coordinates, scenery, occupancy.
//!
//! The grid is the read interface every traversal policy consults. Actor
//! positions are authoritative; the per-tile vehicle/agent counts are a
//! derived index the engine keeps in sync after each actor moves.

use serde::{Deserialize, Serialize};

use crate::world::{ActorCategory, BuildingRef};

// ============================================================================
// COORDINATES
// ============================================================================

/// Integer cell coordinate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePosition {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn above(self) -> Self {
        self.offset(0, 0, 1)
    }

    pub const fn below(self) -> Self {
        self.offset(0, 0, -1)
    }

    /// Continuous position of the cell's center.
    pub fn center(self) -> WorldPosition {
        WorldPosition::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        )
    }

    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)
    }

    /// Number of axes on which the two cells differ.
    pub fn changed_axes(self, other: Self) -> usize {
        [self.x != other.x, self.y != other.y, self.z != other.z]
            .iter()
            .filter(|changed| **changed)
            .count()
    }

    /// The six face neighbours in fixed order: +x, -x, +y, -y, +z, -z.
    /// Search results depend on this order staying stable.
    pub fn neighbors(self) -> [Self; 6] {
        [
            self.offset(1, 0, 0),
            self.offset(-1, 0, 0),
            self.offset(0, 1, 0),
            self.offset(0, -1, 0),
            self.offset(0, 0, 1),
            self.offset(0, 0, -1),
        ]
    }

    /// Unit step from `self` toward `other` on each axis (-1, 0 or 1).
    pub fn step_toward(self, other: Self) -> (i32, i32, i32) {
        (
            (other.x - self.x).signum(),
            (other.y - self.y).signum(),
            (other.z - self.z).signum(),
        )
    }
}

/// Continuous sub-tile position. `tile()` is the containing cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPosition {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn tile(&self) -> TilePosition {
        TilePosition::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len)
        } else {
            Self::ZERO
        }
    }
}

impl std::ops::Add for WorldPosition {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for WorldPosition {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Mul<f32> for WorldPosition {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// Inclusive axis-aligned box of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRegion {
    pub min: TilePosition,
    pub max: TilePosition,
}

impl TileRegion {
    pub fn new(a: TilePosition, b: TilePosition) -> Self {
        Self {
            min: TilePosition::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: TilePosition::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn single(tile: TilePosition) -> Self {
        Self::new(tile, tile)
    }

    /// Cube of cells within `radius` of `tile` on every axis.
    pub fn around(tile: TilePosition, radius: i32) -> Self {
        Self::new(
            tile.offset(-radius, -radius, -radius),
            tile.offset(radius, radius, radius),
        )
    }

    pub fn contains(&self, tile: TilePosition) -> bool {
        (self.min.x..=self.max.x).contains(&tile.x)
            && (self.min.y..=self.max.y).contains(&tile.y)
            && (self.min.z..=self.max.z).contains(&tile.z)
    }

    /// Smallest region covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: TilePosition::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: TilePosition::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }
}

// ============================================================================
// TILE CONTENTS
// ============================================================================

/// What kind of structure occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneryKind {
    /// Streets and open ground.
    Road,
    /// Interior floor of a structure.
    Floor,
    /// Vertical access point: lift shaft, stairwell, tube junction.
    Junction,
    /// Pad a flying vehicle may descend onto and dock at.
    LandingPad,
    /// Solid structure; blocks everything.
    Wall,
}

impl SceneryKind {
    /// Whether a ground agent can stand on this scenery.
    pub fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall)
    }

    /// Whether this scenery lets agents move between levels.
    pub fn is_vertical_access(self) -> bool {
        matches!(self, Self::Junction)
    }

    /// Whether a flying vehicle may enter a cell holding this scenery.
    pub fn admits_flyers(self) -> bool {
        matches!(self, Self::LandingPad)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenery {
    pub kind: SceneryKind,
    /// Building this piece of scenery belongs to, if any.
    pub building: Option<BuildingRef>,
}

impl Scenery {
    pub const fn new(kind: SceneryKind) -> Self {
        Self {
            kind,
            building: None,
        }
    }

    pub const fn owned_by(kind: SceneryKind, building: BuildingRef) -> Self {
        Self {
            kind,
            building: Some(building),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub scenery: Option<Scenery>,
    /// Flying vehicles currently in this cell (undocked only).
    pub vehicles: u16,
    /// Ground agents currently in this cell (undocked only).
    pub agents: u16,
}

// ============================================================================
// GRID
// ============================================================================

/// Dense x-major tile storage with a revision counter that moves whenever
/// traversability changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    size: TilePosition,
    tiles: Vec<Tile>,
    revision: u64,
}

impl Grid {
    /// Empty grid of `size_x * size_y * size_z` cells. Negative sizes clamp to 0.
    pub fn new(size_x: i32, size_y: i32, size_z: i32) -> Self {
        let size = TilePosition::new(size_x.max(0), size_y.max(0), size_z.max(0));
        let count = size.x as usize * size.y as usize * size.z as usize;
        Self {
            size,
            tiles: vec![Tile::default(); count],
            revision: 0,
        }
    }

    pub fn size(&self) -> TilePosition {
        self.size
    }

    pub fn bounds(&self) -> TileRegion {
        TileRegion::new(
            TilePosition::new(0, 0, 0),
            self.size.offset(-1, -1, -1),
        )
    }

    pub fn in_bounds(&self, tile: TilePosition) -> bool {
        (0..self.size.x).contains(&tile.x)
            && (0..self.size.y).contains(&tile.y)
            && (0..self.size.z).contains(&tile.z)
    }

    fn index(&self, tile: TilePosition) -> Option<usize> {
        if !self.in_bounds(tile) {
            return None;
        }
        let (sx, sy) = (self.size.x as usize, self.size.y as usize);
        Some(tile.z as usize * sx * sy + tile.y as usize * sx + tile.x as usize)
    }

    pub fn tile(&self, tile: TilePosition) -> Option<&Tile> {
        self.index(tile).and_then(|i| self.tiles.get(i))
    }

    fn tile_mut(&mut self, tile: TilePosition) -> Option<&mut Tile> {
        self.index(tile).and_then(move |i| self.tiles.get_mut(i))
    }

    pub fn scenery(&self, tile: TilePosition) -> Option<&Scenery> {
        self.tile(tile).and_then(|t| t.scenery.as_ref())
    }

    pub fn scenery_kind(&self, tile: TilePosition) -> Option<SceneryKind> {
        self.scenery(tile).map(|s| s.kind)
    }

    /// Replace a cell's scenery. Returns false if the cell is out of bounds.
    pub fn set_scenery(&mut self, tile: TilePosition, scenery: Option<Scenery>) -> bool {
        let Some(cell) = self.tile_mut(tile) else {
            return false;
        };
        if cell.scenery != scenery {
            cell.scenery = scenery;
            self.revision += 1;
        }
        true
    }

    /// Set every in-bounds cell of `region` to `scenery`.
    pub fn fill(&mut self, region: TileRegion, scenery: Option<Scenery>) {
        for z in region.min.z..=region.max.z {
            for y in region.min.y..=region.max.y {
                for x in region.min.x..=region.max.x {
                    self.set_scenery(TilePosition::new(x, y, z), scenery);
                }
            }
        }
    }

    /// Bumped on every scenery change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn vehicles_at(&self, tile: TilePosition) -> u16 {
        self.tile(tile).map_or(0, |t| t.vehicles)
    }

    pub fn agents_at(&self, tile: TilePosition) -> u16 {
        self.tile(tile).map_or(0, |t| t.agents)
    }

    pub fn add_occupant(&mut self, tile: TilePosition, category: ActorCategory) {
        if let Some(cell) = self.tile_mut(tile) {
            match category {
                ActorCategory::FlyingVehicle => cell.vehicles = cell.vehicles.saturating_add(1),
                ActorCategory::GroundAgent => cell.agents = cell.agents.saturating_add(1),
            }
        }
    }

    pub fn remove_occupant(&mut self, tile: TilePosition, category: ActorCategory) {
        if let Some(cell) = self.tile_mut(tile) {
            match category {
                ActorCategory::FlyingVehicle => cell.vehicles = cell.vehicles.saturating_sub(1),
                ActorCategory::GroundAgent => cell.agents = cell.agents.saturating_sub(1),
            }
        }
    }

    /// In-bounds face neighbours of `tile`, in `TilePosition::neighbors` order.
    pub fn neighbors(&self, tile: TilePosition) -> impl Iterator<Item = TilePosition> + '_ {
        tile.neighbors()
            .into_iter()
            .filter(move |n| self.in_bounds(*n))
    }

    /// Every cell whose scenery belongs to `building`.
    pub fn tiles_owned_by(&self, building: BuildingRef) -> Vec<TilePosition> {
        let mut owned = Vec::new();
        for z in 0..self.size.z {
            for y in 0..self.size.y {
                for x in 0..self.size.x {
                    let tile = TilePosition::new(x, y, z);
                    if self.scenery(tile).and_then(|s| s.building) == Some(building) {
                        owned.push(tile);
                    }
                }
            }
        }
        owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_floors_back_to_tile() {
        let tile = TilePosition::new(3, -2, 7);
        assert_eq!(tile.center().tile(), tile);
    }

    #[test]
    fn test_manhattan_and_axes() {
        let a = TilePosition::new(0, 0, 0);
        assert_eq!(a.manhattan(TilePosition::new(2, -1, 3)), 6);
        assert_eq!(a.changed_axes(TilePosition::new(0, 4, 0)), 1);
        assert_eq!(a.changed_axes(TilePosition::new(1, 1, 0)), 2);
    }

    #[test]
    fn test_bounds_and_neighbors() {
        let grid = Grid::new(2, 2, 1);
        assert!(grid.in_bounds(TilePosition::new(1, 1, 0)));
        assert!(!grid.in_bounds(TilePosition::new(2, 0, 0)));
        assert!(!grid.in_bounds(TilePosition::new(0, 0, -1)));
        let n: Vec<_> = grid.neighbors(TilePosition::new(0, 0, 0)).collect();
        assert_eq!(n, vec![TilePosition::new(1, 0, 0), TilePosition::new(0, 1, 0)]);
    }

    #[test]
    fn test_set_scenery_bumps_revision_only_on_change() {
        let mut grid = Grid::new(3, 1, 1);
        let road = Some(Scenery::new(SceneryKind::Road));
        assert!(grid.set_scenery(TilePosition::new(1, 0, 0), road));
        assert_eq!(grid.revision(), 1);
        grid.set_scenery(TilePosition::new(1, 0, 0), road);
        assert_eq!(grid.revision(), 1);
        assert!(!grid.set_scenery(TilePosition::new(9, 0, 0), road));
    }

    #[test]
    fn test_occupancy_counts() {
        let mut grid = Grid::new(1, 1, 1);
        let t = TilePosition::new(0, 0, 0);
        grid.add_occupant(t, ActorCategory::FlyingVehicle);
        grid.add_occupant(t, ActorCategory::GroundAgent);
        assert_eq!(grid.vehicles_at(t), 1);
        assert_eq!(grid.agents_at(t), 1);
        grid.remove_occupant(t, ActorCategory::FlyingVehicle);
        grid.remove_occupant(t, ActorCategory::FlyingVehicle);
        assert_eq!(grid.vehicles_at(t), 0);
    }

    #[test]
    fn test_region_contains_and_union() {
        let r = TileRegion::around(TilePosition::new(5, 5, 5), 1);
        assert!(r.contains(TilePosition::new(4, 6, 5)));
        assert!(!r.contains(TilePosition::new(3, 5, 5)));
        let u = r.union(&TileRegion::single(TilePosition::new(0, 0, 0)));
        assert!(u.contains(TilePosition::new(2, 2, 2)));
    }
}

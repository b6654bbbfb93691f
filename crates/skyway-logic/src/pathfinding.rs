//! Best-first search over the tile grid with a bounded path cache.
//!
//! `Pathfinder` runs A* gated by a `TraversalPolicy` and memoises successful
//! searches under `(category, start, goal)`. Cache hits hand out the cached
//! steps by shared reference; failed searches are never cached so a later
//! call can retry after the grid changes.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, TilePosition, TileRegion};
use crate::traversal::{Cost, TraversalPolicy, MIN_STEP_COST};
use crate::world::ActorCategory;

/// Default number of cached paths.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

// ============================================================================
// PATH
// ============================================================================

/// Ordered tiles from start (front) to destination (back), consumed from
/// the front. Steps may be shared with the cache; consumption only moves a
/// cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    steps: Arc<[TilePosition]>,
    cursor: usize,
}

impl Path {
    pub fn new(steps: Vec<TilePosition>) -> Self {
        Self {
            steps: steps.into(),
            cursor: 0,
        }
    }

    /// "Already there".
    pub fn single(tile: TilePosition) -> Self {
        Self::new(vec![tile])
    }

    fn shared(steps: &Arc<[TilePosition]>) -> Self {
        Self {
            steps: Arc::clone(steps),
            cursor: 0,
        }
    }

    /// All steps, including consumed ones.
    pub fn steps(&self) -> &[TilePosition] {
        &self.steps
    }

    pub fn remaining(&self) -> &[TilePosition] {
        self.steps.get(self.cursor..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.remaining().len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining().is_empty()
    }

    pub fn front(&self) -> Option<TilePosition> {
        self.remaining().first().copied()
    }

    /// Final tile; unaffected by consumption.
    pub fn destination(&self) -> Option<TilePosition> {
        self.steps.last().copied()
    }

    pub fn pop_front(&mut self) -> Option<TilePosition> {
        let next = self.front()?;
        self.cursor += 1;
        Some(next)
    }

    /// Drop every remaining step.
    pub fn clear(&mut self) {
        self.cursor = self.steps.len();
    }

    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.steps, &other.steps)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.remaining() == other.remaining()
    }
}

// ============================================================================
// CACHE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathCacheKey {
    pub category: ActorCategory,
    pub start: TilePosition,
    pub goal: TilePosition,
}

/// Running counters, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathfinderStats {
    pub searches: u64,
    pub cache_hits: u64,
    pub failures: u64,
    pub invalidated: u64,
}

/// Frontier entry. Ordered so the max-heap pops the lowest estimate first,
/// and among equal estimates the one discovered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    estimate: Cost,
    seq: u64,
    tile: TilePosition,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* search with a FIFO-bounded path cache.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    cache: HashMap<PathCacheKey, Arc<[TilePosition]>>,
    /// Insertion order, oldest first; drives eviction.
    order: VecDeque<PathCacheKey>,
    capacity: usize,
    stats: PathfinderStats,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Pathfinder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Pathfinder caching at most `capacity` paths (0 disables caching).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            stats: PathfinderStats::default(),
        }
    }

    /// Find a path from `start` to `goal`.
    ///
    /// Returns a single-tile path if `start == goal`, and `None` if either
    /// end is out of bounds or the goal is not reached within
    /// `max_expansions` node expansions.
    pub fn find_path<P: TraversalPolicy + ?Sized>(
        &mut self,
        grid: &Grid,
        start: TilePosition,
        goal: TilePosition,
        policy: &P,
        max_expansions: usize,
    ) -> Option<Path> {
        if !grid.in_bounds(start) || !grid.in_bounds(goal) {
            return None;
        }
        if start == goal {
            return Some(Path::single(start));
        }

        let key = PathCacheKey {
            category: policy.category(),
            start,
            goal,
        };
        if let Some(cached) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            return Some(Path::shared(cached));
        }

        let steps = self.search(grid, start, goal, 0, policy, max_expansions)?;
        let steps: Arc<[TilePosition]> = steps.into();
        self.insert(key, Arc::clone(&steps));
        Some(Path::shared(&steps))
    }

    /// Find a path to any tile within `within` steps (Manhattan) of `goal`
    /// that the actor can stand on. Used for moving targets; never cached.
    pub fn find_path_near<P: TraversalPolicy + ?Sized>(
        &mut self,
        grid: &Grid,
        start: TilePosition,
        goal: TilePosition,
        within: u32,
        policy: &P,
        max_expansions: usize,
    ) -> Option<Path> {
        if !grid.in_bounds(start) {
            return None;
        }
        if start.manhattan(goal) <= within {
            return Some(Path::single(start));
        }
        self.search(grid, start, goal, within, policy, max_expansions)
            .map(Path::new)
    }

    fn search<P: TraversalPolicy + ?Sized>(
        &mut self,
        grid: &Grid,
        start: TilePosition,
        goal: TilePosition,
        within: u32,
        policy: &P,
        max_expansions: usize,
    ) -> Option<Vec<TilePosition>> {
        self.stats.searches += 1;

        let accepts = |tile: TilePosition| {
            if within == 0 {
                tile == goal
            } else {
                tile.manhattan(goal) <= within && policy.can_stand(grid, tile)
            }
        };
        let slack = within.saturating_mul(MIN_STEP_COST);
        let estimate = |tile: TilePosition| policy.heuristic(tile, goal).saturating_sub(slack);

        let mut open = BinaryHeap::new();
        let mut best: HashMap<TilePosition, Cost> = HashMap::new();
        let mut came_from: HashMap<TilePosition, TilePosition> = HashMap::new();
        let mut closed: HashSet<TilePosition> = HashSet::new();
        let mut seq = 0u64;
        let mut expansions = 0usize;

        best.insert(start, 0);
        open.push(Frontier {
            estimate: estimate(start),
            seq,
            tile: start,
        });

        while let Some(Frontier { tile, .. }) = open.pop() {
            if !closed.insert(tile) {
                continue;
            }
            if accepts(tile) {
                let mut path = vec![tile];
                let mut node = tile;
                while let Some(&prev) = came_from.get(&node) {
                    path.push(prev);
                    node = prev;
                }
                path.reverse();
                return Some(path);
            }
            if expansions >= max_expansions {
                break;
            }
            expansions += 1;

            let base = best.get(&tile).copied().unwrap_or(0);
            for next in grid.neighbors(tile) {
                if closed.contains(&next) {
                    continue;
                }
                let Ok(step) = policy.can_enter(grid, tile, next) else {
                    continue;
                };
                let cost = base.saturating_add(step);
                if best.get(&next).map_or(true, |&known| cost < known) {
                    best.insert(next, cost);
                    came_from.insert(next, tile);
                    seq += 1;
                    open.push(Frontier {
                        estimate: cost.saturating_add(estimate(next)),
                        seq,
                        tile: next,
                    });
                }
            }
        }

        self.stats.failures += 1;
        log::debug!(
            "no path ({}, {}, {}) -> ({}, {}, {}) for {:?} after {} expansions",
            start.x,
            start.y,
            start.z,
            goal.x,
            goal.y,
            goal.z,
            policy.category(),
            expansions
        );
        None
    }

    fn insert(&mut self, key: PathCacheKey, steps: Arc<[TilePosition]>) {
        if self.capacity == 0 {
            return;
        }
        while self.cache.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.cache.remove(&oldest);
        }
        if self.cache.insert(key, steps).is_none() {
            self.order.push_back(key);
        }
    }

    /// Drop every cached path that starts, ends, or passes through `region`.
    /// Returns how many entries were removed.
    pub fn invalidate(&mut self, region: &TileRegion) -> usize {
        let before = self.cache.len();
        self.cache
            .retain(|_, steps| !steps.iter().any(|tile| region.contains(*tile)));
        let cache = &self.cache;
        self.order.retain(|key| cache.contains_key(key));
        let removed = before - self.cache.len();
        self.stats.invalidated += removed as u64;
        removed
    }

    /// Cached steps for a key, if present.
    pub fn cached(&self, key: &PathCacheKey) -> Option<&[TilePosition]> {
        self.cache.get(key).map(|steps| &steps[..])
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.order.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> PathfinderStats {
        self.stats
    }
}

//! Per-category speed and ability table.
//!
//! Loaded by the config subsystem (the harness reads it from JSON) and
//! consumed read-only by missions and the movement executor.

use serde::{Deserialize, Serialize};

use crate::traversal::{CategoryPolicy, FlyingPolicy, GroundPolicy};
use crate::world::ActorCategory;

/// How closely an actor presses an attack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackPosture {
    /// Closes in to a fraction of the preferred distance.
    Aggressive,
    #[default]
    Normal,
    /// Hangs back beyond the preferred distance.
    Cautious,
}

/// Altitude limits for flying categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltitudeBand {
    pub min: i32,
    pub max: i32,
    /// Level the pathfinder is nudged toward.
    pub preferred: Option<i32>,
}

impl AltitudeBand {
    pub fn contains(&self, z: i32) -> bool {
        (self.min..=self.max).contains(&z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Multiplier applied to an actor's own speed (tiles per tick).
    pub speed_scale: f32,
    pub can_teleport: bool,
    /// Ticks of accrued readiness before a teleport is allowed.
    pub teleport_ready_ticks: u32,
    /// Attack stand-off distance in tiles at `AttackPosture::Normal`.
    pub preferred_attack_distance: f32,
    pub follow_distance: f32,
    pub aggressive_factor: f32,
    pub cautious_factor: f32,
    /// Candidate offsets evaluated per maneuver.
    pub maneuver_samples: u32,
    /// Pathfinder expansion ceiling.
    pub max_path_expansions: usize,
    /// Random destinations tried per patrol leg.
    pub patrol_sample_attempts: u32,
    /// Ticks spent hailing transport before walking instead.
    pub pickup_hail_ticks: u32,
    /// Longest a hailed pickup is awaited before giving up.
    pub pickup_max_wait: u32,
    /// Preferred level for ground agents, if any.
    pub preferred_level: Option<i32>,
    pub altitude: Option<AltitudeBand>,
}

impl CategoryStats {
    pub fn ground_default() -> Self {
        Self {
            speed_scale: 1.0,
            can_teleport: false,
            teleport_ready_ticks: 0,
            preferred_attack_distance: 4.0,
            follow_distance: 2.0,
            aggressive_factor: 0.5,
            cautious_factor: 1.5,
            maneuver_samples: 6,
            max_path_expansions: 4096,
            patrol_sample_attempts: 8,
            pickup_hail_ticks: 2,
            pickup_max_wait: 20,
            preferred_level: None,
            altitude: None,
        }
    }

    pub fn flying_default() -> Self {
        Self {
            speed_scale: 1.0,
            can_teleport: false,
            teleport_ready_ticks: 0,
            preferred_attack_distance: 6.0,
            follow_distance: 3.0,
            aggressive_factor: 0.5,
            cautious_factor: 1.5,
            maneuver_samples: 8,
            max_path_expansions: 8192,
            patrol_sample_attempts: 8,
            pickup_hail_ticks: 0,
            pickup_max_wait: 0,
            preferred_level: None,
            altitude: Some(AltitudeBand {
                min: 2,
                max: 8,
                preferred: Some(4),
            }),
        }
    }

    /// Attack stand-off distance, narrowed for aggressive postures.
    pub fn preferred_distance(&self, posture: AttackPosture) -> f32 {
        let factor = match posture {
            AttackPosture::Aggressive => self.aggressive_factor,
            AttackPosture::Normal => 1.0,
            AttackPosture::Cautious => self.cautious_factor,
        };
        self.preferred_attack_distance * factor
    }

    /// Whether teleport readiness has fully accrued.
    pub fn teleport_ready(&self, charge: u32) -> bool {
        self.can_teleport && charge >= self.teleport_ready_ticks
    }
}

/// One stats row per actor category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsTable {
    pub ground: CategoryStats,
    pub flying: CategoryStats,
}

impl Default for StatsTable {
    fn default() -> Self {
        Self {
            ground: CategoryStats::ground_default(),
            flying: CategoryStats::flying_default(),
        }
    }
}

impl StatsTable {
    pub fn get(&self, category: ActorCategory) -> &CategoryStats {
        match category {
            ActorCategory::GroundAgent => &self.ground,
            ActorCategory::FlyingVehicle => &self.flying,
        }
    }

    pub fn get_mut(&mut self, category: ActorCategory) -> &mut CategoryStats {
        match category {
            ActorCategory::GroundAgent => &mut self.ground,
            ActorCategory::FlyingVehicle => &mut self.flying,
        }
    }

    /// Traversal policy for a category, parameterised from its stats row.
    pub fn policy(&self, category: ActorCategory) -> CategoryPolicy {
        let stats = self.get(category);
        match category {
            ActorCategory::GroundAgent => CategoryPolicy::Ground(GroundPolicy {
                preferred_level: stats.preferred_level,
            }),
            ActorCategory::FlyingVehicle => {
                let band = stats.altitude.unwrap_or(AltitudeBand {
                    min: 0,
                    max: i32::MAX,
                    preferred: None,
                });
                CategoryPolicy::Flying(FlyingPolicy { band })
            }
        }
    }
}

/// Stats table validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveSpeed(ActorCategory, f32),
    NegativeDistance(ActorCategory, f32),
    /// Aggressive must not exceed 1.0, cautious must not fall below it.
    PostureFactorsInverted(ActorCategory),
    ZeroExpansionBudget(ActorCategory),
    EmptyAltitudeBand(ActorCategory),
    /// Flying row without an altitude band.
    MissingAltitudeBand,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NonPositiveSpeed(c, v) => write!(f, "{:?}: speed_scale {} <= 0", c, v),
            ConfigError::NegativeDistance(c, v) => write!(f, "{:?}: negative distance {}", c, v),
            ConfigError::PostureFactorsInverted(c) => {
                write!(f, "{:?}: posture factors out of order", c)
            }
            ConfigError::ZeroExpansionBudget(c) => write!(f, "{:?}: max_path_expansions is 0", c),
            ConfigError::EmptyAltitudeBand(c) => write!(f, "{:?}: altitude band min > max", c),
            ConfigError::MissingAltitudeBand => write!(f, "flying stats need an altitude band"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate a stats table, returning all errors found.
pub fn validate_stats(table: &StatsTable) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    for category in [ActorCategory::GroundAgent, ActorCategory::FlyingVehicle] {
        let stats = table.get(category);
        if stats.speed_scale <= 0.0 {
            errors.push(ConfigError::NonPositiveSpeed(category, stats.speed_scale));
        }
        for distance in [stats.preferred_attack_distance, stats.follow_distance] {
            if distance < 0.0 {
                errors.push(ConfigError::NegativeDistance(category, distance));
            }
        }
        if stats.aggressive_factor > 1.0 || stats.cautious_factor < 1.0 {
            errors.push(ConfigError::PostureFactorsInverted(category));
        }
        if stats.max_path_expansions == 0 {
            errors.push(ConfigError::ZeroExpansionBudget(category));
        }
        if let Some(band) = stats.altitude {
            if band.min > band.max {
                errors.push(ConfigError::EmptyAltitudeBand(category));
            }
        }
    }

    if table.flying.altitude.is_none() {
        errors.push(ConfigError::MissingAltitudeBand);
    }

    errors
}

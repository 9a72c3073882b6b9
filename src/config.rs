//! Simulation tuning
//!
//! Device-class tuning is resolved once into a `SimulationConfig` at round
//! start; nothing in the engine sniffs the environment afterwards.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Device class the round is tuned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeviceProfile {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceProfile::Desktop => "Desktop",
            DeviceProfile::Tablet => "Tablet",
            DeviceProfile::Mobile => "Mobile",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "desktop" | "pc" => Some(DeviceProfile::Desktop),
            "tablet" => Some(DeviceProfile::Tablet),
            "mobile" | "phone" => Some(DeviceProfile::Mobile),
            _ => None,
        }
    }

    /// Classify a browser user agent string
    pub fn from_user_agent(ua: &str) -> Self {
        let ua = ua.to_lowercase();
        let android = ua.contains("android");
        if ua.contains("ipad")
            || ua.contains("tablet")
            || ua.contains("kindle")
            || ua.contains("silk")
            || (android && !ua.contains("mobi"))
        {
            DeviceProfile::Tablet
        } else if android || ["mobile", "iphone", "ipod"].iter().any(|k| ua.contains(k)) {
            DeviceProfile::Mobile
        } else {
            DeviceProfile::Desktop
        }
    }

    /// Constrained devices get fewer entities
    pub fn reward_count(&self) -> usize {
        match self {
            DeviceProfile::Desktop => 13,
            DeviceProfile::Tablet | DeviceProfile::Mobile => 9,
        }
    }

    pub fn hazard_count(&self) -> usize {
        match self {
            DeviceProfile::Desktop => 9,
            DeviceProfile::Tablet | DeviceProfile::Mobile => 6,
        }
    }

    /// Hazard base speed (px/tick); touch devices play on smaller arenas
    pub fn base_speed(&self) -> f32 {
        match self {
            DeviceProfile::Desktop => 1.5,
            DeviceProfile::Tablet | DeviceProfile::Mobile => 1.9,
        }
    }

    /// Default round length in seconds
    pub fn round_duration_secs(&self) -> f32 {
        match self {
            DeviceProfile::Desktop => 15.0,
            DeviceProfile::Tablet => 12.0,
            DeviceProfile::Mobile => 10.0,
        }
    }
}

/// Everything the simulation needs to build and advance one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    /// Entities spawn at least this far from every wall
    pub spawn_margin: f32,
    /// No hazard may spawn closer than this to the player spawn point
    pub safe_zone_radius: f32,
    pub max_placement_attempts: u32,

    // === Player ===
    pub player_radius: f32,
    pub momentum_decay: f32,
    pub hover_gain: f32,
    pub drag_gain: f32,
    pub drag_grab_slop: f32,

    // === Rewards ===
    pub reward_count: usize,
    pub reward_radius: f32,
    pub reward_drift: f32,
    pub reward_jitter: f32,
    pub reward_max_drift: f32,
    pub reward_jitter_ticks: (u32, u32),

    // === Hazards ===
    pub hazard_count: usize,
    pub hazard_radius: (f32, f32),
    pub base_speed: f32,
    /// Initial velocity components are drawn from ±this × `base_speed`
    pub hazard_initial_speed: f32,
    pub hazard_jitter: f32,
    pub hazard_jitter_ticks: (u32, u32),
    pub chase_proximity: f32,
    pub chase_probability: f64,
    pub chase_multiplier: f32,
    pub chase_ticks: u32,
    pub cooldown_ticks: (u32, u32),

    /// Run seed for reproducibility
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::for_device(DeviceProfile::Desktop, 800.0, 600.0, 0)
    }
}

impl SimulationConfig {
    /// Resolve tuning for a device class and arena size
    pub fn for_device(profile: DeviceProfile, arena_width: f32, arena_height: f32, seed: u64) -> Self {
        Self {
            arena_width,
            arena_height,
            spawn_margin: SPAWN_MARGIN,
            safe_zone_radius: SAFE_ZONE_RADIUS,
            max_placement_attempts: MAX_PLACEMENT_ATTEMPTS,

            player_radius: PLAYER_RADIUS,
            momentum_decay: MOMENTUM_DECAY,
            hover_gain: HOVER_GAIN,
            drag_gain: DRAG_GAIN,
            drag_grab_slop: DRAG_GRAB_SLOP,

            reward_count: profile.reward_count(),
            reward_radius: REWARD_RADIUS,
            reward_drift: REWARD_DRIFT,
            reward_jitter: REWARD_JITTER,
            reward_max_drift: REWARD_MAX_DRIFT,
            reward_jitter_ticks: (60, 180),

            hazard_count: profile.hazard_count(),
            hazard_radius: (HAZARD_MIN_RADIUS, HAZARD_MAX_RADIUS),
            base_speed: profile.base_speed(),
            hazard_initial_speed: HAZARD_INITIAL_SPEED,
            hazard_jitter: HAZARD_JITTER,
            hazard_jitter_ticks: (30, 120),
            chase_proximity: CHASE_PROXIMITY,
            chase_probability: CHASE_PROBABILITY,
            chase_multiplier: CHASE_MULTIPLIER,
            chase_ticks: CHASE_TICKS,
            cooldown_ticks: (60, 180),

            seed,
        }
    }

    /// Parse a JSON tuning override; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Largest radius any entity can have
    pub fn largest_radius(&self) -> f32 {
        self.player_radius.max(self.reward_radius).max(self.hazard_radius.1)
    }

    /// Smallest arena side that still leaves a spawn band inside the margins
    pub fn min_arena_side(&self) -> f32 {
        2.0 * self.spawn_margin.max(self.largest_radius()) + 1.0
    }

    /// Check every tunable; fails before any round state is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = self.min_arena_side();
        let finite = self.arena_width.is_finite() && self.arena_height.is_finite();
        if !(finite && self.arena_width >= min && self.arena_height >= min) {
            return Err(ConfigError::ArenaTooSmall {
                width: self.arena_width,
                height: self.arena_height,
                min,
            });
        }
        if self.reward_count == 0 {
            return Err(ConfigError::NoRewards);
        }

        for (field, value) in [
            ("player_radius", self.player_radius),
            ("reward_radius", self.reward_radius),
            ("base_speed", self.base_speed),
            ("chase_multiplier", self.chase_multiplier),
            ("spawn_margin", self.spawn_margin),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("safe_zone_radius", self.safe_zone_radius),
            ("reward_drift", self.reward_drift),
            ("reward_jitter", self.reward_jitter),
            ("reward_max_drift", self.reward_max_drift),
            ("hazard_initial_speed", self.hazard_initial_speed),
            ("hazard_jitter", self.hazard_jitter),
            ("chase_proximity", self.chase_proximity),
            ("drag_grab_slop", self.drag_grab_slop),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if self.max_placement_attempts == 0 {
            return Err(ConfigError::NonPositive {
                field: "max_placement_attempts",
                value: 0.0,
            });
        }
        if self.chase_ticks == 0 {
            return Err(ConfigError::NonPositive {
                field: "chase_ticks",
                value: 0.0,
            });
        }

        let (min_r, max_r) = self.hazard_radius;
        if !(min_r > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "hazard_radius",
                value: min_r,
            });
        }
        if !max_r.is_finite() {
            return Err(ConfigError::Negative {
                field: "hazard_radius",
                value: max_r,
            });
        }
        if min_r > max_r {
            return Err(ConfigError::InvertedRange {
                field: "hazard_radius",
                min: min_r,
                max: max_r,
            });
        }
        for (field, (lo, hi)) in [
            ("reward_jitter_ticks", self.reward_jitter_ticks),
            ("hazard_jitter_ticks", self.hazard_jitter_ticks),
            ("cooldown_ticks", self.cooldown_ticks),
        ] {
            if lo == 0 {
                return Err(ConfigError::NonPositive { field, value: 0.0 });
            }
            if lo > hi {
                return Err(ConfigError::InvertedRange {
                    field,
                    min: lo as f32,
                    max: hi as f32,
                });
            }
        }

        for (field, value) in [
            ("momentum_decay", self.momentum_decay as f64),
            ("hover_gain", self.hover_gain as f64),
            ("drag_gain", self.drag_gain as f64),
            ("chase_probability", self.chase_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }

        Ok(())
    }
}

//! Round state and core simulation types
//!
//! Everything a tick reads or writes lives in `SimulationState`, which is
//! owned by the round controller and lent to the step functions.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

/// Immutable bounds for one round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    /// Radius around the player spawn point kept free of hazards at setup
    pub safe_zone_radius: f32,
}

impl Arena {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// The player spawn point
    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Whether a circle lies fully inside the arena
    pub fn contains_circle(&self, pos: Vec2, radius: f32) -> bool {
        pos.x >= radius && pos.x <= self.width - radius && pos.y >= radius && pos.y <= self.height - radius
    }
}

/// The player-controlled entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Player {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }
}

/// A collectible token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub pos: Vec2,
    /// Small per-tick drift
    pub vel: Vec2,
    pub radius: f32,
    /// Monotonic within a round
    pub collected: bool,
    /// Ticks until the drift is perturbed again
    pub jitter_ticks: u32,
}

impl Reward {
    /// Mark collected; returns false if it already was
    pub fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        true
    }
}

/// Derived behavior mode of a hazard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardBehavior {
    /// Ambient drift; may start a chase
    Wandering,
    /// Homing on the player
    Chasing,
    /// Wandering with chase disabled
    Cooldown,
}

/// A mobile obstacle; touching it loses the round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub base_speed: f32,
    pub chasing: bool,
    pub chase_ticks: u32,
    pub cooldown_ticks: u32,
    pub jitter_ticks: u32,
    /// Render-only glow accumulator, advanced while chasing
    pub glow_phase: f32,
}

impl Hazard {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32, base_speed: f32, jitter_ticks: u32) -> Self {
        Self {
            pos,
            vel,
            radius,
            base_speed,
            chasing: false,
            chase_ticks: 0,
            cooldown_ticks: 0,
            jitter_ticks,
            glow_phase: 0.0,
        }
    }

    pub fn behavior(&self) -> HazardBehavior {
        if self.chasing {
            HazardBehavior::Chasing
        } else if self.cooldown_ticks > 0 {
            HazardBehavior::Cooldown
        } else {
            HazardBehavior::Wandering
        }
    }

    /// Glow intensity in [0, 1] for rendering
    pub fn glow(&self) -> f32 {
        if self.chasing {
            0.5 + 0.5 * self.glow_phase.sin()
        } else {
            0.0
        }
    }
}

/// Terminal result of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Lose => "lose",
        }
    }
}

/// Why a round was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    HazardContact,
    TimeExpired,
}

/// Gameplay events emitted by a tick, consumed by effects and audio
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A reward was picked up
    RewardCollected { index: usize, pos: Vec2, combo: u32 },
    /// A hazard started homing on the player
    ChaseStarted { index: usize },
    /// A hazard gave up and entered cooldown
    ChaseEnded { index: usize, cooldown_ticks: u32 },
    /// The player touched a hazard
    HazardContact { index: usize, pos: Vec2 },
    /// Every reward has been collected
    AllCollected,
    /// The round timer ran out
    TimeExpired,
}

/// Complete simulation state for one round (deterministic given the seed)
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub config: SimulationConfig,
    pub arena: Arena,
    pub player: Player,
    pub rewards: Vec<Reward>,
    pub hazards: Vec<Hazard>,
    /// Pickups this round
    pub combo: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events since the controller last drained them
    pub events: Vec<GameEvent>,
    pub rng: Pcg32,
}

impl SimulationState {
    /// Empty arena with the player at the center and no entities
    pub fn new(config: SimulationConfig) -> Self {
        let arena = Arena {
            width: config.arena_width,
            height: config.arena_height,
            safe_zone_radius: config.safe_zone_radius,
        };
        let player = Player::new(arena.center(), config.player_radius);
        let rng = Pcg32::seed_from_u64(config.seed);
        Self {
            config,
            arena,
            player,
            rewards: Vec::new(),
            hazards: Vec::new(),
            combo: 0,
            time_ticks: 0,
            events: Vec::new(),
            rng,
        }
    }

    pub fn collected_count(&self) -> usize {
        self.rewards.iter().filter(|r| r.collected).count()
    }

    pub fn all_collected(&self) -> bool {
        self.rewards.iter().all(|r| r.collected)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_centers_player() {
        let state = SimulationState::new(SimulationConfig::default());
        assert_eq!(state.player.pos, Vec2::new(400.0, 300.0));
        assert_eq!(state.player.vel, Vec2::ZERO);
        assert!(state.rewards.is_empty());
    }

    #[test]
    fn test_reward_collect_is_monotonic() {
        let mut reward = Reward {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: 8.0,
            collected: false,
            jitter_ticks: 10,
        };
        assert!(reward.collect());
        assert!(!reward.collect());
        assert!(reward.collected);
    }

    #[test]
    fn test_hazard_behavior_derivation() {
        let mut hazard = Hazard::new(Vec2::ZERO, Vec2::ZERO, 10.0, 1.5, 30);
        assert_eq!(hazard.behavior(), HazardBehavior::Wandering);
        hazard.cooldown_ticks = 5;
        assert_eq!(hazard.behavior(), HazardBehavior::Cooldown);
        hazard.cooldown_ticks = 0;
        hazard.chasing = true;
        assert_eq!(hazard.behavior(), HazardBehavior::Chasing);
    }

    #[test]
    fn test_arena_contains_circle() {
        let arena = Arena {
            width: 800.0,
            height: 600.0,
            safe_zone_radius: 150.0,
        };
        assert!(arena.contains_circle(Vec2::new(10.0, 10.0), 10.0));
        assert!(!arena.contains_circle(Vec2::new(9.9, 300.0), 10.0));
    }
}

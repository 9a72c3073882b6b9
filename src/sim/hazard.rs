//! Hazard behavior state machine
//!
//! Wandering -> Chasing when the player is close and a per-tick roll
//! succeeds; Chasing -> Cooldown once the chase budget runs out; Cooldown ->
//! Wandering when the cooldown counter reaches zero. Wander jitter runs on
//! its own countdown in every non-chasing state.

use glam::Vec2;
use rand::Rng;

use super::state::Hazard;
use crate::config::SimulationConfig;
use crate::consts::GLOW_STEP;
use crate::random_between;

/// Transition produced by one behavior update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorTransition {
    None,
    ChaseStarted,
    ChaseEnded { cooldown_ticks: u32 },
}

/// Advance one hazard's behavior for a tick
///
/// Only velocity and behavior counters are touched; position is integrated
/// by the motion step afterwards.
pub fn update_behavior<R: Rng + ?Sized>(
    hazard: &mut Hazard,
    target: Vec2,
    config: &SimulationConfig,
    rng: &mut R,
) -> BehaviorTransition {
    let mut transition = BehaviorTransition::None;

    if !hazard.chasing && hazard.cooldown_ticks == 0 && hazard.pos.distance(target) < config.chase_proximity {
        // Roll only when eligible so the RNG stream doesn't depend on distant hazards
        if rng.random_bool(config.chase_probability) {
            hazard.chasing = true;
            hazard.chase_ticks = config.chase_ticks;
            transition = BehaviorTransition::ChaseStarted;
        }
    }

    if hazard.chasing {
        let dir = (target - hazard.pos).normalize_or_zero();
        hazard.vel = dir * hazard.base_speed * config.chase_multiplier;
        hazard.glow_phase += GLOW_STEP;

        hazard.chase_ticks = hazard.chase_ticks.saturating_sub(1);
        if hazard.chase_ticks == 0 {
            let cooldown = rng.random_range(config.cooldown_ticks.0..=config.cooldown_ticks.1);
            hazard.chasing = false;
            hazard.cooldown_ticks = cooldown;
            transition = BehaviorTransition::ChaseEnded { cooldown_ticks: cooldown };
        }
    } else {
        // Jitter and cooldown are independent counters
        hazard.jitter_ticks = hazard.jitter_ticks.saturating_sub(1);
        if hazard.jitter_ticks == 0 {
            hazard.vel += Vec2::new(
                random_between(rng, -config.hazard_jitter, config.hazard_jitter),
                random_between(rng, -config.hazard_jitter, config.hazard_jitter),
            );
            hazard.jitter_ticks = rng.random_range(config.hazard_jitter_ticks.0..=config.hazard_jitter_ticks.1);
        }
        hazard.cooldown_ticks = hazard.cooldown_ticks.saturating_sub(1);
    }

    transition
}

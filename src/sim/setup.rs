//! Round setup: spawns rewards and hazards for a fresh round

use glam::Vec2;
use rand::Rng;

use super::state::{Hazard, Reward, SimulationState};
use crate::config::SimulationConfig;
use crate::error::ConfigError;
use crate::random_between;

/// Build the initial state for a round
///
/// The player starts at the arena center with zero velocity. Hazards are
/// rejection-sampled outside the safe zone around that point; if no valid
/// spot turns up within `max_placement_attempts`, the candidate farthest from
/// the spawn point is used instead.
pub fn initialize_round(config: SimulationConfig) -> Result<SimulationState, ConfigError> {
    config.validate()?;

    let mut state = SimulationState::new(config);
    let config = &state.config;
    let rng = &mut state.rng;
    let spawn = state.arena.center();
    let (lo, hi) = spawn_band(config);

    let mut rewards = Vec::with_capacity(config.reward_count);
    for _ in 0..config.reward_count {
        rewards.push(Reward {
            pos: random_point(rng, lo, hi),
            vel: Vec2::new(
                random_between(rng, -config.reward_drift, config.reward_drift),
                random_between(rng, -config.reward_drift, config.reward_drift),
            ),
            radius: config.reward_radius,
            collected: false,
            jitter_ticks: rng.random_range(config.reward_jitter_ticks.0..=config.reward_jitter_ticks.1),
        });
    }

    let mut hazards = Vec::with_capacity(config.hazard_count);
    for i in 0..config.hazard_count {
        let pos = place_outside_safe_zone(
            rng,
            spawn,
            config.safe_zone_radius,
            config.max_placement_attempts,
            |rng| random_point(rng, lo, hi),
        );
        if spawn.distance(pos) < config.safe_zone_radius {
            log::debug!("Hazard {} placed inside safe zone after {} attempts", i, config.max_placement_attempts);
        }
        let speed = config.hazard_initial_speed * config.base_speed;
        let vel = Vec2::new(random_between(rng, -speed, speed), random_between(rng, -speed, speed));
        let radius = random_between(rng, config.hazard_radius.0, config.hazard_radius.1);
        let jitter_ticks = rng.random_range(config.hazard_jitter_ticks.0..=config.hazard_jitter_ticks.1);
        hazards.push(Hazard::new(pos, vel, radius, config.base_speed, jitter_ticks));
    }

    log::info!(
        "Round initialized: arena {}x{}, {} rewards, {} hazards, seed {}",
        config.arena_width,
        config.arena_height,
        rewards.len(),
        hazards.len(),
        config.seed
    );

    state.rewards = rewards;
    state.hazards = hazards;
    Ok(state)
}

/// Rejection-sample a point at least `safe_radius` from `spawn`
///
/// A candidate exactly on the boundary is accepted. After `max_attempts`
/// misses the best (farthest) candidate seen is returned.
pub fn place_outside_safe_zone<R, F>(
    rng: &mut R,
    spawn: Vec2,
    safe_radius: f32,
    max_attempts: u32,
    mut sample: F,
) -> Vec2
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Vec2,
{
    let mut best = None::<(Vec2, f32)>;
    for _ in 0..max_attempts.max(1) {
        let candidate = sample(rng);
        let dist = spawn.distance(candidate);
        if dist >= safe_radius {
            return candidate;
        }
        if best.is_none_or(|(_, d)| dist > d) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(p, _)| p).unwrap_or(spawn)
}

/// Corners of the rectangle entities may spawn in
///
/// The margin never drops below the largest radius, so every entity starts
/// wholly inside the arena.
fn spawn_band(config: &SimulationConfig) -> (Vec2, Vec2) {
    let m = config.spawn_margin.max(config.largest_radius());
    (
        Vec2::new(m, m),
        Vec2::new(config.arena_width - m, config.arena_height - m),
    )
}

fn random_point<R: Rng + ?Sized>(rng: &mut R, lo: Vec2, hi: Vec2) -> Vec2 {
    Vec2::new(random_between(rng, lo.x, hi.x), random_between(rng, lo.y, hi.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceProfile;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_initialize_counts_and_spawn() {
        let config = SimulationConfig::for_device(DeviceProfile::Desktop, 1024.0, 768.0, 42);
        let state = initialize_round(config).unwrap();
        assert_eq!(state.rewards.len(), 13);
        assert_eq!(state.hazards.len(), 9);
        assert_eq!(state.player.pos, Vec2::new(512.0, 384.0));
        assert_eq!(state.player.vel, Vec2::ZERO);
        assert!(state.rewards.iter().all(|r| !r.collected));
    }

    #[test]
    fn test_no_hazard_in_safe_zone() {
        for seed in 0..50 {
            let config = SimulationConfig::for_device(DeviceProfile::Mobile, 400.0, 700.0, seed);
            let state = initialize_round(config).unwrap();
            let spawn = state.arena.center();
            for hazard in &state.hazards {
                assert!(spawn.distance(hazard.pos) >= state.arena.safe_zone_radius);
            }
        }
    }

    #[test]
    fn test_radii_and_velocities_in_range() {
        let config = SimulationConfig::for_device(DeviceProfile::Desktop, 800.0, 600.0, 9);
        let state = initialize_round(config.clone()).unwrap();
        let max_speed = config.hazard_initial_speed * config.base_speed;
        for hazard in &state.hazards {
            assert!(hazard.radius >= config.hazard_radius.0 && hazard.radius <= config.hazard_radius.1);
            assert!(hazard.vel.x.abs() <= max_speed && hazard.vel.y.abs() <= max_speed);
            assert!(!hazard.chasing);
            assert_eq!(hazard.cooldown_ticks, 0);
        }
        for reward in &state.rewards {
            assert!(reward.vel.x.abs() <= config.reward_drift);
            assert_eq!(reward.radius, config.reward_radius);
        }
    }

    #[test]
    fn test_large_radii_spawn_inside_arena() {
        for seed in 0..20 {
            let config = SimulationConfig {
                reward_radius: 80.0,
                hazard_radius: (60.0, 70.0),
                seed,
                ..Default::default()
            };
            let state = initialize_round(config).unwrap();
            for reward in &state.rewards {
                assert!(state.arena.contains_circle(reward.pos, reward.radius), "seed {seed}: {:?}", reward.pos);
            }
            for hazard in &state.hazards {
                assert!(state.arena.contains_circle(hazard.pos, hazard.radius), "seed {seed}: {:?}", hazard.pos);
            }
        }
    }

    #[test]
    fn test_invalid_config_builds_nothing() {
        let config = SimulationConfig {
            arena_width: -1.0,
            ..Default::default()
        };
        assert!(initialize_round(config).is_err());
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = initialize_round(SimulationConfig::default()).unwrap();
        let b = initialize_round(SimulationConfig::default()).unwrap();
        assert_eq!(a.rewards, b.rewards);
        assert_eq!(a.hazards, b.hazards);
    }

    #[test]
    fn test_boundary_distance_is_accepted() {
        let mut rng = Pcg32::seed_from_u64(1);
        let spawn = Vec2::new(400.0, 300.0);
        let on_edge = Vec2::new(550.0, 300.0);
        let mut calls = 0;
        let pos = place_outside_safe_zone(&mut rng, spawn, 150.0, 10, |_| {
            calls += 1;
            on_edge
        });
        assert_eq!(pos, on_edge);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_inside_is_resampled() {
        let mut rng = Pcg32::seed_from_u64(1);
        let spawn = Vec2::new(400.0, 300.0);
        let candidates = [Vec2::new(549.9, 300.0), Vec2::new(400.0, 460.0)];
        let mut calls = 0;
        let pos = place_outside_safe_zone(&mut rng, spawn, 150.0, 10, |_| {
            let c = candidates[calls];
            calls += 1;
            c
        });
        assert_eq!(pos, Vec2::new(400.0, 460.0));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_exhaustion_returns_best_candidate() {
        let mut rng = Pcg32::seed_from_u64(1);
        let spawn = Vec2::new(0.0, 0.0);
        let candidates = [Vec2::new(10.0, 0.0), Vec2::new(90.0, 0.0), Vec2::new(40.0, 0.0)];
        let mut calls = 0;
        let pos = place_outside_safe_zone(&mut rng, spawn, 150.0, 3, |_| {
            let c = candidates[calls];
            calls += 1;
            c
        });
        assert_eq!(pos, Vec2::new(90.0, 0.0));
        assert_eq!(calls, 3);
    }
}

//! Token Rush - a timed arena collection game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, hazard AI, motion, collisions)
//! - `round`: Round lifecycle (countdown, timer, pause, outcome, replay playback)
//! - `replay`: Frame-accurate recording and playback
//! - `renderer`: Render step (scene painting, effects, WebGPU upload)
//! - `config`: Per-device simulation tuning

pub mod audio;
pub mod config;
pub mod error;
pub mod input;
pub mod renderer;
pub mod replay;
pub mod round;
pub mod settings;
pub mod settlement;
pub mod sim;

pub use config::{DeviceProfile, SimulationConfig};
pub use error::{ConfigError, RoundError, SettlementError};
pub use round::{FrameStatus, LoopHandle, Outcome, OutcomeReport, RoundController, RoundPhase, RoundRequest};
pub use settings::Settings;

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, entity velocities are in px/tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Largest wall-clock delta fed to the simulation accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default pre-round countdown (seconds)
    pub const COUNTDOWN_SECS: u32 = 5;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 10.0;
    pub const MOMENTUM_DECAY: f32 = 0.92;
    pub const HOVER_GAIN: f32 = 0.1;
    pub const DRAG_GAIN: f32 = 0.5;
    /// Extra slop around the player within which a touch grabs it
    pub const DRAG_GRAB_SLOP: f32 = 25.0;

    /// Spawn placement
    pub const SPAWN_MARGIN: f32 = 50.0;
    pub const SAFE_ZONE_RADIUS: f32 = 150.0;
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 64;

    /// Reward defaults
    pub const REWARD_RADIUS: f32 = 8.0;
    pub const REWARD_DRIFT: f32 = 0.4;
    pub const REWARD_JITTER: f32 = 0.25;
    pub const REWARD_MAX_DRIFT: f32 = 0.9;

    /// Hazard defaults
    pub const HAZARD_MIN_RADIUS: f32 = 10.0;
    pub const HAZARD_MAX_RADIUS: f32 = 25.0;
    pub const HAZARD_INITIAL_SPEED: f32 = 2.0;
    pub const HAZARD_JITTER: f32 = 0.5;
    pub const CHASE_PROXIMITY: f32 = 150.0;
    pub const CHASE_PROBABILITY: f64 = 0.015;
    pub const CHASE_MULTIPLIER: f32 = 1.9;
    pub const CHASE_TICKS: u32 = 120;
    pub const GLOW_STEP: f32 = 0.1;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Uniform float in `[min, max)`; returns `min` when the range is empty
#[inline]
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.random::<f32>() * (max - min)
}

/// Clamp a circle's center so the whole circle stays inside a `size` arena
#[inline]
pub fn clamp_circle_to_arena(pos: Vec2, radius: f32, size: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.clamp(radius, (size.x - radius).max(radius)),
        pos.y.clamp(radius, (size.y - radius).max(radius)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_between_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..1000 {
            let v = random_between(&mut rng, -0.5, 0.5);
            assert!((-0.5..0.5).contains(&v));
        }
    }

    #[test]
    fn test_random_between_empty_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(random_between(&mut rng, 3.0, 3.0), 3.0);
        assert_eq!(random_between(&mut rng, 4.0, 1.0), 4.0);
    }

    #[test]
    fn test_clamp_circle_to_arena() {
        let size = Vec2::new(800.0, 600.0);
        let clamped = clamp_circle_to_arena(Vec2::new(-20.0, 700.0), 10.0, size);
        assert_eq!(clamped, Vec2::new(10.0, 590.0));
        let inside = clamp_circle_to_arena(Vec2::new(400.0, 300.0), 10.0, size);
        assert_eq!(inside, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_distance() {
        assert!((distance(Vec2::ZERO, Vec2::new(3.0, 4.0)) - 5.0).abs() < 1e-6);
    }
}

//! Transient visual effects
//!
//! Trail, particles and floating text. These are presentation only: they use
//! their own RNG so spawning sparks never perturbs the simulation stream.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::surface::Color;
use super::vertex::colors;
use crate::random_between;
use crate::settings::Settings;
use crate::sim::{GameEvent, SimulationState};

/// Points kept in the player trail
pub const TRAIL_LEN: usize = 15;
/// Particles spawned per pickup
pub const PICKUP_PARTICLES: usize = 8;

const PARTICLE_GRAVITY: f32 = 0.2;
const PARTICLE_FADE: f32 = 0.03;
const TEXT_RISE: f32 = 0.5;
const TEXT_FADE: f32 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Color,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub alpha: f32,
}

#[derive(Debug, Clone)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub texts: Vec<FloatingText>,
    /// Oldest first
    pub trail: VecDeque<Vec2>,
    rng: Pcg32,
}

impl Effects {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            texts: Vec::new(),
            trail: VecDeque::with_capacity(TRAIL_LEN),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Drop everything (new round, replay start)
    pub fn clear(&mut self) {
        self.particles.clear();
        self.texts.clear();
        self.trail.clear();
    }

    /// React to a gameplay event
    pub fn apply(&mut self, event: &GameEvent, settings: &Settings) {
        if let GameEvent::RewardCollected { pos, .. } = *event {
            if settings.floating_text {
                self.texts.push(FloatingText {
                    pos,
                    text: "+1".to_string(),
                    alpha: 1.0,
                });
            }
            self.burst(pos, colors::PICKUP_SPARK, PICKUP_PARTICLES, settings.max_particles());
        }
    }

    /// Advance one frame: record the trail, spark chasing hazards, age
    /// particles and text
    pub fn update(&mut self, state: &SimulationState, settings: &Settings) {
        self.trail.push_back(state.player.pos);
        while self.trail.len() > TRAIL_LEN {
            self.trail.pop_front();
        }

        let cap = settings.max_particles();
        for hazard in state.hazards.iter().filter(|h| h.chasing) {
            self.burst(hazard.pos, colors::CHASE_SPARK, 1, cap);
        }

        for p in &mut self.particles {
            p.pos += p.vel;
            p.vel.y += PARTICLE_GRAVITY;
            p.alpha -= PARTICLE_FADE;
        }
        self.particles.retain(|p| p.alpha > 0.0);

        for t in &mut self.texts {
            t.pos.y -= TEXT_RISE;
            t.alpha -= TEXT_FADE;
        }
        self.texts.retain(|t| t.alpha > 0.0);
    }

    fn burst(&mut self, pos: Vec2, color: Color, count: usize, cap: usize) {
        for _ in 0..count {
            if self.particles.len() >= cap {
                return;
            }
            let vel = Vec2::new(
                random_between(&mut self.rng, -3.0, 3.0),
                random_between(&mut self.rng, -5.0, 0.0),
            );
            let radius = random_between(&mut self.rng, 2.0, 4.0);
            self.particles.push(Particle {
                pos,
                vel,
                radius,
                color,
                alpha: 1.0,
            });
        }
    }
}

//! Render step
//!
//! Paints the post-collision entity state plus effects onto a `Surface`.
//! Reads only; the simulation is never touched from here.

use glam::Vec2;

use super::effects::Effects;
use super::surface::{Surface, with_alpha};
use super::vertex::colors;
use crate::settings::Settings;
use crate::sim::SimulationState;

/// Grid spacing (px)
pub const GRID_STEP: f32 = 50.0;
const FLOATING_TEXT_SIZE: f32 = 16.0;
const COUNTDOWN_TEXT_SIZE: f32 = 90.0;

/// Paint one frame
///
/// Order: background, grid, safe-zone ring, trail, rewards, hazards,
/// player, floating text, particles, countdown.
pub fn paint<S: Surface + ?Sized>(
    surface: &mut S,
    state: &SimulationState,
    effects: &Effects,
    settings: &Settings,
    countdown: Option<u32>,
) {
    surface.clear(colors::BACKGROUND);
    let arena = &state.arena;

    if settings.grid {
        let mut x = 0.0;
        while x < arena.width {
            surface.line(Vec2::new(x, 0.0), Vec2::new(x, arena.height), 1.0, colors::GRID);
            x += GRID_STEP;
        }
        let mut y = 0.0;
        while y < arena.height {
            surface.line(Vec2::new(0.0, y), Vec2::new(arena.width, y), 1.0, colors::GRID);
            y += GRID_STEP;
        }
    }

    if settings.safe_zone_ring {
        surface.stroke_circle(state.player.pos, arena.safe_zone_radius, 2.0, colors::SAFE_ZONE);
    }

    if settings.trails && effects.trail.len() > 1 {
        let points: Vec<Vec2> = effects.trail.iter().copied().collect();
        surface.trail(&points, state.player.radius, colors::TRAIL);
    }

    for reward in state.rewards.iter().filter(|r| !r.collected) {
        surface.fill_circle(reward.pos, reward.radius, colors::REWARD);
    }

    let glow = settings.effective_hazard_glow();
    for hazard in &state.hazards {
        if glow && hazard.chasing {
            surface.glow(hazard.pos, hazard.radius, hazard.glow(), colors::HAZARD_GLOW);
        }
        surface.fill_circle(hazard.pos, hazard.radius, colors::HAZARD);
    }

    surface.fill_circle(state.player.pos, state.player.radius, colors::PLAYER);

    for text in &effects.texts {
        surface.text(
            text.pos,
            &text.text,
            FLOATING_TEXT_SIZE,
            with_alpha(colors::FLOATING_TEXT, text.alpha),
        );
    }

    for p in &effects.particles {
        surface.fill_circle(p.pos, p.radius, with_alpha(p.color, p.alpha));
    }

    if let Some(n) = countdown {
        surface.text(arena.center(), &n.to_string(), COUNTDOWN_TEXT_SIZE, colors::PLAYER);
    }
}

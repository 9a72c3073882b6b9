//! Fixed timestep simulation tick
//!
//! One tick runs hazard AI, then motion, then collision resolution, in that
//! order, so the state handed to the renderer is always post-collision.

use glam::Vec2;

use super::collision::{bounce_in_arena, circles_overlap};
use super::hazard::{BehaviorTransition, update_behavior};
use super::state::{GameEvent, Outcome, SimulationState};
use crate::{clamp_circle_to_arena, random_between};
use rand::Rng;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Point the player is steered toward (pointer or touch position)
    pub target: Option<Vec2>,
    /// Steering comes from an active touch drag rather than hover
    pub drag: bool,
    /// Touch released this tick: kill momentum
    pub release: bool,
}

/// Advance the round by one tick
///
/// Returns the terminal outcome if this tick ended the round. Hazard contact
/// is checked before pickups, so a loss overrides a simultaneous win.
pub fn tick(state: &mut SimulationState, input: &TickInput) -> Option<Outcome> {
    state.time_ticks += 1;

    update_hazard_ai(state);
    move_player(state, input);
    move_hazards(state);
    move_rewards(state);
    resolve_collisions(state)
}

fn update_hazard_ai(state: &mut SimulationState) {
    let target = state.player.pos;
    for (index, hazard) in state.hazards.iter_mut().enumerate() {
        match update_behavior(hazard, target, &state.config, &mut state.rng) {
            BehaviorTransition::None => {}
            BehaviorTransition::ChaseStarted => {
                log::debug!("Hazard {} chasing at tick {}", index, state.time_ticks);
                state.events.push(GameEvent::ChaseStarted { index });
            }
            BehaviorTransition::ChaseEnded { cooldown_ticks } => {
                log::debug!("Hazard {} cooling down for {} ticks", index, cooldown_ticks);
                state.events.push(GameEvent::ChaseEnded { index, cooldown_ticks });
            }
        }
    }
}

fn move_player(state: &mut SimulationState, input: &TickInput) {
    let config = &state.config;
    let player = &mut state.player;

    if input.release {
        player.vel = Vec2::ZERO;
    }
    match input.target {
        Some(target) => {
            let gain = if input.drag { config.drag_gain } else { config.hover_gain };
            player.vel = (target - player.pos) * gain;
        }
        None => player.vel *= config.momentum_decay,
    }

    player.pos = clamp_circle_to_arena(player.pos + player.vel, player.radius, state.arena.size());
}

fn move_hazards(state: &mut SimulationState) {
    let size = state.arena.size();
    for hazard in &mut state.hazards {
        hazard.pos += hazard.vel;
        bounce_in_arena(&mut hazard.pos, &mut hazard.vel, hazard.radius, size);
    }
}

fn move_rewards(state: &mut SimulationState) {
    let size = state.arena.size();
    let config = &state.config;
    let rng = &mut state.rng;

    for reward in state.rewards.iter_mut().filter(|r| !r.collected) {
        reward.jitter_ticks = reward.jitter_ticks.saturating_sub(1);
        if reward.jitter_ticks == 0 {
            let jitter = Vec2::new(
                random_between(rng, -config.reward_jitter, config.reward_jitter),
                random_between(rng, -config.reward_jitter, config.reward_jitter),
            );
            reward.vel = (reward.vel + jitter).clamp(
                Vec2::splat(-config.reward_max_drift),
                Vec2::splat(config.reward_max_drift),
            );
            reward.jitter_ticks = rng.random_range(config.reward_jitter_ticks.0..=config.reward_jitter_ticks.1);
        }
        reward.pos += reward.vel;
        bounce_in_arena(&mut reward.pos, &mut reward.vel, reward.radius, size);
    }
}

fn resolve_collisions(state: &mut SimulationState) -> Option<Outcome> {
    let player = &state.player;

    // Hazard contact ends the round before anything else is evaluated
    if let Some((index, hazard)) = state
        .hazards
        .iter()
        .enumerate()
        .find(|(_, h)| circles_overlap(player.pos, player.radius, h.pos, h.radius))
    {
        log::info!("Hazard {} hit the player at tick {}", index, state.time_ticks);
        state.events.push(GameEvent::HazardContact { index, pos: hazard.pos });
        return Some(Outcome::Lose);
    }

    for (index, reward) in state.rewards.iter_mut().enumerate() {
        if !reward.collected && circles_overlap(player.pos, player.radius, reward.pos, reward.radius) {
            reward.collect();
            state.combo += 1;
            state.events.push(GameEvent::RewardCollected {
                index,
                pos: reward.pos,
                combo: state.combo,
            });
        }
    }

    if state.rewards.iter().all(|r| r.collected) {
        state.events.push(GameEvent::AllCollected);
        return Some(Outcome::Win);
    }

    None
}

//! Input adapter
//!
//! Turns pointer and touch events (in arena coordinates) into per-tick
//! `TickInput`. Mouse hover only steers on ticks after the pointer actually
//! moved; a touch drag keeps steering until the finger lifts.

use glam::Vec2;

use crate::sim::{Player, SimulationState, TickInput};

#[derive(Debug, Clone, Default)]
pub struct InputAdapter {
    /// Last hover position not yet consumed by a tick
    hover: Option<Vec2>,
    /// Current drag target while a touch holds the player
    drag: Option<Vec2>,
    /// Touch lifted since the last tick
    released: bool,
}

impl InputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mouse moved over the arena
    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.hover = Some(pos);
    }

    /// Touch began; it only grabs the player if it lands near it
    pub fn touch_start(&mut self, pos: Vec2, player: &Player, grab_slop: f32) -> bool {
        if pos.distance(player.pos) <= player.radius + grab_slop {
            self.drag = Some(player.pos);
            self.released = false;
            true
        } else {
            false
        }
    }

    pub fn touch_move(&mut self, pos: Vec2) {
        if self.drag.is_some() {
            self.drag = Some(pos);
        }
    }

    pub fn touch_end(&mut self) {
        if self.drag.take().is_some() {
            self.released = true;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Input for the next tick; one-shot parts are consumed
    pub fn next_tick(&mut self) -> TickInput {
        let release = std::mem::take(&mut self.released);
        match self.drag {
            Some(target) => TickInput {
                target: Some(target),
                drag: true,
                release,
            },
            None => TickInput {
                target: self.hover.take(),
                drag: false,
                release,
            },
        }
    }

    /// Drop everything (phase change)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Steering target for the headless autopilot: the nearest uncollected reward
pub fn autopilot_target(state: &SimulationState) -> Option<Vec2> {
    let from = state.player.pos;
    state
        .rewards
        .iter()
        .filter(|r| !r.collected)
        .map(|r| r.pos)
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}

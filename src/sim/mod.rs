//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entity index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod hazard;
pub mod setup;
pub mod state;
pub mod tick;

pub use collision::{bounce_in_arena, circles_overlap, reflect_velocity};
pub use hazard::{BehaviorTransition, update_behavior};
pub use setup::{initialize_round, place_outside_safe_zone};
pub use state::{
    Arena, GameEvent, Hazard, HazardBehavior, LossReason, Outcome, Player, Reward, SimulationState,
};
pub use tick::{TickInput, tick};

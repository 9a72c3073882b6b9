//! Error types
//!
//! Nothing here is fatal: configuration and round errors keep the controller
//! out of a round, settlement errors never touch the local outcome.

use thiserror::Error;

/// Invalid simulation configuration, detected before any round state exists
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("arena must be at least {min:.0}x{min:.0} (got {width:.1}x{height:.1})")]
    ArenaTooSmall { width: f32, height: f32, min: f32 },
    #[error("a round needs at least one reward")]
    NoRewards,
    #[error("{field} must be positive (got {value:.3})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be finite and non-negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} range is inverted (min {min:.3} > max {max:.3})")]
    InvertedRange { field: &'static str, min: f32, max: f32 },
    #[error("{field} must be a probability in [0, 1] (got {value})")]
    Probability { field: &'static str, value: f64 },
    #[error("countdown must be between 3 and 5 seconds (got {0})")]
    Countdown(u32),
    #[error("invalid config override: {0}")]
    Parse(String),
}

/// Reasons a round operation was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoundError {
    #[error("round cannot start without a validated stake")]
    StakeNotValidated,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot {operation} while {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: &'static str,
    },
}

/// Failure reported by the external settlement collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("settlement service unavailable: {0}")]
    Unavailable(String),
    #[error("settlement rejected: {0}")]
    Rejected(String),
}

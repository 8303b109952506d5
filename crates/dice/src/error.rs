//! Error types for dice builders.

use drv::DrvError;
use thiserror::Error;

/// Errors that can occur when building dice mechanics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiceError {
    /// A die needs a nonzero number of sides.
    #[error("Invalid die with {sides} sides")]
    InvalidDie { sides: i64 },

    /// A roll needs at least one die.
    #[error("Invalid number of dice: {count}")]
    InvalidDiceCount { count: u32 },

    /// A rule parameter outside what the rules allow.
    #[error("Invalid {name} {value}: must be in {allowed}")]
    InvalidSkill {
        name: String,
        value: i64,
        allowed: String,
    },

    /// The underlying algebra failed.
    #[error(transparent)]
    Drv(#[from] DrvError),
}

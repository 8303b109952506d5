//! Cortex Plus roll-and-keep pools.

use drv::{FiniteDrv, Pool};

use crate::dice::custom_die;
use crate::error::DiceError;

const SIDES: [i64; 5] = [4, 6, 8, 10, 12];

/// A Cortex die; a roll of 1 counts as 0.
pub fn die(k: i64) -> Result<FiniteDrv<i64>, DiceError> {
    if !SIDES.contains(&k) {
        return Err(DiceError::InvalidDie { sides: k });
    }
    let faces = std::iter::once(0).chain(2..=k).collect();
    custom_die(format!("d{}", k), faces)
}

/// Roll a pool of at least two Cortex dice and keep the two highest.
pub fn roll(dice: &[i64]) -> Result<FiniteDrv<i64>, DiceError> {
    if dice.len() < 2 {
        return Err(DiceError::InvalidDiceCount {
            count: dice.len() as u32,
        });
    }
    let pool = dice.iter().map(|&k| die(k)).collect::<Result<Pool<i64>, _>>()?;
    let names: Vec<String> = dice.iter().map(|k| format!("d{}", k)).collect();
    Ok(pool.highest(2)?.with_name(names.join(",")))
}

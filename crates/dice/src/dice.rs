//! Plain dice.

use drv::{uniform, FiniteDrv, Pool};

use crate::error::DiceError;

/// One `k`-sided die, `1..=k`. A negative `k` gives `-d|k|`, i.e. `k..=-1`.
///
/// # Errors
///
/// `InvalidDie` for `k == 0`.
pub fn dk(k: i64) -> Result<FiniteDrv<i64>, DiceError> {
    let (name, faces) = match k {
        0 => return Err(DiceError::InvalidDie { sides: k }),
        k if k > 0 => (format!("d{}", k), (1..=k).collect()),
        k => (format!("-d{}", -k), (k..=-1).collect()),
    };
    Ok(uniform(name, faces)?)
}

/// The sum of `n` independent `k`-sided dice.
///
/// Independent dice are folded pairwise, so this stays cheap for tens of
/// dice.
pub fn ndk(n: u32, k: i64) -> Result<FiniteDrv<i64>, DiceError> {
    if n == 0 {
        return Err(DiceError::InvalidDiceCount { count: n });
    }
    let die = dk(k)?;
    if n == 1 {
        return Ok(die);
    }
    let name = if k > 0 {
        format!("{}d{}", n, k)
    } else {
        format!("-{}d{}", n, -k)
    };
    let sum = Pool::independent(&die, n as usize)?.sum()?;
    Ok(sum.with_name(name))
}

/// The percentile die, `d%`.
pub fn percentile() -> Result<FiniteDrv<i64>, DiceError> {
    Ok(dk(100)?.with_name("d%"))
}

/// A die with arbitrary equally likely faces.
pub fn custom_die(name: impl Into<String>, faces: Vec<i64>) -> Result<FiniteDrv<i64>, DiceError> {
    if faces.is_empty() {
        return Err(DiceError::InvalidDie { sides: 0 });
    }
    Ok(uniform(name, faces)?)
}

/// A Fudge die: `-1`, `0` or `+1`.
pub fn fudge_die() -> Result<FiniteDrv<i64>, DiceError> {
    Ok((&dk(3)? - 2)?.with_name("dF"))
}

//! West End Games d6 checks.

use drv::FiniteDrv;

use crate::d20::pass_fail;
use crate::dice::ndk;
use crate::error::DiceError;

/// Roll `skill` d6, add `skill` and check the total reaches `target`.
pub fn test(skill: u32, target: i64) -> Result<FiniteDrv<i64>, DiceError> {
    let dice = ndk(skill, 6)?;
    let total = (&dice + i64::from(skill))?;
    Ok(total
        .ge(target)?
        .with_name(format!(
            "d6 test: skill {} against target {}",
            skill, target
        ))
        .with_mask(pass_fail()))
}

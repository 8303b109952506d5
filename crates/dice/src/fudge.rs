//! Fudge (FATE) checks.

use drv::{FiniteDrv, Pool};

use crate::d20::pass_fail;
use crate::dice::fudge_die;
use crate::error::DiceError;

/// Roll four Fudge dice, add `skill` and check the total reaches `target`.
pub fn test(skill: i64, target: i64) -> Result<FiniteDrv<i64>, DiceError> {
    let four = Pool::independent(&fudge_die()?, 4)?.sum()?.with_name("4dF");
    let total = (&four + skill)?;
    Ok(total
        .ge(target)?
        .with_name(format!(
            "Fudge test: skill {} against target {}",
            skill, target
        ))
        .with_mask(pass_fail()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fudge_check() {
        // 4dF >= 0 happens 1 - 31/81 of the time
        let check = test(2, 2).unwrap();
        assert!((check.pmf(&1) - 50.0 / 81.0).abs() < 1e-12);
        assert_eq!(test(0, -4).unwrap().support(), &[1]);
        assert_eq!(test(0, 5).unwrap().support(), &[0]);
    }
}

//! HarnMaster percentile checks.

use drv::{FiniteDrv, Mask};

use crate::dice::dk;
use crate::error::DiceError;

/// Roll a d100 under `skill`. Rolls divisible by 5 make the result
/// critical: -2 critical failure, -1 failure, 1 success, 2 critical success.
///
/// ```rust
/// let check = drv_dice::harn_master::test(50).unwrap();
/// // 1..=49 succeed; 5, 10, ..., 45 critically
/// assert!((check.pmf(&2) - 0.09).abs() < 1e-12);
/// assert!((check.pmf(&1) - 0.40).abs() < 1e-12);
/// ```
pub fn test(skill: i64) -> Result<FiniteDrv<i64>, DiceError> {
    let name = format!("HarnMaster test (skill {})", skill);
    let tst = dk(100)?.map(name, move |&r| {
        let success: i64 = if r < skill { 1 } else { -1 };
        let critical = if r % 5 == 0 { 2 } else { 1 };
        success * critical
    })?;

    let mut mask = Mask::new();
    mask.insert(-2, "Critical Failure".to_string());
    mask.insert(-1, "Failure".to_string());
    mask.insert(1, "Success".to_string());
    mask.insert(2, "Critical Success".to_string());
    Ok(tst.with_mask(mask))
}

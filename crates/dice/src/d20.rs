//! d20 checks.

use drv::{FiniteDrv, Mask};

use crate::dice::dk;
use crate::error::DiceError;

pub(crate) fn pass_fail() -> Mask<i64> {
    let mut mask = Mask::new();
    mask.insert(1, "Success".to_string());
    mask.insert(0, "Failure".to_string());
    mask
}

/// Roll a d20, add `skill` and check the total reaches `target`.
///
/// ```rust
/// let check = drv_dice::d20::test(5, 15).unwrap();
/// // needs 10 or more on the die
/// assert!((check.pmf(&1) - 0.55).abs() < 1e-12);
/// ```
pub fn test(skill: i64, target: i64) -> Result<FiniteDrv<i64>, DiceError> {
    let total = (&dk(20)? + skill)?;
    Ok(total
        .ge(target)?
        .with_name(format!(
            "d20 test: skill {} against target {}",
            skill, target
        ))
        .with_mask(pass_fail()))
}

/// Two independent d20 rolls plus skills, compared: 1 if A is higher, -1
/// if B is, 0 on a tie.
pub fn opposed_test(skill_a: i64, skill_b: i64) -> Result<FiniteDrv<i64>, DiceError> {
    let a = (&dk(20)? + skill_a)?;
    let b = (&dk(20)? + skill_b)?;

    let mut mask = Mask::new();
    mask.insert(-1, "B".to_string());
    mask.insert(0, "Tie".to_string());
    mask.insert(1, "A".to_string());

    Ok(a.compare(&b)?
        .with_name(format!(
            "d20 opposed test: A ({}) against B ({})",
            skill_a, skill_b
        ))
        .with_mask(mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_probabilities() {
        assert_eq!(test(0, 1).unwrap().support(), &[1]);
        assert_eq!(test(0, 21).unwrap().support(), &[0]);
        let even = test(0, 11).unwrap();
        assert!((even.pmf(&1) - 0.5).abs() < 1e-12);
        assert_eq!(even.label(&1), Some("Success"));
    }

    #[test]
    fn test_opposed_sums_to_one() {
        let duel = opposed_test(11, 17).unwrap();
        let total: f64 = [-1, 0, 1].iter().map(|x| duel.pmf(x)).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(duel.pmf(&-1) > duel.pmf(&1));
        // ties: a + 11 == b + 17 for a in 7..=20
        assert!((duel.pmf(&0) - 14.0 / 400.0).abs() < 1e-12);
        assert_eq!(duel.label(&0), Some("Tie"));
    }

    #[test]
    fn test_equal_skills_are_symmetric() {
        let duel = opposed_test(3, 3).unwrap();
        assert!((duel.pmf(&1) - duel.pmf(&-1)).abs() < 1e-12);
        assert!((duel.pmf(&0) - 0.05).abs() < 1e-12);
    }
}

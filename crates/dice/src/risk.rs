//! Risk battles.

use drv::{FiniteDrv, Mask, Operator, Pool};

use crate::dice::dk;
use crate::error::DiceError;

/// One attack: `attacker` dice (1 to 3) against `defender` dice (1 or 2).
///
/// Each side's dice are sorted and paired from the highest; the defender
/// wins ties. The value is armies lost by the defender minus armies lost
/// by the attacker.
pub fn attack(attacker: u32, defender: u32) -> Result<FiniteDrv<i64>, DiceError> {
    if !(1..=3).contains(&attacker) {
        return Err(DiceError::InvalidSkill {
            name: "attacker dice".to_string(),
            value: i64::from(attacker),
            allowed: "1..=3".to_string(),
        });
    }
    if !(1..=2).contains(&defender) {
        return Err(DiceError::InvalidSkill {
            name: "defender dice".to_string(),
            value: i64::from(defender),
            allowed: "1..=2".to_string(),
        });
    }

    let split = attacker as usize;
    let battle = Operator::custom("risk", move |rolls: &[i64]| {
        let (atk, def) = rolls.split_at(split);
        let mut atk = atk.to_vec();
        let mut def = def.to_vec();
        atk.sort_unstable_by(|a, b| b.cmp(a));
        def.sort_unstable_by(|a, b| b.cmp(a));
        let score = atk
            .iter()
            .zip(&def)
            .map(|(a, d)| if a > d { 1 } else { -1 })
            .sum();
        Some(score)
    });

    let pool = Pool::independent(&dk(6)?, (attacker + defender) as usize)?;
    let name = format!("Risk attack: {} attack {}", attacker, defender);

    let mut mask = Mask::new();
    mask.insert(-2, "attacker loses 2".to_string());
    mask.insert(-1, "attacker loses 1".to_string());
    mask.insert(0, "both lose 1".to_string());
    mask.insert(1, "defender loses 1".to_string());
    mask.insert(2, "defender loses 2".to_string());

    Ok(pool.apply(&battle, &name)?.with_mask(mask))
}

//! Success-counting dice pools.

use drv::{FiniteDrv, Pool, PoolCache};
use tracing::debug;

use crate::dice::dk;
use crate::error::DiceError;

/// Cache for [`success_pool`], keyed by `(dice, sides, target)`.
pub type SuccessCache = PoolCache<(u32, i64, i64), FiniteDrv<i64>>;

/// Roll `skill` independent `die`-sided dice and count those reaching
/// `target`.
pub fn test(skill: u32, target: i64, die: i64) -> Result<FiniteDrv<i64>, DiceError> {
    if skill == 0 {
        return Err(DiceError::InvalidDiceCount { count: skill });
    }
    let hit = dk(die)?.ge(target)?;
    let successes = Pool::independent(&hit, skill as usize)?.sum()?;
    Ok(successes.with_name(format!(
        "Misc. test: skill {} against target {}, die=d{}",
        skill, target, die
    )))
}

/// The number of successes of `n` `k`-sided dice against `target`.
///
/// Pools are built by splitting `n` in two halves, both looked up in
/// `cache` first, so asking for many pool sizes shares most of the work.
/// Each half is flattened onto a fresh space before adding, which keeps the
/// halves independent even when both come from the same cache entry.
///
/// ```rust
/// use drv_dice::misc::{success_pool, SuccessCache};
///
/// let mut cache = SuccessCache::new();
/// let six = success_pool(6, 6, 5, &mut cache).unwrap();
/// assert_eq!(six.name(), "6p6>=5");
/// assert!((six.mean() - 2.0).abs() < 1e-12);
/// assert_eq!(cache.len(), 4); // pools of 6, 3, 2 and 1 dice
/// ```
pub fn success_pool(
    n: u32,
    k: i64,
    target: i64,
    cache: &mut SuccessCache,
) -> Result<FiniteDrv<i64>, DiceError> {
    if n == 0 {
        return Err(DiceError::InvalidDiceCount { count: n });
    }
    let key = (n, k, target);
    if let Some(hit) = cache.fetch(&key) {
        return Ok(hit.clone());
    }

    let pool = if n == 1 {
        dk(k)?.ge(target)?
    } else {
        let right = n / 2;
        let left = n - right;
        debug!(n, left, right, "splitting success pool");
        let l = success_pool(left, k, target, cache)?.flatten()?;
        let r = success_pool(right, k, target, cache)?.flatten()?;
        (&l + &r)?
    };
    let pool = pool.with_name(format!("{}p{}>={}", n, k, target));
    cache.insert(key, pool.clone());
    Ok(pool)
}

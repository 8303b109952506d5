//! Applying operators to pools of random variables.
//!
//! The joint distribution of a pool is never enumerated wholesale unless the
//! operator demands it. Members are first grouped into independent blocks:
//! two members share a block when their spaces share an atom, directly or
//! through other members. Only a block with several members has to be
//! enumerated over its own atoms; a singleton block is just its member's
//! distribution. Blocks are then combined according to the operator:
//!
//! * [`Reducer`] operators fold each block, then fold the block results
//!   pairwise in a balanced tree.
//! * [`TopK`] operators do the same over a padded state of the `k` values
//!   kept so far and extract the result at the end.
//! * [`Indexed`] operators select their positions and enumerate those.
//! * [`Naive`] operators enumerate the Cartesian product of the blocks.
//!
//! [`Reducer`]: crate::operator::Reducer
//! [`Indexed`]: crate::operator::Indexed
//! [`Naive`]: crate::operator::Naive

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::dist::Distribution;
use crate::dists::constant;
use crate::error::DrvError;
use crate::operator::{Operator, TopK};
use crate::rv::{Drv, FiniteDrv, Func};
use crate::space::{Outcomes, PSpace};
use crate::value::Value;

/// Where each member's atoms sit in a product space.
struct Layout {
    space: PSpace,
    positions: Vec<Vec<usize>>,
}

impl Layout {
    fn of<T: Value>(members: &[FiniteDrv<T>]) -> Self {
        let spaces: Vec<PSpace> = members.iter().map(|m| m.pspace().clone()).collect();
        let space = PSpace::product(&spaces);
        let index: HashMap<usize, usize> = space
            .atoms()
            .iter()
            .enumerate()
            .map(|(i, atom)| (atom.id(), i))
            .collect();
        let positions = members
            .iter()
            .map(|m| {
                m.pspace()
                    .atoms()
                    .iter()
                    .filter_map(|atom| index.get(&atom.id()).copied())
                    .collect()
            })
            .collect();
        Self { space, positions }
    }

    /// Every member's value at one outcome of the product space.
    fn eval<T: Value>(&self, members: &[FiniteDrv<T>], outcome: &[usize]) -> Result<Vec<T>, DrvError> {
        members
            .iter()
            .zip(&self.positions)
            .map(|(member, positions)| {
                let own = positions
                    .iter()
                    .map(|&i| {
                        outcome.get(i).copied().ok_or(DrvError::IndexOutOfBounds {
                            index: i,
                            size: outcome.len(),
                        })
                    })
                    .collect::<Result<Vec<usize>, _>>()?;
                member.eval(&own)
            })
            .collect()
    }
}

/// Members that must be enumerated together, with their joint values.
struct Block<T: Value> {
    members: Vec<usize>,
    joint: Vec<(Vec<T>, f64)>,
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Group members linked through shared atoms, ordered by first member.
fn partition<T: Value>(pool: &[FiniteDrv<T>]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..pool.len()).collect();
    let mut owner: HashMap<usize, usize> = HashMap::new();
    for (i, member) in pool.iter().enumerate() {
        for atom in member.pspace().atoms() {
            match owner.get(&atom.id()) {
                Some(&j) => {
                    let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                    parent[a.max(b)] = a.min(b);
                }
                None => {
                    owner.insert(atom.id(), i);
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for i in 0..pool.len() {
        let root = find(&mut parent, i);
        match slot.get(&root) {
            Some(&g) => groups[g].push(i),
            None => {
                slot.insert(root, groups.len());
                groups.push(vec![i]);
            }
        }
    }
    groups
}

fn block<T: Value>(pool: &[FiniteDrv<T>], members: Vec<usize>) -> Result<Block<T>, DrvError> {
    if let [only] = members[..] {
        let joint = pool[only]
            .distribution()
            .iter()
            .map(|(x, p)| (vec![x.clone()], p))
            .collect();
        return Ok(Block { members, joint });
    }

    let sub: Vec<FiniteDrv<T>> = members.iter().map(|&i| pool[i].clone()).collect();
    let layout = Layout::of(&sub);
    let mut merged: BTreeMap<Vec<T>, f64> = BTreeMap::new();
    for outcome in layout.space.outcomes()? {
        let p = layout.space.p(&outcome);
        if p > 0.0 {
            *merged.entry(layout.eval(&sub, &outcome)?).or_insert(0.0) += p;
        }
    }
    trace!(
        members = members.len(),
        atoms = layout.space.arity(),
        support = merged.len(),
        "enumerated dependent block"
    );
    Ok(Block {
        members,
        joint: merged.into_iter().collect(),
    })
}

fn blocks<T: Value>(pool: &[FiniteDrv<T>]) -> Result<Vec<Block<T>>, DrvError> {
    partition(pool)
        .into_iter()
        .map(|members| block(pool, members))
        .collect()
}

/// Evaluate `eval` on every combination of block values.
fn enumerate<T, F>(size: usize, blocks: &[Block<T>], eval: F) -> Result<BTreeMap<T, f64>, DrvError>
where
    T: Value,
    F: Fn(&[T]) -> Result<T, DrvError>,
{
    let radices = blocks.iter().map(|b| b.joint.len()).collect();
    let mut slots: Vec<Option<T>> = vec![None; size];
    let mut merged = BTreeMap::new();
    for pick in Outcomes::new(radices) {
        let mut p = 1.0;
        for (block, &j) in blocks.iter().zip(&pick) {
            let (values, q) = &block.joint[j];
            p *= q;
            for (&m, v) in block.members.iter().zip(values) {
                slots[m] = Some(v.clone());
            }
        }
        if p > 0.0 {
            let tuple: Vec<T> = slots.iter().flatten().cloned().collect();
            *merged.entry(eval(&tuple)?).or_insert(0.0) += p;
        }
    }
    Ok(merged)
}

fn convolve<S, F>(a: &BTreeMap<S, f64>, b: &BTreeMap<S, f64>, merge: &F) -> Result<BTreeMap<S, f64>, DrvError>
where
    S: Ord,
    F: Fn(&S, &S) -> Result<S, DrvError>,
{
    let mut out = BTreeMap::new();
    for (x, p) in a {
        for (y, q) in b {
            let pq = p * q;
            if pq > 0.0 {
                *out.entry(merge(x, y)?).or_insert(0.0) += pq;
            }
        }
    }
    Ok(out)
}

/// Fold independent distributions pairwise in a balanced tree.
fn fold_balanced<S, F>(mut layer: Vec<BTreeMap<S, f64>>, merge: F) -> Result<BTreeMap<S, f64>, DrvError>
where
    S: Ord,
    F: Fn(&S, &S) -> Result<S, DrvError>,
{
    while layer.len() > 1 {
        let mut next = Vec::with_capacity((layer.len() + 1) / 2);
        let mut rest = layer.into_iter();
        while let Some(a) = rest.next() {
            match rest.next() {
                Some(b) => next.push(convolve(&a, &b, &merge)?),
                None => next.push(a),
            }
        }
        layer = next;
    }
    Ok(layer.pop().unwrap_or_default())
}

fn aggregate<S, I, F>(entries: I, f: F) -> Result<BTreeMap<S, f64>, DrvError>
where
    S: Ord,
    I: IntoIterator<Item = (Vec<S>, f64)>,
    F: Fn(&[S]) -> Result<S, DrvError>,
{
    let mut out = BTreeMap::new();
    for (values, p) in entries {
        *out.entry(f(&values)?).or_insert(0.0) += p;
    }
    Ok(out)
}

fn top_k<T: Value>(top: &TopK, blocks: &[Block<T>]) -> Result<BTreeMap<T, f64>, DrvError> {
    let empty: Vec<Option<T>> = vec![None; top.k];
    let layer = blocks
        .iter()
        .map(|b| {
            let mut states: BTreeMap<Vec<Option<T>>, f64> = BTreeMap::new();
            for (values, p) in &b.joint {
                let state = values
                    .iter()
                    .fold(empty.clone(), |s, x| top.merge(&s, &top.cast(x)));
                *states.entry(state).or_insert(0.0) += p;
            }
            states
        })
        .collect();
    let folded = fold_balanced(layer, |a, b| Ok(top.merge(a, b)))?;

    let mut out = BTreeMap::new();
    for (state, p) in folded {
        *out.entry(top.uncast(&state)?).or_insert(0.0) += p;
    }
    Ok(out)
}

/// Replace `{0}`, `{1}`, … with the names of the pool members.
///
/// Placeholders with no matching member are left as they are.
pub fn render_name<T: Value>(template: &str, pool: &[FiniteDrv<T>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let member = tail.find('}').and_then(|close| {
            let index: usize = tail[1..close].parse().ok()?;
            Some((pool.get(index)?, close))
        });
        match member {
            Some((member, close)) => {
                out.push_str(member.name());
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Apply `op` to `pool`, producing a new random variable named after
/// `name` (see [`render_name`]).
///
/// The result lives on the product of all members' spaces and stays a
/// function of their outcomes, so it can be combined again with any member
/// without losing the correlation.
///
/// # Example
///
/// ```rust
/// use drv::{combine, uniform, Operator};
///
/// let d6 = || uniform("d6", (1..=6).collect()).unwrap();
/// let pool = [d6(), d6(), d6()];
/// let total = combine(&pool, &Operator::sum(), "3d6").unwrap();
///
/// assert_eq!(*total.min(), 3);
/// assert_eq!(*total.max(), 18);
/// assert!((total.mean() - 10.5).abs() < 1e-12);
/// ```
///
/// # Errors
///
/// * `EmptyPool` for an empty pool when the operator has no identity.
/// * `IndexOutOfBounds` when an indexed operator reads a missing position.
/// * `InvalidOperatorResult` when the operator has no representable result
///   for some joint outcome.
pub fn combine<T: Value>(
    pool: &[FiniteDrv<T>],
    op: &Operator<T>,
    name: &str,
) -> Result<FiniteDrv<T>, DrvError> {
    let name = render_name(name, pool);
    if pool.is_empty() {
        return match op.identity() {
            Some(identity) => Ok(constant(identity).with_name(name)),
            None => Err(DrvError::EmptyPool {
                operator: op.name(),
            }),
        };
    }

    let (merged, block_count) = match op {
        Operator::Reduce(reducer) => {
            let blocks = blocks(pool)?;
            let layer = blocks
                .iter()
                .map(|b| aggregate(b.joint.iter().cloned(), |v| reducer.fold(v)))
                .collect::<Result<Vec<_>, _>>()?;
            (fold_balanced(layer, |a, b| reducer.merge(a, b))?, blocks.len())
        }
        Operator::TopK(top) => {
            let blocks = blocks(pool)?;
            (top_k(top, &blocks)?, blocks.len())
        }
        Operator::Indexed(indexed) => {
            indexed.check(pool.len())?;
            let selected: Vec<FiniteDrv<T>> =
                indexed.indices().iter().map(|&i| pool[i].clone()).collect();
            let blocks = blocks(&selected)?;
            (
                enumerate(selected.len(), &blocks, |args| indexed.call(args))?,
                blocks.len(),
            )
        }
        Operator::Naive(naive) => {
            let blocks = blocks(pool)?;
            (
                enumerate(pool.len(), &blocks, |values| naive.apply(values))?,
                blocks.len(),
            )
        }
    };
    let dist = Distribution::from_map(merged)?;

    debug!(
        operator = %op.name(),
        strategy = op.strategy(),
        pool = pool.len(),
        blocks = block_count,
        support = dist.len(),
        "combined pool"
    );

    let layout = Layout::of(pool);
    let space = layout.space.clone();
    let members: Vec<FiniteDrv<T>> = pool.to_vec();
    let op = op.clone();
    let func: Func<T> = Arc::new(move |w: &[usize]| op.apply(&layout.eval(&members, w)?));
    Ok(FiniteDrv::from_parts(name, space, func, dist))
}

/// [`combine`] for general random variables.
///
/// # Errors
///
/// `UnsupportedOperation` if any member has infinite support.
pub fn combine_general<T: Value>(
    pool: &[Drv<T>],
    op: &Operator<T>,
    name: &str,
) -> Result<FiniteDrv<T>, DrvError> {
    let finite = pool
        .iter()
        .map(|rv| rv.clone().into_finite())
        .collect::<Result<Vec<_>, _>>()?;
    combine(&finite, op, name)
}

/// An ordered collection of random variables to combine.
///
/// # Example
///
/// ```rust
/// use drv::{uniform, Pool};
///
/// let d6 = uniform("d6", (1..=6).collect()).unwrap();
/// let pool = Pool::independent(&d6, 4).unwrap();
/// let best3 = pool.highest(3).unwrap();
/// assert_eq!(*best3.max(), 18);
/// ```
#[derive(Debug, Clone)]
pub struct Pool<T: Value = i64> {
    members: Vec<FiniteDrv<T>>,
}

impl<T: Value> Pool<T> {
    pub fn new(members: Vec<FiniteDrv<T>>) -> Self {
        Self { members }
    }

    /// `n` independent copies of `rv`, each on a fresh space.
    pub fn independent(rv: &FiniteDrv<T>, n: usize) -> Result<Self, DrvError> {
        let members = (0..n).map(|_| rv.flatten()).collect::<Result<_, _>>()?;
        Ok(Self { members })
    }

    pub fn push(&mut self, rv: FiniteDrv<T>) {
        self.members.push(rv);
    }

    pub fn members(&self) -> &[FiniteDrv<T>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn default_name(&self, op: &Operator<T>) -> String {
        let names: Vec<&str> = self.members.iter().map(FiniteDrv::name).collect();
        format!("{}({})", op.name(), names.join(", "))
    }

    /// Apply any operator; `name` is a template as in [`render_name`].
    pub fn apply(&self, op: &Operator<T>, name: &str) -> Result<FiniteDrv<T>, DrvError> {
        combine(&self.members, op, name)
    }

    fn apply_named(&self, op: Operator<T>) -> Result<FiniteDrv<T>, DrvError> {
        let name = self.default_name(&op);
        combine(&self.members, &op, &name)
    }

    pub fn sum(&self) -> Result<FiniteDrv<T>, DrvError> {
        self.apply_named(Operator::sum())
    }

    pub fn product(&self) -> Result<FiniteDrv<T>, DrvError> {
        self.apply_named(Operator::product())
    }

    pub fn min(&self) -> Result<FiniteDrv<T>, DrvError> {
        self.apply_named(Operator::min())
    }

    pub fn max(&self) -> Result<FiniteDrv<T>, DrvError> {
        self.apply_named(Operator::max())
    }

    /// Sum of the `k` highest members.
    pub fn highest(&self, k: usize) -> Result<FiniteDrv<T>, DrvError> {
        self.apply_named(Operator::highest(k))
    }

    /// Sum of the `k` lowest members.
    pub fn lowest(&self, k: usize) -> Result<FiniteDrv<T>, DrvError> {
        self.apply_named(Operator::lowest(k))
    }

    /// The `n`-th highest member, counting from 1.
    pub fn nth_highest(&self, n: usize) -> Result<FiniteDrv<T>, DrvError> {
        self.apply_named(Operator::nth_highest(n))
    }
}

impl<T: Value> From<Vec<FiniteDrv<T>>> for Pool<T> {
    fn from(members: Vec<FiniteDrv<T>>) -> Self {
        Self::new(members)
    }
}

impl<T: Value> FromIterator<FiniteDrv<T>> for Pool<T> {
    fn from_iter<I: IntoIterator<Item = FiniteDrv<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dists::{primitive, uniform};
    use crate::operator::Comparison;

    fn d6() -> FiniteDrv<i64> {
        uniform("d6", (1..=6).collect()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_independent_dice_convolve() {
        let two = combine(&[d6(), d6()], &Operator::sum(), "2d6").unwrap();
        assert!(close(two.pmf(&7), 6.0 / 36.0));
        assert!(close(two.pmf(&2), 1.0 / 36.0));
        assert_eq!(two.support().len(), 11);
    }

    #[test]
    fn test_same_die_twice_is_doubled() {
        let x = d6();
        let doubled = combine(&[x.clone(), x.clone()], &Operator::sum(), "{0}+{1}").unwrap();
        assert_eq!(doubled.support(), &[2, 4, 6, 8, 10, 12]);
        assert_eq!(doubled.pmf(&7), 0.0);
        assert!(close(doubled.variance(), 4.0 * x.variance()));
        assert!(doubled.pspace().same(x.pspace()));
    }

    #[test]
    fn test_reduce_matches_naive() {
        let pool = [d6(), d6(), primitive("loaded", vec![1_i64, 2, 3], &[3.0, 2.0, 1.0]).unwrap()];
        let reduced = combine(&pool, &Operator::sum(), "sum").unwrap();
        let naive = combine(
            &pool,
            &Operator::custom("sum", |v: &[i64]| Some(v.iter().sum())),
            "sum",
        )
        .unwrap();
        assert!(reduced.distribution().tv_distance(naive.distribution()) < 1e-12);
    }

    #[test]
    fn test_top_k_matches_naive() {
        let pool = [d6(), d6(), d6(), d6()];
        let kept = combine(&pool, &Operator::highest(3), "4d6kh3").unwrap();
        let naive = combine(
            &pool,
            &Operator::custom("4d6kh3", |v: &[i64]| {
                let mut sorted = v.to_vec();
                sorted.sort_unstable();
                Some(sorted[1..].iter().sum())
            }),
            "4d6kh3",
        )
        .unwrap();
        assert!(kept.distribution().tv_distance(naive.distribution()) < 1e-12);
        assert!(close(kept.pmf(&18), 21.0 / 1296.0));
    }

    #[test]
    fn test_nth_highest_of_two_dice() {
        let low = combine(&[d6(), d6()], &Operator::nth_highest(2), "low").unwrap();
        // P(min = 1) = 11/36
        assert!(close(low.pmf(&1), 11.0 / 36.0));
        let high = combine(&[d6(), d6()], &Operator::max(), "high").unwrap();
        assert!(close(high.pmf(&6), 11.0 / 36.0));
    }

    #[test]
    fn test_top_k_larger_than_pool() {
        let pool = [d6(), d6()];
        let all = combine(&pool, &Operator::highest(3), "all").unwrap();
        let sum = combine(&pool, &Operator::sum(), "sum").unwrap();
        assert!(all.distribution().tv_distance(sum.distribution()) < 1e-12);
    }

    #[test]
    fn test_dependent_members_share_a_block() {
        let x = d6();
        let y = x.map("x+1", |v| v + 1).unwrap();
        let diff = combine(&[y, x], &Operator::sub(), "y-x").unwrap();
        assert_eq!(diff.support(), &[1]);
    }

    #[test]
    fn test_result_stays_correlated_with_members() {
        let x = d6();
        let y = primitive("y", vec![0_i64, 10], &[1.0, 1.0]).unwrap();
        let s = combine(&[x.clone(), y.clone()], &Operator::sum(), "s").unwrap();
        let back = combine(&[s, x], &Operator::sub(), "s-x").unwrap();
        assert!(back.distribution().tv_distance(y.distribution()) < 1e-12);
    }

    #[test]
    fn test_mixed_blocks() {
        // x appears twice and z once; the pool has two independent blocks.
        let x = d6();
        let z = d6();
        let total = combine(&[x.clone(), z.clone(), x.clone()], &Operator::sum(), "2x+z").unwrap();
        assert!(close(total.mean(), 3.0 * 3.5));
        let expected = 4.0 * x.variance() + z.variance();
        assert!((total.variance() - expected).abs() < 1e-9);
        assert_eq!(partition(&[x.clone(), z, x]), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_empty_pool() {
        let zero = combine::<i64>(&[], &Operator::sum(), "nothing").unwrap();
        assert_eq!(zero.support(), &[0]);
        assert_eq!(zero.name(), "nothing");
        assert!(matches!(
            combine::<i64>(&[], &Operator::max(), "nothing"),
            Err(DrvError::EmptyPool { .. })
        ));
    }

    #[test]
    fn test_indexed_out_of_bounds() {
        let result = combine(&[d6()], &Operator::sub(), "bad");
        assert!(matches!(
            result,
            Err(DrvError::IndexOutOfBounds { index: 1, size: 1 })
        ));
    }

    #[test]
    fn test_invalid_operator_result() {
        let half = Operator::from_real("half", |v| v[0] / 2.0);
        let result = combine(&[d6()], &half, "half");
        assert!(matches!(result, Err(DrvError::InvalidOperatorResult { .. })));
    }

    #[test]
    fn test_comparison_of_independent_dice() {
        let wins = combine(&[d6(), d6()], &Operator::compare(Comparison::Gt), "a>b").unwrap();
        assert!(close(wins.pmf(&1), 15.0 / 36.0));
    }

    #[test]
    fn test_render_name() {
        let a = d6().with_name("a");
        let b = d6().with_name("{0}");
        assert_eq!(render_name("{0} vs {1}", &[a.clone(), b]), "a vs {0}");
        assert_eq!(render_name("{2} and {x}", &[a]), "{2} and {x}");
    }

    #[test]
    fn test_pool_methods() {
        let pool = Pool::independent(&d6(), 3).unwrap();
        let sum = pool.sum().unwrap();
        assert_eq!(sum.name(), "sum(d6, d6, d6)");
        assert!(close(sum.mean(), 10.5));
        assert_eq!(*pool.min().unwrap().max(), 6);
        assert_eq!(*pool.lowest(2).unwrap().max(), 12);
        assert_eq!(*pool.nth_highest(2).unwrap().min(), 1);
        assert!(close(pool.product().unwrap().mean(), 3.5_f64.powi(3)));
    }

    #[test]
    fn test_combine_general_rejects_infinite_members() {
        use crate::config::EngineConfig;
        use crate::dists::geometric;
        use crate::integrate::NumericIntegrator;

        let config = EngineConfig::default();
        let g = geometric(0.5, Arc::new(NumericIntegrator::default()), &config).unwrap();
        let finite: Drv<i64> = d6().into();
        let result = combine_general(&[finite.clone(), g], &Operator::sum(), "bad");
        assert!(matches!(result, Err(DrvError::UnsupportedOperation { .. })));
        let ok = combine_general(&[finite.clone(), finite], &Operator::sum(), "2x").unwrap();
        assert_eq!(*ok.max(), 12);
    }
}

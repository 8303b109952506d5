//! Probability spaces `(Ω, F, P)`.
//!
//! Only discrete spaces are modelled, so a space is fully described by the
//! probability `p(w)` of each outcome `w`. Atomic spaces have outcomes
//! `0, 1, 2, …`; a product space has tuples of atomic outcomes.
//!
//! Spaces are immutable and shared: a [`PSpace`] is a handle, and two
//! handles are the *same* space only when they point at the same allocation.
//! That identity is what makes `X + X` (one die read twice) different from
//! `X + Y` (two dice that happen to look alike): the product of a space with
//! itself is the space, not its square.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{DistributionFault, DrvError};
use crate::integrate::{FloatNormalizer, Integrator, Normalizer, Summation};

/// Unnormalized mass function of an infinite space.
pub type MassFn = Arc<dyn Fn(u64) -> f64 + Send + Sync>;

enum SpaceKind {
    Finite {
        probs: Vec<f64>,
    },
    Infinite {
        mass: MassFn,
        scale: f64,
        assumed: bool,
        integrator: Arc<dyn Integrator>,
    },
    Product {
        atoms: Vec<PSpace>,
    },
}

/// A shared handle to a discrete probability space.
///
/// # Example
///
/// ```rust
/// use drv::PSpace;
///
/// let die = PSpace::uniform(6).unwrap();
/// let coin = PSpace::finite(&[1.0, 1.0]).unwrap();
///
/// let joint = PSpace::product(&[die.clone(), coin.clone()]);
/// assert_eq!(joint.len(), Some(12));
/// assert!((joint.p(&[0, 1]) - 1.0 / 12.0).abs() < 1e-12);
///
/// // A space combined with itself is not squared.
/// let same = PSpace::product(&[die.clone(), die.clone()]);
/// assert!(same.same(&die));
/// ```
#[derive(Clone)]
pub struct PSpace {
    inner: Arc<SpaceKind>,
}

impl PSpace {
    fn from_kind(kind: SpaceKind) -> Self {
        Self {
            inner: Arc::new(kind),
        }
    }

    /// A finite space over `{0, …, n-1}` from raw nonnegative weights.
    ///
    /// # Errors
    ///
    /// `InvalidDistribution` if the weights are empty, contain a negative or
    /// non-finite value, or sum to zero.
    pub fn finite(weights: &[f64]) -> Result<Self, DrvError> {
        Self::finite_with(weights, &FloatNormalizer)
    }

    /// A finite space normalized by the given capability.
    pub fn finite_with(weights: &[f64], normalizer: &dyn Normalizer) -> Result<Self, DrvError> {
        let probs = normalizer.normalize(weights)?;
        Ok(Self::from_kind(SpaceKind::Finite { probs }))
    }

    /// `n` equally likely outcomes.
    pub fn uniform(n: usize) -> Result<Self, DrvError> {
        if n == 0 {
            return Err(DistributionFault::EmptySupport.into());
        }
        Ok(Self::from_kind(SpaceKind::Finite {
            probs: vec![1.0 / n as f64; n],
        }))
    }

    /// The one-outcome space, `p(0) = 1`.
    pub fn degenerate() -> Self {
        Self::from_kind(SpaceKind::Finite { probs: vec![1.0] })
    }

    /// An infinite space over the naturals from an unnormalized mass function.
    ///
    /// Nonnegativity is checked on the first `config.nonnegativity_probe`
    /// terms only. The total mass comes from `integrator`; if it cannot be
    /// determined the mass function is assumed to be normalized already.
    pub fn infinite<F>(
        mass: F,
        integrator: Arc<dyn Integrator>,
        config: &EngineConfig,
    ) -> Result<Self, DrvError>
    where
        F: Fn(u64) -> f64 + Send + Sync + 'static,
    {
        for k in 0..config.nonnegativity_probe {
            let m = mass(k);
            if m.is_nan() || m.is_infinite() {
                return Err(DistributionFault::NonFiniteProbability.into());
            }
            if m < 0.0 {
                return Err(DistributionFault::NegativeProbability.into());
            }
        }

        let (scale, assumed) = match integrator.sum(&mass) {
            Summation::Converged(total) if total > 0.0 => (total, false),
            Summation::Converged(_) => return Err(DistributionFault::ZeroWeights.into()),
            Summation::Divergent => return Err(DistributionFault::Diverging.into()),
            Summation::Undetermined => {
                warn!("total mass of infinite space undetermined, assuming it is normalized");
                (1.0, true)
            }
        };
        debug!(scale, assumed, "normalized infinite probability space");

        Ok(Self::from_kind(SpaceKind::Infinite {
            mass: Arc::new(mass),
            scale,
            assumed,
            integrator,
        }))
    }

    /// The product of any number of spaces, assuming independence.
    ///
    /// Nested products are flattened into their atoms and atoms are
    /// deduplicated by identity, so the order of first appearance is kept
    /// and a repeated space contributes one coordinate. A product of a single
    /// atom is that atom; the empty product is the one-outcome space.
    pub fn product(spaces: &[PSpace]) -> Self {
        let mut seen = HashSet::new();
        let mut atoms = Vec::new();
        for space in spaces {
            for atom in space.atoms() {
                if seen.insert(atom.id()) {
                    atoms.push(atom);
                }
            }
        }

        if atoms.len() == 1 {
            return atoms.remove(0);
        }
        Self::from_kind(SpaceKind::Product { atoms })
    }

    /// Identity of the underlying allocation.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Whether both handles refer to the very same space.
    pub fn same(&self, other: &PSpace) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether this space is a single coordinate (not a product).
    pub fn is_atom(&self) -> bool {
        !matches!(*self.inner, SpaceKind::Product { .. })
    }

    /// True for an infinite space whose total mass could not be summed, so
    /// its mass function is taken as already normalized.
    pub fn assumes_normalized(&self) -> bool {
        match &*self.inner {
            SpaceKind::Infinite { assumed, .. } => *assumed,
            SpaceKind::Product { atoms } => atoms.iter().any(PSpace::assumes_normalized),
            SpaceKind::Finite { .. } => false,
        }
    }

    pub fn is_finite(&self) -> bool {
        match &*self.inner {
            SpaceKind::Finite { .. } => true,
            SpaceKind::Infinite { .. } => false,
            SpaceKind::Product { atoms } => atoms.iter().all(PSpace::is_finite),
        }
    }

    /// The atomic coordinates; an atom is its own single coordinate.
    pub fn atoms(&self) -> Vec<PSpace> {
        match &*self.inner {
            SpaceKind::Product { atoms } => atoms.clone(),
            _ => vec![self.clone()],
        }
    }

    /// Number of coordinates in an outcome of this space.
    pub fn arity(&self) -> usize {
        match &*self.inner {
            SpaceKind::Product { atoms } => atoms.len(),
            _ => 1,
        }
    }

    /// Number of outcomes; `None` when infinite or too many to count.
    pub fn len(&self) -> Option<usize> {
        match &*self.inner {
            SpaceKind::Finite { probs } => Some(probs.len()),
            SpaceKind::Infinite { .. } => None,
            SpaceKind::Product { atoms } => atoms
                .iter()
                .try_fold(1_usize, |acc, atom| acc.checked_mul(atom.len()?)),
        }
    }

    /// Always false: every space has at least one outcome.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Probability of a single coordinate value of an atomic space.
    fn atom_p(&self, k: usize) -> f64 {
        match &*self.inner {
            SpaceKind::Finite { probs } => probs.get(k).copied().unwrap_or(0.0),
            SpaceKind::Infinite { mass, scale, .. } => mass(k as u64) / scale,
            SpaceKind::Product { .. } => 0.0,
        }
    }

    /// Probability of one outcome, `p(w_1, …, w_k) = Π p_i(w_i)`.
    ///
    /// Outcomes of the wrong arity or out of range have probability 0.
    pub fn p(&self, outcome: &[usize]) -> f64 {
        match &*self.inner {
            SpaceKind::Product { atoms } => {
                if outcome.len() != atoms.len() {
                    return 0.0;
                }
                atoms
                    .iter()
                    .zip(outcome)
                    .map(|(atom, &k)| atom.atom_p(k))
                    .product()
            }
            _ => match outcome {
                [k] => self.atom_p(*k),
                _ => 0.0,
            },
        }
    }

    /// Probability of an event given as a set of outcomes.
    pub fn event_probability<I, O>(&self, event: I) -> f64
    where
        I: IntoIterator<Item = O>,
        O: AsRef<[usize]>,
    {
        let distinct: BTreeSet<Vec<usize>> =
            event.into_iter().map(|o| o.as_ref().to_vec()).collect();
        distinct.iter().map(|o| self.p(o)).sum()
    }

    /// Lazily enumerate every outcome of a finite space.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if any coordinate is infinite.
    pub fn outcomes(&self) -> Result<Outcomes, DrvError> {
        let radices = self
            .atoms()
            .iter()
            .map(|atom| match &*atom.inner {
                SpaceKind::Finite { probs } => Ok(probs.len()),
                _ => Err(DrvError::unsupported(
                    "outcomes",
                    "cannot enumerate an infinite probability space",
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Outcomes::new(radices))
    }

    /// `Σ_w p(w) f(w)` over the whole space.
    ///
    /// Finite spaces are enumerated; a single infinite coordinate is summed
    /// by the space's integrator.
    pub fn integrate<F>(&self, f: F) -> Result<f64, DrvError>
    where
        F: Fn(&[usize]) -> f64,
    {
        if self.is_finite() {
            let mut total = 0.0;
            for outcome in self.outcomes()? {
                let p = self.p(&outcome);
                if p > 0.0 {
                    total += p * f(&outcome);
                }
            }
            return Ok(total);
        }

        match &*self.inner {
            SpaceKind::Infinite {
                mass,
                scale,
                integrator,
                ..
            } => {
                let term = |k: u64| {
                    let p = mass(k) / scale;
                    if p > 0.0 {
                        p * f(&[k as usize])
                    } else {
                        0.0
                    }
                };
                match integrator.sum(&term) {
                    Summation::Converged(total) => Ok(total),
                    Summation::Divergent => Err(DrvError::unsupported(
                        "integrate",
                        "the expectation diverges",
                    )),
                    Summation::Undetermined => Err(DrvError::Undetermined {
                        what: "infinite sum".to_string(),
                    }),
                }
            }
            _ => Err(DrvError::unsupported(
                "integrate",
                "products with infinite coordinates are not supported",
            )),
        }
    }
}

impl fmt::Debug for PSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner {
            SpaceKind::Finite { probs } => f
                .debug_struct("FiniteSpace")
                .field("id", &self.id())
                .field("probs", probs)
                .finish(),
            SpaceKind::Infinite { scale, assumed, .. } => f
                .debug_struct("InfiniteSpace")
                .field("id", &self.id())
                .field("scale", scale)
                .field("assumed", assumed)
                .finish(),
            SpaceKind::Product { atoms } => f
                .debug_struct("ProductSpace")
                .field("id", &self.id())
                .field("atoms", atoms)
                .finish(),
        }
    }
}

/// Odometer over the Cartesian product of `{0..r_1} × … × {0..r_k}`.
#[derive(Debug, Clone)]
pub struct Outcomes {
    radices: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl Outcomes {
    pub(crate) fn new(radices: Vec<usize>) -> Self {
        let done = radices.contains(&0);
        Self {
            current: vec![0; radices.len()],
            radices,
            done,
        }
    }
}

impl Iterator for Outcomes {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();

        // Advance the last coordinate fastest.
        let mut i = self.radices.len();
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            self.current[i] += 1;
            if self.current[i] < self.radices[i] {
                break;
            }
            self.current[i] = 0;
        }

        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrate::NumericIntegrator;
    use crate::PROB_TOLERANCE;

    fn total(space: &PSpace) -> f64 {
        space.outcomes().unwrap().map(|w| space.p(&w)).sum()
    }

    #[test]
    fn test_finite_normalizes() {
        let s = PSpace::finite(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((s.p(&[4]) - 5.0 / 15.0).abs() < PROB_TOLERANCE);
        assert!((total(&s) - 1.0).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_finite_rejects_invalid() {
        assert!(matches!(
            PSpace::finite(&[1.0, -1.0]),
            Err(DrvError::InvalidDistribution(DistributionFault::NegativeProbability))
        ));
        assert!(matches!(
            PSpace::finite(&[0.0, 0.0]),
            Err(DrvError::InvalidDistribution(DistributionFault::ZeroWeights))
        ));
        assert!(matches!(
            PSpace::finite(&[]),
            Err(DrvError::InvalidDistribution(DistributionFault::EmptySupport))
        ));
    }

    #[test]
    fn test_out_of_range_outcomes_have_zero_probability() {
        let s = PSpace::uniform(3).unwrap();
        assert_eq!(s.p(&[3]), 0.0);
        assert_eq!(s.p(&[0, 0]), 0.0);
        assert_eq!(s.p(&[]), 0.0);
    }

    #[test]
    fn test_degenerate() {
        let d = PSpace::degenerate();
        assert_eq!(d.len(), Some(1));
        assert_eq!(d.p(&[0]), 1.0);
        assert_eq!(d.outcomes().unwrap().collect::<Vec<_>>(), vec![vec![0]]);
    }

    #[test]
    fn test_product_outcomes_and_probabilities() {
        let a = PSpace::finite(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let b = PSpace::finite(&[2.0, 3.0, 4.0]).unwrap();
        let ab = PSpace::product(&[a.clone(), b.clone()]);

        let outcomes: Vec<_> = ab.outcomes().unwrap().collect();
        assert_eq!(outcomes.len(), 15);
        assert_eq!(outcomes[0], vec![0, 0]);
        assert_eq!(outcomes[1], vec![0, 1]);
        assert_eq!(outcomes[14], vec![4, 2]);

        assert!((ab.p(&[1, 2]) - a.p(&[1]) * b.p(&[2])).abs() < 1e-15);
        assert!((total(&ab) - 1.0).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_product_deduplicates_by_identity() {
        let a = PSpace::uniform(6).unwrap();
        let twin = PSpace::uniform(6).unwrap();

        let aa = PSpace::product(&[a.clone(), a.clone()]);
        assert!(aa.same(&a));
        assert_eq!(aa.len(), Some(6));

        let a_twin = PSpace::product(&[a.clone(), twin.clone()]);
        assert_eq!(a_twin.arity(), 2);
        assert_eq!(a_twin.len(), Some(36));
    }

    #[test]
    fn test_product_flattens_nested_products() {
        let a = PSpace::uniform(2).unwrap();
        let b = PSpace::uniform(3).unwrap();
        let c = PSpace::uniform(4).unwrap();
        let ab = PSpace::product(&[a.clone(), b.clone()]);
        let bc = PSpace::product(&[b.clone(), c.clone()]);

        let abc = PSpace::product(&[ab, bc]);
        let atoms = abc.atoms();
        assert_eq!(atoms.len(), 3);
        assert!(atoms[0].same(&a));
        assert!(atoms[1].same(&b));
        assert!(atoms[2].same(&c));
    }

    #[test]
    fn test_empty_product_is_one_outcome() {
        let e = PSpace::product(&[]);
        assert!(e.is_finite());
        assert_eq!(e.len(), Some(1));
        let outcomes: Vec<_> = e.outcomes().unwrap().collect();
        assert_eq!(outcomes, vec![Vec::<usize>::new()]);
        assert_eq!(e.p(&[]), 1.0);
    }

    #[test]
    fn test_event_probability_counts_each_outcome_once() {
        let s = PSpace::uniform(4).unwrap();
        let p = s.event_probability([[0_usize], [1], [1]]);
        assert!((p - 0.5).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_integrate_matches_per_coordinate_integration() {
        let a = PSpace::finite(&[1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0]).unwrap();
        let b = PSpace::finite(&[1.0, 1.0, 2.0, 0.0, 5.0, 8.0, 13.0, 0.0, 34.0, 0.0]).unwrap();
        let ab = PSpace::product(&[a.clone(), b.clone()]);

        let joint = ab.integrate(|w| (w[0] + w[1]) as f64).unwrap();
        let ea = a.integrate(|w| w[0] as f64).unwrap();
        let eb = b.integrate(|w| w[0] as f64).unwrap();
        assert!((joint - (ea + eb)).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_infinite_space() {
        let config = EngineConfig::default();
        let integrator = Arc::new(NumericIntegrator::from_config(&config));
        // 1 / (k + 1)^2 sums to pi^2 / 6
        let s = PSpace::infinite(|k| 1.0 / ((k + 1) as f64).powi(2), integrator, &config);

        // Converges too slowly for the numeric integrator; assumed normalized.
        let s = s.unwrap();
        assert!(s.assumes_normalized());
        assert_eq!(s.p(&[0]), 1.0);
        assert!(!s.is_finite());
        assert_eq!(s.len(), None);
        assert!(s.outcomes().is_err());
    }

    #[test]
    fn test_infinite_space_normalizes_geometric_weights() {
        let config = EngineConfig::default();
        let integrator = Arc::new(NumericIntegrator::from_config(&config));
        let s = PSpace::infinite(|k| 2.0 * 0.5_f64.powi(k as i32), integrator, &config).unwrap();
        assert!(!s.assumes_normalized());
        assert!((s.p(&[0]) - 0.5).abs() < 1e-9);
        let mean = s.integrate(|w| w[0] as f64).unwrap();
        assert!((mean - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_infinite_space_sees_mass_past_a_gap() {
        let config = EngineConfig::default();
        let integrator = Arc::new(NumericIntegrator::from_config(&config));
        let s = PSpace::infinite(
            |k| if k == 0 || k == 200 { 1.0 } else { 0.0 },
            integrator,
            &config,
        )
        .unwrap();
        assert!(!s.assumes_normalized());
        assert!((s.p(&[0]) - 0.5).abs() < PROB_TOLERANCE);
        assert!((s.p(&[200]) - 0.5).abs() < PROB_TOLERANCE);
        let mean = s.integrate(|w| w[0] as f64).unwrap();
        assert!((mean - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_infinite_space_rejects_negative_and_divergent_mass() {
        let config = EngineConfig::default();
        let integrator: Arc<dyn Integrator> = Arc::new(NumericIntegrator::from_config(&config));
        assert!(matches!(
            PSpace::infinite(|k| if k == 3 { -1.0 } else { 0.1 }, integrator.clone(), &config),
            Err(DrvError::InvalidDistribution(DistributionFault::NegativeProbability))
        ));
        assert!(matches!(
            PSpace::infinite(|k| 2.0_f64.powi(k as i32), integrator, &config),
            Err(DrvError::InvalidDistribution(DistributionFault::Diverging))
        ));
    }

    #[test]
    fn test_product_with_infinite_atom_is_not_enumerable() {
        let config = EngineConfig::default();
        let integrator = Arc::new(NumericIntegrator::from_config(&config));
        let inf = PSpace::infinite(|k| 0.5_f64.powi(k as i32 + 1), integrator, &config).unwrap();
        let fin = PSpace::uniform(2).unwrap();
        let prod = PSpace::product(&[inf, fin]);
        assert!(!prod.is_finite());
        assert!(prod.outcomes().is_err());
        assert!(prod.integrate(|_| 1.0).is_err());
    }
}

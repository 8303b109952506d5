//! Pushforward distributions: the law of a random variable on its values.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{DistributionFault, DrvError};
use crate::value::Value;

/// A probability distribution over a finite set of values.
///
/// Invariants:
/// - Values are distinct and sorted ascending
/// - Every listed value has strictly positive probability
/// - Probabilities sum to 1
///
/// # Example
///
/// ```rust
/// use drv::Distribution;
///
/// // Two coins, counting heads
/// let heads = Distribution::from_masses(vec![(0_i64, 1.0), (1, 2.0), (2, 1.0)]).unwrap();
/// assert!((heads.pmf(&1) - 0.5).abs() < 1e-12);
/// assert!((heads.cdf(&1) - 0.75).abs() < 1e-12);
/// assert!((heads.mean() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution<T: Value> {
    values: Vec<T>,
    probs: Vec<f64>,
    #[serde(skip)]
    cumulative: Vec<f64>,
}

impl<T: Value> Distribution<T> {
    /// Aggregate `(value, mass)` pairs into a distribution.
    ///
    /// Equal values are merged, zero masses dropped and the result
    /// renormalized.
    ///
    /// # Errors
    ///
    /// `InvalidDistribution` if a mass is negative or not finite, or if no
    /// positive mass remains.
    pub fn from_masses<I>(masses: I) -> Result<Self, DrvError>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let mut merged: BTreeMap<T, f64> = BTreeMap::new();
        for (value, mass) in masses {
            if !mass.is_finite() {
                return Err(DistributionFault::NonFiniteProbability.into());
            }
            if mass < 0.0 {
                return Err(DistributionFault::NegativeProbability.into());
            }
            if mass > 0.0 {
                *merged.entry(value).or_insert(0.0) += mass;
            }
        }
        Self::from_map(merged)
    }

    pub(crate) fn from_map(merged: BTreeMap<T, f64>) -> Result<Self, DrvError> {
        if merged.is_empty() {
            return Err(DistributionFault::EmptySupport.into());
        }
        let total: f64 = merged.values().sum();
        if !total.is_finite() {
            return Err(DistributionFault::NonFiniteProbability.into());
        }

        let (values, probs): (Vec<T>, Vec<f64>) =
            merged.into_iter().map(|(v, p)| (v, p / total)).unzip();

        let mut cumulative = Vec::with_capacity(probs.len());
        let mut running = 0.0;
        for p in &probs {
            running += p;
            cumulative.push(running);
        }

        Ok(Self {
            values,
            probs,
            cumulative,
        })
    }

    /// A point mass.
    pub fn point(value: T) -> Self {
        Self {
            values: vec![value],
            probs: vec![1.0],
            cumulative: vec![1.0],
        }
    }

    /// Number of values in the support.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a valid distribution.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values with positive probability, ascending.
    pub fn support(&self) -> &[T] {
        &self.values
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    /// `(value, probability)` pairs, ascending by value.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.values.iter().zip(self.probs.iter().copied())
    }

    /// P(X = x). Zero outside the support.
    pub fn pmf(&self, x: &T) -> f64 {
        match self.values.binary_search(x) {
            Ok(i) => self.probs[i],
            Err(_) => 0.0,
        }
    }

    /// P(X ≤ x).
    pub fn cdf(&self, x: &T) -> f64 {
        let below = self.values.partition_point(|v| v <= x);
        if below == 0 {
            0.0
        } else {
            self.cumulative[below - 1].min(1.0)
        }
    }

    /// Survival function P(X > x).
    pub fn sf(&self, x: &T) -> f64 {
        (1.0 - self.cdf(x)).max(0.0)
    }

    /// log P(X = x); `-inf` outside the support.
    pub fn log_pmf(&self, x: &T) -> f64 {
        self.pmf(x).ln()
    }

    pub fn log_cdf(&self, x: &T) -> f64 {
        self.cdf(x).ln()
    }

    pub fn log_sf(&self, x: &T) -> f64 {
        self.sf(x).ln()
    }

    /// Percent point function (inverse CDF): the smallest `x` with `cdf(x) ≥ q`.
    ///
    /// # Errors
    ///
    /// `InvalidQuantile` unless `0 < q ≤ 1`.
    pub fn ppf(&self, q: f64) -> Result<&T, DrvError> {
        if !(q > 0.0 && q <= 1.0) {
            return Err(DrvError::InvalidQuantile { q });
        }
        Ok(self.quantile(q))
    }

    fn quantile(&self, q: f64) -> &T {
        let i = self.cumulative.partition_point(|&c| c < q);
        // Rounding can leave the last prefix sum just under 1.
        &self.values[i.min(self.values.len() - 1)]
    }

    /// Inverse survival function: the smallest `x` with `sf(x) ≤ q`.
    ///
    /// # Errors
    ///
    /// `InvalidQuantile` unless `0 ≤ q < 1`.
    pub fn isf(&self, q: f64) -> Result<&T, DrvError> {
        if !(0.0..1.0).contains(&q) {
            return Err(DrvError::InvalidQuantile { q });
        }
        Ok(self.upper_quantile(q))
    }

    fn upper_quantile(&self, q: f64) -> &T {
        // sf after index i is 1 - cumulative[i]
        let i = self.cumulative.partition_point(|&c| 1.0 - c > q);
        &self.values[i.min(self.values.len() - 1)]
    }

    /// Central interval holding at least `alpha` of the mass: the
    /// `(1 - alpha) / 2` quantile and its upper counterpart.
    ///
    /// # Errors
    ///
    /// `InvalidQuantile` unless `0 ≤ alpha ≤ 1`.
    pub fn interval(&self, alpha: f64) -> Result<(&T, &T), DrvError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(DrvError::InvalidQuantile { q: alpha });
        }
        let tail = (1.0 - alpha) / 2.0;
        let low = if tail > 0.0 { self.quantile(tail) } else { self.min() };
        Ok((low, self.upper_quantile(tail)))
    }

    /// The median, as `ppf(0.5)`.
    pub fn median(&self) -> &T {
        self.quantile(0.5)
    }

    pub fn min(&self) -> &T {
        &self.values[0]
    }

    pub fn max(&self) -> &T {
        &self.values[self.values.len() - 1]
    }

    /// Most likely value; the smallest one if there are ties.
    pub fn mode(&self) -> &T {
        let mut best = 0;
        for (i, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = i;
            }
        }
        &self.values[best]
    }

    /// `E[f(X)]`.
    pub fn expectation<F>(&self, f: F) -> f64
    where
        F: Fn(&T) -> f64,
    {
        self.iter().map(|(x, p)| f(x) * p).sum()
    }

    /// Probability that `event` holds.
    pub fn pr<F>(&self, event: F) -> f64
    where
        F: Fn(&T) -> bool,
    {
        self.iter().filter(|(x, _)| event(x)).map(|(_, p)| p).sum()
    }

    pub fn mean(&self) -> f64 {
        self.expectation(T::to_f64)
    }

    /// Central second moment.
    pub fn variance(&self) -> f64 {
        let mu = self.mean();
        self.expectation(|x| {
            let d = x.to_f64() - mu;
            d * d
        })
    }

    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    /// The `n`-th raw moment `E[X^n]`.
    pub fn moment(&self, n: i32) -> f64 {
        self.expectation(|x| x.to_f64().powi(n))
    }

    /// Moment generating function `E[e^{tX}]`.
    pub fn mgf(&self, t: f64) -> f64 {
        self.expectation(|x| (t * x.to_f64()).exp())
    }

    /// Shannon entropy in nats: `H = -Σ p log p`.
    pub fn entropy(&self) -> f64 {
        self.probs.iter().map(|&p| -p * p.ln()).sum()
    }

    /// Shannon entropy in bits.
    pub fn entropy_bits(&self) -> f64 {
        self.entropy() / std::f64::consts::LN_2
    }

    /// Total variation distance: `0.5 * Σ |p(x) - q(x)|` over both supports.
    pub fn tv_distance(&self, other: &Distribution<T>) -> f64 {
        let mut diff: BTreeMap<&T, f64> = BTreeMap::new();
        for (x, p) in self.iter() {
            *diff.entry(x).or_insert(0.0) += p;
        }
        for (x, q) in other.iter() {
            *diff.entry(x).or_insert(0.0) -= q;
        }
        diff.values().map(|d| d.abs()).sum::<f64>() / 2.0
    }

    /// Inverse transform sampling from a uniform `u`.
    ///
    /// `u` is clamped into `(0, 1]`.
    pub fn sample(&self, u: f64) -> &T {
        self.quantile(u.clamp(f64::MIN_POSITIVE, 1.0))
    }

    /// Push the distribution through `f`, merging values that collide.
    pub fn map<U, F>(&self, f: F) -> Result<Distribution<U>, DrvError>
    where
        U: Value,
        F: Fn(&T) -> Result<U, DrvError>,
    {
        let mut merged: BTreeMap<U, f64> = BTreeMap::new();
        for (x, p) in self.iter() {
            *merged.entry(f(x)?).or_insert(0.0) += p;
        }
        Distribution::from_map(merged)
    }
}

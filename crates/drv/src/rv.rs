//! Random variables: measurable functions on probability spaces.
//!
//! A random variable pairs a [`PSpace`] with a function from the space's
//! outcomes to values. The function receives one coordinate per atom of
//! the space, in the order given by [`PSpace::atoms`].
//!
//! [`FiniteDrv`] is the workhorse: its space is finite, so its pushforward
//! [`Distribution`] is computed once at construction and every statistic is
//! read from it. [`Drv`] also admits infinite spaces; its statistics go
//! through the space's integrator and may come back undetermined.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use rand::Rng;

use crate::dist::Distribution;
use crate::error::DrvError;
use crate::space::PSpace;
use crate::value::Value;

/// The measurable function of a random variable.
pub type Func<T> = Arc<dyn Fn(&[usize]) -> Result<T, DrvError> + Send + Sync>;

/// Human labels for values, e.g. `{1: "Success", 0: "Failure"}`.
pub type Mask<T> = BTreeMap<T, String>;

/// Push a finite space through `func`.
pub(crate) fn pushforward<T: Value>(
    pspace: &PSpace,
    func: &Func<T>,
) -> Result<Distribution<T>, DrvError> {
    let mut merged: BTreeMap<T, f64> = BTreeMap::new();
    for outcome in pspace.outcomes()? {
        let p = pspace.p(&outcome);
        if p > 0.0 {
            *merged.entry(func(&outcome)?).or_insert(0.0) += p;
        }
    }
    Distribution::from_map(merged)
}

struct FiniteInner<T: Value> {
    name: String,
    pspace: PSpace,
    func: Func<T>,
    dist: Distribution<T>,
    mask: Option<Arc<Mask<T>>>,
}

/// A discrete random variable over a finite probability space.
///
/// Cloning is cheap and keeps identity: a clone is the *same* variable, so
/// `x.plus(&x.clone())` is `2x`, not the sum of two independent copies.
///
/// # Example
///
/// ```rust
/// use drv::{FiniteDrv, PSpace};
///
/// let space = PSpace::uniform(6).unwrap();
/// let die = FiniteDrv::new("d6", space, |w| w[0] as i64 + 1).unwrap();
///
/// assert!((die.mean() - 3.5).abs() < 1e-12);
/// assert!((die.pmf(&4) - 1.0 / 6.0).abs() < 1e-12);
/// assert_eq!(die.pmf(&7), 0.0);
/// assert_eq!(die.support(), &[1, 2, 3, 4, 5, 6]);
/// ```
pub struct FiniteDrv<T: Value = i64> {
    inner: Arc<FiniteInner<T>>,
}

impl<T: Value> Clone for FiniteDrv<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Value> FiniteDrv<T> {
    /// A random variable from a total function on a finite space.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if the space is infinite.
    pub fn new<F>(name: impl Into<String>, pspace: PSpace, func: F) -> Result<Self, DrvError>
    where
        F: Fn(&[usize]) -> T + Send + Sync + 'static,
    {
        Self::try_new(name, pspace, move |w: &[usize]| Ok(func(w)))
    }

    /// Like [`FiniteDrv::new`] for functions that can fail.
    pub fn try_new<F>(name: impl Into<String>, pspace: PSpace, func: F) -> Result<Self, DrvError>
    where
        F: Fn(&[usize]) -> Result<T, DrvError> + Send + Sync + 'static,
    {
        if !pspace.is_finite() {
            return Err(DrvError::unsupported(
                "finite random variable",
                "the probability space is infinite",
            ));
        }
        let func: Func<T> = Arc::new(func);
        let dist = pushforward(&pspace, &func)?;
        Ok(Self::from_parts(name.into(), pspace, func, dist))
    }

    /// Assemble a variable whose distribution is already known.
    pub(crate) fn from_parts(
        name: String,
        pspace: PSpace,
        func: Func<T>,
        dist: Distribution<T>,
    ) -> Self {
        Self {
            inner: Arc::new(FiniteInner {
                name,
                pspace,
                func,
                dist,
                mask: None,
            }),
        }
    }

    fn rebuild(&self, name: String, mask: Option<Arc<Mask<T>>>) -> Self {
        Self {
            inner: Arc::new(FiniteInner {
                name,
                pspace: self.inner.pspace.clone(),
                func: Arc::clone(&self.inner.func),
                dist: self.inner.dist.clone(),
                mask,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn pspace(&self) -> &PSpace {
        &self.inner.pspace
    }

    /// The pushforward distribution on values.
    pub fn distribution(&self) -> &Distribution<T> {
        &self.inner.dist
    }

    /// The same variable under another name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        self.rebuild(name.into(), self.inner.mask.clone())
    }

    /// The same variable with value labels attached.
    pub fn with_mask(&self, mask: Mask<T>) -> Self {
        self.rebuild(self.inner.name.clone(), Some(Arc::new(mask)))
    }

    pub fn mask(&self) -> Option<&Mask<T>> {
        self.inner.mask.as_deref()
    }

    /// The label of a value, if a mask names it.
    pub fn label(&self, value: &T) -> Option<&str> {
        self.mask()?.get(value).map(String::as_str)
    }

    /// Whether both handles are the very same variable.
    pub fn same(&self, other: &FiniteDrv<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Evaluate the variable at an outcome of its space.
    pub fn eval(&self, outcome: &[usize]) -> Result<T, DrvError> {
        (self.inner.func)(outcome)
    }

    pub fn pmf(&self, x: &T) -> f64 {
        self.inner.dist.pmf(x)
    }

    pub fn log_pmf(&self, x: &T) -> f64 {
        self.inner.dist.log_pmf(x)
    }

    pub fn cdf(&self, x: &T) -> f64 {
        self.inner.dist.cdf(x)
    }

    pub fn sf(&self, x: &T) -> f64 {
        self.inner.dist.sf(x)
    }

    pub fn log_cdf(&self, x: &T) -> f64 {
        self.inner.dist.log_cdf(x)
    }

    pub fn log_sf(&self, x: &T) -> f64 {
        self.inner.dist.log_sf(x)
    }

    pub fn ppf(&self, q: f64) -> Result<&T, DrvError> {
        self.inner.dist.ppf(q)
    }

    pub fn isf(&self, q: f64) -> Result<&T, DrvError> {
        self.inner.dist.isf(q)
    }

    /// Central interval holding at least `alpha` of the mass.
    pub fn interval(&self, alpha: f64) -> Result<(&T, &T), DrvError> {
        self.inner.dist.interval(alpha)
    }

    pub fn median(&self) -> &T {
        self.inner.dist.median()
    }

    pub fn mean(&self) -> f64 {
        self.inner.dist.mean()
    }

    pub fn variance(&self) -> f64 {
        self.inner.dist.variance()
    }

    pub fn std(&self) -> f64 {
        self.inner.dist.std()
    }

    pub fn moment(&self, n: i32) -> f64 {
        self.inner.dist.moment(n)
    }

    pub fn mgf(&self, t: f64) -> f64 {
        self.inner.dist.mgf(t)
    }

    pub fn entropy(&self) -> f64 {
        self.inner.dist.entropy()
    }

    pub fn mode(&self) -> &T {
        self.inner.dist.mode()
    }

    pub fn min(&self) -> &T {
        self.inner.dist.min()
    }

    pub fn max(&self) -> &T {
        self.inner.dist.max()
    }

    /// Values with positive probability, ascending.
    pub fn support(&self) -> &[T] {
        self.inner.dist.support()
    }

    pub fn expectation<F>(&self, f: F) -> f64
    where
        F: Fn(&T) -> f64,
    {
        self.inner.dist.expectation(f)
    }

    pub fn pr<F>(&self, event: F) -> f64
    where
        F: Fn(&T) -> bool,
    {
        self.inner.dist.pr(event)
    }

    /// A variable over a fresh finite space whose outcomes are the support.
    ///
    /// The result has the same distribution but is independent of every
    /// variable built on the source space. Flattening twice gives the same
    /// distribution as flattening once.
    pub fn flatten(&self) -> Result<Self, DrvError> {
        let dist = self.inner.dist.clone();
        let pspace = PSpace::finite(dist.probabilities())?;
        let values: Arc<[T]> = dist.support().into();
        let func: Func<T> = Arc::new(move |w: &[usize]| {
            w.first()
                .and_then(|&k| values.get(k))
                .cloned()
                .ok_or(DrvError::IndexOutOfBounds {
                    index: w.first().copied().unwrap_or(0),
                    size: values.len(),
                })
        });
        let flat = Self::from_parts(self.inner.name.clone(), pspace, func, dist);
        Ok(match &self.inner.mask {
            Some(mask) => flat.rebuild(flat.inner.name.clone(), Some(Arc::clone(mask))),
            None => flat,
        })
    }

    /// Apply a fallible function to every value, on the same space.
    ///
    /// The result stays correlated with `self`: it is a function of the same
    /// outcomes.
    pub fn try_map<U, F>(&self, name: impl Into<String>, f: F) -> Result<FiniteDrv<U>, DrvError>
    where
        U: Value,
        F: Fn(&T) -> Result<U, DrvError> + Send + Sync + 'static,
    {
        let dist = self.inner.dist.map(&f)?;
        let source = Arc::clone(&self.inner.func);
        let func: Func<U> = Arc::new(move |w: &[usize]| f(&source(w)?));
        Ok(FiniteDrv::from_parts(
            name.into(),
            self.inner.pspace.clone(),
            func,
            dist,
        ))
    }

    /// Apply a total function to every value, on the same space.
    pub fn map<U, F>(&self, name: impl Into<String>, f: F) -> Result<FiniteDrv<U>, DrvError>
    where
        U: Value,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.try_map(name, move |x: &T| Ok(f(x)))
    }

    /// `k · X`, perfectly correlated with `X`.
    pub fn scale(&self, k: T) -> Result<Self, DrvError> {
        let name = format!("{}*({})", k, self.name());
        self.try_map(name, move |x: &T| {
            x.checked_mul(&k).ok_or_else(|| DrvError::InvalidOperatorResult {
                operator: "scale".to_string(),
                inputs: format!("({}, {})", x, k),
            })
        })
    }

    /// One draw by inverse-CDF sampling against `u ∈ (0, 1]`.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        let u = 1.0 - rng.random::<f64>();
        self.inner.dist.sample(u).clone()
    }

    /// `n` independent draws.
    pub fn rolls<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<T> {
        (0..n).map(|_| self.roll(rng)).collect()
    }
}

impl FiniteDrv<i64> {
    /// Every integer from the minimum to the maximum, inclusive.
    pub fn range(&self) -> RangeInclusive<i64> {
        *self.min()..=*self.max()
    }
}

impl<T: Value> fmt::Display for FiniteDrv<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<T: Value> fmt::Debug for FiniteDrv<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteDrv")
            .field("name", &self.inner.name)
            .field("pspace", &self.inner.pspace)
            .field("distribution", &self.inner.dist)
            .finish()
    }
}

/// A discrete random variable over any probability space, finite or not.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use drv::{geometric, EngineConfig, NumericIntegrator};
///
/// let config = EngineConfig::default();
/// let integrator = Arc::new(NumericIntegrator::from_config(&config));
/// // Failures before the first success of a coin flip
/// let failures = geometric(0.5, integrator, &config).unwrap();
/// assert!((failures.mean().unwrap() - 1.0).abs() < 1e-9);
/// assert!((failures.pmf(&0).unwrap() - 0.5).abs() < 1e-12);
/// ```
pub struct Drv<T: Value = i64> {
    name: String,
    pspace: PSpace,
    func: Func<T>,
}

impl<T: Value> Clone for Drv<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            pspace: self.pspace.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T: Value> Drv<T> {
    pub fn new<F>(name: impl Into<String>, pspace: PSpace, func: F) -> Self
    where
        F: Fn(&[usize]) -> T + Send + Sync + 'static,
    {
        Self::try_new(name, pspace, move |w: &[usize]| Ok(func(w)))
    }

    pub fn try_new<F>(name: impl Into<String>, pspace: PSpace, func: F) -> Self
    where
        F: Fn(&[usize]) -> Result<T, DrvError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pspace,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pspace(&self) -> &PSpace {
        &self.pspace
    }

    pub fn is_finite(&self) -> bool {
        self.pspace.is_finite()
    }

    /// The finite view, with its distribution computed.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if the space is infinite.
    pub fn into_finite(self) -> Result<FiniteDrv<T>, DrvError> {
        if !self.is_finite() {
            return Err(DrvError::unsupported(
                "into_finite",
                format!("{} has infinite support", self.name),
            ));
        }
        let dist = pushforward(&self.pspace, &self.func)?;
        Ok(FiniteDrv::from_parts(self.name, self.pspace, self.func, dist))
    }

    /// `E[g(X)]` over the space, propagating evaluation errors.
    fn integrate_values<G>(&self, g: G) -> Result<f64, DrvError>
    where
        G: Fn(&T) -> f64,
    {
        let failure: RefCell<Option<DrvError>> = RefCell::new(None);
        let total = self.pspace.integrate(|w| match (self.func)(w) {
            Ok(x) => g(&x),
            Err(e) => {
                failure.borrow_mut().get_or_insert(e);
                0.0
            }
        })?;
        match failure.into_inner() {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }

    /// P(X = x).
    pub fn pmf(&self, x: &T) -> Result<f64, DrvError> {
        self.integrate_values(|v| if v == x { 1.0 } else { 0.0 })
    }

    /// P(X ≤ x).
    pub fn cdf(&self, x: &T) -> Result<f64, DrvError> {
        self.integrate_values(|v| if v <= x { 1.0 } else { 0.0 })
    }

    pub fn expectation<F>(&self, f: F) -> Result<f64, DrvError>
    where
        F: Fn(&T) -> f64,
    {
        self.integrate_values(f)
    }

    pub fn pr<F>(&self, event: F) -> Result<f64, DrvError>
    where
        F: Fn(&T) -> bool,
    {
        self.integrate_values(|v| if event(v) { 1.0 } else { 0.0 })
    }

    pub fn mean(&self) -> Result<f64, DrvError> {
        self.integrate_values(T::to_f64)
    }

    pub fn variance(&self) -> Result<f64, DrvError> {
        let mu = self.mean()?;
        self.integrate_values(|v| {
            let d = v.to_f64() - mu;
            d * d
        })
    }

    pub fn std(&self) -> Result<f64, DrvError> {
        Ok(self.variance()?.sqrt())
    }

    /// `E[e^{tX}]`; infinite spaces fail when the sum diverges.
    pub fn mgf(&self, t: f64) -> Result<f64, DrvError> {
        self.integrate_values(|v| (t * v.to_f64()).exp())
    }

    /// Values with positive probability; finite spaces only.
    pub fn support(&self) -> Result<Vec<T>, DrvError> {
        if !self.is_finite() {
            return Err(DrvError::unsupported(
                "support",
                format!("{} has infinite support", self.name),
            ));
        }
        Ok(pushforward(&self.pspace, &self.func)?.support().to_vec())
    }

    /// Most likely value; finite spaces only.
    pub fn mode(&self) -> Result<T, DrvError> {
        if !self.is_finite() {
            return Err(DrvError::unsupported(
                "mode",
                format!("{} has infinite support", self.name),
            ));
        }
        Ok(pushforward(&self.pspace, &self.func)?.mode().clone())
    }

    /// Apply a function to every value, on the same space.
    pub fn map<U, F>(&self, name: impl Into<String>, f: F) -> Drv<U>
    where
        U: Value,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let source = Arc::clone(&self.func);
        Drv::try_new(name, self.pspace.clone(), move |w: &[usize]| {
            Ok(f(&source(w)?))
        })
    }
}

impl<T: Value> From<FiniteDrv<T>> for Drv<T> {
    fn from(rv: FiniteDrv<T>) -> Self {
        Self {
            name: rv.inner.name.clone(),
            pspace: rv.inner.pspace.clone(),
            func: Arc::clone(&rv.inner.func),
        }
    }
}

impl<T: Value> fmt::Debug for Drv<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drv")
            .field("name", &self.name)
            .field("pspace", &self.pspace)
            .finish()
    }
}

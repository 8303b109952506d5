//! Ready-made random variables.
//!
//! Finite builders return a [`FiniteDrv`] over a fresh space, so two calls
//! always give independent variables. The infinite ones return a [`Drv`]
//! whose statistics are summed by the supplied integrator.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{DistributionFault, DrvError};
use crate::integrate::Integrator;
use crate::rv::{Drv, FiniteDrv, Func};
use crate::space::PSpace;
use crate::value::Value;

fn lookup<T: Value>(values: Arc<[T]>) -> Func<T> {
    Arc::new(move |w: &[usize]| {
        let k = w.first().copied().unwrap_or(0);
        values.get(k).cloned().ok_or(DrvError::IndexOutOfBounds {
            index: k,
            size: values.len(),
        })
    })
}

/// A variable taking `values[i]` with weight `weights[i]`.
///
/// Weights need not be normalized. Repeated values are merged.
///
/// # Example
///
/// ```rust
/// use drv::primitive;
///
/// let loaded = primitive("loaded", vec![1_i64, 2, 3], &[1.0, 1.0, 2.0]).unwrap();
/// assert!((loaded.pmf(&3) - 0.5).abs() < 1e-12);
/// ```
///
/// # Errors
///
/// `InvalidDistribution` if the lengths differ or the weights are invalid.
pub fn primitive<T: Value>(
    name: impl Into<String>,
    values: Vec<T>,
    weights: &[f64],
) -> Result<FiniteDrv<T>, DrvError> {
    if values.len() != weights.len() {
        return Err(DistributionFault::LengthMismatch {
            values: values.len(),
            weights: weights.len(),
        }
        .into());
    }
    let pspace = PSpace::finite(weights)?;
    let func = lookup(values.into());
    FiniteDrv::try_new(name, pspace, move |w: &[usize]| func(w))
}

/// Equally likely values.
pub fn uniform<T: Value>(name: impl Into<String>, values: Vec<T>) -> Result<FiniteDrv<T>, DrvError> {
    let weights = vec![1.0; values.len()];
    primitive(name, values, &weights)
}

/// A variable that always takes `value`, named after it.
pub fn constant<T: Value>(value: T) -> FiniteDrv<T> {
    let name = value.to_string();
    let dist = crate::dist::Distribution::point(value.clone());
    let func: Func<T> = Arc::new(move |_: &[usize]| Ok(value.clone()));
    FiniteDrv::from_parts(name, PSpace::degenerate(), func, dist)
}

fn check_probability(p: f64) -> Result<(), DrvError> {
    if !p.is_finite() {
        return Err(DistributionFault::NonFiniteProbability.into());
    }
    if p < 0.0 {
        return Err(DistributionFault::NegativeProbability.into());
    }
    if p > 1.0 {
        return Err(DistributionFault::ProbabilityAboveOne { p }.into());
    }
    Ok(())
}

/// 1 with probability `p`, else 0.
pub fn bernoulli(p: f64) -> Result<FiniteDrv<i64>, DrvError> {
    check_probability(p)?;
    primitive(format!("Bernoulli({})", p), vec![0, 1], &[1.0 - p, p])
}

/// Successes in `n` independent trials with success probability `p`.
///
/// ```rust
/// use drv::binomial;
///
/// let heads = binomial(4, 0.5).unwrap();
/// assert!((heads.pmf(&2) - 6.0 / 16.0).abs() < 1e-12);
/// assert!((heads.mean() - 2.0).abs() < 1e-12);
/// ```
pub fn binomial(n: u32, p: f64) -> Result<FiniteDrv<i64>, DrvError> {
    check_probability(p)?;
    let q = 1.0 - p;
    let mut coefficient = 1.0_f64;
    let mut weights = Vec::with_capacity(n as usize + 1);
    for k in 0..=n {
        weights.push(coefficient * p.powi(k as i32) * q.powi((n - k) as i32));
        coefficient *= f64::from(n - k) / f64::from(k + 1);
    }
    let values = (0..=i64::from(n)).collect();
    primitive(format!("Binomial({}, {})", n, p), values, &weights)
}

/// Failures before the first success, `P(k) = p (1-p)^k`.
pub fn geometric(
    p: f64,
    integrator: Arc<dyn Integrator>,
    config: &EngineConfig,
) -> Result<Drv<i64>, DrvError> {
    check_probability(p)?;
    if p == 0.0 {
        return Err(DistributionFault::ZeroWeights.into());
    }
    let q = 1.0 - p;
    let pspace = PSpace::infinite(
        move |k| p * q.powi(i32::try_from(k).unwrap_or(i32::MAX)),
        integrator,
        config,
    )?;
    Ok(Drv::new(format!("Geometric({})", p), pspace, |w| {
        w.first().copied().unwrap_or(0) as i64
    }))
}

/// Events in a unit interval at rate `lambda`.
///
/// ```rust
/// use std::sync::Arc;
/// use drv::{poisson, EngineConfig, NumericIntegrator};
///
/// let config = EngineConfig::default();
/// let arrivals = poisson(3.0, Arc::new(NumericIntegrator::default()), &config).unwrap();
/// assert!((arrivals.mean().unwrap() - 3.0).abs() < 1e-9);
/// assert!((arrivals.variance().unwrap() - 3.0).abs() < 1e-6);
/// ```
pub fn poisson(
    lambda: f64,
    integrator: Arc<dyn Integrator>,
    config: &EngineConfig,
) -> Result<Drv<i64>, DrvError> {
    if !lambda.is_finite() {
        return Err(DistributionFault::NonFiniteProbability.into());
    }
    if lambda <= 0.0 {
        return Err(DistributionFault::NegativeProbability.into());
    }
    let log_lambda = lambda.ln();
    let mass = move |k: u64| {
        let log_factorial: f64 = (2..=k).map(|i| (i as f64).ln()).sum();
        (k as f64 * log_lambda - lambda - log_factorial).exp()
    };
    let pspace = PSpace::infinite(mass, integrator, config)?;
    Ok(Drv::new(format!("Poisson({})", lambda), pspace, |w| {
        w.first().copied().unwrap_or(0) as i64
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrate::NumericIntegrator;

    fn integrator() -> Arc<dyn Integrator> {
        Arc::new(NumericIntegrator::default())
    }

    #[test]
    fn test_primitive_length_mismatch() {
        let result = primitive("bad", vec![1_i64, 2], &[1.0]);
        assert_eq!(
            result.err(),
            Some(DrvError::InvalidDistribution(DistributionFault::LengthMismatch {
                values: 2,
                weights: 1
            }))
        );
    }

    #[test]
    fn test_primitive_merges_repeated_values() {
        let rv = primitive("twos", vec![2_i64, 2, 5], &[1.0, 1.0, 2.0]).unwrap();
        assert_eq!(rv.support(), &[2, 5]);
        assert!((rv.pmf(&2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_builders_are_independent() {
        let a = uniform("a", vec![1_i64, 2]).unwrap();
        let b = uniform("b", vec![1_i64, 2]).unwrap();
        assert!(!a.pspace().same(b.pspace()));
    }

    #[test]
    fn test_constant() {
        let c = constant(7_i64);
        assert_eq!(c.name(), "7");
        assert_eq!(c.support(), &[7]);
        assert_eq!(c.variance(), 0.0);
        assert_eq!(c.eval(&[0]).unwrap(), 7);
    }

    #[test]
    fn test_bernoulli() {
        let coin = bernoulli(0.3).unwrap();
        assert!((coin.mean() - 0.3).abs() < 1e-12);
        assert!((coin.variance() - 0.21).abs() < 1e-12);
        assert_eq!(
            bernoulli(1.5).unwrap_err(),
            DrvError::InvalidDistribution(DistributionFault::ProbabilityAboveOne { p: 1.5 })
        );
        assert_eq!(
            bernoulli(-0.5).unwrap_err(),
            DrvError::InvalidDistribution(DistributionFault::NegativeProbability)
        );
        assert!(matches!(
            binomial(3, 2.0),
            Err(DrvError::InvalidDistribution(DistributionFault::ProbabilityAboveOne { .. }))
        ));
        assert!(bernoulli(f64::NAN).is_err());

        let sure = bernoulli(1.0).unwrap();
        assert_eq!(sure.support(), &[1]);
    }

    #[test]
    fn test_binomial_moments() {
        let rv = binomial(10, 0.3).unwrap();
        assert!((rv.mean() - 3.0).abs() < 1e-9);
        assert!((rv.variance() - 2.1).abs() < 1e-9);
        let total: f64 = rv.distribution().probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_geometric() {
        let config = EngineConfig::default();
        let rv = geometric(0.25, integrator(), &config).unwrap();
        assert!((rv.mean().unwrap() - 3.0).abs() < 1e-9);
        assert!((rv.pmf(&1).unwrap() - 0.1875).abs() < 1e-12);
        assert!(geometric(0.0, integrator(), &config).is_err());
    }

    #[test]
    fn test_poisson() {
        let config = EngineConfig::default();
        let rv = poisson(2.0, integrator(), &config).unwrap();
        let p0 = (-2.0_f64).exp();
        assert!((rv.pmf(&0).unwrap() - p0).abs() < 1e-12);
        assert!((rv.pmf(&2).unwrap() - 2.0 * p0).abs() < 1e-12);
        assert!(poisson(-1.0, integrator(), &config).is_err());
    }
}

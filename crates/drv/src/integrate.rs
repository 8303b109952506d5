//! Summation and normalization capabilities.
//!
//! The engine never does symbolic algebra itself. Infinite probability
//! spaces are summed through an [`Integrator`], and raw weights are turned
//! into probabilities through a [`Normalizer`]. The numeric implementations
//! here cover the common case; callers with a symbolic backend can plug in
//! their own.

use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

use crate::config::EngineConfig;
use crate::error::{DistributionFault, DrvError};

/// Outcome of summing an infinite series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Summation {
    /// The series converged to this value.
    Converged(f64),
    /// The series is known to diverge.
    Divergent,
    /// Neither convergence nor divergence could be established.
    Undetermined,
}

/// Sums a series `Σ_{k≥0} term(k)`.
pub trait Integrator: Send + Sync {
    fn sum(&self, term: &dyn Fn(u64) -> f64) -> Summation;
}

/// Plain numeric summation with a windowed convergence test.
///
/// Terms are added in order. Every `window` terms the contribution of the
/// last window is compared with the running total. A window whose mass is
/// below `tolerance` (relative) is quiet; after `quiet_windows` quiet
/// windows in a row, with a non-zero total, the series is declared
/// converged. A window that is not quiet resets the count. A non-finite
/// partial sum means divergence, and running out of `max_terms` means
/// undetermined.
///
/// Mass separated from the rest of the series by a run of zero terms longer
/// than `window * quiet_windows` is not seen.
///
/// # Example
///
/// ```rust
/// use drv::{Integrator, NumericIntegrator, Summation};
///
/// let integrator = NumericIntegrator::default();
/// match integrator.sum(&|k| 0.5_f64.powi(k as i32 + 1)) {
///     Summation::Converged(total) => assert!((total - 1.0).abs() < 1e-9),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NumericIntegrator {
    pub tolerance: f64,
    pub max_terms: u64,
    pub window: u64,
    pub quiet_windows: u64,
}

impl NumericIntegrator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            max_terms: config.max_terms,
            window: config.convergence_window.max(1),
            quiet_windows: config.quiet_windows.max(1),
        }
    }
}

impl Default for NumericIntegrator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Integrator for NumericIntegrator {
    fn sum(&self, term: &dyn Fn(u64) -> f64) -> Summation {
        let mut total = 0.0_f64;
        let mut window_mass = 0.0_f64;
        let mut quiet = 0_u64;

        for k in 0..self.max_terms {
            let t = term(k);
            if t.is_nan() {
                return Summation::Undetermined;
            }
            total += t;
            window_mass += t.abs();
            if !total.is_finite() {
                return Summation::Divergent;
            }

            if (k + 1) % self.window == 0 {
                if total != 0.0 && window_mass <= self.tolerance * total.abs() {
                    quiet += 1;
                    if quiet >= self.quiet_windows {
                        return Summation::Converged(total);
                    }
                } else {
                    quiet = 0;
                }
                window_mass = 0.0;
            }
        }

        Summation::Undetermined
    }
}

/// Turns raw, possibly unnormalized, weights into probabilities.
pub trait Normalizer {
    fn normalize(&self, weights: &[f64]) -> Result<Vec<f64>, DrvError>;
}

/// Divide by the floating-point sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatNormalizer;

/// Normalize in exact rational arithmetic and round only the final result.
///
/// Each weight is converted losslessly to a rational, so e.g. weights
/// `[1, 1, 1]` become exactly `1/3` before rounding.
#[derive(Debug, Clone, Copy, Default)]
pub struct RationalNormalizer;

fn check_weights(weights: &[f64]) -> Result<(), DistributionFault> {
    if weights.is_empty() {
        return Err(DistributionFault::EmptySupport);
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(DistributionFault::NonFiniteProbability);
    }
    if weights.iter().any(|&w| w < 0.0) {
        return Err(DistributionFault::NegativeProbability);
    }
    Ok(())
}

impl Normalizer for FloatNormalizer {
    fn normalize(&self, weights: &[f64]) -> Result<Vec<f64>, DrvError> {
        check_weights(weights)?;

        let sum: f64 = weights.iter().sum();
        if !sum.is_finite() {
            return Err(DistributionFault::NonFiniteProbability.into());
        }
        if sum <= 0.0 {
            return Err(DistributionFault::ZeroWeights.into());
        }

        Ok(weights.iter().map(|w| w / sum).collect())
    }
}

impl Normalizer for RationalNormalizer {
    fn normalize(&self, weights: &[f64]) -> Result<Vec<f64>, DrvError> {
        check_weights(weights)?;

        let exact: Vec<BigRational> = weights
            .iter()
            .map(|&w| BigRational::from_float(w).ok_or(DistributionFault::NonFiniteProbability))
            .collect::<Result<_, _>>()?;

        let sum = exact
            .iter()
            .fold(BigRational::zero(), |acc, w| acc + w);
        if sum.is_zero() {
            return Err(DistributionFault::ZeroWeights.into());
        }

        exact
            .iter()
            .map(|w| {
                (w / &sum)
                    .to_f64()
                    .ok_or_else(|| DistributionFault::NonFiniteProbability.into())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometric_series_converges() {
        let integrator = NumericIntegrator::default();
        let s = integrator.sum(&|k| 0.25 * 0.75_f64.powi(k as i32));
        match s {
            Summation::Converged(total) => assert!((total - 1.0).abs() < 1e-9),
            other => panic!("expected convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_mass_after_a_gap_is_counted() {
        let integrator = NumericIntegrator::default();
        let s = integrator.sum(&|k| if k == 0 || k == 200 { 1.0 } else { 0.0 });
        assert_eq!(s, Summation::Converged(2.0));
    }

    #[test]
    fn test_single_quiet_window_is_not_enough() {
        let integrator = NumericIntegrator {
            window: 4,
            quiet_windows: 3,
            ..NumericIntegrator::default()
        };
        // quiet for two windows, then one more term
        let s = integrator.sum(&|k| if k == 0 || k == 8 { 1.0 } else { 0.0 });
        assert_eq!(s, Summation::Converged(2.0));

        let hasty = NumericIntegrator {
            quiet_windows: 1,
            ..integrator
        };
        assert_eq!(
            hasty.sum(&|k| if k == 0 || k == 8 { 1.0 } else { 0.0 }),
            Summation::Converged(1.0)
        );
    }

    #[test]
    fn test_exploding_series_diverges() {
        let integrator = NumericIntegrator::default();
        assert_eq!(integrator.sum(&|k| 2.0_f64.powi(k as i32)), Summation::Divergent);
    }

    #[test]
    fn test_harmonic_series_is_undetermined() {
        let integrator = NumericIntegrator {
            max_terms: 10_000,
            ..NumericIntegrator::default()
        };
        assert_eq!(integrator.sum(&|k| 1.0 / (k as f64 + 1.0)), Summation::Undetermined);
    }

    #[test]
    fn test_float_normalizer() {
        let p = FloatNormalizer.normalize(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((p[3] - 0.4).abs() < 1e-12);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalizers_reject_bad_weights() {
        for normalizer in [&FloatNormalizer as &dyn Normalizer, &RationalNormalizer] {
            assert_eq!(
                normalizer.normalize(&[]),
                Err(DrvError::InvalidDistribution(DistributionFault::EmptySupport))
            );
            assert_eq!(
                normalizer.normalize(&[0.5, -0.1]),
                Err(DrvError::InvalidDistribution(DistributionFault::NegativeProbability))
            );
            assert_eq!(
                normalizer.normalize(&[0.0, 0.0]),
                Err(DrvError::InvalidDistribution(DistributionFault::ZeroWeights))
            );
            assert_eq!(
                normalizer.normalize(&[f64::NAN]),
                Err(DrvError::InvalidDistribution(DistributionFault::NonFiniteProbability))
            );
        }
    }

    #[test]
    fn test_rational_normalizer_is_correctly_rounded() {
        let p = RationalNormalizer.normalize(&[1.0, 1.0, 1.0]).unwrap();
        for x in p {
            assert_eq!(x, 1.0 / 3.0);
        }
    }
}

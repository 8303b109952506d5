//! Codomains of random variables.
//!
//! Every value a random variable can take implements [`Value`]. Operators
//! work through the `checked_*` methods, so a result that cannot be
//! represented (integer overflow, inexact integer division, a non-finite
//! real) is reported instead of silently coerced.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A value a discrete random variable can take.
pub trait Value: Clone + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Numeric view used by moments and entropy-free statistics.
    fn to_f64(&self) -> f64;

    /// Embed an integer (used for identities and indicator results).
    fn from_i64(n: i64) -> Self;

    /// Convert a float, or `None` when it is not a member of this codomain.
    fn from_f64_exact(x: f64) -> Option<Self>;

    fn checked_add(&self, other: &Self) -> Option<Self>;
    fn checked_sub(&self, other: &Self) -> Option<Self>;
    fn checked_mul(&self, other: &Self) -> Option<Self>;
    fn checked_div(&self, other: &Self) -> Option<Self>;
    fn checked_neg(&self) -> Option<Self>;

    /// Remainder of truncating division; the sign follows `self`.
    fn checked_rem(&self, other: &Self) -> Option<Self>;

    fn checked_pow(&self, exponent: &Self) -> Option<Self>;
    fn checked_abs(&self) -> Option<Self>;
}

impl Value for i64 {
    fn to_f64(&self) -> f64 {
        *self as f64
    }

    fn from_i64(n: i64) -> Self {
        n
    }

    fn from_f64_exact(x: f64) -> Option<Self> {
        // i64::MAX as f64 rounds up to 2^63, hence the strict bound
        if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
            Some(x as i64)
        } else {
            None
        }
    }

    fn checked_add(&self, other: &Self) -> Option<Self> {
        i64::checked_add(*self, *other)
    }

    fn checked_sub(&self, other: &Self) -> Option<Self> {
        i64::checked_sub(*self, *other)
    }

    fn checked_mul(&self, other: &Self) -> Option<Self> {
        i64::checked_mul(*self, *other)
    }

    /// Integer division must be exact.
    fn checked_div(&self, other: &Self) -> Option<Self> {
        if *other == 0 || i64::checked_rem(*self, *other)? != 0 {
            return None;
        }
        i64::checked_div(*self, *other)
    }

    fn checked_neg(&self) -> Option<Self> {
        i64::checked_neg(*self)
    }

    fn checked_rem(&self, other: &Self) -> Option<Self> {
        i64::checked_rem(*self, *other)
    }

    /// Negative exponents are only exact for a base of 1 or -1.
    fn checked_pow(&self, exponent: &Self) -> Option<Self> {
        if *exponent < 0 {
            return match *self {
                1 => Some(1),
                -1 => Some(if exponent % 2 == 0 { 1 } else { -1 }),
                _ => None,
            };
        }
        let exponent = u32::try_from(*exponent).ok()?;
        i64::checked_pow(*self, exponent)
    }

    fn checked_abs(&self) -> Option<Self> {
        i64::checked_abs(*self)
    }
}

/// A real value: a finite-or-infinite `f64` that is never NaN.
///
/// Ordered by `f64::total_cmp` with `-0.0` folded into `0.0`, so it can key
/// the maps that aggregate probability mass.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Real(f64);

impl Real {
    /// Wrap a float; `None` for NaN.
    pub fn new(x: f64) -> Option<Self> {
        if x.is_nan() {
            None
        } else if x == 0.0 {
            Some(Real(0.0))
        } else {
            Some(Real(x))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    fn finite(x: f64) -> Option<Self> {
        if x.is_finite() {
            Real::new(x)
        } else {
            None
        }
    }
}

impl TryFrom<f64> for Real {
    type Error = String;

    fn try_from(x: f64) -> Result<Self, Self::Error> {
        Real::new(x).ok_or_else(|| "NaN is not a real value".to_string())
    }
}

impl From<Real> for f64 {
    fn from(r: Real) -> f64 {
        r.0
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Real {}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Value for Real {
    fn to_f64(&self) -> f64 {
        self.0
    }

    fn from_i64(n: i64) -> Self {
        Real(n as f64)
    }

    fn from_f64_exact(x: f64) -> Option<Self> {
        Real::new(x)
    }

    fn checked_add(&self, other: &Self) -> Option<Self> {
        Real::finite(self.0 + other.0)
    }

    fn checked_sub(&self, other: &Self) -> Option<Self> {
        Real::finite(self.0 - other.0)
    }

    fn checked_mul(&self, other: &Self) -> Option<Self> {
        Real::finite(self.0 * other.0)
    }

    fn checked_div(&self, other: &Self) -> Option<Self> {
        Real::finite(self.0 / other.0)
    }

    fn checked_neg(&self) -> Option<Self> {
        Real::new(-self.0)
    }

    fn checked_rem(&self, other: &Self) -> Option<Self> {
        Real::finite(self.0 % other.0)
    }

    fn checked_pow(&self, exponent: &Self) -> Option<Self> {
        Real::finite(self.0.powf(exponent.0))
    }

    fn checked_abs(&self) -> Option<Self> {
        Real::new(self.0.abs())
    }
}

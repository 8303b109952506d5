//! # Drv - Discrete Random Variables as Measurable Functions
//!
//! This crate models discrete random variables the way measure theory does:
//! a random variable is a function on a probability space, and its
//! distribution is the pushforward of the space's measure. Combining
//! variables builds product spaces, so dependence between variables is
//! tracked by construction rather than assumed away.
//!
//! ## Core Concepts
//!
//! - **Spaces are shared, not copied**: a [`PSpace`] is a handle; two
//!   variables built on the same handle are dependent
//! - **Products deduplicate by identity**: the product of a space with itself
//!   is the space, so `X + X` is `2X` and never the convolution of two copies
//! - **Operators are data**: an [`Operator`] says how values combine and which
//!   reduction strategy [`combine`] may use (fold, top-k fold, enumeration)
//! - **Independent blocks**: only members that share atoms are enumerated
//!   jointly; independent members are folded pairwise
//! - **Infinite spaces**: summed through an [`Integrator`] that may report
//!   convergence, divergence or that it could not tell
//!
//! ## Example: Three Dice
//!
//! ```rust
//! use drv::{uniform, Pool};
//!
//! let d6 = uniform("d6", (1..=6).collect()).unwrap();
//! let three = Pool::independent(&d6, 3).unwrap().sum().unwrap();
//!
//! assert_eq!(*three.min(), 3);
//! assert_eq!(*three.max(), 18);
//! assert!((three.mean() - 10.5).abs() < 1e-12);
//!
//! // P(total >= 13)
//! let hit = three.ge(13).unwrap();
//! assert!((hit.pmf(&1) - 56.0 / 216.0).abs() < 1e-12);
//! ```

mod arith;
mod cache;
mod combine;
mod config;
mod dist;
mod dists;
mod error;
mod integrate;
mod operator;
mod report;
mod rv;
mod space;
mod value;

pub use arith::Operand;
pub use cache::PoolCache;
pub use combine::{combine, combine_general, render_name, Pool};
pub use config::EngineConfig;
pub use dist::Distribution;
pub use dists::{bernoulli, binomial, constant, geometric, poisson, primitive, uniform};
pub use error::{DistributionFault, DrvError};
pub use integrate::{
    FloatNormalizer, Integrator, Normalizer, NumericIntegrator, RationalNormalizer, Summation,
};
pub use operator::{
    BinaryFn, Comparison, Extract, Indexed, Keep, Naive, Operator, Reducer, TopK, TupleFn,
};
pub use report::{Curve, Report};
pub use rv::{Drv, FiniteDrv, Func, Mask};
pub use space::{MassFn, Outcomes, PSpace};
pub use value::{Real, Value};

/// Tolerance for probability comparisons.
pub const PROB_TOLERANCE: f64 = 1e-8;

//! Operators that can be applied to a pool of random variables.
//!
//! An [`Operator`] is a pure, reusable description of how values combine.
//! The variant tells [`combine`](crate::combine) which strategy it may use:
//!
//! | Variant | Strategy | Examples |
//! |---------|----------|----------|
//! | [`Reducer`] | pairwise fold | sum, product, min, max |
//! | [`TopK`] | fold over a padded top-k state | highest(2), nth highest |
//! | [`Indexed`] | enumerate fixed positions | a - b, -a, a < b |
//! | [`Naive`] | enumerate everything | any function of the whole tuple |

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::DrvError;
use crate::value::Value;

/// A binary operation; `None` means the result is not representable.
pub type BinaryFn<T> = Arc<dyn Fn(&T, &T) -> Option<T> + Send + Sync>;

/// A function of a tuple of values; `None` means not representable.
pub type TupleFn<T> = Arc<dyn Fn(&[T]) -> Option<T> + Send + Sync>;

/// A combination rule for a pool of values.
pub enum Operator<T: Value> {
    Reduce(Reducer<T>),
    TopK(TopK),
    Indexed(Indexed<T>),
    Naive(Naive<T>),
}

/// An associative, commutative binary operation with an optional identity.
pub struct Reducer<T: Value> {
    name: String,
    func: BinaryFn<T>,
    identity: Option<T>,
}

/// Which end of the sorted pool a [`TopK`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    Highest,
    Lowest,
}

/// What a [`TopK`] reports once the pool is folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Sum of the kept values.
    Sum,
    /// The last kept value, i.e. the k-th highest or lowest.
    Last,
}

/// Keep the `k` highest (or lowest) values of a pool.
///
/// The fold carries a state of exactly `k` slots, filled from the front;
/// unfilled slots are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopK {
    pub k: usize,
    pub keep: Keep,
    pub extract: Extract,
}

/// A function of selected pool positions.
pub struct Indexed<T: Value> {
    name: String,
    indices: Vec<usize>,
    func: TupleFn<T>,
}

/// A function of the whole tuple, evaluated on every joint outcome.
pub struct Naive<T: Value> {
    name: String,
    func: TupleFn<T>,
}

/// Pairwise comparisons. All produce 0 or 1 except `Cmp`, which gives the
/// sign of `a - b` as -1, 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Cmp,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Cmp => "<=>",
        }
    }

    /// The outcome of comparing a value with itself.
    pub fn reflexive(self) -> i64 {
        self.evaluate(Ordering::Equal)
    }

    fn evaluate(self, ord: Ordering) -> i64 {
        let holds = match self {
            Comparison::Lt => ord == Ordering::Less,
            Comparison::Le => ord != Ordering::Greater,
            Comparison::Gt => ord == Ordering::Greater,
            Comparison::Ge => ord != Ordering::Less,
            Comparison::Eq => ord == Ordering::Equal,
            Comparison::Ne => ord != Ordering::Equal,
            Comparison::Cmp => {
                return match ord {
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                    Ordering::Greater => 1,
                }
            }
        };
        i64::from(holds)
    }
}

impl<T: Value> Clone for Reducer<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: Arc::clone(&self.func),
            identity: self.identity.clone(),
        }
    }
}

impl<T: Value> Clone for Indexed<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            indices: self.indices.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T: Value> Clone for Naive<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T: Value> Clone for Operator<T> {
    fn clone(&self) -> Self {
        match self {
            Operator::Reduce(r) => Operator::Reduce(r.clone()),
            Operator::TopK(t) => Operator::TopK(*t),
            Operator::Indexed(i) => Operator::Indexed(i.clone()),
            Operator::Naive(n) => Operator::Naive(n.clone()),
        }
    }
}

fn unrepresentable<T: Value>(operator: &str, inputs: &[T]) -> DrvError {
    DrvError::InvalidOperatorResult {
        operator: operator.to_string(),
        inputs: format!("{:?}", inputs),
    }
}

impl<T: Value> Reducer<T> {
    pub fn new<F>(name: impl Into<String>, func: F, identity: Option<T>) -> Self
    where
        F: Fn(&T, &T) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            identity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> Option<&T> {
        self.identity.as_ref()
    }

    /// Combine two values.
    pub fn merge(&self, a: &T, b: &T) -> Result<T, DrvError> {
        (self.func)(a, b).ok_or_else(|| unrepresentable(&self.name, &[a.clone(), b.clone()]))
    }

    /// Left fold of a whole tuple.
    pub fn fold(&self, values: &[T]) -> Result<T, DrvError> {
        let (first, rest) = match values.split_first() {
            Some((first, rest)) => (first.clone(), rest),
            None => {
                return self.identity.clone().ok_or_else(|| DrvError::EmptyPool {
                    operator: self.name.clone(),
                })
            }
        };
        rest.iter().try_fold(first, |acc, x| self.merge(&acc, x))
    }
}

impl TopK {
    fn ordering<T: Value>(&self, a: &T, b: &T) -> Ordering {
        match self.keep {
            Keep::Highest => b.cmp(a),
            Keep::Lowest => a.cmp(b),
        }
    }

    /// The state of a pool holding only `x`.
    pub fn cast<T: Value>(&self, x: &T) -> Vec<Option<T>> {
        let mut state = vec![None; self.k];
        if let Some(slot) = state.first_mut() {
            *slot = Some(x.clone());
        }
        state
    }

    /// The state of the union of two pools.
    pub fn merge<T: Value>(&self, a: &[Option<T>], b: &[Option<T>]) -> Vec<Option<T>> {
        let mut kept: Vec<&T> = a.iter().chain(b).flatten().collect();
        kept.sort_by(|x, y| self.ordering(*x, *y));
        let mut state: Vec<Option<T>> = kept.into_iter().take(self.k).cloned().map(Some).collect();
        state.resize(self.k, None);
        state
    }

    /// The reported value of a folded state.
    pub fn uncast<T: Value>(&self, state: &[Option<T>]) -> Result<T, DrvError> {
        match self.extract {
            Extract::Sum => {
                let kept: Vec<T> = state.iter().flatten().cloned().collect();
                kept.iter().try_fold(T::from_i64(0), |acc, x| {
                    acc.checked_add(x)
                        .ok_or_else(|| unrepresentable(&self.name(), &kept))
                })
            }
            Extract::Last => state
                .last()
                .cloned()
                .flatten()
                .ok_or(DrvError::IndexOutOfBounds {
                    index: self.k.saturating_sub(1),
                    size: state.iter().flatten().count(),
                }),
        }
    }

    /// Evaluate on a whole tuple without folding.
    pub fn apply<T: Value>(&self, values: &[T]) -> Result<T, DrvError> {
        let state = values
            .iter()
            .fold(vec![None; self.k], |acc, x| self.merge(&acc, &self.cast(x)));
        self.uncast(&state)
    }

    pub fn name(&self) -> String {
        let end = match self.keep {
            Keep::Highest => "highest",
            Keep::Lowest => "lowest",
        };
        match self.extract {
            Extract::Sum => format!("{}({})", end, self.k),
            Extract::Last => format!("nth_{}({})", end, self.k),
        }
    }
}

impl<T: Value> Indexed<T> {
    pub fn new<F>(name: impl Into<String>, indices: Vec<usize>, func: F) -> Self
    where
        F: Fn(&[T]) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            indices,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pool positions read by the operator, in argument order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Check every position exists in a pool of `size` members.
    pub fn check(&self, size: usize) -> Result<(), DrvError> {
        match self.indices.iter().find(|&&i| i >= size) {
            Some(&index) => Err(DrvError::IndexOutOfBounds { index, size }),
            None => Ok(()),
        }
    }

    /// Evaluate on already selected arguments.
    pub fn call(&self, args: &[T]) -> Result<T, DrvError> {
        (self.func)(args).ok_or_else(|| unrepresentable(&self.name, args))
    }

    /// Select the positions from a whole tuple, then evaluate.
    pub fn apply(&self, values: &[T]) -> Result<T, DrvError> {
        self.check(values.len())?;
        let args: Vec<T> = self.indices.iter().map(|&i| values[i].clone()).collect();
        self.call(&args)
    }
}

impl<T: Value> Naive<T> {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[T]) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, values: &[T]) -> Result<T, DrvError> {
        (self.func)(values).ok_or_else(|| unrepresentable(&self.name, values))
    }
}

impl<T: Value> Operator<T> {
    /// Sum; identity 0.
    pub fn sum() -> Self {
        Operator::Reduce(Reducer::new(
            "sum",
            |a: &T, b: &T| a.checked_add(b),
            Some(T::from_i64(0)),
        ))
    }

    /// Product; identity 1.
    pub fn product() -> Self {
        Operator::Reduce(Reducer::new(
            "product",
            |a: &T, b: &T| a.checked_mul(b),
            Some(T::from_i64(1)),
        ))
    }

    pub fn min() -> Self {
        Operator::Reduce(Reducer::new(
            "min",
            |a: &T, b: &T| Some(a.clone().min(b.clone())),
            None,
        ))
    }

    pub fn max() -> Self {
        Operator::Reduce(Reducer::new(
            "max",
            |a: &T, b: &T| Some(a.clone().max(b.clone())),
            None,
        ))
    }

    /// A custom reduction. `func` must be associative and commutative.
    pub fn reduce<F>(name: impl Into<String>, func: F, identity: Option<T>) -> Self
    where
        F: Fn(&T, &T) -> Option<T> + Send + Sync + 'static,
    {
        Operator::Reduce(Reducer::new(name, func, identity))
    }

    /// Sum of the `k` highest values.
    pub fn highest(k: usize) -> Self {
        Operator::TopK(TopK {
            k,
            keep: Keep::Highest,
            extract: Extract::Sum,
        })
    }

    /// Sum of the `k` lowest values.
    pub fn lowest(k: usize) -> Self {
        Operator::TopK(TopK {
            k,
            keep: Keep::Lowest,
            extract: Extract::Sum,
        })
    }

    /// The `n`-th highest value, counting from 1.
    pub fn nth_highest(n: usize) -> Self {
        Operator::TopK(TopK {
            k: n,
            keep: Keep::Highest,
            extract: Extract::Last,
        })
    }

    /// The `n`-th lowest value, counting from 1.
    pub fn nth_lowest(n: usize) -> Self {
        Operator::TopK(TopK {
            k: n,
            keep: Keep::Lowest,
            extract: Extract::Last,
        })
    }

    /// `pool[0] - pool[1]`.
    pub fn sub() -> Self {
        Self::indexed("-", vec![0, 1], |v: &[T]| v[0].checked_sub(&v[1]))
    }

    /// `-pool[0]`.
    pub fn neg() -> Self {
        Self::indexed("neg", vec![0], |v: &[T]| v[0].checked_neg())
    }

    /// `pool[0] / pool[1]`; integer division must be exact.
    pub fn div() -> Self {
        Self::indexed("/", vec![0, 1], |v: &[T]| v[0].checked_div(&v[1]))
    }

    /// `pool[0] % pool[1]`, truncating like Rust's `%`.
    pub fn rem() -> Self {
        Self::indexed("%", vec![0, 1], |v: &[T]| v[0].checked_rem(&v[1]))
    }

    /// `pool[0]` raised to `pool[1]`.
    pub fn pow() -> Self {
        Self::indexed("**", vec![0, 1], |v: &[T]| v[0].checked_pow(&v[1]))
    }

    /// `|pool[0]|`.
    pub fn abs() -> Self {
        Self::indexed("abs", vec![0], |v: &[T]| v[0].checked_abs())
    }

    /// `pool[0] <op> pool[1]` as 0/1, or -1/0/1 for [`Comparison::Cmp`].
    pub fn compare(cmp: Comparison) -> Self {
        Self::indexed(cmp.symbol(), vec![0, 1], move |v: &[T]| {
            Some(T::from_i64(cmp.evaluate(v[0].cmp(&v[1]))))
        })
    }

    /// A custom function of the given positions.
    pub fn indexed<F>(name: impl Into<String>, indices: Vec<usize>, func: F) -> Self
    where
        F: Fn(&[T]) -> Option<T> + Send + Sync + 'static,
    {
        Operator::Indexed(Indexed::new(name, indices, func))
    }

    /// A custom function of the whole tuple.
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[T]) -> Option<T> + Send + Sync + 'static,
    {
        Operator::Naive(Naive::new(name, func))
    }

    /// A custom real-valued function whose results must land in `T`.
    ///
    /// An `i64` pool fails with `InvalidOperatorResult` as soon as the
    /// function returns a non-integer.
    pub fn from_real<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self::custom(name, move |v: &[T]| {
            let reals: Vec<f64> = v.iter().map(T::to_f64).collect();
            T::from_f64_exact(func(&reals))
        })
    }

    pub fn name(&self) -> String {
        match self {
            Operator::Reduce(r) => r.name.clone(),
            Operator::TopK(t) => t.name(),
            Operator::Indexed(i) => i.name.clone(),
            Operator::Naive(n) => n.name.clone(),
        }
    }

    /// Short label of the strategy `combine` uses.
    pub fn strategy(&self) -> &'static str {
        match self {
            Operator::Reduce(_) => "reduce",
            Operator::TopK(_) => "top-k",
            Operator::Indexed(_) => "indexed",
            Operator::Naive(_) => "naive",
        }
    }

    /// The value of an empty pool, if there is one.
    pub fn identity(&self) -> Option<T> {
        match self {
            Operator::Reduce(r) => r.identity.clone(),
            Operator::TopK(TopK {
                extract: Extract::Sum,
                ..
            }) => Some(T::from_i64(0)),
            _ => None,
        }
    }

    /// Evaluate on one joint outcome of the pool.
    pub fn apply(&self, values: &[T]) -> Result<T, DrvError> {
        match self {
            Operator::Reduce(r) => r.fold(values),
            Operator::TopK(t) => t.apply(values),
            Operator::Indexed(i) => i.apply(values),
            Operator::Naive(n) => n.apply(values),
        }
    }
}

impl<T: Value> fmt::Debug for Operator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name())
            .field("strategy", &self.strategy())
            .finish()
    }
}

//! Arithmetic and comparison sugar over [`combine`].
//!
//! Every binary operation normalizes its right-hand side into an
//! [`Operand`], checks the algebraic shortcuts and only then builds a pool.
//! The shortcuts are not optional: `x.plus(&x)` must be `2x`, and only the
//! identity check can tell it apart from the sum of two independent copies.
//!
//! ```rust
//! use drv::uniform;
//!
//! let x = uniform("x", (1..=6).collect()).unwrap();
//! let y = uniform("y", (1..=6).collect()).unwrap();
//!
//! let twice = (&x + &x).unwrap();
//! let pair = (&x + &y).unwrap();
//! assert!((twice.variance() - 4.0 * x.variance()).abs() < 1e-9);
//! assert!((pair.variance() - 2.0 * x.variance()).abs() < 1e-9);
//!
//! let hit = x.ge(4).unwrap();
//! assert!((hit.pmf(&1) - 0.5).abs() < 1e-12);
//! ```

use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Rem, Sub};

use crate::combine::combine;
use crate::dists::constant;
use crate::error::DrvError;
use crate::operator::{Comparison, Operator};
use crate::rv::FiniteDrv;
use crate::value::{Real, Value};

/// The right-hand side of a binary operation.
#[derive(Debug, Clone)]
pub enum Operand<T: Value> {
    Constant(T),
    Variable(FiniteDrv<T>),
}

impl<T: Value> Operand<T> {
    /// The operand as a random variable; constants become degenerate.
    pub fn into_variable(self) -> FiniteDrv<T> {
        match self {
            Operand::Constant(c) => constant(c),
            Operand::Variable(rv) => rv,
        }
    }
}

impl<T: Value> From<FiniteDrv<T>> for Operand<T> {
    fn from(rv: FiniteDrv<T>) -> Self {
        Operand::Variable(rv)
    }
}

impl<T: Value> From<&FiniteDrv<T>> for Operand<T> {
    fn from(rv: &FiniteDrv<T>) -> Self {
        Operand::Variable(rv.clone())
    }
}

impl From<i64> for Operand<i64> {
    fn from(c: i64) -> Self {
        Operand::Constant(c)
    }
}

impl From<Real> for Operand<Real> {
    fn from(c: Real) -> Self {
        Operand::Constant(c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binary {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Min,
    Max,
    Compare(Comparison),
}

impl Binary {
    fn template(self) -> String {
        let symbol = match self {
            Binary::Add => "+",
            Binary::Sub => "-",
            Binary::Mul => "*",
            Binary::Div => "/",
            Binary::Rem => "%",
            Binary::Pow => "**",
            Binary::Min => "&",
            Binary::Max => "|",
            Binary::Compare(cmp) => cmp.symbol(),
        };
        format!("{{0}} {} {{1}}", symbol)
    }

    fn operator<T: Value>(self) -> Operator<T> {
        match self {
            Binary::Add => Operator::sum(),
            Binary::Sub => Operator::sub(),
            Binary::Mul => Operator::product(),
            Binary::Div => Operator::div(),
            Binary::Rem => Operator::rem(),
            Binary::Pow => Operator::pow(),
            Binary::Min => Operator::min(),
            Binary::Max => Operator::max(),
            Binary::Compare(cmp) => Operator::compare(cmp),
        }
    }
}

impl<T: Value> FiniteDrv<T> {
    fn binary(&self, rhs: Operand<T>, op: Binary) -> Result<Self, DrvError> {
        let zero = T::from_i64(0);
        let one = T::from_i64(1);

        let rhs = match rhs {
            Operand::Constant(c) => match op {
                Binary::Add | Binary::Sub if c == zero => return Ok(self.clone()),
                Binary::Mul | Binary::Div | Binary::Pow if c == one => return Ok(self.clone()),
                Binary::Mul if c == zero => return Ok(constant(zero)),
                Binary::Pow if c == zero => return Ok(constant(one)),
                _ => constant(c),
            },
            Operand::Variable(rv) if rv.same(self) => return self.with_itself(op),
            Operand::Variable(rv) => rv,
        };

        combine(&[self.clone(), rhs], &op.operator(), &op.template())
    }

    /// `x <op> x` for one and the same variable.
    fn with_itself(&self, op: Binary) -> Result<Self, DrvError> {
        let name = op
            .template()
            .replace("{0}", self.name())
            .replace("{1}", self.name());
        match op {
            Binary::Add => Ok(self.scale(T::from_i64(2))?.with_name(name)),
            Binary::Mul => self.try_map(name, |x: &T| {
                x.checked_mul(x).ok_or_else(|| DrvError::InvalidOperatorResult {
                    operator: "*".to_string(),
                    inputs: format!("({}, {})", x, x),
                })
            }),
            Binary::Sub => Ok(constant(T::from_i64(0)).with_name(name)),
            Binary::Div | Binary::Rem => {
                let zero = T::from_i64(0);
                if self.pmf(&zero) > 0.0 {
                    return Err(DrvError::InvalidOperatorResult {
                        operator: op.operator::<T>().name(),
                        inputs: format!("({}, {})", zero, zero),
                    });
                }
                let value = if op == Binary::Div { 1 } else { 0 };
                Ok(constant(T::from_i64(value)).with_name(name))
            }
            Binary::Pow => Err(DrvError::unsupported(
                name,
                "a variable raised to its own power",
            )),
            Binary::Min | Binary::Max => Ok(self.clone()),
            Binary::Compare(cmp) => Ok(constant(T::from_i64(cmp.reflexive())).with_name(name)),
        }
    }

    pub fn plus(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Add)
    }

    pub fn minus(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Sub)
    }

    pub fn times(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Mul)
    }

    /// Division; for integers every quotient must be exact.
    pub fn divide(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Div)
    }

    /// Remainder, `x % y`; a zero divisor anywhere in the support fails.
    pub fn modulo(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Rem)
    }

    /// `x ** y`. For integers a negative exponent fails unless the base is 1 or -1.
    pub fn pow(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Pow)
    }

    pub fn negate(&self) -> Result<Self, DrvError> {
        combine(std::slice::from_ref(self), &Operator::neg(), "-{0}")
    }

    /// Absolute value, on the same space.
    pub fn abs(&self) -> Result<Self, DrvError> {
        combine(std::slice::from_ref(self), &Operator::abs(), "|{0}|")
    }

    /// The smaller of the two, `x & y`.
    pub fn min_with(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Min)
    }

    /// The larger of the two, `x | y`.
    pub fn max_with(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Max)
    }

    pub fn lt(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Compare(Comparison::Lt))
    }

    pub fn le(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Compare(Comparison::Le))
    }

    pub fn gt(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Compare(Comparison::Gt))
    }

    pub fn ge(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Compare(Comparison::Ge))
    }

    /// Indicator of equality. Not `PartialEq`: the result is a variable.
    pub fn eq_rv(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Compare(Comparison::Eq))
    }

    pub fn ne_rv(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Compare(Comparison::Ne))
    }

    /// Three-way comparison: -1, 0 or 1.
    pub fn compare(&self, rhs: impl Into<Operand<T>>) -> Result<Self, DrvError> {
        self.binary(rhs.into(), Binary::Compare(Comparison::Cmp))
    }
}

macro_rules! binary_ops {
    ($($trait:ident :: $method:ident => $call:ident;)*) => {$(
        impl<T: Value> $trait<&FiniteDrv<T>> for &FiniteDrv<T> {
            type Output = Result<FiniteDrv<T>, DrvError>;
            fn $method(self, rhs: &FiniteDrv<T>) -> Self::Output {
                self.$call(rhs)
            }
        }

        impl<T: Value> $trait<FiniteDrv<T>> for FiniteDrv<T> {
            type Output = Result<FiniteDrv<T>, DrvError>;
            fn $method(self, rhs: FiniteDrv<T>) -> Self::Output {
                self.$call(rhs)
            }
        }

        binary_ops!(@constant $trait $method $call i64);
        binary_ops!(@constant $trait $method $call Real);
    )*};

    (@constant $trait:ident $method:ident $call:ident $ty:ty) => {
        impl $trait<$ty> for &FiniteDrv<$ty> {
            type Output = Result<FiniteDrv<$ty>, DrvError>;
            fn $method(self, rhs: $ty) -> Self::Output {
                self.$call(rhs)
            }
        }

        impl $trait<$ty> for FiniteDrv<$ty> {
            type Output = Result<FiniteDrv<$ty>, DrvError>;
            fn $method(self, rhs: $ty) -> Self::Output {
                self.$call(rhs)
            }
        }

        impl $trait<&FiniteDrv<$ty>> for $ty {
            type Output = Result<FiniteDrv<$ty>, DrvError>;
            fn $method(self, rhs: &FiniteDrv<$ty>) -> Self::Output {
                constant(self).$call(rhs)
            }
        }
    };
}

binary_ops! {
    Add::add => plus;
    Sub::sub => minus;
    Mul::mul => times;
    Div::div => divide;
    Rem::rem => modulo;
    BitAnd::bitand => min_with;
    BitOr::bitor => max_with;
}

impl<T: Value> Neg for &FiniteDrv<T> {
    type Output = Result<FiniteDrv<T>, DrvError>;
    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl<T: Value> Neg for FiniteDrv<T> {
    type Output = Result<FiniteDrv<T>, DrvError>;
    fn neg(self) -> Self::Output {
        self.negate()
    }
}

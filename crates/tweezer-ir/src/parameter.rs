//! Parameter expressions for loop bodies and symbolic angles.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A symbolic parameter, usually a loop variable.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Exponentiation.
    Pow(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// `base ** exponent`.
    #[must_use]
    pub fn pow(self, exponent: ParameterExpression) -> Self {
        ParameterExpression::Pow(Box::new(self), Box::new(exponent))
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b)
            | ParameterExpression::Pow(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Try to evaluate as a concrete f64 value.
    ///
    /// A bare constant evaluates to exactly the stored bits.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            ParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
            ParameterExpression::Pow(a, b) => Some(a.as_f64()?.powf(b.as_f64()?)),
        }
    }

    /// Get all symbol names in this expression.
    pub fn symbols(&self) -> FxHashSet<String> {
        let mut set = FxHashSet::default();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut FxHashSet<String>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(name) => {
                set.insert(name.clone());
            }
            ParameterExpression::Neg(e) => e.collect_symbols(set),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b)
            | ParameterExpression::Pow(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Bind a symbol to a value, returning a new expression.
    #[must_use]
    pub fn bind(&self, name: &str, value: f64) -> Self {
        let rebind = |e: &ParameterExpression| Box::new(e.bind(name, value));
        match self {
            ParameterExpression::Symbol(n) if n == name => ParameterExpression::Constant(value),
            ParameterExpression::Constant(_)
            | ParameterExpression::Pi
            | ParameterExpression::Symbol(_) => self.clone(),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(rebind(e)),
            ParameterExpression::Add(a, b) => ParameterExpression::Add(rebind(a), rebind(b)),
            ParameterExpression::Sub(a, b) => ParameterExpression::Sub(rebind(a), rebind(b)),
            ParameterExpression::Mul(a, b) => ParameterExpression::Mul(rebind(a), rebind(b)),
            ParameterExpression::Div(a, b) => ParameterExpression::Div(rebind(a), rebind(b)),
            ParameterExpression::Pow(a, b) => ParameterExpression::Pow(rebind(a), rebind(b)),
        }
    }

    /// Collapse the expression to a constant when it has no free symbols.
    #[must_use]
    pub fn simplify(&self) -> Self {
        match self.as_f64() {
            Some(v) => ParameterExpression::Constant(v),
            None => self.clone(),
        }
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) if *v < 0.0 => write!(f, "({v})"),
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "pi"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
            ParameterExpression::Pow(a, b) => write!(f, "({a} ** {b})"),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        ParameterExpression::Constant(f64::from(value))
    }
}

macro_rules! binary_op {
    ($($trait:ident::$method:ident => $variant:ident),* $(,)?) => {$(
        impl std::ops::$trait for ParameterExpression {
            type Output = Self;
            fn $method(self, rhs: Self) -> Self {
                ParameterExpression::$variant(Box::new(self), Box::new(rhs))
            }
        }
    )*};
}

binary_op! {
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;
    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

/// Angle arithmetic needed by gate decompositions.
///
/// Implemented for concrete `f64` angles and for symbolic expressions so
/// the same identity tables serve flat circuits and loop bodies.
pub trait Angle: Clone + fmt::Debug {
    /// A constant angle.
    fn from_f64(value: f64) -> Self;

    /// The angle multiplied by `factor`.
    #[must_use]
    fn scaled(&self, factor: f64) -> Self;
}

impl Angle for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn scaled(&self, factor: f64) -> Self {
        self * factor
    }
}

impl Angle for ParameterExpression {
    fn from_f64(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    fn scaled(&self, factor: f64) -> Self {
        match self {
            ParameterExpression::Constant(v) => ParameterExpression::Constant(v * factor),
            other => other.clone() * ParameterExpression::Constant(factor),
        }
    }
}

//! Affine index expressions over loop variables.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::qubit::{Clbit, Qubit};

/// An affine integer expression `c + Σ kᵢ·varᵢ`.
///
/// Terms are kept sorted by variable name with non-zero coefficients, so
/// structural equality is semantic equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IndexExpr {
    constant: i64,
    terms: Vec<(String, i64)>,
}

impl IndexExpr {
    /// A constant index.
    pub fn constant(value: i64) -> Self {
        Self {
            constant: value,
            terms: Vec::new(),
        }
    }

    /// A bare variable.
    pub fn var(name: impl Into<String>) -> Self {
        Self {
            constant: 0,
            terms: vec![(name.into(), 1)],
        }
    }

    /// The constant part.
    pub fn constant_part(&self) -> i64 {
        self.constant
    }

    /// Variables with their coefficients.
    pub fn terms(&self) -> &[(String, i64)] {
        &self.terms
    }

    /// Value if no variables remain.
    pub fn as_constant(&self) -> Option<i64> {
        self.terms.is_empty().then_some(self.constant)
    }

    /// Whether `name` occurs in the expression.
    pub fn mentions(&self, name: &str) -> bool {
        self.terms.iter().any(|(v, _)| v == name)
    }

    /// Names of the free variables.
    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(v, _)| v.as_str())
    }

    /// Substitute `value` for `name`.
    ///
    /// Fails with [`IrError::IndexOverflow`] when the result leaves the
    /// `i64` range.
    pub fn bind(&self, name: &str, value: i64) -> IrResult<Self> {
        let mut out = Self::constant(self.constant);
        for (var, coeff) in &self.terms {
            if var == name {
                out.constant = coeff
                    .checked_mul(value)
                    .and_then(|v| out.constant.checked_add(v))
                    .ok_or_else(|| IrError::IndexOverflow(format!("{self} at {name} = {value}")))?;
            } else {
                out.terms.push((var.clone(), *coeff));
            }
        }
        Ok(out)
    }

    /// Sum of two expressions, or `None` on overflow.
    pub fn checked_add(mut self, rhs: &Self) -> Option<Self> {
        self.constant = self.constant.checked_add(rhs.constant)?;
        for (var, coeff) in &rhs.terms {
            self.add_term(var, *coeff)?;
        }
        Some(self)
    }

    /// Difference of two expressions, or `None` on overflow.
    pub fn checked_sub(self, rhs: &Self) -> Option<Self> {
        self.checked_add(&rhs.checked_scaled(-1)?)
    }

    /// Every coefficient multiplied by `factor`, or `None` on overflow.
    pub fn checked_scaled(&self, factor: i64) -> Option<Self> {
        let mut out = Self::constant(self.constant.checked_mul(factor)?);
        for (var, coeff) in &self.terms {
            out.add_term(var, coeff.checked_mul(factor)?)?;
        }
        Some(out)
    }

    /// Multiply every coefficient by `factor`.
    ///
    /// # Panics
    ///
    /// On `i64` overflow. Use [`IndexExpr::checked_scaled`] for untrusted input.
    #[must_use]
    pub fn scaled(&self, factor: i64) -> Self {
        self.checked_scaled(factor).unwrap_or_else(|| overflow_panic())
    }

    fn add_term(&mut self, var: &str, coeff: i64) -> Option<()> {
        match self.terms.binary_search_by(|(v, _)| v.as_str().cmp(var)) {
            Ok(pos) => {
                self.terms[pos].1 = self.terms[pos].1.checked_add(coeff)?;
                if self.terms[pos].1 == 0 {
                    self.terms.remove(pos);
                }
            }
            Err(pos) if coeff != 0 => self.terms.insert(pos, (var.to_string(), coeff)),
            Err(_) => {}
        }
        Some(())
    }
}

#[cold]
fn overflow_panic() -> ! {
    panic!("index expression overflowed i64")
}

impl From<i64> for IndexExpr {
    fn from(value: i64) -> Self {
        IndexExpr::constant(value)
    }
}

// The operators panic on overflow like integer arithmetic does. Parsed
// input goes through the `checked_*` forms instead.

impl std::ops::Add for IndexExpr {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(&rhs).unwrap_or_else(|| overflow_panic())
    }
}

impl std::ops::Sub for IndexExpr {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(&rhs).unwrap_or_else(|| overflow_panic())
    }
}

impl std::ops::Add<i64> for IndexExpr {
    type Output = Self;
    fn add(self, rhs: i64) -> Self::Output {
        self.checked_add(&IndexExpr::constant(rhs))
            .unwrap_or_else(|| overflow_panic())
    }
}

impl fmt::Display for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "{}", self.constant);
        }
        for (i, (var, coeff)) in self.terms.iter().enumerate() {
            let sign = if *coeff < 0 { "-" } else { "+" };
            let magnitude = coeff.unsigned_abs();
            match (i, magnitude) {
                (0, 1) if *coeff < 0 => write!(f, "-{var}")?,
                (0, 1) => write!(f, "{var}")?,
                (0, m) if *coeff < 0 => write!(f, "-{m}*{var}")?,
                (0, m) => write!(f, "{m}*{var}")?,
                (_, 1) => write!(f, " {sign} {var}")?,
                (_, m) => write!(f, " {sign} {m}*{var}")?,
            }
        }
        match self.constant {
            0 => Ok(()),
            c if c < 0 => write!(f, " - {}", c.unsigned_abs()),
            c => write!(f, " + {c}"),
        }
    }
}

/// A qubit reference whose index may depend on loop variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QubitExpr {
    /// Register name.
    pub register: String,
    /// Index within the register.
    pub index: IndexExpr,
}

impl QubitExpr {
    /// Create a symbolic qubit reference.
    pub fn new(register: impl Into<String>, index: impl Into<IndexExpr>) -> Self {
        Self {
            register: register.into(),
            index: index.into(),
        }
    }

    /// Substitute a loop variable.
    pub fn bind(&self, name: &str, value: i64) -> IrResult<Self> {
        Ok(Self {
            register: self.register.clone(),
            index: self.index.bind(name, value)?,
        })
    }

    /// Resolve to a concrete qubit.
    pub fn resolve(&self) -> IrResult<Qubit> {
        let index = resolve_index(&self.register, &self.index)?;
        Ok(Qubit::new(self.register.clone(), index))
    }
}

impl From<&Qubit> for QubitExpr {
    fn from(q: &Qubit) -> Self {
        QubitExpr::new(q.register.clone(), i64::from(q.index))
    }
}

impl fmt::Display for QubitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// A classical bit reference whose index may depend on loop variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClbitExpr {
    /// Register name.
    pub register: String,
    /// Index within the register.
    pub index: IndexExpr,
}

impl ClbitExpr {
    /// Create a symbolic classical bit reference.
    pub fn new(register: impl Into<String>, index: impl Into<IndexExpr>) -> Self {
        Self {
            register: register.into(),
            index: index.into(),
        }
    }

    /// Substitute a loop variable.
    pub fn bind(&self, name: &str, value: i64) -> IrResult<Self> {
        Ok(Self {
            register: self.register.clone(),
            index: self.index.bind(name, value)?,
        })
    }

    /// Resolve to a concrete classical bit.
    pub fn resolve(&self) -> IrResult<Clbit> {
        let index = resolve_index(&self.register, &self.index)?;
        Ok(Clbit::new(self.register.clone(), index))
    }
}

impl fmt::Display for ClbitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

fn resolve_index(register: &str, index: &IndexExpr) -> IrResult<u32> {
    let value = match index.as_constant() {
        Some(v) => v,
        None => {
            let var = index.vars().next().unwrap_or_default();
            return Err(IrError::UnboundVariable(var.to_string()));
        }
    };
    u32::try_from(value).map_err(|_| IrError::UnknownResource {
        resource: format!("{register}[{value}]"),
        operation: None,
    })
}

use super::calc::Calc;
use crate::cosmic::CalcScalar;
use crate::errors::VelaError;
use std::fmt;
use std::rc::Rc;

/// A constraint the optimizer must satisfy: any calc plus per-component lower
/// and upper bounds and a scale.
///
/// Equal bounds make an equality constraint; an infinite bound on one side
/// makes it one-sided. Constraints are attached to events, and the residual
/// of a constraint is collected immediately after its owning event runs, so
/// the same constraint on two events is evaluated twice at two distinct
/// instants of the mission.
pub struct Constraint<T: CalcScalar> {
    pub name: String,
    pub calc: Calc<T>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub scale: Vec<f64>,
}

impl<T: CalcScalar> Constraint<T> {
    /// An equality constraint: value must equal `desired`, component-wise.
    pub fn equality(calc: Calc<T>, desired: &[f64]) -> Result<Self, VelaError> {
        if desired.len() != calc.arity() {
            return Err(VelaError::BoundsLengthMismatch {
                expected: calc.arity(),
                got: desired.len(),
            });
        }
        Ok(Self {
            name: calc.to_string(),
            calc,
            lower: desired.to_vec(),
            upper: desired.to_vec(),
            scale: vec![1.0; desired.len()],
        })
    }

    /// A bounded constraint; at least one side must be provided, the missing
    /// side defaults to the matching infinity.
    pub fn bounded(
        calc: Calc<T>,
        lower: Option<&[f64]>,
        upper: Option<&[f64]>,
    ) -> Result<Self, VelaError> {
        if lower.is_none() && upper.is_none() {
            return Err(VelaError::NoBoundsSpecified);
        }
        let n = calc.arity();
        for side in [lower, upper].into_iter().flatten() {
            if side.len() != n {
                return Err(VelaError::BoundsLengthMismatch {
                    expected: n,
                    got: side.len(),
                });
            }
        }
        Ok(Self {
            name: calc.to_string(),
            calc,
            lower: lower.map_or_else(|| vec![f64::NEG_INFINITY; n], <[f64]>::to_vec),
            upper: upper.map_or_else(|| vec![f64::INFINITY; n], <[f64]>::to_vec),
            scale: vec![1.0; n],
        })
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_scale(mut self, scale: &[f64]) -> Result<Self, VelaError> {
        if scale.len() != self.arity() {
            return Err(VelaError::BoundsLengthMismatch {
                expected: self.arity(),
                got: scale.len(),
            });
        }
        self.scale = scale.to_vec();
        Ok(self)
    }

    pub fn arity(&self) -> usize {
        self.calc.arity()
    }

    pub fn into_shared(self) -> Rc<Self> {
        Rc::new(self)
    }
}

impl<T: CalcScalar> fmt::Display for Constraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for i in 0..self.arity() {
            write!(f, " in [{}, {}]", self.lower[i], self.upper[i])?;
        }
        Ok(())
    }
}
